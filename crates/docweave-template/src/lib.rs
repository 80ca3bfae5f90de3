//! # docweave-template
//!
//! Template rendering for docweave documents.
//!
//! Templates use a small tag syntax:
//!
//! | Tag | Meaning |
//! |-----|---------|
//! | `{{name}}` | variable (`this`, `@index`, `@first`, `@last` inside loops) |
//! | `{{{name}}}` | the same variable; values are never escaped |
//! | `{{#if cond}}...{{/if}}` | conditional region |
//! | `{{#each list}}...{{/each}}` | loop; a table row holding it repeats per item |
//! | `{{#block "name"}}...{{/block}}` | region a child template can override |
//! | `{{extends "parent"}}` | inherit from a cached template |
//!
//! A template is either plain text, rendered to one paragraph per line, or
//! an existing [`Document`](docweave_ooxml::Document) whose styled runs are
//! rewritten in place so formatting survives substitution.
//!
//! ## Example
//!
//! ```
//! use docweave_template::{TemplateData, TemplateEngine};
//!
//! let engine = TemplateEngine::new();
//! engine.load_template("base", r#"{{#block "body"}}default{{/block}}"#)?;
//! engine.load_template("letter", r#"{{extends "base"}}{{#block "body"}}Dear {{name}}{{/block}}"#)?;
//!
//! let mut data = TemplateData::new();
//! data.set_variable("name", "Ada");
//! assert_eq!(engine.render_to_string("letter", &data)?, "Dear Ada");
//!
//! let document = engine.render_to_document("letter", &data)?;
//! assert_eq!(document.plain_text(), "Dear Ada");
//! # Ok::<(), docweave_template::TemplateError>(())
//! ```

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod lexer;
pub mod parser;
mod render;
pub mod template;
pub mod validate;

pub use config::{EngineConfig, MissingVariable};
pub use data::TemplateData;
pub use engine::TemplateEngine;
pub use error::{Result, ResultExt, TemplateError};
pub use parser::{Node, Span};
pub use template::Template;
pub use validate::{validate, validate_source};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
