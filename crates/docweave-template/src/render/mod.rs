//! Rendering of resolved templates
//!
//! Text templates render to a string that becomes one paragraph per line.
//! Templates with a base document render on a deep copy of it, rewriting
//! paragraphs and unrolling table loops in place so run formatting survives.

pub(crate) mod paragraph;
pub(crate) mod table;
pub(crate) mod text;

use docweave_ooxml::{BodyElement, Document};
use serde_json::Value;

use crate::config::{EngineConfig, MissingVariable};
use crate::data::{is_truthy, value_to_string, TemplateData};
use crate::parser::Node;
use crate::template::Template;

/// Render `template` with `data` into a new document
pub(crate) fn render_document(
    template: &Template,
    data: &TemplateData,
    config: &EngineConfig,
) -> Document {
    let scope = Scope::new(data, config.missing_variable);
    match template.effective_base() {
        Some(base) => {
            log::debug!("Rendering template {} on its base document", template.name());
            let mut document = base.clone();
            render_elements(&mut document.body_mut().elements, template, &scope);
            document
        }
        None => {
            log::debug!("Rendering text template {}", template.name());
            let text = render_text(template, data, config);
            text::text_to_document(&text, config)
        }
    }
}

/// Render the resolved tree of `template` as plain text
pub(crate) fn render_text(template: &Template, data: &TemplateData, config: &EngineConfig) -> String {
    render_nodes_to_string(&template.resolved_nodes(), data, config)
}

pub(crate) fn render_nodes_to_string(
    nodes: &[Node],
    data: &TemplateData,
    config: &EngineConfig,
) -> String {
    let scope = Scope::new(data, config.missing_variable);
    let mut out = String::new();
    text::render_nodes(nodes, &scope, &mut out);
    out
}

fn render_elements(elements: &mut [BodyElement], template: &Template, scope: &Scope<'_>) {
    for element in elements {
        match element {
            BodyElement::Paragraph(p) => paragraph::render_paragraph(p, template, scope),
            BodyElement::Table(t) => table::render_table(t, template, scope),
            BodyElement::StructuredTag(sdt) => render_elements(&mut sdt.content, template, scope),
            BodyElement::SectionProperties(_)
            | BodyElement::BookmarkStart(_)
            | BodyElement::BookmarkEnd(_) => {}
        }
    }
}

/// One loop iteration
struct Frame<'a> {
    item: &'a Value,
    index: usize,
    len: usize,
    /// Conditionals see only the item's own fields
    fields_only: bool,
    parent: Option<&'a Frame<'a>>,
}

impl Frame<'_> {
    fn value(&self, name: &str) -> Option<String> {
        match name {
            "this" => Some(value_to_string(self.item)),
            "@index" => Some(self.index.to_string()),
            "@first" => Some(self.is_first().to_string()),
            "@last" => Some(self.is_last().to_string()),
            _ => self.item.as_object()?.get(name).map(value_to_string),
        }
    }

    fn is_first(&self) -> bool {
        self.index == 0
    }

    fn is_last(&self) -> bool {
        self.index + 1 == self.len
    }
}

/// Name lookup for one point of a render
///
/// Loop item fields shadow outer variables; innermost loop first.
#[derive(Clone, Copy)]
pub(crate) struct Scope<'a> {
    data: &'a TemplateData,
    frame: Option<&'a Frame<'a>>,
    missing: MissingVariable,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(data: &'a TemplateData, missing: MissingVariable) -> Self {
        Self {
            data,
            frame: None,
            missing,
        }
    }

    pub(crate) fn missing(&self) -> MissingVariable {
        self.missing
    }

    /// Text for placeholder `name`, or `None` when nothing defines it
    pub(crate) fn value(&self, name: &str) -> Option<String> {
        let mut frame = self.frame;
        while let Some(f) = frame {
            if let Some(value) = f.value(name) {
                return Some(value);
            }
            frame = f.parent;
        }
        self.data.variable(name).map(value_to_string)
    }

    /// Whether `{{#if name}}` includes its body
    pub(crate) fn condition(&self, name: &str) -> bool {
        let Some(frame) = self.frame else {
            return self.data.condition(name).unwrap_or(false);
        };
        match name {
            "@first" => frame.is_first(),
            "@last" => frame.is_last(),
            _ => match frame.item.as_object() {
                Some(fields) => fields.get(name).is_some_and(is_truthy),
                None if frame.fields_only => false,
                None => self.data.condition(name).unwrap_or(false),
            },
        }
    }

    /// Items for `{{#each name}}`: an array field of the current item, then
    /// the data's lists
    pub(crate) fn list(&self, name: &str) -> Option<&'a [Value]> {
        if let Some(Value::Array(items)) = self.frame.and_then(|f| f.item.get(name)) {
            return Some(items);
        }
        self.data.list(name)
    }

    /// Call `f` once per item with a scope for that iteration
    pub(crate) fn each_item(&self, items: &[Value], fields_only: bool, mut f: impl FnMut(&Scope<'_>)) {
        for (index, item) in items.iter().enumerate() {
            let frame = Frame {
                item,
                index,
                len: items.len(),
                fields_only,
                parent: self.frame,
            };
            f(&Scope {
                data: self.data,
                frame: Some(&frame),
                missing: self.missing,
            });
        }
    }
}
