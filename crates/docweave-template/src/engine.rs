//! Template engine with a named template cache

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use docweave_ooxml::Document;

use crate::config::EngineConfig;
use crate::data::TemplateData;
use crate::error::{Result, ResultExt, TemplateError};
use crate::render;
use crate::template::Template;
use crate::validate::validate;

/// Loads, caches and renders templates
///
/// The cache lock is held only for lookups and updates; renders work on a
/// private copy of the base document, so one engine can serve many threads.
#[derive(Debug, Default)]
pub struct TemplateEngine {
    cache: RwLock<HashMap<String, Arc<Template>>>,
    config: EngineConfig,
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            cache: RwLock::default(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parse `content` and cache it as `name`
    ///
    /// `{{extends "parent"}}` resolves against templates already cached. A
    /// parent that is not loaded yet is ignored with a warning.
    pub fn load_template(&self, name: &str, content: &str) -> Result<Arc<Template>> {
        self.register(Template::parse(name, content))
            .context("load_template", name)
    }

    /// Cache `document` as a styled template named `name`
    pub fn load_template_from_document(
        &self,
        name: &str,
        document: Document,
    ) -> Result<Arc<Template>> {
        self.register(Template::from_document(name, document))
            .context("load_template_from_document", name)
    }

    /// Load a template file: `.docx`/`.dotx` as a document, anything else
    /// as UTF-8 text
    pub fn load_template_file<P: AsRef<Path>>(&self, name: &str, path: P) -> Result<Arc<Template>> {
        let path = path.as_ref();
        let is_document = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("docx") || e.eq_ignore_ascii_case("dotx"));

        if is_document {
            let document = Document::open(path).context("load_template_file", name)?;
            self.load_template_from_document(name, document)
        } else {
            let content =
                std::fs::read_to_string(path).context("load_template_file", path.display().to_string())?;
            self.load_template(name, &content)
        }
    }

    fn register(&self, mut template: Template) -> Result<Arc<Template>> {
        if self.config.validate_on_load {
            validate(&template)?;
        }

        if let Some(parent_name) = template.extends().map(str::to_string) {
            match self.read_cache().get(&parent_name) {
                Some(parent) => template.set_parent(Arc::clone(parent)),
                None => log::warn!(
                    "Template {} extends {}, which is not loaded; inheritance ignored",
                    template.name(),
                    parent_name
                ),
            }
        }

        log::info!(
            "Loaded template {} ({} blocks, {} variables{})",
            template.name(),
            template.blocks().len(),
            template.variables().len(),
            if template.base_document().is_some() {
                ", document based"
            } else {
                ""
            }
        );

        let template = Arc::new(template);
        self.write_cache()
            .insert(template.name().to_string(), Arc::clone(&template));
        Ok(template)
    }

    pub fn get_template(&self, name: &str) -> Result<Arc<Template>> {
        self.read_cache()
            .get(name)
            .cloned()
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))
    }

    pub fn remove_template(&self, name: &str) -> Option<Arc<Template>> {
        self.write_cache().remove(name)
    }

    pub fn clear_cache(&self) {
        self.write_cache().clear();
    }

    /// Cached template names, sorted
    pub fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read_cache().keys().cloned().collect();
        names.sort();
        names
    }

    /// Render the cached template `name` into a new document
    pub fn render_to_document(&self, name: &str, data: &TemplateData) -> Result<Document> {
        let template = self.get_template(name)?;
        self.render_template(&template, data)
    }

    /// Render `template` into a new document
    ///
    /// Templates with a base document render on a copy of it; text templates
    /// produce one paragraph per line.
    pub fn render_template(&self, template: &Template, data: &TemplateData) -> Result<Document> {
        Ok(render::render_document(template, data, &self.config))
    }

    /// Render the cached template `name` as plain text
    pub fn render_to_string(&self, name: &str, data: &TemplateData) -> Result<String> {
        let template = self.get_template(name)?;
        Ok(render::render_text(&template, data, &self.config))
    }

    /// Render one block of the cached template `name` as plain text
    ///
    /// The most-derived definition of the block in the inheritance chain is
    /// used.
    pub fn render_block(&self, name: &str, block: &str, data: &TemplateData) -> Result<String> {
        let template = self.get_template(name)?;
        let body = template
            .resolved_block(block)
            .ok_or_else(|| TemplateError::BlockNotFound {
                template: name.to_string(),
                block: block.to_string(),
            })?;
        Ok(render::render_nodes_to_string(&body, data, &self.config))
    }

    pub fn validate_template(&self, template: &Template) -> Result<()> {
        validate(template)
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Template>>> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Template>>> {
        self.cache.write().unwrap_or_else(PoisonError::into_inner)
    }
}
