//! Parsed templates and inheritance resolution

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use docweave_ooxml::Document;

use crate::parser::{find_block, find_extends, parse, Node};

/// A parsed template
///
/// Templates are immutable once loaded. A parent, when present, is a shared
/// snapshot of the template that was cached under the `extends` name at load
/// time, so an inheritance chain can never loop back on itself.
#[derive(Clone)]
pub struct Template {
    name: String,
    content: String,
    nodes: Vec<Node>,
    base: Option<Document>,
    parent: Option<Arc<Template>>,
    variables: BTreeSet<String>,
    blocks: BTreeSet<String>,
    loops: BTreeSet<String>,
    conditions: BTreeSet<String>,
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("has_base", &self.base.is_some())
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .field("blocks", &self.blocks)
            .finish_non_exhaustive()
    }
}

impl Template {
    /// Parse a text template
    pub fn parse(name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let nodes = parse(&content);
        let mut template = Self {
            name: name.into(),
            content,
            nodes,
            base: None,
            parent: None,
            variables: BTreeSet::new(),
            blocks: BTreeSet::new(),
            loops: BTreeSet::new(),
            conditions: BTreeSet::new(),
        };
        template.collect_names();
        template
    }

    /// Use `document` as a styled base
    ///
    /// The text content is the document's paragraph text, one line per
    /// paragraph, tables and structured tags included.
    pub fn from_document(name: impl Into<String>, document: Document) -> Self {
        let mut template = Self::parse(name, document.plain_text());
        template.base = Some(document);
        template
    }

    pub(crate) fn set_parent(&mut self, parent: Arc<Template>) {
        self.parent = Some(parent);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw template source
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Parsed node tree, before inheritance
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn base_document(&self) -> Option<&Document> {
        self.base.as_ref()
    }

    pub fn parent(&self) -> Option<&Arc<Template>> {
        self.parent.as_ref()
    }

    /// Name given in the first `{{extends "..."}}` tag
    pub fn extends(&self) -> Option<&str> {
        find_extends(&self.nodes)
    }

    /// Names used as `{{name}}` placeholders
    pub fn variables(&self) -> &BTreeSet<String> {
        &self.variables
    }

    /// Names of `{{#block}}` regions
    pub fn blocks(&self) -> &BTreeSet<String> {
        &self.blocks
    }

    /// Names of lists iterated with `{{#each}}`
    pub fn loops(&self) -> &BTreeSet<String> {
        &self.loops
    }

    /// Names tested with `{{#if}}`
    pub fn conditions(&self) -> &BTreeSet<String> {
        &self.conditions
    }

    /// This template followed by its ancestors, nearest first
    pub fn chain(&self) -> impl Iterator<Item = &Template> {
        std::iter::successors(Some(self), |t| t.parent.as_deref())
    }

    /// Base document of the nearest template in the chain that has one
    pub fn effective_base(&self) -> Option<&Document> {
        self.chain().find_map(|t| t.base.as_ref())
    }

    /// The root template's tree with every block body replaced by the body
    /// from the most-derived template that defines that block
    pub fn resolved_nodes(&self) -> Vec<Node> {
        let root = self.chain().last().unwrap_or(self);
        self.resolve_nodes(&root.nodes, &mut Vec::new())
    }

    /// Resolved body of the most-derived definition of block `name`
    pub fn resolved_block(&self, name: &str) -> Option<Vec<Node>> {
        let body = self.most_derived_block(self.chain(), name)?;
        Some(self.resolve_nodes(body, &mut vec![name.to_string()]))
    }

    /// Replacement body for block `name` inside the base document
    ///
    /// Only templates that derive from the document's owner can override
    /// its blocks; the owner's own definition is already in the document.
    pub(crate) fn block_override(&self, name: &str) -> Option<Vec<Node>> {
        let overriding = self.chain().take_while(|t| t.base.is_none());
        let body = self.most_derived_block(overriding, name)?;
        Some(self.resolve_nodes(body, &mut vec![name.to_string()]))
    }

    fn most_derived_block<'a>(
        &self,
        mut chain: impl Iterator<Item = &'a Template>,
        name: &str,
    ) -> Option<&'a [Node]> {
        chain.find_map(|t| match find_block(&t.nodes, name) {
            Some(Node::Block { body, .. }) => Some(body.as_slice()),
            _ => None,
        })
    }

    /// `expanding` holds the blocks being replaced on the current path; a
    /// block nested in its own replacement keeps the body it was written with.
    fn resolve_nodes(&self, nodes: &[Node], expanding: &mut Vec<String>) -> Vec<Node> {
        nodes
            .iter()
            .map(|node| match node {
                Node::Block {
                    name,
                    body,
                    tags,
                    span,
                } => {
                    let source = if expanding.contains(name) {
                        body.as_slice()
                    } else {
                        self.most_derived_block(self.chain(), name)
                            .unwrap_or(body)
                    };
                    expanding.push(name.clone());
                    let body = self.resolve_nodes(source, expanding);
                    expanding.pop();
                    Node::Block {
                        name: name.clone(),
                        body,
                        tags: tags.clone(),
                        span: span.clone(),
                    }
                }
                Node::Conditional {
                    condition,
                    body,
                    tags,
                    span,
                } => Node::Conditional {
                    condition: condition.clone(),
                    body: self.resolve_nodes(body, expanding),
                    tags: tags.clone(),
                    span: span.clone(),
                },
                Node::Loop {
                    list,
                    body,
                    tags,
                    span,
                } => Node::Loop {
                    list: list.clone(),
                    body: self.resolve_nodes(body, expanding),
                    tags: tags.clone(),
                    span: span.clone(),
                },
                other => other.clone(),
            })
            .collect()
    }

    fn collect_names(&mut self) {
        let mut names = NameSets::default();
        names.visit(&self.nodes);
        self.variables = names.variables;
        self.blocks = names.blocks;
        self.loops = names.loops;
        self.conditions = names.conditions;
    }
}

#[derive(Default)]
struct NameSets {
    variables: BTreeSet<String>,
    blocks: BTreeSet<String>,
    loops: BTreeSet<String>,
    conditions: BTreeSet<String>,
}

impl NameSets {
    fn visit(&mut self, nodes: &[Node]) {
        for node in nodes {
            match node {
                Node::Variable { name, .. } => {
                    self.variables.insert(name.clone());
                }
                Node::Conditional {
                    condition, body, ..
                } => {
                    self.conditions.insert(condition.clone());
                    self.visit(body);
                }
                Node::Loop { list, body, .. } => {
                    self.loops.insert(list.clone());
                    self.visit(body);
                }
                Node::Block { name, body, .. } => {
                    self.blocks.insert(name.clone());
                    self.visit(body);
                }
                Node::Text { .. } | Node::Extends { .. } | Node::Stray { .. } => {}
            }
        }
    }
}
