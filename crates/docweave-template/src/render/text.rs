//! Plain-text rendering

use docweave_ooxml::{Document, Paragraph};

use super::Scope;
use crate::config::{EngineConfig, MissingVariable};
use crate::parser::Node;

/// Render `nodes` into `out`
pub(crate) fn render_nodes(nodes: &[Node], scope: &Scope<'_>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text { text, .. } | Node::Stray { text, .. } => out.push_str(text),
            Node::Variable { name, raw, .. } => match scope.value(name) {
                Some(value) => out.push_str(&value),
                None if scope.missing() == MissingVariable::Keep => out.push_str(raw),
                None => {}
            },
            Node::Conditional {
                condition, body, ..
            } => {
                if scope.condition(condition) {
                    render_nodes(body, scope, out);
                }
            }
            Node::Loop { list, body, .. } => match scope.list(list) {
                Some(items) => scope.each_item(items, false, |item| render_nodes(body, item, out)),
                None => {
                    log::debug!("List {} not defined, loop kept as text", list);
                    node.write_source(out);
                }
            },
            Node::Block { body, .. } => render_nodes(body, scope, out),
            Node::Extends { .. } => {}
        }
    }
}

/// One paragraph per line of `text`
///
/// Blank lines at either end are dropped. Blank lines inside become empty
/// paragraphs unless the config says otherwise.
pub(crate) fn text_to_document(text: &str, config: &EngineConfig) -> Document {
    let mut document = Document::new();
    let lines: Vec<&str> = text.lines().collect();
    let is_blank = |line: &&str| line.trim().is_empty();

    let Some(first) = lines.iter().position(|l| !is_blank(l)) else {
        return document;
    };
    let last = lines.iter().rposition(|l| !is_blank(l)).unwrap_or(first);

    for line in &lines[first..=last] {
        let mut paragraph = if is_blank(line) {
            if !config.keep_blank_lines {
                continue;
            }
            Paragraph::new()
        } else {
            Paragraph::with_text(*line)
        };
        if let Some(style) = &config.paragraph_style {
            paragraph.set_style(style.clone());
        }
        document.add_element(paragraph);
    }

    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TemplateData;
    use crate::parser::parse;
    use serde_json::json;

    fn render(source: &str, data: &TemplateData) -> String {
        let scope = Scope::new(data, MissingVariable::Keep);
        let mut out = String::new();
        render_nodes(&parse(source), &scope, &mut out);
        out
    }

    #[test]
    fn test_variables_and_missing() {
        let mut data = TemplateData::new();
        data.set_variable("name", "Ada");
        data.set_variable("count", 3);
        assert_eq!(
            render("{{name}} has {{ count }} {{missing}}", &data),
            "Ada has 3 {{missing}}"
        );

        let scope = Scope::new(&data, MissingVariable::Empty);
        let mut out = String::new();
        render_nodes(&parse("[{{missing}}]"), &scope, &mut out);
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_triple_brace_variable() {
        let mut data = TemplateData::new();
        data.set_variable("name", "<b>Ada</b>");
        assert_eq!(render("Hi {{{name}}}!", &data), "Hi <b>Ada</b>!");
        assert_eq!(render("{{{missing}}}", &data), "{{{missing}}}");
    }

    #[test]
    fn test_conditionals() {
        let mut data = TemplateData::new();
        data.set_condition("shown", true);
        data.set_condition("hidden", false);
        assert_eq!(
            render("a{{#if shown}}b{{/if}}c{{#if hidden}}d{{/if}}{{#if unset}}e{{/if}}", &data),
            "abc"
        );
    }

    #[test]
    fn test_loops() {
        let mut data = TemplateData::new();
        data.set_list("items", vec![json!({"name": "x"}), json!({"name": "y"})]);
        data.set_list("nums", vec![json!(1), json!(2), json!(3)]);
        data.set_list("none", Vec::<serde_json::Value>::new());
        assert_eq!(
            render("{{#each items}}{{@index}}:{{name}}{{#if @last}}.{{/if}}{{#if @first}},{{/if}}{{/each}}", &data),
            "0:x,1:y."
        );
        assert_eq!(render("{{#each nums}}{{this}}{{/each}}", &data), "123");
        assert_eq!(render("[{{#each none}}x{{/each}}]", &data), "[]");
        assert_eq!(
            render("{{#each absent}}{{ this }}{{/each}}", &data),
            "{{#each absent}}{{ this }}{{/each}}"
        );
    }

    #[test]
    fn test_nested_loop_over_item_field() {
        let mut data = TemplateData::new();
        data.set_list(
            "groups",
            vec![json!({"title": "A", "members": ["a1", "a2"]}), json!({"title": "B", "members": []})],
        );
        assert_eq!(
            render("{{#each groups}}{{title}}({{#each members}}{{this}}{{/each}}){{/each}}", &data),
            "A(a1a2)B()"
        );
    }

    #[test]
    fn test_stray_and_extends_render() {
        let data = TemplateData::new();
        assert_eq!(render(r#"{{extends "base"}}a{{/if}}"#, &data), "a{{/if}}");
    }

    #[test]
    fn test_text_to_document() {
        let config = EngineConfig {
            paragraph_style: Some("BodyText".to_string()),
            ..EngineConfig::default()
        };
        let doc = text_to_document("\n\n first\n\nsecond\n  \n", &config);
        let paragraphs: Vec<_> = doc.paragraphs().collect();
        assert_eq!(paragraphs.len(), 3);
        assert_eq!(paragraphs[0].text(), " first");
        assert!(paragraphs[1].runs.is_empty());
        assert_eq!(paragraphs[2].properties.style.as_deref(), Some("BodyText"));

        let compact = EngineConfig {
            keep_blank_lines: false,
            ..EngineConfig::default()
        };
        let doc = text_to_document("a\n\nb", &compact);
        assert_eq!(doc.paragraphs().count(), 2);
        assert!(doc.section_properties().is_some());

        assert_eq!(text_to_document(" \n", &compact).paragraphs().count(), 0);
    }
}
