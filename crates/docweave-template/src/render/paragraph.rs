//! In-place rendering of one styled paragraph
//!
//! The text runs of a paragraph are flattened into one buffer with each
//! run's byte range recorded. The buffer is parsed and walked once,
//! producing `(text, source run)` fragments: literal text is re-sliced at
//! every original run boundary, a substituted value becomes one fragment
//! owned by the run its placeholder started in. The fragments are then
//! turned into runs in a single step, each one carrying a full copy of its
//! source run's properties and hyperlink.
//!
//! Non-text runs (drawings, fields, breaks, tabs, bookmark markers) split
//! the paragraph into independent groups and are kept where they are.

use std::ops::Range;

use docweave_ooxml::{Paragraph, Run};

use super::{text, Scope};
use crate::config::MissingVariable;
use crate::lexer::{tokenize, Keyword, Token, TokenKind};
use crate::parser::{parse, Node};
use crate::template::Template;

/// Consecutive text runs of a paragraph
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TextGroup {
    /// Index range into the paragraph's runs
    pub runs: Range<usize>,
    /// Concatenated text of those runs
    pub text: String,
    /// Byte range of each run inside `text`
    pub bounds: Vec<Range<usize>>,
}

impl TextGroup {
    fn starting_at(run: usize) -> Self {
        Self {
            runs: run..run,
            text: String::new(),
            bounds: Vec::new(),
        }
    }

    fn push(&mut self, text: &str) {
        let start = self.text.len();
        self.text.push_str(text);
        self.bounds.push(start..self.text.len());
        self.runs.end += 1;
    }

    /// Index within the group of the run holding byte `offset`
    fn source_at(&self, offset: usize) -> usize {
        self.bounds
            .iter()
            .position(|b| b.contains(&offset))
            .unwrap_or(0)
    }
}

pub(crate) fn text_groups(runs: &[Run]) -> Vec<TextGroup> {
    let mut groups = Vec::new();
    let mut current: Option<TextGroup> = None;

    for (idx, run) in runs.iter().enumerate() {
        match run.as_text() {
            Some(text) => current
                .get_or_insert_with(|| TextGroup::starting_at(idx))
                .push(text),
            None => groups.extend(current.take()),
        }
    }
    groups.extend(current.take());
    groups
}

/// Tags found in a paragraph, with the index of the group holding each
pub(crate) fn paragraph_tokens(paragraph: &Paragraph) -> Vec<(usize, Token)> {
    text_groups(&paragraph.runs)
        .iter()
        .enumerate()
        .flat_map(|(idx, group)| tokenize(&group.text).into_iter().map(move |t| (idx, t)))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
struct Fragment {
    text: String,
    /// Index within the group of the run the text came from
    source: usize,
    substituted: bool,
}

/// Collects fragments for one text group
struct FragmentWriter<'g> {
    group: &'g TextGroup,
    fragments: Vec<Fragment>,
}

impl<'g> FragmentWriter<'g> {
    fn new(group: &'g TextGroup) -> Self {
        Self {
            group,
            fragments: Vec::new(),
        }
    }

    /// Copy buffer bytes `span`, split at the original run boundaries
    fn literal(&mut self, span: Range<usize>) {
        let group = self.group;
        for (source, bound) in group.bounds.iter().enumerate() {
            let start = bound.start.max(span.start);
            let end = bound.end.min(span.end);
            if start < end {
                self.push(&group.text[start..end], source, false);
            }
        }
    }

    /// A substituted value owned by the run holding byte `at`
    fn value(&mut self, text: &str, at: usize) {
        self.push(text, self.group.source_at(at), true);
    }

    fn push(&mut self, text: &str, source: usize, substituted: bool) {
        if text.is_empty() {
            return;
        }
        match self.fragments.last_mut() {
            Some(last) if !substituted && !last.substituted && last.source == source => {
                last.text.push_str(text)
            }
            _ => self.fragments.push(Fragment {
                text: text.to_string(),
                source,
                substituted,
            }),
        }
    }

    /// Turn fragments into runs, `runs` being the group's original runs
    fn into_runs(self, runs: &[Run]) -> Vec<Run> {
        self.fragments
            .into_iter()
            .filter_map(|f| {
                let mut run = runs.get(f.source)?.clone();
                run.set_text(f.text);
                Some(run)
            })
            .collect()
    }
}

/// Render the template tags of `paragraph` in place
///
/// A paragraph without tags is left exactly as it is.
pub(crate) fn render_paragraph(paragraph: &mut Paragraph, template: &Template, scope: &Scope<'_>) {
    let groups = text_groups(&paragraph.runs);
    if !groups.iter().any(|g| g.text.contains("{{")) {
        return;
    }

    let mut runs = Vec::with_capacity(paragraph.runs.len());
    let mut cursor = 0;
    for group in &groups {
        runs.extend_from_slice(&paragraph.runs[cursor..group.runs.start]);
        runs.extend(render_group(
            &paragraph.runs[group.runs.clone()],
            group,
            template,
            scope,
        ));
        cursor = group.runs.end;
    }
    runs.extend_from_slice(&paragraph.runs[cursor..]);
    paragraph.runs = runs;
}

fn render_group(runs: &[Run], group: &TextGroup, template: &Template, scope: &Scope<'_>) -> Vec<Run> {
    let tokens = tokenize(&group.text);
    if tokens.is_empty() {
        return runs.to_vec();
    }
    let conditionals_only = tokens.iter().all(|t| {
        matches!(
            t.kind,
            TokenKind::Open { keyword: Keyword::If, .. } | TokenKind::Close { keyword: Keyword::If }
        )
    });

    // pass A: the flat buffer, so tags straddling runs resolve here
    let mut writer = FragmentWriter::new(group);
    walk(&parse(&group.text), template, scope, &mut writer);
    let mut rendered = writer.into_runs(runs);

    // pass B: conditionals carried in by substituted values
    if !conditionals_only {
        resolve_run_conditionals(&mut rendered, scope);
    }
    rendered
}

fn walk(nodes: &[Node], template: &Template, scope: &Scope<'_>, out: &mut FragmentWriter<'_>) {
    for node in nodes {
        match node {
            Node::Text { span, .. } | Node::Stray { span, .. } => out.literal(span.clone()),
            Node::Variable { name, span, .. } => match scope.value(name) {
                Some(value) => out.value(&value, span.start),
                None if scope.missing() == MissingVariable::Keep => out.literal(span.clone()),
                None => {}
            },
            Node::Conditional {
                condition, body, ..
            } => {
                if scope.condition(condition) {
                    walk(body, template, scope, out);
                }
            }
            Node::Loop { list, body, span, .. } => match scope.list(list) {
                Some(items) => scope.each_item(items, false, |item| walk(body, template, item, out)),
                None => out.literal(span.clone()),
            },
            Node::Block { name, body, span, .. } => match template.block_override(name) {
                Some(replacement) => {
                    let mut rendered = String::new();
                    text::render_nodes(&replacement, scope, &mut rendered);
                    out.value(&rendered, span.start);
                }
                None => walk(body, template, scope, out),
            },
            Node::Extends { .. } => {}
        }
    }
}

/// Resolve `{{#if}}` pairs that sit inside a single run's text
///
/// This runs after substitution, so a substituted value that itself holds
/// `{{#if name}}...{{/if}}` is resolved against the data's conditions too.
/// Variables inside such a value are not substituted again and stay
/// literal.
fn resolve_run_conditionals(runs: &mut Vec<Run>, scope: &Scope<'_>) {
    for run in runs.iter_mut() {
        let Some(text) = run.as_text() else { continue };
        let has_conditional = tokenize(text).iter().any(|t| {
            matches!(t.kind, TokenKind::Open { keyword: Keyword::If, .. })
        });
        if has_conditional {
            let mut resolved = String::new();
            write_conditionals(&parse(text), scope, &mut resolved);
            run.set_text(resolved);
        }
    }
    runs.retain(|run| run.as_text().map_or(true, |t| !t.is_empty()));
}

fn write_conditionals(nodes: &[Node], scope: &Scope<'_>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Conditional {
                condition, body, ..
            } => {
                if scope.condition(condition) {
                    write_conditionals(body, scope, out);
                }
            }
            other => other.write_source(out),
        }
    }
}

/// Delete bytes `span` of text group `group`, keeping run boundaries
pub(crate) fn remove_text(paragraph: &mut Paragraph, group: usize, span: Range<usize>) {
    let groups = text_groups(&paragraph.runs);
    let Some(group) = groups.get(group) else {
        return;
    };
    let mut writer = FragmentWriter::new(group);
    writer.literal(0..span.start);
    writer.literal(span.end..group.text.len());
    let runs = writer.into_runs(&paragraph.runs[group.runs.clone()]);
    paragraph.runs.splice(group.runs.clone(), runs);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TemplateData;
    use docweave_ooxml::{Drawing, RunProperties};
    use serde_json::json;

    fn bold() -> RunProperties {
        RunProperties {
            bold: true,
            ..RunProperties::default()
        }
    }

    fn italic() -> RunProperties {
        RunProperties {
            italic: true,
            ..RunProperties::default()
        }
    }

    fn paragraph(runs: Vec<Run>) -> Paragraph {
        Paragraph {
            runs,
            ..Paragraph::default()
        }
    }

    fn render(p: &mut Paragraph, data: &TemplateData) {
        let template = Template::parse("t", "");
        let scope = Scope::new(data, MissingVariable::Keep);
        render_paragraph(p, &template, &scope);
    }

    fn texts(p: &Paragraph) -> Vec<&str> {
        p.runs.iter().filter_map(Run::as_text).collect()
    }

    #[test]
    fn test_value_inherits_and_stays_separate() {
        let mut p = paragraph(vec![Run::styled("A{{x}}", bold()), Run::styled("B", italic())]);
        let mut data = TemplateData::new();
        data.set_variable("x", "1");
        render(&mut p, &data);

        assert_eq!(texts(&p), vec!["A", "1", "B"]);
        assert!(p.runs[0].properties.bold);
        assert!(p.runs[1].properties.bold);
        assert!(p.runs[2].properties.italic);
        assert!(!p.runs[2].properties.bold);
    }

    #[test]
    fn test_placeholder_split_across_runs() {
        let mut p = paragraph(vec![
            Run::styled("Dear {{na", italic()),
            Run::styled("me}},", bold()),
        ]);
        let mut data = TemplateData::new();
        data.set_variable("name", "Ada");
        render(&mut p, &data);

        assert_eq!(texts(&p), vec!["Dear ", "Ada", ","]);
        // the value belongs to the run the placeholder started in
        assert!(p.runs[1].properties.italic);
        assert!(p.runs[2].properties.bold);
    }

    #[test]
    fn test_untouched_without_tags() {
        let original = paragraph(vec![Run::styled("plain", bold()), Run::text(" {not a tag}")]);
        let mut p = original.clone();
        render(&mut p, &TemplateData::new());
        assert_eq!(p, original);

        let mut unknown = paragraph(vec![Run::text("{{ two words }}")]);
        let before = unknown.clone();
        render(&mut unknown, &TemplateData::new());
        assert_eq!(unknown, before);
    }

    #[test]
    fn test_missing_variable_keeps_slicing() {
        let original = paragraph(vec![Run::styled("x{{mis", bold()), Run::styled("sing}}y", italic())]);
        let mut p = original.clone();
        render(&mut p, &TemplateData::new());
        assert_eq!(p, original);
    }

    #[test]
    fn test_conditional_straddling_runs() {
        let mut p = paragraph(vec![
            Run::styled("a{{#if show}}b", bold()),
            Run::styled("c{{/if}}d", italic()),
        ]);
        let mut shown = TemplateData::new();
        shown.set_condition("show", true);
        let mut q = p.clone();

        render(&mut p, &shown);
        assert_eq!(texts(&p), vec!["ab", "cd"]);
        assert!(p.runs[0].properties.bold);

        render(&mut q, &TemplateData::new());
        assert_eq!(texts(&q), vec!["a", "d"]);
        assert!(q.runs[1].properties.italic);
    }

    #[test]
    fn test_non_text_runs_split_groups() {
        let mut p = paragraph(vec![
            Run::text("{{a}}"),
            Run::drawing(Drawing::new("<w:drawing/>")),
            Run::text("{{b}}"),
        ]);
        let mut data = TemplateData::new();
        data.set_variable("a", "1");
        data.set_variable("b", "2");
        render(&mut p, &data);

        assert_eq!(p.runs.len(), 3);
        assert_eq!(p.runs[0].as_text(), Some("1"));
        assert!(!p.runs[1].is_text());
        assert_eq!(p.runs[2].as_text(), Some("2"));
    }

    #[test]
    fn test_inline_loop_repeats_with_formatting() {
        let mut p = paragraph(vec![
            Run::styled("{{#each tags}}", bold()),
            Run::styled("#{{this}} ", italic()),
            Run::text("{{/each}}end"),
        ]);
        let mut data = TemplateData::new();
        data.set_list("tags", vec![json!("x"), json!("y")]);
        render(&mut p, &data);

        assert_eq!(p.text(), "#x #y end");
        assert!(p.runs.iter().take(p.runs.len() - 1).all(|r| r.properties.italic));
    }

    #[test]
    fn test_pass_b_resolves_conditionals_in_values() {
        let mut p = paragraph(vec![Run::text("[{{snippet}}]")]);
        let mut data = TemplateData::new();
        data.set_variable("snippet", "{{#if extra}}more{{/if}}done");
        render(&mut p, &data);
        assert_eq!(p.text(), "[done]");
    }

    #[test]
    fn test_pass_b_leaves_variables_in_values_literal() {
        let mut p = paragraph(vec![Run::text("{{snippet}}")]);
        let mut data = TemplateData::new();
        data.set_variable("snippet", "{{#if vip}}VIP {{name}}{{/if}}!");
        data.set_variable("name", "Ada");
        data.set_condition("vip", true);
        render(&mut p, &data);
        assert_eq!(p.text(), "VIP {{name}}!");
    }

    #[test]
    fn test_link_survives_substitution() {
        let mut p = paragraph(vec![Run::text("see "), Run::link("{{site}}", "rId4")]);
        let mut data = TemplateData::new();
        data.set_variable("site", "example.com");
        render(&mut p, &data);

        assert_eq!(p.text(), "see example.com");
        assert_eq!(p.runs[0].hyperlink, None);
        let link = p.runs[1].hyperlink.as_ref().unwrap();
        assert_eq!(link.relationship_id.as_deref(), Some("rId4"));
    }

    #[test]
    fn test_remove_text_keeps_boundaries() {
        let mut p = paragraph(vec![
            Run::styled("a{{#e", bold()),
            Run::styled("ach x}}b", italic()),
        ]);
        remove_text(&mut p, 0, 1..12);
        assert_eq!(texts(&p), vec!["a", "b"]);
        assert!(p.runs[1].properties.italic);
    }

    #[test]
    fn test_paragraph_tokens_report_group() {
        let p = paragraph(vec![
            Run::text("{{a}}"),
            Run::page_break(),
            Run::text("x{{#each rows}}"),
        ]);
        let tokens = paragraph_tokens(&p);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].0, 1);
        assert_eq!(tokens[1].1.start, 1);
    }
}
