//! Table loop unrolling
//!
//! The first row containing `{{#each list}}` is a template row: it is
//! repeated once per list item with the loop tags removed, item fields
//! substituted and conditionals answered by the item alone. Every other row
//! is rendered like ordinary paragraphs.

use docweave_ooxml::{Table, TableRow};

use super::paragraph::{paragraph_tokens, remove_text, render_paragraph};
use super::Scope;
use crate::lexer::{Keyword, TokenKind};
use crate::template::Template;

pub(crate) fn render_table(table: &mut Table, template: &Template, scope: &Scope<'_>) {
    let Some((row_idx, list)) = find_loop_row(table) else {
        render_rows(&mut table.rows, template, scope);
        return;
    };

    let mut template_row = table.rows.remove(row_idx);
    render_rows(&mut table.rows, template, scope);
    strip_loop_tags(&mut template_row, &list);

    let mut expanded = Vec::new();
    match scope.list(&list) {
        Some(items) => {
            log::debug!("Unrolling table loop {} over {} items", list, items.len());
            scope.each_item(items, true, |item| {
                let mut row = template_row.clone();
                for paragraph in row.paragraphs_mut() {
                    render_paragraph(paragraph, template, item);
                }
                expanded.push(row);
            });
        }
        None => log::warn!("List {} not defined, table loop row removed", list),
    }
    table.rows.splice(row_idx..row_idx, expanded);
}

fn render_rows(rows: &mut [TableRow], template: &Template, scope: &Scope<'_>) {
    for row in rows {
        for paragraph in row.paragraphs_mut() {
            render_paragraph(paragraph, template, scope);
        }
    }
}

/// First row holding an `{{#each}}` open tag, with the list it names
fn find_loop_row(table: &Table) -> Option<(usize, String)> {
    table.rows.iter().enumerate().find_map(|(idx, row)| {
        row.paragraphs()
            .flat_map(paragraph_tokens)
            .find_map(|(_, token)| match token.kind {
                TokenKind::Open {
                    keyword: Keyword::Each,
                    arg,
                } => Some((idx, arg)),
                _ => None,
            })
    })
}

/// Where a tag sits inside a row
#[derive(Debug, Clone, PartialEq)]
struct TagLocation {
    cell: usize,
    paragraph: usize,
    group: usize,
    span: std::ops::Range<usize>,
    opens: bool,
}

/// Remove the row's first `{{#each list}}` and the last `{{/each}}` after it
fn strip_loop_tags(row: &mut TableRow, list: &str) {
    let mut tags = Vec::new();
    for (c, cell) in row.cells.iter().enumerate() {
        for (p, paragraph) in cell.paragraphs.iter().enumerate() {
            for (group, token) in paragraph_tokens(paragraph) {
                let opens = match &token.kind {
                    TokenKind::Open {
                        keyword: Keyword::Each,
                        arg,
                    } if arg == list => true,
                    TokenKind::Close {
                        keyword: Keyword::Each,
                    } => false,
                    _ => continue,
                };
                tags.push(TagLocation {
                    cell: c,
                    paragraph: p,
                    group,
                    span: token.start..token.end(),
                    opens,
                });
            }
        }
    }

    let Some(open) = tags.iter().position(|t| t.opens) else {
        return;
    };
    let close = tags.iter().rposition(|t| !t.opens).filter(|&close| close > open);

    // later tag first so the earlier location stays valid
    for idx in close.into_iter().chain(Some(open)) {
        let tag = &tags[idx];
        if let Some(paragraph) = row
            .cells
            .get_mut(tag.cell)
            .and_then(|cell| cell.paragraphs.get_mut(tag.paragraph))
        {
            remove_text(paragraph, tag.group, tag.span.clone());
        }
    }
}
