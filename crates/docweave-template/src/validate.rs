//! Strict syntax checking
//!
//! Rendering is lenient and never fails on malformed tags. These checks are
//! an optional pre-flight step that reports the first problem found.

use crate::error::{Result, TemplateError};
use crate::lexer::{tokenize, Keyword, Token, TokenKind};
use crate::template::Template;

/// Check the source of `template`
pub fn validate(template: &Template) -> Result<()> {
    validate_source(template.content())
}

/// Check that `{{`/`}}` counts match and block, if and each tags balance
pub fn validate_source(content: &str) -> Result<()> {
    let opening = content.matches("{{").count();
    let closing = content.matches("}}").count();
    if opening != closing {
        return Err(TemplateError::validation(
            "brackets",
            format!("{} opening, {} closing", opening, closing),
            "mismatched template brackets",
        ));
    }

    let tokens = tokenize(content);
    let mut open_tags: Vec<(Keyword, &Token)> = Vec::new();
    for token in &tokens {
        match &token.kind {
            TokenKind::Open { keyword, .. } => open_tags.push((*keyword, token)),
            TokenKind::Close { keyword } => match open_tags.pop() {
                Some((open, _)) if open == *keyword => {}
                Some((open, open_token)) => {
                    return Err(TemplateError::validation(
                        field(open),
                        format!("line {}", open_token.line),
                        format!("{} closed by {}", open_tag(open), close_tag(*keyword)),
                    ));
                }
                None => {
                    return Err(TemplateError::validation(
                        field(*keyword),
                        format!("line {}", token.line),
                        format!("{} without {}", close_tag(*keyword), open_tag(*keyword)),
                    ));
                }
            },
            TokenKind::Variable { .. } | TokenKind::Extends { .. } => {}
        }
    }

    match open_tags.pop() {
        Some((open, token)) => Err(TemplateError::validation(
            field(open),
            format!("line {}", token.line),
            format!("unclosed {}", open_tag(open)),
        )),
        None => Ok(()),
    }
}

fn field(keyword: Keyword) -> &'static str {
    match keyword {
        Keyword::If => "if_statements",
        Keyword::Each => "each_statements",
        Keyword::Block => "block_statements",
    }
}

fn open_tag(keyword: Keyword) -> String {
    format!("{{{{#{}}}}}", keyword.as_str())
}

fn close_tag(keyword: Keyword) -> String {
    format!("{{{{/{}}}}}", keyword.as_str())
}
