//! Recursive-descent parser over the lexer's tokens
//!
//! Open and close tags are paired first with a stack, the way an editor
//! matches brackets. Pairs then nest genuinely: a conditional inside a loop
//! inside a block parses into exactly that tree. Tags left without a
//! partner become [`Node::Stray`] and render as their literal text, so
//! parsing never fails; strict checking lives in [`crate::validate`].

use std::ops::Range;

use crate::lexer::{tokenize, Keyword, Token, TokenKind};

/// Byte range of a node in the source it was parsed from
pub type Span = Range<usize>;

/// The literal open and close tags of a paired node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tags {
    pub open: String,
    pub close: String,
}

/// One node of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Literal text between tags
    Text { text: String, span: Span },

    /// `{{name}}`, with the tag as written
    Variable {
        name: String,
        raw: String,
        span: Span,
    },

    /// `{{#if condition}}...{{/if}}`
    Conditional {
        condition: String,
        body: Vec<Node>,
        tags: Tags,
        span: Span,
    },

    /// `{{#each list}}...{{/each}}`
    Loop {
        list: String,
        body: Vec<Node>,
        tags: Tags,
        span: Span,
    },

    /// `{{#block "name"}}...{{/block}}`
    Block {
        name: String,
        body: Vec<Node>,
        tags: Tags,
        span: Span,
    },

    /// `{{extends "parent"}}`
    Extends {
        parent: String,
        raw: String,
        span: Span,
    },

    /// An open or close tag with no partner
    Stray { text: String, span: Span },
}

impl Node {
    /// Source span covered by the node, tags included
    pub fn span(&self) -> &Span {
        match self {
            Node::Text { span, .. }
            | Node::Variable { span, .. }
            | Node::Conditional { span, .. }
            | Node::Loop { span, .. }
            | Node::Block { span, .. }
            | Node::Extends { span, .. }
            | Node::Stray { span, .. } => span,
        }
    }

    /// Append the node's literal source text to `out`
    pub fn write_source(&self, out: &mut String) {
        match self {
            Node::Text { text, .. } | Node::Stray { text, .. } => out.push_str(text),
            Node::Variable { raw, .. } | Node::Extends { raw, .. } => out.push_str(raw),
            Node::Conditional { body, tags, .. }
            | Node::Loop { body, tags, .. }
            | Node::Block { body, tags, .. } => {
                out.push_str(&tags.open);
                for node in body {
                    node.write_source(out);
                }
                out.push_str(&tags.close);
            }
        }
    }

    /// The node's literal source text
    pub fn source_text(&self) -> String {
        let mut out = String::new();
        self.write_source(&mut out);
        out
    }
}

/// Parse `source` into a node tree
pub fn parse(source: &str) -> Vec<Node> {
    let tokens = tokenize(source);
    let partners = pair_tokens(&tokens);
    let parser = Parser {
        source,
        tokens: &tokens,
        partners: &partners,
    };
    parser.parse_range(0, tokens.len(), 0, source.len())
}

/// For every token, the index of its partner tag if it has one
///
/// A close tag pairs with the nearest open tag of the same keyword. Open
/// tags it skips over are left unpaired.
fn pair_tokens(tokens: &[Token]) -> Vec<Option<usize>> {
    let mut partners = vec![None; tokens.len()];
    let mut stack: Vec<(usize, Keyword)> = Vec::new();

    for (idx, token) in tokens.iter().enumerate() {
        match &token.kind {
            TokenKind::Open { keyword, .. } => stack.push((idx, *keyword)),
            TokenKind::Close { keyword } => {
                if let Some(depth) = stack.iter().rposition(|(_, k)| k == keyword) {
                    let (open, _) = stack[depth];
                    stack.truncate(depth);
                    partners[open] = Some(idx);
                    partners[idx] = Some(open);
                }
            }
            TokenKind::Variable { .. } | TokenKind::Extends { .. } => {}
        }
    }

    partners
}

struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    partners: &'a [Option<usize>],
}

impl Parser<'_> {
    /// Parse tokens `first..last`, which cover bytes `from..to`
    fn parse_range(&self, first: usize, last: usize, from: usize, to: usize) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut cursor = from;
        let mut idx = first;

        while idx < last {
            let token = &self.tokens[idx];
            self.push_text(&mut nodes, cursor, token.start);
            let raw = token.raw(self.source).to_string();

            match (&token.kind, self.partners[idx]) {
                (TokenKind::Variable { name }, _) => {
                    nodes.push(Node::Variable {
                        name: name.clone(),
                        raw,
                        span: token.start..token.end(),
                    });
                }
                (TokenKind::Extends { parent }, _) => {
                    nodes.push(Node::Extends {
                        parent: parent.clone(),
                        raw,
                        span: token.start..token.end(),
                    });
                }
                (TokenKind::Open { keyword, arg }, Some(close_idx)) if close_idx > idx => {
                    let close = &self.tokens[close_idx];
                    let body = self.parse_range(idx + 1, close_idx, token.end(), close.start);
                    let tags = Tags {
                        open: raw,
                        close: close.raw(self.source).to_string(),
                    };
                    let span = token.start..close.end();
                    nodes.push(match keyword {
                        Keyword::If => Node::Conditional {
                            condition: arg.clone(),
                            body,
                            tags,
                            span,
                        },
                        Keyword::Each => Node::Loop {
                            list: arg.clone(),
                            body,
                            tags,
                            span,
                        },
                        Keyword::Block => Node::Block {
                            name: arg.clone(),
                            body,
                            tags,
                            span,
                        },
                    });
                    cursor = close.end();
                    idx = close_idx + 1;
                    continue;
                }
                _ => {
                    nodes.push(Node::Stray {
                        text: raw,
                        span: token.start..token.end(),
                    });
                }
            }

            cursor = token.end();
            idx += 1;
        }

        self.push_text(&mut nodes, cursor, to);
        nodes
    }

    fn push_text(&self, nodes: &mut Vec<Node>, from: usize, to: usize) {
        if from < to {
            nodes.push(Node::Text {
                text: self.source[from..to].to_string(),
                span: from..to,
            });
        }
    }
}

/// Depth-first search for the first block named `name`
pub fn find_block<'a>(nodes: &'a [Node], name: &str) -> Option<&'a Node> {
    for node in nodes {
        match node {
            Node::Block { name: n, .. } if n == name => return Some(node),
            Node::Conditional { body, .. } | Node::Loop { body, .. } | Node::Block { body, .. } => {
                if let Some(found) = find_block(body, name) {
                    return Some(found);
                }
            }
            _ => {}
        }
    }
    None
}

/// Depth-first search for the first `extends` tag
pub fn find_extends(nodes: &[Node]) -> Option<&str> {
    nodes.iter().find_map(|node| match node {
        Node::Extends { parent, .. } => Some(parent.as_str()),
        Node::Conditional { body, .. } | Node::Loop { body, .. } | Node::Block { body, .. } => {
            find_extends(body)
        }
        _ => None,
    })
}
