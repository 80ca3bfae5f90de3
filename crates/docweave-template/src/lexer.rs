//! Tokenization of template sources
//!
//! A single forward pass over the bytes finds every `{{...}}` pair and
//! classifies its content. Anything that does not classify stays literal
//! text, so the lexer never fails.
//!
//! `{{{name}}}` is the same variable as `{{name}}`; values are never
//! escaped, so the triple form only exists for templates written for
//! other engines.

/// Keywords that open and close a tag pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    If,
    Each,
    Block,
}

impl Keyword {
    fn parse(word: &str) -> Option<Self> {
        match word {
            "if" => Some(Self::If),
            "each" => Some(Self::Each),
            "block" => Some(Self::Block),
            _ => None,
        }
    }

    /// Keyword as written in a tag
    pub fn as_str(self) -> &'static str {
        match self {
            Self::If => "if",
            Self::Each => "each",
            Self::Block => "block",
        }
    }
}

/// Classified content of one `{{...}}` tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// `{{name}}`
    Variable { name: String },

    /// `{{#if cond}}`, `{{#each list}}` or `{{#block "name"}}`
    Open { keyword: Keyword, arg: String },

    /// `{{/if}}`, `{{/each}}` or `{{/block}}`
    Close { keyword: Keyword },

    /// `{{extends "parent"}}`
    Extends { parent: String },
}

/// A single classified tag with its position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the opening `{{` (or `{{{`)
    pub start: usize,
    /// Length in bytes including both delimiters
    pub length: usize,
    /// 1-based line of the opening `{{`
    pub line: usize,
}

impl Token {
    /// Byte offset just past the closing `}}`
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// The tag text exactly as written in `source`
    pub fn raw<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end()]
    }
}

/// Scanner state
///
/// ```text
/// Normal ──{{ or {{{──> InToken ──}}}──> [variable only] → Normal
///                         │  │
///                         │  └──}}──> [classify] → Normal
///                         │
///                         └──{{──> InToken (restart, earlier {{ is literal)
/// ```
///
/// A `{{{` closed by plain `}}` leaves its first brace literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    InToken { start: usize, line: usize, triple: bool },
}

/// Tokenize `source` into its classified tags, in source order
///
/// Unclosed `{{` and tags with unknown content are left out and therefore
/// stay literal text.
pub fn tokenize(source: &str) -> Vec<Token> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut state = ScanState::Normal;
    let mut line = 1;
    let mut pos = 0;

    while pos < bytes.len() {
        let pair = bytes.get(pos..pos + 2);
        match (state, pair) {
            (_, Some(b"{{")) => {
                let triple = bytes.get(pos + 2) == Some(&b'{');
                state = ScanState::InToken {
                    start: pos,
                    line,
                    triple,
                };
                pos += if triple { 3 } else { 2 };
                continue;
            }
            (
                ScanState::InToken {
                    start,
                    line: token_line,
                    triple,
                },
                Some(b"}}"),
            ) => {
                let content_start = if triple { start + 3 } else { start + 2 };
                let kind = classify(&source[content_start..pos]);
                let (start, end, kind) = match (triple, bytes.get(pos + 2)) {
                    (true, Some(b'}')) => (
                        start,
                        pos + 3,
                        kind.filter(|k| matches!(k, TokenKind::Variable { .. })),
                    ),
                    (true, _) => (start + 1, pos + 2, kind),
                    (false, _) => (start, pos + 2, kind),
                };
                if let Some(kind) = kind {
                    tokens.push(Token {
                        kind,
                        start,
                        length: end - start,
                        line: token_line,
                    });
                }
                state = ScanState::Normal;
                pos = end;
                continue;
            }
            _ => {}
        }
        if bytes[pos] == b'\n' {
            line += 1;
        }
        pos += 1;
    }

    tokens
}

/// Classify the content between `{{` and `}}`
fn classify(content: &str) -> Option<TokenKind> {
    let content = content.trim();

    if let Some(rest) = content.strip_prefix('#') {
        let (word, args) = split_word(rest);
        let keyword = Keyword::parse(word)?;
        let arg = match keyword {
            Keyword::Block => quoted(args)?,
            Keyword::If if is_name(args) => args.to_string(),
            Keyword::Each if is_plain_name(args) => args.to_string(),
            _ => return None,
        };
        return Some(TokenKind::Open { keyword, arg });
    }

    if let Some(rest) = content.strip_prefix('/') {
        let keyword = Keyword::parse(rest.trim())?;
        return Some(TokenKind::Close { keyword });
    }

    let (word, args) = split_word(content);
    if word == "extends" {
        return quoted(args).map(|parent| TokenKind::Extends { parent });
    }

    is_name(content).then(|| TokenKind::Variable {
        name: content.to_string(),
    })
}

/// Split off the first whitespace-delimited word
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(idx) => (&s[..idx], s[idx..].trim()),
        None => (s, ""),
    }
}

/// `"name"` with a non-empty body free of quotes
fn quoted(s: &str) -> Option<String> {
    let inner = s.strip_prefix('"')?.strip_suffix('"')?;
    (!inner.is_empty() && !inner.contains('"')).then(|| inner.to_string())
}

/// Word characters, optionally prefixed with `@`
pub fn is_name(s: &str) -> bool {
    is_plain_name(s.strip_prefix('@').unwrap_or(s))
}

fn is_plain_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_variable_positions() {
        let tokens = tokenize("Hi {{name}}!");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].start, 3);
        assert_eq!(tokens[0].length, 8);
        assert_eq!(tokens[0].raw("Hi {{name}}!"), "{{name}}");
    }

    #[test]
    fn test_whitespace_inside_tags() {
        assert_eq!(
            kinds("{{ name }}{{# if  shown }}{{/ if }}"),
            vec![
                TokenKind::Variable {
                    name: "name".to_string()
                },
                TokenKind::Open {
                    keyword: Keyword::If,
                    arg: "shown".to_string()
                },
                TokenKind::Close {
                    keyword: Keyword::If
                },
            ]
        );
    }

    #[test]
    fn test_block_and_extends_need_quotes() {
        assert_eq!(
            kinds(r#"{{extends "base"}}{{#block "content"}}{{/block}}"#),
            vec![
                TokenKind::Extends {
                    parent: "base".to_string()
                },
                TokenKind::Open {
                    keyword: Keyword::Block,
                    arg: "content".to_string()
                },
                TokenKind::Close {
                    keyword: Keyword::Block
                },
            ]
        );
        assert!(kinds("{{#block content}}{{extends base}}").is_empty());
    }

    #[test]
    fn test_loop_variables() {
        assert_eq!(
            kinds("{{@index}}{{this}}"),
            vec![
                TokenKind::Variable {
                    name: "@index".to_string()
                },
                TokenKind::Variable {
                    name: "this".to_string()
                },
            ]
        );
        // a list name cannot carry the @ prefix
        assert!(kinds("{{#each @items}}").is_empty());
    }

    #[test]
    fn test_unknown_content_is_literal() {
        assert!(kinds("{{ two words }}{{#unless x}}{{}}{{a.b}}").is_empty());
    }

    #[test]
    fn test_unclosed_and_restarted_tags() {
        assert!(kinds("{{name").is_empty());
        let tokens = tokenize("{{ {{name}}");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].start, 3);
    }

    #[test]
    fn test_triple_braces_are_a_variable() {
        let source = "Hi {{{name}}}!";
        let tokens = tokenize(source);
        assert_eq!(tokens.len(), 1);
        assert_eq!(
            tokens[0].kind,
            TokenKind::Variable {
                name: "name".to_string()
            }
        );
        assert_eq!(tokens[0].raw(source), "{{{name}}}");
        assert_eq!(tokens[0].length, 10);
    }

    #[test]
    fn test_triple_braces_edge_cases() {
        // only variables take the triple form
        assert!(kinds("{{{#if x}}}{{{/if}}}").is_empty());

        // a triple opening closed by two braces keeps one brace literal
        let source = "{{{name}}";
        let tokens = tokenize(source);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].raw(source), "{{name}}");
        assert_eq!(tokens[0].start, 1);
    }

    #[test]
    fn test_line_numbers() {
        let tokens = tokenize("a\n{{x}}\n\n{{/if}}");
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[1].line, 4);
    }

    #[test]
    fn test_multibyte_text_around_tags() {
        let source = "für {{name}} – ok";
        let tokens = tokenize(source);
        assert_eq!(tokens[0].raw(source), "{{name}}");
    }
}
