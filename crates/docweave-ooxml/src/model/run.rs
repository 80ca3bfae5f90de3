//! Runs: the smallest uniformly formatted piece of a paragraph

use super::{BookmarkEnd, BookmarkStart};

/// Font slots of `w:rFonts`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunFonts {
    pub ascii: Option<String>,
    pub h_ansi: Option<String>,
    pub east_asia: Option<String>,
    pub cs: Option<String>,
    pub hint: Option<String>,
}

impl RunFonts {
    /// Use the same font for every script
    pub fn all(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            ascii: Some(name.clone()),
            h_ansi: Some(name.clone()),
            east_asia: Some(name.clone()),
            cs: Some(name),
            hint: None,
        }
    }
}

/// `w:vertAlign` values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    Baseline,
    Superscript,
    Subscript,
}

impl VerticalAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            VerticalAlign::Baseline => "baseline",
            VerticalAlign::Superscript => "superscript",
            VerticalAlign::Subscript => "subscript",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "baseline" => Some(VerticalAlign::Baseline),
            "superscript" => Some(VerticalAlign::Superscript),
            "subscript" => Some(VerticalAlign::Subscript),
            _ => None,
        }
    }
}

/// Character formatting (`w:rPr`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunProperties {
    /// Character style id (`w:rStyle`)
    pub style: Option<String>,
    pub fonts: Option<RunFonts>,
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    /// Hex color without the leading `#`
    pub color: Option<String>,
    /// Font size in half-points
    pub size: Option<u32>,
    pub highlight: Option<String>,
    /// Underline kind (`single`, `double`, ...)
    pub underline: Option<String>,
    pub vertical_align: Option<VerticalAlign>,
}

impl RunProperties {
    /// True when nothing would be written for these properties
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Convenience formatting for building runs from point sizes and CSS-style colors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextFormat {
    pub bold: bool,
    pub italic: bool,
    /// Size in points
    pub font_size: Option<f32>,
    /// Hex color, with or without a leading `#`
    pub color: Option<String>,
    pub font_name: Option<String>,
}

impl From<&TextFormat> for RunProperties {
    fn from(format: &TextFormat) -> Self {
        RunProperties {
            bold: format.bold,
            italic: format.italic,
            size: format
                .font_size
                .filter(|pt| *pt > 0.0)
                .map(|pt| (pt * 2.0).round() as u32),
            color: format
                .color
                .as_deref()
                .map(|c| c.trim_start_matches('#').to_string())
                .filter(|c| !c.is_empty()),
            fonts: format.font_name.clone().map(RunFonts::all),
            ..RunProperties::default()
        }
    }
}

/// `w:fldChar/@w:fldCharType`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCharKind {
    Begin,
    Separate,
    End,
}

impl FieldCharKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldCharKind::Begin => "begin",
            FieldCharKind::Separate => "separate",
            FieldCharKind::End => "end",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "begin" => Some(FieldCharKind::Begin),
            "separate" => Some(FieldCharKind::Separate),
            "end" => Some(FieldCharKind::End),
            _ => None,
        }
    }
}

/// `w:br/@w:type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakKind {
    TextWrapping,
    Page,
    Column,
}

/// An embedded graphic kept as the raw XML it was read or built from
///
/// Covers `w:drawing`, legacy `w:pict` and `mc:AlternateContent` wrappers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drawing {
    pub xml: String,
}

impl Drawing {
    pub fn new(xml: impl Into<String>) -> Self {
        Self { xml: xml.into() }
    }

    /// Relationship id of the embedded picture (`r:embed`), if any
    pub fn embedded_relationship(&self) -> Option<&str> {
        let start = self.xml.find("r:embed=\"")? + "r:embed=\"".len();
        let len = self.xml[start..].find('"')?;
        Some(&self.xml[start..start + len])
    }
}

/// The single payload of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunContent {
    Text(String),
    Drawing(Drawing),
    FieldChar(FieldCharKind),
    /// Field code text (`w:instrText`), e.g. ` TOC \o "1-3" `
    FieldInstruction(String),
    Break(BreakKind),
    Tab,
    FootnoteReference(u32),
    EndnoteReference(u32),
    /// A bookmark opening between runs; written bare, not inside `w:r`
    BookmarkStart(BookmarkStart),
    /// A bookmark closing between runs; written bare, not inside `w:r`
    BookmarkEnd(BookmarkEnd),
}

/// The `w:hyperlink` a run sits in
///
/// Consecutive runs with equal links are written inside one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hyperlink {
    /// `r:id` of an external target
    pub relationship_id: Option<String>,
    /// Bookmark name of an internal target (`w:anchor`)
    pub anchor: Option<String>,
}

/// A run: formatting plus exactly one payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub properties: RunProperties,
    pub content: RunContent,
    pub hyperlink: Option<Hyperlink>,
}

impl Run {
    pub fn new(content: RunContent) -> Self {
        Self {
            properties: RunProperties::default(),
            content,
            hyperlink: None,
        }
    }

    /// A plain text run
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(RunContent::Text(text.into()))
    }

    /// A text run with explicit formatting
    pub fn styled(text: impl Into<String>, properties: RunProperties) -> Self {
        Self {
            properties,
            content: RunContent::Text(text.into()),
            hyperlink: None,
        }
    }

    /// Text linked to relationship `relationship_id`
    pub fn link(text: impl Into<String>, relationship_id: impl Into<String>) -> Self {
        Self {
            hyperlink: Some(Hyperlink {
                relationship_id: Some(relationship_id.into()),
                anchor: None,
            }),
            ..Self::text(text)
        }
    }

    pub fn field_char(kind: FieldCharKind) -> Self {
        Self::new(RunContent::FieldChar(kind))
    }

    pub fn field_instruction(code: impl Into<String>) -> Self {
        Self::new(RunContent::FieldInstruction(code.into()))
    }

    pub fn drawing(drawing: Drawing) -> Self {
        Self::new(RunContent::Drawing(drawing))
    }

    pub fn page_break() -> Self {
        Self::new(RunContent::Break(BreakKind::Page))
    }

    /// The text payload, if this is a text run
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            RunContent::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.content, RunContent::Text(_))
    }

    /// True for bookmark markers, which only look like runs in the model
    pub fn is_marker(&self) -> bool {
        matches!(
            self.content,
            RunContent::BookmarkStart(_) | RunContent::BookmarkEnd(_)
        )
    }

    /// Replace the payload with text
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.content = RunContent::Text(text.into());
    }

    pub fn set_bold(&mut self, bold: bool) {
        self.properties.bold = bold;
    }

    pub fn set_italic(&mut self, italic: bool) {
        self.properties.italic = italic;
    }

    /// Font size in points; stored as half-points
    pub fn set_font_size(&mut self, points: f32) {
        self.properties.size = Some((points * 2.0).round() as u32);
    }

    pub fn set_color(&mut self, color: &str) {
        self.properties.color = Some(color.trim_start_matches('#').to_string());
    }

    pub fn set_font(&mut self, name: impl Into<String>) {
        self.properties.fonts = Some(RunFonts::all(name));
    }

    pub fn set_style(&mut self, style_id: impl Into<String>) {
        self.properties.style = Some(style_id.into());
    }
}
