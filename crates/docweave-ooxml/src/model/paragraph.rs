//! Paragraphs and their properties

use super::run::{Run, RunProperties, TextFormat};
use super::section::SectionProperties;

/// Paragraph justification (`w:jc`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    /// Justified on both edges
    Both,
}

impl Alignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Both => "both",
        }
    }

    /// Accepts both the transitional and the strict spellings
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "both" | "distribute" => Some(Alignment::Both),
            _ => None,
        }
    }
}

/// `w:spacing`, all values in twips except `line`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spacing {
    pub before: Option<u32>,
    pub after: Option<u32>,
    /// In 240ths of a line when `line_rule` is `auto`
    pub line: Option<u32>,
    pub line_rule: Option<String>,
}

/// `w:ind`, in twips
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Indentation {
    pub left: Option<i32>,
    pub right: Option<i32>,
    pub first_line: Option<u32>,
    pub hanging: Option<u32>,
}

/// List membership (`w:numPr`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberingRef {
    pub num_id: u32,
    pub level: u32,
}

/// Paragraph formatting (`w:pPr`)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParagraphProperties {
    pub style: Option<String>,
    pub keep_next: bool,
    pub keep_lines: bool,
    pub page_break_before: bool,
    pub numbering: Option<NumberingRef>,
    pub spacing: Option<Spacing>,
    pub indentation: Option<Indentation>,
    pub alignment: Option<Alignment>,
    /// Section break carried by the last paragraph of a non-final section
    pub section: Option<Box<SectionProperties>>,
}

impl ParagraphProperties {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A paragraph: properties plus an ordered run sequence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub properties: ParagraphProperties,
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A paragraph holding one plain text run
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut paragraph = Self::new();
        paragraph.add_text(text);
        paragraph
    }

    /// Append a run and return it for further formatting
    pub fn add_run(&mut self, run: Run) -> &mut Run {
        self.runs.push(run);
        let last = self.runs.len() - 1;
        &mut self.runs[last]
    }

    /// Append a plain text run
    pub fn add_text(&mut self, text: impl Into<String>) -> &mut Run {
        self.add_run(Run::text(text))
    }

    /// Append a text run formatted from `format`
    pub fn add_formatted_text(&mut self, text: impl Into<String>, format: &TextFormat) -> &mut Run {
        self.add_run(Run::styled(text, RunProperties::from(format)))
    }

    /// Concatenated text of all text runs
    pub fn text(&self) -> String {
        self.runs.iter().filter_map(Run::as_text).collect()
    }

    /// No runs, or only empty text runs
    pub fn is_empty(&self) -> bool {
        self.runs
            .iter()
            .all(|run| run.as_text().is_some_and(str::is_empty))
    }

    pub fn set_style(&mut self, style_id: impl Into<String>) {
        self.properties.style = Some(style_id.into());
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.properties.alignment = Some(alignment);
    }

    /// Spacing around the paragraph in points, plus an optional line multiple
    ///
    /// Points are stored as twips (x20); `line` of 1.5 becomes 360/240.
    pub fn set_spacing(&mut self, before_pt: f32, after_pt: f32, line: Option<f32>) {
        self.properties.spacing = Some(Spacing {
            before: Some((before_pt.max(0.0) * 20.0).round() as u32),
            after: Some((after_pt.max(0.0) * 20.0).round() as u32),
            line: line.map(|l| (l.max(0.0) * 240.0).round() as u32),
            line_rule: line.map(|_| "auto".to_string()),
        });
    }

    pub fn set_indentation(&mut self, indentation: Indentation) {
        self.properties.indentation = Some(indentation);
    }

    pub fn set_numbering(&mut self, num_id: u32, level: u32) {
        self.properties.numbering = Some(NumberingRef { num_id, level });
    }
}
