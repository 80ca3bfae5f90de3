//! Section properties (`w:sectPr`)

/// Page orientation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// `w:pgSz`, in twips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize {
    pub width: u32,
    pub height: u32,
    pub orientation: Orientation,
}

/// `w:pgMar`, in twips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMargins {
    pub top: i32,
    pub right: u32,
    pub bottom: i32,
    pub left: u32,
    pub header: u32,
    pub footer: u32,
    pub gutter: u32,
}

/// Which pages a header or footer applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFooterKind {
    Default,
    First,
    Even,
}

impl HeaderFooterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HeaderFooterKind::Default => "default",
            HeaderFooterKind::First => "first",
            HeaderFooterKind::Even => "even",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "default" => Some(HeaderFooterKind::Default),
            "first" => Some(HeaderFooterKind::First),
            "even" => Some(HeaderFooterKind::Even),
            _ => None,
        }
    }
}

/// A `w:headerReference` or `w:footerReference`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFooterRef {
    pub kind: HeaderFooterKind,
    pub relationship_id: String,
}

/// `w:cols`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Columns {
    pub count: u32,
    /// Gap between columns in twips
    pub space: Option<u32>,
}

/// `w:pgNumType`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageNumbering {
    /// `decimal`, `lowerRoman`, ...
    pub format: Option<String>,
    pub start: Option<u32>,
}

/// Page setup for one section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionProperties {
    pub headers: Vec<HeaderFooterRef>,
    pub footers: Vec<HeaderFooterRef>,
    pub page_size: Option<PageSize>,
    pub margins: Option<PageMargins>,
    pub page_numbering: Option<PageNumbering>,
    pub columns: Option<Columns>,
    /// Distinct first-page header/footer
    pub title_page: bool,
    /// `w:docGrid/@w:linePitch`
    pub line_pitch: Option<u32>,
}

impl SectionProperties {
    /// A4 portrait with one-inch margins
    pub fn a4() -> Self {
        Self {
            page_size: Some(PageSize {
                width: 11906,
                height: 16838,
                orientation: Orientation::Portrait,
            }),
            margins: Some(PageMargins {
                top: 1440,
                right: 1440,
                bottom: 1440,
                left: 1440,
                header: 720,
                footer: 720,
                gutter: 0,
            }),
            columns: Some(Columns {
                count: 1,
                space: Some(720),
            }),
            line_pitch: Some(360),
            ..Self::default()
        }
    }

    /// Swap width and height and flag the page as landscape
    pub fn set_landscape(&mut self) {
        if let Some(size) = self.page_size.as_mut() {
            if size.orientation != Orientation::Landscape {
                std::mem::swap(&mut size.width, &mut size.height);
                size.orientation = Orientation::Landscape;
            }
        }
    }

    /// Header reference of a given kind
    pub fn header(&self, kind: HeaderFooterKind) -> Option<&HeaderFooterRef> {
        self.headers.iter().find(|h| h.kind == kind)
    }

    /// Footer reference of a given kind
    pub fn footer(&self, kind: HeaderFooterKind) -> Option<&HeaderFooterRef> {
        self.footers.iter().find(|f| f.kind == kind)
    }

    /// Point the header of `kind` at a relationship, replacing any previous one
    pub fn set_header(&mut self, kind: HeaderFooterKind, relationship_id: impl Into<String>) {
        set_reference(&mut self.headers, kind, relationship_id.into());
    }

    /// Point the footer of `kind` at a relationship, replacing any previous one
    pub fn set_footer(&mut self, kind: HeaderFooterKind, relationship_id: impl Into<String>) {
        set_reference(&mut self.footers, kind, relationship_id.into());
    }
}

fn set_reference(refs: &mut Vec<HeaderFooterRef>, kind: HeaderFooterKind, relationship_id: String) {
    match refs.iter_mut().find(|r| r.kind == kind) {
        Some(existing) => existing.relationship_id = relationship_id,
        None => refs.push(HeaderFooterRef {
            kind,
            relationship_id,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landscape_swaps_once() {
        let mut section = SectionProperties::a4();
        section.set_landscape();
        section.set_landscape();
        let size = section.page_size.unwrap();
        assert_eq!((size.width, size.height), (16838, 11906));
        assert_eq!(size.orientation, Orientation::Landscape);
    }

    #[test]
    fn test_set_header_replaces_same_kind() {
        let mut section = SectionProperties::default();
        section.set_header(HeaderFooterKind::Default, "rId7");
        section.set_header(HeaderFooterKind::First, "rId8");
        section.set_header(HeaderFooterKind::Default, "rId9");
        assert_eq!(section.headers.len(), 2);
        assert_eq!(
            section.header(HeaderFooterKind::Default).unwrap().relationship_id,
            "rId9"
        );
        assert!(section.footer(HeaderFooterKind::Default).is_none());
    }
}
