//! Tables: rows of cells holding paragraphs

use super::paragraph::{Alignment, Paragraph};
use super::RawXml;
use crate::error::{OoxmlError, Result};

/// Unit of a table or cell width (`w:type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidthUnit {
    Auto,
    /// Twentieths of a point
    Dxa,
    /// Fiftieths of a percent
    Pct,
    Nil,
}

impl WidthUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            WidthUnit::Auto => "auto",
            WidthUnit::Dxa => "dxa",
            WidthUnit::Pct => "pct",
            WidthUnit::Nil => "nil",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "dxa" => WidthUnit::Dxa,
            "pct" => WidthUnit::Pct,
            "nil" => WidthUnit::Nil,
            _ => WidthUnit::Auto,
        }
    }
}

/// `w:tblW` / `w:tcW`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Width {
    pub value: u32,
    pub unit: WidthUnit,
}

impl Width {
    pub fn dxa(value: u32) -> Self {
        Self {
            value,
            unit: WidthUnit::Dxa,
        }
    }

    pub fn auto() -> Self {
        Self {
            value: 0,
            unit: WidthUnit::Auto,
        }
    }
}

/// `w:tblPr`
///
/// Borders, cell margins and the look flags are cosmetic; they are carried
/// through as raw XML so that rendering a styled table keeps its appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableProperties {
    pub style: Option<String>,
    pub width: Option<Width>,
    pub alignment: Option<Alignment>,
    pub borders: Option<RawXml>,
    pub fixed_layout: bool,
    pub cell_margins: Option<RawXml>,
    pub look: Option<RawXml>,
}

/// `w:trPr`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowProperties {
    pub cant_split: bool,
    /// Row height in twips
    pub height: Option<u32>,
    /// Repeat as header row on each page
    pub header: bool,
}

/// `w:vMerge`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalMerge {
    Restart,
    Continue,
}

/// `w:tcPr`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellProperties {
    pub width: Option<Width>,
    pub grid_span: Option<u32>,
    pub vertical_merge: Option<VerticalMerge>,
    pub borders: Option<RawXml>,
    pub shading: Option<RawXml>,
    /// `top`, `center` or `bottom`
    pub vertical_align: Option<String>,
}

/// A table cell
///
/// OOXML requires at least one paragraph per cell; an empty cell gets one
/// written for it on serialization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableCell {
    pub properties: CellProperties,
    pub paragraphs: Vec<Paragraph>,
}

impl TableCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            properties: CellProperties::default(),
            paragraphs: vec![Paragraph::with_text(text)],
        }
    }

    /// Paragraph texts joined with newlines
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace the content with a single paragraph of text
    ///
    /// Keeps the first paragraph's properties and the first run's formatting.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let mut paragraph = self.paragraphs.first().cloned().unwrap_or_default();
        let properties = paragraph
            .runs
            .iter()
            .find(|r| r.is_text())
            .map(|r| r.properties.clone())
            .unwrap_or_default();
        paragraph.runs.clear();
        paragraph.add_text(text).properties = properties;
        self.paragraphs = vec![paragraph];
    }
}

/// A table row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRow {
    pub properties: RowProperties,
    pub cells: Vec<TableCell>,
}

impl TableRow {
    /// A row of plain text cells
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            properties: RowProperties::default(),
            cells: texts.into_iter().map(TableCell::with_text).collect(),
        }
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.cells.iter().flat_map(|c| c.paragraphs.iter())
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.cells.iter_mut().flat_map(|c| c.paragraphs.iter_mut())
    }
}

/// A table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub properties: TableProperties,
    /// Column widths in twips (`w:tblGrid`)
    pub grid: Vec<u32>,
    pub rows: Vec<TableRow>,
}

/// Usable width of a one-inch-margin A4 page in twips
const DEFAULT_TABLE_WIDTH: u32 = 9026;

impl Table {
    /// An empty `rows` x `cols` table with equal column widths
    pub fn new(rows: usize, cols: usize) -> Self {
        let cols = cols.max(1);
        let column_width = DEFAULT_TABLE_WIDTH / cols as u32;
        let row = TableRow {
            properties: RowProperties::default(),
            cells: (0..cols)
                .map(|_| TableCell {
                    properties: CellProperties {
                        width: Some(Width::dxa(column_width)),
                        ..CellProperties::default()
                    },
                    paragraphs: vec![Paragraph::new()],
                })
                .collect(),
        };

        Self {
            properties: TableProperties {
                width: Some(Width::auto()),
                ..TableProperties::default()
            },
            grid: vec![column_width; cols],
            rows: vec![row; rows],
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Widest row, or the grid when there are no rows
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.cells.len())
            .max()
            .unwrap_or(self.grid.len())
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&TableCell> {
        self.rows.get(row)?.cells.get(col)
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut TableCell> {
        self.rows.get_mut(row)?.cells.get_mut(col)
    }

    pub fn cell_text(&self, row: usize, col: usize) -> Option<String> {
        self.cell(row, col).map(TableCell::text)
    }

    pub fn set_cell_text(&mut self, row: usize, col: usize, text: impl Into<String>) -> Result<()> {
        let rows = self.rows.len();
        let r = self.rows.get_mut(row).ok_or(OoxmlError::IndexOutOfRange {
            what: "row",
            index: row,
            len: rows,
        })?;
        let cols = r.cells.len();
        let cell = r.cells.get_mut(col).ok_or(OoxmlError::IndexOutOfRange {
            what: "column",
            index: col,
            len: cols,
        })?;
        cell.set_text(text);
        Ok(())
    }

    /// Append a row of plain text cells
    pub fn append_row<I, S>(&mut self, texts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(TableRow::from_texts(texts));
    }

    /// Insert a row before `index`; `index == row_count()` appends
    pub fn insert_row(&mut self, index: usize, row: TableRow) -> Result<()> {
        if index > self.rows.len() {
            return Err(OoxmlError::IndexOutOfRange {
                what: "row",
                index,
                len: self.rows.len(),
            });
        }
        self.rows.insert(index, row);
        Ok(())
    }

    pub fn remove_row(&mut self, index: usize) -> Option<TableRow> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.rows.iter().flat_map(TableRow::paragraphs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::run::Run;

    #[test]
    fn test_new_table_shape() {
        let table = Table::new(3, 4);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 4);
        assert_eq!(table.grid.len(), 4);
        assert_eq!(table.cell_text(2, 3).as_deref(), Some(""));
        assert!(table.cell(3, 0).is_none());
    }

    #[test]
    fn test_set_cell_text_keeps_run_formatting() {
        let mut table = Table::new(1, 1);
        let cell = table.cell_mut(0, 0).unwrap();
        cell.paragraphs[0].add_run(Run::text("old")).set_bold(true);

        table.set_cell_text(0, 0, "new").unwrap();
        let cell = table.cell(0, 0).unwrap();
        assert_eq!(cell.text(), "new");
        assert!(cell.paragraphs[0].runs[0].properties.bold);
    }

    #[test]
    fn test_set_cell_text_out_of_range() {
        let mut table = Table::new(2, 2);
        let err = table.set_cell_text(0, 5, "x").unwrap_err();
        assert!(matches!(
            err,
            OoxmlError::IndexOutOfRange {
                what: "column",
                index: 5,
                len: 2
            }
        ));
    }

    #[test]
    fn test_row_operations() {
        let mut table = Table::new(0, 2);
        table.append_row(["a", "b"]);
        table.append_row(["c", "d"]);
        table
            .insert_row(1, TableRow::from_texts(["x", "y"]))
            .unwrap();
        assert_eq!(table.cell_text(1, 0).as_deref(), Some("x"));
        assert!(table.insert_row(9, TableRow::default()).is_err());

        let removed = table.remove_row(0).unwrap();
        assert_eq!(removed.cells[1].text(), "b");
        assert!(table.remove_row(5).is_none());
        assert_eq!(table.row_count(), 2);
    }
}
