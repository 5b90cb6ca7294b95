//! The in-memory table a session answers questions about.
//!
//! A [`Dataset`] is produced by the loader and never edited afterwards; every
//! question runs against the same immutable frame until another file is loaded.

use polars::prelude::*;
use std::fmt;

/// Text encoding that successfully decoded the source bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Utf8 => write!(f, "UTF-8"),
            TextEncoding::Latin1 => write!(f, "Latin-1"),
        }
    }
}

/// A CSV record dropped because its field count did not match the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line number in the decoded text
    pub line: u64,
    pub expected_fields: usize,
    pub found_fields: usize,
}

impl fmt::Display for SkippedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: expected {} fields, found {}",
            self.line, self.expected_fields, self.found_fields
        )
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
    source: String,
    encoding: TextEncoding,
    skipped_rows: Vec<SkippedRow>,
}

impl Dataset {
    pub fn new(
        frame: DataFrame,
        source: impl Into<String>,
        encoding: TextEncoding,
        skipped_rows: Vec<SkippedRow>,
    ) -> Self {
        Self {
            frame,
            source: source.into(),
            encoding,
            skipped_rows,
        }
    }

    /// Wrap an existing frame (UTF-8, nothing skipped)
    pub fn from_frame(frame: DataFrame, source: impl Into<String>) -> Self {
        Self::new(frame, source, TextEncoding::Utf8, Vec::new())
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Display name of the sample or uploaded file
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn skipped_rows(&self) -> &[SkippedRow] {
        &self.skipped_rows
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame
            .get_column_names()
            .iter()
            .any(|column| column.as_str() == name)
    }

    /// Column names paired with their polars dtype names
    pub fn schema_summary(&self) -> Vec<(String, String)> {
        self.frame
            .get_columns()
            .iter()
            .map(|column| (column.name().to_string(), column.dtype().to_string()))
            .collect()
    }

    /// First `rows` rows as display strings
    pub fn preview(&self, rows: usize) -> PolarsResult<TablePreview> {
        TablePreview::from_frame(&self.frame, rows)
    }
}

/// A rectangular, already-formatted slice of a frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TablePreview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TablePreview {
    pub fn from_frame(df: &DataFrame, max_rows: usize) -> PolarsResult<Self> {
        let head = df.head(Some(max_rows));
        let headers = head
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        let mut rows = Vec::with_capacity(head.height());
        for i in 0..head.height() {
            let row = head
                .get_columns()
                .iter()
                .map(|column| column.get(i).map(|value| cell_text(&value)))
                .collect::<PolarsResult<Vec<_>>>()?;
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// GitHub-flavored markdown table
    pub fn to_markdown(&self) -> String {
        markdown_table(&self.headers, &self.rows)
    }
}

/// Row count for `LazyFrame::limit`, saturating where `IdxSize` is narrower
pub fn idx_limit(rows: usize) -> IdxSize {
    IdxSize::try_from(rows).unwrap_or(IdxSize::MAX)
}

/// Render a polars value for display; nulls become empty cells
pub fn cell_text(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        other => other.str_value().to_string(),
    }
}

/// Render headers and rows as a markdown table
pub fn markdown_table<H, R, C>(headers: &[H], rows: &[R]) -> String
where
    H: AsRef<str>,
    R: AsRef<[C]>,
    C: AsRef<str>,
{
    let mut out = String::new();
    let header_cells: Vec<String> = headers.iter().map(|h| escape_cell(h.as_ref())).collect();
    out.push_str(&format!("| {} |\n", header_cells.join(" | ")));
    out.push_str(&format!("|{}\n", " --- |".repeat(headers.len())));
    for row in rows {
        let cells: Vec<String> = row
            .as_ref()
            .iter()
            .map(|cell| escape_cell(cell.as_ref()))
            .collect();
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    out
}

fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|").replace(['\n', '\r'], " ")
}
