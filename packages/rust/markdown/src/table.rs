//! CSV result sheets rendered as GitHub-flavored Markdown tables.

use std::path::Path;

use tracing::debug;

use resultgen_shared::{Result, ResultgenError};

/// UTF-8 byte-order mark, as spreadsheet exports like to prepend it.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Rendered in place of a table when the CSV had no rows at all.
pub const NO_DATA_PLACEHOLDER: &str = "*No data available*";

/// A parsed CSV sheet, normalised so every row has the header's width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// First row of the file. Column names need not be unique.
    pub header: Vec<String>,
    /// Data rows, padded with empty cells or truncated to `header.len()`.
    pub rows: Vec<Vec<String>>,
    /// 1-based data row numbers that had to be padded or truncated.
    pub adjusted_rows: Vec<usize>,
}

impl Table {
    /// Parse CSV bytes. `source` is only used for error reporting.
    ///
    /// A leading BOM is dropped. Rows of the wrong width are normalised,
    /// never rejected. Invalid UTF-8 or broken quoting is an error.
    pub fn from_csv(data: &[u8], source: &Path) -> Result<Self> {
        let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data);
        let mut records = reader.records();

        let header: Vec<String> = match records.next() {
            None => return Ok(Self::default()),
            Some(record) => record
                .map_err(|e| ResultgenError::table(source, e.to_string()))?
                .iter()
                .map(str::to_owned)
                .collect(),
        };
        let width = header.len();

        let mut rows = Vec::new();
        let mut adjusted_rows = Vec::new();
        for (i, record) in records.enumerate() {
            let record = record.map_err(|e| ResultgenError::table(source, e.to_string()))?;
            let mut row: Vec<String> = record.iter().map(str::to_owned).collect();
            if row.len() != width {
                adjusted_rows.push(i + 1);
                row.resize(width, String::new());
            }
            rows.push(row);
        }

        debug!(
            source = %source.display(),
            columns = width,
            rows = rows.len(),
            adjusted = adjusted_rows.len(),
            "parsed csv"
        );

        Ok(Self {
            header,
            rows,
            adjusted_rows,
        })
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// Render as a Markdown table: header, separator, then one line per row.
    ///
    /// A sheet with no columns renders [`NO_DATA_PLACEHOLDER`] instead.
    pub fn to_markdown(&self) -> String {
        if self.header.is_empty() {
            return format!("{NO_DATA_PLACEHOLDER}\n");
        }

        let mut md = String::new();
        push_row(&mut md, self.header.iter().map(String::as_str));
        push_row(&mut md, std::iter::repeat_n("---", self.width()));
        for row in &self.rows {
            push_row(&mut md, row.iter().map(String::as_str));
        }
        md
    }
}

fn push_row<'a>(md: &mut String, cells: impl Iterator<Item = &'a str>) {
    md.push('|');
    for cell in cells {
        md.push(' ');
        md.push_str(&escape_cell(cell));
        md.push_str(" |");
    }
    md.push('\n');
}

/// Escape characters that would break a table row: pipes and line breaks.
///
/// Backslashes directly before a pipe or a line break are doubled so they
/// still render literally once the pipe is escaped.
pub fn escape_cell(cell: &str) -> String {
    let mut out = String::with_capacity(cell.len());
    let mut backslashes = 0;
    let mut chars = cell.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                backslashes += 1;
                out.push('\\');
                continue;
            }
            '|' => {
                out.extend(std::iter::repeat_n('\\', backslashes));
                out.push_str("\\|");
            }
            '\r' | '\n' => {
                if ch == '\r' {
                    chars.next_if_eq(&'\n');
                }
                out.extend(std::iter::repeat_n('\\', backslashes));
                out.push_str("<br>");
            }
            _ => out.push(ch),
        }
        backslashes = 0;
    }
    out
}
