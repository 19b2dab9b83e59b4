use std::path::{Path, PathBuf};

use scrape_core::{PostRecord, CSV_COLUMNS};

use crate::filename::{download_filename, export_filename};
use crate::persist::{PersistError, ResultsDir};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no posts to export")]
    NoRecords,
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub path: PathBuf,
    pub download_name: String,
    pub content: String,
}

/// Renders records as CSV with a header row and CRLF line endings.
///
/// Every row carries the request keyword (empty when there is none).
pub fn encode_csv(records: &[PostRecord], keyword: Option<&str>) -> Result<String, ExportError> {
    if records.is_empty() {
        return Err(ExportError::NoRecords);
    }
    let keyword = keyword.unwrap_or_default();

    let mut buffer = String::new();
    push_row(&mut buffer, CSV_COLUMNS.iter().copied());
    for record in records {
        let cells = record.csv_cells(keyword);
        push_row(&mut buffer, cells.iter().map(String::as_str));
    }
    Ok(buffer)
}

/// Encodes `records` and stores them under `dir` with a timestamped name.
pub fn write_csv_export(
    dir: &Path,
    username: &str,
    keyword: Option<&str>,
    records: &[PostRecord],
    unix_ts: i64,
) -> Result<CsvExport, ExportError> {
    let content = encode_csv(records, keyword)?;
    let path = ResultsDir::open(dir)?.store(
        &export_filename(username, keyword, unix_ts),
        content.as_bytes(),
    )?;
    Ok(CsvExport {
        path,
        download_name: download_filename(username, keyword),
        content,
    })
}

fn push_row<'a>(buffer: &mut String, cells: impl Iterator<Item = &'a str>) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            buffer.push(',');
        }
        push_cell(buffer, cell);
    }
    buffer.push_str("\r\n");
}

fn push_cell(buffer: &mut String, cell: &str) {
    let needs_quotes = cell.contains([',', '"', '\n', '\r'])
        || cell.starts_with(' ')
        || cell.ends_with(' ');
    if !needs_quotes {
        buffer.push_str(cell);
        return;
    }
    buffer.push('"');
    for c in cell.chars() {
        if c == '"' {
            buffer.push('"');
        }
        buffer.push(c);
    }
    buffer.push('"');
}
