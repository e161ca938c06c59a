//! Source lists: a CSV file with a `url` column.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, SpeechcutError};

/// Column that must be present in every source list.
pub const URL_COLUMN: &str = "url";

/// Read the unique, non-empty URLs from a CSV file, in first-seen order.
///
/// # Errors
/// - `Csv` if the file cannot be opened or parsed.
/// - `MissingColumn` if the header has no `url` column.
pub fn read_source_urls(path: &Path) -> Result<Vec<String>> {
    let file = std::fs::File::open(path)?;
    let urls = read_source_urls_from(file)?;
    info!(path = %path.display(), count = urls.len(), "loaded source list");
    Ok(urls)
}

/// Same as [`read_source_urls`] for any reader.
pub fn read_source_urls_from<R: Read>(reader: R) -> Result<Vec<String>> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let column = csv
        .headers()?
        .iter()
        .position(|h| h.trim() == URL_COLUMN)
        .ok_or_else(|| SpeechcutError::MissingColumn {
            column: URL_COLUMN.into(),
        })?;

    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for record in csv.records() {
        let record = record?;
        let Some(url) = record.get(column).map(str::trim) else {
            continue;
        };
        if url.is_empty() {
            continue;
        }
        if seen.insert(url.to_string()) {
            urls.push(url.to_string());
        } else {
            debug!(url, "skipping duplicate source");
        }
    }
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupes_and_skips_blank_cells_in_order() {
        let csv = "title,url\n\
                   a,https://example.com/b\n\
                   b,\n\
                   c,https://example.com/a\n\
                   d,https://example.com/b\n\
                   e,  https://example.com/c  \n";
        let urls = read_source_urls_from(csv.as_bytes()).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://example.com/b",
                "https://example.com/a",
                "https://example.com/c",
            ]
        );
    }

    #[test]
    fn short_rows_are_skipped() {
        let csv = "id,url\n1\n2,https://example.com/x\n";
        let urls = read_source_urls_from(csv.as_bytes()).unwrap();
        assert_eq!(urls, vec!["https://example.com/x"]);
    }

    #[test]
    fn missing_url_column_is_an_error() {
        let csv = "link\nhttps://example.com\n";
        let err = read_source_urls_from(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, SpeechcutError::MissingColumn { .. }));
    }
}
