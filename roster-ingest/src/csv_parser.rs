use crate::FileParser;
use roster_core::{IngestError, RawRow};
use std::path::Path;

/// CSV parser. Ragged rows are accepted; missing trailing cells are absent.
#[derive(Debug, Clone, Copy)]
pub struct CsvParser {
    pub delimiter: u8,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl FileParser for CsvParser {
    fn parse(&self, path: &Path) -> Result<Vec<RawRow>, IngestError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_error)?;

        let headers = reader.headers().map_err(csv_error)?.clone();

        let mut rows: Vec<RawRow> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            rows.push(headers.iter().zip(record.iter()).collect());
        }
        Ok(rows)
    }
}

fn csv_error(err: csv::Error) -> IngestError {
    if err.is_io_error() {
        IngestError::Io {
            reason: err.to_string(),
        }
    } else {
        IngestError::Malformed {
            reason: format!("Failed to read CSV: {}", err),
        }
    }
}
