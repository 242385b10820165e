//! Roster Ingest - Upload File Parsing
//!
//! Turns an uploaded `.csv`, `.xlsx` or `.xls` file into ordered
//! [`RawRow`]s. The first row of the file (or the first worksheet) is the
//! header row. Normalization happens later, in roster-core.

mod csv_parser;
mod spreadsheet;

pub use csv_parser::CsvParser;
pub use spreadsheet::{rows_from_range, SpreadsheetParser};

use roster_core::{IngestError, RawRow};
use std::path::Path;

/// Accepted upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
    Xls,
}

impl FileFormat {
    /// Resolve an extension, with or without the leading dot.
    pub fn from_extension(ext: &str) -> Result<Self, IngestError> {
        match ext.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" => Ok(FileFormat::Xlsx),
            "xls" => Ok(FileFormat::Xls),
            _ => Err(IngestError::UnsupportedExtension {
                extension: ext.to_string(),
            }),
        }
    }

    /// Resolve from an original file name such as `contacts.CSV`.
    pub fn from_file_name(name: &str) -> Result<Self, IngestError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(ext)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Xlsx => "xlsx",
            FileFormat::Xls => "xls",
        }
    }

    /// The parser for this format.
    pub fn parser(&self) -> Box<dyn FileParser> {
        match self {
            FileFormat::Csv => Box::new(CsvParser::default()),
            FileFormat::Xlsx | FileFormat::Xls => Box::new(SpreadsheetParser::new(*self)),
        }
    }
}

/// Reads a staged upload into raw rows.
pub trait FileParser: Send + Sync {
    fn parse(&self, path: &Path) -> Result<Vec<RawRow>, IngestError>;
}

/// Parse `path` using the parser selected by `ext`.
pub fn parse_file(path: &Path, ext: &str) -> Result<Vec<RawRow>, IngestError> {
    FileFormat::from_extension(ext)?.parser().parse(path)
}
