use crate::{FileFormat, FileParser};
use calamine::{open_workbook, Data, Range, Reader, Xls, Xlsx};
use roster_core::{IngestError, RawRow};
use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Excel parser. Only the first worksheet is read.
#[derive(Debug, Clone, Copy)]
pub struct SpreadsheetParser {
    format: FileFormat,
}

impl SpreadsheetParser {
    pub fn new(format: FileFormat) -> Self {
        Self { format }
    }
}

impl FileParser for SpreadsheetParser {
    fn parse(&self, path: &Path) -> Result<Vec<RawRow>, IngestError> {
        let range = match self.format {
            FileFormat::Xls => first_sheet(open_workbook::<Xls<_>, _>(path).map_err(malformed)?)?,
            _ => first_sheet(open_workbook::<Xlsx<_>, _>(path).map_err(malformed)?)?,
        };
        Ok(rows_from_range(&range))
    }
}

fn first_sheet<R>(mut workbook: R) -> Result<Range<Data>, IngestError>
where
    R: Reader<BufReader<File>>,
    R::Error: Display,
{
    let Some(name) = workbook.sheet_names().first().cloned() else {
        return Ok(Range::empty());
    };
    workbook.worksheet_range(&name).map_err(malformed)
}

fn malformed(err: impl Display) -> IngestError {
    IngestError::Malformed {
        reason: format!("Failed to read spreadsheet: {}", err),
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// Convert a worksheet range to rows. The first row supplies the headers;
/// rows with no non-empty cell are skipped.
pub fn rows_from_range(range: &Range<Data>) -> Vec<RawRow> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_row.iter().map(cell_text).collect();

    rows.filter_map(|cells| {
        let values: Vec<String> = cells.iter().map(cell_text).collect();
        if values.iter().all(String::is_empty) {
            return None;
        }
        Some(
            headers
                .iter()
                .cloned()
                .zip(values)
                .filter(|(header, _)| !header.is_empty())
                .collect(),
        )
    })
    .collect()
}
