use std::{fs::File, io::Read, path::Path};

use crate::error::{Error, Result};

/// One data row with the 1-based line it started on.
pub(crate) struct Row {
    pub line: u64,
    pub record: csv::StringRecord,
}

pub(crate) fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| Error::read(path, e))
}

/// Read every data row, skipping the header. Rows may differ in length;
/// callers check the fields they need.
pub(crate) fn read_rows(source: impl Read, origin: &Path, delimiter: u8) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(source);

    let headers = reader.headers().map_err(|e| Error::csv(origin, e))?;
    if headers.is_empty() {
        return Err(Error::MissingHeader {
            path: origin.to_path_buf(),
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::csv(origin, e))?;
        let line = record.position().map_or(0, csv::Position::line);
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(Row { line, record });
    }
    Ok(rows)
}

/// Field `index` of `row`, failing when it is absent or blank.
pub(crate) fn field<'a>(
    row: &'a Row,
    origin: &Path,
    index: usize,
    expected: usize,
    name: &'static str,
) -> Result<&'a str> {
    let value = row.record.get(index).ok_or_else(|| Error::MissingField {
        path: origin.to_path_buf(),
        line: row.line,
        expected,
        found: row.record.len(),
    })?;
    if value.is_empty() {
        return Err(Error::EmptyField {
            path: origin.to_path_buf(),
            line: row.line,
            field: name,
        });
    }
    Ok(value)
}
