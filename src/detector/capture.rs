use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::error::DataError;

/// Tabular capture export: a header row followed by one record per packet.
///
/// Columns are kept by name; anything besides `Protocol`, `Time` and
/// `Length` is carried along but never read.
#[derive(Debug, Clone)]
pub struct Capture {
    headers: Vec<String>,
    records: Vec<StringRecord>,
}

impl Capture {
    pub fn from_path(path: &Path) -> Result<Self, DataError> {
        ensure_csv_extension(path)?;
        let file = File::open(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let capture = Self::from_reader(BufReader::new(file))?;
        debug!(
            path = %path.display(),
            rows = capture.len(),
            columns = capture.headers.len(),
            "capture loaded"
        );
        Ok(capture)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() {
            return Err(DataError::NoColumns);
        }

        // Ragged records fail here; the reader is not flexible.
        let records = reader.records().collect::<Result<Vec<_>, _>>()?;

        Ok(Self { headers, records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Cell values of `name` in row order, or `None` if the header lacks it.
    /// A repeated header name resolves to its first occurrence.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a str> + 'a> {
        let idx = self.position(name)?;
        Some(self.records.iter().map(move |record| record.get(idx).unwrap_or("")))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }
}

fn ensure_csv_extension(path: &Path) -> Result<(), DataError> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        Ok(())
    } else {
        Err(DataError::UnsupportedFile(path.to_path_buf()))
    }
}
