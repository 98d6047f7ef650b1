//! Loader for historical customer datasets (CSV with a header row, or a JSON array).

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use super::record::{CustomerRecord, parse_cell};

#[derive(Debug, Error)]
pub enum DatasetLoadError {
    #[error("failed to open dataset {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("dataset JSON must be an array of records")]
    NotAnArray,
    #[error("row {row} is not a JSON object")]
    NotAnObject { row: usize },
    #[error("duplicate column {column} in header")]
    DuplicateColumn { column: String },
}

/// On-disk dataset layouts, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Json,
}

impl DatasetFormat {
    /// `.json` files are JSON arrays; everything else is read as CSV.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Self::Json,
            _ => Self::Csv,
        }
    }
}

/// Load every record of the dataset at `path`.
pub fn load_records(path: &Path) -> Result<Vec<CustomerRecord>, DatasetLoadError> {
    let file = File::open(path).map_err(|source| DatasetLoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    let records = match DatasetFormat::from_path(path) {
        DatasetFormat::Csv => read_csv_records(reader)?,
        DatasetFormat::Json => read_json_records(reader)?,
    };
    tracing::debug!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Parse CSV with a header row; cells are typed with [`parse_cell`].
pub fn read_csv_records<R: Read>(reader: R) -> Result<Vec<CustomerRecord>, DatasetLoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|header| header.trim_start_matches('\u{feff}').to_string())
        .collect();
    for (idx, header) in headers.iter().enumerate() {
        if headers[..idx].contains(header) {
            return Err(DatasetLoadError::DuplicateColumn {
                column: header.clone(),
            });
        }
    }

    let mut out = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let record = headers
            .iter()
            .zip(row.iter())
            .map(|(column, cell)| (column.clone(), parse_cell(cell)))
            .collect::<CustomerRecord>();
        out.push(record);
    }
    Ok(out)
}

/// Parse a JSON array of objects.
pub fn read_json_records<R: Read>(reader: R) -> Result<Vec<CustomerRecord>, DatasetLoadError> {
    let value: Value = serde_json::from_reader(reader)?;
    let Value::Array(rows) = value else {
        return Err(DatasetLoadError::NotAnArray);
    };
    rows.into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Value::Object(map) => Ok(CustomerRecord::from(map)),
            _ => Err(DatasetLoadError::NotAnObject { row }),
        })
        .collect()
}
