//! Loading datasets into an immutable, request-scoped [`Table`].

pub mod csv;
pub mod excel;

use std::path::Path;

use bytes::Bytes;
use polars::prelude::*;

use crate::error::AppError;
use crate::models::DataPreview;

pub const SAMPLE_DATASET_NAME: &str = "Sample Dataset";
const SAMPLE_DATASET: &str = include_str!("../../../data/sample_dataset.csv");

/// A loaded dataset. Nothing mutates it once analysis starts.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    frame: DataFrame,
}

impl Table {
    pub fn new(name: impl Into<String>, frame: DataFrame) -> Self {
        Self {
            name: name.into(),
            frame,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn columns(&self) -> &[Series] {
        self.frame.get_columns()
    }

    pub fn column(&self, name: &str) -> Option<&Series> {
        self.frame.column(name).ok()
    }

    /// Numeric columns in table order. Booleans are not numeric.
    pub fn numeric_columns(&self) -> Vec<&Series> {
        self.columns()
            .iter()
            .filter(|series| series.dtype().is_numeric())
            .collect()
    }

    /// Text columns in table order.
    pub fn text_columns(&self) -> Vec<&Series> {
        self.columns()
            .iter()
            .filter(|series| matches!(series.dtype(), DataType::String))
            .collect()
    }

    /// The first `rows` rows, stringified.
    pub fn preview(&self, rows: usize) -> Result<DataPreview, AppError> {
        let head = self.frame.head(Some(rows));
        let columns = head.get_columns();

        let rows = (0..head.height())
            .map(|row| {
                columns
                    .iter()
                    .map(|series| Ok(cell_text(series.get(row)?)))
                    .collect::<PolarsResult<Vec<_>>>()
            })
            .collect::<PolarsResult<Vec<_>>>()?;

        Ok(DataPreview {
            columns: columns.iter().map(|s| s.name().to_string()).collect(),
            rows,
        })
    }

    /// File stem used for download names, e.g. `sales` for `sales.csv`.
    pub fn display_stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&self.name)
    }
}

fn cell_text(value: AnyValue<'_>) -> Option<String> {
    match value {
        AnyValue::Null => None,
        AnyValue::String(s) => Some(s.to_string()),
        other => Some(other.to_string()),
    }
}

#[derive(Debug)]
pub struct LoadedTable {
    pub table: Table,
    /// User-facing messages about how the data was read.
    pub notices: Vec<String>,
}

pub trait TableSource {
    fn load(&self) -> Result<LoadedTable, AppError>;
}

/// The dataset bundled with the binary.
pub struct SampleDataset;

impl TableSource for SampleDataset {
    fn load(&self) -> Result<LoadedTable, AppError> {
        tracing::info!("Loading built-in sample dataset");
        let frame = csv::read_utf8(SAMPLE_DATASET.as_bytes())?;
        Ok(LoadedTable {
            table: Table::new(SAMPLE_DATASET_NAME, frame),
            notices: vec!["Using built-in sample dataset".to_string()],
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Spreadsheet,
}

impl FileKind {
    pub fn from_file_name(file_name: &str) -> Result<Self, AppError> {
        let lower = file_name.to_lowercase();
        if lower.ends_with(".csv") {
            Ok(FileKind::Csv)
        } else if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
            Ok(FileKind::Spreadsheet)
        } else {
            Err(AppError::UnsupportedFileType(file_name.to_string()))
        }
    }
}

/// Raw bytes of a user-provided file.
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

impl TableSource for UploadedFile {
    fn load(&self) -> Result<LoadedTable, AppError> {
        let kind = FileKind::from_file_name(&self.file_name)?;
        tracing::info!(
            "Reading {} ({:?}, {}KB)",
            self.file_name,
            kind,
            self.bytes.len() / 1024
        );

        let (frame, notices) = match kind {
            FileKind::Csv => {
                let decoded = csv::read_with_fallback(&self.bytes)?;
                let notices = decoded.notice().into_iter().collect();
                (decoded.frame, notices)
            }
            FileKind::Spreadsheet => (
                excel::read_first_sheet(self.bytes.clone())?,
                vec!["Loaded Excel file successfully".to_string()],
            ),
        };

        tracing::info!(
            "Loaded {} rows x {} columns from {}",
            frame.height(),
            frame.width(),
            self.file_name
        );

        Ok(LoadedTable {
            table: Table::new(self.file_name.clone(), frame),
            notices,
        })
    }
}
