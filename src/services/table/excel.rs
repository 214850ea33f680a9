use std::collections::HashSet;
use std::io::Cursor;

use bytes::Bytes;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use polars::prelude::*;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Numeric,
    Boolean,
    Text,
}

/// Reads the first worksheet of an `.xlsx`/`.xls` workbook; its first row is the header.
pub fn read_first_sheet(file_data: Bytes) -> Result<DataFrame, AppError> {
    let start = std::time::Instant::now();
    let cursor = Cursor::new(file_data);

    let mut workbook = open_workbook_auto_from_rs(cursor).map_err(|e| {
        tracing::error!("Failed to open workbook: {}", e);
        AppError::FileRead(format!("Failed to open Excel file: {}", e))
    })?;

    let sheet_names = workbook.sheet_names().to_vec();
    tracing::debug!("Found {} sheets: {:?}", sheet_names.len(), sheet_names);
    let sheet_name = sheet_names
        .first()
        .ok_or_else(|| AppError::FileRead("No sheets found in workbook".to_string()))?;

    let range = workbook.worksheet_range(sheet_name).map_err(|e| {
        tracing::error!("Failed to read worksheet {}: {}", sheet_name, e);
        AppError::FileRead(format!("Failed to read worksheet {}: {}", sheet_name, e))
    })?;

    let rows: Vec<Vec<Data>> = range.rows().map(|row| row.to_vec()).collect();
    let header_row = rows
        .first()
        .ok_or_else(|| AppError::FileRead(format!("Sheet {} is empty", sheet_name)))?;

    let mut existing_names = HashSet::new();
    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| header_name(cell, idx, &mut existing_names))
        .collect();

    let frame = build_frame(&rows[1..], &headers)?;
    tracing::info!(
        "Read sheet {} ({} rows) in {:?}",
        sheet_name,
        frame.height(),
        start.elapsed()
    );
    Ok(frame)
}

/// Blank headers become `Unnamed: <idx>`; repeats get a `.<n>` suffix.
fn header_name(cell: &Data, idx: usize, existing_names: &mut HashSet<String>) -> String {
    let raw = match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    };
    let base = if raw.is_empty() {
        format!("Unnamed: {}", idx)
    } else {
        raw
    };

    let mut name = base.clone();
    let mut counter = 1;
    while !existing_names.insert(name.clone()) {
        name = format!("{}.{}", base, counter);
        counter += 1;
    }
    name
}

fn detect_cell_kind(values: &[Data]) -> CellKind {
    let (numeric, boolean, filled) = values
        .iter()
        .filter(|v| !matches!(v, Data::Empty))
        .fold((0usize, 0usize, 0usize), |(num, flags, total), value| match value {
            Data::Float(_) | Data::Int(_) => (num + 1, flags, total + 1),
            Data::Bool(_) => (num, flags + 1, total + 1),
            _ => (num, flags, total + 1),
        });

    // an empty column reads as numeric, with every cell null
    match () {
        _ if numeric == filled => CellKind::Numeric,
        _ if boolean == filled => CellKind::Boolean,
        _ => CellKind::Text,
    }
}

fn cell_text(value: &Data) -> Option<String> {
    match value {
        Data::Empty => None,
        Data::DateTime(dt) => Some(
            dt.as_datetime()
                .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| dt.as_f64().to_string()),
        ),
        Data::String(s) if s.trim().is_empty() => None,
        other => Some(other.to_string()),
    }
}

fn build_frame(rows: &[Vec<Data>], headers: &[String]) -> Result<DataFrame, AppError> {
    let columns = headers
        .iter()
        .enumerate()
        .map(|(col_idx, header)| {
            let values: Vec<Data> = rows
                .iter()
                .map(|row| row.get(col_idx).cloned().unwrap_or(Data::Empty))
                .collect();

            match detect_cell_kind(&values) {
                CellKind::Numeric => {
                    let nums: Vec<Option<f64>> = values
                        .iter()
                        .map(|v| match v {
                            Data::Float(f) => Some(*f),
                            Data::Int(i) => Some(*i as f64),
                            _ => None,
                        })
                        .collect();
                    Series::new(header, nums)
                }
                CellKind::Boolean => {
                    let flags: Vec<Option<bool>> = values
                        .iter()
                        .map(|v| match v {
                            Data::Bool(b) => Some(*b),
                            _ => None,
                        })
                        .collect();
                    Series::new(header, flags)
                }
                CellKind::Text => {
                    let strings: Vec<Option<String>> = values.iter().map(cell_text).collect();
                    Series::new(header, strings)
                }
            }
        })
        .collect::<Vec<_>>();

    DataFrame::new(columns)
        .map_err(|e| AppError::FileRead(format!("Failed to create DataFrame: {}", e)))
}
