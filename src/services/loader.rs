//! Reads an uploaded tabular file into a DataFrame, dispatching on the file
//! extension. CSV goes through polars' reader; xlsx/xls go through calamine
//! with the first worksheet materialized column by column. Both paths trim
//! surrounding whitespace from column names so headers have stable identity
//! downstream.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;

use crate::error::AppError;
use crate::services::report::types::UploadedFile;

pub fn read_table(file: &UploadedFile) -> Result<DataFrame, AppError> {
    let extension = Path::new(&file.name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("csv") => read_csv(file),
        Some("xlsx") | Some("xls") => read_workbook(file),
        _ => Err(AppError::UnsupportedFormat(format!(
            "File '{}' must be .csv, .xlsx or .xls",
            file.name
        ))),
    }
}

fn read_csv(file: &UploadedFile) -> Result<DataFrame, AppError> {
    let cursor = Cursor::new(file.data.to_vec());
    let df = CsvReader::new(cursor)
        .has_header(true)
        .finish()
        .map_err(|e| AppError::Processing(format!("Failed to read '{}': {}", file.name, e)))?;
    trim_headers(df)
}

fn read_workbook(file: &UploadedFile) -> Result<DataFrame, AppError> {
    let cursor = Cursor::new(file.data.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| AppError::Processing(format!("Failed to open '{}': {}", file.name, e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let sheet_name = sheet_names.first().ok_or_else(|| {
        AppError::Processing(format!("Workbook '{}' has no sheets", file.name))
    })?;

    let range = workbook.worksheet_range(sheet_name).map_err(|e| {
        AppError::Processing(format!(
            "Failed to read sheet '{}' of '{}': {}",
            sheet_name, file.name, e
        ))
    })?;

    let rows: Vec<Vec<Data>> = range.rows().map(|row| row.to_vec()).collect();
    if rows.is_empty() {
        return Err(AppError::Processing(format!(
            "Sheet '{}' of '{}' is empty",
            sheet_name, file.name
        )));
    }

    let headers: Vec<String> = rows[0]
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();

    frame_from_rows(&rows, &headers)
}

fn trim_headers(mut df: DataFrame) -> Result<DataFrame, AppError> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.trim().to_string())
        .collect();
    df.set_column_names(&names)?;
    Ok(df)
}

fn frame_from_rows(rows: &[Vec<Data>], headers: &[String]) -> Result<DataFrame, AppError> {
    let mut columns = Vec::with_capacity(headers.len());

    for (col_idx, header) in headers.iter().enumerate() {
        let values: Vec<Data> = rows
            .iter()
            .skip(1) // Skip header row
            .map(|row| row.get(col_idx).cloned().unwrap_or(Data::Empty))
            .collect();

        let series = if is_numeric_column(&values) {
            let nums: Vec<Option<f64>> = values
                .iter()
                .map(|v| match v {
                    Data::Float(f) => Some(*f),
                    Data::Int(i) => Some(*i as f64),
                    _ => None,
                })
                .collect();
            Series::new(header, nums)
        } else {
            let strings: Vec<Option<String>> = values.iter().map(cell_to_string).collect();
            Series::new(header, strings)
        };

        columns.push(series);
    }

    Ok(DataFrame::new(columns)?)
}

fn is_numeric_column(values: &[Data]) -> bool {
    let mut numeric_count = 0;
    let mut total_count = 0;

    for value in values.iter().filter(|v| !matches!(v, Data::Empty)) {
        total_count += 1;
        if matches!(value, Data::Float(_) | Data::Int(_)) {
            numeric_count += 1;
        }
    }

    total_count > 0 && numeric_count as f64 / total_count as f64 > 0.5
}

fn cell_to_string(value: &Data) -> Option<String> {
    match value {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::DateTime(dt) => Some(match dt.as_datetime() {
            Some(ndt) if ndt.time() == chrono::NaiveTime::MIN => {
                ndt.format("%Y-%m-%d").to_string()
            }
            Some(ndt) => ndt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        }),
        other => Some(other.to_string()),
    }
}
