//! Shared column names and DataFrame accessors, plus the one identifier
//! normalization function every pipeline boundary goes through.

use polars::prelude::*;

use crate::error::AppError;

pub const SITE_ID: &str = "Site Id";
pub const LOGICAL_SITE_ID: &str = "Logical Site ID";
pub const SITE_IP: &str = "Site IP";
pub const CELL_NAME: &str = "4G Cell Name";
pub const VOLUME: &str = "Data Volume - Total (GB)";
pub const DATE: &str = "Date";

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|n| *n == name)
}

/// Column values stringified, nulls preserved.
pub fn column_as_strings(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, AppError> {
    let series = df.column(name)?.cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Column values as f64; values that cannot be read numerically become null.
pub fn column_as_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, AppError> {
    let series = df.column(name)?.cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().collect())
}

/// Normalizes a site identifier: trims whitespace and collapses a numeric
/// rendering with an all-zero fraction ("1042.0" -> "1042") so identifiers
/// that one source read as numbers and another as text still join.
pub fn normalize_identifier(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.split_once('.') {
        Some((integral, fraction))
            if !integral.is_empty()
                && integral.chars().all(|c| c.is_ascii_digit())
                && !fraction.is_empty()
                && fraction.chars().all(|c| c == '0') =>
        {
            integral.to_string()
        }
        _ => trimmed.to_string(),
    }
}
