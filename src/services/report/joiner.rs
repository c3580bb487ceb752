//! Combines the three daily KPI tables into one wide table, one volume column
//! per day, then attaches the IP identifier through the resolver mapping.
//!
//! Site mode keys rows by site identifier alone: the deduplicated union of
//! sites across the three days defines the row set, and each day projects a
//! site -> volume map onto it. Cell mode keys rows by (cell, site) with full
//! outer join semantics: a row survives if any day carries it, and days
//! without it leave the volume missing. Rows keep first-appearance order.

use polars::prelude::DataFrame;
use std::collections::{HashMap, HashSet};

use crate::error::AppError;
use crate::services::report::columns::{
    column_as_f64, column_as_strings, has_column, normalize_identifier, CELL_NAME, DATE, SITE_ID,
    VOLUME,
};
use crate::services::report::types::{JoinMode, ReportRow, ReportTable};

pub fn join_by_site(
    days: &[DataFrame],
    ip_map: &HashMap<String, String>,
) -> Result<ReportTable, AppError> {
    check_day_schemas(days, &[SITE_ID, VOLUME])?;

    let mut day_labels = Vec::with_capacity(days.len());
    let mut day_maps: Vec<HashMap<String, Option<f64>>> = Vec::with_capacity(days.len());
    let mut order: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (idx, df) in days.iter().enumerate() {
        day_labels.push(day_label(df, idx)?);

        let sites = column_as_strings(df, SITE_ID)?;
        let volumes = column_as_f64(df, VOLUME)?;

        let mut volume_map = HashMap::with_capacity(sites.len());
        for (site, volume) in sites.iter().zip(volumes) {
            let Some(site) = site else { continue };
            let site = normalize_identifier(site);
            if seen.insert(site.clone()) {
                order.push(site.clone());
            }
            volume_map.insert(site, volume);
        }
        day_maps.push(volume_map);
    }

    let rows = order
        .into_iter()
        .map(|site| {
            let volumes = day_maps
                .iter()
                .map(|m| m.get(&site).copied().flatten())
                .collect();
            let ip = ip_map.get(&site).cloned();
            ReportRow {
                cell: None,
                site,
                ip,
                volumes,
            }
        })
        .collect();

    Ok(ReportTable {
        mode: JoinMode::Site,
        day_labels,
        rows,
    })
}

pub fn join_by_cell(
    days: &[DataFrame],
    ip_map: &HashMap<String, String>,
) -> Result<ReportTable, AppError> {
    check_day_schemas(days, &[CELL_NAME, SITE_ID, VOLUME])?;

    let day_count = days.len();
    let mut day_labels = Vec::with_capacity(day_count);
    let mut order: Vec<(String, String)> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut volumes: Vec<Vec<Option<f64>>> = Vec::new();

    for (idx, df) in days.iter().enumerate() {
        day_labels.push(day_label(df, idx)?);

        let cells = column_as_strings(df, CELL_NAME)?;
        let sites = column_as_strings(df, SITE_ID)?;
        let day_volumes = column_as_f64(df, VOLUME)?;

        for ((cell, site), volume) in cells.iter().zip(sites.iter()).zip(day_volumes) {
            let cell = cell.as_deref().map(str::trim).unwrap_or_default().to_string();
            let site = site.as_deref().map(normalize_identifier).unwrap_or_default();

            let key = (cell, site);
            let row_idx = *index.entry(key.clone()).or_insert_with(|| {
                order.push(key.clone());
                volumes.push(vec![None; day_count]);
                volumes.len() - 1
            });
            volumes[row_idx][idx] = volume;
        }
    }

    let rows = order
        .into_iter()
        .zip(volumes)
        .map(|((cell, site), row_volumes)| {
            let ip = ip_map.get(&site).cloned();
            ReportRow {
                cell: Some(cell),
                site,
                ip,
                volumes: row_volumes,
            }
        })
        .collect();

    Ok(ReportTable {
        mode: JoinMode::Cell,
        day_labels,
        rows,
    })
}

/// Verifies every day's table up front, so a bad schema aborts before any
/// output exists. The error names the missing column(s) per day.
fn check_day_schemas(days: &[DataFrame], required: &[&str]) -> Result<(), AppError> {
    let mut problems = Vec::new();
    for (idx, df) in days.iter().enumerate() {
        let missing: Vec<String> = required
            .iter()
            .filter(|&&name| !has_column(df, name))
            .map(|name| format!("'{}'", name))
            .collect();
        if !missing.is_empty() {
            problems.push(format!(
                "KPI Day {} is missing column(s): {}",
                idx + 1,
                missing.join(", ")
            ));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::Schema(problems.join("; ")))
    }
}

/// Label for a day's volume column: first value of the "Date" column, or
/// "Day<N>" (1-indexed) when the column is absent or its first value blank.
fn day_label(df: &DataFrame, idx: usize) -> Result<String, AppError> {
    if has_column(df, DATE) {
        let values = column_as_strings(df, DATE)?;
        if let Some(Some(first)) = values.first() {
            let trimmed = first.trim();
            if !trimmed.is_empty() {
                return Ok(trimmed.to_string());
            }
        }
    }
    Ok(format!("Day{}", idx + 1))
}
