use bytes::Bytes;
use std::collections::HashSet;
use std::str::FromStr;

use crate::error::AppError;

/// One uploaded file: its client-declared name (used for format dispatch) and
/// raw content.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub data: Bytes,
}

/// The four inputs of one report run.
#[derive(Debug)]
pub struct ReportInputs {
    pub tracker: UploadedFile,
    pub kpi_days: [UploadedFile; 3],
}

/// Join granularity: one row per site, or one row per (cell, site) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    Site,
    Cell,
}

impl FromStr for JoinMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "site" => Ok(JoinMode::Site),
            "cell" => Ok(JoinMode::Cell),
            other => Err(AppError::InvalidInput(format!(
                "Unknown join mode '{}', expected 'site' or 'cell'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for JoinMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinMode::Site => write!(f, "site"),
            JoinMode::Cell => write!(f, "cell"),
        }
    }
}

/// One joined output row. `cell` is populated in cell mode only; `ip` stays
/// `None` for sites the tracker does not know. `volumes` holds one slot per
/// KPI day, `None` where that day had no row for this key.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub cell: Option<String>,
    pub site: String,
    pub ip: Option<String>,
    pub volumes: Vec<Option<f64>>,
}

/// The joined wide table: per-day column labels plus rows in first-appearance
/// order.
#[derive(Debug, Clone)]
pub struct ReportTable {
    pub mode: JoinMode,
    pub day_labels: Vec<String>,
    pub rows: Vec<ReportRow>,
}

impl ReportTable {
    /// Output header row, matching the column ordering of the generated
    /// workbook for each mode.
    pub fn headers(&self) -> Vec<String> {
        let mut headers = Vec::with_capacity(self.day_labels.len() + 3);
        match self.mode {
            JoinMode::Site => {
                headers.push("TCS_Logical_ID".to_string());
                headers.push("IP_ID".to_string());
                headers.extend(self.day_labels.iter().cloned());
            }
            JoinMode::Cell => {
                headers.push("4G Cell".to_string());
                headers.push("TCS_Logical_ID".to_string());
                headers.extend(self.day_labels.iter().cloned());
                headers.push("IP_ID".to_string());
            }
        }
        headers
    }

    /// Distinct trimmed, non-empty IP identifiers among the rows.
    pub fn unique_ip_count(&self) -> usize {
        self.rows
            .iter()
            .filter_map(|row| row.ip.as_deref())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Result of one report run: serialized workbook plus the summary count.
#[derive(Debug)]
pub struct ZeroTrafficReport {
    pub workbook: Vec<u8>,
    pub unique_ip_count: usize,
}
