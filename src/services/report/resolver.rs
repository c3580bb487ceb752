//! Builds the site -> IP mapping from the on-air tracker table.

use polars::prelude::DataFrame;
use std::collections::HashMap;

use crate::error::AppError;
use crate::services::report::columns::{
    column_as_strings, has_column, normalize_identifier, LOGICAL_SITE_ID, SITE_ID, SITE_IP,
};

/// Resolves the tracker into a map from normalized site identifier to its
/// trimmed IP string. The site column may appear under its source name
/// ("Logical Site ID") or the canonical "Site Id". Blank IPs stay blank;
/// the filter is responsible for dropping them. Duplicate site identifiers
/// are last-write-wins.
pub fn resolve_ip_map(tracker: &DataFrame) -> Result<HashMap<String, String>, AppError> {
    let site_column = if has_column(tracker, LOGICAL_SITE_ID) {
        LOGICAL_SITE_ID
    } else {
        SITE_ID
    };

    let mut missing = Vec::new();
    if !has_column(tracker, site_column) {
        missing.push(format!("'{}'", LOGICAL_SITE_ID));
    }
    if !has_column(tracker, SITE_IP) {
        missing.push(format!("'{}'", SITE_IP));
    }
    if !missing.is_empty() {
        return Err(AppError::Schema(format!(
            "On-air tracker is missing column(s): {}",
            missing.join(", ")
        )));
    }

    let sites = column_as_strings(tracker, site_column)?;
    let ips = column_as_strings(tracker, SITE_IP)?;

    let mut map = HashMap::with_capacity(sites.len());
    for (site, ip) in sites.into_iter().zip(ips) {
        let Some(site) = site else { continue };
        let site = normalize_identifier(&site);
        if site.is_empty() {
            continue;
        }
        map.insert(site, ip.map(|v| v.trim().to_string()).unwrap_or_default());
    }

    Ok(map)
}
