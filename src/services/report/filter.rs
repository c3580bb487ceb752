//! Row filter: keep rows with at least one explicit zero-or-negative traffic
//! day and a resolvable, non-blank IP.

use crate::services::report::types::{ReportRow, ReportTable};

/// Retains rows where (a) some day volume is an explicit value <= 0 (a
/// missing volume never qualifies) and (b) the IP is present and non-empty
/// after trimming. Both predicates are independent, so evaluation order does
/// not matter, and the filter is idempotent.
pub fn retain_zero_traffic(mut table: ReportTable) -> ReportTable {
    table.rows.retain(row_qualifies);
    table
}

fn row_qualifies(row: &ReportRow) -> bool {
    let has_zero_day = row.volumes.iter().flatten().any(|v| *v <= 0.0);
    let has_ip = row
        .ip
        .as_deref()
        .map_or(false, |ip| !ip.trim().is_empty());
    has_zero_day && has_ip
}
