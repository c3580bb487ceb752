//! The zero-traffic report pipeline: load the four tables, resolve the
//! site -> IP mapping, join the KPI days, filter to zero-traffic rows, and
//! render the workbook. Every stage failure aborts the run; workbook bytes
//! only exist after the whole pipeline has succeeded.

pub mod columns;
pub mod filter;
pub mod joiner;
pub mod resolver;
pub mod types;
pub mod workbook;

use crate::error::AppError;
use crate::services::loader;
use self::types::{JoinMode, ReportInputs, ZeroTrafficReport};

pub fn generate(inputs: &ReportInputs, mode: JoinMode) -> Result<ZeroTrafficReport, AppError> {
    let tracker = loader::read_table(&inputs.tracker)?;

    let mut days = Vec::with_capacity(inputs.kpi_days.len());
    for file in &inputs.kpi_days {
        days.push(loader::read_table(file)?);
    }

    let ip_map = resolver::resolve_ip_map(&tracker)?;
    tracing::info!("Resolved {} tracker sites", ip_map.len());

    let joined = match mode {
        JoinMode::Site => joiner::join_by_site(&days, &ip_map)?,
        JoinMode::Cell => joiner::join_by_cell(&days, &ip_map)?,
    };
    tracing::info!(
        "Joined {} rows across {} days",
        joined.rows.len(),
        joined.day_labels.len()
    );

    let filtered = filter::retain_zero_traffic(joined);
    let unique_ip_count = filtered.unique_ip_count();
    tracing::info!(
        "{} rows after filtering, {} unique IPs",
        filtered.rows.len(),
        unique_ip_count
    );

    let workbook = workbook::render(&filtered)?;

    Ok(ZeroTrafficReport {
        workbook,
        unique_ip_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use calamine::{open_workbook_auto_from_rs, Data, Reader};
    use std::io::Cursor;
    use super::types::UploadedFile;

    fn csv(name: &str, body: &str) -> UploadedFile {
        UploadedFile {
            name: name.to_string(),
            data: Bytes::from(body.to_string()),
        }
    }

    fn scenario_inputs() -> ReportInputs {
        // Site A has a zero day and an IP; site B has no zero day and a blank
        // IP anyway.
        ReportInputs {
            tracker: csv(
                "tracker.csv",
                "Logical Site ID,Site IP\nA,10.0.0.1\nB,\n",
            ),
            kpi_days: [
                csv("day1.csv", "Site Id,Data Volume - Total (GB)\nA,5\nB,1\n"),
                csv("day2.csv", "Site Id,Data Volume - Total (GB)\nA,0\nB,2\n"),
                csv("day3.csv", "Site Id,Data Volume - Total (GB)\nA,3\nB,4\n"),
            ],
        }
    }

    #[test]
    fn site_mode_scenario_counts_one_unique_ip() {
        let report = generate(&scenario_inputs(), JoinMode::Site).unwrap();
        assert_eq!(report.unique_ip_count, 1);

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(report.workbook)).unwrap();
        let range = workbook.worksheet_range("Sheet1").unwrap();
        let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();

        // Header plus the single surviving row: A with its zero on day 2
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], Data::String("A".to_string()));
        assert_eq!(rows[1][1], Data::String("10.0.0.1".to_string()));
        assert_eq!(rows[1][3], Data::Float(0.0));
    }

    #[test]
    fn kpi_site_missing_from_tracker_is_dropped() {
        let mut inputs = scenario_inputs();
        // Site C has a zero day but no tracker entry at all
        inputs.kpi_days[0] = csv(
            "day1.csv",
            "Site Id,Data Volume - Total (GB)\nA,5\nB,1\nC,0\n",
        );
        let report = generate(&inputs, JoinMode::Site).unwrap();
        assert_eq!(report.unique_ip_count, 1);
    }

    #[test]
    fn missing_volume_column_aborts_with_schema_error() {
        let mut inputs = scenario_inputs();
        inputs.kpi_days[1] = csv("day2.csv", "Site Id,Volume\nA,0\n");
        let err = generate(&inputs, JoinMode::Site).unwrap_err();
        match err {
            AppError::Schema(msg) => {
                assert!(msg.contains("KPI Day 2"));
                assert!(msg.contains("Data Volume - Total (GB)"));
            }
            other => panic!("expected Schema error, got {:?}", other),
        }
    }

    #[test]
    fn cell_mode_scenario_keeps_cell_granularity() {
        let inputs = ReportInputs {
            tracker: csv("tracker.csv", "Logical Site ID,Site IP\nA,10.0.0.1\n"),
            kpi_days: [
                csv(
                    "day1.csv",
                    "4G Cell Name,Site Id,Data Volume - Total (GB),Date\nC1,A,5,2024-05-01\nC2,A,0,2024-05-01\n",
                ),
                csv(
                    "day2.csv",
                    "4G Cell Name,Site Id,Data Volume - Total (GB),Date\nC1,A,2,2024-05-02\n",
                ),
                csv(
                    "day3.csv",
                    "4G Cell Name,Site Id,Data Volume - Total (GB),Date\nC2,A,4,2024-05-03\n",
                ),
            ],
        };

        let report = generate(&inputs, JoinMode::Cell).unwrap();
        assert_eq!(report.unique_ip_count, 1);

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(report.workbook)).unwrap();
        let range = workbook.worksheet_range("Sheet1").unwrap();
        let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();

        let header: Vec<String> = rows[0].iter().map(|c| c.to_string()).collect();
        assert_eq!(
            header,
            vec![
                "4G Cell",
                "TCS_Logical_ID",
                "2024-05-01",
                "2024-05-02",
                "2024-05-03",
                "IP_ID"
            ]
        );

        // Only C2 has a zero day; C1 never does
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], Data::String("C2".to_string()));
    }

    #[test]
    fn unsupported_tracker_format_fails_before_processing() {
        let mut inputs = scenario_inputs();
        inputs.tracker = csv("tracker.pdf", "not a table");
        assert!(matches!(
            generate(&inputs, JoinMode::Site).unwrap_err(),
            AppError::UnsupportedFormat(_)
        ));
    }
}
