//! Serializes the filtered table to an in-memory xlsx workbook: one sheet
//! named "Sheet1", header row with a solid yellow fill, rows in table order.

use rust_xlsxwriter::{Format, Workbook};

use crate::error::AppError;
use crate::services::report::types::{JoinMode, ReportRow, ReportTable};

const HEADER_FILL: u32 = 0xFFFF00;
const SHEET_NAME: &str = "Sheet1";

pub fn render(table: &ReportTable) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    let header_format = Format::new().set_background_color(HEADER_FILL);
    for (col, name) in table.headers().iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, name.as_str(), &header_format)?;
    }

    for (idx, row) in table.rows.iter().enumerate() {
        write_row(sheet, idx as u32 + 1, table.mode, row)?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_row(
    sheet: &mut rust_xlsxwriter::Worksheet,
    row_idx: u32,
    mode: JoinMode,
    row: &ReportRow,
) -> Result<(), AppError> {
    let mut col: u16 = 0;
    let mut write_text = |sheet: &mut rust_xlsxwriter::Worksheet,
                          col: &mut u16,
                          value: Option<&str>|
     -> Result<(), AppError> {
        if let Some(value) = value {
            sheet.write_string(row_idx, *col, value)?;
        }
        *col += 1;
        Ok(())
    };

    match mode {
        JoinMode::Site => {
            write_text(sheet, &mut col, Some(&row.site))?;
            write_text(sheet, &mut col, row.ip.as_deref())?;
            write_volumes(sheet, row_idx, &mut col, &row.volumes)?;
        }
        JoinMode::Cell => {
            write_text(sheet, &mut col, row.cell.as_deref())?;
            write_text(sheet, &mut col, Some(&row.site))?;
            write_volumes(sheet, row_idx, &mut col, &row.volumes)?;
            write_text(sheet, &mut col, row.ip.as_deref())?;
        }
    }

    Ok(())
}

fn write_volumes(
    sheet: &mut rust_xlsxwriter::Worksheet,
    row_idx: u32,
    col: &mut u16,
    volumes: &[Option<f64>],
) -> Result<(), AppError> {
    for volume in volumes {
        if let Some(volume) = volume {
            sheet.write_number(row_idx, *col, *volume)?;
        }
        *col += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook_auto_from_rs, Data, Reader};
    use std::io::Cursor;

    #[test]
    fn renders_sheet1_with_headers_and_rows() {
        let table = ReportTable {
            mode: JoinMode::Site,
            day_labels: vec!["2024-05-01".into(), "Day2".into(), "Day3".into()],
            rows: vec![ReportRow {
                cell: None,
                site: "SITE_A".to_string(),
                ip: Some("10.0.0.1".to_string()),
                volumes: vec![Some(5.0), Some(0.0), None],
            }],
        };

        let bytes = render(&table).unwrap();
        assert!(!bytes.is_empty());

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names().to_vec(), vec!["Sheet1"]);

        let range = workbook.worksheet_range("Sheet1").unwrap();
        let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();
        assert_eq!(rows.len(), 2);

        let header: Vec<String> = rows[0].iter().map(|c| c.to_string()).collect();
        assert_eq!(
            header,
            vec!["TCS_Logical_ID", "IP_ID", "2024-05-01", "Day2", "Day3"]
        );

        assert_eq!(rows[1][0], Data::String("SITE_A".to_string()));
        assert_eq!(rows[1][1], Data::String("10.0.0.1".to_string()));
        assert_eq!(rows[1][2], Data::Float(5.0));
        assert_eq!(rows[1][3], Data::Float(0.0));
    }

    #[test]
    fn cell_mode_puts_ip_last() {
        let table = ReportTable {
            mode: JoinMode::Cell,
            day_labels: vec!["Day1".into()],
            rows: vec![ReportRow {
                cell: Some("CELL_1".to_string()),
                site: "SITE_A".to_string(),
                ip: Some("10.0.0.1".to_string()),
                volumes: vec![Some(0.0)],
            }],
        };

        let bytes = render(&table).unwrap();
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range("Sheet1").unwrap();
        let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();

        let header: Vec<String> = rows[0].iter().map(|c| c.to_string()).collect();
        assert_eq!(
            header,
            vec!["4G Cell", "TCS_Logical_ID", "Day1", "IP_ID"]
        );
        assert_eq!(rows[1][3], Data::String("10.0.0.1".to_string()));
    }
}
