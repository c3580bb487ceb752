use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, Method, Response, StatusCode},
    routing::post,
    Router,
};
use std::sync::Arc;

use crate::{
    error::AppError,
    services::report::{
        self,
        types::{JoinMode, ReportInputs, UploadedFile},
    },
    AppState,
};
use tower_http::cors::{Any, CorsLayer};

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const OUTPUT_FILE_NAME: &str = "zero_traffic_output.xlsx";

// Multipart body cap; individual files are checked against the configured
// max_file_size in the handler.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

pub fn routes() -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/reports/zero-traffic", post(process_report))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
}

#[axum::debug_handler]
async fn process_report(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response<Body>, AppError> {
    let start = std::time::Instant::now();

    let mut tracker: Option<UploadedFile> = None;
    let mut kpi_days: [Option<UploadedFile>; 3] = [None, None, None];
    let mut mode = JoinMode::Site;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Failed to read upload: {}", e)))?
    {
        let part = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(|s| s.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read upload '{}': {}", part, e)))?;

        match part.as_str() {
            "mode" => {
                mode = String::from_utf8_lossy(&data).parse()?;
            }
            "tracker" | "kpi_day1" | "kpi_day2" | "kpi_day3" => {
                if data.len() > state.config.max_file_size {
                    return Err(AppError::InvalidInput(format!(
                        "File '{}' exceeds the maximum size of {} bytes",
                        part, state.config.max_file_size
                    )));
                }
                let name = file_name.ok_or_else(|| {
                    AppError::InvalidInput(format!("Upload '{}' has no file name", part))
                })?;
                let upload = UploadedFile { name, data };
                match part.as_str() {
                    "tracker" => tracker = Some(upload),
                    "kpi_day1" => kpi_days[0] = Some(upload),
                    "kpi_day2" => kpi_days[1] = Some(upload),
                    _ => kpi_days[2] = Some(upload),
                }
            }
            other => {
                tracing::warn!("Ignoring unexpected multipart field '{}'", other);
            }
        }
    }

    let inputs = match (tracker, kpi_days) {
        (Some(tracker), [Some(day1), Some(day2), Some(day3)]) => ReportInputs {
            tracker,
            kpi_days: [day1, day2, day3],
        },
        (tracker, kpi_days) => {
            let mut missing = Vec::new();
            if tracker.is_none() {
                missing.push("tracker");
            }
            for (idx, day) in kpi_days.iter().enumerate() {
                if day.is_none() {
                    missing.push(["kpi_day1", "kpi_day2", "kpi_day3"][idx]);
                }
            }
            return Err(AppError::MissingInput(format!(
                "Please upload all 4 required files. Missing: {}",
                missing.join(", ")
            )));
        }
    };

    tracing::info!("Processing zero-traffic report in {} mode", mode);
    let result = report::generate(&inputs, mode)?;

    let summary = format!(
        "Total sites having Zero traffic is {}",
        result.unique_ip_count
    );
    tracing::info!("{} (took {:?})", summary, start.elapsed());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, XLSX_CONTENT_TYPE)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", OUTPUT_FILE_NAME),
        )
        .header("x-zero-traffic-count", result.unique_ip_count.to_string())
        .header("x-summary", summary)
        .body(Body::from(result.workbook))
        .map_err(|e| AppError::Processing(format!("Failed to build response: {}", e)))
}
