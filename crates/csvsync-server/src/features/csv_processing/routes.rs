use crate::api::response::{ApiResponse, ErrorResponse};
use crate::features::FeatureState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::commands::{ProcessCsvCommand, ProcessCsvError};

pub fn csv_processing_routes() -> Router<FeatureState> {
    Router::new().route("/process_csv", get(process_csv).post(process_csv))
}

#[tracing::instrument(skip(state))]
async fn process_csv(State(state): State<FeatureState>) -> Result<Response, CsvProcessingApiError> {
    let command = ProcessCsvCommand::from_config(&state.config);

    let report = super::commands::process::handle(
        state.secrets.as_ref(),
        state.connector.as_ref(),
        command,
    )
    .await?;

    if report.is_success() {
        tracing::info!(processed = report.processed, "CSV processing completed via API");
        return Ok((StatusCode::OK, Json(ApiResponse::success(report))).into_response());
    }

    tracing::warn!(
        processed = report.processed,
        failed = report.failed,
        "CSV processing finished with failures"
    );

    let error = ErrorResponse::with_details(
        "PARTIAL_FAILURE",
        report.message.clone(),
        json!({
            "processed": report.processed,
            "failed": report.failed,
            "failed_paths": report.failed_paths,
        }),
    );
    Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response())
}

#[derive(Debug)]
struct CsvProcessingApiError(ProcessCsvError);

impl From<ProcessCsvError> for CsvProcessingApiError {
    fn from(err: ProcessCsvError) -> Self {
        Self(err)
    }
}

impl CsvProcessingApiError {
    fn code(&self) -> &'static str {
        match self.0 {
            ProcessCsvError::Config(_) => "CONFIG_ERROR",
            ProcessCsvError::Auth(_) => "AUTH_ERROR",
            ProcessCsvError::Storage(_) => "STORAGE_ERROR",
            ProcessCsvError::Listing(_) => "LISTING_ERROR",
        }
    }
}

impl IntoResponse for CsvProcessingApiError {
    fn into_response(self) -> Response {
        tracing::error!(code = self.code(), "CSV processing aborted: {}", self.0);
        let error = ErrorResponse::new(self.code(), format!("Error: {}", self.0));
        (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::secrets::AuthError;
    use crate::storage::StorageError;

    #[test]
    fn test_error_codes() {
        let cases = [
            (ProcessCsvError::Config(ConfigError::Missing("DEST_CONTAINER")), "CONFIG_ERROR"),
            (ProcessCsvError::Auth(AuthError::NotFound("k".into())), "AUTH_ERROR"),
            (ProcessCsvError::Storage(StorageError::Connect("x".into())), "STORAGE_ERROR"),
            (ProcessCsvError::Listing(StorageError::io("raw", "inbox/", "timeout")), "LISTING_ERROR"),
        ];

        for (err, code) in cases {
            let api_error = CsvProcessingApiError::from(err);
            assert_eq!(api_error.code(), code);
            assert_eq!(
                api_error.into_response().status(),
                StatusCode::INTERNAL_SERVER_ERROR
            );
        }
    }

    #[test]
    fn test_routes_structure() {
        let router = csv_processing_routes();
        assert!(format!("{:?}", router).contains("Router"));
    }
}
