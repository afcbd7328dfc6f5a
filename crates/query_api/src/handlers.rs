use anomaly_checker::{check_anomalies, render_lines, GroupingRules};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use models::{AnomalyReport, Settings};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use trial_balance_parser::TrialBalanceReader;

use crate::{
    error::ApiError, executor::CodeExecutor, generator::QueryGenerator, Result,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn QueryGenerator>,
    pub executor: Arc<dyn CodeExecutor>,
    pub workbook_path: PathBuf,
    pub settings: Arc<Settings>,
    pub rules: Arc<GroupingRules>,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub output: String,
    pub error: Option<String>,
    pub generated_code: String,
}

/// POST /query
/// Translates a natural-language question into code, runs it against the
/// trial balance and returns what it printed
pub async fn handle_query(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(request) = payload.map_err(|_| {
        ApiError::BadRequest("JSON body with 'query' key is required.".to_string())
    })?;

    let question = request
        .query
        .ok_or_else(|| ApiError::BadRequest("JSON body with 'query' key is required.".to_string()))?;
    if question.trim().is_empty() {
        return Err(ApiError::BadRequest("'query' cannot be empty.".to_string()));
    }

    info!(query = %question, "received query");

    let generated_code = match state.generator.generate(&question).await {
        Ok(code) if !code.trim().is_empty() => code,
        Ok(_) => return Err(ApiError::GenerationFailed),
        Err(e) => {
            warn!(error = %format!("{e:#}"), "code generation failed");
            return Err(ApiError::GenerationFailed);
        }
    };

    let output = state
        .executor
        .execute(&generated_code)
        .await
        .map_err(|e| ApiError::Execution(format!("{e:#}")))?;

    Ok(Json(QueryResponse {
        output: output.stdout,
        error: if output.stderr.is_empty() {
            None
        } else {
            Some(output.stderr)
        },
        generated_code,
    }))
}

#[derive(Debug, Serialize)]
pub struct AnomaliesResponse {
    pub generated_at: String,
    pub workbook: String,
    pub threshold: Decimal,
    pub report: AnomalyReport,
    pub lines: Vec<String>,
}

/// GET /api/anomalies
/// Runs the rule-based anomaly check over the configured workbook
pub async fn get_anomalies(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let path = state.workbook_path.clone();
    let settings = state.settings.clone();
    let rules = state.rules.clone();

    let report = tokio::task::spawn_blocking(move || -> Result<AnomalyReport> {
        let rows = TrialBalanceReader::from_settings(&settings.workbook)
            .read_file(&path)
            .map_err(|e| ApiError::Workbook(format!("{e:#}")))?;
        Ok(check_anomalies(&rows, &rules, settings.zero_sum_threshold)?)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(AnomaliesResponse {
        generated_at: Utc::now().to_rfc3339(),
        workbook: state.workbook_path.display().to_string(),
        threshold: state.settings.zero_sum_threshold,
        lines: render_lines(&report),
        report,
    }))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "trial-balance-query-api"
    }))
}
