mod payload;

use axum::{
    Router,
    extract::{Json, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::core::{
    AssumptionSet, Finding, GridDiagnostic, GrowthStage, SensitivityCell, Severity,
    ValuationBreakdown, YearRate, blend, blend_weights, compute_parallel, has_blocking_findings,
    validate, worst_severity, yearly_rates,
};
use crate::error::RequestError;

pub use payload::{
    AssumptionPayload, DEFAULT_GROWTH_STEP, DEFAULT_POINTS_PER_SIDE, DEFAULT_REFERENCE_RATE,
    DEFAULT_WACC_STEP, GrowthPayload, GrowthRequest, MAX_GRID_POINTS_PER_AXIS, MAX_PROJECTION_YEARS,
    SensitivityPayload, SensitivityRequest, default_assumptions,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub findings: Vec<Finding>,
    pub worst_severity: Option<Severity>,
    pub blocking: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthResponse {
    pub reference_rate: f64,
    pub weights: Vec<f64>,
    pub stages: Vec<GrowthStage>,
    pub yearly_rates: Vec<YearRate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityResponse {
    pub base_wacc: f64,
    pub base_terminal_growth: f64,
    pub base_value: f64,
    pub base_breakdown: Option<ValuationBreakdown>,
    pub rows: usize,
    pub cols: usize,
    pub wacc_range: Vec<f64>,
    pub terminal_growth_range: Vec<f64>,
    pub cells: Vec<Vec<SensitivityCell>>,
    pub diagnostics: Vec<GridDiagnostic>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn build_validate_response(assumptions: &AssumptionSet) -> ValidateResponse {
    let findings = validate(assumptions);
    ValidateResponse {
        worst_severity: worst_severity(&findings),
        blocking: has_blocking_findings(&findings),
        findings,
    }
}

pub fn build_growth_response(request: &GrowthRequest) -> GrowthResponse {
    let stages = blend(&request.stages, request.reference_rate);
    GrowthResponse {
        reference_rate: request.reference_rate,
        weights: blend_weights(request.stages.len()),
        yearly_rates: yearly_rates(&stages),
        stages,
    }
}

pub fn build_sensitivity_response(request: &SensitivityRequest) -> SensitivityResponse {
    let projection = &request.projection;
    let grid = compute_parallel(
        |wacc, growth| projection.per_share_value(wacc, growth),
        &request.wacc_range,
        &request.terminal_growth_range,
        request.base_wacc,
        request.base_terminal_growth,
    );
    let (rows, cols) = grid.shape();
    SensitivityResponse {
        base_wacc: grid.base_wacc,
        base_terminal_growth: grid.base_terminal_growth,
        base_value: grid.base_value,
        base_breakdown: projection.breakdown(request.base_wacc, request.base_terminal_growth),
        rows,
        cols,
        wacc_range: request.wacc_range.clone(),
        terminal_growth_range: request.terminal_growth_range.clone(),
        cells: grid.cells,
        diagnostics: grid.diagnostics,
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/validate", post(validate_handler))
        .route("/api/growth", post(growth_handler))
        .route("/api/sensitivity", post(sensitivity_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(bind: IpAddr, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::new(bind, port);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "valuation API listening");

    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    json_response(
        StatusCode::OK,
        HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn validate_handler(body: Result<Json<AssumptionPayload>, JsonRejection>) -> Response {
    let payload = match decode_body(body) {
        Ok(payload) => payload,
        Err(err) => return request_error_response(&err),
    };
    let assumptions = AssumptionSet::from(payload);
    let response = build_validate_response(&assumptions);
    debug!(
        findings = response.findings.len(),
        blocking = response.blocking,
        "validated assumptions"
    );
    json_response(StatusCode::OK, response)
}

async fn growth_handler(body: Result<Json<GrowthPayload>, JsonRejection>) -> Response {
    let request = match decode_body(body).and_then(GrowthRequest::try_from) {
        Ok(request) => request,
        Err(err) => return request_error_response(&err),
    };
    debug!(
        stages = request.stages.len(),
        reference_rate = request.reference_rate,
        "blending growth schedule"
    );
    json_response(StatusCode::OK, build_growth_response(&request))
}

async fn sensitivity_handler(body: Result<Json<SensitivityPayload>, JsonRejection>) -> Response {
    let request = match decode_body(body).and_then(SensitivityRequest::try_from) {
        Ok(request) => request,
        Err(err) => return request_error_response(&err),
    };
    let response = build_sensitivity_response(&request);
    debug!(
        rows = response.rows,
        cols = response.cols,
        staged = !request.projection.schedule.is_empty(),
        "computed sensitivity grid"
    );
    if !response.diagnostics.is_empty() {
        warn!(diagnostics = ?response.diagnostics, "sensitivity grid is degenerate");
    }
    json_response(StatusCode::OK, response)
}

fn decode_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, RequestError> {
    body.map(|Json(payload)| payload)
        .map_err(|rejection| RequestError::InvalidPayload(rejection.body_text()))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn request_error_response(err: &RequestError) -> Response {
    warn!(error = %err, "rejected request");
    error_response(StatusCode::BAD_REQUEST, &err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Confidence, FieldName, Tier};

    #[test]
    fn validate_response_reports_worst_severity_and_blocking() {
        let payload: AssumptionPayload = serde_json::from_str(
            r#"{"revenueGrowthRate": 30, "ebitdaMargin": 20, "wacc": 12, "terminalGrowthRate": 3}"#,
        )
        .expect("valid json");
        let response = build_validate_response(&AssumptionSet::from(payload));
        assert_eq!(response.findings.len(), 1);
        assert_eq!(response.findings[0].field, FieldName::RevenueGrowthRate);
        assert_eq!(response.worst_severity, Some(Severity::Error));
        assert!(response.blocking);
    }

    #[test]
    fn validate_response_serializes_camel_case() {
        let assumptions = AssumptionSet {
            wacc: 22.0,
            ..default_assumptions()
        };
        let json = serde_json::to_value(build_validate_response(&assumptions)).expect("json");
        assert_eq!(json["worstSeverity"], "warning");
        assert_eq!(json["blocking"], false);
        assert_eq!(json["findings"][0]["field"], "wacc");
        assert_eq!(json["findings"][0]["suggestedValue"], 15.0);
    }

    #[test]
    fn clean_defaults_validate_without_findings() {
        let response = build_validate_response(&default_assumptions());
        assert!(response.findings.is_empty());
        assert_eq!(response.worst_severity, None);
        assert!(!response.blocking);
    }

    #[test]
    fn growth_response_includes_weights_and_waterfall() {
        let request = GrowthRequest {
            stages: crate::core::standard_stage_inputs(
                [10.0, 8.0, 6.0, 4.0],
                [Confidence::High; 4],
            ),
            reference_rate: 3.0,
        };
        let response = build_growth_response(&request);
        assert_eq!(response.weights, vec![0.20, 0.50, 0.75, 1.00]);
        assert_eq!(response.stages.len(), 5);
        assert_eq!(response.yearly_rates.len(), 10);

        let json = serde_json::to_value(&response).expect("json");
        assert_eq!(json["stages"][4]["terminal"], true);
        assert_eq!(json["stages"][0]["blendWeightToReference"], 0.2);
        assert_eq!(json["stages"][0]["confidence"], "high");
    }

    #[test]
    fn sensitivity_response_has_base_cell_at_centre() {
        let payload: SensitivityPayload = serde_json::from_str(
            r#"{"baseFreeCashFlow": 120, "netDebt": 300, "sharesOutstanding": 10,
                "wacc": 10, "terminalGrowthRate": 2.5}"#,
        )
        .expect("valid json");
        let request = SensitivityRequest::try_from(payload).expect("valid request");
        let response = build_sensitivity_response(&request);

        assert_eq!((response.rows, response.cols), (5, 5));
        let centre = response.cells[2][2];
        assert_eq!(centre.wacc_value, 10.0);
        assert_eq!(centre.terminal_growth_value, 2.5);
        assert_eq!(centre.percent_deviation_from_base, 0.0);
        assert_eq!(centre.tier, Tier::Similar);
        assert!(response.base_breakdown.is_some());
        assert!(response.diagnostics.is_empty());
        assert_eq!(response.cells[0][4].tier, Tier::Higher);
        assert_eq!(response.cells[4][0].tier, Tier::Lower);
    }

    #[test]
    fn sensitivity_response_flags_undefined_cells() {
        let payload: SensitivityPayload = serde_json::from_str(
            r#"{"wacc": 4, "terminalGrowthRate": 2,
                "waccRange": [2, 3, 4], "terminalGrowthRange": [2, 3]}"#,
        )
        .expect("valid json");
        let request = SensitivityRequest::try_from(payload).expect("valid request");
        let response = build_sensitivity_response(&request);

        assert_eq!((response.rows, response.cols), (3, 2));
        assert!(
            response
                .diagnostics
                .contains(&GridDiagnostic::NonFiniteCells { count: 3 })
        );
        let json = serde_json::to_value(&response).expect("json");
        assert_eq!(json["diagnostics"][0]["kind"], "nonFiniteCells");
    }
}
