//! Cron endpoints. One route per advancer.

use axum::{Router, extract::State, routing::get};
use polity_common::AppResult;
use serde::Serialize;
use tracing::info;

use crate::{extractors::Trigger, middleware::AppState, response::ApiResponse};

// ==================== Response Types ====================

/// Per-race outcome of an election tick.
#[derive(Serialize)]
pub struct ElectionsResponse {
    pub president: String,
    pub senate: String,
}

/// Bill tick response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillsResponse {
    pub skipped: bool,
    pub closed_pool: Option<i32>,
    pub next_pool: Option<i32>,
}

/// Economy tick response.
#[derive(Serialize)]
pub struct EconomyResponse {
    pub skipped: bool,
    pub summary: String,
}

// ==================== Handlers ====================

/// Advance both elections by one day.
///
/// Answers 500 when either race failed; the other race's work stands.
async fn advance_elections(
    Trigger(principal): Trigger,
    State(state): State<AppState>,
) -> ApiResponse<ElectionsResponse> {
    info!(principal = %principal, "Advancing elections");
    let report = state.election_advancer.advance().await;

    let body = ElectionsResponse {
        president: report.president.to_string(),
        senate: report.senate.to_string(),
    };

    if report.is_success() {
        ApiResponse::ok(body)
    } else {
        ApiResponse::failed(body)
    }
}

/// Close the current bill pool.
async fn advance_bills(
    Trigger(principal): Trigger,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<BillsResponse>> {
    info!(principal = %principal, "Advancing bills");
    let report = state.bill_advancer.advance().await?;

    Ok(ApiResponse::ok(BillsResponse {
        skipped: report.skipped,
        closed_pool: report.closed_pool,
        next_pool: report.next_pool,
    }))
}

/// Advance the economy by one hour.
async fn advance_economy(
    Trigger(principal): Trigger,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<EconomyResponse>> {
    info!(principal = %principal, "Advancing economy");
    let report = state.economy_advancer.advance().await?;

    Ok(ApiResponse::ok(EconomyResponse {
        skipped: report.skipped,
        summary: report.summary(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/advance-elections", get(advance_elections))
        .route("/advance-bills", get(advance_bills))
        .route("/advance-economy", get(advance_economy))
}
