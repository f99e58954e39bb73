//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Duration;
use polity_common::{AppResult, Config};
use polity_core::{
    BillAdvancer, EconomyAdvancer, ElectionAdvancer, RandomService, TriggerAuthorizer,
};
use polity_db::repositories::{PartyRepository, UserRepository};
use sea_orm::DatabaseConnection;
use tracing::{debug, info};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub election_advancer: ElectionAdvancer,
    pub bill_advancer: BillAdvancer,
    pub economy_advancer: EconomyAdvancer,
    pub trigger_authorizer: TriggerAuthorizer,
}

impl AppState {
    /// Wire the advancers and the authorizer onto one connection pool.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: &Config,
        random: RandomService,
    ) -> AppResult<Self> {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let party_repo = PartyRepository::new(Arc::clone(&db));
        let engine = &config.engine;

        Ok(Self {
            election_advancer: ElectionAdvancer::new(
                Arc::clone(&db),
                user_repo.clone(),
                random,
                interval(engine.election_min_interval_secs),
            ),
            bill_advancer: BillAdvancer::new(
                Arc::clone(&db),
                party_repo,
                interval(engine.bill_min_interval_secs),
            ),
            economy_advancer: EconomyAdvancer::new(
                db,
                user_repo.clone(),
                interval(engine.economy_min_interval_secs),
            ),
            trigger_authorizer: TriggerAuthorizer::new(&config.trigger, user_repo)?,
        })
    }
}

fn interval(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

/// Trigger authorization middleware.
///
/// Rejects the request with 401 unless the caller is the scheduler or an
/// administrator. The accepted principal is stored in the request
/// extensions for the handler.
pub async fn require_trigger_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match state.trigger_authorizer.authorize(header).await {
        Ok(principal) => {
            info!(principal = %principal, path = %req.uri().path(), "Trigger authorized");
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        Err(e) => {
            debug!(path = %req.uri().path(), error = %e, "Trigger rejected");
            e.into_response()
        }
    }
}
