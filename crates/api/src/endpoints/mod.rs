//! API endpoints.

mod cron;
mod health;

use axum::{Router, middleware};

use crate::middleware::{AppState, require_trigger_auth};

/// Create the API router.
///
/// Everything under `/cron` requires trigger authorization; the health
/// check does not.
pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest(
            "/cron",
            cron::router().route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_trigger_auth,
            )),
        )
}
