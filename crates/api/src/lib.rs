//! HTTP API layer for polity.
//!
//! Exposes the advancement engine to the external scheduler:
//!
//! - **Endpoints**: one cron route per advancer, plus a health check
//! - **Middleware**: trigger authorization for everything under `/cron`
//! - **Extractors**: the authorized [`TriggerPrincipal`](polity_core::TriggerPrincipal)
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
