//! Core business logic for polity.
//!
//! The three advancers each implement one cron-triggered tick:
//!
//! - [`ElectionAdvancer`]: one simulated day of the President and Senate races
//! - [`BillAdvancer`]: closes one bill pool and rotates to the next
//! - [`EconomyAdvancer`]: one simulated hour of the stock market and campaigns
//!
//! [`TriggerAuthorizer`] decides whether a caller may run a tick at all.

pub mod services;

pub use services::*;
