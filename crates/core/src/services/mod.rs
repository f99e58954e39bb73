//! Advancement services.

#![allow(missing_docs)]

pub mod bill;
pub mod economy;
pub mod election;
pub mod feed;
pub mod random;
pub mod trigger_auth;

pub use bill::{BillAdvancer, BillTickReport, Resolution};
pub use economy::{EconomyAdvancer, EconomyTickReport, MIN_PRICE};
pub use election::{ElectionAdvancer, ElectionTickReport, PhaseStep, RaceOutcome};
pub use feed::FeedService;
pub use random::{RandomService, RandomSource, SeededRandom, ThreadRandom};
pub use trigger_auth::{TriggerAuthorizer, TriggerPrincipal};
