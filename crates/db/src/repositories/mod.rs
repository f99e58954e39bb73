//! Database repositories.
//!
//! [`UserRepository`] and [`PartyRepository`] hold the pool. The others
//! are stateless and run on whatever connection or transaction the caller
//! passes, since they only ever execute inside an advancement tick.

pub mod bill;
pub mod election;
pub mod feed;
pub mod market;
pub mod party;
pub mod tick_guard;
pub mod user;

pub use bill::{BillRepository, BillVoteRepository, Chamber, GameTrackerRepository, VoteTally};
pub use election::{CandidateRepository, ElectionRepository, ElectionVoteRepository};
pub use feed::FeedRepository;
pub use market::{CompanyRepository, LedgerRepository, ShareRepository, StockRepository};
pub use party::PartyRepository;
pub use tick_guard::TickGuardRepository;
pub use user::UserRepository;
