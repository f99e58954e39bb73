//! Database entities.

#![allow(missing_docs)]

pub mod bill;
pub mod bill_vote_house;
pub mod bill_vote_presidential;
pub mod bill_vote_senate;
pub mod candidate;
pub mod candidate_snapshot;
pub mod company;
pub mod election;
pub mod election_vote;
pub mod feed;
pub mod game_tracker;
pub mod party;
pub mod party_stance;
pub mod share_price_history;
pub mod stock;
pub mod tick_guard;
pub mod transaction_history;
pub mod user;
pub mod user_share;

pub use bill::Entity as Bill;
pub use bill_vote_house::Entity as BillVoteHouse;
pub use bill_vote_presidential::Entity as BillVotePresidential;
pub use bill_vote_senate::Entity as BillVoteSenate;
pub use candidate::Entity as Candidate;
pub use candidate_snapshot::Entity as CandidateSnapshot;
pub use company::Entity as Company;
pub use election::Entity as Election;
pub use election_vote::Entity as ElectionVote;
pub use feed::Entity as Feed;
pub use game_tracker::Entity as GameTracker;
pub use party::Entity as Party;
pub use party_stance::Entity as PartyStance;
pub use share_price_history::Entity as SharePriceHistory;
pub use stock::Entity as Stock;
pub use tick_guard::Entity as TickGuard;
pub use transaction_history::Entity as TransactionHistory;
pub use user::Entity as User;
pub use user_share::Entity as UserShare;
