//! Contest intake, durable submission storage, vote tallies, and exports.
//!
//! The store serializes every mutation behind one lock and replaces the
//! durable file atomically, so readers always see a complete record set.

pub mod domain;
pub mod export;
pub mod ranking;
pub mod registration;
pub mod router;
pub mod service;
pub mod store;

pub use domain::{SubmissionRecord, VoteCategory, VoteTally};
pub use export::{ExportError, ExportScope};
pub use registration::{RegistrationState, RegistrationWindow};
pub use router::contest_router;
pub use service::{
    ContestService, SortMode, SubmissionError, SubmissionReceipt, SubmissionRequest, VoteError,
    VoteReceipt,
};
pub use store::{StoreError, SubmissionStore};
