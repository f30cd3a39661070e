//! Contest submission intake and vote tally service.
//!
//! The [`contest`] module owns the durable submission store and everything
//! built on it: vote counting, the registration window, ranked listings, and
//! CSV exports. [`config`], [`telemetry`], and [`error`] carry the service
//! plumbing shared by the HTTP binary.

pub mod config;
pub mod contest;
pub mod error;
pub mod telemetry;
