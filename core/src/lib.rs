//! Complaint lifecycle and citizen-engagement core.
//!
//! Citizens file complaints against municipalities, support other citizens'
//! open complaints, and rate their own complaint once it is resolved.
//! Municipal staff move complaints through their status lifecycle.

pub mod actor;
pub mod aggregate_rating;
pub mod api;
pub mod complaint_store;
pub mod config;
pub mod desk;
pub mod error;
pub mod event;
pub mod municipality_registry;
pub mod rating_ledger;
pub mod status;
pub mod store;
pub mod support_ledger;
pub mod types;

pub use actor::Actor;
pub use desk::ComplaintDesk;
pub use error::{DeskError, DeskResult, ErrorKind};
pub use status::ComplaintStatus;
