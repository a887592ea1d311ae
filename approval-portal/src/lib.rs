//! Approval workflow and master-data resolution core.
//!
//! The crate owns the parts of the approval portal that carry real rules:
//! the approval state machine, approver resolution, the cascading
//! category / account-name / GL-code resolver and the currency codec. Remote
//! collaborators are reached through the `portal-core` dispatcher.

pub mod models;
pub mod services;
pub mod startup;

pub use portal_core::error::{PortalError, RemoteFailure};
pub use startup::Portal;
