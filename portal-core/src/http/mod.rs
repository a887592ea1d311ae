//! HTTP plumbing shared by every remote collaborator of the portal.

pub mod credentials;
pub mod dispatcher;
pub mod envelope;

pub use credentials::{Anonymous, CredentialProvider, StaticCredentials};
pub use dispatcher::{DispatchRequest, DispatchResponse, Dispatcher};
pub use envelope::ApiEnvelope;
