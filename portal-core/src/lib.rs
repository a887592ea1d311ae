//! portal-core: Shared infrastructure for the approval portal crates.
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod observability;

pub use reqwest;
pub use secrecy;
pub use serde;
pub use serde_json;
pub use tracing;
