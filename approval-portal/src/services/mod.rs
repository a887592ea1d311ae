//! Services module for approval-portal.

pub mod cache;
pub mod currency;
pub mod master_data;
pub mod metrics;
pub mod sequencer;
pub mod session;
pub mod store;
pub mod superiors;
pub mod workflow;

pub use cache::MasterDataCache;
pub use master_data::{
    FieldChange, HttpMasterDataSource, LineEditor, MasterDataResolver, MasterDataScope,
    MasterDataSource, MockMasterDataSource, Resolution,
};
pub use metrics::{get_metrics, init_metrics};
pub use session::EditSession;
pub use store::{DocumentStore, HttpDocumentStore, MockDocumentStore};
pub use superiors::{
    ApproverCandidates, HttpSuperiorDirectory, MockSuperiorDirectory, SuperiorApproverResolver,
    SuperiorDirectory,
};
pub use workflow::{Action, EditPolicy};
