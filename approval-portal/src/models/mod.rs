//! Domain models for approval-portal.

mod approval;
mod document;
pub mod legacy;
mod line_item;
mod master_data;
mod revision;
mod superior;
mod transaction;

pub use approval::{
    ApprovalLevel, ApprovalSlot, ApprovalStatus, ApprovalSummary, Approver, RejectionRecord,
    SignOff,
};
pub use document::{Attachment, Document, DocumentType, FinancialSnapshot};
pub use line_item::LineItem;
pub use master_data::{AccountNameRecord, FieldState, OptionOrigin, OptionSet, SelectOption};
pub use revision::{group_by_stage, RevisionEntry};
pub use superior::{SuperiorMapping, UserProfile};
pub use transaction::{transaction_code, TransactionCode, PERSONAL_LOAN_CODE, TRANSACTION_CODES};
