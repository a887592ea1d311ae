//! Document model shared by AR invoices, cash advances and reimbursements.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::approval::{ApprovalSummary, Approver};
use super::line_item::LineItem;
use super::revision::RevisionEntry;

/// Document type, serialized as the code used by the portal API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "AR")]
    ArInvoice,
    #[serde(rename = "CA")]
    CashAdvance,
    #[serde(rename = "RE")]
    Reimbursement,
}

impl DocumentType {
    pub fn code(&self) -> &'static str {
        match self {
            DocumentType::ArInvoice => "AR",
            DocumentType::CashAdvance => "CA",
            DocumentType::Reimbursement => "RE",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "AR" => Some(DocumentType::ArInvoice),
            "CA" => Some(DocumentType::CashAdvance),
            "RE" => Some(DocumentType::Reimbursement),
            _ => None,
        }
    }

    /// The `menu` value the master-data endpoints scope their lists by.
    pub fn menu_label(&self) -> &'static str {
        match self {
            DocumentType::ArInvoice => "AR Invoice",
            DocumentType::CashAdvance => "Cash Advance",
            DocumentType::Reimbursement => "Reimbursement",
        }
    }
}

/// Attachment metadata. Upload and storage live elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub file_name: String,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// The figures that matter when a document is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSnapshot {
    pub currency_code: String,
    pub line_amounts: Vec<Decimal>,
    pub tax_amount: Decimal,
    pub withholding_amount: Decimal,
    pub total: Decimal,
    pub posting_date: Option<NaiveDate>,
    pub document_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

/// A document under approval.
///
/// Approval state and revision history are only changed through the
/// workflow operations; everything else is plain data guarded by the
/// document's edit policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_id: Option<String>,
    #[serde(default)]
    pub document_number: String,
    pub document_type: DocumentType,
    #[serde(default)]
    pub transaction_type: String,
    #[serde(default)]
    pub department_id: String,
    #[serde(default)]
    pub requester_id: String,
    #[serde(default)]
    pub requester_name: String,
    #[serde(default)]
    pub party_code: String,
    #[serde(default)]
    pub party_name: String,
    #[serde(default)]
    pub posting_date: Option<NaiveDate>,
    #[serde(default)]
    pub document_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub currency_code: String,
    #[serde(default)]
    pub tax_amount: Decimal,
    #[serde(default)]
    pub withholding_amount: Decimal,
    #[serde(default)]
    total: Decimal,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default = "ApprovalSummary::draft")]
    approval: ApprovalSummary,
    #[serde(default)]
    revisions: Vec<RevisionEntry>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Document {
    /// A new draft owned by `requester`.
    pub fn new(document_type: DocumentType, requester: &Approver) -> Self {
        Self {
            staging_id: None,
            document_number: String::new(),
            document_type,
            transaction_type: String::new(),
            department_id: String::new(),
            requester_id: requester.id.clone(),
            requester_name: requester.name.clone(),
            party_code: String::new(),
            party_name: String::new(),
            posting_date: None,
            document_date: None,
            due_date: None,
            currency_code: String::new(),
            tax_amount: Decimal::ZERO,
            withholding_amount: Decimal::ZERO,
            total: Decimal::ZERO,
            line_items: Vec::new(),
            approval: ApprovalSummary::draft(),
            revisions: Vec::new(),
            attachments: Vec::new(),
        }
    }

    pub fn requester(&self) -> Approver {
        Approver::new(self.requester_id.clone(), self.requester_name.clone())
    }

    pub fn is_requester(&self, viewer: &Approver) -> bool {
        !self.requester_id.is_empty() && self.requester_id == viewer.id
    }

    pub fn lines_subtotal(&self) -> Decimal {
        self.line_items.iter().map(|line| line.amount).sum()
    }

    /// Recompute the total from the lines, tax and withholding.
    pub fn recompute_total(&mut self) -> Decimal {
        self.total = self.lines_subtotal() + self.tax_amount - self.withholding_amount;
        self.total
    }

    /// Total as of the last recomputation.
    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn approval(&self) -> &ApprovalSummary {
        &self.approval
    }

    pub(crate) fn approval_mut(&mut self) -> &mut ApprovalSummary {
        &mut self.approval
    }

    pub fn revisions(&self) -> &[RevisionEntry] {
        &self.revisions
    }

    pub(crate) fn push_revision(&mut self, entry: RevisionEntry) {
        self.revisions.push(entry);
    }

    /// An owned copy of the financial figures, with the total recomputed
    /// from the current lines.
    pub fn financial_snapshot(&self) -> FinancialSnapshot {
        FinancialSnapshot {
            currency_code: self.currency_code.clone(),
            line_amounts: self.line_items.iter().map(|line| line.amount).collect(),
            tax_amount: self.tax_amount,
            withholding_amount: self.withholding_amount,
            total: self.lines_subtotal() + self.tax_amount - self.withholding_amount,
            posting_date: self.posting_date,
            document_date: self.document_date,
            due_date: self.due_date,
        }
    }
}
