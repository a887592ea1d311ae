//! Common setup for workflow tests.

#![allow(dead_code)]

use approval_portal::models::{ApprovalLevel, DocumentType};
use serde_json::{json, Value};
use workflow_tests::people::{acknowledger, approver, checker, closer, receiver, requester};
use workflow_tests::PortalBackend;

pub const DEPARTMENT: &str = "OPS";

/// A backend with master data and a complete hierarchy for the requester.
pub async fn setup() -> PortalBackend {
    let backend = PortalBackend::start().await;

    backend
        .with_categories(DEPARTMENT, "Travelling", &["Transport", "Lodging"])
        .await;
    backend
        .with_account_names(
            DEPARTMENT,
            "Travelling",
            "Transport",
            &[("Taxi", "6101"), ("Flight", "6102")],
        )
        .await;
    backend
        .with_account_names(DEPARTMENT, "Travelling", "Lodging", &[("Hotel", "6201")])
        .await;
    backend
        .with_categories(DEPARTMENT, "Personal Loan", &["Loan"])
        .await;
    backend
        .with_account_names(
            DEPARTMENT,
            "Personal Loan",
            "Loan",
            &[("Employee Loan", "1401")],
        )
        .await;

    for document_type in [DocumentType::Reimbursement, DocumentType::CashAdvance] {
        let mut rows = Vec::new();
        for code in ["TR", "LO"] {
            rows.push((ApprovalLevel::Checked, code, checker()));
            rows.push((ApprovalLevel::Acknowledged, code, acknowledger()));
            rows.push((ApprovalLevel::Approved, code, approver()));
            rows.push((ApprovalLevel::Received, code, receiver()));
        }
        rows.push((ApprovalLevel::Closed, "LO", closer()));
        backend
            .with_hierarchy(&requester().id, document_type, &rows)
            .await;
    }

    for user in [requester(), checker(), acknowledger(), approver(), receiver(), closer()] {
        backend.with_user(&user).await;
    }

    backend
}

/// A staged reimbursement draft as the backend stores it.
pub fn reimbursement_draft(document_number: &str) -> Value {
    let requester = requester();
    json!({
        "documentType": "RE",
        "documentNumber": document_number,
        "transactionType": "Travelling",
        "departmentId": DEPARTMENT,
        "requesterId": requester.id,
        "requesterName": requester.name,
        "currencyCode": "IDR",
        "taxAmount": "0",
        "withholdingAmount": "0",
        "lineItems": [
            {
                "category": "Transport",
                "accountName": "Taxi",
                "glAccountCode": "6101",
                "description": "Airport transfer",
                "currencyCode": "IDR",
                "amount": "275000"
            }
        ],
        "approval": { "approvalStatus": "Draft" }
    })
}
