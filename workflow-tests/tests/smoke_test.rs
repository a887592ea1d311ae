//! Smoke test to verify the workflow harness.

mod common;

use approval_portal::models::DocumentType;
use workflow_tests::people::requester;

#[tokio::test]
async fn portal_reaches_backend_through_failover() {
    let backend = common::setup().await;
    backend.seed_staging(
        DocumentType::Reimbursement,
        "smoke",
        common::reimbursement_draft("RE-SMOKE"),
    );

    let portal = backend.portal().expect("Failed to build portal");
    let session = portal
        .open(DocumentType::Reimbursement, "smoke", requester())
        .await
        .expect("Failed to open staged document");

    assert_eq!(session.document().document_number, "RE-SMOKE");
    assert!(backend.primary_hits().await > 0);
}
