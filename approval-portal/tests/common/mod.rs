#![allow(dead_code)]

use std::sync::Arc;

use approval_portal::models::{ApprovalLevel, Approver, Document, DocumentType, LineItem};
use approval_portal::services::{
    MasterDataSource, MockDocumentStore, MockMasterDataSource, MockSuperiorDirectory,
};
use approval_portal::Portal;
use portal_core::config::PortalSettings;
use portal_core::observability::init_test_tracing;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use wiremock::MockServer;

pub const DEPARTMENT: &str = "FIN";
pub const TRANSACTION: &str = "Travelling";

/// A portal wired to a mock HTTP backend.
pub struct TestPortal {
    pub server: MockServer,
    pub portal: Portal,
}

impl TestPortal {
    pub async fn spawn() -> Self {
        init_test_tracing();
        let server = MockServer::start().await;
        let mut settings = PortalSettings::default();
        settings.api.base_urls = vec![server.uri()];
        let portal = Portal::build(settings, None).expect("Failed to build portal");
        Self { server, portal }
    }
}

/// A portal wired to in-memory collaborators.
pub struct OfflinePortal {
    pub portal: Portal,
    pub store: Arc<MockDocumentStore>,
    pub directory: Arc<MockSuperiorDirectory>,
}

impl OfflinePortal {
    pub fn spawn() -> Self {
        Self::with_source(Arc::new(master_data()))
    }

    pub fn with_source(source: Arc<dyn MasterDataSource>) -> Self {
        init_test_tracing();
        let store = Arc::new(MockDocumentStore::new());
        let directory = Arc::new(hierarchy());
        let portal = Portal::with_collaborators(
            PortalSettings::default(),
            source,
            directory.clone(),
            store.clone(),
        );
        Self {
            portal,
            store,
            directory,
        }
    }
}

pub fn requester() -> Approver {
    Approver::new("u-100", "Ana Putri")
}

pub fn checker() -> Approver {
    Approver::new("u-200", "Budi Santoso")
}

pub fn acknowledger() -> Approver {
    Approver::new("u-300", "Citra Lestari")
}

pub fn approver() -> Approver {
    Approver::new("u-400", "Dewi Anggraini")
}

pub fn receiver() -> Approver {
    Approver::new("u-500", "Eko Prasetyo")
}

pub fn closer() -> Approver {
    Approver::new("u-600", "Fajar Nugroho")
}

pub fn master_data() -> MockMasterDataSource {
    MockMasterDataSource::new()
        .with_categories(DEPARTMENT, TRANSACTION, &["Transport", "Lodging"])
        .with_account_names(
            DEPARTMENT,
            TRANSACTION,
            "Transport",
            &[("Taxi", "6101"), ("Flight", "6102")],
        )
        .with_account_names(DEPARTMENT, TRANSACTION, "Lodging", &[("Hotel", "6201")])
        .with_categories(DEPARTMENT, "Personal Loan", &["Loan"])
        .with_account_names(
            DEPARTMENT,
            "Personal Loan",
            "Loan",
            &[("Employee Loan", "1401")],
        )
}

pub fn hierarchy() -> MockSuperiorDirectory {
    let id = requester().id;
    let mut directory = MockSuperiorDirectory::new();
    for document_type in [DocumentType::Reimbursement, DocumentType::CashAdvance] {
        for code in ["TR", "LO"] {
            directory = directory
                .with_superior(&id, document_type, code, ApprovalLevel::Checked, &checker().id, "")
                .with_superior(&id, document_type, code, ApprovalLevel::Acknowledged, &acknowledger().id, "")
                .with_superior(&id, document_type, code, ApprovalLevel::Approved, &approver().id, "")
                .with_superior(&id, document_type, code, ApprovalLevel::Received, &receiver().id, "");
        }
        directory = directory.with_superior(
            &id,
            document_type,
            "LO",
            ApprovalLevel::Closed,
            &closer().id,
            "",
        );
    }
    for user in [checker(), acknowledger(), approver(), receiver(), closer()] {
        directory = directory.with_user(&user.id, &user.name);
    }
    directory
}

/// A stored reimbursement draft with one complete line.
pub fn draft(staging_id: &str) -> Document {
    let mut document = Document::new(DocumentType::Reimbursement, &requester());
    document.staging_id = Some(staging_id.to_string());
    document.document_number = format!("RE-{}", staging_id);
    document.department_id = DEPARTMENT.to_string();
    document.transaction_type = TRANSACTION.to_string();
    document.currency_code = "IDR".to_string();
    let mut line = LineItem::new("Transport", "Taxi", "6101");
    line.amount = Decimal::new(150_000, 0);
    line.currency_code = "IDR".to_string();
    document.line_items.push(line);
    document.recompute_total();
    document
}

pub fn envelope(data: Value) -> Value {
    json!({
        "status": true,
        "code": 200,
        "message": "OK",
        "data": data
    })
}
