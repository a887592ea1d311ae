//! End-to-end approval workflow test harness.
//!
//! [`PortalBackend`] stands in for the portal API with two addresses: a
//! primary that always answers 503 and a secondary that serves master data,
//! the approval hierarchy, user profiles and a stateful staging store. Every
//! request therefore exercises dispatcher failover before it succeeds.
//!
//! ## Usage
//!
//! ```bash
//! cargo test -p workflow-tests
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Once};

use anyhow::Result;
use approval_portal::models::{ApprovalLevel, Approver, DocumentType};
use approval_portal::Portal;
use portal_core::config::PortalSettings;
use portal_core::http::CredentialProvider;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,workflow_tests=debug,approval_portal=debug,portal_core=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn envelope(data: Value) -> Value {
    json!({
        "status": true,
        "code": 200,
        "message": "OK",
        "data": data
    })
}

/// Staging documents keyed by request path.
#[derive(Clone, Default)]
pub struct StagingRecords {
    inner: Arc<Mutex<HashMap<String, Value>>>,
}

impl StagingRecords {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Value>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn get(&self, path: &str) -> Option<Value> {
        self.lock().get(path).cloned()
    }

    pub fn insert(&self, path: impl Into<String>, document: Value) {
        self.lock().insert(path.into(), document);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

struct StagingRead(StagingRecords);

impl Respond for StagingRead {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        match self.0.get(request.url.path()) {
            Some(document) => ResponseTemplate::new(200).set_body_json(envelope(document)),
            None => ResponseTemplate::new(404).set_body_json(json!({
                "status": false,
                "code": 404,
                "message": "Staging record not found"
            })),
        }
    }
}

struct StagingWrite(StagingRecords);

impl Respond for StagingWrite {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        match serde_json::from_slice::<Value>(&request.body) {
            Ok(document) => {
                self.0.insert(request.url.path(), document);
                ResponseTemplate::new(200).set_body_json(envelope(json!({ "saved": true })))
            }
            Err(e) => ResponseTemplate::new(400).set_body_json(json!({
                "status": false,
                "code": 400,
                "message": format!("Invalid document body: {}", e)
            })),
        }
    }
}

pub fn staging_path(document_type: DocumentType, staging_id: &str) -> String {
    format!("/api/staging/{}/{}", document_type.code(), staging_id)
}

/// Mock portal API for one test.
pub struct PortalBackend {
    pub primary: MockServer,
    pub secondary: MockServer,
    records: StagingRecords,
}

impl PortalBackend {
    pub async fn start() -> Self {
        init_tracing();
        let primary = MockServer::start().await;
        let secondary = MockServer::start().await;
        let records = StagingRecords::default();

        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "message": "Service temporarily unavailable"
            })))
            .mount(&primary)
            .await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/api/staging/[A-Z]{2}/[^/]+$"))
            .respond_with(StagingRead(records.clone()))
            .mount(&secondary)
            .await;
        Mock::given(method("PATCH"))
            .and(path_regex(r"^/api/staging/[A-Z]{2}/[^/]+$"))
            .respond_with(StagingWrite(records.clone()))
            .mount(&secondary)
            .await;

        Self {
            primary,
            secondary,
            records,
        }
    }

    pub fn settings(&self) -> PortalSettings {
        let mut settings = PortalSettings::default();
        settings.api.base_urls = vec![self.primary.uri(), self.secondary.uri()];
        settings.api.request_timeout_ms = 5_000;
        settings
    }

    pub fn portal(&self) -> Result<Portal> {
        Ok(Portal::build(self.settings(), None)?)
    }

    pub fn portal_with_credentials(&self, credentials: Arc<dyn CredentialProvider>) -> Result<Portal> {
        Ok(Portal::build(self.settings(), Some(credentials))?)
    }

    pub async fn with_categories(&self, department_id: &str, transaction_type: &str, categories: &[&str]) {
        Mock::given(method("GET"))
            .and(path("/api/expenses/categories"))
            .and(query_param("departmentId", department_id))
            .and(query_param("transactionType", transaction_type))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!(categories))))
            .mount(&self.secondary)
            .await;
    }

    pub async fn with_account_names(
        &self,
        department_id: &str,
        transaction_type: &str,
        category: &str,
        records: &[(&str, &str)],
    ) {
        let rows: Vec<Value> = records
            .iter()
            .map(|(name, coa)| json!({ "accountName": name, "coa": coa }))
            .collect();
        Mock::given(method("GET"))
            .and(path("/api/expenses/account-names"))
            .and(query_param("departmentId", department_id))
            .and(query_param("transactionType", transaction_type))
            .and(query_param("category", category))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(Value::Array(rows))))
            .mount(&self.secondary)
            .await;
    }

    /// Hierarchy rows for `user_id` as `(level, transaction code, superior)`.
    pub async fn with_hierarchy(
        &self,
        user_id: &str,
        document_type: DocumentType,
        rows: &[(ApprovalLevel, &str, Approver)],
    ) {
        let rows: Vec<Value> = rows
            .iter()
            .map(|(level, code, superior)| {
                json!({
                    "userId": user_id,
                    "documentType": document_type.code(),
                    "typeTransaction": code,
                    "superiorLevel": level.code(),
                    "superiorUserId": superior.id,
                    "superiorName": superior.name
                })
            })
            .collect();
        Mock::given(method("GET"))
            .and(path(format!(
                "/api/employee-superior-document-approvals/user/{}/document-type/{}",
                user_id,
                document_type.code()
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(Value::Array(rows))))
            .mount(&self.secondary)
            .await;
    }

    pub async fn with_user(&self, user: &Approver) {
        Mock::given(method("GET"))
            .and(path(format!("/api/users/{}", user.id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
                "id": user.id,
                "fullName": user.name
            }))))
            .mount(&self.secondary)
            .await;
    }

    /// Serve a bare document on an older, non-staging path.
    pub async fn with_legacy_document(&self, legacy_path: &str, document: Value) {
        Mock::given(method("GET"))
            .and(path(legacy_path))
            .respond_with(ResponseTemplate::new(200).set_body_json(document))
            .mount(&self.secondary)
            .await;
    }

    pub fn seed_staging(&self, document_type: DocumentType, staging_id: &str, document: Value) {
        self.records.insert(staging_path(document_type, staging_id), document);
    }

    pub fn staged(&self, document_type: DocumentType, staging_id: &str) -> Option<Value> {
        self.records.get(&staging_path(document_type, staging_id))
    }

    pub fn records(&self) -> &StagingRecords {
        &self.records
    }

    /// Requests that reached the primary address.
    pub async fn primary_hits(&self) -> usize {
        self.primary
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }
}

pub mod people {
    use approval_portal::models::Approver;

    pub fn requester() -> Approver {
        Approver::new("emp-01", "Ana Putri")
    }

    pub fn checker() -> Approver {
        Approver::new("emp-02", "Budi Santoso")
    }

    pub fn acknowledger() -> Approver {
        Approver::new("emp-03", "Citra Lestari")
    }

    pub fn approver() -> Approver {
        Approver::new("emp-04", "Dewi Anggraini")
    }

    pub fn receiver() -> Approver {
        Approver::new("emp-05", "Eko Prasetyo")
    }

    pub fn closer() -> Approver {
        Approver::new("emp-06", "Fajar Nugroho")
    }

    pub fn reviewers() -> Vec<Approver> {
        vec![checker(), acknowledger(), approver(), receiver(), closer()]
    }
}
