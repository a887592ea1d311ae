//! Persisted-document store.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use portal_core::error::PortalError;
use portal_core::http::{DispatchRequest, Dispatcher};
use serde_json::Value;
use tracing::info;

use crate::models::{legacy, Document, DocumentType};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load(&self, document_type: DocumentType, staging_id: &str) -> Result<Document, PortalError>;

    /// Persist `document`; it must carry a staging id.
    async fn save(&self, document: &Document) -> Result<(), PortalError>;
}

pub struct HttpDocumentStore {
    dispatcher: Dispatcher,
}

impl HttpDocumentStore {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// The staging path first, then the paths older deployments serve the
    /// same document under.
    fn load_request(document_type: DocumentType, staging_id: &str) -> DispatchRequest {
        let request = DispatchRequest::get(staging_path(document_type, staging_id));
        let staging_id = urlencoding::encode(staging_id);
        match document_type {
            DocumentType::ArInvoice => request
                .or_path(format!("/api/ar-invoices/{}", staging_id))
                .or_path(format!("/api/ar-invoices/{}/details", staging_id)),
            DocumentType::CashAdvance => request.or_path(format!("/api/cash-advance/{}", staging_id)),
            DocumentType::Reimbursement => {
                request.or_path(format!("/api/reimbursements/{}", staging_id))
            }
        }
    }
}

fn staging_path(document_type: DocumentType, staging_id: &str) -> String {
    format!(
        "/api/staging/{}/{}",
        document_type.code(),
        urlencoding::encode(staging_id)
    )
}

fn staging_id(document: &Document) -> Result<&str, PortalError> {
    document
        .staging_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| PortalError::validation("document has no staging id"))
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn load(&self, document_type: DocumentType, staging_id: &str) -> Result<Document, PortalError> {
        let payload: Option<Value> = self
            .dispatcher
            .fetch(Self::load_request(document_type, staging_id))
            .await?;
        let payload = payload.filter(|v| !v.is_null()).ok_or_else(|| {
            PortalError::NotFound(format!("{} document {}", document_type.code(), staging_id))
        })?;
        let mut document = legacy::decode_document(payload)?;
        if document.staging_id.is_none() {
            document.staging_id = Some(staging_id.to_string());
        }
        document.recompute_total();
        Ok(document)
    }

    async fn save(&self, document: &Document) -> Result<(), PortalError> {
        let id = staging_id(document)?;
        let request = DispatchRequest::patch(staging_path(document.document_type, id)).json(document)?;
        let response = self.dispatcher.dispatch(request).await?;
        info!(
            staging_id = %id,
            document_type = document.document_type.code(),
            url = %response.url,
            "Document saved"
        );
        Ok(())
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MockDocumentStore {
    documents: DashMap<(DocumentType, String), Document>,
    save_count: AtomicU64,
}

impl MockDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, document: Document) -> Result<(), PortalError> {
        let id = staging_id(&document)?.to_string();
        self.documents.insert((document.document_type, id), document);
        Ok(())
    }

    pub fn get(&self, document_type: DocumentType, staging_id: &str) -> Option<Document> {
        self.documents
            .get(&(document_type, staging_id.to_string()))
            .map(|d| d.clone())
    }

    pub fn save_count(&self) -> u64 {
        self.save_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    async fn load(&self, document_type: DocumentType, staging_id: &str) -> Result<Document, PortalError> {
        self.get(document_type, staging_id).ok_or_else(|| {
            PortalError::NotFound(format!("{} document {}", document_type.code(), staging_id))
        })
    }

    async fn save(&self, document: &Document) -> Result<(), PortalError> {
        self.insert(document.clone())?;
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
