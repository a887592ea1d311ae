//! Wiring of settings, collaborators and edit sessions.

use std::sync::Arc;

use portal_core::config::PortalSettings;
use portal_core::error::PortalError;
use portal_core::http::{CredentialProvider, Dispatcher};
use tracing::info;

use crate::models::{Approver, Document, DocumentType};
use crate::services::{
    DocumentStore, EditSession, HttpDocumentStore, HttpMasterDataSource, HttpSuperiorDirectory,
    MasterDataCache, MasterDataResolver, MasterDataSource, SuperiorApproverResolver,
    SuperiorDirectory,
};

/// Shared collaborators; sessions are opened from here.
#[derive(Clone)]
pub struct Portal {
    settings: PortalSettings,
    master_data: Arc<dyn MasterDataSource>,
    directory: Arc<dyn SuperiorDirectory>,
    store: Arc<dyn DocumentStore>,
}

impl Portal {
    /// Build HTTP collaborators sharing one dispatcher.
    pub fn build(
        settings: PortalSettings,
        credentials: Option<Arc<dyn CredentialProvider>>,
    ) -> Result<Self, PortalError> {
        let dispatcher = Dispatcher::from_settings(&settings.api, credentials)?;
        info!(
            base_urls = ?dispatcher.base_urls(),
            timeout_ms = settings.api.request_timeout_ms,
            "Portal collaborators configured"
        );
        Ok(Self::with_collaborators(
            settings,
            Arc::new(HttpMasterDataSource::new(dispatcher.clone())),
            Arc::new(HttpSuperiorDirectory::new(dispatcher.clone())),
            Arc::new(HttpDocumentStore::new(dispatcher)),
        ))
    }

    pub fn with_collaborators(
        settings: PortalSettings,
        master_data: Arc<dyn MasterDataSource>,
        directory: Arc<dyn SuperiorDirectory>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            settings,
            master_data,
            directory,
            store,
        }
    }

    pub fn settings(&self) -> &PortalSettings {
        &self.settings
    }

    /// Load a persisted document and prepare it for `viewer`.
    pub async fn open(
        &self,
        document_type: DocumentType,
        staging_id: &str,
        viewer: Approver,
    ) -> Result<EditSession, PortalError> {
        let document = self.store.load(document_type, staging_id).await?;
        info!(
            staging_id,
            document_type = document_type.code(),
            status = %document.status(),
            viewer = %viewer.id,
            "Opening document"
        );
        let mut session = self.session(document, viewer);
        session.load().await;
        Ok(session)
    }

    /// Start a new draft owned by `requester`.
    pub async fn start_draft(
        &self,
        document_type: DocumentType,
        requester: Approver,
    ) -> Result<EditSession, PortalError> {
        let document = Document::new(document_type, &requester);
        let mut session = self.session(document, requester);
        session.refresh_lines().await;
        Ok(session)
    }

    fn session(&self, document: Document, viewer: Approver) -> EditSession {
        let cache = Arc::new(MasterDataCache::new(self.settings.cache.ttl()));
        let master_data = MasterDataResolver::new(
            self.master_data.clone(),
            cache.clone(),
            self.settings.master_data.historical_policy,
        );
        let superiors = SuperiorApproverResolver::new(
            self.directory.clone(),
            cache.clone(),
            self.settings.superiors.fallback_transaction_code.clone(),
        );
        EditSession::new(
            document,
            viewer,
            cache,
            master_data,
            superiors,
            self.store.clone(),
        )
    }
}
