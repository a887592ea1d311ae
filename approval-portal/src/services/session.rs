//! One document being viewed or edited.
//!
//! A session owns the working copy of the document, a private
//! [`MasterDataCache`], per-line editors and the resolved approver
//! candidates. Mutations go through the document's edit policy; status
//! changes go through the workflow operations.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use portal_core::error::PortalError;

use crate::models::{ApprovalLevel, Approver, Document, LineItem};
use crate::services::cache::MasterDataCache;
use crate::services::currency::{self, FormattedAmount};
use crate::services::master_data::{
    FieldChange, LineEditor, MasterDataResolver, MasterDataScope, Resolution,
};
use crate::services::store::DocumentStore;
use crate::services::superiors::{ApproverCandidates, SuperiorApproverResolver};
use crate::services::workflow::{Action, EditPolicy};

pub struct EditSession {
    document: Document,
    viewer: Approver,
    cache: Arc<MasterDataCache>,
    master_data: MasterDataResolver,
    superiors: SuperiorApproverResolver,
    store: Arc<dyn DocumentStore>,
    lines: Vec<LineEditor>,
    approvers: Option<ApproverCandidates>,
    approvers_error: Option<PortalError>,
}

impl EditSession {
    pub(crate) fn new(
        document: Document,
        viewer: Approver,
        cache: Arc<MasterDataCache>,
        master_data: MasterDataResolver,
        superiors: SuperiorApproverResolver,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let lines = document
            .line_items
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, item)| LineEditor::new(index, item))
            .collect();
        Self {
            document,
            viewer,
            cache,
            master_data,
            superiors,
            store,
            lines,
            approvers: None,
            approvers_error: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn viewer(&self) -> &Approver {
        &self.viewer
    }

    pub fn cache(&self) -> &MasterDataCache {
        &self.cache
    }

    pub fn policy(&self) -> EditPolicy {
        self.document.edit_policy(&self.viewer)
    }

    pub fn available_actions(&self) -> Vec<Action> {
        self.document.available_actions(&self.viewer)
    }

    pub fn scope(&self) -> MasterDataScope {
        MasterDataScope::for_document(&self.document)
    }

    pub fn lines(&self) -> &[LineEditor] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Result<&LineEditor, PortalError> {
        self.lines
            .get(index)
            .ok_or_else(|| PortalError::validation(format!("no line {}", index + 1)))
    }

    pub fn approvers(&self) -> Option<&ApproverCandidates> {
        self.approvers.as_ref()
    }

    /// Why the last attempt to load approver candidates failed, if it did.
    /// Cleared by a successful [`EditSession::refresh_approvers`].
    pub fn approvers_error(&self) -> Option<&PortalError> {
        self.approvers_error.as_ref()
    }

    /// Populate option sets for every line and, when the approval section
    /// is editable, the approver candidates. A hierarchy failure leaves the
    /// candidates unresolved and is kept in [`EditSession::approvers_error`].
    pub async fn load(&mut self) {
        self.refresh_lines().await;
        if self.policy().approvers {
            if let Err(e) = self.refresh_approvers().await.map(|_| ()) {
                warn!(
                    document_number = %self.document.document_number,
                    error = %e,
                    "Approver candidates unavailable"
                );
                self.approvers_error = Some(e);
            }
        }
    }

    pub async fn refresh_lines(&mut self) {
        let scope = self.scope();
        for editor in self.lines.iter_mut() {
            self.master_data.load_line(editor, &scope).await;
        }
        self.sync_lines();
    }

    /// Resolve approver candidates for the document's requester.
    pub async fn refresh_approvers(&mut self) -> Result<&ApproverCandidates, PortalError> {
        let requester = if self.document.is_requester(&self.viewer) {
            self.viewer.clone()
        } else {
            self.document.requester()
        };
        let candidates = self
            .superiors
            .resolve(
                &requester,
                self.document.document_type,
                &self.document.transaction_type,
            )
            .await?;
        self.approvers_error = None;
        Ok(self.approvers.insert(candidates))
    }

    /// Change the department or transaction type; dependent option sets and
    /// approver candidates are rebuilt.
    pub async fn set_scope(
        &mut self,
        department_id: &str,
        transaction_type: &str,
    ) -> Result<(), PortalError> {
        self.require(self.policy().header, "header")?;
        self.document.department_id = department_id.trim().to_string();
        self.document.transaction_type = transaction_type.trim().to_string();
        self.approvers = None;
        debug!(
            department_id = %self.document.department_id,
            transaction_type = %self.document.transaction_type,
            "Document scope changed"
        );
        self.refresh_lines().await;
        if self.scope().is_complete() {
            self.refresh_approvers().await?;
        }
        Ok(())
    }

    pub fn add_line(&mut self) -> Result<usize, PortalError> {
        self.require(self.policy().line_items, "line items")?;
        let index = self.lines.len();
        let mut editor = LineEditor::new(index, LineItem::default());
        editor.item_mut().currency_code = self.document.currency_code.clone();
        self.lines.push(editor);
        self.sync_lines();
        Ok(index)
    }

    pub fn remove_line(&mut self, index: usize) -> Result<LineItem, PortalError> {
        self.require(self.policy().line_items, "line items")?;
        self.line(index)?;
        let removed = self.lines.remove(index).into_item();
        for (i, editor) in self.lines.iter_mut().enumerate().skip(index) {
            editor.reindex(i);
        }
        self.sync_lines();
        Ok(removed)
    }

    /// Apply a category or account-name change to a line and cascade.
    pub async fn change_line(
        &mut self,
        index: usize,
        change: FieldChange,
    ) -> Result<Resolution<()>, PortalError> {
        self.require(self.policy().line_items, "line items")?;
        let scope = self.scope();
        let editor = self
            .lines
            .get_mut(index)
            .ok_or_else(|| PortalError::validation(format!("no line {}", index + 1)))?;
        let resolution = self.master_data.handle_change(editor, &scope, change).await?;
        self.sync_lines();
        Ok(resolution)
    }

    /// Set a line amount from user input, returning the normalised text.
    pub fn set_line_amount(&mut self, index: usize, raw: &str) -> Result<FormattedAmount, PortalError> {
        self.require(self.policy().line_items, "line items")?;
        let amount = currency::parse(raw);
        let editor = self
            .lines
            .get_mut(index)
            .ok_or_else(|| PortalError::validation(format!("no line {}", index + 1)))?;
        editor.item_mut().amount = amount;
        self.sync_lines();
        Ok(currency::format(amount))
    }

    pub fn set_line_description(&mut self, index: usize, description: &str) -> Result<(), PortalError> {
        self.require(self.policy().line_items, "line items")?;
        let editor = self
            .lines
            .get_mut(index)
            .ok_or_else(|| PortalError::validation(format!("no line {}", index + 1)))?;
        editor.item_mut().description = description.to_string();
        self.sync_lines();
        Ok(())
    }

    pub fn set_tax_amounts(&mut self, tax: &str, withholding: &str) -> Result<(), PortalError> {
        self.require(self.policy().header, "header")?;
        self.document.tax_amount = currency::parse(tax);
        self.document.withholding_amount = currency::parse(withholding);
        self.document.recompute_total();
        Ok(())
    }

    pub fn set_currency(&mut self, currency_code: &str) -> Result<(), PortalError> {
        self.require(self.policy().header, "header")?;
        let code = currency_code.trim().to_uppercase();
        for editor in self.lines.iter_mut() {
            editor.item_mut().currency_code = code.clone();
        }
        self.document.currency_code = code;
        self.sync_lines();
        Ok(())
    }

    /// Assign an approver picked from the resolved candidates.
    pub fn assign_approver(&mut self, level: ApprovalLevel, user_id: &str) -> Result<(), PortalError> {
        let candidates = self.approvers.as_ref().ok_or_else(|| {
            PortalError::validation("approver candidates have not been resolved")
        })?;
        let approver = candidates
            .for_level(level)
            .iter()
            .find(|a| a.id == user_id)
            .cloned()
            .ok_or_else(|| {
                PortalError::validation(format!(
                    "{} is not an eligible {} approver",
                    user_id,
                    level.as_str()
                ))
            })?;
        self.document
            .assign_approver(level, Some(approver), &self.viewer)
    }

    pub fn formatted_total(&self) -> FormattedAmount {
        currency::format(self.document.total())
    }

    pub fn total(&self) -> Decimal {
        self.document.total()
    }

    pub fn submit(&mut self) -> Result<(), PortalError> {
        self.document.submit(&self.viewer)
    }

    pub fn advance(&mut self, level: ApprovalLevel) -> Result<(), PortalError> {
        self.document.advance(level, &self.viewer)
    }

    pub fn reject(&mut self, remarks: &str) -> Result<(), PortalError> {
        self.document.reject(remarks, &self.viewer)
    }

    pub fn request_revision(&mut self, stage: ApprovalLevel, remarks: &str) -> Result<(), PortalError> {
        self.document.request_revision(stage, remarks, &self.viewer)
    }

    pub async fn save(&self) -> Result<(), PortalError> {
        self.store.save(&self.document).await
    }

    /// End the session, dropping everything it cached.
    pub fn close(self) -> Document {
        self.cache.invalidate_all();
        info!(
            document_number = %self.document.document_number,
            status = %self.document.status(),
            "Edit session closed"
        );
        self.document
    }

    fn sync_lines(&mut self) {
        self.document.line_items = self.lines.iter().map(|e| e.item().clone()).collect();
        self.document.recompute_total();
    }

    fn require(&self, allowed: bool, section: &str) -> Result<(), PortalError> {
        if allowed {
            Ok(())
        } else {
            Err(PortalError::Forbidden(format!(
                "{} is read-only for {} while {}",
                section,
                self.viewer.id,
                self.document.status()
            )))
        }
    }
}
