//! Approval workflow state machine.
//!
//! Draft -> Prepared -> Checked -> Acknowledged -> Approved -> Received
//! [-> Closed], with Rejected (terminal) and Revision (back to the
//! requester) as side transitions. Every operation checks the current status
//! first and leaves the document untouched when it refuses.

use chrono::Utc;
use tracing::info;

use portal_core::error::PortalError;

use crate::models::{
    transaction_code, ApprovalLevel, ApprovalStatus, Approver, Document, DocumentType,
    RejectionRecord, RevisionEntry, SignOff, PERSONAL_LOAN_CODE,
};
use crate::services::metrics::{WORKFLOW_REJECTED_TRANSITIONS_TOTAL, WORKFLOW_TRANSITIONS_TOTAL};

/// Statuses from which a document may still be rejected.
const REJECTABLE: [ApprovalStatus; 4] = [
    ApprovalStatus::Draft,
    ApprovalStatus::Prepared,
    ApprovalStatus::Checked,
    ApprovalStatus::Acknowledged,
];

/// What a viewer may change on a document in its current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditPolicy {
    pub header: bool,
    pub line_items: bool,
    pub attachments: bool,
    pub approvers: bool,
}

impl EditPolicy {
    /// Drafts and documents sent back for revision are editable by their
    /// requester; everything else is read-only.
    pub fn for_status(status: ApprovalStatus, viewer_is_requester: bool) -> Self {
        let editable = viewer_is_requester
            && matches!(status, ApprovalStatus::Draft | ApprovalStatus::Revision);
        Self {
            header: editable,
            line_items: editable,
            attachments: editable,
            approvers: editable,
        }
    }

    pub fn read_only() -> Self {
        Self::for_status(ApprovalStatus::Rejected, false)
    }

    pub fn is_read_only(&self) -> bool {
        !(self.header || self.line_items || self.attachments || self.approvers)
    }
}

/// An operation a viewer can trigger on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Submit,
    Advance(ApprovalLevel),
    Reject,
    RequestRevision,
}

impl Document {
    /// Levels this document must pass through, in order. Closed is only
    /// required for personal-loan cash advances.
    pub fn route(&self) -> Vec<ApprovalLevel> {
        let closes = self.document_type == DocumentType::CashAdvance
            && transaction_code(&self.transaction_type, "").as_str() == PERSONAL_LOAN_CODE;
        ApprovalLevel::ALL
            .into_iter()
            .filter(|level| *level != ApprovalLevel::Closed || closes)
            .collect()
    }

    pub fn requires_level(&self, level: ApprovalLevel) -> bool {
        self.route().contains(&level)
    }

    pub fn status(&self) -> ApprovalStatus {
        self.approval().status()
    }

    /// The level whose sign-off is awaited, if any.
    pub fn pending_level(&self) -> Option<ApprovalLevel> {
        match self.status() {
            ApprovalStatus::Draft | ApprovalStatus::Revision => Some(ApprovalLevel::Prepared),
            ApprovalStatus::Rejected => None,
            status => status
                .signed_level()
                .and_then(|level| level.next())
                .filter(|level| self.requires_level(*level)),
        }
    }

    /// Rejected, or signed off by the last level on the route.
    pub fn is_final(&self) -> bool {
        self.pending_level().is_none()
    }

    pub fn edit_policy(&self, viewer: &Approver) -> EditPolicy {
        EditPolicy::for_status(self.status(), self.is_requester(viewer))
    }

    /// Choose the approver for `level` from the approval section.
    pub fn assign_approver(
        &mut self,
        level: ApprovalLevel,
        approver: Option<Approver>,
        viewer: &Approver,
    ) -> Result<(), PortalError> {
        if !self.edit_policy(viewer).approvers {
            return Err(refused(
                "assign",
                PortalError::Forbidden(format!(
                    "approvers cannot be changed by {} while {}",
                    viewer.id,
                    self.status()
                )),
            ));
        }
        let approver = approver.filter(|a| !a.id.trim().is_empty());
        self.approval_mut().assign(level, approver);
        Ok(())
    }

    /// Hand a draft (or revised) document to the approval chain.
    pub fn submit(&mut self, actor: &Approver) -> Result<(), PortalError> {
        let from = self.status();
        if !matches!(from, ApprovalStatus::Draft | ApprovalStatus::Revision) {
            return Err(refused(
                "submit",
                PortalError::invalid_transition(from, ApprovalStatus::Prepared),
            ));
        }
        if !self.is_requester(actor) {
            return Err(refused(
                "submit",
                PortalError::Forbidden(format!("only the requester can submit, not {}", actor.id)),
            ));
        }

        let preparer = self
            .approval()
            .assignee(ApprovalLevel::Prepared)
            .cloned()
            .unwrap_or_else(|| actor.clone());
        self.validate_for_submit(&preparer)
            .map_err(|e| refused("submit", e))?;

        self.recompute_total();
        let approval = self.approval_mut();
        approval.assign(ApprovalLevel::Prepared, Some(preparer.clone()));
        if from == ApprovalStatus::Revision {
            approval.clear_sign_offs_after(ApprovalLevel::Prepared);
        }
        approval.sign(ApprovalLevel::Prepared, SignOff::new(&preparer, Utc::now()));
        approval.set_status(ApprovalStatus::Prepared);

        record("submit", ApprovalStatus::Prepared);
        info!(
            document_number = %self.document_number,
            document_type = self.document_type.code(),
            from = %from,
            preparer = %preparer.id,
            total = %self.total(),
            "Document submitted"
        );
        Ok(())
    }

    /// Sign off `level` as `actor`.
    pub fn advance(&mut self, level: ApprovalLevel, actor: &Approver) -> Result<(), PortalError> {
        let from = self.status();
        let to = level.reached_status();

        let expected = level.previous().map(|previous| previous.reached_status());
        if level == ApprovalLevel::Prepared || !self.requires_level(level) || expected != Some(from) {
            return Err(refused("advance", PortalError::invalid_transition(from, to)));
        }

        if let Some(assignee) = self.approval().assignee(level) {
            if assignee.id != actor.id {
                return Err(refused(
                    "advance",
                    PortalError::Forbidden(format!(
                        "{} is assigned to {}, not {}",
                        level.as_str(),
                        assignee.id,
                        actor.id
                    )),
                ));
            }
        }

        let approval = self.approval_mut();
        if approval.assignee(level).is_none() {
            approval.assign(level, Some(actor.clone()));
        }
        approval.sign(level, SignOff::new(actor, Utc::now()));
        approval.set_status(to);

        record("advance", to);
        info!(
            document_number = %self.document_number,
            level = level.as_str(),
            actor = %actor.id,
            "Approval level signed off"
        );
        Ok(())
    }

    /// Reject the document, keeping the figures as they stood.
    pub fn reject(&mut self, remarks: &str, rejected_by: &Approver) -> Result<(), PortalError> {
        let from = self.status();
        if !REJECTABLE.contains(&from) {
            return Err(refused(
                "reject",
                PortalError::invalid_transition(from, ApprovalStatus::Rejected),
            ));
        }
        let remarks = remarks.trim();
        if remarks.is_empty() {
            return Err(refused(
                "reject",
                PortalError::validation("rejection remarks are required"),
            ));
        }

        let snapshot = self.financial_snapshot();
        let approval = self.approval_mut();
        approval.set_rejection(RejectionRecord::new(
            remarks.to_string(),
            rejected_by.clone(),
            Utc::now(),
            Some(snapshot),
        ));
        approval.set_status(ApprovalStatus::Rejected);

        record("reject", ApprovalStatus::Rejected);
        info!(
            document_number = %self.document_number,
            from = %from,
            rejected_by = %rejected_by.id,
            "Document rejected"
        );
        Ok(())
    }

    /// Send the document back to its requester from reviewing `stage`.
    pub fn request_revision(
        &mut self,
        stage: ApprovalLevel,
        remarks: &str,
        revised_by: &Approver,
    ) -> Result<(), PortalError> {
        let from = self.status();
        if !self.can_request_revision() {
            return Err(refused(
                "request_revision",
                PortalError::invalid_transition(from, ApprovalStatus::Revision),
            ));
        }
        if stage == ApprovalLevel::Prepared || !self.requires_level(stage) {
            return Err(refused(
                "request_revision",
                PortalError::validation(format!(
                    "{} is not a reviewing stage for this document",
                    stage.as_str()
                )),
            ));
        }
        let remarks = remarks.trim();
        if remarks.is_empty() {
            return Err(refused(
                "request_revision",
                PortalError::validation("revision remarks are required"),
            ));
        }

        self.push_revision(RevisionEntry::new(
            stage,
            remarks.to_string(),
            revised_by.clone(),
            Utc::now(),
        ));
        self.approval_mut().set_status(ApprovalStatus::Revision);

        record("request_revision", ApprovalStatus::Revision);
        info!(
            document_number = %self.document_number,
            from = %from,
            stage = stage.as_str(),
            revised_by = %revised_by.id,
            "Revision requested"
        );
        Ok(())
    }

    /// Actions `viewer` may take right now.
    pub fn available_actions(&self, viewer: &Approver) -> Vec<Action> {
        let status = self.status();
        let mut actions = Vec::new();

        if matches!(status, ApprovalStatus::Draft | ApprovalStatus::Revision) {
            if self.is_requester(viewer) {
                actions.push(Action::Submit);
            }
            return actions;
        }

        let Some(level) = self.pending_level() else {
            return actions;
        };
        let is_reviewer = match self.approval().assignee(level) {
            Some(assignee) => assignee.id == viewer.id,
            None => !self.is_requester(viewer),
        };
        if !is_reviewer {
            return actions;
        }

        actions.push(Action::Advance(level));
        if REJECTABLE.contains(&status) {
            actions.push(Action::Reject);
        }
        if self.can_request_revision() {
            actions.push(Action::RequestRevision);
        }
        actions
    }

    fn can_request_revision(&self) -> bool {
        match self.status() {
            ApprovalStatus::Prepared
            | ApprovalStatus::Checked
            | ApprovalStatus::Acknowledged
            | ApprovalStatus::Approved => true,
            ApprovalStatus::Received => self.requires_level(ApprovalLevel::Closed),
            _ => false,
        }
    }

    fn validate_for_submit(&self, preparer: &Approver) -> Result<(), PortalError> {
        let header = [
            ("transactionType", &self.transaction_type),
            ("departmentId", &self.department_id),
            ("requesterId", &self.requester_id),
            ("currencyCode", &self.currency_code),
        ];
        let missing: Vec<&str> = header
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(PortalError::validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        for (index, line) in self.line_items.iter().enumerate() {
            if line.amount.is_sign_negative() && !line.amount.is_zero() {
                return Err(PortalError::validation(format!(
                    "line {} has a negative amount",
                    index + 1
                )));
            }
            if !line.is_blank() && !line.is_valid() {
                return Err(PortalError::validation(format!(
                    "line {} is incomplete",
                    index + 1
                )));
            }
        }
        if !self.line_items.iter().any(|line| line.is_valid()) {
            return Err(PortalError::validation(
                "at least one valid line item is required",
            ));
        }

        for level in self.route() {
            let assignee = if level == ApprovalLevel::Prepared {
                Some(preparer)
            } else {
                self.approval().assignee(level)
            };
            if assignee.map(|a| a.id.trim().is_empty()).unwrap_or(true) {
                return Err(PortalError::validation(format!(
                    "no approver assigned for {}",
                    level.as_str()
                )));
            }
        }
        Ok(())
    }
}

fn record(action: &str, to: ApprovalStatus) {
    WORKFLOW_TRANSITIONS_TOTAL
        .with_label_values(&[action, to.as_str()])
        .inc();
}

fn refused(action: &str, error: PortalError) -> PortalError {
    let reason = match &error {
        PortalError::InvalidTransition { .. } => "invalid_transition",
        PortalError::Validation(_) => "validation",
        PortalError::Forbidden(_) => "forbidden",
        _ => "other",
    };
    WORKFLOW_REJECTED_TRANSITIONS_TOTAL
        .with_label_values(&[action, reason])
        .inc();
    tracing::debug!(action, reason, error = %error, "Workflow operation refused");
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineItem;
    use rust_decimal::Decimal;

    fn requester() -> Approver {
        Approver::new("u1", "Ana")
    }

    fn chain() -> [(ApprovalLevel, Approver); 5] {
        [
            (ApprovalLevel::Checked, Approver::new("u2", "Budi")),
            (ApprovalLevel::Acknowledged, Approver::new("u3", "Citra")),
            (ApprovalLevel::Approved, Approver::new("u4", "Dewi")),
            (ApprovalLevel::Received, Approver::new("u5", "Eko")),
            (ApprovalLevel::Closed, Approver::new("u6", "Fajar")),
        ]
    }

    fn valid_line() -> LineItem {
        LineItem {
            amount: Decimal::new(150_000, 2),
            ..LineItem::new("Travel", "Taxi", "6110")
        }
    }

    fn draft(transaction_type: &str) -> Document {
        let mut doc = Document::new(DocumentType::CashAdvance, &requester());
        doc.document_number = "CA-0001".to_string();
        doc.transaction_type = transaction_type.to_string();
        doc.department_id = "D01".to_string();
        doc.currency_code = "IDR".to_string();
        doc.line_items = vec![valid_line()];
        for (level, approver) in chain() {
            doc.assign_approver(level, Some(approver), &requester()).unwrap();
        }
        doc
    }

    fn approver(level: ApprovalLevel) -> Approver {
        chain()
            .into_iter()
            .find(|(l, _)| *l == level)
            .map(|(_, a)| a)
            .unwrap()
    }

    #[test]
    fn submit_without_lines_is_a_validation_error() {
        let mut doc = draft("Travelling");
        doc.line_items.clear();
        let err = doc.submit(&requester()).unwrap_err();
        assert!(matches!(err, PortalError::Validation(_)));
        assert_eq!(doc.status(), ApprovalStatus::Draft);
        assert!(doc.approval().sign_off(ApprovalLevel::Prepared).is_none());
    }

    #[test]
    fn submit_stamps_prepared_sign_off() {
        let mut doc = draft("Travelling");
        doc.submit(&requester()).unwrap();

        assert_eq!(doc.status(), ApprovalStatus::Prepared);
        let sign_off = doc.approval().sign_off(ApprovalLevel::Prepared).unwrap();
        assert_eq!(sign_off.approver_id(), "u1");
        assert_eq!(doc.approval().assignee(ApprovalLevel::Prepared), Some(&requester()));
        assert_eq!(doc.total(), Decimal::new(150_000, 2));
    }

    #[test]
    fn submit_reports_missing_header_fields() {
        let mut doc = draft("Travelling");
        doc.currency_code = " ".to_string();
        doc.department_id.clear();
        match doc.submit(&requester()).unwrap_err() {
            PortalError::Validation(message) => {
                assert!(message.contains("departmentId"));
                assert!(message.contains("currencyCode"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn submit_rejects_negative_and_incomplete_lines() {
        let mut doc = draft("Travelling");
        doc.line_items.push(LineItem {
            amount: Decimal::new(-1, 0),
            ..valid_line()
        });
        assert!(matches!(doc.submit(&requester()), Err(PortalError::Validation(_))));

        let mut doc = draft("Travelling");
        doc.line_items.push(LineItem::new("Meals", "", ""));
        assert!(matches!(doc.submit(&requester()), Err(PortalError::Validation(_))));

        let mut doc = draft("Travelling");
        doc.line_items.push(LineItem::default());
        assert!(doc.submit(&requester()).is_ok());
    }

    #[test]
    fn submit_requires_assignees_on_the_route_only() {
        let mut doc = draft("Travelling");
        doc.assign_approver(ApprovalLevel::Closed, None, &requester()).unwrap();
        assert!(doc.submit(&requester()).is_ok());

        let mut doc = draft("Personal Loan");
        doc.assign_approver(ApprovalLevel::Closed, None, &requester()).unwrap();
        match doc.submit(&requester()).unwrap_err() {
            PortalError::Validation(message) => assert!(message.contains("Closed")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn only_requester_submits() {
        let mut doc = draft("Travelling");
        let err = doc.submit(&approver(ApprovalLevel::Checked)).unwrap_err();
        assert!(matches!(err, PortalError::Forbidden(_)));
    }

    #[test]
    fn advance_from_draft_is_invalid() {
        let mut doc = draft("Travelling");
        let err = doc
            .advance(ApprovalLevel::Checked, &approver(ApprovalLevel::Checked))
            .unwrap_err();
        assert!(matches!(err, PortalError::InvalidTransition { .. }));
        assert!(doc.approval().sign_off(ApprovalLevel::Checked).is_none());
    }

    #[test]
    fn advance_from_prepared_stamps_checked() {
        let mut doc = draft("Travelling");
        doc.submit(&requester()).unwrap();
        doc.advance(ApprovalLevel::Checked, &approver(ApprovalLevel::Checked))
            .unwrap();

        assert_eq!(doc.status(), ApprovalStatus::Checked);
        let sign_off = doc.approval().sign_off(ApprovalLevel::Checked).unwrap();
        assert_eq!(sign_off.approver_id(), "u2");
    }

    #[test]
    fn advance_cannot_skip_levels_or_target_prepared() {
        let mut doc = draft("Travelling");
        doc.submit(&requester()).unwrap();
        assert!(matches!(
            doc.advance(ApprovalLevel::Approved, &approver(ApprovalLevel::Approved)),
            Err(PortalError::InvalidTransition { .. })
        ));
        assert!(matches!(
            doc.advance(ApprovalLevel::Prepared, &requester()),
            Err(PortalError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn advance_by_someone_else_is_forbidden() {
        let mut doc = draft("Travelling");
        doc.submit(&requester()).unwrap();
        let err = doc
            .advance(ApprovalLevel::Checked, &approver(ApprovalLevel::Approved))
            .unwrap_err();
        assert!(matches!(err, PortalError::Forbidden(_)));
    }

    #[test]
    fn closed_only_on_personal_loan_route() {
        let mut doc = draft("Travelling");
        doc.submit(&requester()).unwrap();
        for (level, who) in chain().into_iter().take(4) {
            doc.advance(level, &who).unwrap();
        }
        assert_eq!(doc.status(), ApprovalStatus::Received);
        assert!(doc.is_final());
        assert!(matches!(
            doc.advance(ApprovalLevel::Closed, &approver(ApprovalLevel::Closed)),
            Err(PortalError::InvalidTransition { .. })
        ));

        let mut loan = draft("Personal Loan");
        loan.submit(&requester()).unwrap();
        for (level, who) in chain() {
            loan.advance(level, &who).unwrap();
        }
        assert_eq!(loan.status(), ApprovalStatus::Closed);
        assert!(loan.is_final());
    }

    #[test]
    fn reject_captures_immutable_snapshot() {
        let mut doc = draft("Travelling");
        doc.submit(&requester()).unwrap();
        doc.reject("duplicate claim", &approver(ApprovalLevel::Checked))
            .unwrap();

        doc.line_items[0].amount = Decimal::new(1, 0);
        doc.currency_code = "USD".to_string();

        let rejection = doc.approval().rejection().unwrap();
        let snapshot = rejection.snapshot().unwrap();
        assert_eq!(snapshot.line_amounts, vec![Decimal::new(150_000, 2)]);
        assert_eq!(snapshot.currency_code, "IDR");
        assert_eq!(rejection.remarks(), "duplicate claim");
        assert_eq!(doc.status(), ApprovalStatus::Rejected);
    }

    #[test]
    fn reject_needs_remarks_and_an_open_status() {
        let mut doc = draft("Travelling");
        doc.submit(&requester()).unwrap();
        assert!(matches!(
            doc.reject("   ", &approver(ApprovalLevel::Checked)),
            Err(PortalError::Validation(_))
        ));

        for (level, who) in chain().into_iter().take(3) {
            doc.advance(level, &who).unwrap();
        }
        assert_eq!(doc.status(), ApprovalStatus::Approved);
        assert!(matches!(
            doc.reject("too late", &approver(ApprovalLevel::Received)),
            Err(PortalError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn revision_returns_document_to_requester_and_resubmits() {
        let mut doc = draft("Travelling");
        doc.submit(&requester()).unwrap();
        doc.advance(ApprovalLevel::Checked, &approver(ApprovalLevel::Checked))
            .unwrap();
        doc.request_revision(
            ApprovalLevel::Acknowledged,
            "attach the receipt",
            &approver(ApprovalLevel::Acknowledged),
        )
        .unwrap();

        assert_eq!(doc.status(), ApprovalStatus::Revision);
        assert!(doc.edit_policy(&requester()).line_items);
        assert!(doc.edit_policy(&approver(ApprovalLevel::Checked)).is_read_only());

        doc.submit(&requester()).unwrap();
        assert_eq!(doc.status(), ApprovalStatus::Prepared);
        assert!(doc.approval().sign_off(ApprovalLevel::Checked).is_none());
        assert_eq!(doc.revisions().len(), 1);
        assert_eq!(doc.revisions()[0].stage(), ApprovalLevel::Acknowledged);
    }

    #[test]
    fn revision_rules() {
        let mut doc = draft("Travelling");
        assert!(matches!(
            doc.request_revision(ApprovalLevel::Checked, "x", &approver(ApprovalLevel::Checked)),
            Err(PortalError::InvalidTransition { .. })
        ));

        doc.submit(&requester()).unwrap();
        assert!(matches!(
            doc.request_revision(ApprovalLevel::Prepared, "x", &requester()),
            Err(PortalError::Validation(_))
        ));
        assert!(matches!(
            doc.request_revision(ApprovalLevel::Checked, "", &approver(ApprovalLevel::Checked)),
            Err(PortalError::Validation(_))
        ));

        for (level, who) in chain().into_iter().take(4) {
            doc.advance(level, &who).unwrap();
        }
        assert!(matches!(
            doc.request_revision(ApprovalLevel::Received, "x", &approver(ApprovalLevel::Received)),
            Err(PortalError::InvalidTransition { .. })
        ));

        let mut loan = draft("Personal Loan");
        loan.submit(&requester()).unwrap();
        for (level, who) in chain().into_iter().take(4) {
            loan.advance(level, &who).unwrap();
        }
        assert!(loan
            .request_revision(ApprovalLevel::Closed, "wrong account", &approver(ApprovalLevel::Closed))
            .is_ok());
    }

    #[test]
    fn edit_policy_by_status() {
        assert!(!EditPolicy::for_status(ApprovalStatus::Draft, true).is_read_only());
        assert!(EditPolicy::for_status(ApprovalStatus::Draft, false).is_read_only());
        assert!(!EditPolicy::for_status(ApprovalStatus::Revision, true).is_read_only());
        for status in [
            ApprovalStatus::Prepared,
            ApprovalStatus::Checked,
            ApprovalStatus::Acknowledged,
            ApprovalStatus::Approved,
            ApprovalStatus::Received,
            ApprovalStatus::Closed,
            ApprovalStatus::Rejected,
        ] {
            assert!(EditPolicy::for_status(status, true).is_read_only(), "{status}");
        }
        assert!(EditPolicy::read_only().is_read_only());
    }

    #[test]
    fn approvers_locked_after_submit() {
        let mut doc = draft("Travelling");
        doc.submit(&requester()).unwrap();
        let err = doc
            .assign_approver(ApprovalLevel::Checked, Some(Approver::new("u9", "Gita")), &requester())
            .unwrap_err();
        assert!(matches!(err, PortalError::Forbidden(_)));
    }

    #[test]
    fn actions_follow_the_pending_level() {
        let mut doc = draft("Travelling");
        assert_eq!(doc.available_actions(&requester()), vec![Action::Submit]);
        assert!(doc.available_actions(&approver(ApprovalLevel::Checked)).is_empty());

        doc.submit(&requester()).unwrap();
        assert!(doc.available_actions(&requester()).is_empty());
        assert_eq!(
            doc.available_actions(&approver(ApprovalLevel::Checked)),
            vec![
                Action::Advance(ApprovalLevel::Checked),
                Action::Reject,
                Action::RequestRevision
            ]
        );

        for (level, who) in chain().into_iter().take(3) {
            doc.advance(level, &who).unwrap();
        }
        assert_eq!(
            doc.available_actions(&approver(ApprovalLevel::Received)),
            vec![Action::Advance(ApprovalLevel::Received), Action::RequestRevision]
        );

        doc.advance(ApprovalLevel::Received, &approver(ApprovalLevel::Received))
            .unwrap();
        assert!(doc.available_actions(&approver(ApprovalLevel::Received)).is_empty());
    }
}
