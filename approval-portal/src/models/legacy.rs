//! Reading approval records written before the status was stored explicitly.
//!
//! Older payloads carry a flat list of `<level>By`, `<level>ByName` and
//! `<level>Date` fields and may omit `approvalStatus`. They are converted
//! into an [`ApprovalSummary`] once, at the edge; nothing else in the crate
//! infers status from sign-offs.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::approval::{
    ApprovalLevel, ApprovalStatus, ApprovalSummary, Approver, RejectionRecord, SignOff,
};
use super::document::Document;

/// Status implied by a summary that has no explicit status: a rejection
/// wins, then the furthest signed level, then Draft.
pub fn derive_status(summary: &ApprovalSummary) -> ApprovalStatus {
    if summary.rejection().is_some() {
        return ApprovalStatus::Rejected;
    }
    summary
        .furthest_signed()
        .map(|level| level.reached_status())
        .unwrap_or(ApprovalStatus::Draft)
}

/// The flat approval shape used by older documents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyApproval {
    pub approval_status: Option<String>,
    pub prepared_by: Option<String>,
    pub prepared_by_name: Option<String>,
    pub prepared_date: Option<String>,
    pub checked_by: Option<String>,
    pub checked_by_name: Option<String>,
    pub checked_date: Option<String>,
    pub acknowledged_by: Option<String>,
    pub acknowledged_by_name: Option<String>,
    pub acknowledged_date: Option<String>,
    pub approved_by: Option<String>,
    pub approved_by_name: Option<String>,
    pub approved_date: Option<String>,
    pub received_by: Option<String>,
    pub received_by_name: Option<String>,
    pub received_date: Option<String>,
    pub closed_by: Option<String>,
    pub closed_by_name: Option<String>,
    pub closed_date: Option<String>,
    pub rejected_by: Option<String>,
    pub rejected_by_name: Option<String>,
    pub rejected_date: Option<String>,
    pub rejection_remarks: Option<String>,
}

impl LegacyApproval {
    fn level_fields(&self, level: ApprovalLevel) -> (&Option<String>, &Option<String>, &Option<String>) {
        match level {
            ApprovalLevel::Prepared => (&self.prepared_by, &self.prepared_by_name, &self.prepared_date),
            ApprovalLevel::Checked => (&self.checked_by, &self.checked_by_name, &self.checked_date),
            ApprovalLevel::Acknowledged => (
                &self.acknowledged_by,
                &self.acknowledged_by_name,
                &self.acknowledged_date,
            ),
            ApprovalLevel::Approved => (&self.approved_by, &self.approved_by_name, &self.approved_date),
            ApprovalLevel::Received => (&self.received_by, &self.received_by_name, &self.received_date),
            ApprovalLevel::Closed => (&self.closed_by, &self.closed_by_name, &self.closed_date),
        }
    }

    /// Convert into the structured summary. An explicit, recognised status
    /// is kept; otherwise the status is left implicit so that
    /// [`derive_status`] applies.
    pub fn into_summary(self) -> ApprovalSummary {
        let mut summary = ApprovalSummary::default();

        for level in ApprovalLevel::ALL {
            let (by, by_name, date) = self.level_fields(level);
            let Some(id) = non_empty(by) else {
                if non_empty(date).is_some() {
                    warn!(level = level.as_str(), "Dropping legacy sign-off date without approver");
                }
                continue;
            };
            let approver = Approver::new(id, non_empty(by_name).unwrap_or_default());
            summary.assign(level, Some(approver.clone()));
            if let Some(signed_at) = non_empty(date).and_then(|d| parse_timestamp(&d)) {
                summary.sign(level, SignOff::new(&approver, signed_at));
            }
        }

        if let Some(rejected_at) = non_empty(&self.rejected_date).and_then(|d| parse_timestamp(&d)) {
            let rejected_by = Approver::new(
                non_empty(&self.rejected_by).unwrap_or_default(),
                non_empty(&self.rejected_by_name).unwrap_or_default(),
            );
            summary.set_rejection(RejectionRecord::new(
                non_empty(&self.rejection_remarks).unwrap_or_default(),
                rejected_by,
                rejected_at,
                None,
            ));
        }

        match self.approval_status.as_deref().map(ApprovalStatus::from_string) {
            Some(Some(status)) => summary.set_status(status),
            Some(None) => {
                warn!(
                    status = self.approval_status.as_deref().unwrap_or_default(),
                    "Unrecognised legacy approval status, deriving from sign-offs"
                );
            }
            None => {}
        }

        summary
    }
}

/// Decode a document payload, converting a flat legacy approval record
/// when the structured `approval` object is absent.
pub fn decode_document(value: Value) -> Result<Document, serde_json::Error> {
    let legacy = match value.as_object() {
        Some(obj) if !obj.contains_key("approval") && obj.keys().any(|k| is_legacy_key(k)) => {
            Some(LegacyApproval::deserialize(&value)?)
        }
        _ => None,
    };
    let mut document: Document = serde_json::from_value(value)?;
    if let Some(legacy) = legacy {
        debug!(
            document_number = %document.document_number,
            "Converting legacy approval record"
        );
        *document.approval_mut() = legacy.into_summary();
    }
    Ok(document)
}

fn is_legacy_key(key: &str) -> bool {
    if matches!(
        key,
        "approvalStatus" | "rejectedBy" | "rejectedDate" | "rejectionRemarks"
    ) {
        return true;
    }
    ApprovalLevel::ALL.iter().any(|level| {
        let prefix = level.as_str().to_lowercase();
        key.strip_prefix(prefix.as_str())
            .is_some_and(|rest| matches!(rest, "By" | "ByName" | "Date"))
    })
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// RFC 3339, a naive timestamp (taken as UTC), or a bare date.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
}
