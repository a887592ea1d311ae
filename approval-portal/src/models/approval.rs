//! Approval chain model: levels, statuses, sign-offs and rejection records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::FinancialSnapshot;
use super::legacy;

/// One step of the approval chain, in chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ApprovalLevel {
    #[serde(alias = "PR")]
    Prepared,
    #[serde(alias = "CH")]
    Checked,
    #[serde(alias = "AC")]
    Acknowledged,
    #[serde(alias = "AP")]
    Approved,
    #[serde(alias = "RE")]
    Received,
    #[serde(alias = "CL")]
    Closed,
}

impl ApprovalLevel {
    pub const ALL: [ApprovalLevel; 6] = [
        ApprovalLevel::Prepared,
        ApprovalLevel::Checked,
        ApprovalLevel::Acknowledged,
        ApprovalLevel::Approved,
        ApprovalLevel::Received,
        ApprovalLevel::Closed,
    ];

    /// Level code used by the superior-hierarchy API.
    pub fn code(&self) -> &'static str {
        match self {
            ApprovalLevel::Prepared => "PR",
            ApprovalLevel::Checked => "CH",
            ApprovalLevel::Acknowledged => "AC",
            ApprovalLevel::Approved => "AP",
            ApprovalLevel::Received => "RE",
            ApprovalLevel::Closed => "CL",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        ApprovalLevel::ALL
            .into_iter()
            .find(|level| level.code().eq_ignore_ascii_case(code))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalLevel::Prepared => "Prepared",
            ApprovalLevel::Checked => "Checked",
            ApprovalLevel::Acknowledged => "Acknowledged",
            ApprovalLevel::Approved => "Approved",
            ApprovalLevel::Received => "Received",
            ApprovalLevel::Closed => "Closed",
        }
    }

    /// Accepts a level name, a level code, or the numeric stage used by
    /// older revision payloads (1 = Checked .. 4 = Received).
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if let Some(level) = ApprovalLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(label))
        {
            return Some(level);
        }
        if let Some(level) = ApprovalLevel::from_code(label) {
            return Some(level);
        }
        match label {
            "1" => Some(ApprovalLevel::Checked),
            "2" => Some(ApprovalLevel::Acknowledged),
            "3" => Some(ApprovalLevel::Approved),
            "4" => Some(ApprovalLevel::Received),
            _ => None,
        }
    }

    pub fn previous(&self) -> Option<ApprovalLevel> {
        let index = self.index();
        index.checked_sub(1).map(|i| ApprovalLevel::ALL[i])
    }

    pub fn next(&self) -> Option<ApprovalLevel> {
        ApprovalLevel::ALL.get(self.index() + 1).copied()
    }

    /// Status a document reaches once this level signs off.
    pub fn reached_status(&self) -> ApprovalStatus {
        match self {
            ApprovalLevel::Prepared => ApprovalStatus::Prepared,
            ApprovalLevel::Checked => ApprovalStatus::Checked,
            ApprovalLevel::Acknowledged => ApprovalStatus::Acknowledged,
            ApprovalLevel::Approved => ApprovalStatus::Approved,
            ApprovalLevel::Received => ApprovalStatus::Received,
            ApprovalLevel::Closed => ApprovalStatus::Closed,
        }
    }

    fn index(&self) -> usize {
        match self {
            ApprovalLevel::Prepared => 0,
            ApprovalLevel::Checked => 1,
            ApprovalLevel::Acknowledged => 2,
            ApprovalLevel::Approved => 3,
            ApprovalLevel::Received => 4,
            ApprovalLevel::Closed => 5,
        }
    }
}

/// Document approval status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApprovalStatus {
    Draft,
    Prepared,
    Checked,
    Acknowledged,
    Approved,
    Received,
    Closed,
    Rejected,
    #[serde(alias = "Revised")]
    Revision,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Draft => "Draft",
            ApprovalStatus::Prepared => "Prepared",
            ApprovalStatus::Checked => "Checked",
            ApprovalStatus::Acknowledged => "Acknowledged",
            ApprovalStatus::Approved => "Approved",
            ApprovalStatus::Received => "Received",
            ApprovalStatus::Closed => "Closed",
            ApprovalStatus::Rejected => "Rejected",
            ApprovalStatus::Revision => "Revision",
        }
    }

    /// Lenient parse of a stored status label. Unknown labels are `None`
    /// so callers can fall back to legacy derivation.
    pub fn from_string(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Some(ApprovalStatus::Draft),
            "prepared" => Some(ApprovalStatus::Prepared),
            "checked" => Some(ApprovalStatus::Checked),
            "acknowledged" => Some(ApprovalStatus::Acknowledged),
            "approved" => Some(ApprovalStatus::Approved),
            "received" => Some(ApprovalStatus::Received),
            "closed" => Some(ApprovalStatus::Closed),
            "rejected" => Some(ApprovalStatus::Rejected),
            "revision" | "revised" => Some(ApprovalStatus::Revision),
            _ => None,
        }
    }

    /// The level whose sign-off produced this status.
    pub fn signed_level(&self) -> Option<ApprovalLevel> {
        match self {
            ApprovalStatus::Prepared => Some(ApprovalLevel::Prepared),
            ApprovalStatus::Checked => Some(ApprovalLevel::Checked),
            ApprovalStatus::Acknowledged => Some(ApprovalLevel::Acknowledged),
            ApprovalStatus::Approved => Some(ApprovalLevel::Approved),
            ApprovalStatus::Received => Some(ApprovalLevel::Received),
            ApprovalStatus::Closed => Some(ApprovalLevel::Closed),
            ApprovalStatus::Draft | ApprovalStatus::Rejected | ApprovalStatus::Revision => None,
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A person who can hold an approval slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approver {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl Approver {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Name when known, otherwise the raw identifier.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Who signed a level off and when. Both halves are always present together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignOff {
    approver_id: String,
    approver_name: String,
    signed_at: DateTime<Utc>,
}

impl SignOff {
    pub fn new(approver: &Approver, signed_at: DateTime<Utc>) -> Self {
        Self {
            approver_id: approver.id.clone(),
            approver_name: approver.name.clone(),
            signed_at,
        }
    }

    pub fn approver_id(&self) -> &str {
        &self.approver_id
    }

    pub fn approver_name(&self) -> &str {
        &self.approver_name
    }

    pub fn signed_at(&self) -> DateTime<Utc> {
        self.signed_at
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalSlot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    assignee: Option<Approver>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sign_off: Option<SignOff>,
}

impl ApprovalSlot {
    pub fn assignee(&self) -> Option<&Approver> {
        self.assignee.as_ref()
    }

    pub fn sign_off(&self) -> Option<&SignOff> {
        self.sign_off.as_ref()
    }

    pub fn is_signed(&self) -> bool {
        self.sign_off.is_some()
    }
}

/// Why and when a document was rejected, with the figures as they stood.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionRecord {
    remarks: String,
    rejected_by: Approver,
    rejected_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    snapshot: Option<FinancialSnapshot>,
}

impl RejectionRecord {
    pub(crate) fn new(
        remarks: String,
        rejected_by: Approver,
        rejected_at: DateTime<Utc>,
        snapshot: Option<FinancialSnapshot>,
    ) -> Self {
        Self {
            remarks,
            rejected_by,
            rejected_at,
            snapshot,
        }
    }

    pub fn remarks(&self) -> &str {
        &self.remarks
    }

    pub fn rejected_by(&self) -> &Approver {
        &self.rejected_by
    }

    pub fn rejected_at(&self) -> DateTime<Utc> {
        self.rejected_at
    }

    /// Financial summary captured at rejection time. Absent only for
    /// rejections imported from legacy payloads.
    pub fn snapshot(&self) -> Option<&FinancialSnapshot> {
        self.snapshot.as_ref()
    }
}

/// Approval state of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    approval_status: Option<ApprovalStatus>,
    #[serde(default)]
    prepared: ApprovalSlot,
    #[serde(default)]
    checked: ApprovalSlot,
    #[serde(default)]
    acknowledged: ApprovalSlot,
    #[serde(default)]
    approved: ApprovalSlot,
    #[serde(default)]
    received: ApprovalSlot,
    #[serde(default)]
    closed: ApprovalSlot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rejection: Option<RejectionRecord>,
}

impl ApprovalSummary {
    /// A fresh summary for a new draft.
    pub fn draft() -> Self {
        Self {
            approval_status: Some(ApprovalStatus::Draft),
            ..Default::default()
        }
    }

    /// Explicit status when stored, legacy derivation otherwise.
    pub fn status(&self) -> ApprovalStatus {
        self.approval_status
            .unwrap_or_else(|| legacy::derive_status(self))
    }

    pub fn explicit_status(&self) -> Option<ApprovalStatus> {
        self.approval_status
    }

    pub fn slot(&self, level: ApprovalLevel) -> &ApprovalSlot {
        match level {
            ApprovalLevel::Prepared => &self.prepared,
            ApprovalLevel::Checked => &self.checked,
            ApprovalLevel::Acknowledged => &self.acknowledged,
            ApprovalLevel::Approved => &self.approved,
            ApprovalLevel::Received => &self.received,
            ApprovalLevel::Closed => &self.closed,
        }
    }

    pub fn assignee(&self, level: ApprovalLevel) -> Option<&Approver> {
        self.slot(level).assignee()
    }

    pub fn sign_off(&self, level: ApprovalLevel) -> Option<&SignOff> {
        self.slot(level).sign_off()
    }

    pub fn rejection(&self) -> Option<&RejectionRecord> {
        self.rejection.as_ref()
    }

    /// Furthest level carrying a sign-off.
    pub fn furthest_signed(&self) -> Option<ApprovalLevel> {
        ApprovalLevel::ALL
            .into_iter()
            .rev()
            .find(|level| self.slot(*level).is_signed())
    }

    fn slot_mut(&mut self, level: ApprovalLevel) -> &mut ApprovalSlot {
        match level {
            ApprovalLevel::Prepared => &mut self.prepared,
            ApprovalLevel::Checked => &mut self.checked,
            ApprovalLevel::Acknowledged => &mut self.acknowledged,
            ApprovalLevel::Approved => &mut self.approved,
            ApprovalLevel::Received => &mut self.received,
            ApprovalLevel::Closed => &mut self.closed,
        }
    }

    pub(crate) fn set_status(&mut self, status: ApprovalStatus) {
        self.approval_status = Some(status);
    }

    pub(crate) fn assign(&mut self, level: ApprovalLevel, approver: Option<Approver>) {
        self.slot_mut(level).assignee = approver;
    }

    pub(crate) fn sign(&mut self, level: ApprovalLevel, sign_off: SignOff) {
        self.slot_mut(level).sign_off = Some(sign_off);
    }

    /// Clear the sign-offs of every level after `level`, keeping assignees.
    pub(crate) fn clear_sign_offs_after(&mut self, level: ApprovalLevel) {
        let mut next = level.next();
        while let Some(current) = next {
            self.slot_mut(current).sign_off = None;
            next = current.next();
        }
    }

    pub(crate) fn set_rejection(&mut self, rejection: RejectionRecord) {
        self.rejection = Some(rejection);
    }
}
