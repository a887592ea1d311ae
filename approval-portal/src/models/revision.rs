//! Revision history model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::approval::{ApprovalLevel, Approver};

/// A reviewer sending a document back to its requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionEntry {
    #[serde(deserialize_with = "deserialize_stage")]
    stage: ApprovalLevel,
    remarks: String,
    revised_by: Approver,
    revision_date: DateTime<Utc>,
}

impl RevisionEntry {
    pub(crate) fn new(
        stage: ApprovalLevel,
        remarks: String,
        revised_by: Approver,
        revision_date: DateTime<Utc>,
    ) -> Self {
        Self {
            stage,
            remarks,
            revised_by,
            revision_date,
        }
    }

    pub fn stage(&self) -> ApprovalLevel {
        self.stage
    }

    pub fn remarks(&self) -> &str {
        &self.remarks
    }

    pub fn revised_by(&self) -> &Approver {
        &self.revised_by
    }

    pub fn revision_date(&self) -> DateTime<Utc> {
        self.revision_date
    }
}

/// Revision entries grouped by the stage that requested them, each group in
/// the order the entries were made.
pub fn group_by_stage(entries: &[RevisionEntry]) -> BTreeMap<ApprovalLevel, Vec<&RevisionEntry>> {
    let mut grouped: BTreeMap<ApprovalLevel, Vec<&RevisionEntry>> = BTreeMap::new();
    for entry in entries {
        grouped.entry(entry.stage).or_default().push(entry);
    }
    grouped
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StageRepr {
    Number(u64),
    Text(String),
}

fn deserialize_stage<'de, D>(deserializer: D) -> Result<ApprovalLevel, D::Error>
where
    D: Deserializer<'de>,
{
    let label = match StageRepr::deserialize(deserializer)? {
        StageRepr::Number(n) => n.to_string(),
        StageRepr::Text(s) => s,
    };
    ApprovalLevel::from_label(&label)
        .ok_or_else(|| serde::de::Error::custom(format!("unknown revision stage: {}", label)))
}
