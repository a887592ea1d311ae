//! Superior-hierarchy reference data.

use serde::{Deserialize, Serialize};

/// One row of the approval hierarchy: who may act at `superior_level` for
/// `requesting_user_id`'s documents of a given transaction type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperiorMapping {
    #[serde(default, alias = "userId")]
    pub requesting_user_id: String,
    #[serde(default)]
    pub document_type: String,
    #[serde(rename = "typeTransaction", alias = "transactionType", default)]
    pub transaction_type: String,
    pub superior_level: String,
    pub superior_user_id: String,
    #[serde(default)]
    pub superior_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub full_name: String,
}
