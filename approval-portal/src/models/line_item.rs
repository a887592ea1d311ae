//! Line item model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One expense or revenue line on a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub account_name: String,
    /// Derived from the selected account name, never typed in.
    #[serde(default)]
    pub gl_account_code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub currency_code: String,
    #[serde(default)]
    pub amount: Decimal,
}

impl LineItem {
    pub fn new(
        category: impl Into<String>,
        account_name: impl Into<String>,
        gl_account_code: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            account_name: account_name.into(),
            gl_account_code: gl_account_code.into(),
            ..Default::default()
        }
    }

    /// Classified, coded and carrying a positive amount.
    pub fn is_valid(&self) -> bool {
        !self.category.trim().is_empty()
            && !self.account_name.trim().is_empty()
            && !self.gl_account_code.trim().is_empty()
            && self.amount > Decimal::ZERO
    }

    /// Nothing entered at all; such rows are ignored on submit.
    pub fn is_blank(&self) -> bool {
        self.category.trim().is_empty()
            && self.account_name.trim().is_empty()
            && self.gl_account_code.trim().is_empty()
            && self.description.trim().is_empty()
            && self.amount.is_zero()
    }
}
