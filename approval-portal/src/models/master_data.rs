//! Master-data records and the option sets built from them.

use serde::{Deserialize, Serialize};

/// Account name row from the master-data service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountNameRecord {
    pub account_name: String,
    /// GL account code for this pairing.
    #[serde(default)]
    pub coa: String,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Where an option came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionOrigin {
    /// Returned by the current master-data lookup.
    Live,
    /// Persisted on the document but no longer offered; shown with a marker.
    Historical,
    /// Persisted pairing kept unmarked because the lookup came back empty.
    Preserved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub gl_account_code: Option<String>,
    pub remarks: Option<String>,
    pub origin: OptionOrigin,
}

impl SelectOption {
    pub fn live(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            gl_account_code: None,
            remarks: None,
            origin: OptionOrigin::Live,
        }
    }

    pub fn historical(value: impl Into<String>) -> Self {
        Self {
            origin: OptionOrigin::Historical,
            ..Self::live(value)
        }
    }

    pub fn with_gl_code(mut self, code: impl Into<String>) -> Self {
        let code = code.into();
        self.gl_account_code = if code.trim().is_empty() { None } else { Some(code) };
        self
    }

    pub fn is_historical(&self) -> bool {
        self.origin == OptionOrigin::Historical
    }

    /// Display label; historical values carry a visible marker.
    pub fn label(&self) -> String {
        match self.origin {
            OptionOrigin::Historical => format!("{} (Historical)", self.value),
            OptionOrigin::Live | OptionOrigin::Preserved => self.value.clone(),
        }
    }
}

/// Options for one dropdown plus the current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSet {
    options: Vec<SelectOption>,
    selected: Option<String>,
}

impl OptionSet {
    pub fn new(options: Vec<SelectOption>, selected: Option<String>) -> Self {
        Self { options, selected }
    }

    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn values(&self) -> Vec<&str> {
        self.options.iter().map(|o| o.value.as_str()).collect()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_option(&self) -> Option<&SelectOption> {
        let selected = self.selected.as_deref()?;
        self.find(selected)
    }

    pub fn find(&self, value: &str) -> Option<&SelectOption> {
        self.options.iter().find(|o| o.value == value)
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn historical_count(&self) -> usize {
        self.options.iter().filter(|o| o.is_historical()).count()
    }

    /// Options whose value contains `query` (case-insensitive), live and
    /// preserved options first, historical ones after.
    pub fn filter(&self, query: &str) -> Vec<&SelectOption> {
        let needle = query.trim().to_lowercase();
        let matches = |option: &&SelectOption| {
            needle.is_empty() || option.value.to_lowercase().contains(&needle)
        };
        let current = self.options.iter().filter(|o| !o.is_historical()).filter(matches);
        let historical = self.options.iter().filter(|o| o.is_historical()).filter(matches);
        current.chain(historical).collect()
    }
}

/// A dependent field is either waiting on its prerequisites or populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldState<T> {
    Disabled { reason: String },
    Ready(T),
}

impl<T> FieldState<T> {
    pub fn disabled(reason: impl Into<String>) -> Self {
        FieldState::Disabled {
            reason: reason.into(),
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, FieldState::Disabled { .. })
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            FieldState::Ready(value) => Some(value),
            FieldState::Disabled { .. } => None,
        }
    }
}
