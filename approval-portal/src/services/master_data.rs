//! Cascading category -> account name -> GL code resolution.
//!
//! Option sets are rebuilt from live master data on every relevant field
//! change and reconciled against what the document already carries, so a
//! value that has since been retired stays visible (and selectable) as a
//! historical option instead of silently disappearing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use portal_core::config::HistoricalPolicy;
use portal_core::error::{PortalError, RemoteFailure};
use portal_core::http::{DispatchRequest, Dispatcher};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::models::{
    AccountNameRecord, Document, DocumentType, FieldState, LineItem, OptionOrigin, OptionSet,
    SelectOption,
};
use crate::services::cache::MasterDataCache;
use crate::services::metrics::{HISTORICAL_VALUES_TOTAL, MASTER_DATA_LOOKUPS_TOTAL};
use crate::services::sequencer::Sequencer;

/// The department and transaction type every lookup is scoped by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MasterDataScope {
    pub document_type: DocumentType,
    pub department_id: String,
    pub transaction_type: String,
}

impl MasterDataScope {
    pub fn new(
        document_type: DocumentType,
        department_id: impl Into<String>,
        transaction_type: impl Into<String>,
    ) -> Self {
        Self {
            document_type,
            department_id: department_id.into(),
            transaction_type: transaction_type.into(),
        }
    }

    pub fn for_document(document: &Document) -> Self {
        Self::new(
            document.document_type,
            document.department_id.trim(),
            document.transaction_type.trim(),
        )
    }

    pub fn is_complete(&self) -> bool {
        !self.department_id.trim().is_empty() && !self.transaction_type.trim().is_empty()
    }
}

/// Source of master-data lists.
#[async_trait]
pub trait MasterDataSource: Send + Sync {
    async fn categories(&self, scope: &MasterDataScope) -> Result<Vec<String>, PortalError>;

    async fn account_names(
        &self,
        scope: &MasterDataScope,
        category: &str,
    ) -> Result<Vec<AccountNameRecord>, PortalError>;

    /// GL code for a single (category, account name) pairing.
    async fn gl_code(
        &self,
        scope: &MasterDataScope,
        category: &str,
        account_name: &str,
    ) -> Result<Option<String>, PortalError>;
}

/// Master-data service over HTTP.
pub struct HttpMasterDataSource {
    dispatcher: Dispatcher,
}

#[derive(Debug, Deserialize)]
struct CoaRecord {
    #[serde(default)]
    coa: Option<String>,
}

impl HttpMasterDataSource {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    fn scoped(request: DispatchRequest, scope: &MasterDataScope) -> DispatchRequest {
        request
            .query("departmentId", scope.department_id.as_str())
            .query("menu", scope.document_type.menu_label())
            .query("transactionType", scope.transaction_type.as_str())
    }
}

#[async_trait]
impl MasterDataSource for HttpMasterDataSource {
    async fn categories(&self, scope: &MasterDataScope) -> Result<Vec<String>, PortalError> {
        let request = Self::scoped(DispatchRequest::get("/api/expenses/categories"), scope);
        let categories: Option<Vec<String>> = self.dispatcher.fetch(request).await?;
        Ok(categories.unwrap_or_default())
    }

    async fn account_names(
        &self,
        scope: &MasterDataScope,
        category: &str,
    ) -> Result<Vec<AccountNameRecord>, PortalError> {
        let request = Self::scoped(
            DispatchRequest::get("/api/expenses/account-names").query("category", category),
            scope,
        );
        let records: Option<Vec<AccountNameRecord>> = self.dispatcher.fetch(request).await?;
        Ok(records.unwrap_or_default())
    }

    async fn gl_code(
        &self,
        scope: &MasterDataScope,
        category: &str,
        account_name: &str,
    ) -> Result<Option<String>, PortalError> {
        let request = Self::scoped(
            DispatchRequest::get("/api/expenses/coa")
                .query("category", category)
                .query("accountName", account_name),
            scope,
        );
        let record: Option<CoaRecord> = self.dispatcher.fetch(request).await?;
        Ok(record
            .and_then(|r| r.coa)
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty()))
    }
}

/// In-memory master data for tests and offline tooling.
#[derive(Default)]
pub struct MockMasterDataSource {
    categories: HashMap<(String, String), Vec<String>>,
    account_names: HashMap<(String, String, String), Vec<AccountNameRecord>>,
    failing: AtomicBool,
    call_count: AtomicU64,
}

impl MockMasterDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories(mut self, department_id: &str, transaction_type: &str, categories: &[&str]) -> Self {
        self.categories.insert(
            (department_id.to_string(), transaction_type.to_string()),
            categories.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    pub fn with_account_names(
        mut self,
        department_id: &str,
        transaction_type: &str,
        category: &str,
        records: &[(&str, &str)],
    ) -> Self {
        self.account_names.insert(
            (
                department_id.to_string(),
                transaction_type.to_string(),
                category.to_string(),
            ),
            records
                .iter()
                .map(|(name, coa)| AccountNameRecord {
                    account_name: name.to_string(),
                    coa: coa.to_string(),
                    remarks: None,
                })
                .collect(),
        );
        self
    }

    /// Make every call fail as if the service were down.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), PortalError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(PortalError::RemoteUnavailable(RemoteFailure {
                url: "mock://master-data".to_string(),
                status: Some(503),
                message: "Mock master data is unavailable".to_string(),
            }));
        }
        Ok(())
    }
}

#[async_trait]
impl MasterDataSource for MockMasterDataSource {
    async fn categories(&self, scope: &MasterDataScope) -> Result<Vec<String>, PortalError> {
        self.check()?;
        Ok(self
            .categories
            .get(&(scope.department_id.clone(), scope.transaction_type.clone()))
            .cloned()
            .unwrap_or_default())
    }

    async fn account_names(
        &self,
        scope: &MasterDataScope,
        category: &str,
    ) -> Result<Vec<AccountNameRecord>, PortalError> {
        self.check()?;
        Ok(self
            .account_names
            .get(&(
                scope.department_id.clone(),
                scope.transaction_type.clone(),
                category.to_string(),
            ))
            .cloned()
            .unwrap_or_default())
    }

    async fn gl_code(
        &self,
        scope: &MasterDataScope,
        category: &str,
        account_name: &str,
    ) -> Result<Option<String>, PortalError> {
        let records = self.account_names(scope, category).await?;
        Ok(records
            .into_iter()
            .find(|r| r.account_name == account_name)
            .map(|r| r.coa)
            .filter(|code| !code.is_empty()))
    }
}

/// Outcome of an async resolution: either it is still the latest request
/// for its field, or a newer one was issued while it was in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    Applied(T),
    Superseded,
}

impl<T> Resolution<T> {
    pub fn is_superseded(&self) -> bool {
        matches!(self, Resolution::Superseded)
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Resolution::Applied(value) => Some(value),
            Resolution::Superseded => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Categories,
    AccountNames,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldKey {
    pub line: usize,
    pub field: FieldKind,
}

/// The account name a line currently carries, with its GL code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentAccount {
    pub account_name: String,
    pub gl_account_code: String,
}

/// Live categories plus the line's current category when it is no longer
/// offered (compared case-insensitively).
pub fn reconcile_categories(live: &[String], current: Option<&str>) -> OptionSet {
    let mut options: Vec<SelectOption> = live.iter().map(SelectOption::live).collect();
    let current = current.map(str::trim).filter(|c| !c.is_empty());

    let selected = match current {
        None => None,
        Some(current) => match live.iter().find(|c| c.trim().eq_ignore_ascii_case(current)) {
            Some(matching) => Some(matching.clone()),
            None => {
                options.push(SelectOption::historical(current));
                Some(current.to_string())
            }
        },
    };

    OptionSet::new(options, selected)
}

/// Live account names plus the line's current account name when it is no
/// longer offered.
///
/// An empty live list is not trusted to mean "retired" under
/// [`HistoricalPolicy::TrustPersistedOnEmpty`]: a current pairing that still
/// carries a GL code is then kept as an ordinary option.
pub fn reconcile_account_names(
    live: &[AccountNameRecord],
    current: Option<&CurrentAccount>,
    policy: HistoricalPolicy,
) -> OptionSet {
    let mut options: Vec<SelectOption> = live
        .iter()
        .map(|record| SelectOption {
            remarks: record.remarks.clone(),
            ..SelectOption::live(record.account_name.as_str()).with_gl_code(record.coa.as_str())
        })
        .collect();

    let current = current.filter(|c| !c.account_name.trim().is_empty());
    let selected = match current {
        None => None,
        Some(current) if options.iter().any(|o| o.value == current.account_name) => {
            Some(current.account_name.clone())
        }
        Some(current) => {
            let has_code = !current.gl_account_code.trim().is_empty();
            let origin = if live.is_empty() && has_code && policy == HistoricalPolicy::TrustPersistedOnEmpty {
                OptionOrigin::Preserved
            } else {
                OptionOrigin::Historical
            };
            options.push(SelectOption {
                origin,
                ..SelectOption::live(current.account_name.as_str())
                    .with_gl_code(current.gl_account_code.as_str())
            });
            Some(current.account_name.clone())
        }
    };

    OptionSet::new(options, selected)
}

/// A user edit on one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    Category(String),
    AccountName(String),
}

/// Working state for one line item while it is being edited.
#[derive(Debug, Clone)]
pub struct LineEditor {
    index: usize,
    item: LineItem,
    account_historical: bool,
    categories: FieldState<OptionSet>,
    account_names: FieldState<OptionSet>,
}

impl LineEditor {
    pub fn new(index: usize, item: LineItem) -> Self {
        Self {
            index,
            item,
            account_historical: false,
            categories: FieldState::disabled("Not loaded yet"),
            account_names: FieldState::disabled("Not loaded yet"),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn reindex(&mut self, index: usize) {
        self.index = index;
    }

    pub fn item(&self) -> &LineItem {
        &self.item
    }

    pub fn item_mut(&mut self) -> &mut LineItem {
        &mut self.item
    }

    pub fn into_item(self) -> LineItem {
        self.item
    }

    pub fn categories(&self) -> &FieldState<OptionSet> {
        &self.categories
    }

    pub fn account_names(&self) -> &FieldState<OptionSet> {
        &self.account_names
    }

    /// The selected account name is no longer offered by master data.
    pub fn is_account_historical(&self) -> bool {
        self.account_historical
    }

    pub fn category(&self) -> Option<&str> {
        Some(self.item.category.trim()).filter(|c| !c.is_empty())
    }

    pub fn current_account(&self) -> Option<CurrentAccount> {
        if self.item.account_name.trim().is_empty() {
            return None;
        }
        Some(CurrentAccount {
            account_name: self.item.account_name.clone(),
            gl_account_code: self.item.gl_account_code.clone(),
        })
    }

    /// Apply a user edit to the line. A new category invalidates the GL
    /// code; an account name must be one of the offered options and brings
    /// its GL code with it.
    pub fn apply_change(&mut self, change: &FieldChange) -> Result<(), PortalError> {
        match change {
            FieldChange::Category(category) => {
                self.item.category = category.trim().to_string();
                self.item.gl_account_code.clear();
            }
            FieldChange::AccountName(value) => {
                let options = self.account_names.ready().ok_or_else(|| {
                    PortalError::validation("Account name is not selectable until a category is chosen")
                })?;
                let option = options.find(value).ok_or_else(|| {
                    PortalError::validation(format!("'{}' is not an available account name", value))
                })?;
                self.item.account_name = option.value.clone();
                self.item.gl_account_code = option.gl_account_code.clone().unwrap_or_default();
                self.account_historical = option.is_historical();
                let selected = option.value.clone();
                let options = options.options().to_vec();
                self.account_names = FieldState::Ready(OptionSet::new(options, Some(selected)));
            }
        }
        Ok(())
    }

    /// Install a resolved category set. Returns false when it was stale.
    pub fn apply_categories(&mut self, resolution: Resolution<FieldState<OptionSet>>) -> bool {
        match resolution {
            Resolution::Applied(state) => {
                self.categories = state;
                true
            }
            Resolution::Superseded => false,
        }
    }

    /// Install a resolved account-name set. Returns false when it was stale.
    ///
    /// The historical flag is only ever raised here; it is cleared by the
    /// next explicit selection.
    pub fn apply_account_names(&mut self, resolution: Resolution<FieldState<OptionSet>>) -> bool {
        let state = match resolution {
            Resolution::Applied(state) => state,
            Resolution::Superseded => return false,
        };
        if let Some(selected) = state.ready().and_then(|set| set.selected_option()) {
            if selected.is_historical() {
                self.account_historical = true;
            }
            if self.item.gl_account_code.is_empty() && !selected.is_historical() {
                if let Some(code) = &selected.gl_account_code {
                    self.item.gl_account_code = code.clone();
                }
            }
        }
        self.account_names = state;
        true
    }
}

/// Builds option sets for line items against live master data.
pub struct MasterDataResolver {
    source: Arc<dyn MasterDataSource>,
    cache: Arc<MasterDataCache>,
    policy: HistoricalPolicy,
    sequencer: Sequencer<FieldKey>,
}

impl MasterDataResolver {
    pub fn new(
        source: Arc<dyn MasterDataSource>,
        cache: Arc<MasterDataCache>,
        policy: HistoricalPolicy,
    ) -> Self {
        Self {
            source,
            cache,
            policy,
            sequencer: Sequencer::new(),
        }
    }

    pub fn policy(&self) -> HistoricalPolicy {
        self.policy
    }

    /// Category options for `line`, disabled until the scope is complete.
    pub async fn resolve_categories(
        &self,
        line: usize,
        scope: &MasterDataScope,
        current: Option<&str>,
    ) -> Resolution<FieldState<OptionSet>> {
        let ticket = self.sequencer.issue(FieldKey {
            line,
            field: FieldKind::Categories,
        });
        if !scope.is_complete() {
            return Resolution::Applied(FieldState::disabled(
                "Select a department and transaction type first",
            ));
        }

        let live = self.load_categories(scope).await;
        if !self.sequencer.is_current(&ticket) {
            MASTER_DATA_LOOKUPS_TOTAL
                .with_label_values(&["category", "superseded"])
                .inc();
            debug!(line, seq = ticket.seq(), "Discarding stale category options");
            return Resolution::Superseded;
        }

        let set = reconcile_categories(&live, current);
        if set.historical_count() > 0 {
            HISTORICAL_VALUES_TOTAL.with_label_values(&["category"]).inc();
            info!(line, category = ?current, "Persisted category is no longer offered");
        }
        Resolution::Applied(FieldState::Ready(set))
    }

    /// Account-name options for `line` under `category`.
    pub async fn resolve_account_names(
        &self,
        line: usize,
        scope: &MasterDataScope,
        category: Option<&str>,
        current: Option<&CurrentAccount>,
    ) -> Resolution<FieldState<OptionSet>> {
        let ticket = self.sequencer.issue(FieldKey {
            line,
            field: FieldKind::AccountNames,
        });
        if !scope.is_complete() {
            return Resolution::Applied(FieldState::disabled(
                "Select a department and transaction type first",
            ));
        }
        let Some(category) = category.map(str::trim).filter(|c| !c.is_empty()) else {
            return Resolution::Applied(FieldState::disabled("Select a category first"));
        };

        let live = self.load_account_names(scope, category).await;
        if !self.sequencer.is_current(&ticket) {
            MASTER_DATA_LOOKUPS_TOTAL
                .with_label_values(&["account_name", "superseded"])
                .inc();
            debug!(line, seq = ticket.seq(), "Discarding stale account-name options");
            return Resolution::Superseded;
        }

        let set = reconcile_account_names(&live, current, self.policy);
        if set.historical_count() > 0 {
            HISTORICAL_VALUES_TOTAL
                .with_label_values(&["account_name"])
                .inc();
            info!(
                line,
                category,
                account_name = ?current.map(|c| c.account_name.as_str()),
                "Persisted account name is no longer offered"
            );
        }
        Resolution::Applied(FieldState::Ready(set))
    }

    /// Look up the GL code for a pairing directly.
    pub async fn resolve_gl_code(
        &self,
        scope: &MasterDataScope,
        category: &str,
        account_name: &str,
    ) -> Result<Option<String>, PortalError> {
        if let Some(records) = self.cache.account_names(scope, category) {
            if let Some(record) = records
                .iter()
                .find(|r| r.account_name == account_name && !r.coa.trim().is_empty())
            {
                return Ok(Some(record.coa.clone()));
            }
        }
        self.source.gl_code(scope, category, account_name).await
    }

    /// Populate both option sets of a freshly loaded line.
    pub async fn load_line(&self, editor: &mut LineEditor, scope: &MasterDataScope) -> Resolution<()> {
        let categories = self
            .resolve_categories(editor.index(), scope, editor.category())
            .await;
        if !editor.apply_categories(categories) {
            return Resolution::Superseded;
        }
        let account_names = self
            .resolve_account_names(
                editor.index(),
                scope,
                editor.category(),
                editor.current_account().as_ref(),
            )
            .await;
        if !editor.apply_account_names(account_names) {
            return Resolution::Superseded;
        }
        Resolution::Applied(())
    }

    /// Apply `change` to the line and cascade to the dependent fields.
    pub async fn handle_change(
        &self,
        editor: &mut LineEditor,
        scope: &MasterDataScope,
        change: FieldChange,
    ) -> Result<Resolution<()>, PortalError> {
        editor.apply_change(&change)?;
        match change {
            FieldChange::Category(_) => {
                let account_names = self
                    .resolve_account_names(
                        editor.index(),
                        scope,
                        editor.category(),
                        editor.current_account().as_ref(),
                    )
                    .await;
                if editor.apply_account_names(account_names) {
                    Ok(Resolution::Applied(()))
                } else {
                    Ok(Resolution::Superseded)
                }
            }
            FieldChange::AccountName(_) => {
                if editor.item().gl_account_code.is_empty() && !editor.is_account_historical() {
                    if let Some(category) = editor.category().map(str::to_string) {
                        let account_name = editor.item().account_name.clone();
                        if let Some(code) = self.resolve_gl_code(scope, &category, &account_name).await? {
                            editor.item_mut().gl_account_code = code;
                        }
                    }
                }
                Ok(Resolution::Applied(()))
            }
        }
    }

    async fn load_categories(&self, scope: &MasterDataScope) -> Vec<String> {
        if let Some(categories) = self.cache.categories(scope) {
            MASTER_DATA_LOOKUPS_TOTAL
                .with_label_values(&["category", "cache_hit"])
                .inc();
            return categories;
        }
        match self.source.categories(scope).await {
            Ok(categories) => {
                MASTER_DATA_LOOKUPS_TOTAL
                    .with_label_values(&["category", "fetched"])
                    .inc();
                if !categories.is_empty() {
                    self.cache.store_categories(scope, categories.clone());
                }
                categories
            }
            Err(e) => {
                MASTER_DATA_LOOKUPS_TOTAL
                    .with_label_values(&["category", "failed"])
                    .inc();
                warn!(
                    error = %e,
                    department_id = %scope.department_id,
                    transaction_type = %scope.transaction_type,
                    "Failed to load categories, continuing with an empty list"
                );
                Vec::new()
            }
        }
    }

    async fn load_account_names(&self, scope: &MasterDataScope, category: &str) -> Vec<AccountNameRecord> {
        if let Some(records) = self.cache.account_names(scope, category) {
            MASTER_DATA_LOOKUPS_TOTAL
                .with_label_values(&["account_name", "cache_hit"])
                .inc();
            return records;
        }
        match self.source.account_names(scope, category).await {
            Ok(records) => {
                MASTER_DATA_LOOKUPS_TOTAL
                    .with_label_values(&["account_name", "fetched"])
                    .inc();
                if !records.is_empty() {
                    self.cache
                        .store_account_names(scope, category, records.clone());
                }
                records
            }
            Err(e) => {
                MASTER_DATA_LOOKUPS_TOTAL
                    .with_label_values(&["account_name", "failed"])
                    .inc();
                warn!(
                    error = %e,
                    category,
                    department_id = %scope.department_id,
                    "Failed to load account names, continuing with an empty list"
                );
                Vec::new()
            }
        }
    }
}
