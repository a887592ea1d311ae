//! Eligible approvers per approval level.
//!
//! The hierarchy is fetched once per (user, document type) and filtered
//! locally by transaction code and level. Display names are enriched from
//! the session's user cache, then the user directory; enrichment never
//! blocks the candidate lists from being produced.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use portal_core::error::{PortalError, RemoteFailure};
use portal_core::http::{DispatchRequest, Dispatcher};
use tracing::{debug, info, warn};

use crate::models::{
    transaction_code, ApprovalLevel, Approver, DocumentType, SuperiorMapping, TransactionCode,
    UserProfile,
};
use crate::services::cache::MasterDataCache;
use crate::services::metrics::TRANSACTION_CODE_FALLBACKS_TOTAL;

/// Approval hierarchy and user lookups.
#[async_trait]
pub trait SuperiorDirectory: Send + Sync {
    async fn superiors(
        &self,
        user_id: &str,
        document_type: DocumentType,
    ) -> Result<Vec<SuperiorMapping>, PortalError>;

    /// `Ok(None)` when the user does not exist.
    async fn user(&self, user_id: &str) -> Result<Option<UserProfile>, PortalError>;
}

pub struct HttpSuperiorDirectory {
    dispatcher: Dispatcher,
}

impl HttpSuperiorDirectory {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl SuperiorDirectory for HttpSuperiorDirectory {
    async fn superiors(
        &self,
        user_id: &str,
        document_type: DocumentType,
    ) -> Result<Vec<SuperiorMapping>, PortalError> {
        let path = format!(
            "/api/employee-superior-document-approvals/user/{}/document-type/{}",
            urlencoding::encode(user_id),
            document_type.code()
        );
        let rows: Option<Vec<SuperiorMapping>> = self.dispatcher.fetch(DispatchRequest::get(path)).await?;
        Ok(rows.unwrap_or_default())
    }

    async fn user(&self, user_id: &str) -> Result<Option<UserProfile>, PortalError> {
        let path = format!("/api/users/{}", urlencoding::encode(user_id));
        match self.dispatcher.fetch::<Option<UserProfile>>(DispatchRequest::get(path)).await {
            Ok(profile) => Ok(profile.map(|mut p| {
                if p.id.is_empty() {
                    p.id = user_id.to_string();
                }
                p
            })),
            Err(e) if e.remote_status() == Some(404) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// In-memory hierarchy for tests.
#[derive(Default)]
pub struct MockSuperiorDirectory {
    rows: HashMap<(String, DocumentType), Vec<SuperiorMapping>>,
    users: HashMap<String, UserProfile>,
    failing: AtomicBool,
    superior_calls: AtomicU64,
    user_calls: AtomicU64,
}

impl MockSuperiorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_superior(
        mut self,
        user_id: &str,
        document_type: DocumentType,
        transaction_code: &str,
        level: ApprovalLevel,
        superior_id: &str,
        superior_name: &str,
    ) -> Self {
        self.rows
            .entry((user_id.to_string(), document_type))
            .or_default()
            .push(SuperiorMapping {
                requesting_user_id: user_id.to_string(),
                document_type: document_type.code().to_string(),
                transaction_type: transaction_code.to_string(),
                superior_level: level.code().to_string(),
                superior_user_id: superior_id.to_string(),
                superior_name: superior_name.to_string(),
            });
        self
    }

    pub fn with_user(mut self, id: &str, full_name: &str) -> Self {
        self.users.insert(
            id.to_string(),
            UserProfile {
                id: id.to_string(),
                full_name: full_name.to_string(),
            },
        );
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn superior_calls(&self) -> u64 {
        self.superior_calls.load(Ordering::SeqCst)
    }

    pub fn user_calls(&self) -> u64 {
        self.user_calls.load(Ordering::SeqCst)
    }

    fn unavailable() -> PortalError {
        PortalError::RemoteUnavailable(RemoteFailure {
            url: "mock://superiors".to_string(),
            status: Some(503),
            message: "Mock superior directory is unavailable".to_string(),
        })
    }
}

#[async_trait]
impl SuperiorDirectory for MockSuperiorDirectory {
    async fn superiors(
        &self,
        user_id: &str,
        document_type: DocumentType,
    ) -> Result<Vec<SuperiorMapping>, PortalError> {
        self.superior_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        Ok(self
            .rows
            .get(&(user_id.to_string(), document_type))
            .cloned()
            .unwrap_or_default())
    }

    async fn user(&self, user_id: &str) -> Result<Option<UserProfile>, PortalError> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        Ok(self.users.get(user_id).cloned())
    }
}

/// Candidate approvers for each level of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproverCandidates {
    transaction_code: TransactionCode,
    levels: BTreeMap<ApprovalLevel, Vec<Approver>>,
}

impl ApproverCandidates {
    pub fn for_level(&self, level: ApprovalLevel) -> &[Approver] {
        self.levels.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, level: ApprovalLevel, user_id: &str) -> bool {
        self.for_level(level).iter().any(|a| a.id == user_id)
    }

    pub fn transaction_code(&self) -> &str {
        self.transaction_code.as_str()
    }

    pub fn used_fallback_code(&self) -> bool {
        self.transaction_code.is_fallback()
    }
}

pub struct SuperiorApproverResolver {
    directory: Arc<dyn SuperiorDirectory>,
    cache: Arc<MasterDataCache>,
    fallback_code: String,
}

impl SuperiorApproverResolver {
    pub fn new(
        directory: Arc<dyn SuperiorDirectory>,
        cache: Arc<MasterDataCache>,
        fallback_code: impl Into<String>,
    ) -> Self {
        Self {
            directory,
            cache,
            fallback_code: fallback_code.into(),
        }
    }

    /// Build the per-level candidate lists for `current_user`'s document.
    ///
    /// A hierarchy fetch failure is returned as is and leaves the cache
    /// untouched so a later call retries.
    pub async fn resolve(
        &self,
        current_user: &Approver,
        document_type: DocumentType,
        transaction_type: &str,
    ) -> Result<ApproverCandidates, PortalError> {
        let rows = self.hierarchy(&current_user.id, document_type).await?;

        let code = transaction_code(transaction_type, &self.fallback_code);
        if code.is_fallback() {
            TRANSACTION_CODE_FALLBACKS_TOTAL.inc();
            warn!(
                transaction_type,
                fallback = %code.as_str(),
                "Unmapped transaction type, using fallback code"
            );
        }

        let mut levels: BTreeMap<ApprovalLevel, Vec<Approver>> = BTreeMap::new();
        for level in ApprovalLevel::ALL {
            let mut seen = HashSet::new();
            let candidates: Vec<Approver> = rows
                .iter()
                .filter(|row| row.transaction_type.trim().eq_ignore_ascii_case(code.as_str()))
                .filter(|row| row.superior_level.trim().eq_ignore_ascii_case(level.code()))
                .filter(|row| !row.superior_user_id.trim().is_empty())
                .filter(|row| seen.insert(row.superior_user_id.trim().to_string()))
                .map(|row| Approver::new(row.superior_user_id.trim(), row.superior_name.trim()))
                .collect();
            levels.insert(level, candidates);
        }

        let preparers = levels.entry(ApprovalLevel::Prepared).or_default();
        if !preparers.iter().any(|a| a.id == current_user.id) {
            preparers.push(current_user.clone());
        }

        let names = self.display_names(&levels).await;
        for candidates in levels.values_mut() {
            for approver in candidates.iter_mut() {
                if let Some(name) = names.get(&approver.id) {
                    approver.name = name.clone();
                } else if approver.name.is_empty() {
                    approver.name = approver.id.clone();
                }
            }
        }

        info!(
            user_id = %current_user.id,
            document_type = document_type.code(),
            transaction_code = %code.as_str(),
            rows = rows.len(),
            "Resolved approver candidates"
        );

        Ok(ApproverCandidates {
            transaction_code: code,
            levels,
        })
    }

    async fn hierarchy(
        &self,
        user_id: &str,
        document_type: DocumentType,
    ) -> Result<Vec<SuperiorMapping>, PortalError> {
        if let Some(rows) = self.cache.superiors(user_id, document_type) {
            return Ok(rows);
        }
        match self.directory.superiors(user_id, document_type).await {
            Ok(rows) => {
                self.cache.store_superiors(user_id, document_type, rows.clone());
                Ok(rows)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    user_id,
                    document_type = document_type.code(),
                    "Failed to load approval hierarchy"
                );
                Err(e)
            }
        }
    }

    /// Names from the user cache or one directory lookup per unknown user.
    /// Users that cannot be looked up are simply absent from the result.
    async fn display_names(&self, levels: &BTreeMap<ApprovalLevel, Vec<Approver>>) -> HashMap<String, String> {
        let mut names = HashMap::new();
        let mut missing = Vec::new();
        let mut seen = HashSet::new();

        for approver in levels.values().flatten() {
            if !seen.insert(approver.id.clone()) {
                continue;
            }
            match self.cache.user(&approver.id) {
                Some(profile) if !profile.full_name.trim().is_empty() => {
                    names.insert(approver.id.clone(), profile.full_name);
                }
                _ => missing.push(approver.id.clone()),
            }
        }

        let lookups = missing.iter().map(|id| self.directory.user(id));
        for (id, result) in missing.iter().zip(join_all(lookups).await) {
            match result {
                Ok(Some(profile)) if !profile.full_name.trim().is_empty() => {
                    names.insert(id.clone(), profile.full_name.clone());
                    self.cache.store_user(UserProfile {
                        id: id.clone(),
                        full_name: profile.full_name,
                    });
                }
                Ok(_) => debug!(user_id = %id, "No display name for user"),
                Err(e) => warn!(user_id = %id, error = %e, "User lookup failed, keeping fallback name"),
            }
        }

        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn cache() -> Arc<MasterDataCache> {
        Arc::new(MasterDataCache::new(Duration::from_secs(300)))
    }

    fn requester() -> Approver {
        Approver::new("u1", "Ana")
    }

    fn hierarchy() -> MockSuperiorDirectory {
        MockSuperiorDirectory::new()
            .with_superior("u1", DocumentType::CashAdvance, "LO", ApprovalLevel::Checked, "u2", "Budi")
            .with_superior("u1", DocumentType::CashAdvance, "LO", ApprovalLevel::Checked, "u2", "Budi S.")
            .with_superior("u1", DocumentType::CashAdvance, "LO", ApprovalLevel::Checked, "u3", "Citra")
            .with_superior("u1", DocumentType::CashAdvance, "LO", ApprovalLevel::Closed, "u7", "")
            .with_superior("u1", DocumentType::CashAdvance, "TR", ApprovalLevel::Checked, "u4", "Dewi")
            .with_superior("u1", DocumentType::CashAdvance, "OT", ApprovalLevel::Approved, "u5", "Eko")
    }

    #[tokio::test]
    async fn filters_by_transaction_code_and_level_with_dedup() {
        let resolver = SuperiorApproverResolver::new(Arc::new(hierarchy()), cache(), "OT");
        let candidates = resolver
            .resolve(&requester(), DocumentType::CashAdvance, "Personal Loan")
            .await
            .unwrap();

        let checkers: Vec<_> = candidates
            .for_level(ApprovalLevel::Checked)
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(checkers, vec!["u2", "u3"]);
        assert_eq!(candidates.for_level(ApprovalLevel::Checked)[0].name, "Budi");
        assert!(candidates.for_level(ApprovalLevel::Approved).is_empty());
        assert_eq!(candidates.transaction_code(), "LO");
    }

    #[tokio::test]
    async fn current_user_is_added_as_preparer() {
        let resolver = SuperiorApproverResolver::new(Arc::new(hierarchy()), cache(), "OT");
        let candidates = resolver
            .resolve(&requester(), DocumentType::CashAdvance, "Travelling")
            .await
            .unwrap();
        assert!(candidates.contains(ApprovalLevel::Prepared, "u1"));
        assert_eq!(candidates.for_level(ApprovalLevel::Prepared).len(), 1);
    }

    #[tokio::test]
    async fn unmapped_transaction_type_uses_fallback_code() {
        let resolver = SuperiorApproverResolver::new(Arc::new(hierarchy()), cache(), "OT");
        let candidates = resolver
            .resolve(&requester(), DocumentType::CashAdvance, "Team Building")
            .await
            .unwrap();
        assert!(candidates.used_fallback_code());
        assert!(candidates.contains(ApprovalLevel::Approved, "u5"));
    }

    #[tokio::test]
    async fn names_prefer_user_cache_then_directory_then_mapping_then_id() {
        let directory = Arc::new(hierarchy().with_user("u3", "Citra Lestari"));
        let cache = cache();
        cache.seed_users(vec![UserProfile {
            id: "u2".to_string(),
            full_name: "Budi Santoso".to_string(),
        }]);
        let resolver = SuperiorApproverResolver::new(directory.clone(), cache.clone(), "OT");

        let candidates = resolver
            .resolve(&requester(), DocumentType::CashAdvance, "Personal Loan")
            .await
            .unwrap();

        let names: Vec<_> = candidates
            .for_level(ApprovalLevel::Checked)
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["Budi Santoso", "Citra Lestari"]);
        assert_eq!(candidates.for_level(ApprovalLevel::Closed)[0].name, "u7");
        assert_eq!(candidates.for_level(ApprovalLevel::Prepared)[0].name, "Ana");
        assert_eq!(cache.user("u3").unwrap().full_name, "Citra Lestari");
    }

    #[tokio::test]
    async fn hierarchy_is_fetched_once_per_session() {
        let directory = Arc::new(hierarchy());
        let resolver = SuperiorApproverResolver::new(directory.clone(), cache(), "OT");

        resolver
            .resolve(&requester(), DocumentType::CashAdvance, "Personal Loan")
            .await
            .unwrap();
        resolver
            .resolve(&requester(), DocumentType::CashAdvance, "Travelling")
            .await
            .unwrap();
        assert_eq!(directory.superior_calls(), 1);
    }

    #[tokio::test]
    async fn fetch_failure_is_reported_and_not_cached() {
        let directory = Arc::new(hierarchy());
        directory.set_failing(true);
        let cache = cache();
        let resolver = SuperiorApproverResolver::new(directory.clone(), cache.clone(), "OT");

        let err = resolver
            .resolve(&requester(), DocumentType::CashAdvance, "Personal Loan")
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::RemoteUnavailable(_)));
        assert!(cache.superiors("u1", DocumentType::CashAdvance).is_none());

        directory.set_failing(false);
        let candidates = resolver
            .resolve(&requester(), DocumentType::CashAdvance, "Personal Loan")
            .await
            .unwrap();
        assert!(candidates.contains(ApprovalLevel::Checked, "u2"));
        assert_eq!(directory.superior_calls(), 2);
    }
}
