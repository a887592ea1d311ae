//! Session-scoped cache for master data, approver hierarchies and users.
//!
//! One cache is built per edit session and handed to the resolvers by
//! reference. Entries expire after the configured TTL; the whole cache is
//! dropped when the session closes.

use std::hash::Hash;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::models::{AccountNameRecord, DocumentType, SuperiorMapping, UserProfile};
use crate::services::master_data::MasterDataScope;

struct TtlMap<K, V> {
    ttl: Duration,
    entries: DashMap<K, (Instant, V)>,
}

impl<K: Eq + Hash, V: Clone> TtlMap<K, V> {
    fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    fn get(&self, key: &K) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.0.elapsed() < self.ttl => return Some(entry.1.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    fn insert(&self, key: K, value: V) {
        self.entries.insert(key, (Instant::now(), value));
    }

    fn remove(&self, key: &K) {
        self.entries.remove(key);
    }

    fn clear(&self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AccountKey {
    scope: MasterDataScope,
    category: String,
}

pub struct MasterDataCache {
    categories: TtlMap<MasterDataScope, Vec<String>>,
    account_names: TtlMap<AccountKey, Vec<AccountNameRecord>>,
    superiors: TtlMap<(String, DocumentType), Vec<SuperiorMapping>>,
    users: TtlMap<String, UserProfile>,
}

impl MasterDataCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            categories: TtlMap::new(ttl),
            account_names: TtlMap::new(ttl),
            superiors: TtlMap::new(ttl),
            users: TtlMap::new(ttl),
        }
    }

    pub fn categories(&self, scope: &MasterDataScope) -> Option<Vec<String>> {
        self.categories.get(scope)
    }

    pub fn store_categories(&self, scope: &MasterDataScope, categories: Vec<String>) {
        self.categories.insert(scope.clone(), categories);
    }

    pub fn account_names(&self, scope: &MasterDataScope, category: &str) -> Option<Vec<AccountNameRecord>> {
        self.account_names.get(&AccountKey {
            scope: scope.clone(),
            category: category.to_string(),
        })
    }

    pub fn store_account_names(
        &self,
        scope: &MasterDataScope,
        category: &str,
        records: Vec<AccountNameRecord>,
    ) {
        self.account_names.insert(
            AccountKey {
                scope: scope.clone(),
                category: category.to_string(),
            },
            records,
        );
    }

    pub fn superiors(&self, user_id: &str, document_type: DocumentType) -> Option<Vec<SuperiorMapping>> {
        self.superiors.get(&(user_id.to_string(), document_type))
    }

    pub fn store_superiors(&self, user_id: &str, document_type: DocumentType, rows: Vec<SuperiorMapping>) {
        self.superiors.insert((user_id.to_string(), document_type), rows);
    }

    pub fn invalidate_superiors(&self, user_id: &str, document_type: DocumentType) {
        self.superiors.remove(&(user_id.to_string(), document_type));
    }

    pub fn user(&self, user_id: &str) -> Option<UserProfile> {
        self.users.get(&user_id.to_string())
    }

    pub fn store_user(&self, profile: UserProfile) {
        self.users.insert(profile.id.clone(), profile);
    }

    /// Preload users already known to the session (e.g. the requester list).
    pub fn seed_users(&self, profiles: impl IntoIterator<Item = UserProfile>) {
        for profile in profiles {
            if !profile.id.is_empty() {
                self.store_user(profile);
            }
        }
    }

    pub fn invalidate_all(&self) {
        debug!(
            categories = self.categories.len(),
            account_names = self.account_names.len(),
            superiors = self.superiors.len(),
            users = self.users.len(),
            "Invalidating master-data cache"
        );
        self.categories.clear();
        self.account_names.clear();
        self.superiors.clear();
        self.users.clear();
    }
}
