use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use secrecy::Secret;

/// Source of the bearer token attached to every portal request.
///
/// Token storage and refresh belong to the session layer; the dispatcher only
/// reads the current token and reports a 401 through [`invalidate`].
///
/// [`invalidate`]: CredentialProvider::invalidate
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Option<Secret<String>>;

    /// Called when a backend rejects the current token.
    fn invalidate(&self);
}

/// Unauthenticated access, used for public master-data endpoints and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct Anonymous;

impl CredentialProvider for Anonymous {
    fn bearer_token(&self) -> Option<Secret<String>> {
        None
    }

    fn invalidate(&self) {}
}

/// A fixed token that is dropped on the first 401.
pub struct StaticCredentials {
    token: Mutex<Option<Secret<String>>>,
    invalidations: AtomicU64,
}

impl StaticCredentials {
    pub fn new(token: Secret<String>) -> Self {
        Self {
            token: Mutex::new(Some(token)),
            invalidations: AtomicU64::new(0),
        }
    }

    pub fn invalidation_count(&self) -> u64 {
        self.invalidations.load(Ordering::SeqCst)
    }
}

impl CredentialProvider for StaticCredentials {
    fn bearer_token(&self) -> Option<Secret<String>> {
        match self.token.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        let mut guard = match self.token.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.take().is_some() {
            tracing::warn!("Access token rejected by backend, credentials invalidated");
        }
    }
}
