//! # Session & Credential Stores
//!
//! The signed-in user's bearer token and tenant slug, behind small store
//! traits so tests can run against memory and the terminal against a file.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  sign_in(token, tenant, identity)                                       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ┌──────────┐   every request reads token() + tenant()                  │
//! │  │  Active  │──────────────────────────────────────────┐                │
//! │  └────┬─────┘                                          │                │
//! │       │ backend answers 401                            │                │
//! │       ▼                                                │                │
//! │  ┌──────────┐   expire(): both stores cleared,         │                │
//! │  │ Expired  │   is_expired() = true, UI goes to login  │                │
//! │  └──────────┘                                          │                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

use snapbuy_core::Role;

use crate::error::ClientResult;

// =============================================================================
// Store Traits
// =============================================================================

/// Where the bearer token lives between launches.
pub trait TokenStore: Send + Sync {
    fn token(&self) -> Option<String>;
    fn set_token(&self, token: &str) -> ClientResult<()>;
    fn clear_token(&self) -> ClientResult<()>;
}

/// Where the tenant slug lives between launches.
pub trait TenantStore: Send + Sync {
    fn tenant(&self) -> Option<String>;
    fn set_tenant(&self, tenant: &str) -> ClientResult<()>;
    fn clear_tenant(&self) -> ClientResult<()>;
}

// =============================================================================
// In-Memory Stores
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        MemoryTokenStore {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_token(&self, token: &str) -> ClientResult<()> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&self) -> ClientResult<()> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryTenantStore {
    tenant: RwLock<Option<String>>,
}

impl MemoryTenantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tenant(tenant: &str) -> Self {
        MemoryTenantStore {
            tenant: RwLock::new(Some(tenant.to_string())),
        }
    }
}

impl TenantStore for MemoryTenantStore {
    fn tenant(&self) -> Option<String> {
        self.tenant.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_tenant(&self, tenant: &str) -> ClientResult<()> {
        *self.tenant.write().unwrap_or_else(PoisonError::into_inner) = Some(tenant.to_string());
        Ok(())
    }

    fn clear_tenant(&self) -> ClientResult<()> {
        *self.tenant.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

// =============================================================================
// File Store
// =============================================================================

/// The signed-in user, as far as the POS needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub user_id: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCredentials {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    tenant: Option<String>,
    #[serde(default)]
    identity: Option<UserIdentity>,
}

/// Credentials persisted as one JSON file in the data directory.
///
/// Every write rewrites the whole file; the in-memory copy is the source
/// of truth between writes.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    state: RwLock<StoredCredentials>,
}

impl FileStore {
    pub const FILE_NAME: &'static str = "credentials.json";

    /// Opens (or prepares) the credential file inside `dir`.
    ///
    /// A missing file is an empty store. A corrupt file is logged and
    /// treated as empty so the cashier can sign in again.
    pub fn open(dir: &Path) -> ClientResult<Self> {
        let path = dir.join(Self::FILE_NAME);
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!(?path, error = %e, "Credential file unreadable, starting signed out");
                StoredCredentials::default()
            })
        } else {
            debug!(?path, "No credential file yet");
            StoredCredentials::default()
        };

        Ok(FileStore {
            path,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn identity(&self) -> Option<UserIdentity> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .identity
            .clone()
    }

    pub fn set_identity(&self, identity: Option<UserIdentity>) -> ClientResult<()> {
        self.update(|s| s.identity = identity)
    }

    fn update(&self, f: impl FnOnce(&mut StoredCredentials)) -> ClientResult<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&*state)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl TokenStore for FileStore {
    fn token(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .token
            .clone()
    }

    fn set_token(&self, token: &str) -> ClientResult<()> {
        self.update(|s| s.token = Some(token.to_string()))
    }

    fn clear_token(&self) -> ClientResult<()> {
        self.update(|s| {
            s.token = None;
            s.identity = None;
        })
    }
}

impl TenantStore for FileStore {
    fn tenant(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .tenant
            .clone()
    }

    fn set_tenant(&self, tenant: &str) -> ClientResult<()> {
        self.update(|s| s.tenant = Some(tenant.to_string()))
    }

    fn clear_tenant(&self) -> ClientResult<()> {
        self.update(|s| s.tenant = None)
    }
}

// =============================================================================
// Session
// =============================================================================

/// Explicit session object handed to the API client and the POS flows.
pub struct Session {
    tokens: Arc<dyn TokenStore>,
    tenants: Arc<dyn TenantStore>,
    expired: AtomicBool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("signed_in", &self.tokens.token().is_some())
            .field("tenant", &self.tenants.tenant())
            .field("expired", &self.is_expired())
            .finish()
    }
}

impl Session {
    pub fn new(tokens: Arc<dyn TokenStore>, tenants: Arc<dyn TenantStore>) -> Self {
        Session {
            tokens,
            tenants,
            expired: AtomicBool::new(false),
        }
    }

    /// Session backed by memory stores. Used by tests and one-shot tools.
    pub fn in_memory(token: Option<&str>, tenant: Option<&str>) -> Self {
        let tokens = match token {
            Some(t) => MemoryTokenStore::with_token(t),
            None => MemoryTokenStore::new(),
        };
        let tenants = match tenant {
            Some(t) => MemoryTenantStore::with_tenant(t),
            None => MemoryTenantStore::new(),
        };
        Session::new(Arc::new(tokens), Arc::new(tenants))
    }

    /// Session where one file store serves both token and tenant.
    pub fn from_file_store(store: Arc<FileStore>) -> Self {
        Session::new(store.clone(), store)
    }

    pub fn token(&self) -> Option<String> {
        self.tokens.token()
    }

    pub fn tenant(&self) -> Option<String> {
        self.tenants.tenant()
    }

    pub fn is_signed_in(&self) -> bool {
        !self.is_expired() && self.token().is_some()
    }

    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    pub fn sign_in(&self, token: &str, tenant: &str) -> ClientResult<()> {
        self.tokens.set_token(token)?;
        self.tenants.set_tenant(tenant)?;
        self.expired.store(false, Ordering::SeqCst);
        info!(tenant, "Signed in");
        Ok(())
    }

    /// Global 401 handler: forgets the credentials and flags the session.
    ///
    /// Store failures are logged; the session is marked expired regardless.
    pub fn expire(&self) {
        if self.expired.swap(true, Ordering::SeqCst) {
            return;
        }
        warn!("Session expired, clearing stored credentials");
        if let Err(e) = self.tokens.clear_token() {
            warn!(error = %e, "Failed to clear token");
        }
        if let Err(e) = self.tenants.clear_tenant() {
            warn!(error = %e, "Failed to clear tenant");
        }
    }
}

// =============================================================================
// Tenant Resolution
// =============================================================================

/// Derives the tenant slug from the host the POS was opened on.
///
/// ```rust
/// use snapbuy_client::tenant_from_host;
///
/// assert_eq!(tenant_from_host("shop1.snapbuy.vn").as_deref(), Some("shop1"));
/// assert_eq!(tenant_from_host("shop1.localhost:5173").as_deref(), Some("shop1"));
/// assert_eq!(tenant_from_host("snapbuy.vn"), None);
/// assert_eq!(tenant_from_host("www.snapbuy.vn"), None);
/// ```
pub fn tenant_from_host(host: &str) -> Option<String> {
    let host = host.trim().trim_end_matches('.');
    let host = host.split(':').next().unwrap_or(host).to_lowercase();

    if host.is_empty() || host.parse::<std::net::Ipv4Addr>().is_ok() {
        return None;
    }

    let labels: Vec<&str> = host.split('.').collect();
    let is_local = labels.last() == Some(&"localhost");
    let min_labels = if is_local { 2 } else { 3 };
    if labels.len() < min_labels {
        return None;
    }

    let slug = labels[0];
    if slug.is_empty() || slug == "www" || slug == "api" {
        return None;
    }
    Some(slug.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_expire_clears_both_stores() {
        let session = Session::in_memory(Some("tok"), Some("shop1"));
        assert!(session.is_signed_in());

        session.expire();

        assert!(session.is_expired());
        assert!(!session.is_signed_in());
        assert_eq!(session.token(), None);
        assert_eq!(session.tenant(), None);
    }

    #[test]
    fn test_sign_in_after_expiry() {
        let session = Session::in_memory(None, None);
        session.expire();
        session.sign_in("new-token", "shop2").unwrap();

        assert!(!session.is_expired());
        assert_eq!(session.token().as_deref(), Some("new-token"));
        assert_eq!(session.tenant().as_deref(), Some("shop2"));
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempdir().unwrap();
        {
            let store = FileStore::open(dir.path()).unwrap();
            store.set_token("abc").unwrap();
            store.set_tenant("shop1").unwrap();
            store
                .set_identity(Some(UserIdentity {
                    user_id: "u-1".into(),
                    role: Role::Salesman,
                }))
                .unwrap();
        }

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.token().as_deref(), Some("abc"));
        assert_eq!(reopened.tenant().as_deref(), Some("shop1"));
        assert_eq!(reopened.identity().unwrap().role, Role::Salesman);
    }

    #[test]
    fn test_file_store_corrupt_file_is_empty() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(FileStore::FILE_NAME), "{not json").unwrap();

        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.token(), None);
    }

    #[test]
    fn test_session_over_file_store_expires_to_disk() {
        let dir = tempdir().unwrap();
        let store = Arc::new(FileStore::open(dir.path()).unwrap());
        let session = Session::from_file_store(store.clone());
        session.sign_in("abc", "shop1").unwrap();

        session.expire();

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.token(), None);
        assert_eq!(reopened.tenant(), None);
    }

    #[test]
    fn test_tenant_from_host() {
        assert_eq!(tenant_from_host("shop1.snapbuy.vn").as_deref(), Some("shop1"));
        assert_eq!(tenant_from_host("Shop1.SnapBuy.vn").as_deref(), Some("shop1"));
        assert_eq!(tenant_from_host("shop1.localhost").as_deref(), Some("shop1"));
        assert_eq!(tenant_from_host("localhost:3000"), None);
        assert_eq!(tenant_from_host("snapbuy.vn"), None);
        assert_eq!(tenant_from_host("127.0.0.1"), None);
        assert_eq!(tenant_from_host(""), None);
    }
}
