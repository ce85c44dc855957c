//! Client-side session: the access token, the cached user record, and the
//! site cookie image uploads need.
//!
//! The session is an explicit [`SessionHandle`] handed to each controller at
//! construction, wrapping a pluggable [`SessionStore`]. Two stores ship here:
//!
//! - [`MemorySessionStore`]: in-memory, for tests
//! - [`FileSessionStore`]: a small JSON file, used by the CLI
//!
//! The token is written on successful login, read before every admin
//! request, and only removed by an explicit [`SessionHandle::clear`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::endpoint::{LOGIN_PAGE_PATH, SITE_COOKIE_NAME};
use crate::error::{GateError, SessionError};

/// Storage key for the bearer token.
pub const TOKEN_KEY: &str = "admin_token";

/// Storage key for the JSON-serialized user record.
pub const USER_KEY: &str = "admin_user";

/// Storage key for the site cookie, stored under the cookie's own name.
pub const SITE_COOKIE_KEY: &str = SITE_COOKIE_NAME;

/// An opaque bearer credential issued by the backend on login.
///
/// `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Value of the `admin_user_id` cookie set by the site's form login.
///
/// `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct SiteCookie(String);

impl SiteCookie {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SiteCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SiteCookie(<redacted>)")
    }
}

/// A string key-value store for session state.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Read a value. Returns `Ok(None)` if the key is not set.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the backing store cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError>;

    /// Write `put` and remove `remove` as one update: either all of it is
    /// stored or none of it is. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the backing store cannot be written.
    async fn update(&self, put: &[(&str, &str)], remove: &[&str]) -> Result<(), SessionError>;

    /// Write a value, overwriting any existing one.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the backing store cannot be written.
    async fn put(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.update(&[(key, value)], &[]).await
    }

    /// Remove a key.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the backing store cannot be written.
    async fn delete(&self, key: &str) -> Result<(), SessionError> {
        self.update(&[], &[key]).await
    }
}

/// Apply an update to a loaded map. Returns whether anything changed.
fn apply(data: &mut BTreeMap<String, String>, put: &[(&str, &str)], remove: &[&str]) -> bool {
    let mut changed = false;
    for (key, value) in put {
        changed |= data.insert((*key).to_owned(), (*value).to_owned()).as_deref() != Some(*value);
    }
    for key in remove {
        changed |= data.remove(*key).is_some();
    }
    changed
}

/// In-memory session store. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    data: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let data = self.data.read().await;
        Ok(data.get(key).cloned())
    }

    async fn update(&self, put: &[(&str, &str)], remove: &[&str]) -> Result<(), SessionError> {
        let mut data = self.data.write().await;
        apply(&mut data, put, remove);
        Ok(())
    }
}

/// Session store persisted as a flat JSON object in a single file.
///
/// Every update rewrites the whole file once, and an update that changes
/// nothing does not touch it. The file is created with mode 0600 on
/// Unix since it holds a bearer token.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, SessionError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(SessionError::Read {
                    path: self.display_path(),
                    reason: e.to_string(),
                });
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| SessionError::Corrupt {
            path: self.display_path(),
            reason: e.to_string(),
        })
    }

    async fn save(&self, data: &BTreeMap<String, String>) -> Result<(), SessionError> {
        let write_err = |reason: String| SessionError::Write {
            path: self.display_path(),
            reason,
        };

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| write_err(e.to_string()))?;
        }

        let body = serde_json::to_string_pretty(data).map_err(|e| write_err(e.to_string()))?;
        tokio::fs::write(&self.path, body)
            .await
            .map_err(|e| write_err(e.to_string()))?;

        // Restrict permissions to owner-only (0600) on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&self.path, perms)
                .await
                .map_err(|e| write_err(e.to_string()))?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn update(&self, put: &[(&str, &str)], remove: &[&str]) -> Result<(), SessionError> {
        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;
        if !apply(&mut data, put, remove) {
            return Ok(());
        }
        self.save(&data).await
    }
}

/// Shared handle to the session, passed to controllers at construction.
///
/// Every accessor goes back to the store, so a login or logout through one
/// handle is visible to all others sharing the same store.
#[derive(Clone)]
pub struct SessionHandle {
    store: Arc<dyn SessionStore>,
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle").finish_non_exhaustive()
    }
}

impl SessionHandle {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// A handle over a fresh [`MemorySessionStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    /// The stored token. An empty string counts as absent.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the store cannot be read.
    pub async fn token(&self) -> Result<Option<AccessToken>, SessionError> {
        Ok(self
            .store
            .get(TOKEN_KEY)
            .await?
            .filter(|t| !t.is_empty())
            .map(AccessToken))
    }

    /// The cached user record, exactly as the backend returned it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the store cannot be read or the record is
    /// not valid JSON.
    pub async fn user(&self) -> Result<Option<Value>, SessionError> {
        match self.store.get(USER_KEY).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// The site cookie from the last login, if the form login set one.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the store cannot be read.
    pub async fn site_cookie(&self) -> Result<Option<SiteCookie>, SessionError> {
        Ok(self
            .store
            .get(SITE_COOKIE_KEY)
            .await?
            .filter(|c| !c.is_empty())
            .map(SiteCookie))
    }

    /// Persist the result of a successful login in a single store update.
    /// A login without a site cookie drops any cookie left from before.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the store cannot be written; nothing is
    /// stored in that case.
    pub async fn store_login(
        &self,
        token: &AccessToken,
        user: &Value,
        site_cookie: Option<&SiteCookie>,
    ) -> Result<(), SessionError> {
        let user = serde_json::to_string(user)?;
        let mut put = vec![(TOKEN_KEY, token.as_str()), (USER_KEY, user.as_str())];
        let mut remove = Vec::new();
        match site_cookie {
            Some(cookie) => put.push((SITE_COOKIE_KEY, cookie.as_str())),
            None => remove.push(SITE_COOKIE_KEY),
        }
        self.store.update(&put, &remove).await?;
        info!(site_cookie = site_cookie.is_some(), "session stored");
        Ok(())
    }

    /// Forget the token, user record, and site cookie.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the store cannot be written.
    pub async fn clear(&self) -> Result<(), SessionError> {
        self.store
            .update(&[], &[TOKEN_KEY, USER_KEY, SITE_COOKIE_KEY])
            .await?;
        info!("session cleared");
        Ok(())
    }
}

/// Client-side access check for admin pages.
///
/// Runs before any admin logic. Without a token the caller is sent to the
/// login page. The backend is the real authorization boundary.
pub struct AdminGate;

impl AdminGate {
    /// Return the stored token or a redirect to the login page.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::Redirect`] when no token is stored, or
    /// [`GateError::Session`] if the store fails.
    pub async fn check(session: &SessionHandle) -> Result<AccessToken, GateError> {
        match session.token().await? {
            Some(token) => Ok(token),
            None => {
                debug!(to = LOGIN_PAGE_PATH, "no session token, redirecting");
                Err(GateError::Redirect {
                    to: LOGIN_PAGE_PATH,
                })
            }
        }
    }
}
