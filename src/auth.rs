//! Access token persistence and the viewer's session.
//!
//! Token issuance happens elsewhere; this module only stores the bearer token under
//! [`TOKEN_KEY`] and answers whether the viewer is signed in.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::app::{PlazaError, Result};

/// Storage key of the bearer token.
pub const TOKEN_KEY: &str = "accessToken";

/// Route of the sign-in page.
pub const SIGN_IN_PATH: &str = "/signin";
/// Return location when no page is known.
pub const HOME_PATH: &str = "/";

pub trait TokenStore: Send + Sync {
    fn token(&self) -> Option<String>;
    fn set_token(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        self.token.lock().ok().and_then(|t| t.clone())
    }

    fn set_token(&self, token: &str) -> Result<()> {
        let mut slot = self
            .token
            .lock()
            .map_err(|e| PlazaError::Other(e.to_string()))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut slot = self
            .token
            .lock()
            .map_err(|e| PlazaError::Other(e.to_string()))?;
        *slot = None;
        Ok(())
    }
}

/// A JSON key/value file, read on every access so several processes see the same token.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `<data dir>/plaza/storage.json`
    pub fn default_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| PlazaError::Config("Could not find data directory".into()))?;
        Ok(data_dir.join("plaza").join("storage.json"))
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn token(&self) -> Option<String> {
        match self.read_all() {
            Ok(mut entries) => entries.remove(TOKEN_KEY).filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!("Failed to read token storage {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn set_token(&self, token: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(TOKEN_KEY.to_string(), token.to_string());
        self.write_all(&entries)
    }

    fn clear(&self) -> Result<()> {
        let mut entries = self.read_all()?;
        if entries.remove(TOKEN_KEY).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// Where to send an unauthenticated viewer, and where to bring them back afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInRedirect {
    pub path: String,
    pub return_to: String,
}

impl SignInRedirect {
    pub fn new(return_to: &str) -> Self {
        Self {
            path: SIGN_IN_PATH.to_string(),
            return_to: return_to.to_string(),
        }
    }
}

impl From<SignInRedirect> for PlazaError {
    fn from(redirect: SignInRedirect) -> Self {
        PlazaError::AuthRequired {
            return_to: redirect.return_to,
        }
    }
}

#[derive(Clone)]
pub struct Session {
    tokens: Arc<dyn TokenStore>,
}

impl Session {
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        Self { tokens }
    }

    pub fn anonymous() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    pub fn with_token(token: &str) -> Self {
        Self::new(Arc::new(MemoryTokenStore::with_token(token)))
    }

    pub fn token(&self) -> Option<String> {
        self.tokens.token()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Fails with a redirect to sign-in that returns to `return_to`.
    pub fn require(&self, return_to: &str) -> Result<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(SignInRedirect::new(return_to).into())
        }
    }

    pub fn sign_in(&self, token: &str) -> Result<()> {
        self.tokens.set_token(token)
    }

    pub fn sign_out(&self) -> Result<()> {
        self.tokens.clear()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("storage.json"));

        assert_eq!(store.token(), None);
        store.set_token("abc.def").unwrap();
        assert_eq!(store.token(), Some("abc.def".into()));

        // A second handle on the same file sees the token.
        let other = FileTokenStore::new(dir.path().join("nested").join("storage.json"));
        assert_eq!(other.token(), Some("abc.def".into()));

        store.clear().unwrap();
        assert_eq!(other.token(), None);
    }

    #[test]
    fn test_file_store_keeps_other_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, r#"{"theme": "dark"}"#).unwrap();

        let store = FileTokenStore::new(&path);
        store.set_token("t").unwrap();
        store.clear().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("dark"));
        assert!(!content.contains(TOKEN_KEY));
    }

    #[test]
    fn test_session_require() {
        let session = Session::anonymous();
        assert!(!session.is_authenticated());
        match session.require("/post/new") {
            Err(PlazaError::AuthRequired { return_to }) => assert_eq!(return_to, "/post/new"),
            other => panic!("unexpected {:?}", other),
        }

        session.sign_in("token").unwrap();
        assert!(session.require("/post/new").is_ok());
        session.sign_out().unwrap();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_sign_in_redirect_path() {
        let redirect = SignInRedirect::new("/events/summer-festival");
        assert_eq!(redirect.path, "/signin");
        assert_eq!(redirect.return_to, "/events/summer-festival");
    }
}
