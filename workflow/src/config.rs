use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::error::{Result, WorkflowError};
use crate::gate::validate_url;
use crate::http::DEFAULT_TIMEOUT;
use crate::poller::DEFAULT_POLL_INTERVAL;

/// Default directory name inside the user's home.
const DEFAULT_DIR_NAME: &str = ".siteward";

/// File holding the bearer token.
const TOKEN_FILE: &str = "token";

/// File holding the backend base URL.
const API_URL_FILE: &str = "api_url";

pub const ENV_HOME: &str = "SITEWARD_HOME";
pub const ENV_API_URL: &str = "SITEWARD_API_URL";
pub const ENV_TOKEN: &str = "SITEWARD_TOKEN";

/// The directory where siteward keeps its credentials.
///
/// ```text
/// ~/.siteward/
/// ├── api_url   ← backend base URL
/// └── token     ← bearer token, removed when the backend answers 401
/// ```
pub struct ConfigDir {
    root: PathBuf,
}

impl ConfigDir {
    /// Resolve the directory from `SITEWARD_HOME`, falling back to `~/.siteward`.
    pub fn init() -> Result<Self> {
        Self::init_at(Self::resolve_root()?)
    }

    /// Create a `ConfigDir` rooted at an explicit path (useful for tests).
    pub fn init_at(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ------------------------------------------------------------------
    // Credentials
    // ------------------------------------------------------------------

    pub fn read_token(&self) -> Option<String> {
        self.read_value(TOKEN_FILE)
    }

    pub fn store_token(&self, token: &str) -> Result<()> {
        fs::write(self.root.join(TOKEN_FILE), token.trim())?;
        Ok(())
    }

    /// Forget the stored token. Returns `true` if one was removed.
    pub fn clear_token(&self) -> Result<bool> {
        let path = self.root.join(TOKEN_FILE);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Backend URL
    // ------------------------------------------------------------------

    pub fn read_api_url(&self) -> Option<String> {
        self.read_value(API_URL_FILE)
    }

    /// Store a validated base URL.
    pub fn store_api_url(&self, raw: &str) -> Result<Url> {
        let url = validate_url(raw)?;
        fs::write(self.root.join(API_URL_FILE), url.as_str())?;
        Ok(url)
    }

    // ------------------------------------------------------------------
    // Private helpers
    // ------------------------------------------------------------------

    fn read_value(&self, file: &str) -> Option<String> {
        fs::read_to_string(self.root.join(file))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn resolve_root() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var(ENV_HOME) {
            return Ok(PathBuf::from(dir));
        }

        let home = std::env::var("HOME")
            .map(PathBuf::from)
            .map_err(|_| WorkflowError::NoConfigDir)?;

        Ok(home.join(DEFAULT_DIR_NAME))
    }
}

/// Effective settings for one invocation.
#[derive(Clone, Debug)]
pub struct Settings {
    pub api_url: Option<Url>,
    pub token: Option<String>,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Settings {
    /// Priority for each value: explicit flag → environment → config file.
    pub fn resolve(flag_url: Option<&str>, flag_token: Option<&str>, dir: &ConfigDir) -> Result<Self> {
        Self::resolve_from(
            flag_url.map(String::from),
            flag_token.map(String::from),
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_TOKEN).ok(),
            dir,
        )
    }

    fn resolve_from(
        flag_url: Option<String>,
        flag_token: Option<String>,
        env_url: Option<String>,
        env_token: Option<String>,
        dir: &ConfigDir,
    ) -> Result<Self> {
        let api_url = first_set([flag_url, env_url, dir.read_api_url()])
            .map(|raw| validate_url(&raw))
            .transpose()?;
        let token = first_set([flag_token, env_token, dir.read_token()]);

        Ok(Self {
            api_url,
            token,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// The backend URL, required whenever a real backend is contacted.
    pub fn require_api_url(&self) -> Result<&Url> {
        self.api_url.as_ref().ok_or(WorkflowError::NoApiUrl)
    }
}

fn first_set<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_lifecycle() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ConfigDir::init_at(tmp.path().join("cfg")).unwrap();

        assert!(dir.read_token().is_none());
        dir.store_token("  abc123\n").unwrap();
        assert_eq!(dir.read_token().as_deref(), Some("abc123"));
        assert!(dir.clear_token().unwrap());
        assert!(!dir.clear_token().unwrap());
        assert!(dir.read_token().is_none());
    }

    #[test]
    fn test_api_url_is_validated() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ConfigDir::init_at(tmp.path()).unwrap();

        assert!(matches!(dir.store_api_url("nope"), Err(WorkflowError::InvalidUrl(_))));
        assert!(dir.read_api_url().is_none());
        dir.store_api_url("https://api.example.com").unwrap();
        assert_eq!(dir.read_api_url().as_deref(), Some("https://api.example.com/"));
    }

    #[test]
    fn test_resolution_priority() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ConfigDir::init_at(tmp.path()).unwrap();
        dir.store_token("from-file").unwrap();
        dir.store_api_url("https://file.example").unwrap();

        let s = Settings::resolve_from(None, None, None, None, &dir).unwrap();
        assert_eq!(s.token.as_deref(), Some("from-file"));
        assert_eq!(s.require_api_url().unwrap().as_str(), "https://file.example/");

        let s = Settings::resolve_from(None, None, Some("https://env.example".into()), Some("from-env".into()), &dir).unwrap();
        assert_eq!(s.token.as_deref(), Some("from-env"));
        assert_eq!(s.api_url.unwrap().host_str(), Some("env.example"));

        let s = Settings::resolve_from(
            Some("https://flag.example".into()),
            Some("from-flag".into()),
            Some("https://env.example".into()),
            Some("  ".into()),
            &dir,
        )
        .unwrap();
        assert_eq!(s.token.as_deref(), Some("from-flag"));
        assert_eq!(s.api_url.unwrap().host_str(), Some("flag.example"));
    }

    #[test]
    fn test_missing_values() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ConfigDir::init_at(tmp.path()).unwrap();
        let s = Settings::resolve_from(None, None, None, Some("".into()), &dir).unwrap();
        assert!(s.token.is_none());
        assert!(matches!(s.require_api_url(), Err(WorkflowError::NoApiUrl)));
        assert_eq!(s.poll_interval, DEFAULT_POLL_INTERVAL);
    }
}
