//! Credentials, saved accounts, and connection with fallback.
//!
//! Connecting to a service follows one fixed recipe:
//!
//! ```text
//!   saved account ──ok──────────────────────────────→ Connected
//!        │ missing / rejected
//!        ▼
//!   environment / .env ──none──→ NeedsAuth
//!        │ found
//!        ▼
//!   connect once more ──ok──→ save account ──→ Connected
//!        │ rejected            │ other error
//!        ▼                     ▼
//!     NeedsAuth              Failed
//! ```
//!
//! The outcome is a typed [`Connection`], never a caught panic or an
//! error swallowed somewhere up the stack.
//!
//! # Example
//!
//! ```ignore
//! use qlab_hal::auth::{connect_with_fallback, AccountStore, Connection, EnvCredentialSource};
//!
//! let store = AccountStore::default_location()?;
//! let env = EnvCredentialSource::default();
//! match connect_with_fallback(&store, &env, |creds| ArchiveService::connect(dir, creds)) {
//!     Connection::Connected { service, .. } => { /* use service */ }
//!     Connection::NeedsAuth { reason } => eprintln!("{reason}"),
//!     Connection::Failed(e) => return Err(e.into()),
//! }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{HalError, HalResult};

/// Default channel name recorded with saved accounts.
pub const DEFAULT_CHANNEL: &str = "ibm_quantum";

/// Default instance (hub/group/project) for open-plan accounts.
pub const DEFAULT_INSTANCE: &str = "ibm-q/open/main";

/// Account credentials for a quantum service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// API token.
    pub token: String,
    /// Instance (hub/group/project).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// Service channel.
    #[serde(default = "default_channel")]
    pub channel: String,
}

fn default_channel() -> String {
    DEFAULT_CHANNEL.to_string()
}

impl Credentials {
    /// Create credentials for `token` on the default channel.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            instance: None,
            channel: default_channel(),
        }
    }

    /// Set the instance.
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Set the channel.
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    /// Basic sanity check on the token.
    pub fn validate(&self) -> HalResult<()> {
        let token = self.token.trim();
        if token.is_empty() {
            return Err(HalError::AuthenticationFailed("token is empty".into()));
        }
        if token.chars().any(char::is_whitespace) {
            return Err(HalError::AuthenticationFailed(
                "token contains whitespace".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"[REDACTED]")
            .field("instance", &self.instance)
            .field("channel", &self.channel)
            .finish()
    }
}

/// Loads credentials from process environment variables or a `.env` file.
///
/// Variables are tried in order; the process environment wins over the
/// file. The file is read without mutating the process environment.
#[derive(Debug, Clone)]
pub struct EnvCredentialSource {
    vars: Vec<String>,
    dotenv_path: Option<PathBuf>,
    instance: Option<String>,
}

impl Default for EnvCredentialSource {
    fn default() -> Self {
        Self {
            vars: vec!["QLAB_TOKEN".into(), "TOKEN".into()],
            dotenv_path: Some(PathBuf::from(".env")),
            instance: Some(DEFAULT_INSTANCE.into()),
        }
    }
}

impl EnvCredentialSource {
    /// Read `vars` (in priority order) with no `.env` file.
    pub fn new<I, S>(vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(Into::into).collect(),
            dotenv_path: None,
            instance: None,
        }
    }

    /// Also consult the given `.env` file.
    pub fn with_dotenv(mut self, path: impl Into<PathBuf>) -> Self {
        self.dotenv_path = Some(path.into());
        self
    }

    /// Instance recorded on loaded credentials.
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Load credentials, if any variable is set.
    pub fn load(&self) -> HalResult<Option<Credentials>> {
        let token = match self.from_process_env() {
            Some(token) => Some(token),
            None => self.from_dotenv()?,
        };

        Ok(token.map(|token| {
            let creds = Credentials::new(token);
            match &self.instance {
                Some(instance) => creds.with_instance(instance.clone()),
                None => creds,
            }
        }))
    }

    fn from_process_env(&self) -> Option<String> {
        self.vars
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
    }

    fn from_dotenv(&self) -> HalResult<Option<String>> {
        let Some(path) = &self.dotenv_path else {
            return Ok(None);
        };
        if !path.exists() {
            debug!("No .env file at {}", path.display());
            return Ok(None);
        }

        let iter = dotenvy::from_path_iter(path).map_err(|e| {
            HalError::Credentials(format!("Failed to read {}: {e}", path.display()))
        })?;

        let mut entries = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| {
                HalError::Credentials(format!("Malformed {}: {e}", path.display()))
            })?;
            entries.push((key, value));
        }

        Ok(self.vars.iter().find_map(|var| {
            entries
                .iter()
                .find(|(key, value)| key == var && !value.trim().is_empty())
                .map(|(_, value)| value.clone())
        }))
    }
}

/// Saved account on disk.
#[derive(Debug, Clone)]
pub struct AccountStore {
    path: PathBuf,
}

impl AccountStore {
    /// Store at an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the user configuration directory (`<config>/qlab/account.json`).
    pub fn default_location() -> HalResult<Self> {
        let dir = dirs::config_dir().ok_or_else(|| {
            HalError::Credentials("Could not determine configuration directory".into())
        })?;
        Ok(Self::at(dir.join("qlab").join("account.json")))
    }

    /// Path of the account file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an account is saved.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the saved account, if any.
    pub fn load(&self) -> HalResult<Option<Credentials>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let creds: Credentials = serde_json::from_str(&content)?;
        Ok(Some(creds))
    }

    /// Save `creds`; refuses to replace an existing account unless `overwrite`.
    pub fn save(&self, creds: &Credentials, overwrite: bool) -> HalResult<()> {
        if self.path.exists() && !overwrite {
            return Err(HalError::Credentials(format!(
                "An account is already saved at {}; pass overwrite to replace it",
                self.path.display()
            )));
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(creds)?;
        std::fs::write(&self.path, json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&self.path, perms)?;
        }

        debug!("Saved account to {}", self.path.display());
        Ok(())
    }

    /// Remove the saved account. Returns whether a file was removed.
    pub fn clear(&self) -> HalResult<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)?;
        Ok(true)
    }
}

/// Where the credentials behind a connection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialOrigin {
    /// A previously saved account.
    SavedAccount,
    /// Environment variables or `.env`, saved afterwards.
    Environment,
}

/// Outcome of [`connect_with_fallback`].
#[derive(Debug)]
pub enum Connection<S> {
    /// Connected; holds the service handle.
    Connected {
        /// The connected service.
        service: S,
        /// Which credentials were used.
        origin: CredentialOrigin,
    },
    /// No usable credentials; the user needs to authenticate.
    NeedsAuth {
        /// Why authentication is needed.
        reason: String,
    },
    /// Connecting failed for a reason other than authentication.
    Failed(HalError),
}

impl<S> Connection<S> {
    /// Convert into a `Result`, turning `NeedsAuth` into `AuthenticationFailed`.
    pub fn into_result(self) -> HalResult<S> {
        match self {
            Connection::Connected { service, .. } => Ok(service),
            Connection::NeedsAuth { reason } => Err(HalError::AuthenticationFailed(reason)),
            Connection::Failed(e) => Err(e),
        }
    }
}

/// Connect with the saved account, falling back once to environment credentials.
pub fn connect_with_fallback<S, F>(
    store: &AccountStore,
    env: &EnvCredentialSource,
    mut connect: F,
) -> Connection<S>
where
    F: FnMut(&Credentials) -> HalResult<S>,
{
    let saved_failure = match store.load() {
        Ok(Some(creds)) => match connect(&creds) {
            Ok(service) => {
                debug!("Connected with saved account");
                return Connection::Connected {
                    service,
                    origin: CredentialOrigin::SavedAccount,
                };
            }
            Err(e) if e.is_auth() => {
                warn!("Saved account was rejected: {}", e);
                format!("saved account rejected ({e})")
            }
            Err(e) => return Connection::Failed(e),
        },
        Ok(None) => "no saved account".to_string(),
        Err(e) => {
            warn!("Could not read saved account: {}", e);
            format!("saved account unreadable ({e})")
        }
    };

    let creds = match env.load() {
        Ok(Some(creds)) => creds,
        Ok(None) => {
            return Connection::NeedsAuth {
                reason: format!("{saved_failure} and no token in the environment or .env"),
            };
        }
        Err(e) => return Connection::Failed(e),
    };

    match connect(&creds) {
        Ok(service) => {
            if let Err(e) = store.save(&creds, true) {
                warn!("Connected, but saving the account failed: {}", e);
            } else {
                info!("Account saved to {}", store.path().display());
            }
            Connection::Connected {
                service,
                origin: CredentialOrigin::Environment,
            }
        }
        Err(e) if e.is_auth() => Connection::NeedsAuth {
            reason: format!("environment token rejected ({e})"),
        },
        Err(e) => Connection::Failed(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accept(token: &'static str) -> impl FnMut(&Credentials) -> HalResult<String> {
        move |creds| {
            if creds.token == token {
                Ok(format!("service for {}", creds.token))
            } else {
                Err(HalError::AuthenticationFailed("unknown token".into()))
            }
        }
    }

    fn env_with(dir: &Path, var: &str, token: &str) -> EnvCredentialSource {
        let path = dir.join(".env");
        std::fs::write(&path, format!("{var}={token}\n")).unwrap();
        EnvCredentialSource::new([var]).with_dotenv(path)
    }

    #[test]
    fn test_credentials_debug_redacts_token() {
        let creds = Credentials::new("super-secret").with_instance(DEFAULT_INSTANCE);
        let debug = format!("{creds:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("ibm-q/open/main"));
    }

    #[test]
    fn test_credentials_validate() {
        assert!(Credentials::new("abc123").validate().is_ok());
        assert!(Credentials::new("  ").validate().is_err());
        assert!(Credentials::new("abc 123").validate().is_err());
    }

    #[test]
    fn test_env_source_reads_dotenv_file() {
        let dir = tempfile::tempdir().unwrap();
        let env = env_with(dir.path(), "QLAB_TEST_DOTENV_TOKEN_4711", "tok-from-file")
            .with_instance("hub/group/project");

        let creds = env.load().unwrap().unwrap();
        assert_eq!(creds.token, "tok-from-file");
        assert_eq!(creds.instance.as_deref(), Some("hub/group/project"));
    }

    #[test]
    fn test_env_source_missing_everything() {
        let dir = tempfile::tempdir().unwrap();
        let env = EnvCredentialSource::new(["QLAB_TEST_UNSET_VAR_4712"])
            .with_dotenv(dir.path().join("missing.env"));
        assert!(env.load().unwrap().is_none());
    }

    #[test]
    fn test_account_store_roundtrip_and_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = AccountStore::at(dir.path().join("nested").join("account.json"));
        assert!(store.load().unwrap().is_none());

        store.save(&Credentials::new("first"), false).unwrap();
        assert!(store.save(&Credentials::new("second"), false).is_err());
        store.save(&Credentials::new("second"), true).unwrap();
        assert_eq!(store.load().unwrap().unwrap().token, "second");

        assert!(store.clear().unwrap());
        assert!(!store.clear().unwrap());
    }

    #[test]
    fn test_fallback_uses_saved_account_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = AccountStore::at(dir.path().join("account.json"));
        store.save(&Credentials::new("saved"), false).unwrap();
        let env = env_with(dir.path(), "QLAB_TEST_FALLBACK_4713", "from-env");

        match connect_with_fallback(&store, &env, accept("saved")) {
            Connection::Connected { service, origin } => {
                assert_eq!(service, "service for saved");
                assert_eq!(origin, CredentialOrigin::SavedAccount);
            }
            other => panic!("expected connection, got {other:?}"),
        }
    }

    #[test]
    fn test_fallback_loads_env_and_saves_account() {
        let dir = tempfile::tempdir().unwrap();
        let store = AccountStore::at(dir.path().join("account.json"));
        let env = env_with(dir.path(), "QLAB_TEST_FALLBACK_4714", "from-env");

        match connect_with_fallback(&store, &env, accept("from-env")) {
            Connection::Connected { origin, .. } => {
                assert_eq!(origin, CredentialOrigin::Environment);
            }
            other => panic!("expected connection, got {other:?}"),
        }
        assert_eq!(store.load().unwrap().unwrap().token, "from-env");
    }

    #[test]
    fn test_fallback_replaces_rejected_saved_account() {
        let dir = tempfile::tempdir().unwrap();
        let store = AccountStore::at(dir.path().join("account.json"));
        store.save(&Credentials::new("stale"), false).unwrap();
        let env = env_with(dir.path(), "QLAB_TEST_FALLBACK_4715", "fresh");

        let conn = connect_with_fallback(&store, &env, accept("fresh"));
        assert!(matches!(
            conn,
            Connection::Connected {
                origin: CredentialOrigin::Environment,
                ..
            }
        ));
        assert_eq!(store.load().unwrap().unwrap().token, "fresh");
    }

    #[test]
    fn test_fallback_needs_auth_without_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = AccountStore::at(dir.path().join("account.json"));
        let env = EnvCredentialSource::new(["QLAB_TEST_UNSET_VAR_4716"]);

        let conn = connect_with_fallback(&store, &env, accept("anything"));
        match conn {
            Connection::NeedsAuth { reason } => assert!(reason.contains("no saved account")),
            other => panic!("expected NeedsAuth, got {other:?}"),
        }
    }

    #[test]
    fn test_fallback_needs_auth_when_env_token_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = AccountStore::at(dir.path().join("account.json"));
        let env = env_with(dir.path(), "QLAB_TEST_FALLBACK_4717", "wrong");

        let conn = connect_with_fallback(&store, &env, accept("right"));
        assert!(matches!(conn, Connection::NeedsAuth { .. }));
        assert!(!store.exists());
    }

    #[test]
    fn test_fallback_failed_on_non_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = AccountStore::at(dir.path().join("account.json"));
        store.save(&Credentials::new("saved"), false).unwrap();
        let env = EnvCredentialSource::new(["QLAB_TEST_UNSET_VAR_4718"]);

        let conn: Connection<String> = connect_with_fallback(&store, &env, |_| {
            Err(HalError::BackendUnavailable("service down".into()))
        });
        assert!(matches!(conn, Connection::Failed(HalError::BackendUnavailable(_))));
    }

    #[test]
    fn test_connection_into_result() {
        let needs: Connection<()> = Connection::NeedsAuth {
            reason: "no token".into(),
        };
        assert!(matches!(
            needs.into_result(),
            Err(HalError::AuthenticationFailed(_))
        ));

        let ok = Connection::Connected {
            service: 7,
            origin: CredentialOrigin::SavedAccount,
        };
        assert_eq!(ok.into_result().unwrap(), 7);
    }
}
