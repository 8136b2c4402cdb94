// ABOUTME: Admin token file handling: load-or-generate, owner-only save, and guest token derivation.
// ABOUTME: Every failure here is soft; the gateway keeps running with an in-memory token.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use rand::Rng;
use rand::distr::Alphanumeric;
use thiserror::Error;

/// Length of a freshly generated admin token.
pub const TOKEN_LEN: usize = 32;

/// Length of the hex guest token derived from the admin token.
pub const GUEST_TOKEN_LEN: usize = 12;

/// Errors that can occur while reading or writing the token file.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to read token file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write token file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Generate a random alphanumeric token of `len` characters.
pub fn generate_token(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Derive the guest token: the first 12 hex characters of the MD5 digest of the admin token.
pub fn derive_guest_token(admin: &str) -> String {
    let digest = format!("{:x}", md5::compute(admin.as_bytes()));
    digest[..GUEST_TOKEN_LEN].to_string()
}

/// The admin/guest token pair checked by the auth layer. Immutable once handed out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    admin: String,
    guest: String,
}

impl Credentials {
    /// Build a pair from an admin token, deriving the guest token.
    pub fn from_admin(admin: impl Into<String>) -> Self {
        let admin = admin.into();
        let guest = derive_guest_token(&admin);
        Self { admin, guest }
    }

    pub fn admin(&self) -> &str {
        &self.admin
    }

    pub fn guest(&self) -> &str {
        &self.guest
    }
}

/// Owns the token file and the current credentials.
///
/// Startup must call [`TokenStore::load`] before [`TokenStore::save`] so a
/// persisted token survives restarts instead of being overwritten.
pub struct TokenStore {
    path: PathBuf,
    credentials: Credentials,
}

impl TokenStore {
    /// Create a store for `path` with no token loaded yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            credentials: Credentials::from_admin(String::new()),
        }
    }

    /// Read the token from disk, trimmed of surrounding whitespace. Returns `Ok(None)`
    /// when the file does not exist or holds only whitespace.
    pub fn read(&self) -> Result<Option<String>, TokenError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(token.to_string()))
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(TokenError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Load the persisted token, or generate a fresh one when the file is missing,
    /// empty or unreadable.
    pub fn load(&mut self) {
        let token = match self.read() {
            Ok(Some(token)) => {
                tracing::info!("loaded admin token from {}", self.path.display());
                Some(token)
            }
            Ok(None) => {
                tracing::info!(
                    "token file {} does not exist, generating a new token",
                    self.path.display()
                );
                None
            }
            Err(e) => {
                tracing::error!("{}", e);
                None
            }
        };

        self.set_token(token.unwrap_or_else(|| generate_token(TOKEN_LEN)));
    }

    /// Write the admin token, truncating the file and restricting it to the owner.
    pub fn try_save(&self) -> Result<(), TokenError> {
        let to_write_err = |source: io::Error| TokenError::Write {
            path: self.path.clone(),
            source,
        };

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path).map_err(to_write_err)?;
        file.write_all(self.credentials.admin.as_bytes())
            .map_err(to_write_err)?;

        // mode() only applies on creation; tighten a pre-existing file too.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(to_write_err)?;
        }

        Ok(())
    }

    /// Persist the admin token, logging instead of failing. An unsaved token still
    /// works for this process but will change after a restart.
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            tracing::error!("{}", e);
        }
    }

    /// Replace the admin token and re-derive the guest token.
    pub fn set_token(&mut self, value: impl Into<String>) {
        self.credentials = Credentials::from_admin(value);
    }

    pub fn admin_token(&self) -> &str {
        self.credentials.admin()
    }

    pub fn guest_token(&self) -> &str {
        self.credentials.guest()
    }

    /// Snapshot of the current credentials for the auth layer.
    pub fn credentials(&self) -> Credentials {
        self.credentials.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn generated_token_is_alphanumeric() {
        let token = generate_token(TOKEN_LEN);
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_token(TOKEN_LEN));
    }

    #[test]
    fn guest_token_is_md5_prefix() {
        // md5("admin") = 21232f297a57a5a743894a0e4a801fc3
        assert_eq!(derive_guest_token("admin"), "21232f297a57");
    }

    #[test]
    fn guest_token_is_deterministic_and_tracks_admin() {
        let mut store = TokenStore::new("unused");
        store.set_token("first-token");
        let guest = store.guest_token().to_string();

        assert_eq!(guest.len(), GUEST_TOKEN_LEN);
        assert!(guest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(guest, derive_guest_token("first-token"));

        store.set_token("second-token");
        assert_ne!(store.guest_token(), guest);
        assert_ne!(store.guest_token(), store.admin_token());
    }

    #[test]
    fn load_generates_when_file_missing() {
        let dir = TempDir::new().unwrap();
        let mut store = TokenStore::new(dir.path().join("token"));

        store.load();

        assert_eq!(store.admin_token().len(), TOKEN_LEN);
        assert_eq!(store.guest_token(), derive_guest_token(store.admin_token()));
    }

    #[test]
    fn load_trims_persisted_token() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "  persisted-secret\n").unwrap();

        let mut store = TokenStore::new(&path);
        store.load();

        assert_eq!(store.admin_token(), "persisted-secret");
    }

    #[test]
    fn load_generates_for_blank_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "   \n").unwrap();

        let mut store = TokenStore::new(&path);
        store.load();

        assert_eq!(store.admin_token().len(), TOKEN_LEN);
    }

    #[test]
    fn load_falls_back_when_path_is_unreadable() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be read as a token file.
        let mut store = TokenStore::new(dir.path());

        assert!(store.read().is_err());
        store.load();

        assert_eq!(store.admin_token().len(), TOKEN_LEN);
    }

    #[test]
    fn save_then_load_survives_restart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token");

        let mut first = TokenStore::new(&path);
        first.load();
        first.save();
        let admin = first.admin_token().to_string();

        let mut restarted = TokenStore::new(&path);
        restarted.load();

        assert_eq!(restarted.admin_token(), admin);
        assert_eq!(restarted.guest_token(), first.guest_token());
    }

    #[test]
    fn save_truncates_longer_previous_token() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "a-much-longer-previous-token-value").unwrap();

        let mut store = TokenStore::new(&path);
        store.set_token("short");
        store.try_save().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "short");
    }

    #[cfg(unix)]
    #[test]
    fn save_restricts_permissions_to_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "old").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let mut store = TokenStore::new(&path);
        store.set_token("fresh");
        store.try_save().unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn save_failure_is_soft() {
        let dir = TempDir::new().unwrap();
        let mut store = TokenStore::new(dir.path().join("missing-dir").join("token"));
        store.set_token("kept-in-memory");

        assert!(store.try_save().is_err());
        store.save();

        assert_eq!(store.admin_token(), "kept-in-memory");
    }
}
