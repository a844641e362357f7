use std::fs;
use std::path::PathBuf;

use tracing::warn;

use crate::config::Config;

/// Session guard: a single authenticated/not-authenticated flag persisted in
/// a fixed file, checked before any protected screen is shown. Credentials
/// are the two statically configured values; there is no hashing, token or
/// expiry.
pub struct Session {
    authenticated: bool,
    username: String,
    password: String,
    store_path: PathBuf,
}

impl Session {
    /// Read the persisted flag and capture the configured credentials.
    pub fn init(config: &Config) -> Self {
        let store_path = PathBuf::from(&config.session_file);
        let authenticated = matches!(fs::read_to_string(&store_path).as_deref(), Ok("true"));

        Self {
            authenticated,
            username: config.auth_username.clone(),
            password: config.auth_password.clone(),
            store_path,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Compare submitted credentials against the configured pair. On success
    /// the flag is set and persisted; on failure nothing changes.
    pub fn login(&mut self, username: &str, password: &str) -> bool {
        if username == self.username && password == self.password {
            self.authenticated = true;
            if let Err(err) = fs::write(&self.store_path, "true") {
                warn!("could not persist session flag: {err}");
            }
            true
        } else {
            false
        }
    }

    /// Clear the flag and remove the persisted copy.
    pub fn logout(&mut self) {
        self.authenticated = false;
        if self.store_path.exists() {
            if let Err(err) = fs::remove_file(&self.store_path) {
                warn!("could not clear session file: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &std::path::Path) -> Config {
        // envy is bypassed in tests; construct the config directly.
        Config {
            database_url: "postgres://localhost/test".to_string(),
            auth_username: "admin".to_string(),
            auth_password: "admin123".to_string(),
            site_title: "Test".to_string(),
            export_dir: dir.join("exports").to_string_lossy().into_owned(),
            session_file: dir.join("session").to_string_lossy().into_owned(),
        }
    }

    #[test]
    fn starts_unauthenticated_without_persisted_flag() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::init(&test_config(dir.path()));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn login_with_wrong_credentials_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::init(&test_config(dir.path()));

        assert!(!session.login("admin", "nope"));
        assert!(!session.login("root", "admin123"));
        assert!(!session.is_authenticated());
        assert!(!dir.path().join("session").exists());
    }

    #[test]
    fn login_persists_and_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let mut session = Session::init(&config);
        assert!(session.login("admin", "admin123"));
        assert!(session.is_authenticated());

        // A fresh Session sees the persisted flag.
        let restarted = Session::init(&config);
        assert!(restarted.is_authenticated());
    }

    #[test]
    fn logout_clears_the_persisted_flag() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let mut session = Session::init(&config);
        session.login("admin", "admin123");
        session.logout();

        assert!(!session.is_authenticated());
        assert!(!Session::init(&config).is_authenticated());
    }
}
