use anyhow::{Context, Result};
use async_trait::async_trait;
use portico_core::{CredentialStore, Credentials, PortalConfig, Timings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Contents of the CLI configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub portal: PortalConfig,
    pub timings: Timings,
    /// Saved login for runs without `--user`/`--secret`
    pub credentials_file: Option<PathBuf>,
}

/// `<config dir>/portico/<file>`
pub fn config_file(file: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("portico").join(file))
}

/// Load settings from `path`, or from the default location when it exists
///
/// An explicit path must exist; a missing default file means defaults.
pub fn load(path: Option<&Path>) -> Result<Settings> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match config_file("config.json") {
            Some(path) if path.exists() => path,
            _ => {
                tracing::debug!("No config file, using defaults");
                return Ok(Settings::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(settings)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredLogin {
    user_id: String,
    secret: String,
}

/// Credential store backed by a JSON file: `{"userId": "...", "secret": "<encoded>"}`
pub struct JsonCredentialStore {
    path: PathBuf,
}

impl JsonCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn store_error(&self, err: impl std::fmt::Display) -> portico_core::Error {
        portico_core::Error::CredentialStore(format!("{}: {}", self.path.display(), err))
    }
}

#[async_trait]
impl CredentialStore for JsonCredentialStore {
    async fn stored_credentials(&self) -> portico_core::Result<Option<Credentials>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.store_error(e)),
        };

        let stored: StoredLogin =
            serde_json::from_str(&content).map_err(|e| self.store_error(e))?;
        if stored.user_id.trim().is_empty() || stored.secret.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(Credentials::new(stored.user_id, stored.secret)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_partial_config_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"portal": {{"entry_url": "https://intranet.local/login"}}}}"#
        )
        .unwrap();

        let settings = load(Some(file.path())).unwrap();
        let defaults = PortalConfig::default();
        assert_eq!(settings.portal.entry_url, "https://intranet.local/login");
        assert_eq!(settings.portal.menu_label, defaults.menu_label);
        assert_eq!(settings.timings, Timings::default());
        assert!(settings.credentials_file.is_none());
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = load(Some(&dir.path().join("nope.json")));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_store_reads_saved_login() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"userId": "u1", "secret": "cHc="}}"#).unwrap();

        let store = JsonCredentialStore::new(file.path().to_path_buf());
        let credentials = store.stored_credentials().await.unwrap().unwrap();
        assert_eq!(credentials.user_id, "u1");
        assert_eq!(credentials.secret, "cHc=");
    }

    #[tokio::test]
    async fn test_store_without_file_has_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonCredentialStore::new(dir.path().join("credentials.json"));
        assert!(store.stored_credentials().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_with_malformed_file_reports_store_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let store = JsonCredentialStore::new(file.path().to_path_buf());
        let err = store.stored_credentials().await.unwrap_err();
        assert_eq!(err.kind(), portico_core::ErrorKind::CredentialStore);
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[tokio::test]
    async fn test_store_on_directory_reports_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonCredentialStore::new(dir.path().to_path_buf());
        let err = store.stored_credentials().await.unwrap_err();
        assert_eq!(err.kind(), portico_core::ErrorKind::CredentialStore);
    }

    #[tokio::test]
    async fn test_store_with_blank_secret_has_nothing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"userId": "u1", "secret": " "}}"#).unwrap();

        let store = JsonCredentialStore::new(file.path().to_path_buf());
        assert!(store.stored_credentials().await.unwrap().is_none());
    }
}
