//! Configuration loading for the Inksync server and client.
//!
//! Configuration is loaded from a TOML file (default: `inksync.toml`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use inksync_core::{IGNORE_FILE, META_DIR};
use inksync_sync::{ClientConfig, DEFAULT_MAX_FILE_SIZE};
use inksync_vault::{Vault, VaultRegistry, VAULT_LEDGER};
use serde::Deserialize;

use crate::error::{Result, ServerError};

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Vaults served by this process.
    #[serde(default)]
    pub vaults: Vec<VaultConfig>,
    /// Client tuning.
    #[serde(default)]
    pub client: ClientSection,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (default: 127.0.0.1:3000).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Largest accepted request body in bytes. Defaults to the encoded
    /// size of an upload of `DEFAULT_MAX_FILE_SIZE` bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

/// One served vault.
#[derive(Debug, Clone, Deserialize)]
pub struct VaultConfig {
    /// Name used in URLs.
    pub name: String,
    /// Root of the vault's file tree.
    pub path: PathBuf,
    /// Ledger database (default: `<path>/.inksync/vault.db`).
    pub ledger: Option<PathBuf>,
}

/// Client tuning, mirroring [`ClientConfig`].
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSection {
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_ignore_file")]
    pub ignore_file: String,
    #[serde(default = "default_stale_base_retries")]
    pub stale_base_retries: u32,
}

// Default value functions
fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_max_upload_bytes() -> usize {
    upload_body_limit(DEFAULT_MAX_FILE_SIZE)
}

/// Headroom for the JSON envelope around the base64 payload.
const UPLOAD_ENVELOPE_BYTES: usize = 64 * 1024;

/// Request body size needed to upload a file of `max_file_size` bytes.
///
/// Uploads carry the content as padded base64 inside a JSON object.
pub fn upload_body_limit(max_file_size: u64) -> usize {
    let encoded = max_file_size.div_ceil(3).saturating_mul(4);
    usize::try_from(encoded)
        .unwrap_or(usize::MAX)
        .saturating_add(UPLOAD_ENVELOPE_BYTES)
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_concurrency() -> usize {
    8
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_ignore_file() -> String {
    IGNORE_FILE.to_string()
}

fn default_stale_base_retries() -> u32 {
    1
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            concurrency: default_concurrency(),
            request_timeout_secs: default_request_timeout_secs(),
            ignore_file: default_ignore_file(),
            stale_base_retries: default_stale_base_retries(),
        }
    }
}

impl ClientSection {
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            max_file_size: self.max_file_size,
            concurrency: self.concurrency,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ignore_file: self.ignore_file.clone(),
            stale_base_retries: self.stale_base_retries,
        }
    }
}

impl VaultConfig {
    /// The ledger path, applying the default location.
    pub fn ledger_path(&self) -> PathBuf {
        self.ledger
            .clone()
            .unwrap_or_else(|| self.path.join(META_DIR).join(VAULT_LEDGER))
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the server accepts every upload the client may send.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let needed = upload_body_limit(self.client.max_file_size);
        if self.server.max_upload_bytes < needed {
            return Err(ConfigError::Invalid(format!(
                "server.max_upload_bytes is {} but client.max_file_size {} needs {needed}",
                self.server.max_upload_bytes, self.client.max_file_size
            )));
        }
        Ok(())
    }

    /// Open every configured vault.
    pub fn build_registry(&self) -> Result<VaultRegistry> {
        if self.vaults.is_empty() {
            return Err(ServerError::NoVaults);
        }
        let mut registry = VaultRegistry::new();
        for vault in &self.vaults {
            registry.insert(Vault::open(
                vault.name.clone(),
                &vault.path,
                Some(vault.ledger_path()),
            )?)?;
        }
        Ok(registry)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// Settings that contradict each other.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.server.bind_address, "127.0.0.1:3000");
        assert_eq!(
            config.server.max_upload_bytes,
            upload_body_limit(DEFAULT_MAX_FILE_SIZE)
        );
        assert!(config.vaults.is_empty());
        config.validate().unwrap();

        let client = config.client.to_client_config();
        assert_eq!(client.concurrency, 8);
        assert_eq!(client.request_timeout, Duration::from_secs(30));
        assert_eq!(client.ignore_file, ".inksyncignore");
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
[server]
bind_address = "0.0.0.0:8080"

[[vaults]]
name = "notes"
path = "/srv/notes"

[[vaults]]
name = "journal"
path = "/srv/journal"
ledger = "/var/lib/inksync/journal.db"

[client]
request_timeout_secs = 5
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.vaults.len(), 2);
        assert_eq!(
            config.vaults[0].ledger_path(),
            PathBuf::from("/srv/notes/.inksync/vault.db")
        );
        assert_eq!(
            config.vaults[1].ledger_path(),
            PathBuf::from("/var/lib/inksync/journal.db")
        );
        assert_eq!(
            config.client.to_client_config().request_timeout,
            Duration::from_secs(5)
        );
        assert_eq!(config.client.stale_base_retries, 1);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(matches!(config.build_registry(), Err(ServerError::NoVaults)));
    }

    #[test]
    fn build_registry_opens_vaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            vaults: vec![VaultConfig {
                name: "notes".into(),
                path: dir.path().join("notes"),
                ledger: None,
            }],
            ..Config::default()
        };

        let registry = config.build_registry().unwrap();
        assert_eq!(registry.get("notes").unwrap().name(), "notes");
        assert!(dir.path().join("notes/.inksync/vault.db").exists());
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = Config::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn upload_limit_covers_encoded_body() {
        use inksync_core::Upload;
        use inksync_sync::wire::UploadRequest;

        for size in [0usize, 1, 2, 3, 1_000_001] {
            let upload = Upload::Content(vec![0xA5; size].into());
            let body = serde_json::to_vec(&UploadRequest::new(
                Some(&inksync_core::ContentHash::of(b"base")),
                &upload,
            ))
            .unwrap();
            assert!(upload_body_limit(size as u64) >= body.len(), "size {size}");
        }

        // Default client ceiling: 50 MiB becomes about 66.7 MiB of base64.
        assert!(upload_body_limit(DEFAULT_MAX_FILE_SIZE) > DEFAULT_MAX_FILE_SIZE as usize * 4 / 3);
    }

    #[test]
    fn body_limit_below_client_ceiling_is_rejected() {
        let toml = r#"
[server]
max_upload_bytes = 67108864
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inksync.toml");
        std::fs::write(&path, toml).unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        std::fs::write(&path, "[client]\nmax_file_size = 1048576\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert!(config.server.max_upload_bytes >= upload_body_limit(1024 * 1024));
    }
}
