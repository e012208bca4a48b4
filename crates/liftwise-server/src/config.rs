//! Configuration file management for liftwise.
//!
//! Provides a TOML config file at `~/.config/liftwise/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use liftwise_core::llm::OpenAiConfig;
use liftwise_core::session::SessionKey;
use liftwise_db::config::DbConfig;

pub const SESSION_SECRET_ENV: &str = "LIFTWISE_SESSION_SECRET";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL_ENV: &str = "OPENAI_BASE_URL";
pub const GENERATION_MODEL_ENV: &str = "LIFTWISE_GENERATION_MODEL";
pub const EMBEDDING_MODEL_ENV: &str = "LIFTWISE_EMBEDDING_MODEL";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    pub session: SessionSection,
    #[serde(default)]
    pub openai: OpenAiSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionSection {
    /// Hex-encoded cookie signing secret (64 hex chars = 32 bytes).
    pub secret: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OpenAiSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the liftwise config directory: `$XDG_CONFIG_HOME/liftwise` or
/// `~/.config/liftwise`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("liftwise");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("liftwise")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Write the config file, creating parent dirs as needed. The file is
/// made owner-only (0600) on Unix since it holds secrets.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

/// 32 random bytes, hex-encoded (64 chars).
pub fn generate_session_secret() -> String {
    use rand::Rng;
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct LiftwiseConfig {
    pub db_config: DbConfig,
    pub session_key: SessionKey,
    pub openai: OpenAiConfig,
}

fn env_or(name: &str, file_value: Option<&String>) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| file_value.cloned())
}

impl LiftwiseConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `LIFTWISE_DATABASE_URL` > `database.url` > `DbConfig::DEFAULT_URL`
    /// - Session secret: `LIFTWISE_SESSION_SECRET` > `session.secret` > error
    /// - OpenAI settings: env var > `[openai]` table > built-in default
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file_config = load_config().ok();

        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var(DbConfig::ENV_VAR) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };
        let db_config = DbConfig::new(db_url);

        let session_key = if let Ok(secret_hex) = std::env::var(SESSION_SECRET_ENV) {
            SessionKey::from_hex(&secret_hex)
                .with_context(|| format!("{SESSION_SECRET_ENV} is not a usable session secret"))?
        } else if let Some(ref cfg) = file_config {
            SessionKey::from_hex(&cfg.session.secret)
                .context("invalid session secret in config file")?
        } else {
            bail!(
                "session secret not found; set {SESSION_SECRET_ENV} or run `liftwise init` to create a config file"
            );
        };

        let section = file_config.as_ref().map(|c| &c.openai);
        let defaults = OpenAiConfig::default();
        let openai = OpenAiConfig {
            api_key: env_or(OPENAI_API_KEY_ENV, section.and_then(|s| s.api_key.as_ref())),
            base_url: env_or(OPENAI_BASE_URL_ENV, section.and_then(|s| s.base_url.as_ref()))
                .unwrap_or(defaults.base_url),
            generation_model: env_or(
                GENERATION_MODEL_ENV,
                section.and_then(|s| s.generation_model.as_ref()),
            )
            .unwrap_or(defaults.generation_model),
            embedding_model: env_or(
                EMBEDDING_MODEL_ENV,
                section.and_then(|s| s.embedding_model.as_ref()),
            )
            .unwrap_or(defaults.embedding_model),
        };

        Ok(Self {
            db_config,
            session_key,
            openai,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55aa55";

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    /// Point config lookups at an empty temp dir for the guard's lifetime.
    struct IsolatedConfigDir {
        _tmp: tempfile::TempDir,
        orig_xdg: Option<String>,
    }

    impl IsolatedConfigDir {
        fn new() -> Self {
            let tmp = tempfile::TempDir::new().unwrap();
            let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
            unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };
            Self {
                _tmp: tmp,
                orig_xdg,
            }
        }
    }

    impl Drop for IsolatedConfigDir {
        fn drop(&mut self) {
            match self.orig_xdg.take() {
                Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
                None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
            }
        }
    }

    fn clear_env() {
        for var in [
            DbConfig::ENV_VAR,
            SESSION_SECRET_ENV,
            OPENAI_API_KEY_ENV,
            OPENAI_BASE_URL_ENV,
            GENERATION_MODEL_ENV,
            EMBEDDING_MODEL_ENV,
        ] {
            unsafe { std::env::remove_var(var) };
        }
    }

    #[test]
    fn generate_session_secret_is_64_hex_chars() {
        let secret = generate_session_secret();
        assert_eq!(secret.len(), 64);
        assert!(
            secret.chars().all(|c| c.is_ascii_hexdigit()),
            "expected all hex digits, got: {secret}"
        );
        assert!(SessionKey::from_hex(&secret).is_ok());
    }

    #[test]
    fn generate_session_secret_is_random() {
        assert_ne!(generate_session_secret(), generate_session_secret());
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let _lock = lock_env();
        let _dir = IsolatedConfigDir::new();

        let original = ConfigFile {
            database: DatabaseSection {
                url: "postgresql://testhost:5432/testdb".to_string(),
            },
            session: SessionSection {
                secret: SECRET.to_string(),
            },
            openai: OpenAiSection {
                api_key: Some("sk-file".into()),
                ..Default::default()
            },
        };
        save_config(&original).unwrap();

        let loaded = load_config().unwrap();
        assert_eq!(loaded.database.url, original.database.url);
        assert_eq!(loaded.session.secret, SECRET);
        assert_eq!(loaded.openai.api_key.as_deref(), Some("sk-file"));
        assert!(loaded.openai.base_url.is_none());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let meta = std::fs::metadata(config_path()).unwrap();
            assert_eq!(meta.permissions().mode() & 0o777, 0o600);
        }
    }

    #[test]
    fn config_without_openai_table_parses() {
        let parsed: ConfigFile = toml::from_str(
            "[database]\nurl = \"postgresql://x/y\"\n\n[session]\nsecret = \"ab\"\n",
        )
        .unwrap();
        assert!(parsed.openai.api_key.is_none());
    }

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        let _lock = lock_env();
        let _dir = IsolatedConfigDir::new();
        clear_env();

        unsafe { std::env::set_var(DbConfig::ENV_VAR, "postgresql://env:5432/envdb") };
        unsafe { std::env::set_var(SESSION_SECRET_ENV, SECRET) };

        let config = LiftwiseConfig::resolve(Some("postgresql://cli:5432/clidb")).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://cli:5432/clidb");

        clear_env();
    }

    #[test]
    fn resolve_env_overrides_config_file() {
        let _lock = lock_env();
        let _dir = IsolatedConfigDir::new();
        clear_env();

        save_config(&ConfigFile {
            database: DatabaseSection {
                url: "postgresql://file:5432/filedb".to_string(),
            },
            session: SessionSection {
                secret: SECRET.to_string(),
            },
            openai: OpenAiSection {
                api_key: Some("sk-file".into()),
                generation_model: Some("file-model".into()),
                ..Default::default()
            },
        })
        .unwrap();

        let config = LiftwiseConfig::resolve(None).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://file:5432/filedb");
        assert_eq!(config.openai.api_key.as_deref(), Some("sk-file"));
        assert_eq!(config.openai.generation_model, "file-model");
        assert_eq!(config.openai.embedding_model, "text-embedding-3-small");

        unsafe { std::env::set_var(DbConfig::ENV_VAR, "postgresql://env:5432/envdb") };
        unsafe { std::env::set_var(OPENAI_API_KEY_ENV, "sk-env") };
        unsafe { std::env::set_var(OPENAI_BASE_URL_ENV, "http://localhost:8080/v1") };

        let config = LiftwiseConfig::resolve(None).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://env:5432/envdb");
        assert_eq!(config.openai.api_key.as_deref(), Some("sk-env"));
        assert_eq!(config.openai.base_url, "http://localhost:8080/v1");

        clear_env();
    }

    #[test]
    fn resolve_defaults_when_only_secret_set() {
        let _lock = lock_env();
        let _dir = IsolatedConfigDir::new();
        clear_env();
        unsafe { std::env::set_var(SESSION_SECRET_ENV, SECRET) };

        let config = LiftwiseConfig::resolve(None).unwrap();
        assert_eq!(config.db_config.database_url, DbConfig::DEFAULT_URL);
        assert_eq!(config.openai, OpenAiConfig::default());

        clear_env();
    }

    #[test]
    fn resolve_errors_when_no_session_secret() {
        let _lock = lock_env();
        let _dir = IsolatedConfigDir::new();
        clear_env();

        let result = LiftwiseConfig::resolve(Some("postgresql://localhost:5432/liftwise"));
        assert!(result.is_err(), "should error when no session secret");
        let msg = result.unwrap_err().to_string();
        assert!(
            msg.contains("session secret not found"),
            "unexpected error: {msg}"
        );
    }

    #[test]
    fn resolve_rejects_short_secret() {
        let _lock = lock_env();
        let _dir = IsolatedConfigDir::new();
        clear_env();
        unsafe { std::env::set_var(SESSION_SECRET_ENV, "abcd") };

        assert!(LiftwiseConfig::resolve(None).is_err());

        clear_env();
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("liftwise/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
