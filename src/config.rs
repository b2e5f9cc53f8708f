/// Runtime configuration read from the environment.
///
/// Values are read once at startup. Call `dotenvy::dotenv()` first if a
/// `.env` file should be honoured.
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::chat::{DEFAULT_CHAT_MODEL, DEFAULT_CHAT_URL};
use crate::models::UserId;
use crate::service::DEFAULT_MAX_BATCH_OPERATIONS;
use crate::utils::get_database_path;

/// Bind address used when `COGNICANVAS_BIND` is unset.
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// User id used when a request carries no `x-user-id` header.
pub const DEFAULT_USER: &str = "default-user";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub bind: SocketAddr,
    pub default_user: UserId,
    pub max_batch_operations: usize,
    pub chat_api_key: Option<String>,
    pub chat_api_url: String,
    pub chat_model: String,
}

impl Config {
    /// Reads configuration from process environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DATABASE_URL`: SQLite file path; `file:` and `sqlite:` prefixes are stripped
    /// - `COGNICANVAS_BIND` (default `127.0.0.1:3000`)
    /// - `COGNICANVAS_USER` (default `default-user`)
    /// - `COGNICANVAS_MAX_BATCH` (default 500)
    /// - `CHAT_API_KEY`, falling back to `GROQ_API_KEY`
    /// - `CHAT_API_URL`, `CHAT_MODEL`
    ///
    /// # Errors
    ///
    /// Returns an error if a value is present but unparseable, or if the
    /// default database location cannot be determined.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_path = match var("DATABASE_URL") {
            Some(url) => PathBuf::from(strip_database_scheme(url.trim())),
            None => get_database_path()?,
        };

        let bind_raw = var("COGNICANVAS_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid COGNICANVAS_BIND: {bind_raw}"))?;

        let default_user = UserId::new(var("COGNICANVAS_USER").unwrap_or_else(|| DEFAULT_USER.to_string()));

        let max_batch_operations = match var("COGNICANVAS_MAX_BATCH") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid COGNICANVAS_MAX_BATCH: {raw}"))?,
            None => DEFAULT_MAX_BATCH_OPERATIONS,
        };

        Ok(Self {
            database_path,
            bind,
            default_user,
            max_batch_operations,
            chat_api_key: var("CHAT_API_KEY").or_else(|| var("GROQ_API_KEY")),
            chat_api_url: var("CHAT_API_URL").unwrap_or_else(|| DEFAULT_CHAT_URL.to_string()),
            chat_model: var("CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
        })
    }
}

fn strip_database_scheme(url: &str) -> &str {
    let path = url
        .strip_prefix("sqlite:")
        .or_else(|| url.strip_prefix("file:"))
        .unwrap_or(url);
    path.strip_prefix("//").unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind, DEFAULT_BIND.parse().unwrap());
        assert_eq!(config.default_user.as_str(), DEFAULT_USER);
        assert_eq!(config.max_batch_operations, DEFAULT_MAX_BATCH_OPERATIONS);
        assert_eq!(config.chat_api_key, None);
        assert_eq!(config.chat_api_url, DEFAULT_CHAT_URL);
        assert_eq!(config.chat_model, DEFAULT_CHAT_MODEL);
        assert!(config.database_path.ends_with("canvas.db"));
    }

    #[test]
    fn database_url_prefixes_are_stripped() {
        for url in ["file:/tmp/a.db", "sqlite:/tmp/a.db", "sqlite:///tmp/a.db", "/tmp/a.db"] {
            let config = Config::from_lookup(lookup(&[("DATABASE_URL", url)])).unwrap();
            assert_eq!(config.database_path, PathBuf::from("/tmp/a.db"), "{url}");
        }
    }

    #[test]
    fn chat_key_falls_back_to_groq() {
        let config = Config::from_lookup(lookup(&[("GROQ_API_KEY", "g")])).unwrap();
        assert_eq!(config.chat_api_key.as_deref(), Some("g"));

        let config =
            Config::from_lookup(lookup(&[("GROQ_API_KEY", "g"), ("CHAT_API_KEY", "c")])).unwrap();
        assert_eq!(config.chat_api_key.as_deref(), Some("c"));

        let config = Config::from_lookup(lookup(&[("CHAT_API_KEY", "  ")])).unwrap();
        assert_eq!(config.chat_api_key, None);
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(Config::from_lookup(lookup(&[("COGNICANVAS_BIND", "nowhere")])).is_err());
        assert!(Config::from_lookup(lookup(&[("COGNICANVAS_MAX_BATCH", "-1")])).is_err());
    }

    #[test]
    #[serial]
    fn from_env_reads_process_environment() {
        let original = std::env::var("COGNICANVAS_MAX_BATCH").ok();

        unsafe { std::env::set_var("COGNICANVAS_MAX_BATCH", "42") };
        let config = Config::from_env().unwrap();
        assert_eq!(config.max_batch_operations, 42);

        match original {
            Some(value) => unsafe { std::env::set_var("COGNICANVAS_MAX_BATCH", value) },
            None => unsafe { std::env::remove_var("COGNICANVAS_MAX_BATCH") },
        }
    }
}
