//! Process settings from the environment (and `.env` when present).

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Which document store backs the adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendSettings {
    Convex { url: String, deploy_key: Option<String> },
    /// In-process store; data is lost on exit.
    Memory,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub backend: BackendSettings,
    pub bind_addr: SocketAddr,
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

impl Settings {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; `ADMIN_BACKEND=memory` selects the in-process store,
    /// otherwise `CONVEX_URL` is required.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backend = match get("ADMIN_BACKEND").as_deref() {
            Some("memory") => BackendSettings::Memory,
            None | Some("convex") => {
                let url = get("CONVEX_URL").ok_or(ConfigError::MissingSetting("CONVEX_URL"))?;
                if !(url.starts_with("https://") || url.starts_with("http://")) {
                    return Err(ConfigError::InvalidSetting {
                        name: "CONVEX_URL",
                        detail: format!("'{}' is not an http(s) URL", url),
                    });
                }
                BackendSettings::Convex {
                    url,
                    deploy_key: get("CONVEX_DEPLOY_KEY"),
                }
            }
            Some(other) => {
                return Err(ConfigError::InvalidSetting {
                    name: "ADMIN_BACKEND",
                    detail: format!("expected 'convex' or 'memory', got '{}'", other),
                })
            }
        };

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidSetting {
                name: "BIND_ADDR",
                detail: e.to_string(),
            })?;
        let timeout_secs = match get("REQUEST_TIMEOUT_SECS") {
            Some(v) => v.parse::<u64>().map_err(|e| ConfigError::InvalidSetting {
                name: "REQUEST_TIMEOUT_SECS",
                detail: e.to_string(),
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        let max_body_bytes = match get("MAX_BODY_BYTES") {
            Some(v) => v.parse::<usize>().map_err(|e| ConfigError::InvalidSetting {
                name: "MAX_BODY_BYTES",
                detail: e.to_string(),
            })?,
            None => DEFAULT_MAX_BODY_BYTES,
        };

        Ok(Settings {
            backend,
            bind_addr,
            request_timeout: Duration::from_secs(timeout_secs),
            max_body_bytes,
        })
    }
}
