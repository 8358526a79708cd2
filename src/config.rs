use std::{path::PathBuf, str::FromStr};

use url::Url;

use crate::service::PayloadKind;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_COOKIES_FILE: &str = "cookies/cookies.txt";
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_BASE_URL: &str = "https://www.instagram.com/";
const DEFAULT_DOC_ID: &str = "8845758582119845";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub relay: RelayConfig,
    pub instagram: InstagramConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// What `POST /download` hands back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelayMode {
    /// Direct media URLs under `media_urls`.
    Urls,
    /// Files written to a per-request directory, listed under `files`.
    Download,
}

impl RelayMode {
    pub fn payload_kind(self) -> PayloadKind {
        match self {
            RelayMode::Urls => PayloadKind::MediaUrls,
            RelayMode::Download => PayloadKind::Files,
        }
    }
}

impl FromStr for RelayMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "urls" | "urls-only" | "media_urls" => Ok(Self::Urls),
            "download" | "files" => Ok(Self::Download),
            other => Err(ConfigError::InvalidValue {
                key: "RELAY_MODE",
                reason: format!("unknown mode {:?}, expected \"urls\" or \"download\"", other),
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub mode: RelayMode,
    /// Cookie file location as configured, relative to the working directory.
    pub cookies_file: PathBuf,
    pub download_root: PathBuf,
    pub max_retries: u32,
}

#[derive(Clone, Debug)]
pub struct InstagramConfig {
    /// Root the GraphQL endpoint is resolved against, always ending in `/`.
    pub base_url: String,
    pub doc_id: String,
    pub user_agent: String,
    pub proxy_url: Option<String>,
}

pub fn build_config() -> Result<AppConfig, ConfigError> {
    build_config_from(|key| std::env::var(key).ok())
}

/// Builds the config from any key lookup; every key is optional.
pub fn build_config_from<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    info!("Building AppConfig...");
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let port = match get("PORT") {
        Some(port) => port.parse::<u16>().map_err(|e| ConfigError::InvalidValue {
            key: "PORT",
            reason: e.to_string(),
        })?,
        None => DEFAULT_PORT,
    };

    let mode = match get("RELAY_MODE") {
        Some(mode) => mode.parse::<RelayMode>()?,
        None => RelayMode::Urls,
    };

    let max_retries = match get("MAX_RETRIES") {
        Some(retries) => retries.parse::<u32>().map_err(|e| ConfigError::InvalidValue {
            key: "MAX_RETRIES",
            reason: e.to_string(),
        })?,
        None => DEFAULT_MAX_RETRIES,
    };

    let proxy_url = match get("PROXY_URL") {
        Some(proxy) => {
            Url::parse(&proxy).map_err(|e| ConfigError::InvalidValue {
                key: "PROXY_URL",
                reason: e.to_string(),
            })?;
            Some(proxy)
        }
        None => None,
    };

    let base_url = match get("INSTAGRAM_BASE_URL") {
        Some(base) => {
            let base = if base.ends_with('/') { base } else { format!("{}/", base) };
            Url::parse(&base).map_err(|e| ConfigError::InvalidValue {
                key: "INSTAGRAM_BASE_URL",
                reason: e.to_string(),
            })?;
            base
        }
        None => DEFAULT_BASE_URL.to_string(),
    };

    let config = AppConfig {
        server: ServerConfig {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
        },
        relay: RelayConfig {
            mode,
            cookies_file: PathBuf::from(get("COOKIES_FILE").unwrap_or_else(|| DEFAULT_COOKIES_FILE.to_string())),
            download_root: PathBuf::from(get("DOWNLOAD_ROOT").unwrap_or_else(|| ".".to_string())),
            max_retries,
        },
        instagram: InstagramConfig {
            base_url,
            doc_id: get("INSTAGRAM_DOC_ID").unwrap_or_else(|| DEFAULT_DOC_ID.to_string()),
            user_agent: get("INSTAGRAM_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            proxy_url,
        },
    };
    info!("AppConfig built");

    Ok(config)
}

#[cfg(test)]
impl AppConfig {
    pub fn new_test_config(mode: RelayMode, cookies_file: PathBuf, download_root: PathBuf) -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
            },
            relay: RelayConfig {
                mode,
                cookies_file,
                download_root,
                max_retries: DEFAULT_MAX_RETRIES,
            },
            instagram: InstagramConfig {
                base_url: DEFAULT_BASE_URL.into(),
                doc_id: DEFAULT_DOC_ID.into(),
                user_agent: DEFAULT_USER_AGENT.into(),
                proxy_url: None,
            },
        }
    }
}
