//! Configuration types for history-sync

use crate::error::{Error, Result};
use crate::types::OrderingMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// On-disk job store settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory holding page dumps and one directory per job (default: "jobs")
    #[serde(default = "default_jobs_dir")]
    pub jobs_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            jobs_dir: default_jobs_dir(),
        }
    }
}

/// Remote listing endpoint settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Listing endpoint; query parameters are appended per request
    #[serde(default = "default_recent_jobs_url")]
    pub recent_jobs_url: String,

    /// User-Agent sent with catalog requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Name of the cookie that carries the session token
    #[serde(default = "default_session_cookie_name")]
    pub session_cookie_name: String,

    /// Per-request timeout for catalog and image requests, in seconds
    ///
    /// `None` (the default) waits indefinitely; a stalled request then stalls
    /// only the run that issued it.
    #[serde(default, with = "optional_duration_serde")]
    pub request_timeout: Option<Duration>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            recent_jobs_url: default_recent_jobs_url(),
            user_agent: default_user_agent(),
            session_cookie_name: default_session_cookie_name(),
            request_timeout: None,
        }
    }
}

impl ApiConfig {
    /// HTTP client shared by the catalog and image requests
    ///
    /// # Errors
    /// Returns a configuration error if the client cannot be built.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().map_err(|e| Error::Config {
            message: format!("failed to create HTTP client: {}", e),
            key: None,
        })
    }
}

/// Page walk and scheduling settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Listing order requested from the server
    #[serde(default)]
    pub ordering: OrderingMode,

    /// Last page number fetched in a run, inclusive (default: 200)
    #[serde(default = "default_page_ceiling")]
    pub page_ceiling: u32,

    /// Interval between timer-triggered runs, in seconds (default: 3600)
    #[serde(default = "default_interval", with = "duration_serde")]
    pub interval: Duration,

    /// End a run after this many consecutive empty pages
    ///
    /// `None` (the default) walks every page up to `page_ceiling`, since the
    /// endpoint gives no explicit last-page signal.
    #[serde(default)]
    pub stop_after_empty_pages: Option<u32>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            ordering: OrderingMode::default(),
            page_ceiling: default_page_ceiling(),
            interval: default_interval(),
            stop_after_empty_pages: None,
        }
    }
}

/// Where the two credential strings are persisted
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// File holding the user id (default: "userid.txt")
    #[serde(default = "default_user_id_file")]
    pub user_id_file: PathBuf,

    /// File holding the session token (default: "sessiontoken.txt")
    #[serde(default = "default_session_token_file")]
    pub session_token_file: PathBuf,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            user_id_file: default_user_id_file(),
            session_token_file: default_session_token_file(),
        }
    }
}

/// Main configuration for [`HistorySync`](crate::HistorySync)
///
/// Every field has a default, so `Config::default()` reproduces the stock
/// behavior: hourly runs of up to 200 pages of the "new" listing into `./jobs`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Job store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Remote endpoint settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Page walk and scheduling settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Credential file locations
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

impl Config {
    /// Load a configuration from a JSON file and validate it
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if let Err(e) = url::Url::parse(&self.api.recent_jobs_url) {
            return Err(Error::Config {
                message: format!("invalid URL {:?}: {}", self.api.recent_jobs_url, e),
                key: Some("api.recent_jobs_url".to_string()),
            });
        }
        if self.sync.page_ceiling == 0 {
            return Err(Error::Config {
                message: "page ceiling must be at least 1".to_string(),
                key: Some("sync.page_ceiling".to_string()),
            });
        }
        if self.sync.interval.is_zero() {
            return Err(Error::Config {
                message: "sync interval must be non-zero".to_string(),
                key: Some("sync.interval".to_string()),
            });
        }
        if self.sync.stop_after_empty_pages == Some(0) {
            return Err(Error::Config {
                message: "empty page streak must be at least 1".to_string(),
                key: Some("sync.stop_after_empty_pages".to_string()),
            });
        }
        Ok(())
    }
}

fn default_jobs_dir() -> PathBuf {
    PathBuf::from("jobs")
}

fn default_recent_jobs_url() -> String {
    "https://www.midjourney.com/api/app/recent-jobs/".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36".to_string()
}

fn default_session_cookie_name() -> String {
    "__Secure-next-auth.session-token".to_string()
}

fn default_page_ceiling() -> u32 {
    200
}

fn default_interval() -> Duration {
    Duration::from_secs(3600)
}

fn default_user_id_file() -> PathBuf {
    PathBuf::from("userid.txt")
}

fn default_session_token_file() -> PathBuf {
    PathBuf::from("sessiontoken.txt")
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
