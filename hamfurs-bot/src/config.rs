use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory holding the JSON collections
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    pub telegram: TelegramConfig,

    #[serde(default)]
    pub hamqth: Option<HamQthConfig>,

    #[serde(default)]
    pub sources: SourcesConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub token: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Chat addressed by greeter commands issued in a private chat
    #[serde(default)]
    pub home_chat_id: Option<i64>,

    /// Handle always treated as a chat administrator
    #[serde(default)]
    pub owner_username: Option<String>,

    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HamQthConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_callook_url")]
    pub callook_url: String,

    #[serde(default = "default_acma_url")]
    pub acma_url: String,

    #[serde(default = "default_hamqth_url")]
    pub hamqth_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_reload_interval")]
    pub reload_interval_minutes: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_callook_url() -> String {
    "https://callook.info".to_string()
}

fn default_acma_url() -> String {
    "https://l1gfir5yi7.execute-api.us-east-1.amazonaws.com/prod".to_string()
}

fn default_hamqth_url() -> String {
    "https://www.hamqth.com/xml.php".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_reload_interval() -> u64 {
    60
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            callook_url: default_callook_url(),
            acma_url: default_acma_url(),
            hamqth_url: default_hamqth_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            reload_interval_minutes: default_reload_interval(),
        }
    }
}

impl SourcesConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl BotConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        let config: BotConfig =
            toml::from_str(&content).with_context(|| format!("Invalid config file {}", path))?;
        Ok(config)
    }

    /// Path of a named collection file under `data_dir`.
    pub fn collection_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: BotConfig = toml::from_str(
            r#"
            [telegram]
            token = "123:abc"
            "#,
        )
        .unwrap();

        assert_eq!(config.log_level, "info");
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.telegram.api_base, "https://api.telegram.org");
        assert_eq!(config.telegram.poll_timeout_secs, 30);
        assert!(config.hamqth.is_none());
        assert_eq!(config.sources.callook_url, "https://callook.info");
        assert_eq!(config.sources.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.cache.reload_interval_minutes, 60);
        assert_eq!(config.collection_path("ic"), PathBuf::from("data/ic.json"));
    }

    #[test]
    fn test_full_config() {
        let config: BotConfig = toml::from_str(
            r#"
            log_level = "debug"
            data_dir = "/var/lib/hamfurs"

            [telegram]
            token = "123:abc"
            home_chat_id = -1001234
            owner_username = "kf3rry"

            [hamqth]
            username = "user"
            password = "pass"

            [sources]
            request_timeout_secs = 3

            [cache]
            reload_interval_minutes = 15
            "#,
        )
        .unwrap();

        assert_eq!(config.telegram.home_chat_id, Some(-1001234));
        assert_eq!(config.telegram.owner_username.as_deref(), Some("kf3rry"));
        assert_eq!(config.hamqth.unwrap().username, "user");
        assert_eq!(config.sources.request_timeout_secs, 3);
        assert_eq!(
            config.sources.acma_url,
            "https://l1gfir5yi7.execute-api.us-east-1.amazonaws.com/prod"
        );
        assert_eq!(config.cache.reload_interval_minutes, 15);
    }
}
