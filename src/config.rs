use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::errors::{RegistrationError, Result};

pub const DEFAULT_BASE_URL: &str = "https://prestamos-back.onrender.com/admin-panel";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_TIMEZONE: &str = "America/Mexico_City";
/// mexico city has stayed on UTC-6 year round since 2022
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = -360;

pub const ENV_API_URL: &str = "BULK_REGISTRATION_API_URL";
pub const ENV_TIMEOUT_MS: &str = "BULK_REGISTRATION_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "BULK_REGISTRATION_LOG_LEVEL";

/// registration configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RegistrationConfig {
    pub api: ApiConfig,
    pub timezone: TimezoneConfig,
    pub logging: LoggingConfig,
}

/// remote persistence service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub user_agent: String,
    pub headers: HashMap<String, String>,
}

/// reference timezone for loan dates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimezoneConfig {
    pub name: String,
    pub utc_offset_minutes: i32,
}

/// log output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: format!("bulk-registration-rs/{}", env!("CARGO_PKG_VERSION")),
            headers: HashMap::new(),
        }
    }
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_TIMEZONE.to_string(),
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl TimezoneConfig {
    /// fixed offset of the reference timezone
    pub fn offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            RegistrationError::InvalidConfiguration {
                message: format!(
                    "utc offset of {} minutes is out of range for {}",
                    self.utc_offset_minutes, self.name
                ),
            }
        })
    }
}

impl RegistrationConfig {
    /// parse configuration from json
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// load configuration from a json file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RegistrationError::InvalidConfiguration {
                message: format!("cannot read {}: {}", path.display(), e),
            }
        })?;
        Self::from_json_str(&contents)
    }

    /// apply overrides from the process environment
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// apply overrides from any key lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api.base_url = url;
        }

        if let Some(timeout) = lookup(ENV_TIMEOUT_MS) {
            self.api.timeout_ms = timeout.trim().parse().map_err(|_| {
                RegistrationError::InvalidConfiguration {
                    message: format!("{} must be a number of milliseconds, got '{}'", ENV_TIMEOUT_MS, timeout),
                }
            })?;
        }

        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }

        self.validate()?;
        Ok(self)
    }

    /// validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = self.api.base_url.trim();
        if url.is_empty() {
            return Err(RegistrationError::InvalidConfiguration {
                message: "api base url is empty".to_string(),
            });
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(RegistrationError::InvalidConfiguration {
                message: format!("api base url must be http or https: {}", url),
            });
        }
        if self.api.timeout_ms == 0 {
            return Err(RegistrationError::InvalidConfiguration {
                message: "api timeout must be greater than zero".to_string(),
            });
        }
        self.timezone.offset()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RegistrationConfig::default();

        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.timeout_ms, 30_000);
        assert_eq!(config.timezone.name, "America/Mexico_City");
        assert_eq!(config.timezone.offset().unwrap().local_minus_utc(), -6 * 3600);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RegistrationConfig::from_json_str(
            r#"{ "api": { "base_url": "http://localhost:3000/admin-panel" }, "logging": { "format": "json" } }"#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://localhost:3000/admin-panel");
        assert_eq!(config.api.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_overrides() {
        let config = RegistrationConfig::default()
            .with_overrides(|key| match key {
                ENV_API_URL => Some("http://localhost:3000/admin-panel".to_string()),
                ENV_TIMEOUT_MS => Some("5000".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.api.base_url, "http://localhost:3000/admin-panel");
        assert_eq!(config.api.timeout_ms, 5_000);
    }

    #[test]
    fn test_invalid_configuration() {
        let bad_timeout = RegistrationConfig::default()
            .with_overrides(|key| (key == ENV_TIMEOUT_MS).then(|| "soon".to_string()));
        assert!(matches!(bad_timeout, Err(RegistrationError::InvalidConfiguration { .. })));

        let mut config = RegistrationConfig::default();
        config.api.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = RegistrationConfig::default();
        config.timezone.utc_offset_minutes = 25 * 60;
        assert!(config.validate().is_err());
    }
}
