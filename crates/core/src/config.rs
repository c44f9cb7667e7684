//! # Factory Configuration
//!
//! Settings come from an optional JSON file with every field defaulted; the
//! API credential only ever comes from the environment.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ForgeError;
use crate::models::ModelSet;

/// Environment variables checked for the credential, in order
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MARKET: &str = "Future Social Economy";

/// What to do when the quality gate is still failing after the last audit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditExhaustionPolicy {
    /// Stop in FAILED; unaudited artifacts are kept but never deployed
    #[default]
    Halt,
    /// Deploy the last artifacts with a flagged warning
    Proceed,
}

impl std::str::FromStr for AuditExhaustionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "halt" => Ok(AuditExhaustionPolicy::Halt),
            "proceed" => Ok(AuditExhaustionPolicy::Proceed),
            other => Err(format!("unknown policy '{}' (expected halt|proceed)", other)),
        }
    }
}

/// File-backed factory settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FactorySettings {
    /// Free-text market/domain descriptor handed to research
    pub market: String,
    /// Generative API base URL
    pub base_url: String,
    pub models: ModelSet,
    /// Caller-side deadline for every external call
    pub request_timeout_secs: u64,
    /// Maximum code+audit cycles before the gate gives up
    pub max_audit_attempts: u32,
    pub on_audit_exhausted: AuditExhaustionPolicy,
    /// Suffix for preview deployment URLs
    pub deploy_domain: String,
    /// Soft target for generated file count
    pub expected_file_count: usize,
}

impl Default for FactorySettings {
    fn default() -> Self {
        Self {
            market: DEFAULT_MARKET.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            models: ModelSet::default(),
            request_timeout_secs: 120,
            max_audit_attempts: 2,
            on_audit_exhausted: AuditExhaustionPolicy::Halt,
            deploy_domain: "vercel.app".to_string(),
            expected_file_count: 9,
        }
    }
}

impl FactorySettings {
    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, ForgeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ForgeError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let settings: FactorySettings = serde_json::from_str(&content).map_err(|e| {
            ForgeError::Configuration(format!("invalid settings in {}: {}", path.display(), e))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load if the file exists, otherwise defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ForgeError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ForgeError> {
        if self.max_audit_attempts == 0 {
            return Err(ForgeError::Configuration(
                "max_audit_attempts must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ForgeError::Configuration(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.market.trim().is_empty() {
            return Err(ForgeError::Configuration("market must not be empty".to_string()));
        }
        if self.deploy_domain.trim().is_empty() {
            return Err(ForgeError::Configuration(
                "deploy_domain must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Credential, never printed
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Result<Self, ForgeError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ForgeError::Configuration("API key is blank".to_string()));
        }
        Ok(Self(key.trim().to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Resolved configuration for a live run
#[derive(Debug, Clone)]
pub struct ForgeConfig {
    pub settings: FactorySettings,
    api_key: ApiKey,
}

impl ForgeConfig {
    pub fn new(settings: FactorySettings, api_key: ApiKey) -> Result<Self, ForgeError> {
        settings.validate()?;
        Ok(Self { settings, api_key })
    }

    /// Read the credential from the process environment.
    /// Fails fast so a missing key never surfaces as a late service error.
    pub fn from_env(settings: FactorySettings) -> Result<Self, ForgeError> {
        Self::from_lookup(settings, |name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(
        settings: FactorySettings,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ForgeError> {
        let key = API_KEY_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                ForgeError::Configuration(format!(
                    "no API key found; set {}",
                    API_KEY_VARS.join(" or ")
                ))
            })?;
        Self::new(settings, ApiKey::new(key)?)
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_configuration_error() {
        let err = ForgeConfig::from_lookup(FactorySettings::default(), |_| None).unwrap_err();
        assert!(matches!(err, ForgeError::Configuration(_)));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_blank_key_falls_through_to_next_var() {
        let config = ForgeConfig::from_lookup(FactorySettings::default(), |name| match name {
            "GEMINI_API_KEY" => Some("   ".to_string()),
            "API_KEY" => Some("k-123".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.api_key().expose(), "k-123");
    }

    #[test]
    fn test_api_key_is_redacted() {
        let key = ApiKey::new("super-secret").unwrap();
        assert_eq!(format!("{:?}", key), "ApiKey(***)");
    }

    #[test]
    fn test_zero_audit_attempts_rejected() {
        let settings = FactorySettings {
            max_audit_attempts: 0,
            ..FactorySettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ForgeError::Configuration(_))
        ));
    }

    #[test]
    fn test_partial_settings_file_uses_defaults() {
        let json = r#"{"max_audit_attempts": 3, "on_audit_exhausted": "proceed"}"#;
        let settings: FactorySettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.max_audit_attempts, 3);
        assert_eq!(settings.on_audit_exhausted, AuditExhaustionPolicy::Proceed);
        assert_eq!(settings.deploy_domain, "vercel.app");
        assert_eq!(settings.market, DEFAULT_MARKET);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "Proceed".parse::<AuditExhaustionPolicy>(),
            Ok(AuditExhaustionPolicy::Proceed)
        );
        assert!("maybe".parse::<AuditExhaustionPolicy>().is_err());
    }
}
