use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::config::loader::deserialize_non_empty_string;
use crate::error::{CommonError, CommonResult};

const DEFAULT_CONFIG: &str = include_str!("default.toml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub driver: DriverConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> CommonResult<Self> {
        Self::load_from(Figment::from(Toml::string(DEFAULT_CONFIG)))
    }

    /// Loads the configuration with the given TOML text layered
    /// between the defaults and the environment.
    pub fn load_with(overrides: &str) -> CommonResult<Self> {
        Self::load_from(
            Figment::from(Toml::string(DEFAULT_CONFIG)).admerge(Toml::string(overrides)),
        )
    }

    fn load_from(figment: Figment) -> CommonResult<Self> {
        figment
            .admerge(Env::prefixed("BQ__").map(|p| p.as_str().replace("__", ".").into()))
            .extract()
            .map_err(|e| CommonError::InvalidArgument(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(deserialize_with = "deserialize_non_empty_string")]
    pub project_id: Option<String>,
    #[serde(deserialize_with = "deserialize_non_empty_string")]
    pub dataset: Option<String>,
    pub string_fallback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_filter: String,
    pub export_traces: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_config() -> CommonResult<()> {
        let config = AppConfig::load_with("")?;
        assert_eq!(config.driver.project_id, None);
        assert_eq!(config.driver.dataset, None);
        assert!(config.driver.string_fallback);
        assert_eq!(config.telemetry.log_filter, "info");
        assert!(!config.telemetry.export_traces);
        Ok(())
    }

    #[test]
    fn test_load_config_overrides() -> CommonResult<()> {
        let config = AppConfig::load_with(
            r#"
            [driver]
            project_id = "analytics"
            dataset = "events"
            string_fallback = false
            "#,
        )?;
        assert_eq!(config.driver.project_id.as_deref(), Some("analytics"));
        assert_eq!(config.driver.dataset.as_deref(), Some("events"));
        assert!(!config.driver.string_fallback);
        Ok(())
    }

    #[test]
    fn test_load_invalid_config() {
        let result = AppConfig::load_with(
            r#"
            [driver]
            string_fallback = "sometimes"
            "#,
        );
        assert!(matches!(result, Err(CommonError::InvalidArgument(_))));
    }
}
