use std::path::Path;

use crate::config::schema::ClientConfig;
use crate::error::ConfigError;

const MAX_PER_PAGE: u32 = 1000;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ClientConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<ClientConfig, ConfigError> {
    let mut config: ClientConfig = serde_json::from_str(content)?;

    // Trailing slashes would double up when joined with endpoint paths.
    config.api_base = config.api_base.trim().trim_end_matches('/').to_string();

    validate_config(&config)?;

    Ok(config)
}

pub(crate) fn validate_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if !(config.api_base.starts_with("http://") || config.api_base.starts_with("https://")) {
        return Err(ConfigError::Validation {
            message: format!(
                "api_base must be an http(s) URL, got '{}'",
                config.api_base
            ),
        });
    }

    if config.per_page == 0 || config.per_page > MAX_PER_PAGE {
        return Err(ConfigError::Validation {
            message: format!(
                "per_page must be between 1 and {}, got {}",
                MAX_PER_PAGE, config.per_page
            ),
        });
    }

    if config.poll_interval_ms == 0 {
        return Err(ConfigError::Validation {
            message: "poll_interval_ms must be greater than zero".to_string(),
        });
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "request_timeout_secs must be greater than zero".to_string(),
        });
    }

    Ok(())
}
