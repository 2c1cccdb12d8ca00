//! Configuration validation.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are usable.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.batch.number == 0 {
            return Err(ConfigError::ValidationError(
                "batch.number must be > 0".into(),
            ));
        }
        let tools = [
            ("tools.hdr_engine", &self.tools.hdr_engine),
            ("tools.compositor", &self.tools.compositor),
            ("tools.align_helper", &self.tools.align_helper),
            ("tools.metadata_tool", &self.tools.metadata_tool),
            ("tools.identify", &self.tools.identify),
        ];
        for (key, value) in tools {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "{key} must not be empty"
                )));
            }
        }
        if self.log.path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "log.path must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_batch_number() {
        let mut config = Config::default();
        config.batch.number = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("batch.number"));
    }

    #[test]
    fn test_validate_rejects_empty_tool_name() {
        let mut config = Config::default();
        config.tools.compositor = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("tools.compositor"));
    }

    #[test]
    fn test_validate_rejects_empty_log_path() {
        let mut config = Config::default();
        config.log.path = Default::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log.path"));
    }
}
