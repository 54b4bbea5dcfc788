use thiserror::Error;

use super::models::Config;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("pool.workers must be at least 1")]
    NoWorkers,

    #[error("queue.capacity must be at least 1")]
    NoCapacity,

    #[error("engine.command must not be empty")]
    EmptyEngineCommand,

    #[error("media.public_url must end with '/': {0}")]
    BadPublicUrl(String),
}

pub fn validate(config: &Config) -> Result<(), ValidationError> {
    if config.pool.workers == 0 {
        return Err(ValidationError::NoWorkers);
    }

    if config.queue.capacity == 0 {
        return Err(ValidationError::NoCapacity);
    }

    if config.engine.command.as_os_str().is_empty() {
        return Err(ValidationError::EmptyEngineCommand);
    }

    // Result URLs are built by plain concatenation with the result filename.
    if !config.media.public_url.ends_with('/') {
        return Err(ValidationError::BadPublicUrl(
            config.media.public_url.clone(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = Config::default();
        config.queue.capacity = 0;
        assert!(matches!(
            validate(&config).unwrap_err(),
            ValidationError::NoCapacity
        ));
    }

    #[test]
    fn test_public_url_must_be_prefix() {
        let mut config = Config::default();
        config.media.public_url = "/media_result".to_string();
        assert!(matches!(
            validate(&config).unwrap_err(),
            ValidationError::BadPublicUrl(_)
        ));
    }
}
