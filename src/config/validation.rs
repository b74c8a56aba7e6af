use crate::config::types::{Config, CourseConfig, CrawlerConfig, OutputConfig, SessionConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_course_config(&config.course)?;
    validate_session_config(&config.session)?;
    validate_output_config(&config.output)?;
    validate_crawler_config(&config.crawler)?;
    Ok(())
}

/// Validates the course section
fn validate_course_config(config: &CourseConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", config.base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' has no host",
            config.base_url
        )));
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must not carry a query or fragment",
            config.base_url
        )));
    }

    if config.course_id == 0 {
        return Err(ConfigError::Validation(
            "course-id must be a positive number".to_string(),
        ));
    }

    Ok(())
}

/// Validates the session cookie
fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.cookie_name.is_empty() {
        return Err(ConfigError::Validation(
            "cookie-name cannot be empty".to_string(),
        ));
    }

    if config
        .cookie_name
        .chars()
        .any(|c| c.is_whitespace() || c == '=' || c == ';')
    {
        return Err(ConfigError::Validation(format!(
            "cookie-name '{}' contains characters not allowed in a cookie name",
            config.cookie_name
        )));
    }

    if config.cookie_value.contains(';') {
        return Err(ConfigError::Validation(
            "cookie-value cannot contain ';'".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect-timeout-secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.content_class.is_empty() || config.content_class.contains(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "content-class must be a single class name, got '{}'",
            config.content_class
        )));
    }

    Ok(())
}
