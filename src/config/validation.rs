use crate::adapters::KNOWN_SITES;
use crate::config::types::{Config, CrawlerConfig, NotifierConfig, SiteConfig, UserAgentConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Upper bound on result pages per site per keyword
const MAX_PAGES_PER_SITE: u32 = 50;

/// Upper bound on settle and page delays (milliseconds)
const MAX_PAGE_DELAY_MS: u64 = 60_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_sites(&config.sites)?;
    if let Some(notifier) = &config.notifier {
        validate_notifier_config(notifier)?;
    }
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.keywords.is_empty() {
        return Err(ConfigError::Validation(
            "keywords must contain at least one search term".to_string(),
        ));
    }

    if config.keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "keywords cannot contain blank entries".to_string(),
        ));
    }

    if config.pages_per_site < 1 || config.pages_per_site > MAX_PAGES_PER_SITE {
        return Err(ConfigError::Validation(format!(
            "pages_per_site must be between 1 and {}, got {}",
            MAX_PAGES_PER_SITE, config.pages_per_site
        )));
    }

    for (name, value) in [
        ("settle_delay_ms", config.settle_delay_ms),
        ("page_delay_ms", config.page_delay_ms),
    ] {
        if value > MAX_PAGE_DELAY_MS {
            return Err(ConfigError::Validation(format!(
                "{} must be <= {}ms, got {}ms",
                name, MAX_PAGE_DELAY_MS, value
            )));
        }
    }

    if config.max_concurrent_sessions < 1 || config.max_concurrent_sessions > 16 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_sessions must be between 1 and 16, got {}",
            config.max_concurrent_sessions
        )));
    }

    if config.fetch_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "fetch_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email("contact_email", &config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.export_dir.is_empty() {
        return Err(ConfigError::Validation(
            "export_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the site list: known adapters, no duplicates, parseable overrides
fn validate_sites(sites: &[SiteConfig]) -> Result<(), ConfigError> {
    if sites.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[site]] must be configured".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for site in sites {
        let name = site.name.to_ascii_lowercase();

        if !KNOWN_SITES.contains(&name.as_str()) {
            return Err(ConfigError::UnknownSite(site.name.clone()));
        }

        if !seen.insert(name) {
            return Err(ConfigError::Validation(format!(
                "site '{}' is configured more than once",
                site.name
            )));
        }

        if let Some(base) = &site.base_url {
            let url = Url::parse(base).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid base-url '{}': {}", base, e))
            })?;

            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigError::Validation(format!(
                    "base-url '{}' must use http or https",
                    base
                )));
            }
        }
    }

    Ok(())
}

/// Validates notifier settings that do not depend on credentials
fn validate_notifier_config(config: &NotifierConfig) -> Result<(), ConfigError> {
    if config.smtp_server.trim().is_empty() {
        return Err(ConfigError::Validation(
            "smtp_server cannot be empty".to_string(),
        ));
    }

    if config.smtp_port == 0 {
        return Err(ConfigError::Validation(
            "smtp_port must be non-zero".to_string(),
        ));
    }

    if let Some(sender) = &config.sender_email {
        validate_email("sender_email", sender)?;
    }

    if let Some(receiver) = &config.receiver_email {
        validate_email("receiver_email", receiver)?;
    }

    Ok(())
}

/// Basic email validation
fn validate_email(field: &str, email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format for {}: '{}'",
            field, email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format for {}: '{}'",
            field, email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain for {}: '{}'",
            field, email
        )));
    }

    Ok(())
}
