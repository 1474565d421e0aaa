use serde::Deserialize;

/// Main configuration structure for Jobtide
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "site")]
    pub sites: Vec<SiteConfig>,
    #[serde(default)]
    pub notifier: Option<NotifierConfig>,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Search terms, crawled in order
    pub keywords: Vec<String>,

    /// Number of result pages requested per site per keyword
    #[serde(rename = "pages-per-site")]
    pub pages_per_site: u32,

    /// Pause between keywords (milliseconds)
    #[serde(rename = "politeness-delay-ms", default = "default_politeness_delay_ms")]
    pub politeness_delay_ms: u64,

    /// Wait after a page opens so client-side rendering can finish (milliseconds)
    #[serde(rename = "settle-delay-ms", default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Wait between two pages of the same keyword (milliseconds)
    #[serde(rename = "page-delay-ms", default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Maximum number of render sessions open at once across all sites
    #[serde(rename = "max-concurrent-sessions", default = "default_max_concurrent_sessions")]
    pub max_concurrent_sessions: u32,

    /// Navigation timeout for a single page (seconds)
    #[serde(rename = "fetch-timeout-secs", default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Which render engine drives the pages
    #[serde(default)]
    pub engine: EngineKind,
}

fn default_politeness_delay_ms() -> u64 {
    2000
}

fn default_settle_delay_ms() -> u64 {
    2000
}

fn default_page_delay_ms() -> u64 {
    1000
}

fn default_max_concurrent_sessions() -> u32 {
    1
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

/// Render engine selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Plain HTTP fetch of the server-rendered HTML
    #[default]
    Http,
    /// Headless Chromium (requires the `browser` feature)
    Browser,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Directory that CSV exports are written to
    #[serde(rename = "export-dir", default = "default_export_dir")]
    pub export_dir: String,
}

fn default_export_dir() -> String {
    ".".to_string()
}

/// A listing site to crawl, registered in file order
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Adapter name (e.g., "saramin" or "jobkorea")
    pub name: String,

    /// Overrides the adapter's origin, e.g. to point at a mirror
    #[serde(rename = "base-url", default)]
    pub base_url: Option<String>,
}

/// Email digest configuration
///
/// Credentials are optional here; a notifier built from an incomplete
/// section reports `ConfigError::MissingCredential` and is skipped.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(rename = "smtp-server", default = "default_smtp_server")]
    pub smtp_server: String,

    #[serde(rename = "smtp-port", default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(rename = "sender-email", default)]
    pub sender_email: Option<String>,

    #[serde(rename = "receiver-email", default)]
    pub receiver_email: Option<String>,

    /// Name of the environment variable holding the SMTP password
    #[serde(rename = "password-env", default = "default_password_env")]
    pub password_env: String,
}

fn default_true() -> bool {
    true
}

fn default_smtp_server() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_password_env() -> String {
    "JOBTIDE_SMTP_PASSWORD".to_string()
}
