//! Email notifications for newly saved postings
//!
//! The notifier sits downstream of the crawl: it receives the records a run
//! inserted, renders them with the pure functions in [`render`], and hands
//! the message to a [`MailTransport`]. Delivery problems are reported as a
//! [`DeliveryStatus`] and never bubble up into the crawl.

pub mod render;
mod smtp;

pub use render::{digest_subject, render_daily_summary, render_digest, summary_subject};
pub use smtp::SmtpMailer;

use crate::config::NotifierConfig;
use crate::models::JobRecord;
use crate::output::JobStatistics;
use crate::{ConfigError, ConfigResult};
use chrono::{DateTime, Utc};
use std::fmt;
use std::future::Future;
use thiserror::Error;

/// How many companies the daily summary names
pub const SUMMARY_TOP_COMPANIES: usize = 5;

const CHANNEL: &str = "email";

/// Errors raised while building or delivering a message
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Notifier configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Delivery task failed: {0}")]
    Task(String),
}

/// Result of one delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    Skipped,
    Failed,
}

/// What happened to a notification
#[derive(Debug, Clone)]
pub struct DeliveryStatus {
    pub outcome: DeliveryOutcome,
    /// Channel that delivered (or failed to deliver) the notification
    pub channel: String,
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl DeliveryStatus {
    pub fn sent(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DeliveryOutcome::Sent, channel, Some(message.into()))
    }

    pub fn skipped(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DeliveryOutcome::Skipped, channel, Some(message.into()))
    }

    pub fn failed(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DeliveryOutcome::Failed, channel, Some(message.into()))
    }

    fn new(outcome: DeliveryOutcome, channel: impl Into<String>, message: Option<String>) -> Self {
        Self {
            outcome,
            channel: channel.into(),
            message,
            timestamp: Utc::now(),
        }
    }

    pub fn is_sent(&self) -> bool {
        self.outcome == DeliveryOutcome::Sent
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.outcome {
            DeliveryOutcome::Sent => "SENT",
            DeliveryOutcome::Skipped => "SKIPPED",
            DeliveryOutcome::Failed => "FAILED",
        };
        write!(f, "[{status}] {}", self.channel)?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

/// A rendered HTML message ready for a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Delivers rendered messages
pub trait MailTransport: Send + Sync {
    fn send(&self, mail: OutgoingMail) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Everything needed to talk to the SMTP relay
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub sender: String,
    pub receiver: String,
    pub password: String,
}

/// Resolves notifier credentials, reading the password through `lookup`
///
/// # Returns
///
/// * `Ok(SmtpSettings)` - All credentials are present
/// * `Err(ConfigError::MissingCredential)` - Sender, receiver or password is absent
pub fn resolve_credentials<F>(config: &NotifierConfig, lookup: F) -> ConfigResult<SmtpSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let present = |value: Option<&String>| value.filter(|v| !v.trim().is_empty()).cloned();

    let sender = present(config.sender_email.as_ref())
        .ok_or_else(|| ConfigError::MissingCredential("sender-email".to_string()))?;
    let receiver = present(config.receiver_email.as_ref())
        .ok_or_else(|| ConfigError::MissingCredential("receiver-email".to_string()))?;
    let password = present(lookup(config.password_env.as_str()).as_ref())
        .ok_or_else(|| ConfigError::MissingCredential(config.password_env.clone()))?;

    Ok(SmtpSettings {
        server: config.smtp_server.clone(),
        port: config.smtp_port,
        sender,
        receiver,
        password,
    })
}

/// Sends digests of new postings through a transport
pub struct Notifier<T> {
    transport: T,
    sender: String,
    receiver: String,
}

impl Notifier<SmtpMailer> {
    /// Builds an SMTP notifier, reading the password from the environment
    pub fn from_config(config: &NotifierConfig) -> Result<Self, NotifyError> {
        let settings = resolve_credentials(config, |name| std::env::var(name).ok())?;
        Self::from_settings(settings)
    }

    pub fn from_settings(settings: SmtpSettings) -> Result<Self, NotifyError> {
        let sender = settings.sender.clone();
        let receiver = settings.receiver.clone();
        let mailer = SmtpMailer::new(settings)?;
        Ok(Self::new(mailer, sender, receiver))
    }
}

impl<T: MailTransport> Notifier<T> {
    pub fn new(transport: T, sender: impl Into<String>, receiver: impl Into<String>) -> Self {
        Self {
            transport,
            sender: sender.into(),
            receiver: receiver.into(),
        }
    }

    /// Emails a digest of `records`; nothing is sent for an empty slice
    pub async fn notify_new_jobs(&self, records: &[JobRecord]) -> DeliveryStatus {
        if records.is_empty() {
            tracing::info!("No new jobs to send");
            return DeliveryStatus::skipped(CHANNEL, "no new jobs");
        }

        let subject = digest_subject(records.len());
        let body = render_digest(records);
        self.deliver(subject, body, format!("{} jobs", records.len()))
            .await
    }

    /// Emails the daily summary built from `stats`
    pub async fn send_daily_summary(&self, stats: &JobStatistics, new: u64) -> DeliveryStatus {
        let top = stats.top_company_names(SUMMARY_TOP_COMPANIES);
        let body = render_daily_summary(stats.total, new, &top);
        self.deliver(summary_subject(new), body, "daily summary".to_string())
            .await
    }

    async fn deliver(&self, subject: String, html_body: String, what: String) -> DeliveryStatus {
        let mail = OutgoingMail {
            from: self.sender.clone(),
            to: self.receiver.clone(),
            subject,
            html_body,
        };

        match self.transport.send(mail).await {
            Ok(()) => {
                tracing::info!("Email ({}) sent to {}", what, self.receiver);
                DeliveryStatus::sent(CHANNEL, format!("{} sent to {}", what, self.receiver))
            }
            Err(e) => {
                tracing::error!("Error sending email ({}): {}", what, e);
                DeliveryStatus::failed(CHANNEL, e.to_string())
            }
        }
    }
}
