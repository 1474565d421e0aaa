//! SMTP delivery through `lettre`

use super::{MailTransport, NotifyError, OutgoingMail, SmtpSettings};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

/// STARTTLS relay with login credentials
///
/// `lettre`'s SMTP transport is blocking, so each send runs on the blocking
/// thread pool.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: SmtpTransport,
}

impl SmtpMailer {
    pub fn new(settings: SmtpSettings) -> Result<Self, NotifyError> {
        let credentials = Credentials::new(settings.sender, settings.password);
        let transport = SmtpTransport::starttls_relay(&settings.server)?
            .port(settings.port)
            .credentials(credentials)
            .build();

        Ok(Self { transport })
    }
}

fn build_message(mail: OutgoingMail) -> Result<Message, NotifyError> {
    let from: Mailbox = mail.from.parse()?;
    let to: Mailbox = mail.to.parse()?;

    Ok(Message::builder()
        .from(from)
        .to(to)
        .subject(mail.subject)
        .header(ContentType::TEXT_HTML)
        .body(mail.html_body)?)
}

impl MailTransport for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), NotifyError> {
        let message = build_message(mail)?;
        let transport = self.transport.clone();

        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| NotifyError::Task(e.to_string()))??;

        Ok(())
    }
}
