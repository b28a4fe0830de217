use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Invalid email address: {0}")]
    InvalidAddress(#[from] lettre::address::AddressError),
    #[error("Invalid email message: {0}")]
    InvalidMessage(#[from] lettre::error::Error),
    #[error("Failed to send email: {0}")]
    FailedToSend(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait SendEmail: Send + Sync + fmt::Debug {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

/// Delivers plain-text mail through an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpMailer").field("from", &self.from).finish()
    }
}

impl SmtpMailer {
    /// Returns `None` when no relay host is configured.
    ///
    /// With credentials the connection is upgraded with STARTTLS; without them
    /// the relay is used in plain text, which only suits a local catcher.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>, EmailError> {
        let Some(host) = config.email_host.as_deref() else {
            return Ok(None);
        };

        let builder = match (&config.email_user, &config.email_pass) {
            (Some(user), Some(pass)) => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
                .credentials(Credentials::new(user.clone(), pass.clone())),
            _ => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
        };

        Ok(Some(Self {
            transport: builder.port(config.email_port).build(),
            from: config.email_from.parse()?,
        }))
    }
}

#[async_trait]
impl SendEmail for SmtpMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(message.to.parse::<Mailbox>()?)
            .subject(message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.body)?;

        self.transport.send(email).await?;
        info!("Email sent to {}", message.to);
        Ok(())
    }
}

/// Stand-in used when SMTP is not configured; the message is only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl SendEmail for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        warn!(
            "Email delivery disabled, dropping '{}' for {}",
            message.subject, message.to
        );
        debug!("Dropped email body: {}", message.body);
        Ok(())
    }
}
