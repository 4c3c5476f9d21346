//! Outbound mail transport.
//!
//! [`MailTransport`] is the single point where an email can fail to leave the
//! process. [`SmtpMailTransport`] wraps lettre's async SMTP client.

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::config::MailConfig;

/// Port on which the relay expects implicit TLS instead of STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// The transport refused the message for a non-SMTP reason.
    #[error("Mail transport rejected the message: {0}")]
    Rejected(String),
}

/// Delivers a fully built message.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: Message) -> Result<(), TransportError>;
}

/// SMTP relay transport.
pub struct SmtpMailTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    /// Build a transport for the configured relay.
    ///
    /// Returns `Ok(None)` when no SMTP host is configured.
    pub fn from_config(config: &MailConfig) -> Result<Option<Self>, TransportError> {
        let Some(host) = config.smtp_host.as_deref() else {
            return Ok(None);
        };

        let builder = if config.smtp_port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
        };
        let mut builder = builder.port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Some(Self {
            inner: builder.build(),
        }))
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, message: Message) -> Result<(), TransportError> {
        self.inner.send(message).await?;
        Ok(())
    }
}
