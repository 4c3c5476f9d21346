//! Transactional email.
//!
//! [`Mailer`] renders a named template, hands the message to the configured
//! [`MailTransport`], and on success publishes an `email_sent` event to the
//! `history` topic. Without a configured transport every send is a logged
//! no-op that reports success, so a successful return only means the email
//! was accepted for processing, not that it was delivered.

pub mod config;
pub mod template;
pub mod transport;

use std::sync::Arc;

use lettre::message::header::ContentType;
use lettre::Message;
use microsaas_core::topics::HISTORY_TOPIC;
use microsaas_core::types::UserId;

use crate::bus::EventBus;
use crate::event::{EmailData, Event, EventData};

pub use config::{MailConfig, MailConfigError};
pub use template::{TemplateData, TemplateError, TemplateRegistry, CONFIRMATION, PASSWORD_RESET};
pub use transport::{MailTransport, SmtpMailTransport, TransportError};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("{0} template not found")]
    UnknownTemplate(String),

    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(#[from] lettre::error::Error),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

// ---------------------------------------------------------------------------
// SendRequest
// ---------------------------------------------------------------------------

/// A templated email to send.
#[derive(Debug, Clone)]
pub struct SendRequest {
    /// User the email concerns, recorded on the `email_sent` event.
    pub user: Option<UserId>,
    pub recipient: String,
    pub subject: String,
    /// Name of a registered template.
    pub template: String,
    pub data: TemplateData,
}

// ---------------------------------------------------------------------------
// Mailer
// ---------------------------------------------------------------------------

/// Sends templated emails and records them in the event history.
pub struct Mailer {
    config: MailConfig,
    transport: Option<Arc<dyn MailTransport>>,
    templates: TemplateRegistry,
    bus: Arc<EventBus>,
}

impl Mailer {
    /// Create a mailer with an explicit transport (or none).
    pub fn new(
        config: MailConfig,
        transport: Option<Arc<dyn MailTransport>>,
        bus: Arc<EventBus>,
    ) -> Self {
        if transport.is_none() {
            tracing::warn!("SMTP is not set up, e-mail sending functionality will not work correctly");
        }
        Self {
            config,
            transport,
            templates: TemplateRegistry::builtin(),
            bus,
        }
    }

    /// Create a mailer using the SMTP relay described by `config`, if any.
    pub fn from_config(config: MailConfig, bus: Arc<EventBus>) -> Result<Self, MailError> {
        let transport = SmtpMailTransport::from_config(&config)?
            .map(|t| Arc::new(t) as Arc<dyn MailTransport>);
        Ok(Self::new(config, transport, bus))
    }

    /// Register an additional template, replacing any with the same name.
    pub fn register_template(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.register(name, source);
    }

    /// Render and send a templated email.
    ///
    /// Template lookup and rendering happen before anything leaves the
    /// process. On a successful send exactly one `email_sent` event is
    /// published to the history topic; failures publish nothing.
    pub async fn send(&self, request: SendRequest) -> Result<(), MailError> {
        let template = self
            .templates
            .get(&request.template)
            .ok_or_else(|| MailError::UnknownTemplate(request.template.clone()))?;
        let body = template.render(&request.data)?;

        let Some(transport) = &self.transport else {
            tracing::warn!(template = %request.template, "SMTP is not set up, e-mail was not sent");
            return Ok(());
        };

        let message = Message::builder()
            .from(self.config.no_reply_address.parse()?)
            .to(request.recipient.parse()?)
            .subject(request.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(body.clone())?;

        transport.send(message).await?;
        tracing::info!(to = %request.recipient, template = %request.template, "Email sent");

        let event = Event::new(EventData::EmailSent(EmailData {
            from: self.config.no_reply_address.clone(),
            to: request.recipient,
            subject: request.subject,
            body,
        }))
        .with_user(request.user);
        self.bus.publish(event, HISTORY_TOPIC).await;

        Ok(())
    }

    /// Send the account e-mail confirmation message.
    pub async fn email_confirmation(
        &self,
        recipient: &str,
        confirmation_url: &str,
    ) -> Result<(), MailError> {
        self.send(self.link_request(recipient, "E-mail Confirmation", CONFIRMATION, confirmation_url))
            .await
    }

    /// Send the password reset message.
    pub async fn password_reset(&self, recipient: &str, reset_url: &str) -> Result<(), MailError> {
        self.send(self.link_request(recipient, "Password Reset", PASSWORD_RESET, reset_url))
            .await
    }

    fn link_request(&self, recipient: &str, subject: &str, template: &str, link: &str) -> SendRequest {
        SendRequest {
            user: None,
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            template: template.to_string(),
            data: TemplateData::new()
                .with("link", link)
                .with("app", self.config.application_name.as_str()),
        }
    }
}
