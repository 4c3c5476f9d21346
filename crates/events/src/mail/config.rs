//! Mail configuration, read once at startup.

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `MAIL_NO_REPLY_ADDRESS` is not set.
const DEFAULT_NO_REPLY_ADDRESS: &str = "noreply@microsaas.local";

/// Default display name rendered into templates.
const DEFAULT_APPLICATION_NAME: &str = "MicroSaaS";

#[derive(Debug, thiserror::Error)]
pub enum MailConfigError {
    #[error("MAIL_SMTP_PORT must be a valid port number, got {0:?}")]
    InvalidPort(String),
}

/// Configuration of transactional email.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Display name of the application, available to templates as `app`.
    pub application_name: String,
    /// RFC 5322 "From" address of every outgoing email.
    pub no_reply_address: String,
    /// SMTP relay host. `None` disables sending.
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl MailConfig {
    /// Load configuration through a variable lookup, normally the process
    /// environment.
    ///
    /// | Variable                | Default                   |
    /// |-------------------------|---------------------------|
    /// | `APPLICATION_NAME`      | `MicroSaaS`               |
    /// | `MAIL_NO_REPLY_ADDRESS` | `noreply@microsaas.local` |
    /// | `MAIL_SMTP_ADDRESS`     | unset (sending disabled)  |
    /// | `MAIL_SMTP_PORT`        | `587`                     |
    /// | `MAIL_SMTP_USER`        | unset                     |
    /// | `MAIL_SMTP_PASSWORD`    | unset                     |
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MailConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let smtp_port = match var("MAIL_SMTP_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| MailConfigError::InvalidPort(raw))?,
            None => DEFAULT_SMTP_PORT,
        };

        Ok(Self {
            application_name: var("APPLICATION_NAME")
                .unwrap_or_else(|| DEFAULT_APPLICATION_NAME.to_string()),
            no_reply_address: var("MAIL_NO_REPLY_ADDRESS")
                .unwrap_or_else(|| DEFAULT_NO_REPLY_ADDRESS.to_string()),
            smtp_host: var("MAIL_SMTP_ADDRESS"),
            smtp_port,
            smtp_user: var("MAIL_SMTP_USER"),
            smtp_password: var("MAIL_SMTP_PASSWORD"),
        })
    }

    /// Whether an SMTP relay has been configured.
    pub fn is_configured(&self) -> bool {
        self.smtp_host.is_some()
    }
}
