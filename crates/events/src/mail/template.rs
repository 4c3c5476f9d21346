//! Embedded HTML email templates.
//!
//! Templates use `{{name}}` placeholders. Every placeholder must have a value
//! at render time; values are HTML-escaped before substitution.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;

/// Account e-mail confirmation template name.
pub const CONFIRMATION: &str = "confirmation";

/// Password reset template name.
pub const PASSWORD_RESET: &str = "passwordreset";

const CONFIRMATION_SOURCE: &str = include_str!("templates/confirmation.html");
const PASSWORD_RESET_SOURCE: &str = include_str!("templates/passwordreset.html");

/// Regex pattern matching `{{placeholder}}` tokens.
const PLACEHOLDER_PATTERN: &str = r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\}\}";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PLACEHOLDER_PATTERN).expect("valid regex"));

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template {template} has no value for placeholder {name}")]
    MissingValue { template: String, name: String },
}

/// Values substituted into a template.
#[derive(Debug, Clone, Default)]
pub struct TemplateData {
    values: BTreeMap<String, String>,
}

impl TemplateData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

/// A named email body template.
#[derive(Debug, Clone)]
pub struct EmailTemplate {
    name: String,
    source: String,
}

impl EmailTemplate {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Substitute every placeholder with its escaped value.
    pub fn render(&self, data: &TemplateData) -> Result<String, TemplateError> {
        let mut rendered = String::with_capacity(self.source.len());
        let mut last = 0;

        for caps in PLACEHOLDER_RE.captures_iter(&self.source) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = data
                .values
                .get(name.as_str())
                .ok_or_else(|| TemplateError::MissingValue {
                    template: self.name.clone(),
                    name: name.as_str().to_string(),
                })?;
            rendered.push_str(&self.source[last..whole.start()]);
            rendered.push_str(&escape_html(value));
            last = whole.end();
        }
        rendered.push_str(&self.source[last..]);

        Ok(rendered)
    }
}

/// Templates available to the mailer, by name.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, EmailTemplate>,
}

impl TemplateRegistry {
    /// Registry holding the confirmation and password reset templates.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        registry.register(CONFIRMATION, CONFIRMATION_SOURCE);
        registry.register(PASSWORD_RESET, PASSWORD_RESET_SOURCE);
        registry
    }

    /// Add or replace a template.
    pub fn register(&mut self, name: impl Into<String>, source: impl Into<String>) {
        let template = EmailTemplate::new(name, source);
        self.templates.insert(template.name.clone(), template);
    }

    pub fn get(&self, name: &str) -> Option<&EmailTemplate> {
        self.templates.get(name)
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
