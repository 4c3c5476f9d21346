//! Well-known topic and event type names.
//!
//! Producers publish onto a topic by name and consumers subscribe by the same
//! name, so both sides must use these constants.

/// Events that are durably recorded in the per-user history.
pub const HISTORY_TOPIC: &str = "history";

/// Events evaluated for follow-up user notifications.
pub const NOTIFICATION_TOPIC: &str = "notification";

/// A transactional email was handed to the mail transport.
pub const EVENT_EMAIL_SENT: &str = "email_sent";
