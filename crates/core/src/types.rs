/// Users are identified by UUID across every table.
pub type UserId = uuid::Uuid;

/// Identifier of a single event envelope.
pub type EventId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
