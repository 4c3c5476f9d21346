//! Event distribution and asynchronous persistence pipeline.
//!
//! - [`EventBus`]: in-process topic broker with rendezvous delivery.
//! - [`Event`]: the immutable event envelope with a typed [`EventData`] payload.
//! - [`TopicConsumer`]: the consume loop shared by every subscriber.
//! - [`HistoryWriter`]: persists the `history` topic through a [`HistoryStore`].
//! - [`NotificationDispatcher`]: evaluates the `notification` topic.
//! - [`Mailer`]: transactional email that reports sends to the history topic.

pub mod bus;
pub mod consumer;
pub mod event;
pub mod history;
pub mod mail;
pub mod notification;

pub use bus::{EventBus, Subscription};
pub use consumer::{
    ConsumerHandle, ConsumerState, ConsumerStatus, EventHandler, HandlerError, TopicConsumer,
};
pub use event::{CustomData, EmailData, Event, EventData};
pub use history::{HistoryError, HistoryStore, HistoryWriter, PgHistoryStore};
pub use mail::{MailConfig, MailError, Mailer, SendRequest};
pub use notification::NotificationDispatcher;
