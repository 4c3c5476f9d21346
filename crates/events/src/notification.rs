//! Event-triggered user notifications.
//!
//! [`NotificationDispatcher`] consumes the `notification` topic and decides,
//! per event type, whether a follow-up notification is due. No event type
//! has a notification rule yet, so every event resolves to "no action".

use async_trait::async_trait;
use microsaas_core::topics::NOTIFICATION_TOPIC;
use tokio_util::sync::CancellationToken;

use crate::bus::EventBus;
use crate::consumer::{ConsumerHandle, EventHandler, HandlerError, TopicConsumer};
use crate::event::{Event, EventData};

/// Dispatches notifications for events on the `notification` topic.
#[derive(Debug, Default)]
pub struct NotificationDispatcher;

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Subscribe to the notification topic and spawn the dispatcher loop.
    pub async fn start(bus: &EventBus, cancel: CancellationToken) -> ConsumerHandle {
        let subscription = bus.subscribe(NOTIFICATION_TOPIC).await;
        TopicConsumer::new(subscription, Self::new()).start(cancel)
    }

    /// Evaluate a single event. Unknown types are not an error.
    pub async fn dispatch(&self, event: &Event) -> Result<(), HandlerError> {
        match event.data() {
            EventData::EmailSent(_) | EventData::Other(_) => {
                tracing::trace!(event_type = %event.event_type(), "No notification rule for event type");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl EventHandler for NotificationDispatcher {
    fn name(&self) -> &'static str {
        "notification"
    }

    async fn handle(&self, event: &Event) -> Result<(), HandlerError> {
        self.dispatch(event).await
    }
}
