//! Generic consume loop shared by every topic subscriber.
//!
//! A [`TopicConsumer`] drains one [`Subscription`] on a spawned task and hands
//! each event to an [`EventHandler`]. The loop runs until the shared
//! [`CancellationToken`] fires (the subscription is then closed) or until the
//! bus goes away. Handler failures are logged and never stop the loop.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bus::Subscription;
use crate::event::Event;

/// Error returned by an [`EventHandler`]; logged by the consumer, never
/// propagated.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Per-event processing hook run by a [`TopicConsumer`].
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    /// Short name used in log lines, e.g. `"history"`.
    fn name(&self) -> &'static str;

    /// Process a single event.
    async fn handle(&self, event: &Event) -> Result<(), HandlerError>;
}

/// Lifecycle of a consume loop. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumerState {
    Running,
    Stopped,
}

// ---------------------------------------------------------------------------
// TopicConsumer
// ---------------------------------------------------------------------------

/// Drains one subscription into one handler.
pub struct TopicConsumer<H> {
    subscription: Subscription,
    handler: H,
}

impl<H: EventHandler> TopicConsumer<H> {
    pub fn new(subscription: Subscription, handler: H) -> Self {
        Self {
            subscription,
            handler,
        }
    }

    /// Spawn the consume loop and return immediately.
    pub fn start(self, cancel: CancellationToken) -> ConsumerHandle {
        let name = self.handler.name();
        let (state_tx, state_rx) = watch::channel(ConsumerState::Running);
        tracing::info!(consumer = name, topic = %self.subscription.topic(), "Consumer starting");

        let task = tokio::spawn(async move {
            self.run(cancel).await;
            state_tx.send_replace(ConsumerState::Stopped);
        });

        ConsumerHandle {
            status: ConsumerStatus {
                name,
                state: state_rx,
            },
            task,
        }
    }

    async fn run(mut self, cancel: CancellationToken) {
        let name = self.handler.name();
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.subscription.close();
                    tracing::info!(consumer = name, "Consumer stopped");
                    break;
                }
                received = self.subscription.recv() => match received {
                    Some(event) => {
                        tracing::debug!(
                            consumer = name,
                            event_type = %event.event_type(),
                            time = %event.time(),
                            user = ?event.user(),
                            "Received event"
                        );
                        if let Err(e) = self.handler.handle(&event).await {
                            tracing::error!(
                                consumer = name,
                                error = %e,
                                event_type = %event.event_type(),
                                "Failed to handle event"
                            );
                        }
                    }
                    None => {
                        tracing::info!(consumer = name, "Subscription closed, consumer shutting down");
                        break;
                    }
                },
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ConsumerHandle
// ---------------------------------------------------------------------------

/// Read-only view of a consume loop's state. Cheap to clone and outlives
/// the [`ConsumerHandle`] it came from.
#[derive(Debug, Clone)]
pub struct ConsumerStatus {
    name: &'static str,
    state: watch::Receiver<ConsumerState>,
}

impl ConsumerStatus {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> ConsumerState {
        *self.state.borrow()
    }
}

/// Owns a spawned consume loop.
pub struct ConsumerHandle {
    status: ConsumerStatus,
    task: JoinHandle<()>,
}

impl ConsumerHandle {
    pub fn name(&self) -> &'static str {
        self.status.name
    }

    pub fn state(&self) -> ConsumerState {
        self.status.state()
    }

    pub fn is_stopped(&self) -> bool {
        self.state() == ConsumerState::Stopped
    }

    /// A status view for observers such as health checks.
    pub fn status(&self) -> ConsumerStatus {
        self.status.clone()
    }

    /// Wait up to `timeout` for the loop to finish.
    ///
    /// Returns `true` if the consumer reached [`ConsumerState::Stopped`].
    pub async fn stopped(self, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, self.task).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::error!(consumer = self.status.name, error = %e, "Consumer task failed");
                true
            }
            Err(_) => {
                tracing::warn!(consumer = self.status.name, "Consumer did not stop within the shutdown timeout");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
