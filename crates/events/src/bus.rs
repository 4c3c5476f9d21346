//! In-process topic broker.
//!
//! [`EventBus`] routes each published [`Event`] to every subscriber of the
//! topic it was published on. Delivery is a rendezvous: a subscriber channel
//! holds at most one pending delivery, and [`EventBus::publish`] does not
//! return until every live subscriber has taken the event out of its channel.
//! A slow subscriber therefore throttles every producer on its topic.
//!
//! The bus is an ordinary value; share it via `Arc<EventBus>`.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot, RwLock};

use crate::event::Event;

/// One pending hand-off: the event plus the acknowledgement the publisher
/// is waiting on.
struct Delivery {
    event: Event,
    taken: oneshot::Sender<()>,
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Receiving end of a topic subscription.
///
/// Events arrive in publication order for the topic.
pub struct Subscription {
    topic: String,
    receiver: mpsc::Receiver<Delivery>,
}

impl Subscription {
    /// The topic this subscription is attached to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next event.
    ///
    /// Taking the event releases the publisher blocked on it. Returns `None`
    /// once the subscription is closed or the bus has been dropped.
    pub async fn recv(&mut self) -> Option<Event> {
        let delivery = self.receiver.recv().await?;
        // The publisher may have given up waiting; the event is still ours.
        let _ = delivery.taken.send(());
        Some(delivery.event)
    }

    /// Close the channel so no further events can be received.
    ///
    /// A delivery still sitting in the channel is discarded without being
    /// acknowledged, which releases its publisher.
    pub fn close(&mut self) {
        self.receiver.close();
        while let Ok(discarded) = self.receiver.try_recv() {
            tracing::debug!(
                topic = %self.topic,
                event_type = %discarded.event.event_type(),
                "Discarding undelivered event on close"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Topic-based publish/subscribe router with rendezvous delivery.
#[derive(Default)]
pub struct EventBus {
    topics: RwLock<HashMap<String, Vec<mpsc::Sender<Delivery>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber on `topic`.
    ///
    /// Every event published to the topic after this call is delivered to
    /// the returned subscription, independently of other subscribers.
    pub async fn subscribe(&self, topic: &str) -> Subscription {
        let (sender, receiver) = mpsc::channel(1);
        self.topics
            .write()
            .await
            .entry(topic.to_string())
            .or_default()
            .push(sender);
        tracing::debug!(topic, "Subscriber registered");
        Subscription {
            topic: topic.to_string(),
            receiver,
        }
    }

    /// Deliver `event` to every current subscriber of `topic`.
    ///
    /// Subscribers are served one after another in subscription order, and
    /// this call suspends until each has taken the event. With no
    /// subscribers the event is dropped. Closed subscribers are skipped and
    /// pruned.
    pub async fn publish(&self, event: Event, topic: &str) {
        let subscribers = match self.topics.read().await.get(topic) {
            Some(subscribers) if !subscribers.is_empty() => subscribers.clone(),
            _ => {
                tracing::trace!(topic, event_type = %event.event_type(), "No subscribers, event dropped");
                return;
            }
        };

        let mut saw_closed = false;
        for subscriber in &subscribers {
            let (taken, taken_rx) = oneshot::channel();
            let delivery = Delivery {
                event: event.clone(),
                taken,
            };
            if subscriber.send(delivery).await.is_err() || taken_rx.await.is_err() {
                saw_closed = true;
            }
        }

        if saw_closed {
            self.prune(topic).await;
        }
    }

    /// Number of live subscribers on `topic`, pruning closed ones.
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.prune(topic).await;
        self.topics.read().await.get(topic).map_or(0, Vec::len)
    }

    async fn prune(&self, topic: &str) {
        let mut topics = self.topics.write().await;
        if let Some(subscribers) = topics.get_mut(topic) {
            subscribers.retain(|s| !s.is_closed());
            if subscribers.is_empty() {
                topics.remove(topic);
                tracing::debug!(topic, "Last subscriber gone, topic removed");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
