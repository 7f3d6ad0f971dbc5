//! Per-topic event broadcaster.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{trace, warn};

use crate::event::{Event, EventPayload, Topic};
use crate::metrics::RealtimeMetrics;

/// Fan-out of events to the subscribers of each topic.
///
/// Each topic is a bounded `broadcast` ring: publishing is a non-blocking
/// push, every subscriber reads the topic in publish order, and a
/// subscriber that falls more than `buffer_size` events behind skips the
/// oldest ones.
#[derive(Debug)]
pub struct EventBroadcaster {
    topics: HashMap<Topic, broadcast::Sender<Arc<Event>>>,
    metrics: Arc<RealtimeMetrics>,
}

impl EventBroadcaster {
    /// Create a broadcaster with `buffer_size` slots per topic.
    pub fn new(buffer_size: usize) -> Self {
        let capacity = buffer_size.max(1);
        let topics = Topic::ALL
            .into_iter()
            .map(|topic| (topic, broadcast::channel(capacity).0))
            .collect();
        Self {
            topics,
            metrics: Arc::new(RealtimeMetrics::new()),
        }
    }

    /// Shared counters.
    pub fn metrics(&self) -> &Arc<RealtimeMetrics> {
        &self.metrics
    }

    /// Publish to every current subscriber of `topic`.
    ///
    /// Returns the number of subscribers the event was queued for; zero
    /// subscribers is not an error.
    pub fn publish(&self, topic: Topic, payload: EventPayload) -> usize {
        let Some(sender) = self.topics.get(&topic) else {
            return 0;
        };
        self.metrics.record_published();
        let event = Arc::new(Event::new(topic, payload));
        match sender.send(event) {
            Ok(receivers) => {
                trace!(topic = %topic, receivers, "Event published");
                receivers
            }
            Err(_) => 0,
        }
    }

    /// Start receiving events published to `topic` from now on.
    pub fn subscribe(&self, topic: Topic) -> Subscription {
        self.metrics.record_subscription();
        let receiver = match self.topics.get(&topic) {
            Some(sender) => sender.subscribe(),
            // All topics are created up front; this only guards the type.
            None => broadcast::channel(1).1,
        };
        Subscription {
            topic,
            receiver,
            dropped: 0,
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Number of subscribers currently attached to `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.topics
            .get(&topic)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

/// Receiving end of one topic.
#[derive(Debug)]
pub struct Subscription {
    topic: Topic,
    receiver: broadcast::Receiver<Arc<Event>>,
    dropped: u64,
    metrics: Arc<RealtimeMetrics>,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Events this subscriber lost to overflow.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Next event in publish order, skipping past overflowed ones.
    ///
    /// Returns `None` once the broadcaster is gone.
    pub async fn recv(&mut self) -> Option<Arc<Event>> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => self.note_lag(skipped),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    fn note_lag(&mut self, skipped: u64) {
        self.dropped += skipped;
        self.metrics.record_dropped(skipped);
        warn!(
            topic = %self.topic,
            skipped,
            total_dropped = self.dropped,
            "Subscriber lagging, oldest events dropped"
        );
    }
}
