//! In-process change feeds with owned subscription handles.
//!
//! DESIGN
//! ======
//! A `Feed` wraps a `tokio::sync::broadcast` channel. Consumers hold a
//! `Subscription`; the subscription is the only way to receive events and
//! it unsubscribes when released or dropped, so a torn-down consumer can
//! never act on a later event.
//!
//! TRADE-OFFS
//! ==========
//! Slow subscribers that fall more than `capacity` events behind skip the
//! missed events instead of applying back-pressure to publishers. `next`
//! logs and moves on; consumers that cannot afford a gap use `recv` and
//! handle `Delivery::Missed` themselves.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

pub const DEFAULT_FEED_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct Feed<T: Clone> {
    tx: broadcast::Sender<T>,
}

impl<T: Clone + Send + 'static> Feed<T> {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Deliver `event` to every live subscription. Returns how many
    /// subscriptions received it.
    pub fn publish(&self, event: T) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    #[must_use]
    pub fn subscribe(&self) -> Subscription<T> {
        Subscription { rx: self.tx.subscribe() }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T: Clone + Send + 'static> Default for Feed<T> {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

/// One receive attempt on a [`Subscription`].
#[derive(Debug, PartialEq, Eq)]
pub enum Delivery<T> {
    Event(T),
    /// The subscription fell behind and this many events were dropped.
    Missed(u64),
    Closed,
}

/// Owned handle on a feed. Events published before `subscribe` are not seen.
pub struct Subscription<T: Clone> {
    rx: broadcast::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    /// Next delivery, reporting gaps instead of skipping over them.
    pub async fn recv(&mut self) -> Delivery<T> {
        match self.rx.recv().await {
            Ok(event) => Delivery::Event(event),
            Err(RecvError::Lagged(skipped)) => Delivery::Missed(skipped),
            Err(RecvError::Closed) => Delivery::Closed,
        }
    }

    /// Next event, or `None` once every publisher is gone.
    pub async fn next(&mut self) -> Option<T> {
        loop {
            match self.recv().await {
                Delivery::Event(event) => return Some(event),
                Delivery::Missed(skipped) => {
                    tracing::warn!(skipped, "subscription lagged; dropping missed events");
                }
                Delivery::Closed => return None,
            }
        }
    }

    /// Next event matching `keep`; non-matching events are discarded.
    pub async fn next_matching<F>(&mut self, mut keep: F) -> Option<T>
    where
        F: FnMut(&T) -> bool,
    {
        loop {
            let event = self.next().await?;
            if keep(&event) {
                return Some(event);
            }
        }
    }

    /// Stop receiving. Equivalent to dropping, but explicit at call sites
    /// that tear down a consumer.
    pub fn release(self) {}
}

#[cfg(test)]
#[path = "feed_test.rs"]
mod tests;
