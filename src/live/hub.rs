//! Per-session fan-out.
//!
//! One `tokio::sync::broadcast` channel per join code. Receivers that fall
//! behind skip messages (`RecvError::Lagged`) and recover through
//! `player_ready` resync.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::models::message::ServerMessage;

/// Buffered messages per session before slow receivers start lagging.
const TOPIC_CAPACITY: usize = 256;

pub type Fanout = broadcast::Receiver<Arc<ServerMessage>>;

#[derive(Default)]
pub struct Hub {
    topics: DashMap<String, broadcast::Sender<Arc<ServerMessage>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the group for `pin`, creating it on first use.
    pub fn subscribe(&self, pin: &str) -> Fanout {
        self.topics
            .entry(pin.to_string())
            .or_insert_with(|| broadcast::channel(TOPIC_CAPACITY).0)
            .subscribe()
    }

    /// Sends `msg` to every current subscriber of `pin`.
    /// Returns how many receivers it reached.
    pub fn publish(&self, pin: &str, msg: ServerMessage) -> usize {
        match self.topics.get(pin) {
            Some(tx) => tx.send(Arc::new(msg)).unwrap_or(0),
            None => 0,
        }
    }

    pub fn subscriber_count(&self, pin: &str) -> usize {
        self.topics.get(pin).map_or(0, |tx| tx.receiver_count())
    }

    /// Drops the group for `pin` once nobody listens anymore.
    pub fn prune(&self, pin: &str) {
        self.topics.remove_if(pin, |_, tx| tx.receiver_count() == 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_only_same_pin() {
        let hub = Hub::new();
        let mut a = hub.subscribe("111111");
        let mut b = hub.subscribe("111111");
        let mut other = hub.subscribe("222222");

        assert_eq!(hub.publish("111111", ServerMessage::GameStarted), 2);

        assert_eq!(*a.recv().await.unwrap(), ServerMessage::GameStarted);
        assert_eq!(*b.recv().await.unwrap(), ServerMessage::GameStarted);
        assert!(other.try_recv().is_err());
    }

    #[test]
    fn test_publish_without_group_is_dropped() {
        let hub = Hub::new();
        assert_eq!(hub.publish("999999", ServerMessage::GameStarted), 0);
    }

    #[test]
    fn test_prune_keeps_live_groups() {
        let hub = Hub::new();
        let rx = hub.subscribe("111111");
        hub.prune("111111");
        assert_eq!(hub.subscriber_count("111111"), 1);

        drop(rx);
        hub.prune("111111");
        assert_eq!(hub.subscriber_count("111111"), 0);
        assert_eq!(hub.publish("111111", ServerMessage::GameStarted), 0);
    }
}
