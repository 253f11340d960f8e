//! Range-scoped change notifications.

use std::sync::RwLock;

use tokio::sync::broadcast;
use tracing::debug;

use skiff_index::PathBounds;
use skiff_types::Version;

/// A committed change to one index path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: String,
    pub version: Version,
}

/// Internal subscriber: path bounds paired with a broadcast sender.
struct Subscriber {
    bounds: PathBounds,
    sender: broadcast::Sender<ChangeEvent>,
}

/// Fan-out registry delivering change events to matching subscribers.
///
/// Every subscriber watches a path range; `publish` delivers an event only
/// to subscribers whose bounds contain the changed path. Subscribers whose
/// channels are closed are pruned on publish.
pub struct WatchHub {
    subscribers: RwLock<Vec<Subscriber>>,
    capacity: usize,
}

impl WatchHub {
    /// Create a hub whose per-subscriber channels hold `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            capacity,
        }
    }

    /// Register a subscriber over `bounds`.
    pub fn subscribe(&self, bounds: PathBounds) -> Watch {
        let (sender, receiver) = broadcast::channel(self.capacity);
        self.subscribers
            .write()
            .expect("hub lock poisoned")
            .push(Subscriber { bounds, sender });
        Watch { receiver }
    }

    /// Deliver a committed change to every subscriber whose range contains
    /// `path`.
    pub fn publish(&self, path: &str, version: Version) {
        let event = ChangeEvent {
            path: path.to_string(),
            version,
        };
        let mut subscribers = self.subscribers.write().expect("hub lock poisoned");
        subscribers.retain(|sub| {
            if sub.bounds.contains(path) {
                // If send fails (no receivers), the subscriber is stale.
                sub.sender.send(event.clone()).is_ok()
            } else {
                // Keep non-matching subscribers; they may match future events.
                // Only prune if the channel itself is closed.
                sub.sender.receiver_count() > 0
            }
        });
        debug!(%path, %version, watchers = subscribers.len(), "change published");
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().expect("hub lock poisoned").len()
    }
}

impl Default for WatchHub {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// A single change subscription.
pub struct Watch {
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl Watch {
    /// The next change inside the watched range.
    ///
    /// A lagged receiver skips the events it missed and keeps going; `None`
    /// means the hub is gone and no further changes will arrive.
    pub async fn changed(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "watch lagged, skipping missed events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// The next change, if one is already queued.
    pub fn try_changed(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn matching_change_is_delivered() {
        let hub = WatchHub::default();
        let mut watch = hub.subscribe(PathBounds::subtree("/docs"));

        hub.publish("/docs/readme", Version::new(1));

        let event = watch.changed().await.unwrap();
        assert_eq!(event.path, "/docs/readme");
        assert_eq!(event.version, Version::new(1));
    }

    #[tokio::test]
    async fn non_matching_change_is_filtered() {
        let hub = WatchHub::default();
        let mut watch = hub.subscribe(PathBounds::subtree("/docs"));

        hub.publish("/images/logo", Version::new(1));
        hub.publish("/docs0", Version::new(2)); // sibling, not a descendant

        assert!(watch.try_changed().is_none());
    }

    #[tokio::test]
    async fn root_watch_sees_everything() {
        let hub = WatchHub::default();
        let mut watch = hub.subscribe(PathBounds::subtree("/"));

        hub.publish("/anywhere/at/all", Version::new(3));
        assert!(watch.try_changed().is_some());
    }

    #[tokio::test]
    async fn each_subscriber_gets_its_own_scope() {
        let hub = WatchHub::default();
        let mut docs = hub.subscribe(PathBounds::subtree("/docs"));
        let mut images = hub.subscribe(PathBounds::subtree("/images"));

        hub.publish("/docs/a", Version::new(1));

        assert!(docs.try_changed().is_some());
        assert!(images.try_changed().is_none());
    }

    #[tokio::test]
    async fn dropped_subscribers_are_pruned() {
        let hub = WatchHub::default();
        let watch = hub.subscribe(PathBounds::subtree("/docs"));
        assert_eq!(hub.subscriber_count(), 1);

        drop(watch);
        hub.publish("/docs/a", Version::new(1));
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn lagged_watch_skips_missed_events() {
        let hub = WatchHub::new(1);
        let mut watch = hub.subscribe(PathBounds::subtree("/"));

        hub.publish("/one", Version::new(1));
        hub.publish("/two", Version::new(2));
        hub.publish("/three", Version::new(3));

        // Capacity 1: only the newest event survives.
        let event = watch.changed().await.unwrap();
        assert_eq!(event.path, "/three");
    }
}
