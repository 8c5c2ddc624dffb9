//! In-process fan-out of document snapshots to subscribers.

use dashmap::DashMap;
use tokio::sync::broadcast;

use super::backend::Document;

/// Per-document broadcast channels.
///
/// Subscribers that fall behind skip to the newest snapshot
/// (`RecvError::Lagged`); no intermediate state is guaranteed to be seen.
pub struct ChangeNotifier {
    channels: DashMap<String, broadcast::Sender<Document>>,
    capacity: usize,
}

impl ChangeNotifier {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn subscribe(&self, key: &str) -> broadcast::Receiver<Document> {
        self.channels
            .entry(key.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Deliver a snapshot to current subscribers of its key.
    pub fn publish(&self, document: &Document) {
        let Some(sender) = self.channels.get(&document.key) else {
            return;
        };

        if sender.send(document.clone()).is_err() {
            // Every receiver is gone
            drop(sender);
            self.channels
                .remove_if(&document.key, |_, tx| tx.receiver_count() == 0);
        }
    }

    /// Number of documents with at least one channel allocated.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(16)
    }
}
