//! Change notifications for record files
//!
//! UI consumers subscribe to refresh their in-memory views after a merge
//! touches a file behind their back.

use tokio::sync::broadcast;

use crate::domain::record::RecordFamily;

/// Which logical data family changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    Summaries,
    Transcripts,
}

impl ChangeEvent {
    pub fn for_family(family: RecordFamily) -> Self {
        match family {
            RecordFamily::Transcripts => Self::Transcripts,
            _ => Self::Summaries,
        }
    }
}

/// Broadcast feed of change events.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Publish an event; a feed with no live listeners is fine.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let feed = ChangeFeed::new();
        let mut rx = feed.subscribe();

        feed.publish(ChangeEvent::Transcripts);
        assert_eq!(rx.recv().await.unwrap(), ChangeEvent::Transcripts);
    }

    #[test]
    fn publish_without_listeners_does_not_panic() {
        let feed = ChangeFeed::new();
        feed.publish(ChangeEvent::Summaries);
    }

    #[test]
    fn window_families_map_to_summaries() {
        assert_eq!(
            ChangeEvent::for_family(RecordFamily::Window(30)),
            ChangeEvent::Summaries
        );
        assert_eq!(
            ChangeEvent::for_family(RecordFamily::Transcripts),
            ChangeEvent::Transcripts
        );
    }
}
