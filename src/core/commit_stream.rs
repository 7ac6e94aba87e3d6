//! Finalized-commit event stream.
//!
//! Every committed, locally applied operation is published here for
//! observability and audit collaborators. Slow subscribers lag rather than
//! block the commit path.

use tokio::sync::broadcast;

use crate::clock::VectorClock;
use crate::core::Operation;
use crate::ids::SequenceNumber;
use crate::ids::ViewNumber;

#[derive(Debug, Clone)]
pub struct CommitEvent {
    pub view: ViewNumber,
    pub sequence: SequenceNumber,
    pub operation: Operation,
    pub vector_clock: VectorClock,
}

#[derive(Debug, Clone)]
pub struct CommitStream {
    tx: broadcast::Sender<CommitEvent>,
}

impl CommitStream {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CommitEvent> {
        self.tx.subscribe()
    }

    pub(crate) fn publish(
        &self,
        event: CommitEvent,
    ) {
        // No subscribers is fine; the stream is optional to consume.
        let _ = self.tx.send(event);
    }
}

impl Default for CommitStream {
    fn default() -> Self {
        Self::new(crate::constants::COMMIT_STREAM_CAPACITY)
    }
}
