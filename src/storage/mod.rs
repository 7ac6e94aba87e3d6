//! Storage seam.
//!
//! The engine does not own document storage. It hands every committed,
//! conflict-resolved operation to this callback exactly once, in causal
//! order per key, together with the vector clock captured at local apply
//! time. Physical placement, indexing and encoding belong to the storage
//! collaborator.

#[cfg(test)]
use mockall::automock;

use dashmap::DashMap;

use crate::clock::VectorClock;
use crate::core::Operation;
use crate::StorageError;

#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait StateMachine: Send + Sync + 'static {
    /// Applies one committed operation. Failure is fatal to this
    /// operation's application only: the commit log keeps advancing and
    /// reconciliation is the storage collaborator's concern.
    async fn apply(
        &self,
        operation: &Operation,
        clock: &VectorClock,
    ) -> std::result::Result<(), StorageError>;
}

/// A document version as last applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub payload: Vec<u8>,
    pub clock: VectorClock,
}

/// In-memory state machine. Backs the test suites and embedded usage.
#[derive(Debug, Default)]
pub struct MemStateMachine {
    documents: DashMap<(String, String), StoredDocument>,
}

impl MemStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        collection: &str,
        key: &str,
    ) -> Option<StoredDocument> {
        self.documents
            .get(&(collection.to_string(), key.to_string()))
            .map(|doc| doc.clone())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait::async_trait]
impl StateMachine for MemStateMachine {
    async fn apply(
        &self,
        operation: &Operation,
        clock: &VectorClock,
    ) -> std::result::Result<(), StorageError> {
        self.documents.insert(
            (operation.collection.clone(), operation.key.clone()),
            StoredDocument {
                payload: operation.payload.clone(),
                clock: clock.clone(),
            },
        );
        Ok(())
    }
}
