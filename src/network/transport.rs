//! Network seam.
//!
//! The engine consumes reliable-enough point-to-point delivery behind this
//! trait. No ordering or loss-free guarantees are assumed: duplicate and
//! reordered messages are tolerated upstream via digest and sequence checks.

use std::time::Duration;

#[cfg(test)]
use mockall::automock;

use crate::config::BackoffPolicy;
use crate::core::PeerMessage;
use crate::ids::NodeId;
use crate::replication::ReplicationAck;
use crate::replication::ReplicationRecord;
use crate::Result;

#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Best-effort delivery of one signed protocol message. Retries per
    /// `retry`; an exhausted peer is reported, not fatal.
    async fn send_message(
        &self,
        target: NodeId,
        message: PeerMessage,
        retry: &BackoffPolicy,
    ) -> Result<()>;

    /// Fan-out of one signed protocol message to all `targets`. Failures to
    /// individual peers are logged and swallowed: quorum collection, not
    /// delivery, decides progress.
    async fn broadcast_message(
        &self,
        targets: Vec<NodeId>,
        message: PeerMessage,
        retry: &BackoffPolicy,
    ) -> Result<()>;

    /// Ships one replication record and awaits the peer's acknowledgment.
    async fn send_record(
        &self,
        target: NodeId,
        record: ReplicationRecord,
        timeout: Duration,
    ) -> Result<ReplicationAck>;
}
