//! In-memory mesh transport.
//!
//! Wires a set of co-located nodes together over channels, with per-node
//! partition control. Ships in-tree the same way the in-memory storage
//! adapter does: it backs the unit and cluster tests and embedded usage,
//! while production deployments plug their own `Transport`.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::DashSet;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tracing::debug;

use crate::config::BackoffPolicy;
use crate::core::PeerMessage;
use crate::ids::NodeId;
use crate::replication::ReplicationAck;
use crate::replication::ReplicationRecord;
use crate::NetworkError;
use crate::ReplicationError;
use crate::Result;

const MESH_CHANNEL_CAPACITY: usize = 1024;

/// One replication record awaiting the receiver's acknowledgment.
pub struct InboundRecord {
    pub record: ReplicationRecord,
    pub ack_tx: oneshot::Sender<ReplicationAck>,
}

/// Shared registry connecting every in-process node.
#[derive(Default)]
pub struct InProcessHub {
    messages: DashMap<NodeId, mpsc::Sender<PeerMessage>>,
    records: DashMap<NodeId, mpsc::Sender<InboundRecord>>,
    partitioned: DashSet<NodeId>,
}

impl InProcessHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers `node` and returns its inbound queues. The caller pumps
    /// them into `Node::deliver_message` / `Node::deliver_record`.
    pub fn register(
        &self,
        node: &NodeId,
    ) -> (mpsc::Receiver<PeerMessage>, mpsc::Receiver<InboundRecord>) {
        let (msg_tx, msg_rx) = mpsc::channel(MESH_CHANNEL_CAPACITY);
        let (rec_tx, rec_rx) = mpsc::channel(MESH_CHANNEL_CAPACITY);
        self.messages.insert(node.clone(), msg_tx);
        self.records.insert(node.clone(), rec_tx);
        (msg_rx, rec_rx)
    }

    /// Drops all traffic to and from `node` until `heal` is called.
    pub fn partition(
        &self,
        node: &NodeId,
    ) {
        self.partitioned.insert(node.clone());
    }

    pub fn heal(
        &self,
        node: &NodeId,
    ) {
        self.partitioned.remove(node);
    }

    fn reachable(
        &self,
        from: &NodeId,
        to: &NodeId,
    ) -> bool {
        !self.partitioned.contains(from) && !self.partitioned.contains(to)
    }
}

/// Per-node handle into the hub.
#[derive(Clone)]
pub struct InProcessTransport {
    hub: Arc<InProcessHub>,
    local: NodeId,
}

impl InProcessTransport {
    pub fn new(
        hub: Arc<InProcessHub>,
        local: NodeId,
    ) -> Self {
        Self { hub, local }
    }
}

#[async_trait::async_trait]
impl crate::network::Transport for InProcessTransport {
    async fn send_message(
        &self,
        target: NodeId,
        message: PeerMessage,
        _retry: &BackoffPolicy,
    ) -> Result<()> {
        if !self.hub.reachable(&self.local, &target) {
            return Err(NetworkError::SendFailed {
                node: target,
                message_type: "consensus",
                reason: "partitioned".to_string(),
            }
            .into());
        }
        let sender = self
            .hub
            .messages
            .get(&target)
            .map(|s| s.clone())
            .ok_or_else(|| NetworkError::SendFailed {
                node: target.clone(),
                message_type: "consensus",
                reason: "unknown peer".to_string(),
            })?;
        sender.send(message).await.map_err(|_| {
            NetworkError::SendFailed {
                node: target.clone(),
                message_type: "consensus",
                reason: "inbound queue closed".to_string(),
            }
            .into()
        })
    }

    async fn broadcast_message(
        &self,
        targets: Vec<NodeId>,
        message: PeerMessage,
        retry: &BackoffPolicy,
    ) -> Result<()> {
        let sends = targets
            .into_iter()
            .map(|target| {
                let message = message.clone();
                async move {
                    if let Err(e) = self.send_message(target.clone(), message, retry).await {
                        debug!("broadcast to {} skipped: {:?}", target, e);
                    }
                }
            })
            .collect::<Vec<_>>();
        futures::future::join_all(sends).await;
        Ok(())
    }

    async fn send_record(
        &self,
        target: NodeId,
        record: ReplicationRecord,
        timeout: Duration,
    ) -> Result<ReplicationAck> {
        if !self.hub.reachable(&self.local, &target) {
            return Err(ReplicationError::PeerUnreachable { peer: target }.into());
        }
        let (ack_tx, ack_rx) = oneshot::channel();
        let sender = self
            .hub
            .records
            .get(&target)
            .map(|s| s.clone())
            .ok_or_else(|| ReplicationError::PeerUnreachable { peer: target.clone() })?;
        sender
            .send(InboundRecord { record, ack_tx })
            .await
            .map_err(|_| ReplicationError::PeerUnreachable { peer: target.clone() })?;

        match tokio::time::timeout(timeout, ack_rx).await {
            Ok(Ok(ack)) => Ok(ack),
            Ok(Err(_)) => Err(ReplicationError::PeerUnreachable { peer: target }.into()),
            Err(_) => Err(ReplicationError::ReplicationTimeout {
                peer: target,
                duration: timeout,
            }
            .into()),
        }
    }
}
