//! Node assembly.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::alias::SMOF;
use crate::alias::TROF;
use crate::config::Settings;
use crate::core::CommitApplier;
use crate::core::CommitStream;
use crate::core::ConsensusEngine;
use crate::ids::NodeId;
use crate::membership::MembershipView;
use crate::membership::PeerHealthTracker;
use crate::metrics::register_custom_metrics;
use crate::network::MessageSigner;
use crate::node::Node;
use crate::replication::ConflictPolicy;
use crate::replication::MergeFn;
use crate::replication::ReplicationCoordinator;
use crate::Error;
use crate::Result;
use crate::TypeConfig;

/// Assembles a [`Node`] from its collaborators.
///
/// Required: settings, transport, state machine. The signing identity
/// defaults to a freshly generated key, which peers will only accept when
/// the cluster config carries no pinned keys (test topologies).
pub struct NodeBuilder<T>
where T: TypeConfig
{
    settings: Option<Arc<Settings>>,
    signer: Option<MessageSigner>,
    transport: Option<Arc<TROF<T>>>,
    state_machine: Option<Arc<SMOF<T>>>,
    merge_fn: Option<Arc<MergeFn>>,
}

impl<T> NodeBuilder<T>
where T: TypeConfig
{
    pub fn new() -> Self {
        Self {
            settings: None,
            signer: None,
            transport: None,
            state_machine: None,
            merge_fn: None,
        }
    }

    pub fn settings(
        mut self,
        settings: Arc<Settings>,
    ) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn signer(
        mut self,
        signer: MessageSigner,
    ) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn transport(
        mut self,
        transport: Arc<TROF<T>>,
    ) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn state_machine(
        mut self,
        state_machine: Arc<SMOF<T>>,
    ) -> Self {
        self.state_machine = Some(state_machine);
        self
    }

    /// Installs an application-supplied merge function as the conflict
    /// policy.
    pub fn merge_fn(
        mut self,
        merge: Arc<MergeFn>,
    ) -> Self {
        self.merge_fn = Some(merge);
        self
    }

    pub fn build(self) -> Result<Arc<Node<T>>> {
        let settings = self
            .settings
            .ok_or_else(|| Error::Fatal("NodeBuilder: settings are required".to_string()))?;
        let transport = self
            .transport
            .ok_or_else(|| Error::Fatal("NodeBuilder: a transport is required".to_string()))?;
        let state_machine = self
            .state_machine
            .ok_or_else(|| Error::Fatal("NodeBuilder: a state machine is required".to_string()))?;
        settings.validate()?;

        let node_id = NodeId::from(settings.cluster.node_id.as_str());
        let signer = match self.signer {
            Some(signer) => {
                if signer.node_id() != &node_id {
                    return Err(Error::Fatal(format!(
                        "NodeBuilder: signer identity {} does not match configured node_id {}",
                        signer.node_id(),
                        node_id
                    )));
                }
                signer
            }
            None => MessageSigner::generate(node_id.clone()),
        };

        register_custom_metrics();

        let view = MembershipView::from_config(&settings.cluster)?;
        let health = Arc::new(PeerHealthTracker::new());
        let coordinator = Arc::new(ReplicationCoordinator::new(
            node_id,
            settings.cluster.datacenter.clone(),
            settings.replication.clone(),
            settings.retry.replication,
            state_machine,
            Arc::clone(&transport),
        ));
        if let Some(merge) = self.merge_fn {
            coordinator.configure(Some(ConflictPolicy::Merge(merge)), None);
        }

        let (engine, committed_rx) = ConsensusEngine::new(
            signer,
            Arc::clone(&settings),
            view,
            transport,
            Arc::clone(&coordinator),
            Arc::clone(&health),
        );

        let commit_stream = CommitStream::default();
        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let applier = CommitApplier::new(
            Arc::clone(&coordinator),
            commit_stream.clone(),
            engine.pending_waiters(),
            committed_rx,
            shutdown_rx,
        );

        Ok(Arc::new(Node {
            engine,
            coordinator,
            health,
            commit_stream,
            settings,
            shutdown_tx,
            applier: Mutex::new(Some(applier)),
            started: AtomicBool::new(false),
        }))
    }
}

impl<T> Default for NodeBuilder<T>
where T: TypeConfig
{
    fn default() -> Self {
        Self::new()
    }
}
