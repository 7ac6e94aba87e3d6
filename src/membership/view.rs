//! Swappable membership value.
//!
//! A `MembershipView` pins the ordered voter set and the view number for one
//! leader epoch. It is replaced wholesale on a successful view change and
//! shared behind `arc_swap`, so readers always observe either the old or the
//! new view, never a mix.

use ed25519_dalek::VerifyingKey;

use crate::config::ClusterConfig;
use crate::ids::NodeId;
use crate::ids::ViewNumber;
use crate::network::verifying_key_from_hex;
use crate::MembershipError;
use crate::Result;

/// One voting member's identity within a view.
#[derive(Debug, Clone)]
pub struct Member {
    pub id: NodeId,
    pub datacenter: String,
    pub address: String,
    /// ed25519 key every protocol message from this member must verify
    /// against. Absent only in test fixtures that skip authentication.
    pub verifying_key: Option<VerifyingKey>,
}

#[derive(Debug, Clone)]
pub struct MembershipView {
    view_number: ViewNumber,
    members: Vec<Member>,
}

impl MembershipView {
    /// Members must be in the same order on every node: leader selection is
    /// positional (`view_number mod n`).
    pub fn new(
        view_number: ViewNumber,
        members: Vec<Member>,
    ) -> Self {
        Self { view_number, members }
    }

    pub fn from_config(config: &ClusterConfig) -> Result<Self> {
        let mut members = Vec::with_capacity(config.initial_members.len());
        for m in &config.initial_members {
            let verifying_key = if m.public_key.is_empty() {
                None
            } else {
                Some(verifying_key_from_hex(&m.public_key)?)
            };
            members.push(Member {
                id: NodeId::from(m.id.as_str()),
                datacenter: m.datacenter.clone(),
                address: m.address.clone(),
                verifying_key,
            });
        }
        Ok(Self::new(crate::constants::GENESIS_VIEW, members))
    }

    pub fn view_number(&self) -> ViewNumber {
        self.view_number
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Maximum simultaneously faulty members this view tolerates:
    /// f = (n - 1) / 3.
    pub fn max_faulty(&self) -> usize {
        self.members.len().saturating_sub(1) / 3
    }

    /// Votes required for a phase transition: 2f + 1. Any two quorums of
    /// this size intersect in at least one correct node.
    pub fn quorum(&self) -> usize {
        2 * self.max_faulty() + 1
    }

    pub fn is_quorum(
        &self,
        count: usize,
    ) -> bool {
        count >= self.quorum()
    }

    /// The designated sequencer for this view.
    pub fn leader_id(&self) -> &NodeId {
        let index = (self.view_number % self.members.len() as u64) as usize;
        &self.members[index].id
    }

    pub fn is_leader(
        &self,
        node: &NodeId,
    ) -> bool {
        self.leader_id() == node
    }

    pub fn contains(
        &self,
        node: &NodeId,
    ) -> bool {
        self.members.iter().any(|m| &m.id == node)
    }

    pub fn member(
        &self,
        node: &NodeId,
    ) -> Option<&Member> {
        self.members.iter().find(|m| &m.id == node)
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn verifying_key(
        &self,
        node: &NodeId,
    ) -> Result<&VerifyingKey> {
        let member = self.member(node).ok_or_else(|| MembershipError::UnknownPeer {
            node: node.clone(),
            view: self.view_number,
        })?;
        member
            .verifying_key
            .as_ref()
            .ok_or_else(|| MembershipError::NoVerifyingKey { node: node.clone() }.into())
    }

    /// Everyone except `node`. Broadcast targets for a member's outbound
    /// protocol messages.
    pub fn peers_of(
        &self,
        node: &NodeId,
    ) -> Vec<NodeId> {
        self.members.iter().filter(|m| &m.id != node).map(|m| m.id.clone()).collect()
    }

    /// The view installed by a successful view change: identical member
    /// list, new view number, hence a rotated leader.
    pub fn successor(
        &self,
        candidate_view: ViewNumber,
    ) -> Self {
        Self {
            view_number: candidate_view,
            members: self.members.clone(),
        }
    }
}
