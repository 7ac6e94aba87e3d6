//! Partition monitor / view-change vote tally.
//!
//! Tracks the `Stable -> ViewChanging -> Stable` lifecycle and counts
//! signed view-change votes per candidate view. The controller holds no
//! I/O: the engine broadcasts votes and installs views based on the
//! decisions returned here, which keeps the agreement rules testable in
//! isolation.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use crate::core::ViewChangeVote;
use crate::ids::NodeId;
use crate::ids::SequenceNumber;
use crate::ids::ViewNumber;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MonitorState {
    Stable(ViewNumber),
    ViewChanging { candidate: ViewNumber },
}

/// Returned when a candidate view reached its 2f+1 vote quorum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InstallDecision {
    pub candidate_view: ViewNumber,
    /// First sequence the incoming leader may assign: strictly above every
    /// committed sequence reported by the vote quorum.
    pub resume_sequence: SequenceNumber,
}

pub(crate) struct ViewChangeController {
    state: Mutex<MonitorState>,
    votes: Mutex<HashMap<ViewNumber, HashMap<NodeId, ViewChangeVote>>>,
}

impl ViewChangeController {
    pub(crate) fn new(initial_view: ViewNumber) -> Self {
        Self {
            state: Mutex::new(MonitorState::Stable(initial_view)),
            votes: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn is_changing(&self) -> bool {
        matches!(*self.state.lock(), MonitorState::ViewChanging { .. })
    }

    pub(crate) fn candidate(&self) -> Option<ViewNumber> {
        match *self.state.lock() {
            MonitorState::ViewChanging { candidate } => Some(candidate),
            MonitorState::Stable(_) => None,
        }
    }

    /// Starts (or joins) a change toward `candidate` and returns this
    /// member's vote to broadcast. Returns `None` when the candidacy is
    /// stale: a change to the same or a later view is already underway, or
    /// the view is already installed.
    pub(crate) fn begin(
        &self,
        candidate: ViewNumber,
        last_committed_sequence: SequenceNumber,
        voter: &NodeId,
    ) -> Option<ViewChangeVote> {
        let mut state = self.state.lock();
        match *state {
            MonitorState::Stable(view) if candidate <= view => return None,
            MonitorState::ViewChanging { candidate: current } if candidate <= current => return None,
            _ => {}
        }
        *state = MonitorState::ViewChanging { candidate };
        debug!("view change started toward candidate view {}", candidate);

        Some(ViewChangeVote {
            candidate_view: candidate,
            last_committed_sequence,
            voter: voter.clone(),
        })
    }

    /// Tallies one vote. One vote per voter per candidate view counts; the
    /// first wins. Returns the install decision when the quorum completes.
    pub(crate) fn record_vote(
        &self,
        vote: ViewChangeVote,
        quorum: usize,
    ) -> Option<InstallDecision> {
        {
            let state = self.state.lock();
            if let MonitorState::Stable(view) = *state {
                if vote.candidate_view <= view {
                    debug!(
                        "stale view-change vote for {} (stable at {})",
                        vote.candidate_view, view
                    );
                    return None;
                }
            }
        }

        let mut votes = self.votes.lock();
        let tally = votes.entry(vote.candidate_view).or_default();
        if tally.contains_key(&vote.voter) {
            return None;
        }
        let candidate_view = vote.candidate_view;
        tally.insert(vote.voter.clone(), vote);

        if tally.len() >= quorum {
            let resume_sequence = tally
                .values()
                .map(|v| v.last_committed_sequence)
                .max()
                .unwrap_or(0)
                + 1;
            return Some(InstallDecision {
                candidate_view,
                resume_sequence,
            });
        }
        None
    }

    /// Marks `view` installed: the monitor returns to `Stable` and tallies
    /// for that view and older candidates are discarded.
    pub(crate) fn installed(
        &self,
        view: ViewNumber,
    ) {
        *self.state.lock() = MonitorState::Stable(view);
        self.votes.lock().retain(|candidate, _| *candidate > view);
    }
}
