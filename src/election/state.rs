use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    Follower,
    Candidate,
    Leader,
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeRole::Follower => write!(f, "follower"),
            NodeRole::Candidate => write!(f, "candidate"),
            NodeRole::Leader => write!(f, "leader"),
        }
    }
}

/// The two phases a candidate moves through before the outcome is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidacy {
    /// Waiting out a random delay before announcing. A rival announcement
    /// seen in this phase makes the node yield.
    Deliberating { started_at: Instant, delay: Duration },
    /// Announced; counting votes until the collection window closes.
    Collecting { announced_at: Instant },
}

#[derive(Debug, Clone)]
pub struct NodeState {
    pub role: NodeRole,
    pub leader_id: Option<NodeId>,
    pub voted_this_cycle: bool,
    pub votes_received: usize,
    /// Followers measure the election timeout from here; leaders measure the
    /// heartbeat interval from here.
    pub last_heartbeat_at: Instant,
    /// Set only while `role == Candidate`.
    pub candidacy: Option<Candidacy>,
    pub elections_started: u64,
}

impl NodeState {
    pub fn new(now: Instant) -> Self {
        Self {
            role: NodeRole::Follower,
            leader_id: None,
            voted_this_cycle: false,
            votes_received: 0,
            last_heartbeat_at: now,
            candidacy: None,
            elections_started: 0,
        }
    }

    pub fn is_deliberating(&self) -> bool {
        matches!(self.candidacy, Some(Candidacy::Deliberating { .. }))
    }
}

/// Point-in-time view of one node, as reported to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeReport {
    pub id: NodeId,
    pub live: bool,
    /// `None` while the node is crashed.
    pub role: Option<NodeRole>,
    pub leader_id: Option<NodeId>,
    pub votes_received: usize,
    pub elections_started: u64,
}

impl std::fmt::Display for NodeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.role, self.leader_id) {
            (None, _) => write!(f, "node {}: crashed", self.id),
            (Some(NodeRole::Leader), _) => write!(f, "node {}: leader", self.id),
            (Some(role), Some(leader)) => {
                write!(f, "node {}: {} (leader {})", self.id, role, leader)
            }
            (Some(role), None) => write!(f, "node {}: {}", self.id, role),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_follower_with_clean_bookkeeping() {
        let now = Instant::now();
        let state = NodeState::new(now);

        assert_eq!(state.role, NodeRole::Follower);
        assert_eq!(state.leader_id, None);
        assert!(!state.voted_this_cycle);
        assert_eq!(state.votes_received, 0);
        assert_eq!(state.last_heartbeat_at, now);
        assert!(state.candidacy.is_none());
        assert!(!state.is_deliberating());
    }

    #[test]
    fn report_display_marks_crashed_nodes() {
        let crashed = NodeReport {
            id: 2,
            live: false,
            role: None,
            leader_id: Some(0),
            votes_received: 0,
            elections_started: 0,
        };
        assert_eq!(crashed.to_string(), "node 2: crashed");

        let follower = NodeReport {
            live: true,
            role: Some(NodeRole::Follower),
            ..crashed
        };
        assert_eq!(follower.to_string(), "node 2: follower (leader 0)");
    }
}
