use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;

use super::{
    Candidacy, Cluster, ElectionConfig, ElectionError, Message, NodeId, NodeReport, NodeRole,
    NodeState,
};

/// Spreads one base seed into distinct per-node streams.
fn node_seed(seed: u64, id: NodeId) -> u64 {
    seed ^ (id as u64 + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15)
}

pub struct Node {
    // Node identity
    id: NodeId,

    // Election state
    state: NodeState,

    // Configuration
    config: ElectionConfig,

    // Communication
    cluster: Arc<Cluster>,

    // Source for deliberation delays
    rng: StdRng,
}

impl Node {
    /// `config` must already pass [`ElectionConfig::validate`]; an empty
    /// deliberation range cannot be sampled.
    pub fn new(
        id: NodeId,
        cluster: Arc<Cluster>,
        config: ElectionConfig,
        seed: u64,
        now: Instant,
    ) -> Self {
        Self {
            id,
            state: NodeState::new(now),
            config,
            cluster,
            rng: StdRng::seed_from_u64(node_seed(seed, id)),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    #[cfg(test)]
    pub fn config(&self) -> &ElectionConfig {
        &self.config
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub fn is_live(&self) -> bool {
        self.cluster.is_live(self.id)
    }

    pub fn is_leader(&self) -> bool {
        self.is_live() && self.state.role == NodeRole::Leader
    }

    pub fn report(&self) -> NodeReport {
        let live = self.is_live();
        NodeReport {
            id: self.id,
            live,
            role: live.then_some(self.state.role),
            leader_id: self.state.leader_id,
            votes_received: self.state.votes_received,
            elections_started: self.state.elections_started,
        }
    }

    /// One iteration of the node loop: deliver everything queued, then act on
    /// whichever timer belongs to the current role.
    pub fn tick(&mut self, now: Instant) {
        let live = self.is_live();
        for message in self.cluster.drain(self.id) {
            if live {
                self.handle_message(message, now);
            }
        }

        if !live {
            return;
        }

        match self.state.role {
            NodeRole::Leader => self.leader_duty(now),
            NodeRole::Follower => self.follower_duty(now),
            NodeRole::Candidate => self.candidate_duty(now),
        }
    }

    fn leader_duty(&mut self, now: Instant) {
        let since = now.saturating_duration_since(self.state.last_heartbeat_at);
        if since >= self.config.heartbeat_interval() {
            self.cluster
                .broadcast(self.id, Message::Heartbeat { leader_id: self.id });
            self.state.last_heartbeat_at = now;
        }
    }

    fn follower_duty(&mut self, now: Instant) {
        let since = now.saturating_duration_since(self.state.last_heartbeat_at);
        if since >= self.config.election_timeout() {
            self.become_candidate(now);
        }
    }

    fn candidate_duty(&mut self, now: Instant) {
        match self.state.candidacy {
            Some(Candidacy::Deliberating { started_at, delay })
                if now.saturating_duration_since(started_at) >= delay =>
            {
                self.announce_candidacy(now);
            }
            Some(Candidacy::Collecting { announced_at })
                if now.saturating_duration_since(announced_at) >= self.config.vote_collection() =>
            {
                self.conclude_election(now);
            }
            _ => {}
        }
    }

    fn deliberation_delay(&mut self) -> Duration {
        let ms = self
            .rng
            .random_range(self.config.deliberation_min_ms..self.config.deliberation_max_ms);
        Duration::from_millis(ms)
    }

    fn become_candidate(&mut self, now: Instant) {
        let delay = self.deliberation_delay();
        debug!("Node {} heard no heartbeat, deliberating for {:?}", self.id, delay);

        self.state.role = NodeRole::Candidate;
        self.state.leader_id = None;
        self.state.candidacy = Some(Candidacy::Deliberating {
            started_at: now,
            delay,
        });
        self.state.voted_this_cycle = false;
        self.state.votes_received = 0;
        self.state.elections_started += 1;
    }

    fn announce_candidacy(&mut self, now: Instant) {
        info!("Node {} announcing candidacy", self.id);

        self.cluster.broadcast(
            self.id,
            Message::Candidacy {
                candidate_id: self.id,
            },
        );
        self.state.votes_received = 1;
        self.state.voted_this_cycle = true;
        self.state.candidacy = Some(Candidacy::Collecting { announced_at: now });
    }

    fn conclude_election(&mut self, now: Instant) {
        let majority = self.cluster.majority();
        if self.state.votes_received >= majority {
            info!(
                "Node {} becoming leader with {}/{} votes",
                self.id,
                self.state.votes_received,
                self.cluster.size()
            );
            self.state.role = NodeRole::Leader;
            self.state.leader_id = Some(self.id);
        } else {
            info!(
                "Node {} lost election with {} votes (needed {}), reverting to follower",
                self.id, self.state.votes_received, majority
            );
            self.state.role = NodeRole::Follower;
        }
        self.state.candidacy = None;
        self.state.last_heartbeat_at = now;
    }

    /// Applies one delivered message. Mutates local state only; the sole
    /// outbound effect is the vote broadcast.
    pub fn handle_message(&mut self, message: Message, now: Instant) {
        if !self.is_live() {
            return;
        }

        match message {
            Message::Heartbeat { leader_id } => self.handle_heartbeat(leader_id, now),
            Message::Candidacy { candidate_id } => self.handle_candidacy(candidate_id, now),
            Message::Vote {
                voter_id,
                candidate_id,
            } => self.handle_vote(voter_id, candidate_id),
        }
    }

    fn handle_heartbeat(&mut self, leader_id: NodeId, now: Instant) {
        if leader_id == self.id {
            return;
        }

        if self.state.role != NodeRole::Follower || self.state.leader_id != Some(leader_id) {
            info!("Node {} following leader {}", self.id, leader_id);
        }

        // No term comparison: any foreign heartbeat wins.
        self.state.last_heartbeat_at = now;
        self.state.role = NodeRole::Follower;
        self.state.leader_id = Some(leader_id);
        self.state.candidacy = None;
        self.state.voted_this_cycle = false;
        self.state.votes_received = 0;
    }

    fn handle_candidacy(&mut self, candidate_id: NodeId, now: Instant) {
        if candidate_id != self.id && self.state.is_deliberating() {
            info!(
                "Node {} yielding to candidate {} during deliberation",
                self.id, candidate_id
            );
            self.state.role = NodeRole::Follower;
            self.state.candidacy = None;
            self.state.last_heartbeat_at = now;
        }

        if !self.state.voted_this_cycle {
            self.state.voted_this_cycle = true;
            debug!("Node {} voting for {}", self.id, candidate_id);
            self.cluster.broadcast(
                self.id,
                Message::Vote {
                    voter_id: self.id,
                    candidate_id,
                },
            );
        }
    }

    fn handle_vote(&mut self, voter_id: NodeId, candidate_id: NodeId) {
        if self.state.role == NodeRole::Candidate && candidate_id == self.id {
            self.state.votes_received += 1;
            debug!(
                "Node {} received vote from {} ({} total)",
                self.id, voter_id, self.state.votes_received
            );
        }
    }

    /// Pauses the node. Election state is frozen, not reset.
    pub fn crash(&mut self) -> Result<(), ElectionError> {
        self.cluster.crash(self.id)?;
        info!("Node {} crashed as {}", self.id, self.state.role);
        Ok(())
    }

    /// Resumes a paused node as a fresh follower with an empty inbox and
    /// heartbeat baseline `now`.
    pub fn recover(&mut self, now: Instant) -> Result<(), ElectionError> {
        self.cluster.revive(self.id)?;
        self.state = NodeState::new(now);
        info!("Node {} recovered as follower", self.id);
        Ok(())
    }
}
