mod cluster;
mod config;
mod error;
mod mailbox;
mod node;
mod state;

pub use self::cluster::Cluster;
pub use self::config::ElectionConfig;
pub use self::error::ElectionError;
pub use self::node::Node;
pub use self::state::{Candidacy, NodeReport, NodeRole, NodeState};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

/// Index of a node in its cluster.
pub type NodeId = usize;

// Message types for election communication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    Heartbeat {
        leader_id: NodeId,
    },
    Candidacy {
        candidate_id: NodeId,
    },
    Vote {
        voter_id: NodeId,
        candidate_id: NodeId,
    },
}

fn lock_node(node: &Mutex<Node>) -> MutexGuard<'_, Node> {
    node.lock().unwrap_or_else(PoisonError::into_inner)
}

// Main election service: owns the cluster and one actor per member
pub struct Election {
    cluster: Arc<Cluster>,
    nodes: Vec<Arc<Mutex<Node>>>,
    config: ElectionConfig,
    tasks: Vec<JoinHandle<()>>,
}

impl Election {
    /// Builds a stopped cluster of `size` followers. Rejects an empty cluster
    /// or timing that fails [`ElectionConfig::validate`].
    pub fn new(size: usize, config: ElectionConfig, seed: u64) -> Result<Self, ElectionError> {
        if size == 0 {
            return Err(ElectionError::InvalidConfig(
                "cluster needs at least one node".to_string(),
            ));
        }
        config.validate()?;

        let cluster = Arc::new(Cluster::new(size));
        let now = Instant::now();
        let nodes = (0..size)
            .map(|id| {
                let node = Node::new(id, Arc::clone(&cluster), config.clone(), seed, now);
                Arc::new(Mutex::new(node))
            })
            .collect();

        Ok(Self {
            cluster,
            nodes,
            config,
            tasks: Vec::new(),
        })
    }

    pub fn size(&self) -> usize {
        self.cluster.size()
    }

    /// Spawns one tick loop per node. Must be called from within a tokio
    /// runtime; calling it again is a no-op.
    pub fn start(&mut self) {
        if !self.tasks.is_empty() {
            return;
        }

        info!("Starting election cluster of {} nodes", self.size());
        let interval = self.config.tick_interval();

        for node in &self.nodes {
            let node = Arc::clone(node);
            self.tasks.push(tokio::spawn(async move {
                loop {
                    {
                        let mut node = lock_node(&node);
                        node.tick(Instant::now());
                    }
                    sleep(interval).await;
                }
            }));
        }
    }

    /// Aborts every tick loop. Node state stays readable.
    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    fn node(&self, id: NodeId) -> Result<&Arc<Mutex<Node>>, ElectionError> {
        self.nodes.get(id).ok_or(ElectionError::UnknownNode(id))
    }

    pub fn crash(&self, id: NodeId) -> Result<(), ElectionError> {
        let node = self.node(id)?;
        lock_node(node).crash()
    }

    pub fn recover(&self, id: NodeId) -> Result<(), ElectionError> {
        let node = self.node(id)?;
        lock_node(node).recover(Instant::now())
    }

    pub fn is_live(&self, id: NodeId) -> bool {
        self.cluster.contains(id) && self.cluster.is_live(id)
    }

    pub fn report(&self, id: NodeId) -> Result<NodeReport, ElectionError> {
        let node = self.node(id)?;
        Ok(lock_node(node).report())
    }

    /// Snapshot of every node, in id order.
    pub fn state(&self) -> Vec<NodeReport> {
        self.nodes.iter().map(|node| lock_node(node).report()).collect()
    }

    /// The live leader, if exactly one node currently believes it leads.
    pub fn leader(&self) -> Option<NodeId> {
        let leaders: Vec<NodeId> = self
            .nodes
            .iter()
            .filter_map(|node| {
                let node = lock_node(node);
                if node.is_leader() {
                    Some(node.id())
                } else {
                    None
                }
            })
            .collect();

        match leaders.as_slice() {
            [leader] => Some(*leader),
            [] => None,
            many => {
                debug!("Multiple nodes believe they lead: {many:?}");
                None
            }
        }
    }
}

impl Drop for Election {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_cluster_starts_with_live_followers() {
        let election = Election::new(3, ElectionConfig::default(), 1).expect("election");

        assert_eq!(election.size(), 3);
        for (id, report) in election.state().into_iter().enumerate() {
            assert_eq!(report.id, id);
            assert!(report.live);
            assert_eq!(report.role, Some(NodeRole::Follower));
            assert_eq!(report.leader_id, None);
        }
        assert_eq!(election.leader(), None);
    }

    #[test]
    fn crash_and_recover_reject_bad_requests() {
        let election = Election::new(3, ElectionConfig::default(), 1).expect("election");

        assert!(matches!(election.crash(3), Err(ElectionError::UnknownNode(3))));
        assert!(matches!(election.recover(0), Err(ElectionError::AlreadyLive(0))));

        election.crash(1).expect("crash");
        assert!(!election.is_live(1));
        assert!(matches!(election.crash(1), Err(ElectionError::NotLive(1))));
        assert_eq!(election.report(1).expect("report").role, None);

        election.recover(1).expect("recover");
        assert!(election.is_live(1));
        assert!(!election.is_live(7));
    }

    #[test]
    fn new_rejects_unusable_settings() {
        let empty_range = ElectionConfig {
            deliberation_min_ms: 2000,
            deliberation_max_ms: 1000,
            ..ElectionConfig::default()
        };
        assert!(matches!(
            Election::new(3, empty_range, 1),
            Err(ElectionError::InvalidConfig(_))
        ));

        let no_tick = ElectionConfig {
            tick_interval_ms: 0,
            ..ElectionConfig::default()
        };
        assert!(matches!(
            Election::new(3, no_tick, 1),
            Err(ElectionError::InvalidConfig(_))
        ));

        assert!(matches!(
            Election::new(0, ElectionConfig::default(), 1),
            Err(ElectionError::InvalidConfig(_))
        ));
    }
}
