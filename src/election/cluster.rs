use log::debug;

use super::mailbox::Mailbox;
use super::{ElectionError, Message, NodeId};

/// Fixed-size registry of node mailboxes: the only path between nodes.
pub struct Cluster {
    mailboxes: Vec<Mailbox>,
}

impl Cluster {
    pub fn new(size: usize) -> Self {
        Self {
            mailboxes: (0..size).map(|_| Mailbox::new()).collect(),
        }
    }

    pub fn size(&self) -> usize {
        self.mailboxes.len()
    }

    /// Votes needed to win: `size / 2 + 1`, counted over every member
    /// whether or not it is live.
    pub fn majority(&self) -> usize {
        self.size() / 2 + 1
    }

    fn mailbox(&self, id: NodeId) -> Result<&Mailbox, ElectionError> {
        self.mailboxes.get(id).ok_or(ElectionError::UnknownNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id < self.size()
    }

    pub fn is_live(&self, id: NodeId) -> bool {
        self.mailboxes.get(id).is_some_and(Mailbox::is_live)
    }

    /// Appends to the target's queue iff the target is live.
    pub fn enqueue(&self, target: NodeId, message: Message) -> bool {
        match self.mailboxes.get(target) {
            Some(mailbox) => mailbox.push(message),
            None => false,
        }
    }

    /// Fans `message` out to every member, the sender included. Does nothing
    /// when the sender is not live. Returns the number of deliveries.
    pub fn broadcast(&self, sender: NodeId, message: Message) -> usize {
        if !self.is_live(sender) {
            return 0;
        }

        let delivered = self
            .mailboxes
            .iter()
            .filter(|mailbox| mailbox.push(message.clone()))
            .count();
        debug!("Node {sender} broadcast {message:?} to {delivered} nodes");
        delivered
    }

    /// Pops everything queued for `id`, oldest first.
    pub fn drain(&self, id: NodeId) -> Vec<Message> {
        self.mailboxes
            .get(id)
            .map(Mailbox::drain)
            .unwrap_or_default()
    }

    /// Marks `id` crashed and drops its pending messages.
    pub fn crash(&self, id: NodeId) -> Result<(), ElectionError> {
        let mailbox = self.mailbox(id)?;
        if !mailbox.reset(false) {
            return Err(ElectionError::NotLive(id));
        }
        Ok(())
    }

    /// Marks `id` live again with an empty queue.
    pub fn revive(&self, id: NodeId) -> Result<(), ElectionError> {
        let mailbox = self.mailbox(id)?;
        if mailbox.is_live() {
            return Err(ElectionError::AlreadyLive(id));
        }
        mailbox.reset(true);
        Ok(())
    }
}
