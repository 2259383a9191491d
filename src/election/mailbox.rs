use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::Message;

struct Inbox {
    live: bool,
    queue: VecDeque<Message>,
}

/// Unbounded FIFO inbox for one node.
///
/// The liveness flag sits under the same lock as the queue, so a message can
/// never be accepted after the owner has been marked crashed.
pub struct Mailbox {
    inner: Mutex<Inbox>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inbox {
                live: true,
                queue: VecDeque::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inbox> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_live(&self) -> bool {
        self.lock().live
    }

    /// Appends `message` if the owner is live. Returns whether it was accepted.
    pub fn push(&self, message: Message) -> bool {
        let mut inbox = self.lock();
        if !inbox.live {
            return false;
        }
        inbox.queue.push_back(message);
        true
    }

    /// Pops everything currently queued, oldest first.
    pub fn drain(&self) -> Vec<Message> {
        self.lock().queue.drain(..).collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sets the liveness flag and discards anything queued. Returns the
    /// previous flag.
    pub fn reset(&self, live: bool) -> bool {
        let mut inbox = self.lock();
        let was_live = inbox.live;
        inbox.live = live;
        inbox.queue.clear();
        was_live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_messages_oldest_first_and_empties_queue() {
        let mailbox = Mailbox::new();
        assert!(mailbox.push(Message::Heartbeat { leader_id: 1 }));
        assert!(mailbox.push(Message::Candidacy { candidate_id: 2 }));

        let drained = mailbox.drain();
        assert_eq!(
            drained,
            vec![
                Message::Heartbeat { leader_id: 1 },
                Message::Candidacy { candidate_id: 2 },
            ]
        );
        assert!(mailbox.is_empty());
        assert!(mailbox.drain().is_empty());
    }

    #[test]
    fn crashed_mailbox_refuses_messages() {
        let mailbox = Mailbox::new();
        mailbox.push(Message::Heartbeat { leader_id: 0 });

        assert!(mailbox.reset(false));
        assert!(!mailbox.is_live());
        assert!(mailbox.is_empty());
        assert!(!mailbox.push(Message::Heartbeat { leader_id: 0 }));
        assert!(mailbox.is_empty());
    }

    #[test]
    fn revived_mailbox_starts_empty() {
        let mailbox = Mailbox::new();
        mailbox.reset(false);
        assert!(!mailbox.reset(true));
        assert!(mailbox.is_live());
        assert!(mailbox.is_empty());
        assert!(mailbox.push(Message::Vote {
            voter_id: 1,
            candidate_id: 0
        }));
        assert_eq!(mailbox.len(), 1);
    }
}
