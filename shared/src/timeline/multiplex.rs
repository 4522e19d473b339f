use std::collections::HashMap;

use log::warn;

use crate::{messages::Message, queues::TsQueue, types::TimesliceId};

use super::MultiplexError;

/// One inbox per timeslice id, shared by every timeline facade of a process.
///
/// Every id `0..num_timeslices` gets an empty queue at construction and the
/// set of ids never changes afterwards.
pub struct Multiplex {
    inboxes: HashMap<TimesliceId, TsQueue<Message>>,
}

impl Multiplex {
    pub fn new(num_timeslices: u8) -> Self {
        let inboxes = (0..num_timeslices)
            .map(|id| (TimesliceId::new(id), TsQueue::new()))
            .collect();
        Self { inboxes }
    }

    pub fn contains(&self, id: TimesliceId) -> bool {
        self.inboxes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.inboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inboxes.is_empty()
    }

    fn inbox(&self, id: TimesliceId) -> Result<&TsQueue<Message>, MultiplexError> {
        self.inboxes
            .get(&id)
            .ok_or(MultiplexError::UnknownTimeslice {
                id,
                num_timeslices: self.inboxes.len(),
            })
    }

    /// Queues `message` for `destination`, returning the inbox size
    pub fn send(&self, destination: TimesliceId, message: Message) -> Result<usize, MultiplexError> {
        Ok(self.inbox(destination)?.push_back(message))
    }

    /// Takes the oldest message addressed to `id`
    pub fn pop(&self, id: TimesliceId) -> Option<Message> {
        match self.inbox(id) {
            Ok(inbox) => inbox.pop_front().map(|(message, _)| message),
            Err(error) => {
                warn!("{}", error);
                None
            }
        }
    }

    pub fn is_message_available(&self, id: TimesliceId) -> bool {
        self.inbox(id).map(|inbox| !inbox.is_empty()).unwrap_or(false)
    }
}
