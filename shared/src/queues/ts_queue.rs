use std::{collections::VecDeque, time::Duration};

use parking_lot::{Condvar, Mutex};

/// A mutex-guarded FIFO shared between threads.
///
/// Pushes never block. Pops return `None` on an empty queue, callers that
/// want to sleep until something arrives use [`TsQueue::wait_for_data`].
pub struct TsQueue<T> {
    queue: Mutex<VecDeque<T>>,
    data_ready: Condvar,
}

impl<T> TsQueue<T> {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            data_ready: Condvar::new(),
        }
    }

    /// Appends to the back, returning the resulting size
    pub fn push_back(&self, item: T) -> usize {
        let size = {
            let mut queue = self.queue.lock();
            queue.push_back(item);
            queue.len()
        };
        self.data_ready.notify_all();
        size
    }

    /// Prepends to the front, returning the resulting size
    pub fn push_front(&self, item: T) -> usize {
        let size = {
            let mut queue = self.queue.lock();
            queue.push_front(item);
            queue.len()
        };
        self.data_ready.notify_all();
        size
    }

    /// Removes the front element, returning it with the remaining size
    pub fn pop_front(&self) -> Option<(T, usize)> {
        let mut queue = self.queue.lock();
        let item = queue.pop_front()?;
        Some((item, queue.len()))
    }

    /// Removes the back element, returning it with the remaining size
    pub fn pop_back(&self) -> Option<(T, usize)> {
        let mut queue = self.queue.lock();
        let item = queue.pop_back()?;
        Some((item, queue.len()))
    }

    /// Removes the front element only if `accept` approves of it. The check
    /// and the removal happen under one lock acquisition.
    pub fn pop_front_if(&self, accept: impl FnOnce(&T) -> bool) -> Option<T> {
        let mut queue = self.queue.lock();
        if !accept(queue.front()?) {
            return None;
        }
        queue.pop_front()
    }

    /// Inspects the front element without removing it
    pub fn front_with<R>(&self, inspect: impl FnOnce(&T) -> R) -> Option<R> {
        let queue = self.queue.lock();
        queue.front().map(inspect)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn clear(&self) {
        self.queue.lock().clear();
    }

    /// Removes every element, front to back
    pub fn drain(&self) -> Vec<T> {
        self.queue.lock().drain(..).collect()
    }

    /// Blocks the calling thread until the queue is non-empty
    pub fn wait_for_data(&self) {
        let mut queue = self.queue.lock();
        while queue.is_empty() {
            self.data_ready.wait(&mut queue);
        }
    }

    /// Like [`TsQueue::wait_for_data`], giving up after `timeout`. Returns
    /// whether data is available.
    pub fn wait_for_data_timeout(&self, timeout: Duration) -> bool {
        let mut queue = self.queue.lock();
        if queue.is_empty() {
            self.data_ready.wait_for(&mut queue, timeout);
        }
        !queue.is_empty()
    }
}

impl<T: Clone> TsQueue<T> {
    pub fn front(&self) -> Option<T> {
        self.queue.lock().front().cloned()
    }

    pub fn back(&self) -> Option<T> {
        self.queue.lock().back().cloned()
    }

    /// Copies the current contents, front to back
    pub fn snapshot(&self) -> Vec<T> {
        self.queue.lock().iter().cloned().collect()
    }
}

impl<T> Default for TsQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
