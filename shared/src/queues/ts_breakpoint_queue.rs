use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

struct BreakpointInner<T> {
    items: VecDeque<T>,
    // index of the element the cursor sits on, `items.len()` when past the end
    breakpoint: Option<usize>,
}

/// A thread-safe queue with a movable "breakpoint" cursor.
///
/// A designated catch-up reader walks the queue with
/// [`pop_at_breakpoint`](TsBreakpointQueue::pop_at_breakpoint), and may
/// insert just ahead of the cursor with
/// [`push_at_breakpoint`](TsBreakpointQueue::push_at_breakpoint). The
/// ordinary reader using [`pop_front`](TsBreakpointQueue::pop_front) can
/// only take elements the cursor has already passed, so the catch-up reader
/// is never overtaken.
pub struct TsBreakpointQueue<T> {
    inner: Mutex<BreakpointInner<T>>,
    data_ready: Condvar,
}

impl<T> TsBreakpointQueue<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BreakpointInner {
                items: VecDeque::new(),
                breakpoint: None,
            }),
            data_ready: Condvar::new(),
        }
    }

    pub fn push_back(&self, item: T) -> usize {
        let size = {
            let mut inner = self.inner.lock();
            inner.items.push_back(item);
            inner.items.len()
        };
        self.data_ready.notify_all();
        size
    }

    /// Prepends an element. An active cursor keeps pointing at the element
    /// it was on.
    pub fn push_front(&self, item: T) -> usize {
        let size = {
            let mut inner = self.inner.lock();
            inner.items.push_front(item);
            if let Some(index) = inner.breakpoint.as_mut() {
                *index += 1;
            }
            inner.items.len()
        };
        self.data_ready.notify_all();
        size
    }

    /// Removes the front element. Fails while an active cursor sits at the
    /// very front, since the catch-up reader has not passed that element yet.
    pub fn pop_front(&self) -> Option<(T, usize)> {
        let mut inner = self.inner.lock();
        if inner.breakpoint == Some(0) {
            return None;
        }
        let item = inner.items.pop_front()?;
        if let Some(index) = inner.breakpoint.as_mut() {
            *index -= 1;
        }
        Some((item, inner.items.len()))
    }

    pub fn pop_back(&self) -> Option<(T, usize)> {
        let mut inner = self.inner.lock();
        let length = inner.items.len();
        let item = inner.items.pop_back()?;
        if let Some(index) = inner.breakpoint.as_mut() {
            if *index == length {
                *index -= 1;
            }
        }
        Some((item, inner.items.len()))
    }

    pub fn set_breakpoint_at_begin(&self) {
        self.inner.lock().breakpoint = Some(0);
    }

    pub fn remove_breakpoint(&self) {
        self.inner.lock().breakpoint = None;
    }

    pub fn has_breakpoint(&self) -> bool {
        self.inner.lock().breakpoint.is_some()
    }

    /// Cursor position, counted from the front
    pub fn breakpoint_position(&self) -> Option<usize> {
        self.inner.lock().breakpoint
    }

    /// Whether the cursor has walked past every element
    pub fn breakpoint_at_end(&self) -> bool {
        let inner = self.inner.lock();
        inner.breakpoint == Some(inner.items.len())
    }

    /// Inserts immediately before the cursor without moving it off its
    /// element. Returns the resulting size, or `None` without a breakpoint.
    pub fn push_at_breakpoint(&self, item: T) -> Option<usize> {
        let size = {
            let mut inner = self.inner.lock();
            let index = inner.breakpoint?;
            inner.items.insert(index, item);
            inner.breakpoint = Some(index + 1);
            inner.items.len()
        };
        self.data_ready.notify_all();
        Some(size)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    /// Removes every element. An active cursor moves back to the front.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.items.clear();
        if inner.breakpoint.is_some() {
            inner.breakpoint = Some(0);
        }
    }

    pub fn wait_for_data(&self) {
        let mut inner = self.inner.lock();
        while inner.items.is_empty() {
            self.data_ready.wait(&mut inner);
        }
    }
}

impl<T: Clone> TsBreakpointQueue<T> {
    /// Reads the element under the cursor and advances the cursor toward the
    /// back. The element stays queued for the ordinary reader.
    pub fn pop_at_breakpoint(&self) -> Option<T> {
        let mut inner = self.inner.lock();
        let index = inner.breakpoint?;
        let item = inner.items.get(index)?.clone();
        inner.breakpoint = Some(index + 1);
        Some(item)
    }

    /// Copies the current contents, front to back
    pub fn snapshot(&self) -> Vec<T> {
        self.inner.lock().items.iter().cloned().collect()
    }
}

impl<T> Default for TsBreakpointQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
