use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};

use log::{trace, warn};
use parking_lot::{const_mutex, Mutex, MutexGuard};

use crate::{
    queues::TsQueue,
    types::{Coherency, TemporalEntity},
};

use super::TimestampedMessage;

type Timestream = TsQueue<TimestampedMessage>;

// Serializes every link/unlink so two of them never interleave their
// two-map lock acquisitions.
static LINK_LOCK: Mutex<()> = const_mutex(());

struct MapInner {
    streams: HashMap<TemporalEntity, Arc<Timestream>>,
    link: Option<Weak<EntityTimestreamMap>>,
}

impl MapInner {
    fn stream_for(&mut self, entity: TemporalEntity) -> &Arc<Timestream> {
        self.streams
            .entry(entity)
            .or_insert_with(|| Arc::new(TsQueue::new()))
    }
}

/// Per-entity timestreams flowing from one timeslice to an adjacent one.
///
/// Streams are created lazily on first push. A map may be linked to a
/// duplicate so every push is also delivered there; this feeds a parallel
/// cosmos the same upstream data as the live timeslice it shadows.
pub struct EntityTimestreamMap {
    inner: Mutex<MapInner>,
}

impl EntityTimestreamMap {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MapInner {
                streams: HashMap::new(),
                link: None,
            }),
        }
    }

    /// Appends to `entity`'s stream, creating it if needed, then repeats the
    /// push on the linked map if there is one.
    pub fn push_to_timestream(&self, entity: TemporalEntity, message: TimestampedMessage) {
        let linked = {
            let mut inner = self.inner.lock();
            let linked = inner.link.as_ref().and_then(Weak::upgrade);
            inner.stream_for(entity).push_back(message.clone());
            linked
        };

        if let Some(linked) = linked {
            linked.push_local(entity, message);
        }
    }

    fn push_local(&self, entity: TemporalEntity, message: TimestampedMessage) {
        let mut inner = self.inner.lock();
        inner.stream_for(entity).push_back(message);
    }

    fn stream(&self, entity: TemporalEntity) -> Option<Arc<Timestream>> {
        self.inner.lock().streams.get(&entity).cloned()
    }

    /// True iff `entity` has a non-empty stream whose front message is due at
    /// `current`.
    pub fn entity_has_data(&self, entity: TemporalEntity, current: Coherency) -> bool {
        self.stream(entity)
            .and_then(|stream| stream.front_with(|front| front.is_due(current)))
            .unwrap_or(false)
    }

    /// Dequeues the front of `entity`'s stream if it is due at `current`
    pub fn pop_from_timestream(
        &self,
        entity: TemporalEntity,
        current: Coherency,
    ) -> Option<TimestampedMessage> {
        let stream = self.stream(entity)?;
        stream.pop_front_if(|front| front.is_due(current))
    }

    /// Snapshot of every entity that has a stream slot
    pub fn get_entities_with_streams(&self) -> Vec<TemporalEntity> {
        self.inner.lock().streams.keys().copied().collect()
    }

    pub fn stream_len(&self, entity: TemporalEntity) -> usize {
        self.stream(entity).map(|stream| stream.len()).unwrap_or(0)
    }

    /// Empties `entity`'s stream, keeping its slot
    pub fn clear(&self, entity: TemporalEntity) {
        if let Some(stream) = self.stream(entity) {
            stream.clear();
        }
    }

    /// Empties every stream, keeping the slots
    pub fn clear_all(&self) {
        let inner = self.inner.lock();
        for stream in inner.streams.values() {
            stream.clear();
        }
    }

    /// Drops `entity`'s slot. A later push recreates it.
    pub fn remove(&self, entity: TemporalEntity) {
        self.inner.lock().streams.remove(&entity);
    }

    pub fn remove_all(&self) {
        self.inner.lock().streams.clear();
    }

    pub fn is_linked(&self) -> bool {
        self.inner
            .lock()
            .link
            .as_ref()
            .map(|link| link.strong_count() > 0)
            .unwrap_or(false)
    }

    /// Makes every later push to `src` also land in `dst`.
    ///
    /// Replaces any previous link of `src`. Linking a map to itself is
    /// refused with a warning.
    pub fn link_timestreams(src: &Arc<EntityTimestreamMap>, dst: &Arc<EntityTimestreamMap>) {
        if Arc::ptr_eq(src, dst) {
            warn!("Refusing to link a timestream map to itself");
            return;
        }

        let _serial = LINK_LOCK.lock();
        let (mut src_inner, _dst_inner) = Self::lock_pair(src, dst);
        src_inner.link = Some(Arc::downgrade(dst));
        trace!("Linked timestream map {:p} to {:p}", Arc::as_ptr(src), Arc::as_ptr(dst));
    }

    /// Breaks `map`'s outgoing link. Unlinking a map that was never linked
    /// does nothing.
    pub fn unlink_timestreams(map: &EntityTimestreamMap) {
        let _serial = LINK_LOCK.lock();
        map.inner.lock().link = None;
    }

    /// Creates a duplicate holding a copy of every buffered message and links
    /// `src` to it, so the duplicate observes every message exactly once.
    pub fn fork(src: &Arc<EntityTimestreamMap>) -> Arc<EntityTimestreamMap> {
        let _serial = LINK_LOCK.lock();
        let mut src_inner = src.inner.lock();

        let streams = src_inner
            .streams
            .iter()
            .map(|(entity, stream)| {
                let copy = TsQueue::new();
                for message in stream.snapshot() {
                    copy.push_back(message);
                }
                (*entity, Arc::new(copy))
            })
            .collect();

        let duplicate = Arc::new(EntityTimestreamMap {
            inner: Mutex::new(MapInner {
                streams,
                link: None,
            }),
        });
        src_inner.link = Some(Arc::downgrade(&duplicate));
        duplicate
    }

    // Locks both maps in address order.
    fn lock_pair<'a>(
        first: &'a EntityTimestreamMap,
        second: &'a EntityTimestreamMap,
    ) -> (MutexGuard<'a, MapInner>, MutexGuard<'a, MapInner>) {
        let first_addr = first as *const EntityTimestreamMap as usize;
        let second_addr = second as *const EntityTimestreamMap as usize;
        if first_addr < second_addr {
            let first_guard = first.inner.lock();
            let second_guard = second.inner.lock();
            (first_guard, second_guard)
        } else {
            let second_guard = second.inner.lock();
            let first_guard = first.inner.lock();
            (first_guard, second_guard)
        }
    }
}

impl Default for EntityTimestreamMap {
    fn default() -> Self {
        Self::new()
    }
}
