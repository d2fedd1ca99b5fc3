//! Thread-safe LRU cache with optional time-to-live

use parking_lot::Mutex;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

const NIL: usize = usize::MAX;

/// Arena slot; `entry` is `None` while the slot sits on the free list
struct Slot<K, V> {
    entry: Option<(K, V)>,
    written: Instant,
    prev: usize,
    next: usize,
}

/// Recency list threaded through the arena by index.
///
/// `head` is the least recently used slot, `tail` the most recent.
struct LruState<K, V> {
    map: HashMap<K, usize>,
    slots: Vec<Slot<K, V>>,
    free: Vec<usize>,
    head: usize,
    tail: usize,
}

impl<K: Eq + Hash, V> LruState<K, V> {
    fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
        if prev == NIL {
            self.head = next;
        } else {
            self.slots[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.slots[next].prev = prev;
        }
        self.slots[idx].prev = NIL;
        self.slots[idx].next = NIL;
    }

    fn link_back(&mut self, idx: usize) {
        self.slots[idx].prev = self.tail;
        self.slots[idx].next = NIL;
        if self.tail == NIL {
            self.head = idx;
        } else {
            self.slots[self.tail].next = idx;
        }
        self.tail = idx;
    }

    fn touch(&mut self, idx: usize) {
        if self.tail != idx {
            self.unlink(idx);
            self.link_back(idx);
        }
    }

    fn allocate(&mut self, key: K, value: V, now: Instant) -> usize {
        let slot = Slot {
            entry: Some((key, value)),
            written: now,
            prev: NIL,
            next: NIL,
        };
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = slot;
                idx
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, idx: usize) -> Option<V> {
        self.unlink(idx);
        self.free.push(idx);
        let (key, value) = self.slots[idx].entry.take()?;
        self.map.remove(&key);
        Some(value)
    }

    fn clear(&mut self) {
        self.map.clear();
        self.slots.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
    }
}

/// A fixed-capacity cache evicting the least recently used entry.
///
/// Both [`get`](Self::get) and [`put`](Self::put) mark an entry as most
/// recently used. With a TTL, an entry older than the TTL (measured from its
/// last `put`) is dropped by the `get` that finds it. Entries live in a
/// slot arena linked by index; freed slots are recycled.
///
/// A capacity of 0 stores nothing.
///
/// # Example
///
/// ```rust
/// use rust_schedule_kit::cache::LruCache;
///
/// let cache = LruCache::new(2, None);
/// cache.put("a", 1);
/// cache.put("b", 2);
/// assert_eq!(cache.get("a"), Some(1));
///
/// cache.put("c", 3); // evicts "b"
/// assert_eq!(cache.get("b"), None);
/// assert_eq!(cache.len(), 2);
/// ```
pub struct LruCache<K, V> {
    capacity: usize,
    ttl: Option<Duration>,
    state: Mutex<LruState<K, V>>,
}

impl<K, V> std::fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .field("len", &self.state.lock().map.len())
            .finish()
    }
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache holding at most `capacity` entries; `ttl` of `None` never expires
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            capacity,
            ttl,
            state: Mutex::new(LruState::new(capacity)),
        }
    }

    fn is_expired(&self, slot: &Slot<K, V>, now: Instant) -> bool {
        self.ttl
            .is_some_and(|ttl| now.saturating_duration_since(slot.written) > ttl)
    }

    /// Look up `key`, marking it most recently used
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let idx = *state.map.get(key)?;

        if self.is_expired(&state.slots[idx], Instant::now()) {
            state.release(idx);
            return None;
        }

        state.touch(idx);
        state.slots[idx].entry.as_ref().map(|(_, value)| value.clone())
    }

    /// Insert or update `key`, evicting the least recently used entry when full.
    ///
    /// Returns the previous value when `key` was already cached.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        if self.capacity == 0 {
            return None;
        }

        let now = Instant::now();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if let Some(&idx) = state.map.get(&key) {
            let slot = &mut state.slots[idx];
            slot.written = now;
            let previous = slot
                .entry
                .as_mut()
                .map(|(_, current)| std::mem::replace(current, value));
            state.touch(idx);
            return previous;
        }

        let idx = state.allocate(key.clone(), value, now);
        state.map.insert(key, idx);
        state.link_back(idx);

        if state.map.len() > self.capacity {
            let oldest = state.head;
            state.release(oldest);
        }
        None
    }

    /// Remove `key`, returning its value even if expired
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut state = self.state.lock();
        let idx = *state.map.get(key)?;
        state.release(idx)
    }

    /// Number of cached entries, including expired ones not yet looked up
    pub fn len(&self) -> usize {
        self.state.lock().map.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.state.lock().map.is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.state.lock().clear();
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entry time-to-live
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }
}
