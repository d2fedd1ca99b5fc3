//! Min-heap ordered by [`PriorityElement::priority`].

use super::PriorityElement;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Heap slot caching the element's priority at insertion time
struct HeapEntry<T> {
    priority: i64,
    element: T,
}

impl<T> PartialEq for HeapEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl<T> Eq for HeapEntry<T> {}

impl<T> PartialOrd for HeapEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for HeapEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the lowest priority surfaces
        other.priority.cmp(&self.priority)
    }
}

/// Unsynchronized array-backed binary min-heap.
///
/// This is the building block shared by [`PriorityQueue`],
/// [`BlockingQueue`](super::BlockingQueue) and the timing scheduler, each of
/// which wraps it in its own lock.
pub struct PriorityHeap<T> {
    heap: BinaryHeap<HeapEntry<T>>,
}

impl<T: PriorityElement> PriorityHeap<T> {
    /// Create an empty heap with room for `capacity` elements
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    /// Insert an element, O(log n)
    pub fn push(&mut self, element: T) {
        self.heap.push(HeapEntry {
            priority: element.priority(),
            element,
        });
    }

    /// Remove the element with the lowest priority, O(log n)
    pub fn pop(&mut self) -> Option<T> {
        self.heap.pop().map(|entry| entry.element)
    }

    /// Remove every element in ascending priority order, O(n log n)
    pub fn pop_all(&mut self) -> Vec<T> {
        let mut elements = Vec::with_capacity(self.heap.len());
        while let Some(entry) = self.heap.pop() {
            elements.push(entry.element);
        }
        elements
    }

    /// The element that `pop` would return
    pub fn peek(&self) -> Option<&T> {
        self.heap.peek().map(|entry| &entry.element)
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the heap is empty
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop every element
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

impl<T: PriorityElement> Default for PriorityHeap<T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<T: PriorityElement> FromIterator<T> for PriorityHeap<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            heap: iter
                .into_iter()
                .map(|element| HeapEntry {
                    priority: element.priority(),
                    element,
                })
                .collect(),
        }
    }
}

/// Thread-safe min-priority queue.
///
/// Every operation takes the internal mutex for the duration of the heap
/// mutation; nothing blocks waiting for elements.
///
/// # Example
///
/// ```rust
/// use rust_schedule_kit::queue::PriorityQueue;
///
/// let queue = PriorityQueue::with_capacity(4);
/// queue.push(30i64);
/// queue.push(-1i64);
/// queue.push(7i64);
///
/// assert_eq!(queue.pop(), Some(-1));
/// assert_eq!(queue.pop_all(), vec![7, 30]);
/// assert_eq!(queue.pop(), None);
/// ```
pub struct PriorityQueue<T> {
    heap: Mutex<PriorityHeap<T>>,
}

impl<T: PriorityElement> PriorityQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty queue with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Mutex::new(PriorityHeap::with_capacity(capacity)),
        }
    }

    /// Insert an element
    pub fn push(&self, element: T) {
        self.heap.lock().push(element);
    }

    /// Remove the lowest-priority element, `None` when empty
    pub fn pop(&self) -> Option<T> {
        self.heap.lock().pop()
    }

    /// Remove every element in ascending priority order
    pub fn pop_all(&self) -> Vec<T> {
        self.heap.lock().pop_all()
    }

    /// Priority of the element `pop` would return
    pub fn peek_priority(&self) -> Option<i64> {
        self.heap.lock().peek().map(|element| element.priority())
    }

    /// Number of queued elements
    pub fn len(&self) -> usize {
        self.heap.lock().len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.heap.lock().is_empty()
    }
}

impl<T: PriorityElement> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
