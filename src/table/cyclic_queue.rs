use std::collections::VecDeque;

/// Fixed-capacity ring buffer backing rolling indicator windows.
///
/// Enqueueing into a full queue evicts and returns the oldest item.
#[derive(Debug, Clone, PartialEq)]
pub struct CyclicQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> CyclicQueue<T> {
    /// A zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.items.len() == self.capacity
    }

    pub fn enqueue(&mut self, item: T) -> Option<T> {
        let evicted = if self.is_full() {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// Item `offset` positions back from the newest; `latest(0)` is the newest.
    #[must_use]
    pub fn latest(&self, offset: usize) -> Option<&T> {
        let len = self.items.len();
        if offset >= len {
            return None;
        }
        self.items.get(len - 1 - offset)
    }

    /// Item by position from the oldest.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
