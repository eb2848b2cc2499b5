use std::collections::VecDeque;

/// Fixed-capacity FIFO. Pushing into a full buffer evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append, returning the evicted entry if the buffer was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.capacity == 0 {
            return Some(item);
        }
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// Remove up to `n` oldest entries.
    pub fn drain_oldest(&mut self, n: usize) -> Vec<T> {
        let n = n.min(self.items.len());
        self.items.drain(..n).collect()
    }

    /// Last `n` entries, oldest first.
    pub fn last(&self, n: usize) -> impl Iterator<Item = &T> {
        let skip = self.items.len().saturating_sub(n);
        self.items.iter().skip(skip)
    }

    pub fn newest(&self) -> Option<&T> {
        self.items.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: PartialEq> RingBuffer<T> {
    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_first() {
        let mut ring = RingBuffer::new(3);
        assert_eq!(ring.push(1), None);
        ring.push(2);
        ring.push(3);
        assert_eq!(ring.push(4), Some(1));
        assert_eq!(ring.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut ring = RingBuffer::new(8);
        for i in 0..100 {
            ring.push(i);
            assert!(ring.len() <= ring.capacity());
        }
        assert_eq!(ring.newest(), Some(&99));
        assert!(ring.contains(&92));
        assert!(!ring.contains(&91));
    }

    #[test]
    fn drain_oldest_half() {
        let mut ring = RingBuffer::new(8);
        for i in 0..8 {
            ring.push(i);
        }
        assert_eq!(ring.drain_oldest(4), vec![0, 1, 2, 3]);
        assert_eq!(ring.len(), 4);
        assert!(!ring.is_full());
        assert_eq!(ring.drain_oldest(10).len(), 4);
        assert!(ring.is_empty());
    }

    #[test]
    fn last_returns_tail_in_order() {
        let mut ring = RingBuffer::new(5);
        for i in 0..5 {
            ring.push(i);
        }
        assert_eq!(ring.last(2).copied().collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(ring.last(10).count(), 5);
    }

    #[test]
    fn zero_capacity_holds_nothing() {
        let mut ring = RingBuffer::new(0);
        assert_eq!(ring.push("x"), Some("x"));
        assert!(ring.is_empty());
    }
}
