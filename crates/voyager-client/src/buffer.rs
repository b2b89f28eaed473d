use std::collections::VecDeque;

/// Fixed-capacity retention buffer with the host client's stack-like
/// discipline: insertion appends at the newest end, eviction under capacity
/// pressure discards from the newest end, and retrieval pops the newest
/// element. Growth pressure therefore discards the most recently added
/// element, not the oldest. This mirrors the reference behavior exactly and
/// must not be changed to oldest-first without a protocol owner's sign-off.
#[derive(Clone, Debug)]
pub struct BoundedBuffer<T> {
    capacity: usize,
    items: VecDeque<T>,
}

impl<T> BoundedBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity),
        }
    }

    /// Append at the newest end, evicting exactly one element from the
    /// newest end first when the buffer is at capacity.
    pub fn push(&mut self, item: T) {
        if self.items.len() >= self.capacity {
            self.items.pop_back();
        }
        self.items.push_back(item);
    }

    /// Remove and return the newest element.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_back()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_never_exceeds_capacity() {
        let mut buffer = BoundedBuffer::new(5);
        for i in 0..100 {
            buffer.push(i);
            assert!(buffer.len() <= 5);
        }
        assert_eq!(buffer.len(), 5);
    }

    #[test]
    fn eviction_discards_the_newest_element() {
        // 21 distinct insertions into capacity 20: the 20th is evicted to
        // make room for the 21st, the first 19 survive untouched.
        let mut buffer = BoundedBuffer::new(20);
        for i in 1..=21 {
            buffer.push(i);
        }
        assert_eq!(buffer.len(), 20);

        assert_eq!(buffer.pop(), Some(21));
        let mut rest = Vec::new();
        while let Some(item) = buffer.pop() {
            rest.push(item);
        }
        assert_eq!(rest, (1..=19).rev().collect::<Vec<_>>());
    }

    #[test]
    fn pop_returns_newest_first() {
        let mut buffer = BoundedBuffer::new(3);
        buffer.push("a");
        buffer.push("b");
        assert_eq!(buffer.pop(), Some("b"));
        assert_eq!(buffer.pop(), Some("a"));
        assert_eq!(buffer.pop(), None);
    }

    #[test]
    fn empty_buffer_pops_none() {
        let mut buffer: BoundedBuffer<i32> = BoundedBuffer::new(1);
        assert!(buffer.is_empty());
        assert_eq!(buffer.pop(), None);
    }
}
