//! Fixed-length rolling sequence
//!
//! Holds the most recent N values. Pushing evicts the oldest slot so the
//! length never changes; only [`RollingBuffer::resize`] changes it.

use std::collections::VecDeque;

/// Rolling window of the last `len` values
#[derive(Debug, Clone, PartialEq)]
pub struct RollingBuffer<T> {
    slots: VecDeque<T>,
}

impl<T: Clone> RollingBuffer<T> {
    /// Buffer of `len` copies of `fill`
    pub fn new(len: usize, fill: T) -> Self {
        Self {
            slots: std::iter::repeat(fill).take(len).collect(),
        }
    }

    /// Drop the oldest value and append `value`
    pub fn push(&mut self, value: T) {
        if self.slots.is_empty() {
            return;
        }
        self.slots.pop_front();
        self.slots.push_back(value);
    }

    /// Change the length
    ///
    /// Shrinking keeps the most recent `new_len` values. Growing prepends
    /// copies of `fill`, so the newest value stays last.
    pub fn resize(&mut self, new_len: usize, fill: T) {
        let len = self.slots.len();
        if new_len < len {
            self.slots.drain(..len - new_len);
        } else {
            for _ in len..new_len {
                self.slots.push_front(fill.clone());
            }
        }
    }

    /// Values from oldest to newest
    pub fn to_vec(&self) -> Vec<T> {
        self.slots.iter().cloned().collect()
    }
}

impl<T> RollingBuffer<T> {
    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the buffer has no slot at all
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Newest value
    pub fn last(&self) -> Option<&T> {
        self.slots.back()
    }

    /// Slot by index, 0 being the oldest
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index)
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.slots.iter()
    }

    /// Mutable iteration, oldest first
    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut T> + ExactSizeIterator {
        self.slots.iter_mut()
    }
}

impl<T> FromIterator<T> for RollingBuffer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}

impl<'a, T> IntoIterator for &'a RollingBuffer<T> {
    type Item = &'a T;
    type IntoIter = std::collections::vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_length() {
        let mut buf = RollingBuffer::new(3, 0);
        buf.push(1);
        buf.push(2);
        buf.push(3);
        buf.push(4);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.to_vec(), vec![2, 3, 4]);
        assert_eq!(buf.last(), Some(&4));
    }

    #[test]
    fn test_push_on_empty_is_noop() {
        let mut buf: RollingBuffer<i32> = RollingBuffer::new(0, 0);
        buf.push(7);
        assert!(buf.is_empty());
        assert_eq!(buf.last(), None);
    }

    #[test]
    fn test_resize_same_length() {
        let mut buf: RollingBuffer<i32> = (0..4).collect();
        buf.resize(4, -1);
        assert_eq!(buf.to_vec(), vec![0, 1, 2, 3]);
    }
}
