//! Fixed-capacity buffers backing the price history and the feed logs.
//!
//! Two orderings are needed:
//! - [`RingBuffer`] keeps points oldest → newest and evicts from the front
//!   (price history, same shape as the indicator windows).
//! - [`FeedLog`] keeps entries newest → oldest and evicts from the back
//!   (news and HFT feeds, which the read layer shows newest first).

use std::collections::VecDeque;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Append-at-back buffer that drops its oldest entry once full.
#[derive(Debug, Clone, PartialEq)]
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

    /// Append a point, returning the evicted one if the buffer was full.
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

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn oldest(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn newest(&self) -> Option<&T> {
        self.items.back()
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }
}

impl<T: Clone> RingBuffer<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

/// Prepend-at-front log capped to the most recent `capacity` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedLog<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> FeedLog<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert as the newest entry; anything past capacity falls off the tail.
    pub fn prepend(&mut self, item: T) {
        self.items.push_front(item);
        self.items.truncate(self.capacity);
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

    pub fn latest(&self) -> Option<&T> {
        self.items.front()
    }

    /// Newest to oldest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }
}

// Both buffers travel as `{capacity, items}` so a deserialized state keeps
// its caps. Items beyond capacity are dropped on the way in.

#[derive(Serialize, Deserialize)]
struct Wire<T> {
    capacity: usize,
    items: Vec<T>,
}

impl<T: Serialize + Clone> Serialize for RingBuffer<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Wire {
            capacity: self.capacity,
            items: self.items.iter().cloned().collect(),
        }
        .serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for RingBuffer<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = Wire::<T>::deserialize(deserializer)?;
        let mut ring = RingBuffer::new(wire.capacity);
        for item in wire.items {
            ring.push(item);
        }
        Ok(ring)
    }
}

impl<T: Serialize + Clone> Serialize for FeedLog<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Wire {
            capacity: self.capacity,
            items: self.items.iter().cloned().collect(),
        }
        .serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for FeedLog<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = Wire::<T>::deserialize(deserializer)?;
        let mut items: VecDeque<T> = wire.items.into();
        items.truncate(wire.capacity);
        Ok(FeedLog {
            items,
            capacity: wire.capacity,
        })
    }
}
