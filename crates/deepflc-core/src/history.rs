// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Deep-FLC.

//! Bounded, drop-oldest sample buffers.

use ringbuffer::{AllocRingBuffer, RingBuffer};
use std::fmt;

/// Default number of samples kept per buffer
pub const DEFAULT_CAPACITY: usize = 200;

/// Append-only buffer that evicts its oldest entry once full
pub struct BoundedHistory<T> {
    buffer: AllocRingBuffer<T>,
}

impl<T: Clone> BoundedHistory<T> {
    /// Capacity is raised to at least one sample
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: AllocRingBuffer::new(capacity.max(1)),
        }
    }

    /// Buffer holding a single initial sample
    pub fn seeded(capacity: usize, initial: T) -> Self {
        let mut history = Self::new(capacity);
        history.push(initial);
        history
    }

    pub fn push(&mut self, value: T) {
        self.buffer.push(value);
    }

    pub fn latest(&self) -> Option<&T> {
        self.buffer.back()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }

    /// Oldest to newest
    pub fn to_vec(&self) -> Vec<T> {
        self.buffer.to_vec()
    }
}

impl<T: Clone> Clone for BoundedHistory<T> {
    fn clone(&self) -> Self {
        let mut copy = Self::new(self.capacity());
        for value in self.iter() {
            copy.push(value.clone());
        }
        copy
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for BoundedHistory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedHistory")
            .field("capacity", &self.capacity())
            .field("values", &self.to_vec())
            .finish()
    }
}
