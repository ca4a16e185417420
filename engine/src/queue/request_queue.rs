// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Bounded ring buffer between the input loop (producer) and the dispatcher
//! (consumer).
//!
//! The ring itself is the classic `head`/`tail`/`count` arrangement over
//! `Vec<Option<T>>`. On top of that sit one mutex and two condition variables
//! (`not_full`, `not_empty`): [`RequestQueue::enqueue`] blocks while the ring
//! is full, [`RequestQueue::dequeue`] blocks while it is empty. Both return
//! the slot index they touched so callers can report it in their console
//! lines. FIFO order is guaranteed; a single consumer is assumed but multiple
//! producers are tolerated.
//!
//! [`RequestQueue::close`] unblocks every waiter for shutdown: producers get
//! [`AlarmEngineError::QueueClosed`], the consumer drains what is left and
//! then sees `None`.

use std::sync::{Condvar, Mutex};

use crate::common::AlarmEngineError;

/// Default capacity of the alarm request queue.
pub const REQUEST_QUEUE_CAPACITY: usize = 4;

#[derive(Debug)]
struct Ring<T> {
    storage: Vec<Option<T>>,
    head: usize,
    tail: usize,
    count: usize,
    closed: bool,
}

/// Bounded blocking FIFO. See the module docs.
#[derive(Debug)]
pub struct RequestQueue<T> {
    ring: Mutex<Ring<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

impl<T> Default for RequestQueue<T> {
    fn default() -> Self { Self::new(REQUEST_QUEUE_CAPACITY) }
}

impl<T> RequestQueue<T> {
    /// # Panics
    ///
    /// Panics if `capacity` is zero; a zero-capacity queue can never admit a
    /// request.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "request queue capacity must be positive");
        let mut storage = Vec::with_capacity(capacity);
        storage.resize_with(capacity, || None);
        Self {
            ring: Mutex::new(Ring {
                storage,
                head: 0,
                tail: 0,
                count: 0,
                closed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize { self.capacity }

    /// Number of requests currently queued.
    ///
    /// # Panics
    ///
    /// Panics if the queue mutex is poisoned.
    #[must_use]
    pub fn len(&self) -> usize { self.ring.lock().unwrap().count }

    /// # Panics
    ///
    /// Panics if the queue mutex is poisoned.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Insert `item` at the head of the ring, blocking while the ring is
    /// full. Returns the slot index used.
    ///
    /// # Errors
    ///
    /// Returns [`AlarmEngineError::QueueClosed`] if the queue was closed
    /// before the item could be stored.
    ///
    /// # Panics
    ///
    /// Panics if the queue mutex is poisoned.
    pub fn enqueue(&self, item: T) -> Result<usize, AlarmEngineError> {
        let mut ring = self.ring.lock().unwrap();
        while ring.count == self.capacity && !ring.closed {
            ring = self.not_full.wait(ring).unwrap();
        }
        if ring.closed {
            return Err(AlarmEngineError::QueueClosed);
        }
        let slot = ring.head;
        ring.storage[slot] = Some(item);
        ring.head = (ring.head + 1) % self.capacity;
        ring.count += 1;
        self.not_empty.notify_one();
        Ok(slot)
    }

    /// Remove the oldest request from the tail of the ring, blocking while
    /// the ring is empty. Returns the request and the slot index it occupied,
    /// or `None` once the queue is closed *and* drained.
    ///
    /// # Panics
    ///
    /// Panics if the queue mutex is poisoned, or if the ring bookkeeping is
    /// inconsistent (an occupied count with an empty slot).
    pub fn dequeue(&self) -> Option<(T, usize)> {
        let mut ring = self.ring.lock().unwrap();
        while ring.count == 0 && !ring.closed {
            ring = self.not_empty.wait(ring).unwrap();
        }
        if ring.count == 0 {
            return None;
        }
        let slot = ring.tail;
        let item = ring.storage[slot]
            .take()
            .expect("occupied ring slot must hold a request");
        ring.tail = (ring.tail + 1) % self.capacity;
        ring.count -= 1;
        self.not_full.notify_one();
        Some((item, slot))
    }

    /// Close the queue: producers start failing, the consumer drains what is
    /// left and then sees `None`. Idempotent.
    ///
    /// # Panics
    ///
    /// Panics if the queue mutex is poisoned.
    pub fn close(&self) {
        let mut ring = self.ring.lock().unwrap();
        ring.closed = true;
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }
}
