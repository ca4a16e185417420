// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Generation-counter condition variables, one per handler kind.
//!
//! The dispatcher inserts a request into the alarm table, releases the writer
//! lock, and *then* notifies the handler. A naked condvar would lose that
//! notification if the handler had not yet entered its wait. The generation
//! counter closes the race: the handler snapshots the counter *before*
//! scanning the table, and [`Signal::wait_past`] returns immediately if the
//! counter moved in the meantime (Mesa semantics; spurious wake-ups are
//! harmless because every waiter re-checks its table predicate).

use std::sync::{Condvar, Mutex};

/// One wake-up channel. See the module docs for the protocol.
#[derive(Debug, Default)]
pub struct Signal {
    generation: Mutex<u64>,
    cv: Condvar,
}

impl Signal {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Snapshot the current generation. Call this *before* scanning for work.
    ///
    /// # Panics
    ///
    /// Panics if the inner mutex is poisoned.
    #[must_use]
    pub fn current(&self) -> u64 { *self.generation.lock().unwrap() }

    /// Bump the generation and wake all waiters.
    ///
    /// # Panics
    ///
    /// Panics if the inner mutex is poisoned.
    pub fn notify(&self) {
        let mut generation = self.generation.lock().unwrap();
        *generation = generation.wrapping_add(1);
        self.cv.notify_all();
    }

    /// Block until the generation differs from `seen`, then return the new
    /// value. Returns immediately if it already differs.
    ///
    /// # Panics
    ///
    /// Panics if the inner mutex is poisoned.
    #[must_use]
    pub fn wait_past(&self, seen: u64) -> u64 {
        let mut generation = self.generation.lock().unwrap();
        while *generation == seen {
            generation = self.cv.wait(generation).unwrap();
        }
        *generation
    }
}

/// The per-kind wake-up channels the dispatcher signals. `Suspend` and
/// `Reactivate` share one channel; everything else has its own.
#[derive(Debug, Default)]
pub struct HandlerSignals {
    pub start: Signal,
    pub change: Signal,
    pub remove: Signal,
    pub suspend: Signal,
    pub view: Signal,
}

impl HandlerSignals {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Wake every handler. Used at shutdown so each worker re-checks the
    /// shutdown flag.
    pub fn notify_all(&self) {
        self.start.notify();
        self.change.notify();
        self.remove.notify();
        self.suspend.notify();
        self.view.notify();
    }
}
