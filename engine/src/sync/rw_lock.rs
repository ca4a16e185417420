// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! A writer-preferring reader/writer lock built from one mutex and two
//! condition variables, with RAII guards.
//!
//! The alarm table sees frequent overlap between readers (the viewer, every
//! display scheduler's reconciliation pass) and writers (the dispatcher and
//! all five handlers). A plain mutex would serialize the readers for no
//! reason; a reader-preferring lock would let a steady stream of scheduler
//! ticks starve the handlers. Writer preference is the policy: a reader is
//! admitted only when no writer is active *or waiting*.

use std::{cell::UnsafeCell,
          ops::{Deref, DerefMut},
          sync::{Condvar, Mutex}};

#[derive(Debug, Default)]
struct LockState {
    active_readers: usize,
    writer_active: bool,
    writers_waiting: usize,
}

/// Writer-preferring reader/writer lock. See the module docs for the policy.
///
/// The `Sync` bound mirrors [`std::sync::RwLock`]: shared read guards hand out
/// `&T` on multiple threads at once, so `T` must be `Send + Sync`.
#[derive(Debug)]
pub struct TableRwLock<T> {
    state: Mutex<LockState>,
    readers_cv: Condvar,
    writers_cv: Condvar,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for TableRwLock<T> {}
unsafe impl<T: Send + Sync> Sync for TableRwLock<T> {}

impl<T> TableRwLock<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            state: Mutex::new(LockState::default()),
            readers_cv: Condvar::new(),
            writers_cv: Condvar::new(),
            data: UnsafeCell::new(value),
        }
    }

    /// Consume and return the inner value.
    #[must_use]
    pub fn into_inner(self) -> T { self.data.into_inner() }

    /// Acquire a shared (read) lock. Blocks while a writer is active or
    /// waiting, so a burst of readers can never starve a writer.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned (a worker panicked while holding it);
    /// the engine treats that as unrecoverable.
    pub fn read(&self) -> TableReadGuard<'_, T> {
        let mut state = self.state.lock().unwrap();
        while state.writer_active || state.writers_waiting > 0 {
            state = self.readers_cv.wait(state).unwrap();
        }
        state.active_readers += 1;
        TableReadGuard { lock: self }
    }

    /// Acquire an exclusive (write) lock. Blocks while readers are active or
    /// another writer holds the lock.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned; the engine treats that as
    /// unrecoverable.
    pub fn write(&self) -> TableWriteGuard<'_, T> {
        let mut state = self.state.lock().unwrap();
        state.writers_waiting += 1;
        while state.writer_active || state.active_readers > 0 {
            state = self.writers_cv.wait(state).unwrap();
        }
        state.writers_waiting -= 1;
        state.writer_active = true;
        TableWriteGuard { lock: self }
    }

    fn read_unlock(&self) {
        let mut state = self.state.lock().unwrap();
        state.active_readers -= 1;
        if state.active_readers == 0 && state.writers_waiting > 0 {
            self.writers_cv.notify_one();
        }
    }

    fn write_unlock(&self) {
        let mut state = self.state.lock().unwrap();
        state.writer_active = false;
        if state.writers_waiting > 0 {
            self.writers_cv.notify_one();
        } else {
            self.readers_cv.notify_all();
        }
    }
}

/// RAII guard for shared (read) access.
#[derive(Debug)]
pub struct TableReadGuard<'a, T> {
    lock: &'a TableRwLock<T>,
}

impl<T> Deref for TableReadGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T { unsafe { &*self.lock.data.get() } }
}

impl<T> Drop for TableReadGuard<'_, T> {
    fn drop(&mut self) { self.lock.read_unlock(); }
}

/// RAII guard for exclusive (write) access.
#[derive(Debug)]
pub struct TableWriteGuard<'a, T> {
    lock: &'a TableRwLock<T>,
}

impl<T> Deref for TableWriteGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T { unsafe { &*self.lock.data.get() } }
}

impl<T> DerefMut for TableWriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T { unsafe { &mut *self.lock.data.get() } }
}

impl<T> Drop for TableWriteGuard<'_, T> {
    fn drop(&mut self) { self.lock.write_unlock(); }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc,
              thread,
              time::Duration};

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn readers_share_writers_exclude() {
        let lock = Arc::new(TableRwLock::new(0_u64));

        // Two simultaneous readers.
        let r1 = lock.read();
        let r2 = lock.read();
        assert_eq!(*r1, 0);
        assert_eq!(*r2, 0);
        drop(r1);
        drop(r2);

        // Writer gets exclusive access and mutates.
        {
            let mut w = lock.write();
            *w += 1;
        }
        assert_eq!(*lock.read(), 1);
    }

    #[test]
    fn writer_waits_for_active_reader() {
        let lock = Arc::new(TableRwLock::new(Vec::<u32>::new()));
        let reader_guard = lock.read();

        let writer = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                let mut w = lock.write();
                w.push(42);
            })
        };

        // The writer cannot have run yet.
        thread::sleep(Duration::from_millis(50));
        assert!(reader_guard.is_empty());
        drop(reader_guard);

        writer.join().unwrap();
        assert_eq!(*lock.read(), vec![42]);
    }

    #[test]
    fn waiting_writer_blocks_new_readers() {
        let lock = Arc::new(TableRwLock::new(0_u64));
        let held = lock.read();

        let writer = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                let mut w = lock.write();
                *w = 7;
            })
        };

        // Give the writer time to register as waiting, then race a new
        // reader against it. The reader must observe the writer's value.
        thread::sleep(Duration::from_millis(50));
        let late_reader = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || *lock.read())
        };
        thread::sleep(Duration::from_millis(50));
        drop(held);

        writer.join().unwrap();
        assert_eq!(late_reader.join().unwrap(), 7);
    }

    #[test]
    fn stress_many_readers_and_writers() {
        let lock = Arc::new(TableRwLock::new(0_u64));
        let mut handles = vec![];

        for _ in 0..4 {
            let lock = Arc::clone(&lock);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    let mut w = lock.write();
                    *w += 1;
                }
            }));
        }
        for _ in 0..4 {
            let lock = Arc::clone(&lock);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    let r = lock.read();
                    assert!(*r <= 400);
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*lock.read(), 400);
    }
}
