// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The live display schedulers and their shared directory.
//!
//! A [`DisplayScheduler`] is the shared half of one display worker: its group,
//! its name, and its two alarm slots behind the per-scheduler mutex. The
//! private half (snapshots, the tick loop) lives in
//! [`super::scheduler::display_scheduler_loop`].
//!
//! The [`DisplayRegistry`] mutex is the "display list mutex" of the engine's
//! lock order: it is acquired after the table lock and before any
//! per-scheduler mutex, and both the starter's placement scan and a
//! scheduler's exit path serialize on it, so an alarm can never be assigned
//! to a scheduler that has already decided to terminate.

use std::{sync::{atomic::{AtomicU64, Ordering},
                 Arc, MutexGuard},
          thread::JoinHandle};

use crate::{model::{AlarmId, GroupId},
            StdMutex};

/// Each display scheduler owns at most this many alarms.
pub const SLOT_COUNT: usize = 2;

/// Counter for display thread incarnations, so two schedulers serving the
/// same (overflowing) group still carry distinct names in the console lines.
static SCHEDULER_GENERATION: AtomicU64 = AtomicU64::new(0);

/// The two alarm slots of one scheduler. Filled `slot_1` first, then
/// `slot_2`; only the owning display thread ever clears a slot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SlotPair {
    pub slot_1: Option<AlarmId>,
    pub slot_2: Option<AlarmId>,
}

impl SlotPair {
    #[must_use]
    pub fn count(&self) -> usize {
        usize::from(self.slot_1.is_some()) + usize::from(self.slot_2.is_some())
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<AlarmId> {
        match index {
            0 => self.slot_1,
            _ => self.slot_2,
        }
    }

    pub fn clear(&mut self, index: usize) {
        match index {
            0 => self.slot_1 = None,
            _ => self.slot_2 = None,
        }
    }

    #[must_use]
    pub fn contains(&self, id: AlarmId) -> bool {
        self.slot_1 == Some(id) || self.slot_2 == Some(id)
    }

    /// Store `id` in the first empty slot. Returns the slot index, or `None`
    /// when the scheduler is full.
    pub fn assign_first_empty(&mut self, id: AlarmId) -> Option<usize> {
        if self.slot_1.is_none() {
            self.slot_1 = Some(id);
            Some(0)
        } else if self.slot_2.is_none() {
            self.slot_2 = Some(id);
            Some(1)
        } else {
            None
        }
    }
}

/// Shared state of one display worker. See the module docs.
#[derive(Debug)]
pub struct DisplayScheduler {
    pub group_id: GroupId,
    /// Thread display name, used in every console line this worker emits.
    pub name: String,
    slots: StdMutex<SlotPair>,
}

impl DisplayScheduler {
    #[must_use]
    pub fn new(group_id: GroupId) -> Self {
        let generation = SCHEDULER_GENERATION.fetch_add(1, Ordering::SeqCst);
        Self {
            group_id,
            name: format!("display-g{group_id}.{generation}"),
            slots: StdMutex::new(SlotPair::default()),
        }
    }

    /// Lock the per-scheduler mutex. Callers must already hold the table
    /// lock and/or registry mutex if they need them (lock order).
    ///
    /// # Panics
    ///
    /// Panics if the slot mutex is poisoned.
    pub fn lock_slots(&self) -> MutexGuard<'_, SlotPair> { self.slots.lock().unwrap() }

    #[must_use]
    pub fn alarm_count(&self) -> usize { self.lock_slots().count() }

    #[must_use]
    pub fn contains(&self, id: AlarmId) -> bool { self.lock_slots().contains(id) }

    /// Assign `id` if there is room. Returns `false` when full.
    #[must_use]
    pub fn try_assign(&self, id: AlarmId) -> bool {
        self.lock_slots().assign_first_empty(id).is_some()
    }
}

/// Directory of live display schedulers plus the join handles of every
/// display thread ever spawned (handles outlive deregistration so shutdown
/// can join them all).
#[derive(Debug, Default)]
pub struct DisplayRegistry {
    schedulers: StdMutex<Vec<Arc<DisplayScheduler>>>,
    handles: StdMutex<Vec<JoinHandle<()>>>,
}

impl DisplayRegistry {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Number of live schedulers.
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex is poisoned.
    #[must_use]
    pub fn count(&self) -> usize { self.schedulers.lock().unwrap().len() }

    /// First-fit placement onto an existing scheduler: the first live
    /// scheduler for `group` with spare capacity gets the alarm. The whole
    /// scan-and-assign runs under the registry mutex so it cannot race a
    /// scheduler's empty-exit.
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex is poisoned.
    pub fn try_assign_existing(
        &self,
        group: GroupId,
        id: AlarmId,
    ) -> Option<Arc<DisplayScheduler>> {
        let schedulers = self.schedulers.lock().unwrap();
        schedulers
            .iter()
            .find(|s| s.group_id == group && s.try_assign(id))
            .cloned()
    }

    /// Whether some live scheduler for `group` currently holds `id`.
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex is poisoned.
    #[must_use]
    pub fn group_scheduler_holding(&self, group: GroupId, id: AlarmId) -> bool {
        let schedulers = self.schedulers.lock().unwrap();
        schedulers
            .iter()
            .any(|s| s.group_id == group && s.contains(id))
    }

    /// Register a freshly created scheduler (starter only).
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex is poisoned.
    pub fn register(&self, scheduler: Arc<DisplayScheduler>) {
        self.schedulers.lock().unwrap().push(scheduler);
    }

    /// Track a display thread's join handle until shutdown.
    ///
    /// # Panics
    ///
    /// Panics if the handle mutex is poisoned.
    pub fn add_handle(&self, handle: JoinHandle<()>) {
        self.handles.lock().unwrap().push(handle);
    }

    /// A display thread's exit path: remove `scheduler` from the directory
    /// if its slot pair is still empty. Returns `false` when the starter won
    /// the race and assigned a new alarm, in which case the thread must keep
    /// running.
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex is poisoned.
    pub fn deregister_if_empty(&self, scheduler: &Arc<DisplayScheduler>) -> bool {
        let mut schedulers = self.schedulers.lock().unwrap();
        if scheduler.alarm_count() > 0 {
            return false;
        }
        schedulers.retain(|s| !Arc::ptr_eq(s, scheduler));
        true
    }

    /// Snapshot of the live schedulers (for the viewer-style diagnostics and
    /// tests).
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex is poisoned.
    #[must_use]
    pub fn schedulers(&self) -> Vec<Arc<DisplayScheduler>> {
        self.schedulers.lock().unwrap().clone()
    }

    /// Join every display thread ever spawned. Called once at shutdown,
    /// after the shutdown flag is raised.
    ///
    /// # Panics
    ///
    /// Panics if the handle mutex is poisoned.
    pub fn join_all(&self) {
        let handles = std::mem::take(&mut *self.handles.lock().unwrap());
        for handle in handles {
            let _ = handle.join();
        }
    }
}
