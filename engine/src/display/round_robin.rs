// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The shared cursor that forces printing to visit groups in ascending
//! group-id order.
//!
//! The cursor holds the id of the most recently displayed alarm (`None` at a
//! cycle boundary). A scheduler asks [`RoundRobinCursor::is_next_group`]
//! whether its group's turn has come; after taking its turn it calls
//! [`RoundRobinCursor::advance`], which resets the cursor when the largest
//! group id has displayed so the next cycle starts at the smallest.
//!
//! The cursor mutex sits *below* the table lock and the per-scheduler mutex
//! in the engine's lock order: both operations here are called with the
//! table read guard already held.

use crate::{model::{AlarmId, GroupId},
            table::AlarmTable,
            StdMutex};

/// See the module docs.
#[derive(Debug, Default)]
pub struct RoundRobinCursor {
    most_recent: StdMutex<Option<AlarmId>>,
}

impl RoundRobinCursor {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// The most recently displayed alarm id, if a cycle is in progress.
    ///
    /// # Panics
    ///
    /// Panics if the cursor mutex is poisoned.
    #[must_use]
    pub fn current(&self) -> Option<AlarmId> { *self.most_recent.lock().unwrap() }

    /// Whether `group` is the next group allowed to display, given the
    /// table's current set of active groups (ascending, deduped).
    ///
    /// - no active groups: anybody may proceed (their alarms just died);
    /// - one active group: only that group;
    /// - otherwise: the group after the cursor's group in ascending order,
    ///   wrapping; if the cursor's alarm vanished, the smallest group.
    ///
    /// # Panics
    ///
    /// Panics if the cursor mutex is poisoned.
    #[must_use]
    pub fn is_next_group(&self, group: GroupId, table: &AlarmTable) -> bool {
        let groups = table.active_groups();
        match groups.as_slice() {
            [] => true,
            [only] => *only == group,
            _ => {
                let cursor_position = self
                    .current()
                    .and_then(|id| table.group_of(id))
                    .and_then(|g| groups.iter().position(|&x| x == g));
                match cursor_position {
                    None => group == groups[0],
                    Some(i) => group == groups[(i + 1) % groups.len()],
                }
            }
        }
    }

    /// Record that `id` just displayed. `is_largest` marks the cycle
    /// boundary: the cursor resets so the smallest group goes next.
    ///
    /// # Panics
    ///
    /// Panics if the cursor mutex is poisoned.
    pub fn advance(&self, id: AlarmId, is_largest: bool) {
        *self.most_recent.lock().unwrap() = if is_largest { None } else { Some(id) };
    }
}
