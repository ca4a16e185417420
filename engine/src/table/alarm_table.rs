// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The shared directory of all alarms.
//!
//! Records are held in admission order: a `Vec` sorted by
//! [`AlarmRecord::key`] (`time_stamp` refined by the admission counter), with
//! [`AlarmId`] as the stable reference display schedulers hold onto. The
//! dedicated pending-change list the changer consumes lives behind the same
//! lock, because the dispatcher populates both under one writer acquisition.
//!
//! The table itself is not synchronized; wrap it in
//! [`crate::sync::TableRwLock`] (see [`crate::context::CoreContext`]).

use crate::model::{AlarmId, AlarmKind, AlarmRecord, AlarmState, GroupId};

/// Unsynchronized alarm directory. See the module docs.
#[derive(Debug, Default)]
pub struct AlarmTable {
    /// All records except `Change` kind, sorted by admission key.
    alarms: Vec<AlarmRecord>,
    /// The changer's private work list, populated by the dispatcher, also in
    /// admission order.
    pending_changes: Vec<AlarmRecord>,
}

impl AlarmTable {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Insert preserving admission order. Records admitted in the same second
    /// keep their relative order via the admission counter.
    pub fn insert(&mut self, record: AlarmRecord) {
        let at = self.alarms.partition_point(|r| r.key() <= record.key());
        self.alarms.insert(at, record);
    }

    /// Queue a change request for the changer.
    pub fn push_pending_change(&mut self, record: AlarmRecord) {
        let at = self
            .pending_changes
            .partition_point(|r| r.key() <= record.key());
        self.pending_changes.insert(at, record);
    }

    /// Hand the whole pending-change list to the changer, oldest first.
    pub fn drain_pending_changes(&mut self) -> Vec<AlarmRecord> {
        std::mem::take(&mut self.pending_changes)
    }

    #[must_use]
    pub fn len(&self) -> usize { self.alarms.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.alarms.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &AlarmRecord> { self.alarms.iter() }

    /// Unlink the record with the given admission `seq` (the `Vec` analogue
    /// of unlink-by-pointer: `seq` is unique per record).
    pub fn unlink(&mut self, seq: u64) -> Option<AlarmRecord> {
        let at = self.alarms.iter().position(|r| r.seq == seq)?;
        Some(self.alarms.remove(at))
    }

    /// Record lookup by admission `seq` (unique per record).
    pub fn find_by_seq_mut(&mut self, seq: u64) -> Option<&mut AlarmRecord> {
        self.alarms.iter_mut().find(|r| r.seq == seq)
    }

    /// The live `Start` record for `id`, if any. At most one exists.
    #[must_use]
    pub fn find_start(&self, id: AlarmId) -> Option<&AlarmRecord> {
        self.alarms
            .iter()
            .find(|r| r.is_start() && r.alarm_id == id)
    }

    pub fn find_start_mut(&mut self, id: AlarmId) -> Option<&mut AlarmRecord> {
        self.alarms
            .iter_mut()
            .find(|r| r.is_start() && r.alarm_id == id)
    }

    /// The `Start` record for `id` admitted strictly before `key`. Used by
    /// the suspender/reactivator, whose request must postdate its target.
    pub fn find_start_admitted_before(
        &mut self,
        id: AlarmId,
        key: (u64, u64),
    ) -> Option<&mut AlarmRecord> {
        self.alarms
            .iter_mut()
            .find(|r| r.is_start() && r.alarm_id == id && r.key() < key)
    }

    /// Most recent record of any of the given kinds (largest admission key).
    /// Scanning back-to-front exploits the sort order.
    #[must_use]
    pub fn most_recent_of_kinds(&self, kinds: &[AlarmKind]) -> Option<&AlarmRecord> {
        self.alarms.iter().rev().find(|r| kinds.contains(&r.kind))
    }

    /// Most recent `Start` record the starter has not yet placed.
    #[must_use]
    pub fn most_recent_unassigned_start(&self) -> Option<&AlarmRecord> {
        self.alarms
            .iter()
            .rev()
            .find(|r| r.is_start() && r.state == AlarmState::Unassigned)
    }

    /// Unique group ids that have at least one live (`Active` or `Suspended`)
    /// `Start` record, sorted ascending. This is the round-robin rotation.
    #[must_use]
    pub fn active_groups(&self) -> Vec<GroupId> {
        let mut groups: Vec<GroupId> = self
            .alarms
            .iter()
            .filter(|r| r.is_live_start())
            .map(|r| r.group_id)
            .collect();
        groups.sort_unstable();
        groups.dedup();
        groups
    }

    /// Whether `group` is the largest active group id (the round-robin cycle
    /// boundary).
    #[must_use]
    pub fn is_largest_group(&self, group: GroupId) -> bool {
        self.active_groups().last() == Some(&group)
    }

    /// Group of the `Start` record identified by `id`, if present.
    #[must_use]
    pub fn group_of(&self, id: AlarmId) -> Option<GroupId> {
        self.find_start(id).map(|r| r.group_id)
    }

    /// Live `Start` records as `(id, group)` pairs, in admission order. The
    /// starter uses this to find alarms that still need placement.
    #[must_use]
    pub fn live_starts(&self) -> Vec<(AlarmId, GroupId)> {
        self.alarms
            .iter()
            .filter(|r| r.is_live_start())
            .map(|r| (r.alarm_id, r.group_id))
            .collect()
    }
}
