// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The per-group display worker: tick once a second, reconcile each owned
//! alarm against the table, print on interval, and cooperate with every
//! other scheduler through the round-robin cursor.
//!
//! # Reconciliation
//!
//! Each owned slot keeps a local [`AlarmSnapshot`] of the alarm's last
//! observed state. Once per tick (and only when it is this group's turn) the
//! snapshot is compared against the live record under the table *read* lock:
//!
//! 1. record gone or marked `Remove` → announce "Stopped Printing" (the alarm
//!    was cancelled) and release the slot;
//! 2. record expired → announce "Stopped Printing Expired" and release;
//! 3. record's group no longer ours → this worker is the *old* owner of a
//!    hand-off: announce "Stopped Printing" and release, but leave the record
//!    in the table for the new owner;
//! 4. record carries the `moved` flag our snapshot has not acknowledged →
//!    this worker is the *new* owner: announce "Has Taken Over Printing",
//!    acknowledge, and skip printing for this cycle;
//! 5. message changed → announce and adopt;
//! 6. interval changed → announce and adopt;
//! 7. otherwise print the alarm's message if it is active and its interval
//!    has elapsed.
//!
//! # Deferred table writes
//!
//! Reconciliation holds only the read lock, but rules 1, 2 and 4 imply table
//! mutations (unlink a dead record; clear a consumed `moved` flag). Those are
//! collected into [`DeferredWrite`]s and applied immediately after both
//! guards drop, under the writer lock, preserving the engine's lock order.

use std::{sync::Arc, thread};

use tracing::{debug, info};

use crate::{common::{now_unix, UnixSeconds},
            context::CoreContext,
            model::{AlarmId, AlarmRecord, AlarmState, MessageText, Seconds},
            display::registry::{DisplayScheduler, SLOT_COUNT}};

/// Per-scheduler local copy of an alarm's observable state, used to detect
/// changes cycle-over-cycle. Private to the owning display thread.
#[derive(Debug, Clone)]
pub struct AlarmSnapshot {
    pub alarm_id: AlarmId,
    pub state: AlarmState,
    /// Hand-off acknowledgement. Always captured as `false`, even when the
    /// record's flag is raised: the mismatch is what tells a fresh owner to
    /// announce its take-over.
    pub moved: bool,
    pub time_stamp: UnixSeconds,
    pub time: Seconds,
    pub interval: Seconds,
    pub message: MessageText,
    pub last_print: UnixSeconds,
}

impl AlarmSnapshot {
    #[must_use]
    pub fn capture(record: &AlarmRecord, now: UnixSeconds) -> Self {
        Self {
            alarm_id: record.alarm_id,
            state: record.state,
            moved: false,
            time_stamp: record.time_stamp,
            time: record.time,
            interval: record.interval,
            message: record.message.clone(),
            last_print: now,
        }
    }

    /// Placeholder for a slot whose record already vanished from the table
    /// (the alarm died between assignment and our first tick). Rule 1 retires
    /// it on the next turn.
    #[must_use]
    pub fn missing(alarm_id: AlarmId, now: UnixSeconds) -> Self {
        Self {
            alarm_id,
            state: AlarmState::Active,
            moved: false,
            time_stamp: now,
            time: 0,
            interval: 0,
            message: MessageText::new(),
            last_print: now,
        }
    }
}

/// Table mutation discovered during a read-side reconciliation pass, applied
/// under the writer lock once all other locks are released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeferredWrite {
    /// Unlink a record the scheduler now owns (cancelled or expired).
    Unlink(AlarmId),
    /// The hand-off was acknowledged: consume the one-shot `moved` flag.
    ClearMoved(AlarmId),
}

/// Body of one display thread. Runs until its group empties out (announcing
/// its exit) or engine shutdown.
pub fn display_scheduler_loop(ctx: &Arc<CoreContext>, sched: &Arc<DisplayScheduler>) {
    let mut snapshots: [Option<AlarmSnapshot>; SLOT_COUNT] = [None, None];

    loop {
        thread::sleep(ctx.config.tick);
        if ctx.is_shutdown() {
            return;
        }
        let now = now_unix();

        // Exit when the group has emptied out. Deregistration and the
        // starter's placement scan serialize on the registry mutex, so a
        // `false` here means a new alarm arrived in the race window.
        if sched.alarm_count() == 0 {
            if ctx.registry.deregister_if_empty(sched) {
                ctx.writer.line(&format!(
                    "No More Alarms in Group({}): Display Thread {} exiting at {now}",
                    sched.group_id, sched.name
                ));
                info!(group = %sched.group_id, thread = %sched.name, "display thread exiting");
                return;
            }
            continue;
        }

        // Materialize snapshots for freshly assigned slots.
        {
            let table = ctx.table.read();
            let slots = sched.lock_slots();
            for i in 0..SLOT_COUNT {
                if let Some(id) = slots.get(i) {
                    if snapshots[i].is_none() {
                        snapshots[i] = Some(match table.find_start(id) {
                            Some(record) => AlarmSnapshot::capture(record, now),
                            None => AlarmSnapshot::missing(id, now),
                        });
                        debug!(thread = %sched.name, alarm = %id, "snapshot materialized");
                    }
                }
            }
        }

        // Reconcile and print, gated by the round-robin cursor. A group that
        // left the rotation entirely (every owned alarm cancelled or moved
        // away) would never be "next", so it gets an ungated cleanup pass —
        // otherwise the stop/hand-off announcements could never happen.
        let mut deferred: Vec<DeferredWrite> = vec![];
        {
            let table = ctx.table.read();
            let mut slots = sched.lock_slots();

            let in_rotation = table.active_groups().contains(&sched.group_id);
            if in_rotation && !ctx.cursor.is_next_group(sched.group_id, &table) {
                continue;
            }

            let mut turn_alarm: Option<AlarmId> = None;
            for i in 0..SLOT_COUNT {
                let Some(id) = slots.get(i) else { continue };
                let Some(snapshot) = snapshots[i].as_mut() else {
                    continue;
                };
                turn_alarm = Some(id);
                reconcile_slot(
                    ctx,
                    sched,
                    snapshot,
                    table.find_start(id),
                    now,
                    &mut deferred,
                );
            }

            // This group took its turn; hand the rotation onward. When the
            // largest group displays, the cursor resets and a new cycle
            // starts at the smallest. A cleanup pass is not a turn.
            if let Some(id) = turn_alarm {
                if in_rotation {
                    ctx.cursor.advance(id, table.is_largest_group(sched.group_id));
                }
            }

            // Release slots whose snapshot was retired this turn.
            for i in 0..SLOT_COUNT {
                if snapshots[i]
                    .as_ref()
                    .is_some_and(|s| s.state == AlarmState::Remove)
                {
                    snapshots[i] = None;
                    slots.clear(i);
                }
            }
        }

        if !deferred.is_empty() {
            apply_deferred(ctx, sched, &deferred);
        }
    }
}

/// Apply the reconciliation rules to one slot. See the module docs for the
/// rule order; it must not be rearranged (group-departure has to win over the
/// moved-flag check, or the old owner of a hand-off would "take over" its own
/// alarm).
fn reconcile_slot(
    ctx: &Arc<CoreContext>,
    sched: &Arc<DisplayScheduler>,
    snapshot: &mut AlarmSnapshot,
    record: Option<&AlarmRecord>,
    now: UnixSeconds,
    deferred: &mut Vec<DeferredWrite>,
) {
    let id = snapshot.alarm_id;
    let group = sched.group_id;
    let name = &sched.name;

    match record {
        None => {
            ctx.writer.line(&format!(
                "Display Thread {name} Has Stopped Printing Message of Alarm({id}) at {now}: Group({group}) {}",
                snapshot.message
            ));
            snapshot.state = AlarmState::Remove;
        }
        Some(rec) if rec.state == AlarmState::Remove => {
            ctx.writer.line(&format!(
                "Display Thread {name} Has Stopped Printing Message of Alarm({id}) at {now}: Group({group}) {}",
                snapshot.message
            ));
            snapshot.state = AlarmState::Remove;
            deferred.push(DeferredWrite::Unlink(id));
        }
        Some(rec) if rec.expiry <= now => {
            ctx.writer.line(&format!(
                "Display Thread {name} Has Stopped Printing Expired Alarm({id}) at {now}: Group({group}) {}",
                snapshot.message
            ));
            snapshot.state = AlarmState::Remove;
            deferred.push(DeferredWrite::Unlink(id));
        }
        Some(rec) if rec.group_id != group => {
            // We are the old owner of a hand-off: release the slot but leave
            // the record alive for the new owner.
            ctx.writer.line(&format!(
                "Display Thread {name} Has Stopped Printing Message of Alarm({id}) at {now}: Group({group}) {}",
                snapshot.message
            ));
            snapshot.state = AlarmState::Remove;
        }
        Some(rec) if rec.moved && !snapshot.moved => {
            // We are the new owner: acknowledge, announce, skip this cycle.
            ctx.writer.line(&format!(
                "Display Thread {name} Has Taken Over Printing Message of Alarm({id}) at {now}: Group({group}) {}",
                rec.message
            ));
            snapshot.moved = true;
            deferred.push(DeferredWrite::ClearMoved(id));
        }
        Some(rec) => {
            if rec.message != snapshot.message {
                ctx.writer.line(&format!(
                    "Display Thread {name} Starts to Print Changed Message Alarm({id}) at {now}: Group({group}) {}",
                    rec.message
                ));
                snapshot.message = rec.message.clone();
            }
            if rec.interval != snapshot.interval {
                ctx.writer.line(&format!(
                    "Display Thread {name} Starts to Print Changed Interval Value Alarm({id}) at {now}: Group({group}) {}",
                    rec.interval
                ));
                snapshot.interval = rec.interval;
            }
            // Track suspension; the suspender toggles only the record.
            snapshot.state = rec.state;
            snapshot.time = rec.time;

            if snapshot.state == AlarmState::Active
                && now.saturating_sub(snapshot.last_print) > snapshot.interval
            {
                ctx.writer.line(&format!(
                    "Alarm ({id}) Printed by Alarm Display Thread {name} at {now}: Group({group}) {} {}",
                    snapshot.interval, snapshot.message
                ));
                snapshot.last_print = now;
            }
        }
    }
}

/// Writer-lock pass for the mutations a read-side reconciliation discovered.
/// No other lock is held here.
fn apply_deferred(
    ctx: &Arc<CoreContext>,
    sched: &Arc<DisplayScheduler>,
    deferred: &[DeferredWrite],
) {
    let mut table = ctx.table.write();
    for write in deferred {
        match *write {
            DeferredWrite::Unlink(id) => {
                // Only a record this scheduler actually owned: cancelled or
                // expired by the time the pass runs.
                let seq = table
                    .find_start(id)
                    .filter(|r| r.state == AlarmState::Remove || r.expiry <= now_unix())
                    .map(|r| r.seq);
                if let Some(seq) = seq {
                    table.unlink(seq);
                    debug!(thread = %sched.name, alarm = %id, "record unlinked");
                }
            }
            DeferredWrite::ClearMoved(id) => {
                // Consume the one-shot flag, unless the alarm moved again
                // (to some other group) since we acknowledged.
                if let Some(rec) = table.find_start_mut(id) {
                    if rec.group_id == sched.group_id {
                        rec.moved = false;
                    }
                }
            }
        }
    }
}
