// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The starter: activates freshly admitted alarms and places them on display
//! schedulers, creating a scheduler thread per group on demand.
//!
//! Placement runs with *no* table lock held: the starter marks the record
//! `Active` under the writer lock, releases it, and only then touches the
//! display registry. The lock order (table → registry → slots) permits
//! holding both, but blocking on the registry mutex while holding the writer
//! lock would stall every other handler behind a slow placement.
//!
//! The starter also owns the re-placement half of the hand-off protocol:
//! when the changer moves an alarm to a new group it re-signals `start`, and
//! the placement scan below puts the alarm on a scheduler for its new group
//! (where the take-over announcement happens).

use std::{sync::Arc, thread};

use tracing::{debug, error, info};

use crate::{common::now_unix,
            context::CoreContext,
            display::{registry::DisplayScheduler, scheduler::display_scheduler_loop},
            model::{AlarmId, AlarmState, GroupId}};

/// Body of the starter thread.
pub fn run_starter(ctx: &Arc<CoreContext>) {
    loop {
        let seen = ctx.signals.start.current();
        if ctx.is_shutdown() {
            return;
        }

        // Activate pending Start records, most recent first, placing each.
        loop {
            let picked = {
                let mut table = ctx.table.write();
                let Some(seq) =
                    table.most_recent_unassigned_start().map(|r| r.seq)
                else {
                    break;
                };
                let record = table
                    .find_by_seq_mut(seq)
                    .expect("record located under the same writer lock");
                record.state = AlarmState::Active;
                (record.alarm_id, record.group_id)
            };
            debug!(alarm = %picked.0, group = %picked.1, "start record activated");
            place_alarm(ctx, picked.0, picked.1);
        }

        // Re-place live alarms whose scheduler no longer matches their group
        // (the new-owner half of a hand-off), or whose scheduler exited in a
        // race window.
        let live = ctx.table.read().live_starts();
        for (id, group) in live {
            if !ctx.registry.group_scheduler_holding(group, id) {
                debug!(alarm = %id, group = %group, "re-placing alarm");
                place_alarm(ctx, id, group);
            }
        }

        let _ = ctx.signals.start.wait_past(seen);
    }
}

/// Put `id` on the first scheduler of its group with spare capacity, or
/// create (and announce) a new scheduler thread seeded with it.
fn place_alarm(ctx: &Arc<CoreContext>, id: AlarmId, group: GroupId) {
    let now = now_unix();

    if let Some(scheduler) = ctx.registry.try_assign_existing(group, id) {
        ctx.writer.line(&format!(
            "Alarm({id}) Assigned to Display Thread {} at {now}: Group({group})",
            scheduler.name
        ));
        info!(alarm = %id, thread = %scheduler.name, "alarm assigned");
        return;
    }

    let scheduler = Arc::new(DisplayScheduler::new(group));
    assert!(scheduler.try_assign(id), "fresh scheduler has two empty slots");
    ctx.registry.register(Arc::clone(&scheduler));

    let spawned = thread::Builder::new().name(scheduler.name.clone()).spawn({
        let ctx = Arc::clone(ctx);
        let scheduler = Arc::clone(&scheduler);
        move || display_scheduler_loop(&ctx, &scheduler)
    });
    match spawned {
        Ok(handle) => ctx.registry.add_handle(handle),
        Err(source) => {
            // Resource exhaustion is unrecoverable: the alarm is already
            // registered and nothing will ever serve it.
            error!(error = %source, "cannot spawn display thread");
            eprintln!("fatal: cannot spawn display thread for Group({group}): {source}");
            std::process::abort();
        }
    }

    ctx.writer.line(&format!(
        "New Display Alarm Thread {} Created for Group({group}) at {now}",
        scheduler.name
    ));
    info!(thread = %scheduler.name, group = %group, "display thread created");
}
