// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The changer: applies pending `Change_Alarm` requests to their target
//! `Start` records.
//!
//! The dispatcher parks change requests on a private pending list (behind the
//! table lock); the changer drains that list on every wake-up and applies
//! each change under the writer lock: copy in `time`, `expiry` and `message`,
//! and — when the group differs — overwrite the group and raise the one-shot
//! `moved` flag that drives the display schedulers' hand-off protocol. A
//! group move re-signals the starter, which places the alarm on a scheduler
//! for its new group.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{common::now_unix,
            context::CoreContext,
            model::{AlarmRecord, GroupId}};

/// Body of the changer thread.
pub fn run_changer(ctx: &Arc<CoreContext>) {
    loop {
        let seen = ctx.signals.change.current();
        if ctx.is_shutdown() {
            return;
        }

        let pending = ctx.table.write().drain_pending_changes();
        for change in pending {
            apply_change(ctx, &change);
        }

        let _ = ctx.signals.change.wait_past(seen);
    }
}

enum ChangeOutcome {
    Applied { group: GroupId, group_moved: bool },
    TargetMissing,
}

fn apply_change(ctx: &Arc<CoreContext>, change: &AlarmRecord) {
    let now = now_unix();
    let outcome = {
        let mut table = ctx.table.write();
        match table.find_start_mut(change.alarm_id) {
            None => ChangeOutcome::TargetMissing,
            Some(record) => {
                record.time = change.time;
                record.expiry = change.expiry;
                record.message = change.message.clone();
                let group_moved = record.group_id != change.group_id;
                if group_moved {
                    record.group_id = change.group_id;
                    record.moved = true;
                }
                ChangeOutcome::Applied {
                    group: record.group_id,
                    group_moved,
                }
            }
        }
    };

    match outcome {
        ChangeOutcome::TargetMissing => {
            warn!(alarm = %change.alarm_id, "change targets a non-existent alarm");
            ctx.writer.line(&format!(
                "Invalid Change Alarm Request({}) at {now}",
                change.alarm_id
            ));
        }
        ChangeOutcome::Applied { group, group_moved } => {
            // No console line here: a successful change surfaces through the
            // owning display scheduler once it notices the diff.
            info!(alarm = %change.alarm_id, %group, group_moved, "change applied");
            if group_moved {
                // The old scheduler sees the group mismatch on its next
                // tick; the starter places the alarm for the new group.
                ctx.signals.start.notify();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{console::writer::ConsoleWriter,
                context::{CoreContext, EngineConfig},
                model::{AlarmId, AlarmState}};

    fn boot() -> (Arc<CoreContext>, crate::console::ConsoleMockHandle) {
        let (writer, handle) = ConsoleWriter::new_mock();
        (
            Arc::new(CoreContext::new(EngineConfig::default(), writer)),
            handle,
        )
    }

    fn one_pass(ctx: &Arc<CoreContext>) {
        ctx.signals.change.notify();
        let worker = {
            let ctx = Arc::clone(ctx);
            thread::spawn(move || run_changer(&ctx))
        };
        thread::sleep(std::time::Duration::from_millis(200));
        ctx.request_shutdown();
        worker.join().unwrap();
    }

    fn live_start(ctx: &Arc<CoreContext>, id: u64, group: u64) {
        let mut record =
            AlarmRecord::admit_start(AlarmId(id), GroupId(group), 2, 60, "hello");
        record.state = AlarmState::Active;
        ctx.table.write().insert(record);
    }

    #[test]
    fn change_copies_time_expiry_and_message() {
        let (ctx, _handle) = boot();
        live_start(&ctx, 1, 10);
        let change = AlarmRecord::admit_change(AlarmId(1), GroupId(10), 120, "world");
        let expected_expiry = change.expiry;
        ctx.table.write().push_pending_change(change);
        one_pass(&ctx);

        let table = ctx.table.read();
        let record = table.find_start(AlarmId(1)).unwrap();
        assert_eq!(record.time, 120);
        assert_eq!(record.expiry, expected_expiry);
        assert_eq!(record.message.as_str(), "world");
        // Same group: the hand-off flag must stay down.
        assert!(!record.moved);
        assert_eq!(record.group_id, GroupId(10));
    }

    #[test]
    fn group_move_raises_the_moved_flag_and_wakes_the_starter() {
        let (ctx, _handle) = boot();
        live_start(&ctx, 1, 10);
        ctx.table.write().push_pending_change(AlarmRecord::admit_change(
            AlarmId(1),
            GroupId(20),
            60,
            "hello",
        ));
        let start_gen_before = ctx.signals.start.current();
        one_pass(&ctx);

        let table = ctx.table.read();
        let record = table.find_start(AlarmId(1)).unwrap();
        assert_eq!(record.group_id, GroupId(20));
        assert!(record.moved);
        drop(table);
        assert!(ctx.signals.start.current() > start_gen_before);
    }

    #[test]
    fn change_of_unknown_alarm_logs_invalid_and_mutates_nothing() {
        let (ctx, handle) = boot();
        ctx.table.write().push_pending_change(AlarmRecord::admit_change(
            AlarmId(999),
            GroupId(1),
            10,
            "x",
        ));
        one_pass(&ctx);

        assert_eq!(
            handle.count_lines_containing("Invalid Change Alarm Request(999)"),
            1
        );
        assert_eq!(ctx.table.read().len(), 0);
    }

    #[test]
    fn pending_list_is_consumed_even_on_invalid_targets() {
        let (ctx, _handle) = boot();
        ctx.table.write().push_pending_change(AlarmRecord::admit_change(
            AlarmId(42),
            GroupId(1),
            10,
            "x",
        ));
        one_pass(&ctx);
        assert!(ctx.table.write().drain_pending_changes().is_empty());
    }
}
