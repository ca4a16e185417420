// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The single consumer of the request queue.
//!
//! In a loop: dequeue a request, insert it into the alarm table (or, for
//! `Change` requests, the changer's pending list) under the writer lock, then
//! wake exactly the handler responsible for the request's kind. The writer
//! lock is released *before* the signal fires; the generation counter in
//! [`crate::sync::Signal`] guarantees the wake-up cannot be lost.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{common::now_unix,
            context::CoreContext,
            model::AlarmKind};

/// Body of the dispatcher thread. Runs until the queue is closed and
/// drained.
pub fn run_dispatcher(ctx: &Arc<CoreContext>) {
    while let Some((record, slot)) = ctx.queue.dequeue() {
        let now = now_unix();
        let kind = record.kind;
        let alarm_id = record.alarm_id;

        ctx.writer.line(&format!(
            "Consumer Thread has Retrieved Alarm_Request_Type {kind} Request({alarm_id}) at {now}: Group({}) from Alarm Request Queue at slot {slot}",
            record.group_id
        ));
        debug!(%kind, %alarm_id, slot, "request dequeued");

        // A duplicate Start would break the one-Start-per-id table
        // invariant; drop it before it reaches the starter.
        let start_line = (kind == AlarmKind::Start).then(|| {
            format!(
                "Start_Alarm({alarm_id}) Inserted Into Alarm List at {now}: Group({}) {} {} {}",
                record.group_id, record.interval, record.time, record.message
            )
        });

        let admitted = {
            let mut table = ctx.table.write();
            if kind == AlarmKind::Change {
                table.push_pending_change(record);
                true
            } else if kind == AlarmKind::Start && table.find_start(alarm_id).is_some() {
                false
            } else {
                table.insert(record);
                true
            }
        };

        if !admitted {
            warn!(%alarm_id, "duplicate Start dropped");
            ctx.writer.line(&format!(
                "Invalid Start Alarm Request({alarm_id}) at {now}"
            ));
            continue;
        }
        if let Some(line) = start_line {
            ctx.writer.line(&line);
        }

        match kind {
            AlarmKind::Start => ctx.signals.start.notify(),
            AlarmKind::Change => ctx.signals.change.notify(),
            AlarmKind::Cancel => ctx.signals.remove.notify(),
            AlarmKind::Suspend | AlarmKind::Reactivate => ctx.signals.suspend.notify(),
            AlarmKind::View => ctx.signals.view.notify(),
        }
    }
    debug!("dispatcher: queue closed and drained");
}
