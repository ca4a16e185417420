// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The viewer: lists every `Start` record admitted strictly before the view
//! request, one console line per alarm.
//!
//! The request record is consumed under the writer lock; the enumeration and
//! its output run under the reader lock, so the listing is a consistent
//! snapshot even while schedulers keep printing.

use std::sync::Arc;

use tracing::debug;

use crate::{context::CoreContext,
            model::AlarmKind};

/// Body of the viewer thread.
pub fn run_viewer(ctx: &Arc<CoreContext>) {
    loop {
        let seen = ctx.signals.view.current();
        if ctx.is_shutdown() {
            return;
        }
        while process_one(ctx) {}
        let _ = ctx.signals.view.wait_past(seen);
    }
}

/// Consume one pending View request. Returns `false` when none remained.
fn process_one(ctx: &Arc<CoreContext>) -> bool {
    let request = {
        let mut table = ctx.table.write();
        let Some(seq) = table
            .most_recent_of_kinds(&[AlarmKind::View])
            .map(|r| r.seq)
        else {
            return false;
        };
        table
            .unlink(seq)
            .expect("request located under the same writer lock")
    };

    let table = ctx.table.read();
    ctx.writer.line(&format!(
        "View Alarms at View Time {}:",
        request.time_stamp
    ));
    let mut shown = 0_usize;
    for record in table
        .iter()
        .filter(|r| r.is_start() && r.key() < request.key())
    {
        ctx.writer.line(&format!(
            "Alarm({}): Group({}) Status({}) Created {}: {} {}",
            record.alarm_id,
            record.group_id,
            record.state,
            record.time_stamp,
            record.interval,
            record.message
        ));
        shown += 1;
    }
    debug!(shown, "view request served");
    true
}
