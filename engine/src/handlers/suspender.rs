// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The suspender/reactivator: one worker serving both request kinds (they
//! share a wake-up signal).
//!
//! On each pass it consumes the *most recent* pending Suspend/Reactivate
//! request, finds the `Start` record with the same alarm id admitted strictly
//! earlier than the request, and toggles it: Suspend flips `Active` →
//! `Suspended`, Reactivate flips `Suspended` → `Active`. Any other pairing is
//! a no-op; a request with no matching earlier `Start` is announced as
//! invalid and dropped.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{common::now_unix,
            context::CoreContext,
            model::{AlarmKind, AlarmState, GroupId}};

/// Body of the suspender/reactivator thread.
pub fn run_suspender(ctx: &Arc<CoreContext>) {
    loop {
        let seen = ctx.signals.suspend.current();
        if ctx.is_shutdown() {
            return;
        }
        while process_one(ctx) {}
        let _ = ctx.signals.suspend.wait_past(seen);
    }
}

enum ToggleOutcome {
    Suspended(GroupId),
    Reactivated(GroupId),
    NoOp,
    TargetMissing,
}

/// Consume one pending request. Returns `false` when none remained.
fn process_one(ctx: &Arc<CoreContext>) -> bool {
    let now = now_unix();
    let (request, outcome) = {
        let mut table = ctx.table.write();
        let Some(seq) = table
            .most_recent_of_kinds(&[AlarmKind::Suspend, AlarmKind::Reactivate])
            .map(|r| r.seq)
        else {
            return false;
        };
        let request = table
            .unlink(seq)
            .expect("request located under the same writer lock");

        let outcome =
            match table.find_start_admitted_before(request.alarm_id, request.key()) {
                None => ToggleOutcome::TargetMissing,
                Some(record) => match (request.kind, record.state) {
                    (AlarmKind::Suspend, AlarmState::Active) => {
                        record.state = AlarmState::Suspended;
                        ToggleOutcome::Suspended(record.group_id)
                    }
                    (AlarmKind::Reactivate, AlarmState::Suspended) => {
                        record.state = AlarmState::Active;
                        ToggleOutcome::Reactivated(record.group_id)
                    }
                    _ => ToggleOutcome::NoOp,
                },
            };
        (request, outcome)
    };

    let id = request.alarm_id;
    match outcome {
        ToggleOutcome::Suspended(group) => {
            info!(alarm = %id, %group, "alarm suspended");
            ctx.writer
                .line(&format!("Alarm({id}) Suspended at {now}: Group({group})"));
        }
        ToggleOutcome::Reactivated(group) => {
            info!(alarm = %id, %group, "alarm reactivated");
            ctx.writer
                .line(&format!("Alarm({id}) Reactivated at {now}: Group({group})"));
        }
        ToggleOutcome::NoOp => {
            debug!(alarm = %id, kind = %request.kind, "state toggle is a no-op");
        }
        ToggleOutcome::TargetMissing => {
            warn!(alarm = %id, kind = %request.kind, "no matching earlier Start");
            let verb = if request.kind == AlarmKind::Suspend {
                "Suspend"
            } else {
                "Reactivate"
            };
            ctx.writer
                .line(&format!("Invalid {verb} Alarm Request({id}) at {now}"));
        }
    }
    true
}
