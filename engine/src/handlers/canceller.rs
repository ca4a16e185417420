// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The canceller: marks a target alarm for removal.
//!
//! Ownership is the subtle part. A placed alarm (Active/Suspended) is merely
//! marked [`AlarmState::Remove`]: the display scheduler holding it announces
//! "Stopped Printing" on its next turn and unlinks the record itself. An
//! alarm the starter never placed has no owning scheduler, so the canceller
//! unlinks it directly.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{common::now_unix,
            context::CoreContext,
            model::{AlarmKind, AlarmState}};

/// Body of the canceller thread.
pub fn run_canceller(ctx: &Arc<CoreContext>) {
    loop {
        let seen = ctx.signals.remove.current();
        if ctx.is_shutdown() {
            return;
        }
        while process_one(ctx) {}
        let _ = ctx.signals.remove.wait_past(seen);
    }
}

enum CancelOutcome {
    Marked,
    UnlinkedUnplaced,
    TargetMissing,
}

/// Consume one pending Cancel request. Returns `false` when none remained.
fn process_one(ctx: &Arc<CoreContext>) -> bool {
    let now = now_unix();
    let (request, outcome) = {
        let mut table = ctx.table.write();
        let Some(seq) = table
            .most_recent_of_kinds(&[AlarmKind::Cancel])
            .map(|r| r.seq)
        else {
            return false;
        };
        let request = table
            .unlink(seq)
            .expect("request located under the same writer lock");

        let target = table
            .find_start(request.alarm_id)
            .map(|record| (record.seq, record.state));
        let outcome = match target {
            None => CancelOutcome::TargetMissing,
            Some((target_seq, AlarmState::Unassigned)) => {
                table.unlink(target_seq);
                CancelOutcome::UnlinkedUnplaced
            }
            Some((target_seq, _)) => {
                if let Some(record) = table.find_by_seq_mut(target_seq) {
                    record.state = AlarmState::Remove;
                }
                CancelOutcome::Marked
            }
        };
        (request, outcome)
    };

    let id = request.alarm_id;
    match outcome {
        CancelOutcome::Marked => {
            info!(alarm = %id, "alarm marked for removal");
        }
        CancelOutcome::UnlinkedUnplaced => {
            info!(alarm = %id, "unplaced alarm cancelled outright");
        }
        CancelOutcome::TargetMissing => {
            warn!(alarm = %id, "cancel targets a non-existent alarm");
            ctx.writer
                .line(&format!("Invalid Cancel Alarm Request({id}) at {now}"));
        }
    }
    true
}
