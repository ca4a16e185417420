// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The central entity of the engine: [`AlarmRecord`]. A record is either a
//! live alarm (kind [`AlarmKind::Start`]) or a short-lived request record
//! (every other kind) that exists in the alarm table only until its handler
//! consumes it.

use std::{fmt,
          sync::atomic::{AtomicU64, Ordering}};

use smallstr::SmallString;
use strum_macros::{Display, EnumIter};

use crate::common::{now_unix, UnixSeconds};

/// User-assigned alarm identifier. Strictly positive for user-created records;
/// `0` is reserved for records that carry no target (`View_Alarms`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlarmId(pub u64);

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// User-assigned partition key. All alarms sharing a group are served by one
/// display scheduler (capacity 2).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Whole seconds, as typed by the user (`interval` and `time` command fields).
pub type Seconds = u64;

/// Maximum message payload after trimming, in bytes.
pub const MESSAGE_MAX_BYTES: usize = 127;

/// Inline storage for alarm messages. Sized one past [`MESSAGE_MAX_BYTES`] so
/// a maximal message never spills to the heap.
pub type MessageText = SmallString<[u8; 128]>;

/// What a record asks the engine to do. `Start` records live in the alarm
/// table for as long as the alarm exists; all other kinds are consumed by
/// their handler.
#[derive(Copy, Clone, Debug, Display, EnumIter, PartialEq, Eq, Hash)]
pub enum AlarmKind {
    #[strum(to_string = "Start_Alarm")]
    Start,
    #[strum(to_string = "Change_Alarm")]
    Change,
    #[strum(to_string = "Cancel_Alarm")]
    Cancel,
    #[strum(to_string = "Suspend_Alarm")]
    Suspend,
    #[strum(to_string = "Reactivate_Alarm")]
    Reactivate,
    #[strum(to_string = "View_Alarms")]
    View,
}

/// Lifecycle state of a `Start` record. Exactly one of these holds at any
/// time; the orthogonal one-shot hand-off flag lives in
/// [`AlarmRecord::moved`].
///
/// - `Unassigned`: admitted by the dispatcher, not yet placed on a display
///   scheduler by the starter.
/// - `Active` / `Suspended`: placed; toggled by the suspender/reactivator.
/// - `Remove`: marked for removal (cancel or expiry). A record in this state
///   is owned exclusively by the display scheduler holding it, which unlinks
///   it from the table.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum AlarmState {
    Unassigned,
    Active,
    Suspended,
    Remove,
}

/// Process-wide admission counter. The wall clock only has whole-second
/// resolution, so two records admitted within the same second would otherwise
/// have no defined order; `seq` refines `time_stamp` into a total admission
/// order (the "list order" tie-break).
static ADMISSION_SEQ: AtomicU64 = AtomicU64::new(0);

fn next_seq() -> u64 { ADMISSION_SEQ.fetch_add(1, Ordering::SeqCst) }

/// One alarm or request record. See the module docs for the kind/lifetime
/// split.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlarmRecord {
    pub kind: AlarmKind,
    pub alarm_id: AlarmId,
    pub group_id: GroupId,
    pub state: AlarmState,
    /// One-shot hand-off flag, raised by the changer when the group changes,
    /// consumed by the display scheduler that takes the alarm over.
    pub moved: bool,
    /// Wall-clock time the request was admitted to the system.
    pub time_stamp: UnixSeconds,
    /// Admission-order tie break for `time_stamp`. See [`ADMISSION_SEQ`].
    pub seq: u64,
    /// Seconds until `expiry` at the moment of creation/change.
    pub time: Seconds,
    /// Absolute wall-clock time at which the alarm stops printing.
    pub expiry: UnixSeconds,
    /// Seconds between successive prints.
    pub interval: Seconds,
    pub message: MessageText,
}

impl AlarmRecord {
    /// Admit a `Start_Alarm` request. The record enters the table
    /// [`AlarmState::Unassigned`]; the starter marks it `Active` when it
    /// places the alarm on a display scheduler.
    #[must_use]
    pub fn admit_start(
        alarm_id: AlarmId,
        group_id: GroupId,
        interval: Seconds,
        time: Seconds,
        message: &str,
    ) -> Self {
        let now = now_unix();
        Self {
            kind: AlarmKind::Start,
            alarm_id,
            group_id,
            state: AlarmState::Unassigned,
            moved: false,
            time_stamp: now,
            seq: next_seq(),
            time,
            expiry: now + time,
            interval,
            message: trim_message(message),
        }
    }

    /// Admit a `Change_Alarm` request. The record's `expiry` is computed from
    /// its own admission time, so the changer can copy it into the target
    /// verbatim.
    #[must_use]
    pub fn admit_change(
        alarm_id: AlarmId,
        group_id: GroupId,
        time: Seconds,
        message: &str,
    ) -> Self {
        let now = now_unix();
        Self {
            kind: AlarmKind::Change,
            alarm_id,
            group_id,
            state: AlarmState::Unassigned,
            moved: false,
            time_stamp: now,
            seq: next_seq(),
            time,
            expiry: now + time,
            interval: 0,
            message: trim_message(message),
        }
    }

    /// Admit a `Cancel_Alarm`, `Suspend_Alarm` or `Reactivate_Alarm` request.
    ///
    /// # Panics
    ///
    /// Panics if called with a kind that carries a payload (`Start`, `Change`,
    /// `View`); those have dedicated constructors.
    #[must_use]
    pub fn admit_control(kind: AlarmKind, alarm_id: AlarmId) -> Self {
        assert!(matches!(
            kind,
            AlarmKind::Cancel | AlarmKind::Suspend | AlarmKind::Reactivate
        ));
        let now = now_unix();
        Self {
            kind,
            alarm_id,
            group_id: GroupId(0),
            state: AlarmState::Unassigned,
            moved: false,
            time_stamp: now,
            seq: next_seq(),
            time: 0,
            expiry: now,
            interval: 0,
            message: MessageText::new(),
        }
    }

    /// Admit a `View_Alarms` request. Carries only its admission key; the
    /// viewer enumerates every `Start` record admitted strictly earlier.
    #[must_use]
    pub fn admit_view() -> Self {
        let now = now_unix();
        Self {
            kind: AlarmKind::View,
            alarm_id: AlarmId(0),
            group_id: GroupId(0),
            state: AlarmState::Unassigned,
            moved: false,
            time_stamp: now,
            seq: next_seq(),
            time: 0,
            expiry: now,
            interval: 0,
            message: MessageText::new(),
        }
    }

    /// Total admission order: `time_stamp` refined by the admission counter.
    /// The alarm table is kept sorted by this key, and "most recent" selection
    /// in the handlers maximizes it.
    #[must_use]
    pub fn key(&self) -> (UnixSeconds, u64) { (self.time_stamp, self.seq) }

    #[must_use]
    pub fn is_start(&self) -> bool { self.kind == AlarmKind::Start }

    /// Live means the record participates in display scheduling: it has been
    /// placed (or is awaiting placement) and is not marked for removal.
    #[must_use]
    pub fn is_live_start(&self) -> bool {
        self.is_start()
            && matches!(self.state, AlarmState::Active | AlarmState::Suspended)
    }
}

/// Trim surrounding whitespace and bound the payload to [`MESSAGE_MAX_BYTES`],
/// truncating at a char boundary so the result is always valid UTF-8.
#[must_use]
pub fn trim_message(raw: &str) -> MessageText {
    let trimmed = raw.trim();
    let mut boundary = trimmed.len().min(MESSAGE_MAX_BYTES);
    while !trimmed.is_char_boundary(boundary) {
        boundary -= 1;
    }
    let mut it = MessageText::new();
    it.push_str(&trimmed[..boundary]);
    it
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn trim_message_bounds_long_payloads() {
        let long = "x".repeat(500);
        assert_eq!(trim_message(&long).len(), MESSAGE_MAX_BYTES);
    }

    #[test]
    fn trim_message_respects_char_boundaries() {
        // 'é' is 2 bytes; 64 of them span the 127-byte limit at byte 126/128.
        let input = "é".repeat(64);
        let out = trim_message(&input);
        assert!(out.len() <= MESSAGE_MAX_BYTES);
        assert_eq!(out.len() % 2, 0);
        assert!(out.as_str().chars().all(|c| c == 'é'));
    }

    #[test]
    fn trim_message_strips_whitespace() {
        assert_eq!(trim_message("  hello world \n").as_str(), "hello world");
    }

    #[test]
    fn admission_keys_are_strictly_increasing() {
        let a = AlarmRecord::admit_start(AlarmId(1), GroupId(1), 1, 10, "a");
        let b = AlarmRecord::admit_start(AlarmId(2), GroupId(1), 1, 10, "b");
        assert!(a.key() < b.key());
    }

    #[test]
    fn start_records_enter_unassigned_with_expiry_past_time_stamp() {
        let rec = AlarmRecord::admit_start(AlarmId(7), GroupId(3), 2, 60, "msg");
        assert_eq!(rec.state, AlarmState::Unassigned);
        assert!(rec.expiry >= rec.time_stamp);
        assert_eq!(rec.expiry - rec.time_stamp, 60);
        assert!(!rec.moved);
    }

    #[test]
    fn kind_display_matches_command_grammar() {
        assert_eq!(AlarmKind::Start.to_string(), "Start_Alarm");
        assert_eq!(AlarmKind::Reactivate.to_string(), "Reactivate_Alarm");
        assert_eq!(AlarmKind::View.to_string(), "View_Alarms");
    }
}
