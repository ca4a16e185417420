// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! End-to-end lifecycle scenarios: start/print, change, expiry, cancel,
//! suspend/reactivate, view, and the invalid-request paths. Each test runs a
//! real worker fleet against a mock console.

mod common;

use std::time::Duration;

use common::TestSession;
use serial_test::serial;

#[test]
#[serial]
fn started_alarm_prints_periodically() {
    let session = TestSession::boot(200);
    session.submit("Start_Alarm(1): Group(10) 1 60 hello");

    // Producer and consumer sides of the queue both report slot 0.
    session.expect(
        "Alarm Thread has Inserted Alarm_Request_Type Start_Alarm Request(1)",
        Duration::from_secs(2),
    );
    session.expect(
        "Consumer Thread has Retrieved Alarm_Request_Type Start_Alarm Request(1)",
        Duration::from_secs(2),
    );
    session.expect("Start_Alarm(1) Inserted Into Alarm List", Duration::from_secs(2));
    session.expect("Created for Group(10)", Duration::from_secs(2));

    // The periodic print line, carrying group and message.
    session.expect("Alarm (1) Printed by Alarm Display Thread", Duration::from_secs(8));
    assert!(
        session
            .console
            .lines()
            .iter()
            .any(|l| l.contains("Alarm (1) Printed") && l.contains("Group(10)")
                && l.contains("hello")),
        "print line must carry group and message:\n{}",
        session.console.output_as_string()
    );
}

#[test]
#[serial]
fn changed_message_is_announced_then_printed() {
    let session = TestSession::boot(200);
    session.submit("Start_Alarm(1): Group(10) 1 60 hello");
    session.expect("Alarm (1) Printed", Duration::from_secs(8));

    session.submit("Change_Alarm(1): Group(10) 60 world");
    session.expect(
        "Starts to Print Changed Message Alarm(1)",
        Duration::from_secs(5),
    );

    // Subsequent prints carry the new payload.
    let deadline = std::time::Instant::now() + Duration::from_secs(8);
    let printed_world = loop {
        let hit = session
            .console
            .lines()
            .iter()
            .any(|l| l.contains("Alarm (1) Printed") && l.contains("world"));
        if hit || std::time::Instant::now() > deadline {
            break hit;
        }
        std::thread::sleep(Duration::from_millis(50));
    };
    assert!(
        printed_world,
        "prints must switch to the changed message:\n{}",
        session.console.output_as_string()
    );

    // Same-group change: no hand-off may be announced.
    assert_eq!(
        session.console.count_lines_containing("Has Taken Over Printing"),
        0
    );
}

#[test]
#[serial]
fn expired_alarm_stops_exactly_once() {
    let session = TestSession::boot(200);
    session.submit("Start_Alarm(3): Group(4) 1 2 short lived");

    session.expect(
        "Has Stopped Printing Expired Alarm(3)",
        Duration::from_secs(10),
    );

    // Give the scheduler a few more ticks: no duplicate announcement, no
    // further prints, and the record is gone from the table.
    std::thread::sleep(Duration::from_millis(1_500));
    assert_eq!(
        session
            .console
            .count_lines_containing("Has Stopped Printing Expired Alarm(3)"),
        1
    );
    assert!(session.ctx.table.read().is_empty());

    let prints_after = session.console.lines().len();
    std::thread::sleep(Duration::from_millis(1_000));
    assert_eq!(session.console.lines().len(), prints_after);
}

#[test]
#[serial]
fn cancelled_alarm_is_released_by_its_scheduler() {
    let session = TestSession::boot(200);
    session.submit("Start_Alarm(5): Group(2) 1 60 to be cancelled");
    session.expect("Created for Group(2)", Duration::from_secs(2));

    session.submit("Cancel_Alarm(5)");
    session.expect(
        "Has Stopped Printing Message of Alarm(5)",
        Duration::from_secs(5),
    );

    // With its only alarm gone, the display thread announces its exit.
    session.expect(
        "No More Alarms in Group(2): Display Thread",
        Duration::from_secs(5),
    );
    assert!(session.ctx.table.read().is_empty());
    assert_eq!(session.ctx.registry.count(), 0);
}

#[test]
#[serial]
fn suspend_silences_and_reactivate_resumes() {
    let session = TestSession::boot(200);
    session.submit("Start_Alarm(7): Group(9) 1 120 tick");
    session.expect("Alarm (7) Printed", Duration::from_secs(8));

    session.submit("Suspend_Alarm(7)");
    session.expect("Alarm(7) Suspended", Duration::from_secs(3));

    // Let in-flight turns settle, then verify the silence.
    std::thread::sleep(Duration::from_millis(600));
    let prints_when_suspended =
        session.console.count_lines_containing("Alarm (7) Printed");
    std::thread::sleep(Duration::from_millis(2_500));
    assert_eq!(
        session.console.count_lines_containing("Alarm (7) Printed"),
        prints_when_suspended,
        "suspended alarm kept printing:\n{}",
        session.console.output_as_string()
    );

    session.submit("Reactivate_Alarm(7)");
    session.expect("Alarm(7) Reactivated", Duration::from_secs(3));
    assert!(
        session.wait_for_count(
            "Alarm (7) Printed",
            prints_when_suspended + 1,
            Duration::from_secs(8)
        ),
        "reactivated alarm must print again:\n{}",
        session.console.output_as_string()
    );
}

#[test]
#[serial]
fn view_lists_only_earlier_alarms() {
    let session = TestSession::boot(200);
    session.submit("Start_Alarm(11): Group(1) 5 300 early bird");
    session.expect("Created for Group(1)", Duration::from_secs(2));

    session.submit("View_Alarms");
    session.expect("View Alarms at View Time", Duration::from_secs(3));
    session.expect("Alarm(11): Group(1)", Duration::from_secs(3));

    // An alarm started after the view must not retroactively appear.
    let view_lines = session.console.count_lines_containing("Alarm(12):");
    assert_eq!(view_lines, 0);
}

#[test]
#[serial]
fn invalid_change_is_announced_exactly_once_and_mutates_nothing() {
    let session = TestSession::boot(200);
    session.submit("Change_Alarm(999): Group(1) 10 x");

    session.expect(
        "Invalid Change Alarm Request(999)",
        Duration::from_secs(3),
    );
    std::thread::sleep(Duration::from_millis(500));
    assert_eq!(
        session
            .console
            .count_lines_containing("Invalid Change Alarm Request(999)"),
        1
    );
    assert!(session.ctx.table.read().is_empty());
    assert_eq!(session.ctx.registry.count(), 0);
}

#[test]
#[serial]
fn suspend_of_unknown_alarm_is_invalid() {
    let session = TestSession::boot(200);
    session.submit("Suspend_Alarm(404)");
    session.expect(
        "Invalid Suspend Alarm Request(404)",
        Duration::from_secs(3),
    );
    assert!(session.ctx.table.read().is_empty());
}
