// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The console command grammar (case-sensitive):
//!
//! ```text
//! Start_Alarm(<id>): Group(<gid>) <interval> <time> <message>
//! Change_Alarm(<id>): Group(<gid>) <time> <message>
//! Cancel_Alarm(<id>)
//! Suspend_Alarm(<id>)
//! Reactivate_Alarm(<id>)
//! View_Alarms
//! quit | exit
//! ```
//!
//! Rejections are two-tier: a line whose *shape* matches a command but whose
//! integer fields are not strictly positive (or whose message is empty) is
//! "Invalid parameters"; anything else is "Unrecognized command format".
//! Messages are trimmed and bounded to 127 bytes by the data model.

use std::fmt;

use nom::{branch::alt,
          bytes::complete::tag,
          character::complete::{char, digit1, space1},
          combinator::{map_res, opt, recognize, rest},
          sequence::preceded,
          IResult, Parser};

use crate::model::{AlarmId, GroupId, Seconds};

/// A successfully parsed console command, fields still unvalidated integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start {
        id: AlarmId,
        group: GroupId,
        interval: Seconds,
        time: Seconds,
        message: String,
    },
    Change {
        id: AlarmId,
        group: GroupId,
        time: Seconds,
        message: String,
    },
    Cancel {
        id: AlarmId,
    },
    Suspend {
        id: AlarmId,
    },
    Reactivate {
        id: AlarmId,
    },
    View,
    Quit,
}

/// Why a line was rejected. The `Display` strings are the exact console
/// responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseRejection {
    InvalidParameters,
    UnrecognizedFormat,
}

impl fmt::Display for ParseRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameters => write!(f, "Invalid parameters"),
            Self::UnrecognizedFormat => write!(f, "Unrecognized command format"),
        }
    }
}

/// Parse one console line.
///
/// # Errors
///
/// Returns the [`ParseRejection`] to show the user when the line is not a
/// valid command.
pub fn parse_command(line: &str) -> Result<Command, ParseRejection> {
    let line = line.trim();
    match line {
        "View_Alarms" => return Ok(Command::View),
        "quit" | "exit" => return Ok(Command::Quit),
        _ => {}
    }

    if let Ok(("", raw)) = start_alarm(line) {
        return Ok(Command::Start {
            id: AlarmId(positive(raw.id)?),
            group: GroupId(positive(raw.group)?),
            interval: positive(raw.interval)?,
            time: positive(raw.time)?,
            message: non_empty_message(raw.message)?,
        });
    }
    if let Ok(("", raw)) = change_alarm(line) {
        return Ok(Command::Change {
            id: AlarmId(positive(raw.id)?),
            group: GroupId(positive(raw.group)?),
            time: positive(raw.time)?,
            message: non_empty_message(raw.message)?,
        });
    }
    if let Ok(("", (keyword, id))) = id_only_command(line) {
        let id = AlarmId(positive(id)?);
        return Ok(match keyword {
            "Cancel_Alarm(" => Command::Cancel { id },
            "Suspend_Alarm(" => Command::Suspend { id },
            _ => Command::Reactivate { id },
        });
    }

    Err(ParseRejection::UnrecognizedFormat)
}

/// Strict positivity check shared by every integer field.
fn positive(value: i128) -> Result<u64, ParseRejection> {
    u64::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or(ParseRejection::InvalidParameters)
}

fn non_empty_message(raw: &str) -> Result<String, ParseRejection> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseRejection::InvalidParameters);
    }
    Ok(trimmed.to_owned())
}

#[derive(Debug)]
struct RawStart<'a> {
    id: i128,
    group: i128,
    interval: i128,
    time: i128,
    message: &'a str,
}

#[derive(Debug)]
struct RawChange<'a> {
    id: i128,
    group: i128,
    time: i128,
    message: &'a str,
}

/// A possibly-negative integer literal. Negative values are *shape-valid* so
/// they reject as "Invalid parameters" rather than "Unrecognized".
fn int_literal(input: &str) -> IResult<&str, i128> {
    map_res(
        recognize(preceded(opt(char('-')), digit1)),
        str::parse::<i128>,
    )
    .parse(input)
}

fn start_alarm(input: &str) -> IResult<&str, RawStart<'_>> {
    let (input, _) = tag("Start_Alarm(")(input)?;
    let (input, id) = int_literal(input)?;
    let (input, _) = tag("):")(input)?;
    let (input, _) = space1(input)?;
    let (input, _) = tag("Group(")(input)?;
    let (input, group) = int_literal(input)?;
    let (input, _) = tag(")")(input)?;
    let (input, _) = space1(input)?;
    let (input, interval) = int_literal(input)?;
    let (input, _) = space1(input)?;
    let (input, time) = int_literal(input)?;
    let (input, _) = space1(input)?;
    let (input, message) = rest(input)?;
    Ok((
        input,
        RawStart {
            id,
            group,
            interval,
            time,
            message,
        },
    ))
}

fn change_alarm(input: &str) -> IResult<&str, RawChange<'_>> {
    let (input, _) = tag("Change_Alarm(")(input)?;
    let (input, id) = int_literal(input)?;
    let (input, _) = tag("):")(input)?;
    let (input, _) = space1(input)?;
    let (input, _) = tag("Group(")(input)?;
    let (input, group) = int_literal(input)?;
    let (input, _) = tag(")")(input)?;
    let (input, _) = space1(input)?;
    let (input, time) = int_literal(input)?;
    let (input, _) = space1(input)?;
    let (input, message) = rest(input)?;
    Ok((
        input,
        RawChange {
            id,
            group,
            time,
            message,
        },
    ))
}

fn id_only_command(input: &str) -> IResult<&str, (&str, i128)> {
    let (input, keyword) = alt((
        tag("Cancel_Alarm("),
        tag("Suspend_Alarm("),
        tag("Reactivate_Alarm("),
    ))
    .parse(input)?;
    let (input, id) = int_literal(input)?;
    let (input, _) = tag(")")(input)?;
    Ok((input, (keyword, id)))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test]
    fn start_alarm_parses_all_fields() {
        let cmd = parse_command("Start_Alarm(1): Group(10) 2 60 hello world").unwrap();
        assert_eq!(
            cmd,
            Command::Start {
                id: AlarmId(1),
                group: GroupId(10),
                interval: 2,
                time: 60,
                message: "hello world".into(),
            }
        );
    }

    #[test]
    fn change_alarm_has_no_interval_field() {
        let cmd = parse_command("Change_Alarm(1): Group(20) 60 hello").unwrap();
        assert_eq!(
            cmd,
            Command::Change {
                id: AlarmId(1),
                group: GroupId(20),
                time: 60,
                message: "hello".into(),
            }
        );
    }

    #[test_case("Cancel_Alarm(7)", Command::Cancel { id: AlarmId(7) }; "cancel")]
    #[test_case("Suspend_Alarm(8)", Command::Suspend { id: AlarmId(8) }; "suspend")]
    #[test_case("Reactivate_Alarm(9)", Command::Reactivate { id: AlarmId(9) }; "reactivate")]
    #[test_case("View_Alarms", Command::View; "view")]
    #[test_case("quit", Command::Quit; "quit")]
    #[test_case("exit", Command::Quit; "exit")]
    fn simple_commands_parse(line: &str, expected: Command) {
        assert_eq!(parse_command(line).unwrap(), expected);
    }

    #[test_case("Start_Alarm(0): Group(1) 1 1 m"; "zero id")]
    #[test_case("Start_Alarm(1): Group(0) 1 1 m"; "zero group")]
    #[test_case("Start_Alarm(1): Group(1) 0 1 m"; "zero interval")]
    #[test_case("Start_Alarm(1): Group(1) 1 0 m"; "zero time")]
    #[test_case("Start_Alarm(-5): Group(1) 1 1 m"; "negative id")]
    #[test_case("Cancel_Alarm(0)"; "zero cancel id")]
    fn non_positive_fields_are_invalid_parameters(line: &str) {
        assert_eq!(parse_command(line), Err(ParseRejection::InvalidParameters));
    }

    #[test_case(""; "empty line")]
    #[test_case("start_alarm(1): Group(1) 1 1 m"; "lowercase keyword")]
    #[test_case("Start_Alarm(1) Group(1) 1 1 m"; "missing colon")]
    #[test_case("Start_Alarm(1): Group(1) 1 m"; "missing time field")]
    #[test_case("Change_Alarm(1): Group(2) 5    "; "missing message")]
    #[test_case("Cancel_Alarm(1) trailing"; "trailing junk")]
    #[test_case("View_Alarms()"; "view takes no args")]
    #[test_case("QUIT"; "quit is lowercase only")]
    #[test_case("Start_Alarm(x): Group(1) 1 1 m"; "non numeric id")]
    fn malformed_lines_are_unrecognized(line: &str) {
        assert_eq!(parse_command(line), Err(ParseRejection::UnrecognizedFormat));
    }

    #[test]
    fn rejection_messages_match_console_contract() {
        assert_eq!(
            ParseRejection::InvalidParameters.to_string(),
            "Invalid parameters"
        );
        assert_eq!(
            ParseRejection::UnrecognizedFormat.to_string(),
            "Unrecognized command format"
        );
    }
}
