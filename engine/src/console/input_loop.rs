// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The external producer: reads user text, parses it, and enqueues admitted
//! requests.
//!
//! Two modes, chosen by whether stdin is a terminal:
//!
//! - **interactive**: raw mode via `crossterm`, key-by-key editing of the
//!   shared [`LineState`] (with history recall), the prompt redrawn after
//!   every keystroke and underneath every asynchronous output line;
//! - **non-interactive** (piped input): plain line-by-line reads, no raw
//!   mode, which keeps the binary scriptable.
//!
//! Returns when the user quits (`quit`, `exit`, Ctrl+C or Ctrl+D); the
//! caller is responsible for shutting the engine down afterwards.

use std::{io::{BufRead, IsTerminal},
          sync::Arc};

use crossterm::{event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
                terminal};
use tracing::{debug, warn};

use crate::{common::{AlarmEngineError, CommonResult},
            console::parser::{parse_command, Command},
            context::CoreContext};

/// Run the input loop until the user quits. See the module docs.
///
/// # Errors
///
/// Returns an error if the terminal cannot be put into (or taken out of) raw
/// mode, or if reading an input event fails.
pub fn run_input_loop(ctx: &Arc<CoreContext>) -> CommonResult<()> {
    if std::io::stdin().is_terminal() && ctx.writer.is_interactive() {
        run_interactive(ctx)
    } else {
        run_piped(ctx);
        Ok(())
    }
}

/// What [`process_line`] tells the loop to do next.
enum LoopControl {
    Continue,
    Quit,
}

/// Parse and act on one submitted line. Parse rejections go straight back to
/// the console; admitted requests are enqueued (blocking while the queue is
/// full).
fn process_line(ctx: &Arc<CoreContext>, line: &str) -> LoopControl {
    if line.trim().is_empty() {
        return LoopControl::Continue;
    }
    match parse_command(line) {
        Err(rejection) => {
            warn!(%line, %rejection, "command rejected");
            ctx.writer.line(&rejection.to_string());
            LoopControl::Continue
        }
        Ok(Command::Quit) => LoopControl::Quit,
        Ok(command) => match ctx.submit(command) {
            Ok(()) => LoopControl::Continue,
            // The engine is already shutting down underneath us.
            Err(AlarmEngineError::QueueClosed) => LoopControl::Quit,
            Err(other) => {
                warn!(error = %other, "request not admitted");
                LoopControl::Continue
            }
        },
    }
}

fn run_piped(ctx: &Arc<CoreContext>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if matches!(process_line(ctx, &line), LoopControl::Quit) {
            break;
        }
    }
}

/// Restores cooked mode even when the loop errors out.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> std::io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) { let _ = terminal::disable_raw_mode(); }
}

fn run_interactive(ctx: &Arc<CoreContext>) -> CommonResult<()> {
    use miette::IntoDiagnostic;

    let _raw_mode = RawModeGuard::enable().into_diagnostic()?;
    ctx.writer.redraw_input();

    loop {
        let event = event::read().into_diagnostic()?;
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event
        else {
            continue;
        };

        match code {
            KeyCode::Char('c' | 'd') if modifiers.contains(KeyModifiers::CONTROL) => {
                ctx.writer.finish_input_line();
                debug!("input loop: control-key quit");
                return Ok(());
            }
            KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
                ctx.writer.line_state().lock().unwrap().erase_line();
                ctx.writer.redraw_input();
            }
            KeyCode::Char('w') if modifiers.contains(KeyModifiers::CONTROL) => {
                ctx.writer.line_state().lock().unwrap().erase_word();
                ctx.writer.redraw_input();
            }
            KeyCode::Char(c) => {
                ctx.writer.line_state().lock().unwrap().insert_char(c);
                ctx.writer.redraw_input();
            }
            KeyCode::Backspace => {
                ctx.writer.line_state().lock().unwrap().backspace();
                ctx.writer.redraw_input();
            }
            KeyCode::Up => {
                ctx.writer.line_state().lock().unwrap().history_prev();
                ctx.writer.redraw_input();
            }
            KeyCode::Down => {
                ctx.writer.line_state().lock().unwrap().history_next();
                ctx.writer.redraw_input();
            }
            KeyCode::Enter => {
                let line = ctx.writer.line_state().lock().unwrap().take_line();
                ctx.writer.finish_input_line();
                if matches!(process_line(ctx, &line), LoopControl::Quit) {
                    return Ok(());
                }
                ctx.writer.redraw_input();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{console::writer::ConsoleWriter,
                context::{CoreContext, EngineConfig}};

    fn ctx_with_mock() -> (Arc<CoreContext>, crate::console::ConsoleMockHandle) {
        let (writer, handle) = ConsoleWriter::new_mock();
        (
            Arc::new(CoreContext::new(EngineConfig::default(), writer)),
            handle,
        )
    }

    #[test]
    fn rejected_lines_echo_the_rejection() {
        let (ctx, handle) = ctx_with_mock();
        assert!(matches!(
            process_line(&ctx, "Start_Alarm(0): Group(1) 1 1 m"),
            LoopControl::Continue
        ));
        assert!(matches!(
            process_line(&ctx, "nonsense"),
            LoopControl::Continue
        ));
        assert_eq!(handle.count_lines_containing("Invalid parameters"), 1);
        assert_eq!(
            handle.count_lines_containing("Unrecognized command format"),
            1
        );
        assert_eq!(ctx.queue.len(), 0);
    }

    #[test]
    fn quit_line_stops_the_loop_without_enqueueing() {
        let (ctx, _handle) = ctx_with_mock();
        assert!(matches!(process_line(&ctx, "quit"), LoopControl::Quit));
        assert_eq!(ctx.queue.len(), 0);
    }

    #[test]
    fn admitted_commands_reach_the_queue() {
        let (ctx, _handle) = ctx_with_mock();
        assert!(matches!(
            process_line(&ctx, "Start_Alarm(1): Group(10) 2 60 hello"),
            LoopControl::Continue
        ));
        assert_eq!(ctx.queue.len(), 1);
    }
}
