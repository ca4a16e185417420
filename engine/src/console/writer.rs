// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The line sink every worker prints through.
//!
//! In interactive mode each emitted line: clears the current terminal line,
//! writes the output line, then redraws the prompt and whatever the user has
//! typed so far — so asynchronous output never clobbers the input line. The
//! whole sequence happens under one mutex, which is what makes each console
//! line atomic with respect to concurrent workers.
//!
//! In non-interactive mode (piped stdin/stdout, capture mocks) the writer
//! degrades to plain `writeln!`.
//!
//! Tests swap the terminal for an in-memory capture via
//! [`ConsoleWriter::new_mock`]; the returned [`ConsoleMockHandle`] is how the
//! scenario tests observe the engine's console protocol.

use std::{io::Write as _, sync::Arc};

use crossterm::{cursor::MoveToColumn,
                terminal::{Clear, ClearType},
                Command};

use crate::{console::line_state::LineState, StdMutex};

pub type SafeLineState = Arc<StdMutex<LineState>>;

/// Clonable, thread-safe console sink. See the module docs.
#[derive(Clone)]
#[allow(missing_debug_implementations)]
pub struct ConsoleWriter {
    /// Every emitted line takes this mutex for its whole clear/write/redraw
    /// sequence, so concurrent workers cannot interleave mid-line.
    sink: Arc<StdMutex<dyn std::io::Write + Send>>,
    line_state: SafeLineState,
    interactive: bool,
}

impl ConsoleWriter {
    /// The production writer: alarm protocol lines go to stdout, woven around
    /// the user's input line when `interactive`.
    #[must_use]
    pub fn new_stdout(line_state: SafeLineState, interactive: bool) -> Self {
        Self {
            sink: Arc::new(StdMutex::new(std::io::stdout())),
            line_state,
            interactive,
        }
    }

    /// A non-interactive writer over an in-memory capture, plus the handle
    /// the test uses to read the emitted protocol lines back.
    #[must_use]
    pub fn new_mock() -> (Self, ConsoleMockHandle) {
        let buffer = Arc::new(StdMutex::new(Vec::new()));
        let writer = Self {
            sink: Arc::new(StdMutex::new(CaptureSink {
                buffer: Arc::clone(&buffer),
            })),
            line_state: Arc::new(StdMutex::new(LineState::new(""))),
            interactive: false,
        };
        (writer, ConsoleMockHandle { buffer })
    }

    #[must_use]
    pub fn line_state(&self) -> &SafeLineState { &self.line_state }

    #[must_use]
    pub fn is_interactive(&self) -> bool { self.interactive }

    /// Emit one output line, preserving the user's input line underneath it.
    ///
    /// # Panics
    ///
    /// Panics if the sink or line-state mutex is poisoned (a worker panicked
    /// mid-write); the engine treats that as unrecoverable.
    pub fn line(&self, text: &str) {
        let mut out = self.sink.lock().unwrap();
        if self.interactive {
            let state = self.line_state.lock().unwrap();
            let _ = out.write_all(clear_sequence().as_bytes());
            let _ = write!(out, "{text}\r\n{}", state.rendered());
        } else {
            let _ = writeln!(out, "{text}");
        }
        let _ = out.flush();
    }

    /// Redraw the prompt and input buffer (after a keystroke).
    ///
    /// # Panics
    ///
    /// Panics if the sink or line-state mutex is poisoned.
    pub fn redraw_input(&self) {
        if !self.interactive {
            return;
        }
        let mut out = self.sink.lock().unwrap();
        let state = self.line_state.lock().unwrap();
        let _ = out.write_all(clear_sequence().as_bytes());
        let _ = write!(out, "{}", state.rendered());
        let _ = out.flush();
    }

    /// Move off the input line after the user presses Enter, leaving the
    /// submitted command visible in the scrollback.
    ///
    /// # Panics
    ///
    /// Panics if the sink mutex is poisoned.
    pub fn finish_input_line(&self) {
        if !self.interactive {
            return;
        }
        let mut out = self.sink.lock().unwrap();
        let _ = out.write_all(b"\r\n");
        let _ = out.flush();
    }
}

/// ANSI prefix that returns the caret to column 0 and clears the line. Built
/// through [`Command::write_ansi`] so it works on any `dyn Write` sink.
fn clear_sequence() -> String {
    let mut seq = String::new();
    let _ = MoveToColumn(0).write_ansi(&mut seq);
    let _ = Clear(ClearType::CurrentLine).write_ansi(&mut seq);
    seq
}

/// Write-side of the capture mock.
#[derive(Debug)]
struct CaptureSink {
    buffer: Arc<StdMutex<Vec<u8>>>,
}

impl std::io::Write for CaptureSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
}

/// Read-side of the capture mock: the scenario tests poll this for the
/// console protocol lines the workers emitted.
#[derive(Clone, Debug)]
pub struct ConsoleMockHandle {
    buffer: Arc<StdMutex<Vec<u8>>>,
}

impl ConsoleMockHandle {
    /// Everything written so far, lossily decoded.
    ///
    /// # Panics
    ///
    /// Panics if the buffer mutex is poisoned.
    #[must_use]
    pub fn output_as_string(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }

    /// The captured output split into lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.output_as_string().lines().map(str::to_owned).collect()
    }

    /// How many captured lines contain `needle`.
    #[must_use]
    pub fn count_lines_containing(&self, needle: &str) -> usize {
        self.lines().iter().filter(|l| l.contains(needle)).count()
    }
}
