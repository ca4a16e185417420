// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::io;

use miette::Diagnostic;
use thiserror::Error;

/// Convenience alias used at every fallible seam of the engine. `miette`
/// produces the fancy report at the binary boundary; inside the engine plain
/// `?` propagation is used.
pub type CommonResult<T> = miette::Result<T>;

/// Errors produced by the engine itself. Handlers never surface these to their
/// caller (they log and continue); this type exists for the seams that *do*
/// propagate: queue admission, thread spawning, and terminal I/O.
#[derive(Debug, Error, Diagnostic)]
pub enum AlarmEngineError {
    /// An internal I/O error occurred while writing to the terminal.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The request queue was closed while a producer or consumer was blocked
    /// on it. This only happens during shutdown.
    #[error("alarm request queue is closed")]
    QueueClosed,

    /// Failed to spawn a worker thread. Treated as unrecoverable by callers:
    /// recovery would require a partial unwind of shared state.
    #[error("failed to spawn worker thread `{name}`: {source}")]
    ThreadSpawn {
        name: String,
        #[source]
        source: io::Error,
    },
}

impl AlarmEngineError {
    /// Lift into a [`miette::Report`] at the app boundary.
    #[must_use]
    pub fn into_report(self) -> miette::Report { miette::Report::new(self) }
}
