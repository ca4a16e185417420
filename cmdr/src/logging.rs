// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Tracing initialization.
//!
//! The console belongs to the alarm protocol lines, so diagnostics go to a
//! file (or nowhere). The file writer is non-blocking: worker threads must
//! never stall on log I/O while holding a lock. Layers are built as boxed
//! [`Layer`]s over the registry so more sinks can be composed later without
//! changing the call sites.

use std::fs::File;

use miette::IntoDiagnostic;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt as _,
                         util::SubscriberInitExt as _,
                         Layer};

use crate::clap_config::CLIArg;

/// Type alias for a boxed layer.
pub type DynLayer<S> = dyn Layer<S> + Send + Sync + 'static;

/// Install the global tracing subscriber per the CLI flags. Without
/// `--log-file` this is a no-op. The returned guard must be held for the
/// lifetime of the program: dropping it flushes and stops the writer thread.
///
/// # Errors
///
/// Returns an error if the log file cannot be created or a subscriber is
/// already installed.
pub fn init_tracing(arg: &CLIArg) -> miette::Result<Option<WorkerGuard>> {
    let Some(path) = &arg.log_file else {
        return Ok(None);
    };

    let file = File::create(path).into_diagnostic()?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    let level_filter: tracing_core::LevelFilter = arg.log_level.into();

    let layers: Vec<Box<DynLayer<tracing_subscriber::Registry>>> = vec![
        Box::new(level_filter),
        Box::new(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_names(true),
        ),
    ];

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .into_diagnostic()?;
    Ok(Some(guard))
}
