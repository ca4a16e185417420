// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Application shell for the `chime` alarm manager: CLI parsing, tracing
//! initialization, and the interactive session bootstrap. All the actual
//! behavior lives in [`chime_engine`].

// Attach sources.
pub mod clap_config;
pub mod launcher;
pub mod logging;

// Re-export.
pub use clap_config::*;
pub use launcher::*;
pub use logging::*;
