// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The five cooperating request handlers. Each is a long-lived worker that
//! waits on its dedicated [`crate::sync::Signal`], re-checks its table
//! predicate after every wake-up (Mesa semantics), consumes its category of
//! request record, and mutates the alarm table under the writer lock.

// Attach sources.
pub mod canceller;
pub mod changer;
pub mod starter;
pub mod suspender;
pub mod viewer;

// Re-export.
pub use canceller::*;
pub use changer::*;
pub use starter::*;
pub use suspender::*;
pub use viewer::*;
