// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! # chime_engine
//!
//! A multi-threaded alarm manager. Users type commands on an interactive
//! console to add, modify, cancel, suspend, reactivate, and list periodic
//! alarms; a fleet of long-lived worker threads keeps printing each active
//! alarm's message at its configured interval while reacting visibly to state
//! changes (take-overs, expirations, hand-offs).
//!
//! # Architecture
//!
//! Commands flow through the system like this:
//!
//! ```text
//! input loop ──▶ RequestQueue ──▶ dispatcher ──▶ AlarmTable + Signal
//!                (bounded ring)                       │
//!                                      ┌──────────────┼──────────────┐
//!                                      ▼              ▼              ▼
//!                                   starter        changer     suspender /
//!                                   canceller                  reactivator
//!                                      │              viewer
//!                                      ▼
//!                              display schedulers (one per group, ≤2 alarms)
//!                                      │  round-robin over ascending group ids
//!                                      ▼
//!                               ConsoleWriter (line-preserving output)
//! ```
//!
//! - [`queue::RequestQueue`] is the sole hand-off point between the input loop
//!   (producer) and the dispatcher (consumer): a fixed-capacity ring guarded by
//!   one mutex and two condition variables.
//! - [`table::AlarmTable`] is the shared directory of all alarms, guarded by a
//!   writer-preferring reader/writer lock ([`sync::TableRwLock`]).
//! - The dispatcher routes each request to one of five handler threads by
//!   signalling a per-kind [`sync::Signal`] (Mesa semantics: handlers re-check
//!   their predicate after every wake-up).
//! - One [`display::DisplayScheduler`] thread exists per active group. Each
//!   owns up to two alarms and prints them on a strict round-robin schedule
//!   across groups in ascending group-id order ([`display::RoundRobinCursor`]).
//! - All output goes through [`console::ConsoleWriter`], which keeps the
//!   user's partially-typed input line intact underneath asynchronous output.
//!
//! # Lock order
//!
//! Locks are always acquired in this order and released in reverse:
//!
//! 1. [`sync::TableRwLock`] on the alarm table (read or write).
//! 2. Display registry mutex ([`display::DisplayRegistry`]).
//! 3. Per-scheduler slot mutex.
//! 4. Round-robin cursor mutex.
//! 5. Request queue mutex (leaf, never held across any other lock).
//!
//! See the repository's `DESIGN.md` for the rationale behind each choice.

// Attach sources.
pub mod common;
pub mod console;
pub mod context;
pub mod dispatch;
pub mod display;
pub mod engine;
pub mod handlers;
pub mod model;
pub mod queue;
pub mod sync;
pub mod table;

// Re-export the public API.
pub use common::*;
pub use console::*;
pub use context::*;
pub use dispatch::*;
pub use display::*;
pub use engine::*;
pub use handlers::*;
pub use model::*;
pub use queue::*;
pub use sync::*;
pub use table::*;

// Type aliases.
pub type StdMutex<T> = std::sync::Mutex<T>;
