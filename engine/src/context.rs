// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The explicit "core context" every worker receives: all shared state, the
//! locks that guard it, and the wake-up channels, in one place. Nothing in
//! the engine is a global.

use std::{sync::atomic::{AtomicBool, Ordering},
          time::Duration};

use tracing::debug;

use crate::{common::{now_unix, AlarmEngineError},
            console::{parser::Command, writer::ConsoleWriter},
            display::{registry::DisplayRegistry, round_robin::RoundRobinCursor},
            model::{AlarmKind, AlarmRecord},
            queue::{RequestQueue, REQUEST_QUEUE_CAPACITY},
            sync::{HandlerSignals, TableRwLock},
            table::AlarmTable};

/// Operational knobs. The defaults are the product's contract (1-second
/// display tick, 4-slot request queue); the binary exposes them as flags.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub queue_capacity: usize,
    /// Display scheduler period.
    pub tick: Duration,
    pub prompt: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: REQUEST_QUEUE_CAPACITY,
            tick: Duration::from_secs(1),
            prompt: "> ".into(),
        }
    }
}

/// Shared state of the whole engine. See the crate docs for the lock order
/// across the fields.
#[allow(missing_debug_implementations)]
pub struct CoreContext {
    pub config: EngineConfig,
    pub table: TableRwLock<AlarmTable>,
    pub queue: RequestQueue<AlarmRecord>,
    pub signals: HandlerSignals,
    pub registry: DisplayRegistry,
    pub cursor: RoundRobinCursor,
    pub writer: ConsoleWriter,
    shutdown: AtomicBool,
}

impl CoreContext {
    #[must_use]
    pub fn new(config: EngineConfig, writer: ConsoleWriter) -> Self {
        let queue = RequestQueue::new(config.queue_capacity);
        Self {
            config,
            table: TableRwLock::new(AlarmTable::new()),
            queue,
            signals: HandlerSignals::new(),
            registry: DisplayRegistry::new(),
            cursor: RoundRobinCursor::new(),
            writer,
            shutdown: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn is_shutdown(&self) -> bool { self.shutdown.load(Ordering::SeqCst) }

    /// Raise the shutdown flag and wake every blocked worker: the queue
    /// unblocks its producer/consumer, the signals wake the handlers, and the
    /// display threads notice on their next tick.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.queue.close();
        self.signals.notify_all();
        debug!("shutdown requested");
    }

    /// Admit a parsed command into the request queue, emitting the
    /// producer-side console line with the slot index used. [`Command::Quit`]
    /// short-circuits into [`Self::request_shutdown`].
    ///
    /// # Errors
    ///
    /// Returns [`AlarmEngineError::QueueClosed`] if the engine is already
    /// shutting down.
    pub fn submit(&self, command: Command) -> Result<(), AlarmEngineError> {
        let record = match command {
            Command::Quit => {
                self.request_shutdown();
                return Ok(());
            }
            Command::Start {
                id,
                group,
                interval,
                time,
                message,
            } => AlarmRecord::admit_start(id, group, interval, time, &message),
            Command::Change {
                id,
                group,
                time,
                message,
            } => AlarmRecord::admit_change(id, group, time, &message),
            Command::Cancel { id } => AlarmRecord::admit_control(AlarmKind::Cancel, id),
            Command::Suspend { id } => {
                AlarmRecord::admit_control(AlarmKind::Suspend, id)
            }
            Command::Reactivate { id } => {
                AlarmRecord::admit_control(AlarmKind::Reactivate, id)
            }
            Command::View => AlarmRecord::admit_view(),
        };

        let kind = record.kind;
        let alarm_id = record.alarm_id;
        let group_id = record.group_id;
        let slot = self.queue.enqueue(record)?;
        self.writer.line(&format!(
            "Alarm Thread has Inserted Alarm_Request_Type {kind} Request({alarm_id}) at {}: Group({group_id}) into Alarm Request Queue at slot {slot}",
            now_unix()
        ));
        debug!(%kind, %alarm_id, slot, "request enqueued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::AlarmId;

    #[test]
    fn submit_enqueues_and_logs_the_slot() {
        let (writer, handle) = ConsoleWriter::new_mock();
        let ctx = CoreContext::new(EngineConfig::default(), writer);

        ctx.submit(Command::Cancel { id: AlarmId(3) }).unwrap();

        assert_eq!(ctx.queue.len(), 1);
        let (record, slot) = ctx.queue.dequeue().unwrap();
        assert_eq!(record.kind, AlarmKind::Cancel);
        assert_eq!(record.alarm_id, AlarmId(3));
        assert_eq!(slot, 0);
        assert_eq!(
            handle.count_lines_containing(
                "Alarm Thread has Inserted Alarm_Request_Type Cancel_Alarm Request(3)"
            ),
            1
        );
        assert_eq!(handle.count_lines_containing("at slot 0"), 1);
    }

    #[test]
    fn submit_quit_closes_the_queue() {
        let (writer, _handle) = ConsoleWriter::new_mock();
        let ctx = CoreContext::new(EngineConfig::default(), writer);

        ctx.submit(Command::Quit).unwrap();
        assert!(ctx.is_shutdown());
        assert!(matches!(
            ctx.submit(Command::View),
            Err(AlarmEngineError::QueueClosed)
        ));
    }
}
