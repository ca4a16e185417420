// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Shared harness for the end-to-end scenario tests: a real worker fleet
//! over a console capture, plus polling helpers that wait on the console
//! protocol lines.

use std::{sync::Arc,
          time::{Duration, Instant}};

use chime_engine::{parse_command, ConsoleMockHandle, ConsoleWriter, CoreContext,
                   Engine, EngineConfig};

pub struct TestSession {
    pub engine: Option<Engine>,
    pub ctx: Arc<CoreContext>,
    pub console: ConsoleMockHandle,
}

impl TestSession {
    /// Spawn a full fleet with a fast display tick so state changes become
    /// visible quickly. Alarm intervals/expiries still have one-second
    /// granularity.
    pub fn boot(tick_ms: u64) -> Self {
        let (writer, console) = ConsoleWriter::new_mock();
        let config = EngineConfig {
            tick: Duration::from_millis(tick_ms),
            ..EngineConfig::default()
        };
        let ctx = Arc::new(CoreContext::new(config, writer));
        let engine = Engine::spawn(Arc::clone(&ctx)).expect("fleet spawns");
        Self {
            engine: Some(engine),
            ctx,
            console,
        }
    }

    /// Parse and submit one console line, as the input loop would.
    pub fn submit(&self, line: &str) {
        let command = parse_command(line).expect("test commands are well-formed");
        self.ctx.submit(command).expect("queue accepts while running");
    }

    /// Wait until `needle` has appeared in at least `count` console lines.
    pub fn wait_for_count(&self, needle: &str, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.console.count_lines_containing(needle) >= count {
                return true;
            }
            std::thread::sleep(Duration::from_millis(25));
        }
        false
    }

    pub fn wait_for(&self, needle: &str, timeout: Duration) -> bool {
        self.wait_for_count(needle, 1, timeout)
    }

    /// Assert, with a captured-console dump on failure.
    #[track_caller]
    pub fn expect(&self, needle: &str, timeout: Duration) {
        assert!(
            self.wait_for(needle, timeout),
            "console never showed {needle:?}; captured:\n{}",
            self.console.output_as_string()
        );
    }
}

impl Drop for TestSession {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            engine.shutdown();
        }
    }
}
