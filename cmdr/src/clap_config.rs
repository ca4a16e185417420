// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! CLI surface. More info:
//! - <https://docs.rs/clap/latest/clap/_derive/#overview>

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use chime_engine::{EngineConfig, REQUEST_QUEUE_CAPACITY};

#[derive(Debug, Parser)]
#[command(bin_name = "chime")]
#[command(about = "Interactive multi-threaded alarm manager", long_about = None)]
#[command(version)]
#[command(next_line_help = true)]
pub struct CLIArg {
    /// Display scheduler period in milliseconds. The product contract is one
    /// second; lower it only for demos and tests.
    #[arg(long, default_value_t = 1_000)]
    pub tick_ms: u64,

    /// Capacity of the bounded alarm request queue.
    #[arg(long, default_value_t = REQUEST_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Prompt shown on the input line.
    #[arg(long, default_value = "> ")]
    pub prompt: String,

    /// Write diagnostic traces to this file. Console output stays reserved
    /// for the alarm protocol lines; without this flag, tracing is off.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Minimum level written to the log file.
    #[arg(long, value_enum, default_value_t = LogLevel::Debug)]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing_core::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}

impl CLIArg {
    /// Fold the CLI flags into the engine's configuration value.
    #[must_use]
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            queue_capacity: self.queue_capacity,
            tick: std::time::Duration::from_millis(self.tick_ms),
            prompt: self.prompt.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        CLIArg::command().debug_assert();
    }

    #[test]
    fn defaults_match_the_product_contract() {
        let arg = CLIArg::parse_from(["chime"]);
        let config = arg.to_engine_config();
        assert_eq!(config.queue_capacity, 4);
        assert_eq!(config.tick, std::time::Duration::from_secs(1));
        assert_eq!(config.prompt, "> ");
    }

    #[test]
    fn flags_override_defaults() {
        let arg = CLIArg::parse_from([
            "chime",
            "--tick-ms",
            "250",
            "--queue-capacity",
            "8",
            "--prompt",
            "alarm> ",
        ]);
        let config = arg.to_engine_config();
        assert_eq!(config.tick, std::time::Duration::from_millis(250));
        assert_eq!(config.queue_capacity, 8);
        assert_eq!(config.prompt, "alarm> ");
    }
}
