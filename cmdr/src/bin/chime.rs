// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use chime_cmdr::{clap_config::CLIArg, launcher, logging};
use clap::Parser as _;

fn main() -> miette::Result<()> {
    let arg = CLIArg::parse();
    let _log_guard = logging::init_tracing(&arg)?;
    launcher::try_run_session(&arg)
}
