// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Wire the CLI flags into an engine, run the interactive session, and tear
//! the fleet down when the user quits.

use std::{io::IsTerminal, sync::Arc};

use chime_engine::{run_input_loop, CommonResult, ConsoleWriter, CoreContext, Engine,
                   LineState, StdMutex};
use tracing::info;

use crate::clap_config::CLIArg;

/// Run one interactive alarm-manager session to completion.
///
/// # Errors
///
/// Returns an error if the worker fleet cannot be spawned or the terminal
/// cannot be driven.
pub fn try_run_session(arg: &CLIArg) -> CommonResult<()> {
    let config = arg.to_engine_config();

    // Interactive line preservation only makes sense on a real terminal with
    // a user typing on the other end.
    let interactive =
        std::io::stdin().is_terminal() && std::io::stdout().is_terminal();
    let line_state = Arc::new(StdMutex::new(LineState::new(config.prompt.clone())));
    let writer = ConsoleWriter::new_stdout(line_state, interactive);

    let ctx = Arc::new(CoreContext::new(config, writer));
    let engine = Engine::spawn(Arc::clone(&ctx))?;
    info!(interactive, "session started");

    let input_result = run_input_loop(&ctx);

    // Tear the fleet down even when the input loop errored out.
    engine.shutdown();
    info!("session ended");
    input_result
}
