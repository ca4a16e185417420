// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Fleet lifecycle: spawn the dispatcher and the five handlers, and tear
//! everything down joinably.
//!
//! Display scheduler threads are *not* spawned here; the starter creates them
//! on demand and parks their join handles in the display registry, which
//! [`Engine::shutdown`] drains after the long-lived workers have stopped.

use std::{sync::Arc,
          thread::{self, JoinHandle}};

use tracing::info;

use crate::{common::{AlarmEngineError, CommonResult},
            context::CoreContext,
            dispatch::run_dispatcher,
            handlers::{run_canceller, run_changer, run_starter, run_suspender,
                       run_viewer}};

/// A running alarm-manager fleet. Dropping it without calling
/// [`Engine::shutdown`] leaks the worker threads (they run until process
/// exit), which is what the interactive binary wants only for abnormal exits.
#[allow(missing_debug_implementations)]
pub struct Engine {
    ctx: Arc<CoreContext>,
    workers: Vec<JoinHandle<()>>,
}

impl Engine {
    /// Spawn the dispatcher and all five handler threads.
    ///
    /// # Errors
    ///
    /// Returns an error if any worker thread cannot be spawned; per the
    /// engine's error policy the caller should treat that as fatal.
    pub fn spawn(ctx: Arc<CoreContext>) -> CommonResult<Self> {
        let mut workers = Vec::with_capacity(6);
        workers.push(spawn_worker("dispatcher", &ctx, run_dispatcher)?);
        workers.push(spawn_worker("starter", &ctx, run_starter)?);
        workers.push(spawn_worker("changer", &ctx, run_changer)?);
        workers.push(spawn_worker("suspender", &ctx, run_suspender)?);
        workers.push(spawn_worker("canceller", &ctx, run_canceller)?);
        workers.push(spawn_worker("viewer", &ctx, run_viewer)?);
        info!("engine fleet spawned");
        Ok(Self { ctx, workers })
    }

    #[must_use]
    pub fn context(&self) -> &Arc<CoreContext> { &self.ctx }

    /// Raise the shutdown flag, then join every worker: the dispatcher (the
    /// queue is closed), the handlers (their signals are broadcast), and all
    /// display threads (they observe the flag on their next tick).
    pub fn shutdown(self) {
        self.ctx.request_shutdown();
        for handle in self.workers {
            let _ = handle.join();
        }
        self.ctx.registry.join_all();
        info!("engine fleet stopped");
    }
}

fn spawn_worker(
    name: &str,
    ctx: &Arc<CoreContext>,
    body: fn(&Arc<CoreContext>),
) -> CommonResult<JoinHandle<()>> {
    let ctx = Arc::clone(ctx);
    thread::Builder::new()
        .name(name.into())
        .spawn(move || body(&ctx))
        .map_err(|source| {
            AlarmEngineError::ThreadSpawn {
                name: name.into(),
                source,
            }
            .into_report()
        })
}
