//! Run context propagation
//!
//! Tools are called by an orchestration engine we do not control, so the
//! per-run [`RunContext`] cannot be threaded through every signature. It is
//! made available two ways:
//!
//! 1. **Scoped**: a tokio task-local set by [`RunContextPropagator::scope`],
//!    visible to everything awaited inside that future.
//! 2. **Fallback**: a process-wide table keyed by thread id, set by
//!    [`RunContextPropagator::begin_run`] and refined at tool-call boundaries,
//!    for code that runs outside the scoped future (spawned tasks, callbacks).
//!
//! Lookup tries the scope first. Unkeyed fallback lookup only answers when
//! exactly one run is active; with several runs it returns `None` rather than
//! guess.

use mmagent_domain::RunContext;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};
use tracing::debug;

tokio::task_local! {
    static SCOPED_RUN: RunContext;
}

#[derive(Default)]
pub struct RunContextPropagator {
    fallback: RwLock<HashMap<String, RunContext>>,
}

impl RunContextPropagator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `ctx` as an active run. The run ends when the guard drops.
    pub fn begin_run(self: &Arc<Self>, ctx: RunContext) -> RunGuard {
        let thread_id = ctx.thread_id.clone();
        {
            let mut fallback = self.fallback.write().unwrap_or_else(|e| e.into_inner());
            fallback.insert(thread_id.clone(), ctx);
        }
        debug!(thread_id = %thread_id, "Run started");
        RunGuard {
            propagator: Arc::clone(self),
            thread_id,
        }
    }

    /// Run `fut` with `ctx` as the scoped context.
    pub async fn scope<F>(&self, ctx: RunContext, fut: F) -> F::Output
    where
        F: Future,
    {
        SCOPED_RUN.scope(ctx, fut).await
    }

    /// Record the tool call now in progress for `thread_id`.
    ///
    /// A `None` message id keeps the one already recorded; the tool call id
    /// is always replaced.
    pub fn update_tool_call(
        &self,
        thread_id: &str,
        message_id: Option<String>,
        tool_call_id: Option<String>,
    ) {
        let mut fallback = self.fallback.write().unwrap_or_else(|e| e.into_inner());
        if let Some(ctx) = fallback.get_mut(thread_id) {
            if message_id.is_some() {
                ctx.message_id = message_id;
            }
            ctx.tool_call_id = tool_call_id;
        }
    }

    /// Context for the current code path.
    pub fn current(&self) -> Option<RunContext> {
        if let Ok(ctx) = SCOPED_RUN.try_with(|ctx| ctx.clone()) {
            return Some(ctx);
        }
        let fallback = self.fallback.read().unwrap_or_else(|e| e.into_inner());
        match fallback.len() {
            1 => fallback.values().next().cloned(),
            0 => None,
            active => {
                debug!(active, "Several runs active, not guessing a run context");
                None
            }
        }
    }

    /// Context for a known thread: the scoped one if it matches, else the fallback entry.
    pub fn for_thread(&self, thread_id: &str) -> Option<RunContext> {
        if let Ok(Some(ctx)) =
            SCOPED_RUN.try_with(|ctx| (ctx.thread_id == thread_id).then(|| ctx.clone()))
        {
            return Some(ctx);
        }
        let fallback = self.fallback.read().unwrap_or_else(|e| e.into_inner());
        fallback.get(thread_id).cloned()
    }

    pub fn active_runs(&self) -> usize {
        self.fallback.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn end_run(&self, thread_id: &str) {
        let mut fallback = self.fallback.write().unwrap_or_else(|e| e.into_inner());
        if fallback.remove(thread_id).is_some() {
            debug!(thread_id, "Run ended");
        }
    }
}

/// Keeps a run's fallback entry alive; clears it on drop.
pub struct RunGuard {
    propagator: Arc<RunContextPropagator>,
    thread_id: String,
}

impl RunGuard {
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.propagator.end_run(&self.thread_id);
    }
}
