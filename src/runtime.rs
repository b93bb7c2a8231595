//! Running async work from synchronous entry points.
//!
//! [`block_on`] uses whatever Tokio runtime the caller already has and only
//! creates one when there is none. A runtime it creates lives for the single
//! call and is dropped afterwards.

use crate::error::{LitrevError, Result};
use std::future::Future;
use tokio::runtime::{Builder, Handle, Runtime, RuntimeFlavor};
use tracing::debug;

/// Where a blocking call will drive its future.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    /// A multi-threaded runtime is active; block this worker in place.
    Shared,
    /// A current-thread runtime is active and cannot be blocked; use a
    /// dedicated thread with its own runtime.
    Dedicated,
    /// No runtime is active; create one for this call.
    Fresh,
}

impl ExecutionContext {
    pub fn detect() -> Self {
        match Handle::try_current() {
            Ok(handle) => match handle.runtime_flavor() {
                RuntimeFlavor::CurrentThread => ExecutionContext::Dedicated,
                _ => ExecutionContext::Shared,
            },
            Err(_) => ExecutionContext::Fresh,
        }
    }
}

fn fresh_runtime() -> Result<Runtime> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| LitrevError::Runtime(format!("Failed to start async runtime: {}", e)))
}

/// Run `future` to completion from synchronous code.
pub fn block_on<F>(future: F) -> Result<F::Output>
where
    F: Future + Send,
    F::Output: Send,
{
    let context = ExecutionContext::detect();
    debug!("Running blocking call in {:?} context", context);

    match context {
        ExecutionContext::Shared => {
            let handle = Handle::current();
            Ok(tokio::task::block_in_place(|| handle.block_on(future)))
        }
        ExecutionContext::Fresh => Ok(fresh_runtime()?.block_on(future)),
        ExecutionContext::Dedicated => std::thread::scope(|scope| {
            scope
                .spawn(|| fresh_runtime().map(|rt| rt.block_on(future)))
                .join()
                .map_err(|_| LitrevError::Runtime("Worker thread panicked".to_string()))?
        }),
    }
}
