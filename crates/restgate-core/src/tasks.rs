//! Detached background tasks.
//!
//! Drift probes, stale-while-revalidate refreshes, and OpenAPI
//! regeneration all run after the response has been returned. They are
//! detached from the request so a cancelled request does not cancel them;
//! failures are logged and swallowed.

use std::future::Future;

use tracing::warn;

use crate::error::Result;

/// Spawn a fire-and-forget task.
///
/// The task's error, if any, is logged at `warn` level under the given
/// name and otherwise discarded.
pub fn spawn_detached<F>(name: &'static str, task: F)
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = task.await {
            warn!(task = name, error = %e, "background task failed");
        }
    });
}
