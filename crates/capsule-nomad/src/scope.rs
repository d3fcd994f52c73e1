//! Fail-fast fan-out of concurrent tasks.
//!
//! A `CancelScope` owns a child cancellation token of the caller's token.
//! Every spawned task receives that child token; the first task to fail
//! cancels it so its siblings can bail out, and [`CancelScope::wait`]
//! joins all tasks before returning that first error.

use std::future::Future;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

pub struct CancelScope<E> {
    token: CancellationToken,
    tasks: JoinSet<Result<(), E>>,
}

impl<E: Send + 'static> CancelScope<E> {
    /// Open a scope canceled together with `parent`.
    pub fn new(parent: &CancellationToken) -> Self {
        Self {
            token: parent.child_token(),
            tasks: JoinSet::new(),
        }
    }

    /// Spawn a task built from the scope token.
    pub fn spawn<F, Fut>(&mut self, task: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        self.tasks.spawn(task(self.token.clone()));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Join every task. The first failure cancels the scope token and is
    /// returned once all tasks have finished.
    pub async fn wait(mut self) -> Result<(), E> {
        let mut first_err = None;
        while let Some(joined) = self.tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                // Tasks are never aborted while the scope is alive.
                Err(_) => continue,
            };
            if let Err(e) = outcome
                && first_err.is_none()
            {
                self.token.cancel();
                first_err = Some(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}
