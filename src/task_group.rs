//! Structured fan-out for independent async units of work.
//!
//! Every unit runs on its own tokio task and shares one cancellation token.
//! `wait` joins them; the first unit to fail cancels the token and its error
//! becomes the result of the whole group. Siblings observe the cancellation
//! cooperatively and are not awaited. Dropping the group (or the `wait`
//! future, e.g. when the request is abandoned) cancels every unit as well.
//!
//! ```ignore
//! let mut group = TaskGroup::new();
//! let page = group.spawn(async move { repo.list(&filter).await });
//! let total = group.spawn(async move { repo.count(&filter).await });
//! group.wait().await?;
//! let (page, total) = (page.take()?, total.take()?);
//! ```

use std::future::Future;

use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tokio_util::sync::{CancellationToken, DropGuard};

/// A unit stopped because its group was cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("task group cancelled")]
pub struct Cancelled;

pub struct TaskGroup<E> {
    tasks: JoinSet<Result<(), E>>,
    token: CancellationToken,
    guard: DropGuard,
}

/// Output of one unit, readable after the group joined successfully
pub struct Deferred<T>(oneshot::Receiver<T>);

impl<T> Deferred<T> {
    pub fn take<E: From<Cancelled>>(mut self) -> Result<T, E> {
        self.0.try_recv().map_err(|_| E::from(Cancelled))
    }
}

impl<E> TaskGroup<E>
where
    E: From<Cancelled> + Send + 'static,
{
    pub fn new() -> Self {
        Self::with_parent(&CancellationToken::new())
    }

    /// Group whose units also stop when `parent` is cancelled
    pub fn with_parent(parent: &CancellationToken) -> Self {
        let token = parent.child_token();
        Self {
            tasks: JoinSet::new(),
            guard: token.clone().drop_guard(),
            token,
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn spawn<T, F>(&mut self, unit: F) -> Deferred<T>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let token = self.token.clone();
        self.tasks.spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(E::from(Cancelled)),
                result = unit => {
                    // receiver only goes away when the group was abandoned
                    let _ = tx.send(result?);
                    Ok(())
                }
            }
        });
        Deferred(rx)
    }

    /// Join every unit, short-circuiting on the first failure
    pub async fn wait(mut self) -> Result<(), E> {
        let _guard = self.guard;
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    self.token.cancel();
                    // cancelled siblings wind down on their own
                    self.tasks.detach_all();
                    return Err(err);
                }
                Err(join_error) if join_error.is_panic() => {
                    self.token.cancel();
                    std::panic::resume_unwind(join_error.into_panic());
                }
                Err(_) => {
                    self.token.cancel();
                    self.tasks.detach_all();
                    return Err(E::from(Cancelled));
                }
            }
        }
        Ok(())
    }
}

impl<E> Default for TaskGroup<E>
where
    E: From<Cancelled> + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
