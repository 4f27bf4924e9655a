//! Bounded retry with exponential backoff.
//!
//! The Vercel API is eventually consistent for a handful of read-after-write
//! paths: a just-invited member may not appear in the next list call, a
//! just-created project may 404 for a moment. [`Retry`] masks those windows
//! by re-running an operation with exponentially growing delays.
//!
//! The helper never decides whether an error is retryable. The operation
//! reports each failure as either [`Attempt::Retry`] (transient, try again
//! after the backoff) or [`Attempt::Halt`] (terminal, return immediately),
//! and the error is propagated verbatim in both cases.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use vercel_provider::retry::{Attempt, Retry};
//!
//! let members = Retry::new(Duration::from_millis(200), 7)
//!     .run(|_attempt| async {
//!         match api.list_members(&project_id).await {
//!             Ok(members) if !members.is_empty() => Ok(members),
//!             Ok(_) => Err(Attempt::Retry(ProviderError::NotFound(project_id.clone()))),
//!             Err(e) if e.is_not_found() => Err(Attempt::Retry(e)),
//!             Err(e) => Err(Attempt::Halt(e)),
//!         }
//!     })
//!     .await?;
//! ```

use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// Outcome of a single failed attempt, as classified by the operation.
#[derive(Debug)]
pub enum Attempt<E> {
    /// Transient failure: retry after the backoff delay.
    Retry(E),
    /// Terminal failure: stop immediately.
    Halt(E),
}

/// A bounded retry policy with exponential backoff.
///
/// Constructed fresh at each call site; holds no state between runs.
#[derive(Debug, Clone, Copy)]
pub struct Retry {
    base: Duration,
    attempts: u32,
}

impl Retry {
    /// Create a policy with the given base delay and attempt budget.
    ///
    /// An attempt budget below 1 is treated as 1.
    pub fn new(base: Duration, attempts: u32) -> Self {
        Self {
            base,
            attempts: attempts.max(1),
        }
    }

    /// The delay slept after failed attempt `attempt`: `base * 2^(attempt-1)`.
    fn backoff(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(2u32.saturating_pow(attempt - 1))
    }

    /// Run `op` until it succeeds, halts, or the attempt budget is spent.
    ///
    /// `op` receives the 1-based attempt number. Success returns immediately
    /// with no further sleeping. A [`Attempt::Halt`] error, or a
    /// [`Attempt::Retry`] error on the final attempt, is returned verbatim.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, Attempt<E>>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(Attempt::Halt(err)) => return Err(err),
                Err(Attempt::Retry(err)) => {
                    if attempt == self.attempts {
                        return Err(err);
                    }
                    let delay = self.backoff(attempt);
                    debug!(attempt, ?delay, "transient failure, backing off");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                },
            }
        }
    }

    /// Like [`run`](Self::run), but aborts if `cancel` resolves during a
    /// backoff sleep, returning the last observed error.
    ///
    /// Cancellation is only observed between attempts; an attempt already in
    /// flight runs to completion.
    pub async fn run_until<T, E, F, Fut, C>(&self, cancel: C, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, Attempt<E>>>,
        C: Future<Output = ()>,
    {
        tokio::pin!(cancel);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(Attempt::Halt(err)) => return Err(err),
                Err(Attempt::Retry(err)) => {
                    if attempt == self.attempts {
                        return Err(err);
                    }
                    tokio::select! {
                        _ = tokio::time::sleep(self.backoff(attempt)) => {},
                        _ = &mut cancel => {
                            debug!(attempt, "retry cancelled during backoff");
                            return Err(err);
                        },
                    }
                    attempt += 1;
                },
            }
        }
    }
}
