//! # Auto-Retry Module
//!
//! A thin layer above [`RetryExecutor`] that re-issues whole executions
//! when the final failure is classified as transient. Each round is a
//! complete `execute` call with its own attempt budget; the number of
//! rounds is always bounded by an explicit cap supplied by the caller, so
//! a persistently failing operation can never loop forever.

use crate::engine::classify::TransientError;
use crate::engine::error::RetryError;
use crate::engine::executor::RetryExecutor;
use log::warn;
use std::future::Future;

/// Execute an operation, starting a fresh execution after transient final
/// failures
///
/// Runs up to `rounds` executions on the given executor. After an
/// execution exhausts its attempt budget, `is_transient` classifies the
/// final error: transient failures start the next round, permanent ones
/// are returned as-is. An aborted execution is returned immediately and
/// never starts a new round. A `rounds` value of 0 behaves like 1.
pub async fn auto_retry<F, Fut, T, E, P>(
    executor: &RetryExecutor,
    rounds: u32,
    is_transient: P,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<T, E>> + Send,
    T: Send,
    E: std::error::Error + Send + 'static,
    P: Fn(&E) -> bool,
{
    let mut round: u32 = 0;

    loop {
        round += 1;

        match executor.execute(&mut operation).await {
            Ok(value) => return Ok(value),
            Err(RetryError::Exhausted { attempts, source }) => {
                if round >= rounds || !is_transient(&source) {
                    return Err(RetryError::Exhausted { attempts, source });
                }
                warn!(
                    "transient failure after {} attempts; starting round {}/{}: {}",
                    attempts,
                    round + 1,
                    rounds,
                    source
                );
            }
            Err(aborted) => return Err(aborted),
        }
    }
}

/// [`auto_retry`] using the error type's own [`TransientError`]
/// classification
pub async fn auto_retry_transient<F, Fut, T, E>(
    executor: &RetryExecutor,
    rounds: u32,
    operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<T, E>> + Send,
    T: Send,
    E: std::error::Error + TransientError + Send + 'static,
{
    auto_retry(executor, rounds, E::is_transient, operation).await
}
