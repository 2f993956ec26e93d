//! # Retry Execution Module
//!
//! This module contains the retry loop itself. It drives a
//! [`RetryableOperation`] through the bounded attempt sequence defined by a
//! [`RetryPolicy`], maintains the observable [`RetryState`], and resolves
//! cancellation races via a per-execution token.

use crate::engine::error::{FailureInfo, PolicyError, RetryError};
use crate::engine::operation::{FnOperation, RetryableOperation};
use crate::engine::policy::RetryPolicy;
use crate::engine::state::RetryState;
use log::{debug, error, warn};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// Side-effect hook invoked before each retry wait
pub type RetryHook = Box<dyn Fn(u32, &(dyn std::error::Error + 'static)) + Send + Sync>;

/// Side-effect hook invoked once when the attempt budget is exhausted
pub type ExhaustedHook = Box<dyn Fn(&(dyn std::error::Error + 'static)) + Send + Sync>;

/// Executes fallible async operations under a bounded retry policy
///
/// The `RetryExecutor` is responsible for:
/// - Invoking the wrapped operation up to `max_attempts` times
/// - Waiting between attempts according to the policy's backoff strategy
/// - Maintaining the observable [`RetryState`] for progress reporting
/// - Resolving cancellation, both explicit (`cancel`, `reset`) and
///   implicit (a newer execution starting on the same executor)
///
/// At most one execution is in flight per executor; starting a new one
/// cancels the previous one first. The executor is `Send + Sync`, so one
/// handle can drive the execution while another observes or cancels it.
pub struct RetryExecutor {
    policy: RetryPolicy,
    label: String,
    state: Mutex<RetryState>,
    /// Token for the execution currently in flight; replaced on restart
    token: Mutex<CancellationToken>,
    /// Set by `cancel()`; consumed by the next run to abort before its
    /// first attempt, or cleared by whichever run aborts on the token
    abort_requested: AtomicBool,
    active_run: AtomicU64,
    run_counter: AtomicU64,
    on_retry: Option<RetryHook>,
    on_exhausted: Option<ExhaustedHook>,
}

impl RetryExecutor {
    /// Create an executor from a policy with no hooks and a default label
    pub fn new(policy: RetryPolicy) -> Result<Self, PolicyError> {
        RetryExecutorBuilder::new().with_policy(policy).build()
    }

    /// Create a builder for configuring an executor
    pub fn builder() -> RetryExecutorBuilder {
        RetryExecutorBuilder::new()
    }

    /// Get the policy bound to this executor
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Get a snapshot of the current execution state
    pub fn state(&self) -> RetryState {
        self.lock_state().clone()
    }

    /// Check whether an attempt or an inter-attempt wait is in progress
    pub fn is_running(&self) -> bool {
        self.lock_state().is_running
    }

    /// Get the number of attempts started in the current execution
    pub fn current_attempt(&self) -> u32 {
        self.lock_state().current_attempt
    }

    /// Get the most recent failure, if any
    pub fn last_failure(&self) -> Option<FailureInfo> {
        self.lock_state().last_failure.clone()
    }

    /// Check whether the attempt budget is still open
    ///
    /// Returns false once an execution exhausted its attempts; the next
    /// `execute` call starts with a fresh budget and flips this back.
    pub fn is_retryable(&self) -> bool {
        self.lock_state().retryable
    }

    /// Execute a closure-shaped operation with retry logic
    ///
    /// The closure is invoked once per attempt; arguments the operation
    /// needs are carried by capture. Terminates with exactly one outcome:
    /// the first successful value, [`RetryError::Exhausted`] wrapping the
    /// final attempt's error, or [`RetryError::Aborted`] on cancellation.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: std::error::Error + Send + 'static,
    {
        let mut operation = FnOperation(operation);
        self.run(&mut operation).await
    }

    /// Execute a [`RetryableOperation`] with retry logic
    ///
    /// This is the trait-based entry point; `execute` adapts closures onto
    /// it. The operation is borrowed mutably for the whole execution, so
    /// its state survives across attempts and remains inspectable after.
    pub async fn run<O>(&self, operation: &mut O) -> Result<O::Output, RetryError<O::Error>>
    where
        O: RetryableOperation,
    {
        let Some((token, run)) = self.begin_run() else {
            debug!("[{}] aborted before the first attempt", self.label);
            return Err(RetryError::Aborted { attempts: 0 });
        };

        let max_attempts = self.policy.max_attempts;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            if token.is_cancelled() {
                return Err(self.finish_aborted(run, attempt - 1));
            }

            self.update_state(run, |state| {
                state.is_running = true;
                state.current_attempt = attempt;
            });
            debug!("[{}] attempt {}/{}", self.label, attempt, max_attempts);

            let outcome = tokio::select! {
                result = operation.attempt() => Some(result),
                _ = token.cancelled() => None,
            };

            let err = match outcome {
                None => return Err(self.finish_aborted(run, attempt)),
                Some(Ok(value)) => {
                    self.update_state(run, |state| {
                        state.is_running = false;
                        state.last_failure = None;
                    });
                    debug!(
                        "[{}] succeeded on attempt {}/{}",
                        self.label, attempt, max_attempts
                    );
                    return Ok(value);
                }
                Some(Err(err)) => err,
            };

            self.update_state(run, |state| {
                state.last_failure = Some(FailureInfo::new(attempt, &err));
            });

            if attempt >= max_attempts {
                self.update_state(run, |state| {
                    state.is_running = false;
                    state.retryable = false;
                });
                if let Some(hook) = &self.on_exhausted {
                    hook(&err);
                }
                error!("[{}] giving up after {} attempts: {}", self.label, attempt, err);
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    source: err,
                });
            }

            if let Some(hook) = &self.on_retry {
                hook(attempt, &err);
            }
            let delay = self.policy.calculate_delay(attempt);
            warn!(
                "[{}] attempt {}/{} failed: {}; retrying in {:?}",
                self.label, attempt, max_attempts, err, delay
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = token.cancelled() => return Err(self.finish_aborted(run, attempt)),
            }
        }
    }

    /// Signal cancellation of any in-flight attempt or pending wait
    ///
    /// `is_running` becomes false; `last_failure` and `current_attempt`
    /// are left in place so callers can still display what happened. If no
    /// execution is in flight, the signal is held and aborts the next one
    /// before its first attempt.
    pub fn cancel(&self) {
        self.abort_requested.store(true, Ordering::SeqCst);
        self.lock_token().cancel();
        self.lock_state().is_running = false;
        debug!("[{}] cancellation requested", self.label);
    }

    /// Cancel any in-flight execution and return the state to its initial
    /// values
    ///
    /// Safe to call at any time; resetting an idle executor is a no-op
    /// with respect to state.
    pub fn reset(&self) {
        self.lock_token().cancel();
        self.abort_requested.store(false, Ordering::SeqCst);
        self.active_run.store(0, Ordering::SeqCst);
        self.lock_state().reset();
        debug!("[{}] state reset", self.label);
    }

    /// Prepare a new execution: install a fresh token, cancel the previous
    /// run, and consume any pending cancellation signal
    fn begin_run(&self) -> Option<(CancellationToken, u64)> {
        let fresh = CancellationToken::new();
        let previous = {
            let mut slot = self.lock_token();
            std::mem::replace(&mut *slot, fresh.clone())
        };
        // Single in-flight execution per executor: restarting cancels the
        // previous run before the new one takes over.
        previous.cancel();

        let run = self.run_counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.active_run.store(run, Ordering::SeqCst);

        if self.abort_requested.swap(false, Ordering::SeqCst) {
            self.lock_state().is_running = false;
            return None;
        }

        // Fresh state for the new execution; is_running flips when the
        // first attempt starts.
        self.lock_state().reset();
        Some((fresh, run))
    }

    fn finish_aborted<E>(&self, run: u64, attempts: u32) -> RetryError<E>
    where
        E: std::error::Error + 'static,
    {
        self.abort_requested.store(false, Ordering::SeqCst);
        self.update_state(run, |state| state.is_running = false);
        debug!("[{}] aborted after {} attempts", self.label, attempts);
        RetryError::Aborted { attempts }
    }

    /// Apply a state mutation only if `run` is still the active execution
    ///
    /// A run that was replaced by a newer `execute` call must not clobber
    /// the newer run's state on its way out.
    fn update_state<F>(&self, run: u64, apply: F)
    where
        F: FnOnce(&mut RetryState),
    {
        if self.active_run.load(Ordering::SeqCst) == run {
            let mut state = self.lock_state();
            apply(&mut *state);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RetryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_token(&self) -> MutexGuard<'_, CancellationToken> {
        self.token.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Builder for configuring a [`RetryExecutor`]
///
/// # Example
///
/// ```rust
/// use retryflow_rs::{RetryExecutor, RetryPolicy};
///
/// let executor = RetryExecutor::builder()
///     .with_policy(RetryPolicy::default())
///     .with_label("download")
///     .on_retry(|attempt, error| eprintln!("attempt {attempt} failed: {error}"))
///     .build()
///     .unwrap();
/// ```
pub struct RetryExecutorBuilder {
    policy: RetryPolicy,
    label: String,
    on_retry: Option<RetryHook>,
    on_exhausted: Option<ExhaustedHook>,
}

impl Default for RetryExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryExecutorBuilder {
    /// Create a new builder with the default policy and no hooks
    pub fn new() -> Self {
        Self {
            policy: RetryPolicy::default(),
            label: "retry".to_string(),
            on_retry: None,
            on_exhausted: None,
        }
    }

    /// Set the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the label used in this executor's log output
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the hook invoked before each retry wait
    ///
    /// The hook receives the 1-indexed attempt that just failed and its
    /// error. It must not alter control flow and must not panic.
    pub fn on_retry<F>(mut self, hook: F) -> Self
    where
        F: Fn(u32, &(dyn std::error::Error + 'static)) + Send + Sync + 'static,
    {
        self.on_retry = Some(Box::new(hook));
        self
    }

    /// Set the hook invoked once when the attempt budget is exhausted
    pub fn on_exhausted<F>(mut self, hook: F) -> Self
    where
        F: Fn(&(dyn std::error::Error + 'static)) + Send + Sync + 'static,
    {
        self.on_exhausted = Some(Box::new(hook));
        self
    }

    /// Build the executor, validating the policy
    pub fn build(self) -> Result<RetryExecutor, PolicyError> {
        self.policy.validate()?;
        Ok(RetryExecutor {
            policy: self.policy,
            label: self.label,
            state: Mutex::new(RetryState::default()),
            token: Mutex::new(CancellationToken::new()),
            abort_requested: AtomicBool::new(false),
            active_run: AtomicU64::new(0),
            run_counter: AtomicU64::new(0),
            on_retry: self.on_retry,
            on_exhausted: self.on_exhausted,
        })
    }
}
