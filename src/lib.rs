/*!
# Retryflow-rs

A lightweight retry execution engine for wrapping fallible async operations in Rust.

## Overview

Retryflow-rs provides a small, self-contained component for running an arbitrary
asynchronous operation under a bounded retry policy. The executor re-invokes the
operation on failure with linear or exponential backoff between attempts, exposes
its in-flight progress for display, and supports cooperative cancellation at every
suspension point.

## Key Components

* **RetryExecutor**: The central component that drives an operation through its attempt budget
* **RetryPolicy**: Configuration selecting the attempt cap, backoff strategy, and delay bounds
* **RetryableOperation**: A trait implemented by stateful operations; plain closures are adapted automatically
* **RetryState**: The observable progress of the current execution (attempt counter, last failure, retryable flag)
* **auto_retry**: An explicitly bounded wrapper that starts a fresh execution after transient final failures

## Usage Example

```rust,no_run
use retryflow_rs::{RetryExecutor, RetryPolicy};
use std::io;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Define a policy in JSON; omitted fields take their defaults
    let policy = RetryPolicy::from_json(
        r#"
    {
        "max_attempts": 3,
        "base_delay_ms": 100,
        "backoff": "exponential",
        "max_delay_ms": 5000
    }
    "#,
    )?;

    let executor = RetryExecutor::new(policy)?;

    // The closure runs once per attempt; captured values play the role of
    // operation arguments
    let endpoint = "https://example.com/quotes";
    let result = executor
        .execute(|| async move {
            // Your fallible operation here
            let _ = endpoint;
            Ok::<_, io::Error>("quote of the day")
        })
        .await;

    match result {
        Ok(quote) => println!("Fetched: {quote}"),
        Err(e) => println!("Gave up: {e}"),
    }

    Ok(())
}
```

## Error Handling

Only two failures cross the executor boundary: `Exhausted`, wrapping the final
attempt's error unchanged, and `Aborted` for cancellation. Per-attempt failures
stay inside the loop and are observable through the state snapshot and hooks:

```rust,no_run
use retryflow_rs::{RetryExecutor, RetryPolicy};
use std::io;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let executor = RetryExecutor::builder()
        .with_policy(RetryPolicy::default())
        .with_label("quote-feed")
        .on_retry(|attempt, error| eprintln!("attempt {attempt} failed: {error}"))
        .on_exhausted(|error| eprintln!("giving up: {error}"))
        .build()?;

    let result = executor
        .execute(|| async {
            Err::<String, _>(io::Error::new(io::ErrorKind::TimedOut, "upstream timeout"))
        })
        .await;

    if result.is_err() {
        let state = executor.state();
        // `retryable` tells the caller whether to offer a manual retry;
        // `last_failure` carries the most recent error for display
        println!("retryable: {}", state.retryable);
        if let Some(failure) = state.last_failure {
            println!("last failure: {failure}");
        }
    }

    Ok(())
}
```

## Stateful Operations

Operations that carry their own resources implement `RetryableOperation` directly:

```rust,no_run
use async_trait::async_trait;
use retryflow_rs::{RetryExecutor, RetryPolicy, RetryableOperation};
use std::io;

struct HealthProbe {
    probes_sent: u32,
}

#[async_trait]
impl RetryableOperation for HealthProbe {
    type Output = u32;
    type Error = io::Error;

    async fn attempt(&mut self) -> Result<u32, io::Error> {
        self.probes_sent += 1;
        if self.probes_sent < 3 {
            Err(io::Error::new(io::ErrorKind::ConnectionRefused, "not ready"))
        } else {
            Ok(self.probes_sent)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let executor = RetryExecutor::new(RetryPolicy::default())?;

    let mut probe = HealthProbe { probes_sent: 0 };
    let probes = executor.run(&mut probe).await?;
    println!("healthy after {probes} probes");

    Ok(())
}
```

## Cancellation

`cancel()` aborts the in-flight attempt or pending wait; `reset()` additionally
returns the state to its initial values. Starting a new `execute()` on a busy
executor cancels the previous execution first, so each executor runs at most one
execution at a time.
*/

pub mod engine;

// Re-export all public APIs for easier access
pub use engine::auto::{auto_retry, auto_retry_transient};
pub use engine::classify::{TransientError, transient_http_status};
pub use engine::error::{FailureInfo, PolicyError, RetryError, RetryResult};
pub use engine::executor::{ExhaustedHook, RetryExecutor, RetryExecutorBuilder, RetryHook};
pub use engine::operation::RetryableOperation;
pub use engine::policy::{BackoffStrategy, RetryPolicy};
pub use engine::state::RetryState;
