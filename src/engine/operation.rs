use async_trait::async_trait;
use std::future::Future;

/// Interface for operations executed under a retry policy
///
/// Implement this trait when an operation carries its own state or
/// resources (a client handle, a request payload) that every attempt
/// should reuse. Each attempt receives mutable access, so an operation
/// can track its own progress across attempts.
///
/// Closures passed to [`RetryExecutor::execute`] are adapted onto this
/// trait internally; implementing it by hand is only needed for named,
/// stateful operations.
///
/// [`RetryExecutor::execute`]: crate::engine::executor::RetryExecutor::execute
#[async_trait]
pub trait RetryableOperation: Send {
    /// Value produced by a successful attempt
    type Output: Send;
    /// Error produced by a failed attempt
    type Error: std::error::Error + Send + 'static;

    /// Run one attempt of the operation
    async fn attempt(&mut self) -> Result<Self::Output, Self::Error>;
}

/// Adapter that lets a plain closure run as a [`RetryableOperation`]
pub(crate) struct FnOperation<F>(pub(crate) F);

#[async_trait]
impl<F, Fut, T, E> RetryableOperation for FnOperation<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<T, E>> + Send,
    T: Send,
    E: std::error::Error + Send + 'static,
{
    type Output = T;
    type Error = E;

    async fn attempt(&mut self) -> Result<T, E> {
        (self.0)().await
    }
}
