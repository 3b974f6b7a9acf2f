use std::{future::Future, pin::Pin, time::Duration};

/// Source of the inter-attempt wait.
///
/// Injected so tests can observe or skip delays instead of sleeping for real;
/// production schedulers use [`TokioSleeper`].
pub trait Sleeper: Send + Sync {
    /// Resolve after `duration` has elapsed.
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Sleeper backed by the tokio timer.
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(tokio::time::sleep(duration))
    }
}
