//! Cooperative yield point.
//!
//! Long-running participant iteration is time-sliced, not parallelized:
//! the engine processes a bounded number of participants, then suspends
//! by calling [`Scheduler::yield_now`]. The scheduling primitive is
//! injected so the engine runs unchanged under a tokio runtime, a manual
//! tick loop, or no slicing at all.

use async_trait::async_trait;

/// Abstract suspension point the engine yields through.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Hands control back to the host's scheduling loop for one quantum.
    async fn yield_now(&self);
}

/// Yields to the tokio runtime, letting other tasks run between quanta.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn yield_now(&self) {
        tokio::task::yield_now().await;
    }
}

/// No-op scheduler for hosts that do not time-slice; every operation runs
/// to completion in a single quantum.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineScheduler;

#[async_trait]
impl Scheduler for InlineScheduler {
    async fn yield_now(&self) {}
}
