use std::time::Duration;

use async_trait::async_trait;

/// Something that can wait for a duration
#[async_trait]
pub trait Sleeper: Send + Sync + std::fmt::Debug {
    /// Wait for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
