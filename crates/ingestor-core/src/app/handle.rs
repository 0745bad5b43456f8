use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};

use crate::observability::BatchSummary;

use super::consumer_loop::ConsumerLoop;

/// Consumer task handle.
/// - `shutdown_tx` を drop しても consumer は止まる
/// - `shutdown_and_join()` で処理中のバッチの終了を待ち、合計を受け取る
/// - `wait()` で shutdown を要求せずに終了を待てる（panic の検知用）
pub struct ConsumerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<BatchSummary>,
}

impl ConsumerHandle {
    /// Spawn the loop onto the current tokio runtime.
    pub fn spawn(consumer: ConsumerLoop) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(async move { consumer.run(shutdown_rx).await });
        Self { shutdown_tx, join }
    }

    /// Stop taking new batches. The batch in flight is finished, not cancelled.
    pub fn request_shutdown(&self) {
        // ignore send error: the loop may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for the loop to end on its own, which only happens on a panic
    /// or once shutdown was requested. The handle is spent once this returns.
    pub async fn wait(&mut self) -> Result<BatchSummary, JoinError> {
        (&mut self.join).await
    }

    /// Shutdown and wait. A panicked loop surfaces as the `JoinError`.
    pub async fn shutdown_and_join(self) -> Result<BatchSummary, JoinError> {
        self.request_shutdown();
        self.join.await
    }
}

impl ConsumerLoop {
    pub fn spawn(self) -> ConsumerHandle {
        ConsumerHandle::spawn(self)
    }
}
