//! SweepLoop - 期限切れ Blob の定期掃除
//!
//! lazy sweep はアクセスがあったときしか走らない。
//! アクセスのない間もメモリが解放されるよう、一定間隔で `sweep_expired` を呼ぶ。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::ports::BlobStore;

/// SweepLoop は期限切れの Blob を定期的に削除
///
/// # フロー
/// 1. `interval` ごとに起きる（最初の 1 回は起動直後ではなく 1 周期後）
/// 2. `sweep_expired` を呼ぶ（lazy sweep と同じ判定）
/// 3. shutdown が通知されたら抜ける
pub struct SweepLoop {
    store: Arc<dyn BlobStore>,
    interval: Duration,
}

/// 起動中の SweepLoop
pub struct SweepHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SweepHandle {
    /// 停止を通知して終了を待つ
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.join.await {
            tracing::warn!(error = %e, "sweep loop task failed");
        }
    }
}

impl SweepLoop {
    pub fn new(store: Arc<dyn BlobStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// 1 回分の掃除
    pub fn sweep_once(&self) -> usize {
        let evicted = self.store.sweep_expired();
        if evicted > 0 {
            info!(evicted, remaining = self.store.len(), "swept expired blobs");
        } else {
            debug!(remaining = self.store.len(), "sweep found nothing to evict");
        }
        evicted
    }

    /// tokio runtime 上で起動
    pub fn spawn(self) -> SweepHandle {
        let (tx, rx) = watch::channel(false);
        let join = tokio::spawn(self.run(rx));
        SweepHandle { shutdown: tx, join }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval の最初の tick は即座に完了する
        ticker.tick().await;
        info!(interval_secs = self.interval.as_secs(), "sweep loop started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("sweep loop stopped");
    }
}
