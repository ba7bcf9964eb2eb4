// Luggage Monitor - Refresh task
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Periodic re-render timer.
//!
//! "Last updated" text goes stale on its own, so the monitor re-renders on a
//! fixed cadence even when no source changes. The timer lives exactly as long
//! as its [`RefreshTask`].

use crate::loader::MonitorEvent;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// Handle to a running refresh timer. Dropping it stops the timer.
#[derive(Debug)]
pub struct RefreshTask {
    handle: Option<JoinHandle<()>>,
}

impl RefreshTask {
    /// Send a [`MonitorEvent::Tick`] every `period`, first one after `period`.
    pub fn spawn(period: Duration, tx: mpsc::Sender<MonitorEvent>) -> Self {
        let period = period.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(MonitorEvent::Tick).await.is_err() {
                    debug!("Refresh receiver closed");
                    break;
                }
            }
        });
        Self {
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the timer. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Refresh task stopped");
        }
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_after_period() {
        let (tx, mut rx) = mpsc::channel(4);
        let _task = RefreshTask::spawn(Duration::from_secs(60), tx);

        let early = time::timeout(Duration::from_secs(59), rx.recv()).await;
        assert!(early.is_err());

        assert!(matches!(rx.recv().await, Some(MonitorEvent::Tick)));
        assert!(matches!(rx.recv().await, Some(MonitorEvent::Tick)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_ticks() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut task = RefreshTask::spawn(Duration::from_secs(60), tx);
        assert!(task.is_running());

        task.stop();
        task.stop();
        assert!(!task.is_running());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_ends_ticks() {
        let (tx, mut rx) = mpsc::channel(4);
        let task = RefreshTask::spawn(Duration::from_secs(60), tx);
        drop(task);
        assert!(rx.recv().await.is_none());
    }
}
