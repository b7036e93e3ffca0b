//! Countdown timer handle
//!
//! The controller owns at most one live countdown. Arming always disarms the
//! previous handle first, so repeated refreshes while a key is valid can never
//! leak a second ticker that would double-delete or double-render on expiry.

use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::debug;

/// Controller-owned optional timer handle
#[derive(Default)]
pub struct Countdown {
    handle: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking once per `period`, replacing any previous ticker
    ///
    /// Ticks are delivered through `tx`; the task stops when the receiver is
    /// dropped. The interval's immediate first tick is skipped so the first
    /// delivery arrives one full period after arming.
    pub fn arm(&mut self, period: Duration, tx: UnboundedSender<()>) {
        self.disarm();
        debug!("Arming countdown, period {:?}", period);

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if tx.send(()).is_err() {
                    break;
                }
            }
        }));
    }

    /// Cancel the live ticker, if any
    pub fn disarm(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("Disarming countdown");
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_arrive_one_period_apart() {
        let (tx, mut rx) = unbounded_channel();
        let mut countdown = Countdown::new();
        countdown.arm(Duration::from_secs(60), tx);
        // Let the ticker task start before moving time
        tokio::task::yield_now().await;

        tokio::time::advance(Duration::from_secs(59)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_previous_ticker() {
        let (tx1, mut rx1) = unbounded_channel();
        let (tx2, mut rx2) = unbounded_channel();
        let mut countdown = Countdown::new();

        countdown.arm(Duration::from_secs(60), tx1);
        countdown.arm(Duration::from_secs(60), tx2);
        assert!(countdown.is_armed());
        tokio::task::yield_now().await;

        tokio::time::advance(Duration::from_secs(120)).await;
        tokio::task::yield_now().await;

        // Only the replacement ticker is live
        assert!(rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_stops_ticks() {
        let (tx, mut rx) = unbounded_channel();
        let mut countdown = Countdown::new();
        countdown.arm(Duration::from_secs(60), tx);
        countdown.disarm();
        assert!(!countdown.is_armed());

        tokio::time::advance(Duration::from_secs(120)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }
}
