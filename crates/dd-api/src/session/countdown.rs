//! One-second countdown for timed challenges.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU32, Ordering},
    },
    time::Duration,
};

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

const TICK: Duration = Duration::from_secs(1);

/// Running countdown.
///
/// Cancelled by [`cancel`](Self::cancel) or when dropped. If it reaches zero
/// first, the expiry callback runs exactly once.
#[derive(Debug)]
pub struct Countdown {
    token: CancellationToken,
    remaining: Arc<AtomicU32>,
    expired: Arc<AtomicBool>,
}

impl Countdown {
    /// Start ticking. Must be called within a Tokio runtime.
    pub fn start<F, Fut>(seconds: u32, on_expire: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let remaining = Arc::new(AtomicU32::new(seconds));
        let expired = Arc::new(AtomicBool::new(false));

        tokio::spawn(run(
            token.clone(),
            Arc::clone(&remaining),
            Arc::clone(&expired),
            on_expire,
        ));

        Self {
            token,
            remaining,
            expired,
        }
    }

    /// Whole seconds left
    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::Acquire)
    }

    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::Acquire)
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Stop ticking; the expiry callback will not run unless it already started.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run<F, Fut>(
    token: CancellationToken,
    remaining: Arc<AtomicU32>,
    expired: Arc<AtomicBool>,
    on_expire: F,
) where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + TICK, TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while remaining.load(Ordering::Acquire) > 0 {
        tokio::select! {
            biased;
            () = token.cancelled() => return,
            _ = ticker.tick() => {
                remaining.fetch_sub(1, Ordering::AcqRel);
            }
        }
    }

    if token.is_cancelled() {
        return;
    }
    expired.store(true, Ordering::Release);
    tracing::debug!("Countdown expired");
    on_expire().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() -> std::future::Ready<()> + Send + 'static) {
        let fired = Arc::new(AtomicUsize::new(0));
        let hook = Arc::clone(&fired);
        (fired, move || {
            hook.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_down_and_expires_once() {
        let (fired, on_expire) = counter();
        let countdown = Countdown::start(3, on_expire);
        assert_eq!(countdown.remaining(), 3);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(countdown.remaining(), 2);
        assert!(!countdown.is_expired());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(countdown.remaining(), 0);
        assert!(countdown.is_expired());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_expiry() {
        let (fired, on_expire) = counter();
        let countdown = Countdown::start(2, on_expire);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        countdown.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(countdown.is_cancelled());
        assert!(!countdown.is_expired());
        assert_eq!(countdown.remaining(), 1);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let (fired, on_expire) = counter();
        let countdown = Countdown::start(1, on_expire);
        drop(countdown);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_expires_immediately() {
        let (fired, on_expire) = counter();
        let countdown = Countdown::start(0, on_expire);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(countdown.is_expired());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
