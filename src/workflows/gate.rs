// Approval gate: a one-way latch with a bounded wait

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// How long a waiter keeps listening past its deadline so that every signal
/// stamped at the deadline instant is observed. One tick of tokio's timer.
pub const SETTLE_WINDOW: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
pub struct ApprovalGate {
    latch: Arc<watch::Sender<Option<Instant>>>,
}

impl Default for ApprovalGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ApprovalGate {
    pub fn new() -> Self {
        let (latch, _) = watch::channel(None);
        Self {
            latch: Arc::new(latch),
        }
    }

    /// Set the latch, stamping the current instant. Returns true only for the
    /// call that flipped it.
    pub fn signal_approved(&self) -> bool {
        self.latch.send_if_modified(|approved_at| {
            if approved_at.is_some() {
                false
            } else {
                *approved_at = Some(Instant::now());
                true
            }
        })
    }

    pub fn is_approved(&self) -> bool {
        self.latch.borrow().is_some()
    }

    /// Instant at which the latch was first set
    pub fn approved_at(&self) -> Option<Instant> {
        *self.latch.borrow()
    }

    /// Wait until the latch is set or `timeout` elapses.
    ///
    /// The race is settled by the instant the latch flipped: a signal stamped
    /// at or before the deadline counts as approval, however many scheduler
    /// turns the signalling task needed to deliver it.
    pub async fn await_approval(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut rx = self.latch.subscribe();
        let observed = tokio::time::timeout_at(deadline + SETTLE_WINDOW, rx.wait_for(Option::is_some))
            .await
            .ok()
            .and_then(|latched| latched.ok().and_then(|approved_at| *approved_at));

        observed
            .or_else(|| self.approved_at())
            .is_some_and(|approved_at| approved_at <= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, Instant};

    #[test]
    fn test_signal_is_idempotent() {
        let gate = ApprovalGate::new();
        assert!(!gate.is_approved());
        assert!(gate.signal_approved());
        assert!(!gate.signal_approved());
        assert!(!gate.signal_approved());
        assert!(gate.is_approved());
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_approved_resolves_immediately() {
        let gate = ApprovalGate::new();
        gate.signal_approved();
        let started = Instant::now();

        assert!(gate.await_approval(Duration::from_secs(30)).await);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_wakes_waiter_before_deadline() {
        let gate = ApprovalGate::new();
        let signaller = gate.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(10)).await;
            signaller.signal_approved();
        });
        let started = Instant::now();

        assert!(gate.await_approval(Duration::from_secs(30)).await);
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_without_signal_returns_false() {
        let gate = ApprovalGate::new();
        let started = Instant::now();

        assert!(!gate.await_approval(Duration::from_secs(30)).await);
        assert!(started.elapsed() >= Duration::from_secs(30));
        assert!(started.elapsed() <= Duration::from_secs(30) + SETTLE_WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_one_instant_before_deadline_wins() {
        let gate = ApprovalGate::new();
        let signaller = gate.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(29_999)).await;
            signaller.signal_approved();
        });

        assert!(gate.await_approval(Duration::from_secs(30)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simultaneous_signal_and_deadline_favours_approval() {
        let gate = ApprovalGate::new();
        let signaller = gate.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(30)).await;
            signaller.signal_approved();
        });

        assert!(gate.await_approval(Duration::from_secs(30)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_signal_wins_even_after_extra_scheduler_turns() {
        let gate = ApprovalGate::new();
        let signaller = gate.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(30)).await;
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
            signaller.signal_approved();
        });

        assert!(gate.await_approval(Duration::from_secs(30)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_stamped_after_deadline_loses() {
        let gate = ApprovalGate::new();
        let signaller = gate.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(31)).await;
            signaller.signal_approved();
        });
        let started = Instant::now();

        assert!(!gate.await_approval(Duration::from_secs(30)).await);
        assert!(started.elapsed() <= Duration::from_secs(30) + SETTLE_WINDOW);
    }

    #[test]
    fn test_signal_records_flip_instant_once() {
        let gate = ApprovalGate::new();
        assert_eq!(gate.approved_at(), None);

        gate.signal_approved();
        let first = gate.approved_at();
        gate.signal_approved();

        assert!(first.is_some());
        assert_eq!(gate.approved_at(), first);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_signal_does_not_change_resolved_wait() {
        let gate = ApprovalGate::new();

        let approved = gate.await_approval(Duration::from_secs(1)).await;
        gate.signal_approved();

        assert!(!approved);
        assert!(gate.is_approved());
    }
}
