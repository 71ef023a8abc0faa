// Status register: the human-readable phase exposed to queries

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// Phase strings reported by the approval workflow
pub mod phase {
    pub const INITIALIZING: &str = "Initializing";
    pub const AWAITING_APPROVAL: &str = "Awaiting approval";
    pub const APPROVED: &str = "The workflow has been approved!";
    pub const TIMED_OUT: &str = "The workflow timed out while waiting to be approved";
    pub const COMPLETE: &str = "Complete!";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseSnapshot {
    pub phase: String,
    /// Zero for the initial phase, incremented on every assignment
    pub sequence: u64,
    pub changed_at: DateTime<Utc>,
}

/// Single-writer, many-reader phase register.
///
/// Reads never block the writer and always see the latest assignment.
#[derive(Debug, Clone)]
pub struct StatusRegister {
    current: Arc<watch::Sender<PhaseSnapshot>>,
}

impl Default for StatusRegister {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusRegister {
    pub fn new() -> Self {
        let (current, _) = watch::channel(PhaseSnapshot {
            phase: phase::INITIALIZING.to_string(),
            sequence: 0,
            changed_at: Utc::now(),
        });
        Self {
            current: Arc::new(current),
        }
    }

    /// Plain assignment; transition legality is the state machine's concern
    pub fn set_phase(&self, phase: impl Into<String>) {
        let phase = phase.into();
        self.current.send_modify(|snapshot| {
            snapshot.phase = phase;
            snapshot.sequence += 1;
            snapshot.changed_at = Utc::now();
        });
    }

    pub fn phase(&self) -> String {
        self.current.borrow().phase.clone()
    }

    pub fn snapshot(&self) -> PhaseSnapshot {
        self.current.borrow().clone()
    }

    /// Receiver notified on every phase change
    pub fn subscribe(&self) -> watch::Receiver<PhaseSnapshot> {
        self.current.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_phase_is_defined() {
        let status = StatusRegister::new();
        assert_eq!(status.phase(), "Initializing");
        assert_eq!(status.snapshot().sequence, 0);
    }

    #[test]
    fn test_set_phase_accepts_any_order() {
        let status = StatusRegister::new();
        status.set_phase(phase::COMPLETE);
        status.set_phase(phase::AWAITING_APPROVAL);

        let snapshot = status.snapshot();
        assert_eq!(snapshot.phase, "Awaiting approval");
        assert_eq!(snapshot.sequence, 2);
    }

    #[test]
    fn test_clones_share_the_register() {
        let status = StatusRegister::new();
        let reader = status.clone();
        status.set_phase("custom");
        assert_eq!(reader.phase(), "custom");
    }

    #[tokio::test]
    async fn test_subscribers_see_changes_in_order() {
        let status = StatusRegister::new();
        let mut rx = status.subscribe();
        let writer = status.clone();

        let handle = tokio::spawn(async move {
            writer.set_phase(phase::AWAITING_APPROVAL);
            writer.set_phase(phase::APPROVED);
            writer.set_phase(phase::COMPLETE);
        });

        let last = rx
            .wait_for(|snapshot| snapshot.phase == phase::COMPLETE)
            .await
            .map(|snapshot| snapshot.sequence)
            .unwrap();
        handle.await.unwrap();

        assert_eq!(last, 3);
    }
}
