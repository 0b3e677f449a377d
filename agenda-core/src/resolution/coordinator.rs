//! The resolution state machine.
//!
//! ```text
//! Idle -> Presenting -> AwaitingChoice -> (Applying | Cancelled) -> Idle
//! ```
//!
//! At most one resolution is in flight. The in-flight resolution owns a
//! single-slot continuation (a oneshot sender) that `resolve` fulfils exactly
//! once, and only when called with that resolution's [`ResolutionId`].
//! Requests arriving while the slot is taken are answered with
//! [`Resolution::Cancel`] straight away instead of being queued.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::error::AgendaError;
use crate::presentation::{ConflictPresentation, ConflictSurface};
use crate::resolution::{Resolution, ResolutionId, ResolutionState};
use crate::snapshot::AgendaSnapshot;

struct Pending {
    id: ResolutionId,
    phase: Phase,
}

enum Phase {
    Presenting,
    AwaitingChoice(oneshot::Sender<Resolution>),
}

pub struct ResolutionCoordinator<S> {
    surface: S,
    choice_timeout: Option<Duration>,
    slot: Mutex<Option<Pending>>,
    next_id: AtomicU64,
}

impl<S: ConflictSurface> ResolutionCoordinator<S> {
    pub fn new(surface: S) -> Self {
        ResolutionCoordinator {
            surface,
            choice_timeout: None,
            slot: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Cancel a resolution nobody answered within `timeout`.
    /// `None` (the default) waits indefinitely.
    pub fn with_choice_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.choice_timeout = timeout;
        self
    }

    pub fn state(&self) -> ResolutionState {
        match self.lock_slot().as_ref().map(|p| &p.phase) {
            None => ResolutionState::Idle,
            Some(Phase::Presenting) => ResolutionState::Presenting,
            Some(Phase::AwaitingChoice(_)) => ResolutionState::AwaitingChoice,
        }
    }

    /// Present the conflict between `local` and `remote` and wait for the
    /// operator's choice.
    ///
    /// Never fails: a busy coordinator, a presentation failure or an expired
    /// choice timeout all resolve to [`Resolution::Cancel`]. The caller
    /// applies the outcome; the coordinator itself performs no I/O.
    pub async fn request_resolution(
        &self,
        local: &AgendaSnapshot,
        remote: &AgendaSnapshot,
    ) -> Resolution {
        let Some(claim) = self.claim() else {
            warn!("Conflict resolution already in progress, skipping this one");
            return Resolution::Cancel;
        };
        debug!(resolution = %claim.id, "Presenting conflict");

        let presentation = match catch_unwind(AssertUnwindSafe(|| {
            ConflictPresentation::new(local, remote)
        })) {
            Ok(presentation) => presentation,
            Err(_) => {
                error!(resolution = %claim.id, "Computing the conflict diff panicked");
                return Resolution::Cancel;
            }
        };

        let (tx, rx) = oneshot::channel();
        self.set_awaiting(claim.id, tx);

        let opened = catch_unwind(AssertUnwindSafe(|| {
            self.surface.open(claim.id, &presentation)
        }))
            .unwrap_or_else(|_| Err(AgendaError::Presentation("surface panicked".into())));
        if let Err(e) = opened {
            error!(resolution = %claim.id, "Could not present conflict: {e}");
            return Resolution::Cancel;
        }
        debug!(
            resolution = %claim.id,
            total_changes = presentation.diff.total_changes(),
            "Awaiting choice"
        );

        let choice = match self.choice_timeout {
            None => rx.await.unwrap_or(Resolution::Cancel),
            Some(limit) => match tokio::time::timeout(limit, rx).await {
                Ok(choice) => choice.unwrap_or(Resolution::Cancel),
                Err(_) => {
                    info!(
                        resolution = %claim.id,
                        "No choice after {}s, cancelling",
                        limit.as_secs()
                    );
                    Resolution::Cancel
                }
            },
        };

        self.surface.close(claim.id);
        choice
    }

    /// Deliver the operator's choice to resolution `id`.
    ///
    /// Returns `false` when `id` is not the resolution awaiting a choice,
    /// e.g. an answer to a dialog that already timed out. The slot is
    /// released before this returns, so a new request can be admitted
    /// immediately.
    pub fn resolve(&self, id: ResolutionId, choice: Resolution) -> bool {
        let tx = {
            let mut slot = self.lock_slot();
            match slot.take() {
                Some(Pending {
                    id: pending,
                    phase: Phase::AwaitingChoice(tx),
                }) if pending == id => tx,
                other => {
                    *slot = other;
                    warn!(resolution = %id, "Not awaiting a choice, ignoring '{choice}'");
                    return false;
                }
            }
        };

        match choice {
            Resolution::Local | Resolution::Remote => {
                info!(resolution = %id, "Applying {choice} snapshot")
            }
            Resolution::Cancel => info!(resolution = %id, "Conflict resolution cancelled"),
        }

        tx.send(choice).is_ok()
    }

    fn claim(&self) -> Option<Claim<'_>> {
        let mut slot = self.lock_slot();
        if slot.is_some() {
            return None;
        }

        let id = ResolutionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        *slot = Some(Pending {
            id,
            phase: Phase::Presenting,
        });

        Some(Claim {
            slot: &self.slot,
            id,
        })
    }

    fn set_awaiting(&self, id: ResolutionId, tx: oneshot::Sender<Resolution>) {
        if let Some(pending) = self.lock_slot().as_mut().filter(|p| p.id == id) {
            pending.phase = Phase::AwaitingChoice(tx);
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<Pending>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Releases the slot when a request ends, however it ends (returned,
/// panicked, or its future dropped), unless `resolve` already released it.
struct Claim<'a> {
    slot: &'a Mutex<Option<Pending>>,
    id: ResolutionId,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|p| p.id == self.id) {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgendaResult;
    use crate::presentation::{ChannelSurface, ConflictDialog};
    use crate::snapshot::Item;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn snapshots() -> (AgendaSnapshot, AgendaSnapshot) {
        let local = AgendaSnapshot {
            tasks: vec![Item::new("1").with("titulo", "Buy milk")],
            ..Default::default()
        };
        let remote = AgendaSnapshot {
            tasks: vec![Item::new("1").with("titulo", "Buy oat milk")],
            ..Default::default()
        };
        (local, remote)
    }

    fn coordinator() -> (
        Arc<ResolutionCoordinator<ChannelSurface>>,
        mpsc::UnboundedReceiver<ConflictDialog>,
    ) {
        let (surface, rx) = ChannelSurface::new();
        (Arc::new(ResolutionCoordinator::new(surface)), rx)
    }

    fn spawn_request(
        coordinator: &Arc<ResolutionCoordinator<ChannelSurface>>,
    ) -> tokio::task::JoinHandle<Resolution> {
        let coordinator = Arc::clone(coordinator);
        tokio::spawn(async move {
            let (local, remote) = snapshots();
            coordinator.request_resolution(&local, &remote).await
        })
    }

    struct FailingSurface;

    impl ConflictSurface for FailingSurface {
        fn open(&self, _id: ResolutionId, _presentation: &ConflictPresentation) -> AgendaResult<()> {
            Err(AgendaError::Presentation("no render target".into()))
        }
    }

    struct PanickingSurface;

    impl ConflictSurface for PanickingSurface {
        fn open(&self, _id: ResolutionId, _presentation: &ConflictPresentation) -> AgendaResult<()> {
            panic!("render target vanished")
        }
    }

    /// Records which resolutions were opened and closed.
    #[derive(Default)]
    struct RecordingSurface {
        events: Mutex<Vec<(&'static str, ResolutionId)>>,
    }

    impl ConflictSurface for RecordingSurface {
        fn open(&self, id: ResolutionId, _presentation: &ConflictPresentation) -> AgendaResult<()> {
            self.events.lock().unwrap().push(("open", id));
            Ok(())
        }

        fn close(&self, id: ResolutionId) {
            self.events.lock().unwrap().push(("close", id));
        }
    }

    #[tokio::test]
    async fn test_choice_is_delivered_to_request() {
        let (coordinator, mut dialogs) = coordinator();
        let request = spawn_request(&coordinator);

        let dialog = dialogs.recv().await.unwrap();
        assert!(dialog.presentation.diff.has_conflicts());
        assert_eq!(coordinator.state(), ResolutionState::AwaitingChoice);

        assert!(coordinator.resolve(dialog.id, Resolution::Local));
        assert_eq!(request.await.unwrap(), Resolution::Local);
        assert_eq!(coordinator.state(), ResolutionState::Idle);
    }

    #[tokio::test]
    async fn test_second_request_is_rejected_while_awaiting() {
        let (coordinator, mut dialogs) = coordinator();
        let first = spawn_request(&coordinator);
        let dialog = dialogs.recv().await.unwrap();

        let (local, remote) = snapshots();
        let second = coordinator.request_resolution(&local, &remote).await;

        assert_eq!(second, Resolution::Cancel);
        assert!(dialogs.try_recv().is_err(), "second dialog was opened");
        assert_eq!(coordinator.state(), ResolutionState::AwaitingChoice);

        coordinator.resolve(dialog.id, Resolution::Remote);
        assert_eq!(first.await.unwrap(), Resolution::Remote);
    }

    #[tokio::test]
    async fn test_cancel_returns_to_idle_for_next_request() {
        let (coordinator, mut dialogs) = coordinator();
        let first = spawn_request(&coordinator);
        let first_dialog = dialogs.recv().await.unwrap();

        assert!(coordinator.resolve(first_dialog.id, Resolution::Cancel));
        assert_eq!(coordinator.state(), ResolutionState::Idle);

        let second = spawn_request(&coordinator);
        let second_dialog = dialogs.recv().await.unwrap();
        assert_ne!(first_dialog.id, second_dialog.id);
        assert!(coordinator.resolve(second_dialog.id, Resolution::Remote));

        assert_eq!(first.await.unwrap(), Resolution::Cancel);
        assert_eq!(second.await.unwrap(), Resolution::Remote);
    }

    #[tokio::test]
    async fn test_resolve_without_pending_request() {
        let (coordinator, _dialogs) = coordinator();
        assert!(!coordinator.resolve(ResolutionId(1), Resolution::Local));
        assert_eq!(coordinator.state(), ResolutionState::Idle);
    }

    #[tokio::test]
    async fn test_answer_with_wrong_id_is_refused() {
        let (coordinator, mut dialogs) = coordinator();
        let request = spawn_request(&coordinator);
        let dialog = dialogs.recv().await.unwrap();

        assert!(!coordinator.resolve(ResolutionId(dialog.id.0 + 1), Resolution::Local));
        assert_eq!(coordinator.state(), ResolutionState::AwaitingChoice);

        assert!(coordinator.resolve(dialog.id, Resolution::Remote));
        assert_eq!(request.await.unwrap(), Resolution::Remote);
    }

    #[tokio::test]
    async fn test_presentation_failure_cancels_and_releases() {
        let coordinator = ResolutionCoordinator::new(FailingSurface);
        let (local, remote) = snapshots();

        assert_eq!(
            coordinator.request_resolution(&local, &remote).await,
            Resolution::Cancel
        );
        assert_eq!(coordinator.state(), ResolutionState::Idle);
        assert!(!coordinator.resolve(ResolutionId(1), Resolution::Local));
    }

    #[tokio::test]
    async fn test_panicking_surface_cancels_and_releases() {
        let coordinator = ResolutionCoordinator::new(PanickingSurface);
        let (local, remote) = snapshots();

        assert_eq!(
            coordinator.request_resolution(&local, &remote).await,
            Resolution::Cancel
        );
        assert_eq!(coordinator.state(), ResolutionState::Idle);
    }

    #[tokio::test]
    async fn test_closed_dialog_cancels() {
        let (coordinator, dialogs) = coordinator();
        drop(dialogs);

        let (local, remote) = snapshots();
        assert_eq!(
            coordinator.request_resolution(&local, &remote).await,
            Resolution::Cancel
        );
        assert_eq!(coordinator.state(), ResolutionState::Idle);
    }

    #[tokio::test]
    async fn test_dropped_request_releases_slot() {
        let (coordinator, mut dialogs) = coordinator();
        let request = spawn_request(&coordinator);
        let dialog = dialogs.recv().await.unwrap();

        request.abort();
        assert!(request.await.unwrap_err().is_cancelled());

        assert_eq!(coordinator.state(), ResolutionState::Idle);
        assert!(!coordinator.resolve(dialog.id, Resolution::Local));
    }

    #[tokio::test]
    async fn test_surface_is_closed_with_the_opened_id() {
        let coordinator = Arc::new(
            ResolutionCoordinator::new(RecordingSurface::default())
                .with_choice_timeout(Some(Duration::from_millis(10))),
        );
        let (local, remote) = snapshots();

        assert_eq!(
            coordinator.request_resolution(&local, &remote).await,
            Resolution::Cancel
        );

        let events = coordinator.surface.events.lock().unwrap().clone();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].0, "open");
        assert_eq!(events[1], ("close", events[0].1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_choice_timeout_cancels() {
        let (surface, mut dialogs) = ChannelSurface::new();
        let coordinator = ResolutionCoordinator::new(surface)
            .with_choice_timeout(Some(Duration::from_secs(30)));
        let (local, remote) = snapshots();

        let choice = coordinator.request_resolution(&local, &remote).await;

        assert_eq!(choice, Resolution::Cancel);
        assert!(dialogs.try_recv().is_ok());
        assert_eq!(coordinator.state(), ResolutionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_answer_does_not_resolve_next_request() {
        let (surface, mut dialogs) = ChannelSurface::new();
        let coordinator = Arc::new(
            ResolutionCoordinator::new(surface).with_choice_timeout(Some(Duration::from_secs(30))),
        );

        let first = spawn_request(&coordinator);
        let expired = dialogs.recv().await.unwrap();
        assert_eq!(first.await.unwrap(), Resolution::Cancel);

        let second = tokio::spawn({
            let coordinator = Arc::clone(&coordinator);
            async move {
                let local = AgendaSnapshot::default();
                let remote = AgendaSnapshot {
                    tasks: vec![Item::new("2").with("titulo", "Call mom")],
                    ..Default::default()
                };
                coordinator.request_resolution(&local, &remote).await
            }
        });
        let current = dialogs.recv().await.unwrap();
        assert_ne!(expired.id, current.id);

        assert!(!coordinator.resolve(expired.id, Resolution::Local));
        assert_eq!(coordinator.state(), ResolutionState::AwaitingChoice);

        assert!(coordinator.resolve(current.id, Resolution::Remote));
        assert_eq!(second.await.unwrap(), Resolution::Remote);
    }
}
