//! The sync driver: decides, per cycle, whether to push, pull, or ask.
//!
//! Divergence is judged from provenance metadata. The local store remembers
//! the metadata of the remote document as of the last completed sync; a side
//! whose metadata no longer matches that bookkeeping has been written since.
//!
//! | remote written since? | local edited since? | action                 |
//! |-----------------------|---------------------|------------------------|
//! | no                    | any                 | push local             |
//! | yes                   | no                  | pull remote            |
//! | yes                   | yes                 | ask the coordinator    |
//!
//! Identical content on both sides short-circuits to `UpToDate`.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::AgendaResult;
use crate::identity::DeviceIdentityProvider;
use crate::presentation::ConflictSurface;
use crate::resolution::{Resolution, ResolutionCoordinator};
use crate::snapshot::{AgendaSnapshot, SnapshotMetadata};
use crate::store::{KeyValueStore, LocalStore, RemoteDocument, RemoteStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Both sides already hold the same content.
    UpToDate,
    /// The local snapshot was written to the remote store.
    Pushed,
    /// The remote snapshot replaced local state.
    Pulled,
    /// Both sides diverged and the operator kept this device's agenda.
    KeptLocal,
    /// Both sides diverged and the operator took the remote agenda.
    TookRemote,
    /// Both sides diverged and nothing was written: the operator cancelled,
    /// or local state moved while the dialog was open.
    Skipped,
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::UpToDate => write!(f, "Up to date"),
            SyncOutcome::Pushed => write!(f, "Pushed local changes"),
            SyncOutcome::Pulled => write!(f, "Pulled remote changes"),
            SyncOutcome::KeptLocal => write!(f, "Conflict resolved, kept local"),
            SyncOutcome::TookRemote => write!(f, "Conflict resolved, took remote"),
            SyncOutcome::Skipped => write!(f, "Conflict left unresolved, sync skipped"),
        }
    }
}

pub struct SyncDriver<L, R, K, S> {
    local: L,
    remote: R,
    identity: DeviceIdentityProvider<K>,
    coordinator: Arc<ResolutionCoordinator<S>>,
}

impl<L, R, K, S> SyncDriver<L, R, K, S>
where
    L: LocalStore,
    R: RemoteStore,
    K: KeyValueStore,
    S: ConflictSurface,
{
    pub fn new(
        local: L,
        remote: R,
        identity: DeviceIdentityProvider<K>,
        coordinator: Arc<ResolutionCoordinator<S>>,
    ) -> Self {
        SyncDriver {
            local,
            remote,
            identity,
            coordinator,
        }
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    pub fn identity(&self) -> &DeviceIdentityProvider<K> {
        &self.identity
    }

    /// Run one sync cycle.
    ///
    /// Remote failures are returned as errors before any local state is
    /// touched.
    pub async fn sync_once(&self) -> AgendaResult<SyncOutcome> {
        let local = self.local.load()?;
        let last_synced = self.local.last_synced()?;

        let Some(document) = self.remote.fetch().await? else {
            info!("No remote agenda yet, publishing the local one");
            self.push(local).await?;
            return Ok(SyncOutcome::Pushed);
        };
        let remote = document.snapshot;

        if local.same_content(&remote) {
            if remote.metadata != last_synced {
                self.local.record_synced(remote.metadata.as_ref())?;
            }
            return Ok(SyncOutcome::UpToDate);
        }

        let remote_changed = remote_written_since(&remote, last_synced.as_ref());
        let local_changed = local_edited_since(&local, last_synced.as_ref());
        debug!(remote_changed, local_changed, "Snapshots differ");

        if !remote_changed {
            self.push(local).await?;
            return Ok(SyncOutcome::Pushed);
        }

        if !local_changed {
            self.pull(&remote)?;
            return Ok(SyncOutcome::Pulled);
        }

        info!(
            remote_writer = remote.metadata.as_ref().map(|m| m.device_name.as_str()),
            "Local and remote agendas diverged"
        );

        let choice = self.coordinator.request_resolution(&local, &remote).await;
        if choice == Resolution::Cancel {
            return Ok(SyncOutcome::Skipped);
        }

        // The dialog may have been open for a while; never apply a choice
        // made against a local snapshot that has since been edited.
        if self.local.load()? != local {
            info!("Local agenda changed while the conflict was open, skipping");
            return Ok(SyncOutcome::Skipped);
        }

        match choice {
            Resolution::Local => {
                self.push(local).await?;
                Ok(SyncOutcome::KeptLocal)
            }
            Resolution::Remote => {
                self.pull(&remote)?;
                Ok(SyncOutcome::TookRemote)
            }
            Resolution::Cancel => Ok(SyncOutcome::Skipped),
        }
    }

    /// Sync every `interval` until `shutdown` completes, reporting each cycle.
    /// A failed cycle is reported and retried on the next tick.
    pub async fn run(
        &self,
        interval: Duration,
        shutdown: impl Future<Output = ()>,
        mut report: impl FnMut(AgendaResult<SyncOutcome>),
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Sync loop stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let result = self.sync_once().await;
                    if let Err(e) = &result {
                        warn!("Sync cycle failed: {e}");
                    }
                    report(result);
                }
            }
        }
    }

    /// Stamp the local snapshot as written by this device and publish it.
    /// Local state is only updated once the remote write succeeded.
    async fn push(&self, mut snapshot: AgendaSnapshot) -> AgendaResult<()> {
        snapshot.metadata = Some(self.identity.device_metadata().into());

        self.remote.put(&RemoteDocument::new(snapshot.clone())).await?;
        self.local.save(&snapshot)?;
        self.local.record_synced(snapshot.metadata.as_ref())?;

        debug!("Pushed local agenda");
        Ok(())
    }

    fn pull(&self, remote: &AgendaSnapshot) -> AgendaResult<()> {
        self.local.save(remote)?;
        self.local.record_synced(remote.metadata.as_ref())?;

        debug!("Pulled remote agenda");
        Ok(())
    }
}

/// A remote snapshot without provenance was written by an unknown client,
/// so it always counts as changed.
fn remote_written_since(remote: &AgendaSnapshot, last_synced: Option<&SnapshotMetadata>) -> bool {
    match &remote.metadata {
        None => true,
        Some(meta) => Some(meta) != last_synced,
    }
}

/// Fresh local state has no metadata; it counts as edited once it holds
/// anything.
fn local_edited_since(local: &AgendaSnapshot, last_synced: Option<&SnapshotMetadata>) -> bool {
    match &local.metadata {
        None => !local.is_blank(),
        Some(meta) => Some(meta) != last_synced,
    }
}
