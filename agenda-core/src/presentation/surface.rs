use tokio::sync::mpsc;

use crate::error::{AgendaError, AgendaResult};
use crate::presentation::ConflictPresentation;
use crate::resolution::ResolutionId;

/// A render target for the conflict dialog.
///
/// `open` puts the presentation in front of the operator and returns without
/// waiting for a choice; the choice comes back through
/// [`ResolutionCoordinator::resolve`](crate::resolution::ResolutionCoordinator::resolve)
/// together with the `id` it was opened with.
pub trait ConflictSurface: Send + Sync {
    fn open(&self, id: ResolutionId, presentation: &ConflictPresentation) -> AgendaResult<()>;

    /// Called once resolution `id` is over, whatever its outcome. Answers
    /// given for it afterwards are refused by the coordinator.
    fn close(&self, _id: ResolutionId) {}
}

/// One opened conflict, as handed to a UI loop.
#[derive(Debug, Clone)]
pub struct ConflictDialog {
    pub id: ResolutionId,
    pub presentation: ConflictPresentation,
}

/// Hands conflicts to a UI loop over a channel.
pub struct ChannelSurface {
    tx: mpsc::UnboundedSender<ConflictDialog>,
}

impl ChannelSurface {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ConflictDialog>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelSurface { tx }, rx)
    }
}

impl ConflictSurface for ChannelSurface {
    fn open(&self, id: ResolutionId, presentation: &ConflictPresentation) -> AgendaResult<()> {
        let dialog = ConflictDialog {
            id,
            presentation: presentation.clone(),
        };
        self.tx
            .send(dialog)
            .map_err(|_| AgendaError::Presentation("conflict dialog is not listening".into()))
    }
}
