//! Sequencing of snapshot fetches and live events for one view.
//!
//! Rules enforced by [`SyncState`]:
//!
//! * Each snapshot request is issued a ticket; only the most recently
//!   issued ticket may land. Responses to superseded requests are dropped.
//! * While a snapshot is outstanding, live envelopes are buffered and
//!   replayed in arrival order once it lands, or once it fails (onto the
//!   existing state).
//! * After [`SyncState::detach`] nothing mutates the view again.

use logitrack_live::LiveEnvelope;

use crate::reconciler::Reconciler;

/// Identifies one snapshot request.
pub type Ticket = u64;

#[derive(Debug)]
enum Phase {
    AwaitingSnapshot {
        ticket: Ticket,
        buffered: Vec<LiveEnvelope>,
    },
    Live,
    Detached,
}

/// What happened to a snapshot result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// Applied, followed by `replayed` buffered envelopes.
    Applied { replayed: usize },
    /// The fetch failed; `replayed` buffered envelopes were applied to the
    /// existing state.
    Failed { replayed: usize },
    /// A newer request was issued after this one.
    Stale,
    /// The view was unmounted.
    Detached,
}

/// What happened to a live envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveOutcome {
    Applied,
    /// Did not concern the view.
    Ignored,
    /// Held until the outstanding snapshot lands.
    Buffered,
    Detached,
}

#[derive(Debug)]
pub struct SyncState<R> {
    view: R,
    phase: Phase,
    last_ticket: Ticket,
}

impl<R: Reconciler> SyncState<R> {
    /// Start live, with no snapshot outstanding.
    pub fn new(view: R) -> Self {
        Self {
            view,
            phase: Phase::Live,
            last_ticket: 0,
        }
    }

    pub fn view(&self) -> &R {
        &self.view
    }

    pub fn is_awaiting_snapshot(&self) -> bool {
        matches!(self.phase, Phase::AwaitingSnapshot { .. })
    }

    pub fn is_detached(&self) -> bool {
        matches!(self.phase, Phase::Detached)
    }

    /// Issue a ticket for a new snapshot request, superseding any
    /// outstanding one. Envelopes already buffered stay buffered.
    pub fn begin_snapshot(&mut self) -> Ticket {
        self.last_ticket += 1;
        let ticket = self.last_ticket;

        self.phase = match std::mem::replace(&mut self.phase, Phase::Live) {
            Phase::AwaitingSnapshot { buffered, .. } => Phase::AwaitingSnapshot { ticket, buffered },
            Phase::Live => Phase::AwaitingSnapshot {
                ticket,
                buffered: Vec::new(),
            },
            Phase::Detached => Phase::Detached,
        };
        ticket
    }

    pub fn complete_snapshot(&mut self, ticket: Ticket, snapshot: R::Snapshot) -> SnapshotOutcome {
        match self.take_buffer(ticket) {
            Ok(buffered) => {
                self.view.apply_snapshot(snapshot);
                SnapshotOutcome::Applied {
                    replayed: self.replay(buffered),
                }
            }
            Err(outcome) => outcome,
        }
    }

    pub fn fail_snapshot(&mut self, ticket: Ticket) -> SnapshotOutcome {
        match self.take_buffer(ticket) {
            Ok(buffered) => SnapshotOutcome::Failed {
                replayed: self.replay(buffered),
            },
            Err(outcome) => outcome,
        }
    }

    pub fn apply_live(&mut self, envelope: LiveEnvelope) -> LiveOutcome {
        match &mut self.phase {
            Phase::Detached => LiveOutcome::Detached,
            Phase::AwaitingSnapshot { buffered, .. } => {
                buffered.push(envelope);
                LiveOutcome::Buffered
            }
            Phase::Live => {
                if self.view.apply_envelope(&envelope) {
                    LiveOutcome::Applied
                } else {
                    LiveOutcome::Ignored
                }
            }
        }
    }

    /// Stop accepting snapshots and envelopes for good.
    pub fn detach(&mut self) {
        self.phase = Phase::Detached;
    }

    /// If `ticket` is the outstanding one, go live and hand back the
    /// buffered envelopes.
    fn take_buffer(&mut self, ticket: Ticket) -> Result<Vec<LiveEnvelope>, SnapshotOutcome> {
        let is_current = match &self.phase {
            Phase::Detached => return Err(SnapshotOutcome::Detached),
            Phase::AwaitingSnapshot { ticket: current, .. } => *current == ticket,
            Phase::Live => false,
        };
        if !is_current {
            return Err(SnapshotOutcome::Stale);
        }

        match std::mem::replace(&mut self.phase, Phase::Live) {
            Phase::AwaitingSnapshot { buffered, .. } => Ok(buffered),
            _ => Ok(Vec::new()),
        }
    }

    fn replay(&mut self, buffered: Vec<LiveEnvelope>) -> usize {
        let count = buffered.len();
        for envelope in &buffered {
            self.view.apply_envelope(envelope);
        }
        count
    }
}
