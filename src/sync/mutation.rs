use crate::error::{PlanitError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// User-initiated board mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    CreateCard,
    UpdateCard,
    MoveCard,
    DeleteCard,
    CreateList,
    UpdateList,
    ArchiveList,
    UpdateBoard,
}

impl MutationKind {
    pub fn success_message(&self) -> &'static str {
        match self {
            Self::CreateCard => "Card created",
            Self::UpdateCard => "Card updated",
            Self::MoveCard => "Card moved",
            Self::DeleteCard => "Card deleted",
            Self::CreateList => "List created",
            Self::UpdateList => "List renamed",
            Self::ArchiveList => "List archived",
            Self::UpdateBoard => "Board updated",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateCard => write!(f, "create card"),
            Self::UpdateCard => write!(f, "update card"),
            Self::MoveCard => write!(f, "move card"),
            Self::DeleteCard => write!(f, "delete card"),
            Self::CreateList => write!(f, "create list"),
            Self::UpdateList => write!(f, "update list"),
            Self::ArchiveList => write!(f, "archive list"),
            Self::UpdateBoard => write!(f, "update board"),
        }
    }
}

/// Lifecycle phase of a single mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
    Idle,
    Pending,
    Success,
    CacheInvalidated,
    Error,
    ErrorReported,
}

impl fmt::Display for MutationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Pending => write!(f, "Pending"),
            Self::Success => write!(f, "Success"),
            Self::CacheInvalidated => write!(f, "Cache Invalidated"),
            Self::Error => write!(f, "Error"),
            Self::ErrorReported => write!(f, "Error Reported"),
        }
    }
}

impl MutationPhase {
    /// There is no retry edge: a failed mutation ends in `Idle`
    pub fn can_transition_to(&self, target: &MutationPhase) -> bool {
        matches!(
            (self, target),
            (Self::Idle, Self::Pending)
                | (Self::Pending, Self::Success)
                | (Self::Pending, Self::Error)
                | (Self::Success, Self::CacheInvalidated)
                | (Self::CacheInvalidated, Self::Idle)
                | (Self::Error, Self::ErrorReported)
                | (Self::ErrorReported, Self::Idle)
        )
    }
}

/// Handle for one in-flight mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationId(u64);

/// Tracks in-flight mutations for per-action loading state.
///
/// Mutations are independent; two moves of different cards are tracked
/// side by side and never coalesced. The map is never locked across an
/// await, so a plain mutex lets [`InFlight`] clean up from `Drop`.
#[derive(Debug, Default)]
pub struct MutationTracker {
    next_id: AtomicU64,
    in_flight: Mutex<HashMap<MutationId, (MutationKind, MutationPhase)>>,
}

impl MutationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<MutationId, (MutationKind, MutationPhase)>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a mutation in the `Pending` phase
    pub fn begin(&self, kind: MutationKind) -> MutationId {
        let id = MutationId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.entries().insert(id, (kind, MutationPhase::Pending));
        id
    }

    /// Like [`begin`](Self::begin), but the entry is dropped with the guard
    pub fn track(&self, kind: MutationKind) -> InFlight<'_> {
        InFlight {
            tracker: self,
            id: self.begin(kind),
        }
    }

    /// Moves a mutation to its next phase; reaching `Idle` forgets it
    pub fn advance(&self, id: MutationId, next: MutationPhase) -> Result<()> {
        let mut in_flight = self.entries();
        let current = in_flight
            .get(&id)
            .map(|(_, phase)| *phase)
            .unwrap_or(MutationPhase::Idle);

        if !current.can_transition_to(&next) {
            return Err(PlanitError::InvalidMutationTransition {
                from: current.to_string(),
                to: next.to_string(),
            });
        }

        if next == MutationPhase::Idle {
            in_flight.remove(&id);
        } else if let Some(entry) = in_flight.get_mut(&id) {
            entry.1 = next;
        }
        Ok(())
    }

    pub fn phase(&self, id: MutationId) -> MutationPhase {
        self.entries()
            .get(&id)
            .map(|(_, phase)| *phase)
            .unwrap_or(MutationPhase::Idle)
    }

    /// True while any mutation of this kind awaits the server
    pub fn is_pending(&self, kind: MutationKind) -> bool {
        self.entries()
            .values()
            .any(|(k, phase)| *k == kind && *phase == MutationPhase::Pending)
    }

    pub fn in_flight(&self) -> Vec<(MutationKind, MutationPhase)> {
        self.entries().values().copied().collect()
    }

    fn forget(&self, id: MutationId) {
        self.entries().remove(&id);
    }
}

/// A tracked mutation; an abandoned mutation leaves no entry behind
#[derive(Debug)]
pub struct InFlight<'a> {
    tracker: &'a MutationTracker,
    id: MutationId,
}

impl InFlight<'_> {
    pub fn id(&self) -> MutationId {
        self.id
    }

    pub fn advance(&self, next: MutationPhase) -> Result<()> {
        self.tracker.advance(self.id, next)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.tracker.forget(self.id);
    }
}
