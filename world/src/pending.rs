//! Bookkeeping for the evaluation that is currently outstanding.

use wflop_editor_core::{EvaluationTicket, Layout};

/// Evaluation the session is waiting on, with the layout to restore on failure.
#[derive(Clone, Debug)]
pub(crate) struct PendingEvaluation {
    /// Ticket that a matching outcome must carry.
    pub(crate) ticket: EvaluationTicket,
    /// Layout held before the optimistic toggle was applied.
    pub(crate) previous: Layout,
}

/// Allocates tickets and tracks the single outstanding evaluation.
#[derive(Debug)]
pub(crate) struct EvaluationSlot {
    pending: Option<PendingEvaluation>,
    next_ticket: EvaluationTicket,
}

impl EvaluationSlot {
    /// Creates an empty slot with a reset ticket counter.
    pub(crate) const fn new() -> Self {
        Self {
            pending: None,
            next_ticket: EvaluationTicket::new(0),
        }
    }

    /// Reports whether an evaluation is outstanding.
    pub(crate) const fn is_occupied(&self) -> bool {
        self.pending.is_some()
    }

    /// Ticket of the outstanding evaluation, if any.
    pub(crate) fn outstanding(&self) -> Option<EvaluationTicket> {
        self.pending.as_ref().map(|pending| pending.ticket)
    }

    /// Records a new outstanding evaluation and returns its ticket.
    pub(crate) fn open(&mut self, previous: Layout) -> EvaluationTicket {
        let ticket = self.next_ticket;
        self.next_ticket = ticket.next();
        self.pending = Some(PendingEvaluation { ticket, previous });
        ticket
    }

    /// Removes the outstanding evaluation when the ticket matches it.
    ///
    /// Outcomes carrying any other ticket leave the slot untouched.
    pub(crate) fn resolve(&mut self, ticket: EvaluationTicket) -> Option<PendingEvaluation> {
        match &self.pending {
            Some(pending) if pending.ticket == ticket => self.pending.take(),
            _ => None,
        }
    }

    /// Drops the outstanding evaluation, reporting whether one existed.
    ///
    /// Tickets are never reused, so a late outcome for the dropped
    /// evaluation is recognised as stale.
    pub(crate) fn abandon(&mut self) -> bool {
        self.pending.take().is_some()
    }
}
