#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative edit session for the WFLOP layout editor.
//!
//! The session owns the active problem, the current layout and the edit
//! state machine. Adapters mutate it exclusively through [`apply`] and read
//! it through the [`query`] module.

mod pending;

use log::{debug, info, warn};
use thiserror::Error;
use wflop_editor_core::{
    CellIndex, Command, EditState, EvaluationFailure, EvaluationRequest, EvaluationTicket, Event,
    Layout, PlacementError, Problem, ProblemError, SolutionResponse,
};

use crate::pending::EvaluationSlot;

/// Layout, problem and evaluation state owned by a single editing session.
#[derive(Debug)]
pub struct EditSession {
    problem: Problem,
    layout: Layout,
    wind_index: usize,
    evaluation: EvaluationSlot,
    last_failure: Option<EvaluationFailure>,
}

impl EditSession {
    /// Creates a session for a validated problem seeded with the provided layout.
    pub fn new(problem: Problem, layout: Layout) -> Result<Self, SessionError> {
        problem.validate()?;
        check_dimension(&problem, &layout)?;

        let mut session = Self {
            problem,
            layout,
            wind_index: 0,
            evaluation: EvaluationSlot::new(),
            last_failure: None,
        };
        session.sync_turbine_count();
        Ok(session)
    }

    fn state(&self) -> EditState {
        if self.evaluation.is_occupied() {
            EditState::Evaluating
        } else {
            EditState::Idle
        }
    }

    fn sync_turbine_count(&mut self) {
        self.problem.number_of_turbines =
            u32::try_from(self.layout.placement().len()).unwrap_or(u32::MAX);
    }

    fn toggle_cell(&mut self, cell: CellIndex, out_events: &mut Vec<Event>) {
        if self.evaluation.is_occupied() {
            debug!("ignoring click on cell {} while evaluating", cell.get());
            out_events.push(Event::ClickIgnored { cell });
            return;
        }

        let mut candidate = self.layout.placement().clone();
        let occupied = match candidate.toggle(cell) {
            Ok(occupied) => occupied,
            Err(reason) => {
                warn!("rejecting click: {reason}");
                out_events.push(Event::ClickRejected { cell, reason });
                return;
            }
        };

        let request = EvaluationRequest::new(&self.problem, &candidate);
        if let Err(reason) = request.validate() {
            warn!("rejecting click on cell {}: {reason}", cell.get());
            out_events.push(Event::ClickRejected { cell, reason });
            return;
        }

        let fitness = self.layout.fitness();
        let previous = std::mem::replace(&mut self.layout, Layout::new(candidate, fitness));
        let ticket = self.evaluation.open(previous);
        self.last_failure = None;
        debug!(
            "cell {} toggled to {}, evaluation {} requested",
            cell.get(),
            if occupied { "occupied" } else { "empty" },
            ticket.get()
        );

        out_events.push(Event::PlacementToggled { cell, occupied });
        out_events.push(Event::EditStateChanged {
            state: EditState::Evaluating,
        });
        out_events.push(Event::EvaluationRequested { ticket, request });
    }

    fn complete(
        &mut self,
        ticket: EvaluationTicket,
        response: SolutionResponse,
        out_events: &mut Vec<Event>,
    ) {
        let Some(pending) = self.evaluation.resolve(ticket) else {
            debug!("discarding stale evaluation result {}", ticket.get());
            out_events.push(Event::StaleEvaluationDiscarded { ticket });
            return;
        };

        match response.into_layout(self.problem.dimension) {
            Ok(layout) => {
                info!(
                    "layout committed with {} turbines, fitness {}",
                    layout.placement().len(),
                    layout.fitness().unwrap_or_default()
                );
                self.layout = layout;
                self.sync_turbine_count();
                out_events.push(Event::LayoutCommitted {
                    layout: self.layout.clone(),
                });
                out_events.push(Event::EditStateChanged {
                    state: EditState::Idle,
                });
            }
            Err(defect) => {
                let failure = EvaluationFailure::MalformedResponse {
                    detail: defect.to_string(),
                };
                self.roll_back(pending.previous, failure, out_events);
            }
        }
    }

    fn fail(
        &mut self,
        ticket: EvaluationTicket,
        failure: EvaluationFailure,
        out_events: &mut Vec<Event>,
    ) {
        match self.evaluation.resolve(ticket) {
            Some(pending) => self.roll_back(pending.previous, failure, out_events),
            None => {
                debug!("discarding stale evaluation failure {}", ticket.get());
                out_events.push(Event::StaleEvaluationDiscarded { ticket });
            }
        }
    }

    fn roll_back(
        &mut self,
        previous: Layout,
        failure: EvaluationFailure,
        out_events: &mut Vec<Event>,
    ) {
        warn!("evaluation failed, restoring previous layout: {failure}");
        self.layout = previous;
        self.last_failure = Some(failure.clone());
        out_events.push(Event::EvaluationRolledBack {
            failure,
            restored: self.layout.placement().clone(),
        });
        out_events.push(Event::EditStateChanged {
            state: EditState::Idle,
        });
    }

    fn replace_layout(&mut self, layout: Layout, out_events: &mut Vec<Event>) {
        if let Err(reason) = check_dimension(&self.problem, &layout) {
            warn!("rejecting external layout: {reason}");
            out_events.push(Event::LayoutRejected { reason });
            return;
        }

        let was_evaluating = self.evaluation.abandon();
        self.layout = layout;
        self.last_failure = None;
        self.sync_turbine_count();
        info!("layout replaced with {} turbines", self.layout.placement().len());

        out_events.push(Event::LayoutReplaced {
            layout: self.layout.clone(),
        });
        if was_evaluating {
            out_events.push(Event::EditStateChanged {
                state: EditState::Idle,
            });
        }
    }

    fn replace_problem(&mut self, problem: Problem, layout: Layout, out_events: &mut Vec<Event>) {
        if let Err(reason) = problem.validate() {
            warn!("rejecting problem: {reason}");
            out_events.push(Event::ProblemRejected { reason });
            return;
        }
        if let Err(reason) = check_dimension(&problem, &layout) {
            warn!("rejecting layout for submitted problem: {reason}");
            out_events.push(Event::LayoutRejected { reason });
            return;
        }

        let was_evaluating = self.evaluation.abandon();
        let dimension = problem.dimension;
        self.problem = problem;
        self.layout = layout;
        self.wind_index = 0;
        self.last_failure = None;
        self.sync_turbine_count();
        info!("problem replaced with a {dimension}x{dimension} grid");

        out_events.push(Event::ProblemReplaced { dimension });
        out_events.push(Event::LayoutReplaced {
            layout: self.layout.clone(),
        });
        if was_evaluating {
            out_events.push(Event::EditStateChanged {
                state: EditState::Idle,
            });
        }
    }

    fn select_wind(&mut self, index: usize, out_events: &mut Vec<Event>) {
        let available = self.problem.wind_profiles.len();
        if index < available {
            self.wind_index = index;
            out_events.push(Event::WindProfileSelected { index });
        } else {
            warn!("wind profile {index} requested but only {available} exist");
            out_events.push(Event::WindSelectionRejected { index, available });
        }
    }
}

/// Reasons a session could not be created.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SessionError {
    /// The problem definition failed validation.
    #[error(transparent)]
    Problem(#[from] ProblemError),
    /// The seed layout does not fit the problem.
    #[error(transparent)]
    Layout(#[from] PlacementError),
}

fn check_dimension(problem: &Problem, layout: &Layout) -> Result<(), PlacementError> {
    let actual = layout.placement().dimension();
    if actual == problem.dimension {
        Ok(())
    } else {
        Err(PlacementError::DimensionMismatch {
            expected: problem.dimension,
            actual,
        })
    }
}

/// Applies the provided command to the session, mutating state deterministically.
pub fn apply(session: &mut EditSession, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::CellClicked { cell } => session.toggle_cell(cell, out_events),
        Command::EvaluationSucceeded { ticket, response } => {
            session.complete(ticket, response, out_events);
        }
        Command::EvaluationFailed { ticket, failure } => {
            session.fail(ticket, failure, out_events);
        }
        Command::ExternalLayoutReceived { layout } => session.replace_layout(layout, out_events),
        Command::ProblemSubmitted { problem, layout } => {
            session.replace_problem(problem, layout, out_events);
        }
        Command::SelectWindProfile { index } => session.select_wind(index, out_events),
    }
}

/// Query functions that provide read-only access to the session state.
pub mod query {
    use super::EditSession;
    use wflop_editor_core::{
        EditState, EvaluationFailure, EvaluationTicket, Layout, Placement, Problem, WindProfile,
    };

    /// Provides read-only access to the active problem definition.
    ///
    /// `number_of_turbines` always equals the size of the current placement.
    #[must_use]
    pub fn problem(session: &EditSession) -> &Problem {
        &session.problem
    }

    /// Provides read-only access to the current layout.
    #[must_use]
    pub fn layout(session: &EditSession) -> &Layout {
        &session.layout
    }

    /// Provides read-only access to the occupied cells.
    #[must_use]
    pub fn placement(session: &EditSession) -> &Placement {
        session.layout.placement()
    }

    /// Fitness of the current layout, if it has been evaluated.
    #[must_use]
    pub fn fitness(session: &EditSession) -> Option<f64> {
        session.layout.fitness()
    }

    /// Current state of the edit state machine.
    #[must_use]
    pub fn edit_state(session: &EditSession) -> EditState {
        session.state()
    }

    /// Ticket of the evaluation the session is waiting on.
    #[must_use]
    pub fn outstanding_evaluation(session: &EditSession) -> Option<EvaluationTicket> {
        session.evaluation.outstanding()
    }

    /// Position of the wind profile selected for visualization.
    #[must_use]
    pub fn wind_index(session: &EditSession) -> usize {
        session.wind_index
    }

    /// Wind profile selected for visualization.
    #[must_use]
    pub fn active_wind(session: &EditSession) -> Option<&WindProfile> {
        session.problem.wind_profiles.get(session.wind_index)
    }

    /// Failure reported by the most recent rolled-back evaluation.
    ///
    /// Cleared by the next toggle or layout replacement.
    #[must_use]
    pub fn last_failure(session: &EditSession) -> Option<&EvaluationFailure> {
        session.last_failure.as_ref()
    }
}
