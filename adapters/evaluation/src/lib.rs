#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Evaluation boundary for the WFLOP layout editor.
//!
//! The [`Evaluator`] trait abstracts the service that scores candidate
//! layouts and produces initial solutions. [`HttpEvaluator`] talks to the
//! remote service, [`EvaluationDispatcher`] runs evaluations off the render
//! loop, and [`drive`] resolves requests inline for scripted sessions.

mod dispatcher;
mod http;

use std::{collections::VecDeque, future::Future};

use wflop_editor_core::{
    Command, EvaluationFailure, EvaluationRequest, EvaluationTicket, Event, Problem,
    SolutionResponse,
};
use wflop_editor_world::{apply, EditSession};

pub use dispatcher::EvaluationDispatcher;
pub use http::{ClientError, HttpEvaluator, ServerSettings};

/// Service that scores candidate layouts and solves problems from scratch.
pub trait Evaluator {
    /// Scores a candidate layout.
    fn evaluate(
        &self,
        request: EvaluationRequest,
    ) -> impl Future<Output = Result<SolutionResponse, EvaluationFailure>> + Send;

    /// Produces an initial layout for a problem.
    fn solve(
        &self,
        problem: Problem,
    ) -> impl Future<Output = Result<SolutionResponse, EvaluationFailure>> + Send;
}

/// Converts an evaluation outcome into the command that reports it to the session.
#[must_use]
pub fn completion(
    ticket: EvaluationTicket,
    outcome: Result<SolutionResponse, EvaluationFailure>,
) -> Command {
    match outcome {
        Ok(response) => Command::EvaluationSucceeded { ticket, response },
        Err(failure) => Command::EvaluationFailed { ticket, failure },
    }
}

/// Applies a command and resolves every evaluation it requests before returning.
///
/// Events from the command and from each resolution are appended to
/// `out_events` in the order they were emitted.
pub async fn drive<E>(
    session: &mut EditSession,
    evaluator: &E,
    command: Command,
    out_events: &mut Vec<Event>,
) where
    E: Evaluator,
{
    let mut queue = VecDeque::from([command]);
    while let Some(command) = queue.pop_front() {
        let start = out_events.len();
        apply(session, command, out_events);

        let requests: Vec<(EvaluationTicket, EvaluationRequest)> = out_events[start..]
            .iter()
            .filter_map(|event| match event {
                Event::EvaluationRequested { ticket, request } => Some((*ticket, request.clone())),
                _ => None,
            })
            .collect();

        for (ticket, request) in requests {
            let outcome = evaluator.evaluate(request).await;
            queue.push_back(completion(ticket, outcome));
        }
    }
}
