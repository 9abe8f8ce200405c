//! Background execution of evaluation calls for frame-driven adapters.

use std::{
    io,
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    time::Duration,
};

use log::{debug, warn};
use tokio::runtime::{Builder, Runtime};
use wflop_editor_core::{
    Command, EvaluationFailure, EvaluationRequest, EvaluationTicket, Event, Problem,
    SolutionResponse,
};

use crate::{completion, Evaluator};

/// Runs evaluator futures on a background runtime and queues their completions.
///
/// Runtime threads never touch the edit session; they only produce commands
/// that the owning loop drains through [`EvaluationDispatcher::try_next`].
#[derive(Debug)]
pub struct EvaluationDispatcher<E> {
    evaluator: Arc<E>,
    runtime: Runtime,
    sender: Sender<Command>,
    receiver: Receiver<Command>,
}

impl<E> EvaluationDispatcher<E>
where
    E: Evaluator + Send + Sync + 'static,
{
    /// Creates a dispatcher backed by a dedicated worker thread.
    pub fn new(evaluator: E) -> io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("wflop-evaluation")
            .enable_all()
            .build()?;
        let (sender, receiver) = mpsc::channel();

        Ok(Self {
            evaluator: Arc::new(evaluator),
            runtime,
            sender,
            receiver,
        })
    }

    /// Starts evaluating a request without blocking the caller.
    ///
    /// Every submitted ticket yields exactly one completion. A task that
    /// panics or is cancelled completes as an unavailable transport.
    pub fn submit(&self, ticket: EvaluationTicket, request: EvaluationRequest) {
        let evaluator = Arc::clone(&self.evaluator);
        let sender = self.sender.clone();
        debug!("dispatching evaluation {}", ticket.get());

        let task = self
            .runtime
            .spawn(async move { evaluator.evaluate(request).await });
        let _ = self.runtime.spawn(async move {
            let outcome = task.await.unwrap_or_else(|error| {
                warn!("evaluation {} aborted: {error}", ticket.get());
                Err(EvaluationFailure::TransportUnavailable {
                    detail: format!("evaluation task failed: {error}"),
                })
            });
            if sender.send(completion(ticket, outcome)).is_err() {
                warn!("evaluation {} finished after the dispatcher shut down", ticket.get());
            }
        });
    }

    /// Submits every evaluation requested in the event batch, returning how many were sent.
    pub fn forward(&self, events: &[Event]) -> usize {
        let mut submitted = 0;
        for event in events {
            if let Event::EvaluationRequested { ticket, request } = event {
                self.submit(*ticket, request.clone());
                submitted += 1;
            }
        }
        submitted
    }

    /// Next completed evaluation, if one is ready.
    #[must_use]
    pub fn try_next(&self) -> Option<Command> {
        self.receiver.try_recv().ok()
    }

    /// Waits up to `timeout` for the next completed evaluation.
    #[must_use]
    pub fn next_timeout(&self, timeout: Duration) -> Option<Command> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Requests an initial solution, blocking until the service answers.
    pub fn solve_blocking(&self, problem: Problem) -> Result<SolutionResponse, EvaluationFailure> {
        self.runtime.block_on(self.evaluator.solve(problem))
    }

    /// Evaluator shared with the background runtime.
    #[must_use]
    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }
}
