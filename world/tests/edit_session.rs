use proptest::prelude::*;
use wflop_editor_core::{
    CellIndex, Command, EditState, EvaluationFailure, EvaluationTicket, Event, Layout, Placement,
    PlacementError, Problem, ProblemError, SolutionResponse,
};
use wflop_editor_world::{apply, query, EditSession};

fn empty_session() -> EditSession {
    let problem = Problem::default();
    let layout = Layout::empty(problem.dimension);
    EditSession::new(problem, layout).expect("default problem is valid")
}

fn dispatch(session: &mut EditSession, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    apply(session, command, &mut events);
    events
}

fn requested_ticket(events: &[Event]) -> EvaluationTicket {
    events
        .iter()
        .find_map(|event| match event {
            Event::EvaluationRequested { ticket, .. } => Some(*ticket),
            _ => None,
        })
        .expect("evaluation requested")
}

fn click(cell: u32) -> Command {
    Command::CellClicked {
        cell: CellIndex::new(cell),
    }
}

#[test]
fn clicking_empty_cell_requests_evaluation_of_single_turbine() {
    let mut session = empty_session();
    let events = dispatch(&mut session, click(0));

    assert_eq!(
        events[0],
        Event::PlacementToggled {
            cell: CellIndex::new(0),
            occupied: true,
        }
    );
    assert_eq!(
        events[1],
        Event::EditStateChanged {
            state: EditState::Evaluating,
        }
    );
    let Event::EvaluationRequested { request, .. } = &events[2] else {
        panic!("expected evaluation request, got {:?}", events[2]);
    };
    assert_eq!(request.solution.layout, vec![0]);
    assert_eq!(request.problem.number_of_turbines, 1);
    assert_eq!(query::edit_state(&session), EditState::Evaluating);
}

#[test]
fn successful_evaluation_commits_layout_and_fitness() {
    let mut session = empty_session();
    let ticket = requested_ticket(&dispatch(&mut session, click(0)));

    let events = dispatch(
        &mut session,
        Command::EvaluationSucceeded {
            ticket,
            response: SolutionResponse {
                layout: vec![0],
                fitness: 1234.5,
            },
        },
    );

    assert!(matches!(events[0], Event::LayoutCommitted { .. }));
    assert_eq!(
        events[1],
        Event::EditStateChanged {
            state: EditState::Idle,
        }
    );
    assert_eq!(query::placement(&session).to_indices(), vec![0]);
    assert_eq!(query::fitness(&session), Some(1234.5));
    assert_eq!(query::problem(&session).number_of_turbines, 1);
    assert_eq!(query::edit_state(&session), EditState::Idle);
}

#[test]
fn committed_layout_follows_server_answer() {
    let mut session = empty_session();
    let ticket = requested_ticket(&dispatch(&mut session, click(3)));

    let _ = dispatch(
        &mut session,
        Command::EvaluationSucceeded {
            ticket,
            response: SolutionResponse {
                layout: vec![7, 3, 5],
                fitness: 10.0,
            },
        },
    );

    assert_eq!(query::placement(&session).to_indices(), vec![3, 5, 7]);
    assert_eq!(query::problem(&session).number_of_turbines, 3);
}

#[test]
fn toggling_same_cell_twice_returns_to_original_placement() {
    let mut session = empty_session();
    let first = requested_ticket(&dispatch(&mut session, click(42)));
    let _ = dispatch(
        &mut session,
        Command::EvaluationSucceeded {
            ticket: first,
            response: SolutionResponse {
                layout: vec![42],
                fitness: 50.0,
            },
        },
    );

    let events = dispatch(&mut session, click(42));
    assert_eq!(
        events[0],
        Event::PlacementToggled {
            cell: CellIndex::new(42),
            occupied: false,
        }
    );
    let second = requested_ticket(&events);
    let _ = dispatch(
        &mut session,
        Command::EvaluationSucceeded {
            ticket: second,
            response: SolutionResponse {
                layout: Vec::new(),
                fitness: 0.0,
            },
        },
    );

    assert!(query::placement(&session).is_empty());
    assert_eq!(query::problem(&session).number_of_turbines, 0);
}

#[test]
fn clicks_during_evaluation_are_ignored() {
    let mut session = empty_session();
    let _ = dispatch(&mut session, click(1));
    let before = query::placement(&session).clone();

    let events = dispatch(&mut session, click(2));

    assert_eq!(
        events,
        vec![Event::ClickIgnored {
            cell: CellIndex::new(2),
        }]
    );
    assert_eq!(query::placement(&session), &before);
    assert_eq!(
        query::outstanding_evaluation(&session),
        Some(EvaluationTicket::new(0))
    );
}

#[test]
fn click_outside_grid_is_rejected_without_state_change() {
    let mut session = empty_session();
    let events = dispatch(&mut session, click(100));

    assert_eq!(
        events,
        vec![Event::ClickRejected {
            cell: CellIndex::new(100),
            reason: PlacementError::OutOfRange {
                index: 100,
                cell_count: 100,
            },
        }]
    );
    assert_eq!(query::edit_state(&session), EditState::Idle);
    assert!(query::placement(&session).is_empty());
}

#[test]
fn failed_evaluation_restores_previous_layout() {
    let mut session = empty_session();
    let seed = requested_ticket(&dispatch(&mut session, click(10)));
    let _ = dispatch(
        &mut session,
        Command::EvaluationSucceeded {
            ticket: seed,
            response: SolutionResponse {
                layout: vec![10],
                fitness: 75.0,
            },
        },
    );

    let ticket = requested_ticket(&dispatch(&mut session, click(20)));
    assert_eq!(query::placement(&session).to_indices(), vec![10, 20]);

    let failure = EvaluationFailure::FitnessCalculation {
        detail: "status 500".to_owned(),
    };
    let events = dispatch(
        &mut session,
        Command::EvaluationFailed {
            ticket,
            failure: failure.clone(),
        },
    );

    assert_eq!(
        events[0],
        Event::EvaluationRolledBack {
            failure: failure.clone(),
            restored: Placement::from_indices(10, [10]).expect("placement"),
        }
    );
    assert_eq!(query::placement(&session).to_indices(), vec![10]);
    assert_eq!(query::fitness(&session), Some(75.0));
    assert_eq!(query::last_failure(&session), Some(&failure));
    assert_eq!(query::edit_state(&session), EditState::Idle);
}

#[test]
fn failure_kinds_remain_distinguishable_after_rollback() {
    let mut session = empty_session();
    let ticket = requested_ticket(&dispatch(&mut session, click(0)));
    let _ = dispatch(
        &mut session,
        Command::EvaluationFailed {
            ticket,
            failure: EvaluationFailure::TransportUnavailable {
                detail: "connection refused".to_owned(),
            },
        },
    );

    let failure = query::last_failure(&session).expect("failure recorded");
    assert!(matches!(
        failure,
        EvaluationFailure::TransportUnavailable { .. }
    ));
    assert!(failure.to_string().contains("connection refused"));
}

#[test]
fn malformed_response_rolls_back() {
    let mut session = empty_session();
    let ticket = requested_ticket(&dispatch(&mut session, click(5)));

    let events = dispatch(
        &mut session,
        Command::EvaluationSucceeded {
            ticket,
            response: SolutionResponse {
                layout: vec![5, 5],
                fitness: 1.0,
            },
        },
    );

    assert!(matches!(
        &events[0],
        Event::EvaluationRolledBack {
            failure: EvaluationFailure::MalformedResponse { .. },
            ..
        }
    ));
    assert!(query::placement(&session).is_empty());
    assert_eq!(query::fitness(&session), None);
}

#[test]
fn outcome_for_unknown_ticket_is_discarded() {
    let mut session = empty_session();
    let ticket = requested_ticket(&dispatch(&mut session, click(8)));
    let stale = ticket.next();

    let events = dispatch(
        &mut session,
        Command::EvaluationFailed {
            ticket: stale,
            failure: EvaluationFailure::TransportUnavailable {
                detail: "late".to_owned(),
            },
        },
    );

    assert_eq!(
        events,
        vec![Event::StaleEvaluationDiscarded { ticket: stale }]
    );
    assert_eq!(query::edit_state(&session), EditState::Evaluating);
    assert_eq!(query::placement(&session).to_indices(), vec![8]);
}

#[test]
fn external_layout_supersedes_outstanding_evaluation() {
    let mut session = empty_session();
    let ticket = requested_ticket(&dispatch(&mut session, click(1)));
    let solved = Layout::new(
        Placement::from_indices(10, [11, 22, 33]).expect("placement"),
        Some(900.0),
    );

    let events = dispatch(
        &mut session,
        Command::ExternalLayoutReceived {
            layout: solved.clone(),
        },
    );
    assert_eq!(
        events,
        vec![
            Event::LayoutReplaced {
                layout: solved.clone(),
            },
            Event::EditStateChanged {
                state: EditState::Idle,
            },
        ]
    );

    let late = dispatch(
        &mut session,
        Command::EvaluationSucceeded {
            ticket,
            response: SolutionResponse {
                layout: vec![1],
                fitness: 1.0,
            },
        },
    );
    assert_eq!(late, vec![Event::StaleEvaluationDiscarded { ticket }]);
    assert_eq!(query::layout(&session), &solved);
    assert_eq!(query::problem(&session).number_of_turbines, 3);
}

#[test]
fn external_layout_for_other_grid_is_rejected() {
    let mut session = empty_session();
    let events = dispatch(
        &mut session,
        Command::ExternalLayoutReceived {
            layout: Layout::empty(12),
        },
    );

    assert_eq!(
        events,
        vec![Event::LayoutRejected {
            reason: PlacementError::DimensionMismatch {
                expected: 10,
                actual: 12,
            },
        }]
    );
}

#[test]
fn submitted_problem_resets_session() {
    let mut session = empty_session();
    let _ = dispatch(&mut session, Command::SelectWindProfile { index: 3 });
    let problem = Problem {
        dimension: 6,
        number_of_turbines: 0,
        ..Problem::default()
    };

    let events = dispatch(
        &mut session,
        Command::ProblemSubmitted {
            problem,
            layout: Layout::empty(6),
        },
    );

    assert_eq!(events[0], Event::ProblemReplaced { dimension: 6 });
    assert_eq!(query::problem(&session).dimension, 6);
    assert_eq!(query::wind_index(&session), 0);
}

#[test]
fn invalid_problem_is_rejected() {
    let mut session = empty_session();
    let problem = Problem {
        hub_height: 0.05,
        ..Problem::default()
    };

    let events = dispatch(
        &mut session,
        Command::ProblemSubmitted {
            problem,
            layout: Layout::empty(10),
        },
    );

    assert!(matches!(
        events[0],
        Event::ProblemRejected {
            reason: ProblemError::HubBelowRoughness { .. },
        }
    ));
    assert_eq!(query::problem(&session).hub_height, 100.0);
}

#[test]
fn wind_selection_is_bounded_by_profile_count() {
    let mut session = empty_session();

    let accepted = dispatch(&mut session, Command::SelectWindProfile { index: 4 });
    assert_eq!(accepted, vec![Event::WindProfileSelected { index: 4 }]);
    assert_eq!(
        query::active_wind(&session).map(|wind| wind.angle),
        Some(225.0)
    );

    let rejected = dispatch(&mut session, Command::SelectWindProfile { index: 5 });
    assert_eq!(
        rejected,
        vec![Event::WindSelectionRejected {
            index: 5,
            available: 5,
        }]
    );
    assert_eq!(query::wind_index(&session), 4);
}

#[derive(Clone, Debug)]
enum Step {
    Click(u32),
    Succeed,
    Fail,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0u32..110).prop_map(Step::Click),
        Just(Step::Succeed),
        Just(Step::Fail),
    ]
}

proptest! {
    #[test]
    fn placement_stays_in_range_and_counts_track(steps in proptest::collection::vec(step(), 0..60)) {
        let mut session = empty_session();
        let mut outstanding: Option<EvaluationTicket> = None;

        for step in steps {
            let events = match step {
                Step::Click(cell) => dispatch(&mut session, click(cell)),
                Step::Succeed => match outstanding.take() {
                    Some(ticket) => {
                        let layout = query::placement(&session).to_indices();
                        dispatch(
                            &mut session,
                            Command::EvaluationSucceeded {
                                ticket,
                                response: SolutionResponse { layout, fitness: 1.0 },
                            },
                        )
                    }
                    None => Vec::new(),
                },
                Step::Fail => match outstanding.take() {
                    Some(ticket) => dispatch(
                        &mut session,
                        Command::EvaluationFailed {
                            ticket,
                            failure: EvaluationFailure::TransportUnavailable {
                                detail: "offline".to_owned(),
                            },
                        },
                    ),
                    None => Vec::new(),
                },
            };

            for event in &events {
                if let Event::EvaluationRequested { ticket, .. } = event {
                    outstanding = Some(*ticket);
                }
            }

            let placement = query::placement(&session);
            prop_assert!(placement.iter().all(|cell| cell.get() < 100));
            prop_assert!(placement.len() <= 100);
            prop_assert_eq!(
                query::edit_state(&session) == EditState::Evaluating,
                outstanding.is_some()
            );
            if outstanding.is_none() {
                prop_assert_eq!(
                    query::problem(&session).number_of_turbines as usize,
                    placement.len()
                );
            }
        }
    }
}
