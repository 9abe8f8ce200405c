#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the WFLOP layout editor.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative edit session, and pure systems. Adapters submit [`Command`]
//! values describing desired mutations, the session executes those commands
//! via its `apply` entry point, and then broadcasts [`Event`] values for
//! systems and adapters to react to. The [`grid`] module hosts the pure
//! coordinate transforms shared by hit-testing, rendering and wake geometry.

pub mod grid;

use std::collections::BTreeSet;

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest grid dimension accepted by problem validation.
///
/// Keeps `dimension²` comfortably inside `u32` cell indices.
pub const MAX_DIMENSION: u32 = 4096;

/// Commands that express all permissible edit-session mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Requests that the turbine occupancy of a single cell be toggled.
    CellClicked {
        /// Cell resolved by the hit-test surface.
        cell: CellIndex,
    },
    /// Delivers the successful outcome of an outstanding evaluation.
    EvaluationSucceeded {
        /// Ticket allocated when the evaluation was requested.
        ticket: EvaluationTicket,
        /// Layout and fitness returned by the evaluator.
        response: SolutionResponse,
    },
    /// Delivers the failed outcome of an outstanding evaluation.
    EvaluationFailed {
        /// Ticket allocated when the evaluation was requested.
        ticket: EvaluationTicket,
        /// Reason the evaluation could not be completed.
        failure: EvaluationFailure,
    },
    /// Replaces the placement with a layout supplied from outside the editor.
    ExternalLayoutReceived {
        /// Layout that becomes authoritative.
        layout: Layout,
    },
    /// Starts over with a new problem definition and its initial layout.
    ProblemSubmitted {
        /// Problem definition supplied by the operator.
        problem: Problem,
        /// Layout seeding the new session.
        layout: Layout,
    },
    /// Selects the wind profile used for wake visualization.
    SelectWindProfile {
        /// Position of the profile within the problem's wind profile list.
        index: usize,
    },
}

/// Events broadcast by the edit session after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that a cell was optimistically toggled.
    PlacementToggled {
        /// Cell whose occupancy changed.
        cell: CellIndex,
        /// Whether the cell now holds a turbine.
        occupied: bool,
    },
    /// Requests that the adapter score the candidate layout.
    EvaluationRequested {
        /// Ticket that must accompany the evaluation outcome.
        ticket: EvaluationTicket,
        /// Fully validated request payload.
        request: EvaluationRequest,
    },
    /// Reports that a click arrived while an evaluation was outstanding.
    ClickIgnored {
        /// Cell that was clicked.
        cell: CellIndex,
    },
    /// Reports that a click referenced a cell outside the grid.
    ClickRejected {
        /// Cell that was clicked.
        cell: CellIndex,
        /// Specific reason the click was rejected.
        reason: PlacementError,
    },
    /// Confirms that an evaluated layout became authoritative.
    LayoutCommitted {
        /// Layout now held by the session.
        layout: Layout,
    },
    /// Reports that an evaluation failed and the optimistic toggle was undone.
    EvaluationRolledBack {
        /// Reason the evaluation failed.
        failure: EvaluationFailure,
        /// Placement restored after the rollback.
        restored: Placement,
    },
    /// Reports that an evaluation outcome arrived for a ticket no longer outstanding.
    StaleEvaluationDiscarded {
        /// Ticket carried by the discarded outcome.
        ticket: EvaluationTicket,
    },
    /// Confirms that an external layout replaced the placement.
    LayoutReplaced {
        /// Layout now held by the session.
        layout: Layout,
    },
    /// Reports that an external layout did not fit the active problem.
    LayoutRejected {
        /// Specific reason the layout was rejected.
        reason: PlacementError,
    },
    /// Confirms that a new problem definition became active.
    ProblemReplaced {
        /// Grid dimension of the new problem.
        dimension: u32,
    },
    /// Reports that a submitted problem failed validation.
    ProblemRejected {
        /// Specific reason the problem was rejected.
        reason: ProblemError,
    },
    /// Confirms that a wind profile was selected for visualization.
    WindProfileSelected {
        /// Position of the selected profile.
        index: usize,
    },
    /// Reports that a wind profile selection referenced a missing profile.
    WindSelectionRejected {
        /// Position that was requested.
        index: usize,
        /// Number of profiles available.
        available: usize,
    },
    /// Announces that the session entered a new edit state.
    EditStateChanged {
        /// State that became active after processing the command.
        state: EditState,
    },
}

/// States of the layout edit state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EditState {
    /// No evaluation is outstanding; clicks toggle cells.
    Idle,
    /// An evaluation is outstanding; clicks are dropped.
    Evaluating,
}

/// Pointer affordance adapters display over the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CursorHint {
    /// The pointer is outside the grid.
    #[default]
    Default,
    /// The hovered cell can be toggled.
    Pointer,
    /// An evaluation is outstanding.
    Wait,
}

/// Flat index of a grid cell, `row · N + column`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CellIndex(u32);

impl CellIndex {
    /// Creates a new cell index with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier allocated by the session for every evaluation it requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EvaluationTicket(u64);

impl EvaluationTicket {
    /// Creates a new ticket with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the ticket.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Returns the ticket allocated after this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Wind speed and direction used by the wake visualization.
///
/// `angle` is a compass bearing in degrees, measured clockwise from north.
/// Internally it is rotated to `90° − angle` so that `(cos, sin)` yields the
/// direction the wake extends on the y-down canvas: `0°` points down the
/// canvas and `90°` along positive x.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindProfile {
    /// Wind speed in metres per second.
    pub speed: f64,
    /// Direction in degrees.
    pub angle: f64,
}

impl WindProfile {
    /// Creates a new wind profile.
    #[must_use]
    pub const fn new(speed: f64, angle: f64) -> Self {
        Self { speed, angle }
    }

    /// Compass bearing rotated into the trigonometric convention, in radians.
    #[must_use]
    pub fn math_angle_radians(&self) -> f64 {
        (90.0 - self.angle).to_radians()
    }

    /// Unit vector pointing downwind in pixel space.
    #[must_use]
    pub fn downwind(&self) -> DVec2 {
        let angle = self.math_angle_radians();
        DVec2::new(angle.cos(), angle.sin())
    }
}

/// Immutable WFLOP problem definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Problem {
    /// Rotor radius in world units.
    pub rotor_radius: f64,
    /// Hub height in world units.
    pub hub_height: f64,
    /// Fraction of available power converted by the rotor.
    pub rotor_efficiency: f64,
    /// Thrust coefficient of the rotor.
    pub thrust_coefficient: f64,
    /// Air density in kg/m³.
    pub air_density: f64,
    /// Surface roughness length in world units.
    pub surface_roughness: f64,
    /// Physical width of a single grid cell in world units.
    pub grid_width: f64,
    /// Number of cells along each side of the square grid.
    pub dimension: u32,
    /// Number of turbines in the layout.
    pub number_of_turbines: u32,
    /// Wind profiles in the order supplied by the operator.
    pub wind_profiles: Vec<WindProfile>,
}

impl Default for Problem {
    fn default() -> Self {
        Self {
            rotor_radius: 40.0,
            hub_height: 100.0,
            rotor_efficiency: 0.9,
            thrust_coefficient: 0.8,
            air_density: 1.225,
            surface_roughness: 0.1,
            grid_width: 200.0,
            dimension: 10,
            number_of_turbines: 20,
            wind_profiles: vec![
                WindProfile::new(5.2, 45.0),
                WindProfile::new(6.7, 90.0),
                WindProfile::new(4.9, 135.0),
                WindProfile::new(7.3, 180.0),
                WindProfile::new(5.8, 225.0),
            ],
        }
    }
}

impl Problem {
    /// Total number of cells in the grid, `N²`.
    #[must_use]
    pub const fn cell_count(&self) -> u32 {
        self.dimension.saturating_mul(self.dimension)
    }

    /// Returns a copy of the problem with `number_of_turbines` overwritten.
    #[must_use]
    pub fn with_turbine_count(&self, count: u32) -> Self {
        Self {
            number_of_turbines: count,
            ..self.clone()
        }
    }

    /// Checks every precondition the editor relies on.
    ///
    /// Rejecting `hub_height ≤ surface_roughness` here keeps the wake
    /// entrainment constant finite and positive.
    pub fn validate(&self) -> Result<(), ProblemError> {
        if self.dimension == 0 {
            return Err(ProblemError::ZeroDimension);
        }
        if self.dimension > MAX_DIMENSION {
            return Err(ProblemError::DimensionTooLarge {
                dimension: self.dimension,
            });
        }

        for (field, value) in [
            ("rotorRadius", self.rotor_radius),
            ("hubHeight", self.hub_height),
            ("surfaceRoughness", self.surface_roughness),
            ("gridWidth", self.grid_width),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ProblemError::NonPositive { field, value });
            }
        }

        if self.hub_height <= self.surface_roughness {
            return Err(ProblemError::HubBelowRoughness {
                hub_height: self.hub_height,
                surface_roughness: self.surface_roughness,
            });
        }

        if self.number_of_turbines > self.cell_count() {
            return Err(ProblemError::TooManyTurbines {
                requested: self.number_of_turbines,
                cell_count: self.cell_count(),
            });
        }

        if self.wind_profiles.is_empty() {
            return Err(ProblemError::MissingWindProfiles);
        }

        for (index, wind) in self.wind_profiles.iter().enumerate() {
            if !wind.speed.is_finite() || wind.speed <= 0.0 || !wind.angle.is_finite() {
                return Err(ProblemError::InvalidWindProfile {
                    index,
                    speed: wind.speed,
                    angle: wind.angle,
                });
            }
        }

        Ok(())
    }
}

/// Reasons a problem definition may be rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ProblemError {
    /// The grid has no cells.
    #[error("grid dimension must be positive")]
    ZeroDimension,
    /// The grid is larger than the editor supports.
    #[error("grid dimension {dimension} exceeds the supported maximum of {max}", max = MAX_DIMENSION)]
    DimensionTooLarge {
        /// Dimension that was requested.
        dimension: u32,
    },
    /// A length parameter was zero, negative or not finite.
    #[error("{field} must be a positive finite number (received {value})")]
    NonPositive {
        /// Wire name of the offending field.
        field: &'static str,
        /// Value that failed validation.
        value: f64,
    },
    /// The hub does not rise above the roughness length.
    #[error(
        "hubHeight ({hub_height}) must exceed surfaceRoughness ({surface_roughness}) \
         for a finite entrainment constant"
    )]
    HubBelowRoughness {
        /// Hub height that was supplied.
        hub_height: f64,
        /// Surface roughness that was supplied.
        surface_roughness: f64,
    },
    /// More turbines were requested than the grid holds.
    #[error("numberOfTurbines ({requested}) cannot exceed grid cell count ({cell_count})")]
    TooManyTurbines {
        /// Turbine count that was requested.
        requested: u32,
        /// Number of cells in the grid.
        cell_count: u32,
    },
    /// The problem carries no wind profiles.
    #[error("at least one wind profile is required")]
    MissingWindProfiles,
    /// A wind profile had a non-positive speed or a non-finite angle.
    #[error("wind profile {index} is invalid (speed {speed}, angle {angle})")]
    InvalidWindProfile {
        /// Position of the offending profile.
        index: usize,
        /// Speed that was supplied.
        speed: f64,
        /// Angle that was supplied.
        angle: f64,
    },
}

/// Set of occupied cells on an `N × N` grid.
///
/// Every member lies in `[0, N²)`, so the set never holds more than `N²`
/// cells.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    dimension: u32,
    cells: BTreeSet<CellIndex>,
}

impl Placement {
    /// Creates an empty placement for a grid of the provided dimension.
    #[must_use]
    pub const fn empty(dimension: u32) -> Self {
        Self {
            dimension,
            cells: BTreeSet::new(),
        }
    }

    /// Builds a placement from raw indices, rejecting out-of-range and duplicate cells.
    pub fn from_indices<I>(dimension: u32, indices: I) -> Result<Self, PlacementError>
    where
        I: IntoIterator<Item = u32>,
    {
        let cell_count = dimension.saturating_mul(dimension);
        let mut cells = BTreeSet::new();
        for index in indices {
            if index >= cell_count {
                return Err(PlacementError::OutOfRange { index, cell_count });
            }
            if !cells.insert(CellIndex::new(index)) {
                return Err(PlacementError::Duplicate { index });
            }
        }

        Ok(Self { dimension, cells })
    }

    /// Number of cells along each side of the grid.
    #[must_use]
    pub const fn dimension(&self) -> u32 {
        self.dimension
    }

    /// Total number of cells in the grid.
    #[must_use]
    pub const fn cell_count(&self) -> u32 {
        self.dimension.saturating_mul(self.dimension)
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether no cell is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reports whether the cell holds a turbine.
    #[must_use]
    pub fn contains(&self, cell: CellIndex) -> bool {
        self.cells.contains(&cell)
    }

    /// Checks that the cell lies inside the grid.
    pub fn check_in_range(&self, cell: CellIndex) -> Result<(), PlacementError> {
        let cell_count = self.cell_count();
        if cell.get() < cell_count {
            Ok(())
        } else {
            Err(PlacementError::OutOfRange {
                index: cell.get(),
                cell_count,
            })
        }
    }

    /// Toggles the occupancy of a cell, returning whether it is now occupied.
    pub fn toggle(&mut self, cell: CellIndex) -> Result<bool, PlacementError> {
        self.check_in_range(cell)?;
        if self.cells.remove(&cell) {
            Ok(false)
        } else {
            let _ = self.cells.insert(cell);
            Ok(true)
        }
    }

    /// Iterator over the occupied cells in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = CellIndex> + '_ {
        self.cells.iter().copied()
    }

    /// Occupied cells as an ascending sequence of raw indices.
    #[must_use]
    pub fn to_indices(&self) -> Vec<u32> {
        self.cells.iter().map(CellIndex::get).collect()
    }
}

/// Reasons a placement or a cell reference may be rejected.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum PlacementError {
    /// The index lies outside `[0, N²)`.
    #[error("cell index {index} is outside the grid (cell count {cell_count})")]
    OutOfRange {
        /// Index that was supplied.
        index: u32,
        /// Number of cells in the grid.
        cell_count: u32,
    },
    /// The index appears more than once.
    #[error("cell index {index} appears more than once")]
    Duplicate {
        /// Index that was repeated.
        index: u32,
    },
    /// More cells were supplied than the grid holds.
    #[error("too many turbines: {count} > {cell_count}")]
    TooMany {
        /// Number of cells supplied.
        count: usize,
        /// Number of cells in the grid.
        cell_count: u32,
    },
    /// The placement was built for a different grid.
    #[error("layout targets a {actual}x{actual} grid but the problem uses {expected}x{expected}")]
    DimensionMismatch {
        /// Dimension of the active problem.
        expected: u32,
        /// Dimension of the supplied placement.
        actual: u32,
    },
}

/// Placement together with its fitness score.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    placement: Placement,
    fitness: Option<f64>,
}

impl Layout {
    /// Creates a layout from a placement and an optional fitness score.
    #[must_use]
    pub const fn new(placement: Placement, fitness: Option<f64>) -> Self {
        Self { placement, fitness }
    }

    /// Creates an unevaluated, empty layout.
    #[must_use]
    pub const fn empty(dimension: u32) -> Self {
        Self::new(Placement::empty(dimension), None)
    }

    /// Occupied cells of the layout.
    #[must_use]
    pub const fn placement(&self) -> &Placement {
        &self.placement
    }

    /// Fitness score, `None` until the layout has been evaluated.
    #[must_use]
    pub const fn fitness(&self) -> Option<f64> {
        self.fitness
    }
}

/// Candidate layout as carried inside an evaluation request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateSolution {
    /// Occupied cells in ascending order.
    pub layout: Vec<u32>,
    /// Placeholder fitness, always zero on the wire.
    pub fitness: f64,
}

/// Payload sent to the evaluation service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// Problem with `numberOfTurbines` matching the candidate size.
    pub problem: Problem,
    /// Candidate layout to score.
    pub solution: CandidateSolution,
}

impl EvaluationRequest {
    /// Builds the request for a candidate placement.
    #[must_use]
    pub fn new(problem: &Problem, candidate: &Placement) -> Self {
        let layout = candidate.to_indices();
        let count = u32::try_from(layout.len()).unwrap_or(u32::MAX);
        Self {
            problem: problem.with_turbine_count(count),
            solution: CandidateSolution {
                layout,
                fitness: 0.0,
            },
        }
    }

    /// Validates the raw payload before it leaves the process.
    pub fn validate(&self) -> Result<(), PlacementError> {
        let cell_count = self.problem.cell_count();
        if self.solution.layout.len() > cell_count as usize {
            return Err(PlacementError::TooMany {
                count: self.solution.layout.len(),
                cell_count,
            });
        }

        let _ = Placement::from_indices(
            self.problem.dimension,
            self.solution.layout.iter().copied(),
        )?;
        Ok(())
    }
}

/// Layout and fitness returned by the solve and evaluate calls.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolutionResponse {
    /// Occupied cells.
    pub layout: Vec<u32>,
    /// Fitness score of the layout.
    pub fitness: f64,
}

impl SolutionResponse {
    /// Converts the response into a validated layout for the given grid.
    pub fn into_layout(self, dimension: u32) -> Result<Layout, PlacementError> {
        let placement = Placement::from_indices(dimension, self.layout)?;
        Ok(Layout::new(placement, Some(self.fitness)))
    }
}

/// Reasons an evaluation could not produce a layout.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EvaluationFailure {
    /// The request failed caller-side validation and was never sent.
    #[error("invalid evaluation request: {0}")]
    InvalidRequest(PlacementError),
    /// The service reported an error while computing fitness.
    #[error("fitness calculation error: {detail}")]
    FitnessCalculation {
        /// Human-readable cause reported by the transport.
        detail: String,
    },
    /// The service could not be reached.
    #[error("transport unavailable: {detail}")]
    TransportUnavailable {
        /// Human-readable cause reported by the transport.
        detail: String,
    },
    /// The service answered with a payload the editor cannot accept.
    #[error("malformed evaluation response: {detail}")]
    MalformedResponse {
        /// Human-readable description of the defect.
        detail: String,
    },
}

/// Wake trapezoid expressed in pixel coordinates.
///
/// Vertices are stored in drawing order: near-left, far-left, far-right,
/// near-right.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WakePolygon {
    vertices: [DVec2; 4],
}

impl WakePolygon {
    /// Creates a wake polygon from its four corners.
    #[must_use]
    pub const fn new(near_left: DVec2, far_left: DVec2, far_right: DVec2, near_right: DVec2) -> Self {
        Self {
            vertices: [near_left, far_left, far_right, near_right],
        }
    }

    /// Vertices in drawing order.
    #[must_use]
    pub const fn vertices(&self) -> &[DVec2; 4] {
        &self.vertices
    }

    /// Corner beside the turbine on the left of the downwind direction.
    #[must_use]
    pub const fn near_left(&self) -> DVec2 {
        self.vertices[0]
    }

    /// Corner at the wake tip on the left of the downwind direction.
    #[must_use]
    pub const fn far_left(&self) -> DVec2 {
        self.vertices[1]
    }

    /// Corner at the wake tip on the right of the downwind direction.
    #[must_use]
    pub const fn far_right(&self) -> DVec2 {
        self.vertices[2]
    }

    /// Corner beside the turbine on the right of the downwind direction.
    #[must_use]
    pub const fn near_right(&self) -> DVec2 {
        self.vertices[3]
    }

    /// Width of the edge at the turbine.
    #[must_use]
    pub fn near_width(&self) -> f64 {
        self.near_left().distance(self.near_right())
    }

    /// Width of the edge at the wake tip.
    #[must_use]
    pub fn far_width(&self) -> f64 {
        self.far_left().distance(self.far_right())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_problem_is_valid() {
        assert_eq!(Problem::default().validate(), Ok(()));
    }

    #[test]
    fn validation_rejects_hub_below_roughness() {
        let problem = Problem {
            hub_height: 0.05,
            ..Problem::default()
        };

        assert!(matches!(
            problem.validate(),
            Err(ProblemError::HubBelowRoughness { .. })
        ));
    }

    #[test]
    fn validation_rejects_non_positive_roughness() {
        let problem = Problem {
            surface_roughness: 0.0,
            ..Problem::default()
        };

        assert!(matches!(
            problem.validate(),
            Err(ProblemError::NonPositive {
                field: "surfaceRoughness",
                ..
            })
        ));
    }

    #[test]
    fn validation_rejects_turbine_count_above_cell_count() {
        let problem = Problem {
            dimension: 3,
            number_of_turbines: 10,
            ..Problem::default()
        };

        assert_eq!(
            problem.validate(),
            Err(ProblemError::TooManyTurbines {
                requested: 10,
                cell_count: 9,
            })
        );
    }

    #[test]
    fn validation_rejects_calm_wind() {
        let mut problem = Problem::default();
        problem.wind_profiles[2].speed = 0.0;

        assert!(matches!(
            problem.validate(),
            Err(ProblemError::InvalidWindProfile { index: 2, .. })
        ));
    }

    #[test]
    fn placement_rejects_out_of_range_and_duplicates() {
        assert_eq!(
            Placement::from_indices(3, [1, 9]),
            Err(PlacementError::OutOfRange {
                index: 9,
                cell_count: 9,
            })
        );
        assert_eq!(
            Placement::from_indices(3, [4, 2, 4]),
            Err(PlacementError::Duplicate { index: 4 })
        );
    }

    #[test]
    fn placement_toggle_adds_then_removes() {
        let mut placement = Placement::empty(4);
        assert_eq!(placement.toggle(CellIndex::new(5)), Ok(true));
        assert!(placement.contains(CellIndex::new(5)));
        assert_eq!(placement.toggle(CellIndex::new(5)), Ok(false));
        assert!(placement.is_empty());
    }

    #[test]
    fn placement_toggle_rejects_cells_outside_grid() {
        let mut placement = Placement::empty(4);
        assert_eq!(
            placement.toggle(CellIndex::new(16)),
            Err(PlacementError::OutOfRange {
                index: 16,
                cell_count: 16,
            })
        );
        assert!(placement.is_empty());
    }

    #[test]
    fn placement_indices_are_sorted() {
        let placement = Placement::from_indices(10, [42, 3, 17]).expect("valid placement");
        assert_eq!(placement.to_indices(), vec![3, 17, 42]);
    }

    #[test]
    fn evaluation_request_overwrites_turbine_count() {
        let problem = Problem::default();
        let candidate = Placement::from_indices(10, [0, 11]).expect("valid placement");
        let request = EvaluationRequest::new(&problem, &candidate);

        assert_eq!(request.problem.number_of_turbines, 2);
        assert_eq!(request.solution.layout, vec![0, 11]);
        assert_eq!(request.solution.fitness, 0.0);
        assert_eq!(request.validate(), Ok(()));
    }

    #[test]
    fn evaluation_request_validation_catches_tampered_payload() {
        let problem = Problem::default();
        let mut request = EvaluationRequest::new(&problem, &Placement::empty(10));
        request.solution.layout = vec![3, 100];

        assert_eq!(
            request.validate(),
            Err(PlacementError::OutOfRange {
                index: 100,
                cell_count: 100,
            })
        );
    }

    #[test]
    fn evaluation_request_uses_camel_case_wire_names() {
        let problem = Problem::default();
        let candidate = Placement::from_indices(10, [0]).expect("valid placement");
        let request = EvaluationRequest::new(&problem, &candidate);
        let json = serde_json::to_value(&request).expect("serialize");

        assert_eq!(json["problem"]["numberOfTurbines"], 1);
        assert_eq!(json["problem"]["surfaceRoughness"], 0.1);
        assert_eq!(json["problem"]["windProfiles"][1]["angle"], 90.0);
        assert_eq!(json["solution"]["layout"], serde_json::json!([0]));
        assert_eq!(json["solution"]["fitness"], 0.0);
    }

    #[test]
    fn solution_response_rejects_layout_outside_grid() {
        let response = SolutionResponse {
            layout: vec![1, 400],
            fitness: 12.5,
        };

        assert!(matches!(
            response.into_layout(10),
            Err(PlacementError::OutOfRange { index: 400, .. })
        ));
    }

    #[test]
    fn evaluation_failures_name_their_cause() {
        let server = EvaluationFailure::FitnessCalculation {
            detail: "status 500".to_owned(),
        };
        let transport = EvaluationFailure::TransportUnavailable {
            detail: "connection refused".to_owned(),
        };

        assert!(server.to_string().starts_with("fitness calculation error"));
        assert!(transport.to_string().starts_with("transport unavailable"));
    }

    #[test]
    fn wind_angle_ninety_points_along_positive_x() {
        let downwind = WindProfile::new(6.7, 90.0).downwind();
        assert!((downwind.x - 1.0).abs() < 1e-12);
        assert!(downwind.y.abs() < 1e-12);
    }

    #[test]
    fn compass_bearing_is_rotated_to_math_angle() {
        let north = WindProfile::new(5.0, 0.0);
        assert!((north.math_angle_radians() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!(north.downwind().x.abs() < 1e-12);
        assert!((north.downwind().y - 1.0).abs() < 1e-12);

        let south = WindProfile::new(5.0, 180.0).downwind();
        assert!(south.x.abs() < 1e-12);
        assert!((south.y + 1.0).abs() < 1e-12);
    }

    #[test]
    fn ticket_sequence_is_monotonic() {
        let first = EvaluationTicket::new(0);
        assert_eq!(first.next(), EvaluationTicket::new(1));
        assert!(first.next() > first);
    }
}
