#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that derives wake trapezoids from turbine positions and wind.
//!
//! Each turbine produces one independent linearly expanding cone. The cone
//! starts at the rotor radius beside the turbine and widens by the
//! entrainment constant per pixel of wake length.

use glam::DVec2;
use wflop_editor_core::{
    grid::CanvasConfig, Placement, Problem, ProblemError, WakePolygon, WindProfile,
};

/// Wake length expressed as a multiple of the canvas edge.
pub const WAKE_LENGTH_FACTOR: f64 = 1.2;

/// Linear wake expansion rate, `0.5 / ln(hub_height / surface_roughness)`.
///
/// The result is negative or not finite unless
/// `hub_height > surface_roughness > 0`; [`WakeModel::from_problem`] rejects
/// such problems before the constant is computed.
#[must_use]
pub fn entrainment_constant(hub_height: f64, surface_roughness: f64) -> f64 {
    0.5 / (hub_height / surface_roughness).ln()
}

/// World-unit wake parameters extracted from a validated problem.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WakeModel {
    rotor_radius: f64,
    entrainment: f64,
}

impl WakeModel {
    /// Builds the wake model for a problem, validating it first.
    pub fn from_problem(problem: &Problem) -> Result<Self, ProblemError> {
        problem.validate()?;
        Ok(Self {
            rotor_radius: problem.rotor_radius,
            entrainment: entrainment_constant(problem.hub_height, problem.surface_roughness),
        })
    }

    /// Rotor radius in world units.
    #[must_use]
    pub const fn rotor_radius(&self) -> f64 {
        self.rotor_radius
    }

    /// Entrainment constant of the model.
    #[must_use]
    pub const fn entrainment(&self) -> f64 {
        self.entrainment
    }

    /// Wake length in pixels for the canvas.
    #[must_use]
    pub fn wake_length(canvas: &CanvasConfig) -> f64 {
        f64::from(canvas.canvas_size()) * WAKE_LENGTH_FACTOR
    }

    /// Half-width of the wake at the turbine, in pixels.
    #[must_use]
    pub fn near_radius(&self, canvas: &CanvasConfig) -> f64 {
        self.rotor_radius * canvas.scale_factor()
    }

    /// Half-width of the wake at its tip, in pixels.
    #[must_use]
    pub fn far_radius(&self, canvas: &CanvasConfig) -> f64 {
        self.near_radius(canvas)
            + self.entrainment * canvas.scale_factor() * Self::wake_length(canvas)
    }

    /// Trapezoid cast downwind from a turbine at `origin`.
    #[must_use]
    pub fn wake_polygon(
        &self,
        origin: DVec2,
        wind: &WindProfile,
        canvas: &CanvasConfig,
    ) -> WakePolygon {
        let direction = wind.downwind();
        let perpendicular = DVec2::new(-direction.y, direction.x);
        let tip = origin + direction * Self::wake_length(canvas);
        let near = perpendicular * self.near_radius(canvas);
        let far = perpendicular * self.far_radius(canvas);

        WakePolygon::new(origin + near, tip + far, tip - far, origin - near)
    }

    /// Computes one wake per occupied cell, in ascending cell order.
    ///
    /// The output buffer is cleared before populating it.
    pub fn project(
        &self,
        placement: &Placement,
        wind: &WindProfile,
        canvas: &CanvasConfig,
        out: &mut Vec<WakePolygon>,
    ) {
        out.clear();
        out.reserve(placement.len());
        for cell in placement.iter() {
            out.push(self.wake_polygon(canvas.world_center(cell), wind, canvas));
        }
    }
}
