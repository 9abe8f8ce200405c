#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for WFLOP layout editor adapters.
//!
//! Scenes are plain data recomposed from session state whenever it changes.
//! Layers are ordered back to front and only the hit surface receives
//! pointer input; every other layer is purely visual.

pub mod svg;

use anyhow::Result as AnyResult;
use glam::DVec2;
use thiserror::Error;
use wflop_editor_core::{
    grid::CanvasConfig, CellIndex, CursorHint, EvaluationFailure, Layout, WakePolygon,
    WindProfile,
};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Creates an opaque color from a packed `0xRRGGBB` value.
    #[must_use]
    pub const fn from_hex(rgb: u32) -> Self {
        Self::from_rgb_u8((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// Returns the same color with a different alpha channel.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }
}

/// Colors and line widths shared by every backend.
pub mod palette {
    use super::Color;

    /// Canvas background.
    pub const BACKGROUND: Color = Color::from_hex(0xf5f5f5);
    /// Wake trapezoid interior.
    pub const WAKE_FILL: Color = Color::from_hex(0xff6b6b).with_alpha(0.2);
    /// Wake trapezoid outline.
    pub const WAKE_STROKE: Color = Color::from_hex(0xff6b6b).with_alpha(0.9);
    /// Width of the wake outline in pixels.
    pub const WAKE_STROKE_WIDTH: f32 = 2.0;
    /// Turbine tower.
    pub const TOWER: Color = Color::from_hex(0x555555);
    /// Turbine hub.
    pub const HUB: Color = Color::from_hex(0x222222);
    /// Turbine blade interior.
    pub const BLADE_FILL: Color = Color::from_hex(0xf8f8f8);
    /// Turbine blade outline.
    pub const BLADE_STROKE: Color = Color::from_hex(0x111111);
    /// Width of the blade outline in pixels.
    pub const BLADE_STROKE_WIDTH: f32 = 2.0;
    /// Grid lines.
    pub const GRID_LINE: Color = Color::from_hex(0xcccccc).with_alpha(0.8);
    /// Width of a grid line in pixels.
    pub const GRID_LINE_WIDTH: f32 = 1.0;
    /// Occupied-cell highlight.
    pub const OCCUPANCY: Color = Color::from_hex(0x90ee90).with_alpha(0.25);
    /// Outline drawn around the hovered cell.
    pub const HOVER: Color = Color::from_hex(0x0066cc).with_alpha(0.6);
    /// Veil drawn over the canvas while an evaluation is outstanding, leaving
    /// the layers underneath at 70% opacity.
    pub const EVALUATING_VEIL: Color = BACKGROUND.with_alpha(0.3);
    /// Status text.
    pub const TEXT: Color = Color::from_hex(0x333333);
    /// Status text reporting a failure.
    pub const ERROR_TEXT: Color = Color::from_hex(0xcc3333);
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Cell the scene's hit surface resolved under the pointer.
    pub hovered: Option<CellIndex>,
    /// Whether the primary button was pressed on this frame.
    pub click: bool,
    /// Zero-based wind profile requested through a number key on this frame.
    pub wind_shortcut: Option<usize>,
}

/// Scene layers in back-to-front drawing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Wake trapezoids.
    Wakes,
    /// Turbine glyphs.
    Turbines,
    /// Grid lines.
    GridLines,
    /// Occupied-cell highlights.
    Occupancy,
    /// Invisible full-canvas pointer target.
    HitSurface,
}

impl Layer {
    /// Every layer in drawing order.
    pub const BACK_TO_FRONT: [Self; 5] = [
        Self::Wakes,
        Self::Turbines,
        Self::GridLines,
        Self::Occupancy,
        Self::HitSurface,
    ];

    /// Reports whether the layer receives pointer input.
    #[must_use]
    pub const fn captures_pointer(self) -> bool {
        matches!(self, Self::HitSurface)
    }

    /// Stable identifier used by exporters.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Wakes => "wakes",
            Self::Turbines => "turbines",
            Self::GridLines => "grid",
            Self::Occupancy => "occupancy",
            Self::HitSurface => "hit-surface",
        }
    }
}

/// Axis-aligned rectangle in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    /// Top-left corner.
    pub origin: DVec2,
    /// Width and height.
    pub size: DVec2,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(origin: DVec2, size: DVec2) -> Self {
        Self { origin, size }
    }
}

/// Straight grid line segment in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLine {
    /// Start of the segment.
    pub from: DVec2,
    /// End of the segment.
    pub to: DVec2,
}

/// Tower, hub and blades drawn for a single turbine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TurbineGlyph {
    /// Cell holding the turbine.
    pub cell: CellIndex,
    /// Tower rectangle hanging below the hub.
    pub tower: Rect,
    /// Centre of the hub.
    pub hub: DVec2,
    /// Radius of the hub.
    pub hub_radius: f64,
    /// Blade quadrilaterals at 0°, 120° and 240°, ordered root-left,
    /// tip-left, tip-right, root-right.
    pub blades: [[DVec2; 4]; 3],
}

impl TurbineGlyph {
    /// Lays out the glyph around the truncated cell centre.
    #[must_use]
    pub fn new(cell: CellIndex, center: DVec2, cell_size: f64) -> Self {
        let size = cell_size * 0.6;
        let tower_height = size * 0.7;
        let tower_width = size * 0.08;
        let blade_length = size * 0.4;
        let half_root = blade_length * 0.2 / 2.0;
        let half_tip = half_root * 0.3;

        let hub = DVec2::new(center.x, center.y - tower_height * 0.2);
        let tower = Rect::new(
            DVec2::new(hub.x - tower_width / 2.0, hub.y),
            DVec2::new(tower_width, tower_height),
        );

        let blades = [0.0_f64, 120.0, 240.0].map(|degrees| {
            let angle = degrees.to_radians();
            let along = DVec2::new(angle.cos(), angle.sin());
            let across = DVec2::new(-angle.sin(), angle.cos());
            let tip = hub + along * blade_length;
            [
                hub + across * half_root,
                tip + across * half_tip,
                tip - across * half_tip,
                hub - across * half_root,
            ]
        });

        Self {
            cell,
            tower,
            hub,
            hub_radius: size * 0.12,
            blades,
        }
    }
}

/// Highlight covering a whole cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellHighlight {
    /// Highlighted cell.
    pub cell: CellIndex,
    /// Truncated pixel bounds of the cell.
    pub bounds: Rect,
}

impl CellHighlight {
    /// Computes the truncated bounds of a cell.
    #[must_use]
    pub fn new(cell: CellIndex, canvas: &CanvasConfig) -> Self {
        let origin = canvas.cell_origin(cell).as_dvec2();
        let side = canvas.cell_size().floor();
        Self {
            cell,
            bounds: Rect::new(origin, DVec2::splat(side)),
        }
    }
}

/// Invisible full-canvas surface that resolves pointer positions into cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitSurface {
    canvas: CanvasConfig,
}

impl HitSurface {
    /// Creates a hit surface covering the canvas.
    #[must_use]
    pub const fn new(canvas: CanvasConfig) -> Self {
        Self { canvas }
    }

    /// Pixel bounds of the surface.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(
            DVec2::ZERO,
            DVec2::splat(f64::from(self.canvas.canvas_size())),
        )
    }

    /// Cell under a canvas-local pointer position, if any.
    #[must_use]
    pub fn cell_at(&self, point: DVec2) -> Option<CellIndex> {
        self.canvas.cell_at(point)
    }
}

/// Session summary displayed next to the canvas.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneStatus {
    /// Fitness of the current layout, if evaluated.
    pub fitness: Option<f64>,
    /// Number of placed turbines.
    pub turbines: usize,
    /// Whether an evaluation is outstanding.
    pub evaluating: bool,
    /// Message of the most recent failed evaluation.
    pub last_failure: Option<String>,
    /// Wind profile used for the wakes.
    pub wind: Option<WindProfile>,
    /// Position of the wind profile within the problem.
    pub wind_index: usize,
    /// Number of wind profiles in the problem.
    pub wind_count: usize,
}

impl SceneStatus {
    /// Records the failure message, if any.
    #[must_use]
    pub fn with_failure(mut self, failure: Option<&EvaluationFailure>) -> Self {
        self.last_failure = failure.map(ToString::to_string);
        self
    }

    /// Status lines in display order.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(4);
        lines.push(match self.fitness {
            Some(fitness) => format!("Fitness: {fitness:.4}"),
            None => "Fitness: not evaluated".to_owned(),
        });
        lines.push(format!("Turbines: {}", self.turbines));
        if let Some(wind) = self.wind {
            lines.push(format!(
                "Wind {}/{}: {:.1} m/s at {:.0}°",
                self.wind_index + 1,
                self.wind_count,
                wind.speed,
                wind.angle
            ));
        }
        if self.evaluating {
            lines.push("Evaluating...".to_owned());
        }
        lines
    }
}

/// Scene description for a single canvas frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Edge length of the square canvas in pixels.
    pub canvas_size: u32,
    /// Wake trapezoids, one per turbine.
    pub wakes: Vec<WakePolygon>,
    /// Turbine glyphs, one per occupied cell.
    pub turbines: Vec<TurbineGlyph>,
    /// Horizontal and vertical grid lines.
    pub grid_lines: Vec<GridLine>,
    /// Highlights over occupied cells.
    pub occupancy: Vec<CellHighlight>,
    /// Pointer target covering the canvas.
    pub hit_surface: HitSurface,
    /// Cell under the pointer.
    pub hovered: Option<CellHighlight>,
    /// Pointer affordance over the hit surface.
    pub cursor: CursorHint,
    /// Session summary.
    pub status: SceneStatus,
}

impl Scene {
    /// Composes the scene for a layout shown on a canvas.
    ///
    /// The result depends only on the arguments, so adapters recompose it
    /// whenever any of them changes.
    pub fn compose(
        canvas: &CanvasConfig,
        layout: &Layout,
        wakes: Vec<WakePolygon>,
        hovered: Option<CellIndex>,
        status: SceneStatus,
    ) -> Result<Self, RenderingError> {
        let placement = layout.placement();
        if placement.dimension() != canvas.dimension() {
            return Err(RenderingError::DimensionMismatch {
                canvas: canvas.dimension(),
                layout: placement.dimension(),
            });
        }

        let turbines = placement
            .iter()
            .map(|cell| {
                TurbineGlyph::new(cell, canvas.cell_center(cell).as_dvec2(), canvas.cell_size())
            })
            .collect();
        let occupancy = placement
            .iter()
            .map(|cell| CellHighlight::new(cell, canvas))
            .collect();

        Ok(Self {
            canvas_size: canvas.canvas_size(),
            wakes,
            turbines,
            grid_lines: grid_lines(canvas),
            occupancy,
            hit_surface: HitSurface::new(*canvas),
            hovered: hovered.map(|cell| CellHighlight::new(cell, canvas)),
            cursor: CursorHint::Default,
            status,
        })
    }

    /// Replaces the pointer affordance.
    #[must_use]
    pub fn with_cursor(mut self, cursor: CursorHint) -> Self {
        self.cursor = cursor;
        self
    }

    /// Resolves a canvas-local pointer position against the pointer-capturing
    /// layers. Adapters route every click through here.
    #[must_use]
    pub fn hit_test(&self, point: DVec2) -> Option<CellIndex> {
        Layer::BACK_TO_FRONT
            .iter()
            .rev()
            .filter(|layer| layer.captures_pointer())
            .find_map(|layer| match layer {
                Layer::HitSurface => self.hit_surface.cell_at(point),
                _ => None,
            })
    }
}

fn grid_lines(canvas: &CanvasConfig) -> Vec<GridLine> {
    let extent = f64::from(canvas.canvas_size());
    let mut lines = Vec::with_capacity(2 * (canvas.dimension() as usize + 1));
    for line in 0..=canvas.dimension() {
        let offset = f64::from(canvas.line_offset(line));
        lines.push(GridLine {
            from: DVec2::new(offset, 0.0),
            to: DVec2::new(offset, extent),
        });
        lines.push(GridLine {
            from: DVec2::new(0.0, offset),
            to: DVec2::new(extent, offset),
        });
    }
    lines
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting editor scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the per-frame pointer
    /// input captured by the adapter and may replace the scene before it is
    /// rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RenderingError {
    /// The layout was built for a different grid than the canvas.
    #[error("layout targets a {layout}x{layout} grid but the canvas shows {canvas}x{canvas}")]
    DimensionMismatch {
        /// Dimension of the canvas grid.
        canvas: u32,
        /// Dimension of the layout grid.
        layout: u32,
    },
}
