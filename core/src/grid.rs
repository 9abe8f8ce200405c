//! Pure transforms between grid indices, world positions and canvas pixels.
//!
//! Hit-testing and rendering both go through [`cell_center_pixel`] and
//! [`cell_from_pixel`], so the sub-pixel truncation applied to cell centres is
//! shared by every consumer. The [`CanvasConfig`] ties the transforms to a
//! concrete viewport.

use glam::{DVec2, UVec2};
use thiserror::Error;

use crate::{CellIndex, Problem};

/// Upper bound on the canvas edge length in pixels.
pub const MAX_CANVAS_SIZE: u32 = 600;

const VIEWPORT_WIDTH_SHARE: f64 = 0.8;
const VIEWPORT_HEIGHT_SHARE: f64 = 0.6;

/// Row and column of a grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCoord {
    row: u32,
    column: u32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }
}

/// Flattens a grid coordinate into a cell index, `row · N + column`.
#[must_use]
pub const fn cell_index(coord: GridCoord, dimension: u32) -> CellIndex {
    CellIndex::new(coord.row * dimension + coord.column)
}

/// Expands a cell index into its grid coordinate.
///
/// # Panics
///
/// Panics if `dimension` is zero.
#[must_use]
pub const fn grid_coord(index: CellIndex, dimension: u32) -> GridCoord {
    GridCoord::new(index.get() / dimension, index.get() % dimension)
}

/// Pixel centre of a cell, truncated to whole pixels.
#[must_use]
pub fn cell_center_pixel(coord: GridCoord, cell_size: f64) -> UVec2 {
    let half = cell_size / 2.0;
    let x = (f64::from(coord.column) * cell_size + half).floor();
    let y = (f64::from(coord.row) * cell_size + half).floor();
    UVec2::new(x as u32, y as u32)
}

/// Centre of a cell in world units.
///
/// # Panics
///
/// Panics if `dimension` is zero.
#[must_use]
pub fn world_position(index: CellIndex, dimension: u32, grid_width: f64) -> DVec2 {
    let coord = grid_coord(index, dimension);
    DVec2::new(
        (f64::from(coord.column) + 0.5) * grid_width,
        (f64::from(coord.row) + 0.5) * grid_width,
    )
}

/// Scales a world position into pixel space.
#[must_use]
pub fn pixel_from_world(position: DVec2, scale_factor: f64) -> DVec2 {
    position * scale_factor
}

/// Resolves the cell under a pixel position.
///
/// Returns `None` when the point lies outside the grid or the cell size is
/// degenerate.
#[must_use]
pub fn cell_from_pixel(point: DVec2, cell_size: f64, dimension: u32) -> Option<GridCoord> {
    if !cell_size.is_finite() || cell_size <= 0.0 || !point.is_finite() {
        return None;
    }

    let column = (point.x / cell_size).floor();
    let row = (point.y / cell_size).floor();
    let limit = f64::from(dimension);
    if column < 0.0 || row < 0.0 || column >= limit || row >= limit {
        return None;
    }

    Some(GridCoord::new(row as u32, column as u32))
}

/// Size of the surface hosting the canvas, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Available width in pixels.
    pub width: f64,
    /// Available height in pixels.
    pub height: f64,
}

impl Viewport {
    /// Creates a new viewport descriptor.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Largest canvas edge that fits the viewport, capped at [`MAX_CANVAS_SIZE`].
    #[must_use]
    pub fn canvas_size(&self) -> u32 {
        let bound = f64::from(MAX_CANVAS_SIZE)
            .min(self.width * VIEWPORT_WIDTH_SHARE)
            .min(self.height * VIEWPORT_HEIGHT_SHARE);
        if bound.is_nan() || bound <= 0.0 {
            0
        } else {
            bound.floor() as u32
        }
    }
}

/// Pixel-space layout parameters derived from the grid and the viewport.
///
/// Instances are recomputed whenever an input changes and never mutated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasConfig {
    dimension: u32,
    grid_width: f64,
    canvas_size: u32,
    cell_size: f64,
    scale_factor: f64,
}

impl CanvasConfig {
    /// Derives the canvas configuration for a grid shown inside a viewport.
    pub fn new(dimension: u32, grid_width: f64, viewport: Viewport) -> Result<Self, CanvasError> {
        if dimension == 0 {
            return Err(CanvasError::ZeroDimension);
        }
        if !grid_width.is_finite() || grid_width <= 0.0 {
            return Err(CanvasError::InvalidGridWidth { grid_width });
        }

        let canvas_size = viewport.canvas_size();
        if canvas_size < dimension {
            return Err(CanvasError::ViewportTooSmall {
                canvas_size,
                dimension,
            });
        }

        let cell_size = f64::from(canvas_size) / f64::from(dimension);
        Ok(Self {
            dimension,
            grid_width,
            canvas_size,
            cell_size,
            scale_factor: cell_size / grid_width,
        })
    }

    /// Derives the canvas configuration for a problem definition.
    pub fn for_problem(problem: &Problem, viewport: Viewport) -> Result<Self, CanvasError> {
        Self::new(problem.dimension, problem.grid_width, viewport)
    }

    /// Number of cells along each side of the grid.
    #[must_use]
    pub const fn dimension(&self) -> u32 {
        self.dimension
    }

    /// Physical width of a grid cell in world units.
    #[must_use]
    pub const fn grid_width(&self) -> f64 {
        self.grid_width
    }

    /// Edge length of the square canvas in whole pixels.
    #[must_use]
    pub const fn canvas_size(&self) -> u32 {
        self.canvas_size
    }

    /// Edge length of a single cell in pixels.
    #[must_use]
    pub const fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Factor converting world-unit lengths into pixel lengths.
    #[must_use]
    pub const fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Truncated pixel centre of the cell, shared by glyphs and hit-testing.
    #[must_use]
    pub fn cell_center(&self, index: CellIndex) -> UVec2 {
        cell_center_pixel(grid_coord(index, self.dimension), self.cell_size)
    }

    /// Un-truncated pixel position of the cell's world centre.
    #[must_use]
    pub fn world_center(&self, index: CellIndex) -> DVec2 {
        pixel_from_world(
            world_position(index, self.dimension, self.grid_width),
            self.scale_factor,
        )
    }

    /// Cell under the pixel position, if any.
    #[must_use]
    pub fn cell_at(&self, point: DVec2) -> Option<CellIndex> {
        cell_from_pixel(point, self.cell_size, self.dimension)
            .map(|coord| cell_index(coord, self.dimension))
    }

    /// Top-left pixel corner of the cell, truncated to whole pixels.
    #[must_use]
    pub fn cell_origin(&self, index: CellIndex) -> UVec2 {
        let coord = grid_coord(index, self.dimension);
        UVec2::new(
            self.line_offset(coord.column()),
            self.line_offset(coord.row()),
        )
    }

    /// Pixel offset of the `line`-th grid boundary, truncated to whole pixels.
    ///
    /// The closing boundary always lands on the canvas edge.
    #[must_use]
    pub fn line_offset(&self, line: u32) -> u32 {
        if line >= self.dimension {
            return self.canvas_size;
        }
        (f64::from(line) * self.cell_size).floor() as u32
    }
}

/// Reasons a canvas configuration cannot be derived.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CanvasError {
    /// The grid has no cells.
    #[error("grid dimension must be positive")]
    ZeroDimension,
    /// The physical cell width is not a positive finite number.
    #[error("grid width must be a positive finite number (received {grid_width})")]
    InvalidGridWidth {
        /// Width that failed validation.
        grid_width: f64,
    },
    /// The viewport cannot give every cell at least one pixel.
    #[error("a {canvas_size}px canvas cannot show a {dimension}x{dimension} grid")]
    ViewportTooSmall {
        /// Canvas size derived from the viewport.
        canvas_size: u32,
        /// Grid dimension that was requested.
        dimension: u32,
    },
}
