use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wflop_editor_core::{Layout, Placement, PlacementError, Problem};

const SHARE_DOMAIN: &str = "wflop";
const SHARE_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded layout payload.
pub(crate) const SHARE_HEADER: &str = "wflop:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Layout captured together with the grid it was placed on.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LayoutShare {
    /// Number of cells along each side of the grid.
    pub(crate) dimension: u32,
    /// Physical width of a grid cell.
    pub(crate) grid_width: f64,
    /// Occupied cells in ascending order.
    pub(crate) layout: Vec<u32>,
    /// Fitness reported for the layout, if it was evaluated.
    pub(crate) fitness: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SharePayload {
    grid_width: f64,
    layout: Vec<u32>,
    fitness: Option<f64>,
}

impl LayoutShare {
    /// Captures the layout edited for a problem.
    pub(crate) fn capture(problem: &Problem, layout: &Layout) -> Self {
        Self {
            dimension: problem.dimension,
            grid_width: problem.grid_width,
            layout: layout.placement().to_indices(),
            fitness: layout.fitness(),
        }
    }

    /// Encodes the layout into a single-line string suitable for clipboard transfer.
    pub(crate) fn encode(&self) -> Result<String, LayoutTransferError> {
        let payload = SharePayload {
            grid_width: self.grid_width,
            layout: self.layout.clone(),
            fitness: self.fitness,
        };
        let json = serde_json::to_vec(&payload).map_err(LayoutTransferError::InvalidPayload)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!("{SHARE_HEADER}:{0}x{0}:{encoded}", self.dimension))
    }

    /// Decodes a layout from its string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, LayoutTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LayoutTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LayoutTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(LayoutTransferError::MissingVersion)?;
        let dimensions = parts.next().ok_or(LayoutTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(LayoutTransferError::MissingPayload)?;
        if let Some(extra) = parts.next() {
            return Err(LayoutTransferError::UnexpectedSegment(extra.to_owned()));
        }

        if domain != SHARE_DOMAIN {
            return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SHARE_VERSION {
            return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
        }

        let dimension = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(LayoutTransferError::InvalidEncoding)?;
        let decoded: SharePayload =
            serde_json::from_slice(&bytes).map_err(LayoutTransferError::InvalidPayload)?;

        Ok(Self {
            dimension,
            grid_width: decoded.grid_width,
            layout: decoded.layout,
            fitness: decoded.fitness,
        })
    }

    /// Converts the share into a layout for `problem`, validating every cell.
    pub(crate) fn into_layout(self, problem: &Problem) -> Result<Layout, LayoutTransferError> {
        if self.dimension != problem.dimension {
            return Err(LayoutTransferError::GridMismatch {
                shared: self.dimension,
                expected: problem.dimension,
            });
        }
        if self.grid_width != problem.grid_width {
            return Err(LayoutTransferError::GridWidthMismatch {
                shared: self.grid_width,
                expected: problem.grid_width,
            });
        }
        let placement = Placement::from_indices(self.dimension, self.layout)?;
        Ok(Layout::new(placement, self.fitness))
    }
}

/// Errors that can occur while decoding layout share strings.
#[derive(Debug, Error)]
pub(crate) enum LayoutTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("layout string was empty")]
    EmptyPayload,
    /// The prefix segment was missing.
    #[error("layout string is missing the prefix")]
    MissingPrefix,
    /// The version segment was missing.
    #[error("layout string is missing the version")]
    MissingVersion,
    /// The grid dimensions were missing.
    #[error("layout string is missing the grid dimensions")]
    MissingDimensions,
    /// The payload segment was missing.
    #[error("layout string is missing the payload")]
    MissingPayload,
    /// Another segment followed the payload.
    #[error("layout string has an unexpected segment '{0}' after the payload")]
    UnexpectedSegment(String),
    /// The prefix segment named another format.
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The version identifier is not understood.
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed or describe a non-square grid.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode layout payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be (de)serialised.
    #[error("could not parse layout payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
    /// The layout was shared for a grid of another size.
    #[error("layout targets a {shared}x{shared} grid but the problem uses {expected}x{expected}")]
    GridMismatch {
        /// Dimension recorded in the share string.
        shared: u32,
        /// Dimension of the active problem.
        expected: u32,
    },
    /// The layout was shared for cells of another physical width.
    #[error("layout targets a grid width of {shared} but the problem uses {expected}")]
    GridWidthMismatch {
        /// Grid width recorded in the share string.
        shared: f64,
        /// Grid width of the active problem.
        expected: f64,
    },
    /// The shared cells do not form a valid placement.
    #[error("shared layout is invalid: {0}")]
    InvalidLayout(#[from] PlacementError),
}

fn parse_dimensions(dimensions: &str) -> Result<u32, LayoutTransferError> {
    let invalid = || LayoutTransferError::InvalidDimensions(dimensions.to_owned());
    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;

    if columns == 0 || columns != rows {
        return Err(invalid());
    }

    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn share(layout: Vec<u32>, fitness: Option<f64>) -> LayoutShare {
        LayoutShare {
            dimension: 10,
            grid_width: 200.0,
            layout,
            fitness,
        }
    }

    #[test]
    fn round_trip_empty_layout() {
        let share = share(Vec::new(), None);

        let encoded = share.encode().expect("share encodes");
        assert!(encoded.starts_with(&format!("{SHARE_HEADER}:10x10:")));

        let decoded = LayoutShare::decode(&encoded).expect("share decodes");
        assert_eq!(share, decoded);
    }

    #[test]
    fn captured_layout_restores_into_problem() {
        let problem = Problem::default();
        let layout = Layout::new(
            Placement::from_indices(10, [3, 17, 42]).expect("placement"),
            Some(1234.5),
        );

        let encoded = LayoutShare::capture(&problem, &layout)
            .encode()
            .expect("share encodes");
        let restored = LayoutShare::decode(&encoded)
            .expect("share decodes")
            .into_layout(&problem)
            .expect("layout fits");

        assert_eq!(restored, layout);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let encoded = share(vec![1], Some(2.0)).encode().expect("share encodes");

        let decoded = LayoutShare::decode(&format!("  {encoded}\n")).expect("share decodes");
        assert_eq!(decoded.layout, vec![1]);
    }

    #[test]
    fn malformed_segments_are_reported() {
        assert!(matches!(
            LayoutShare::decode("   "),
            Err(LayoutTransferError::EmptyPayload)
        ));
        assert!(matches!(
            LayoutShare::decode("wflop"),
            Err(LayoutTransferError::MissingVersion)
        ));
        assert!(matches!(
            LayoutShare::decode("wflop:v1"),
            Err(LayoutTransferError::MissingDimensions)
        ));
        assert!(matches!(
            LayoutShare::decode("wflop:v1:10x10"),
            Err(LayoutTransferError::MissingPayload)
        ));
        assert!(matches!(
            LayoutShare::decode("maze:v1:10x10:e30"),
            Err(LayoutTransferError::InvalidPrefix(prefix)) if prefix == "maze"
        ));
        assert!(matches!(
            LayoutShare::decode("wflop:v2:10x10:e30"),
            Err(LayoutTransferError::UnsupportedVersion(version)) if version == "v2"
        ));
        assert!(matches!(
            LayoutShare::decode("wflop:v1:10x8:e30"),
            Err(LayoutTransferError::InvalidDimensions(_))
        ));
        assert!(matches!(
            LayoutShare::decode("wflop:v1:10x10:***"),
            Err(LayoutTransferError::InvalidEncoding(_))
        ));
        assert!(matches!(
            LayoutShare::decode("wflop:v1:10x10:e30"),
            Err(LayoutTransferError::InvalidPayload(_))
        ));
    }

    #[test]
    fn layout_for_another_grid_is_rejected() {
        let share = LayoutShare {
            dimension: 6,
            ..share(vec![0], None)
        };

        assert!(matches!(
            share.into_layout(&Problem::default()),
            Err(LayoutTransferError::GridMismatch {
                shared: 6,
                expected: 10
            })
        ));
    }

    #[test]
    fn trailing_segments_are_rejected() {
        let encoded = share(vec![1], None).encode().expect("share encodes");

        assert!(matches!(
            LayoutShare::decode(&format!("{encoded}:extra")),
            Err(LayoutTransferError::UnexpectedSegment(segment)) if segment == "extra"
        ));
        assert!(matches!(
            LayoutShare::decode(&format!("{encoded}:")),
            Err(LayoutTransferError::UnexpectedSegment(segment)) if segment.is_empty()
        ));
    }

    #[test]
    fn layout_for_another_grid_width_is_rejected() {
        let share = LayoutShare {
            grid_width: 150.0,
            ..share(vec![0], None)
        };

        let error = share
            .into_layout(&Problem::default())
            .expect_err("grid width differs");
        assert!(matches!(
            error,
            LayoutTransferError::GridWidthMismatch { shared, expected }
                if shared == 150.0 && expected == 200.0
        ));
        assert_eq!(
            error.to_string(),
            "layout targets a grid width of 150 but the problem uses 200"
        );
    }

    #[test]
    fn out_of_range_cells_are_rejected() {
        let share = share(vec![100], None);

        assert!(matches!(
            share.into_layout(&Problem::default()),
            Err(LayoutTransferError::InvalidLayout(PlacementError::OutOfRange { .. }))
        ));
    }
}
