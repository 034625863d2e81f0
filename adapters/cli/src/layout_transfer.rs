//! One-line transfer strings for sharing board layouts.
//!
//! A transfer string reads `pipes:v1:<columns>x<rows>:<payload>` where the
//! payload is unpadded base64 over the JSON encoding of the endpoints and
//! pre-placed pipes.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use pipeflow_core::{CellCoord, EndOrientation, GridSize, PipeShape, StartOrientation};
use pipeflow_world::{BoardLayout, LayoutError, MAXIMUM_GRID_EDGE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const TRANSFER_DOMAIN: &str = "pipes";
const TRANSFER_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded layout.
pub(crate) const TRANSFER_HEADER: &str = "pipes:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

#[derive(Debug, Serialize, Deserialize)]
struct LayoutPayload {
    start: (CellCoord, StartOrientation),
    end: (CellCoord, EndOrientation),
    #[serde(default)]
    pipes: Vec<(CellCoord, PipeShape)>,
}

/// Errors raised while encoding or decoding transfer strings.
#[derive(Debug, Error)]
pub(crate) enum LayoutTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("layout string was empty")]
    Empty,
    /// The string ended before all four fields were read.
    #[error("layout string is missing the {0}")]
    MissingField(&'static str),
    /// The string does not start with the `pipes` domain.
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The string uses a version this build cannot read.
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The dimensions field is not `<columns>x<rows>` with numbers between one
    /// and the largest supported grid edge.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The payload is not valid unpadded base64.
    #[error("could not decode layout payload")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload is not the expected JSON document.
    #[error("could not parse layout payload")]
    InvalidPayload(#[source] serde_json::Error),
    /// The decoded pieces do not form a valid board.
    #[error("layout is not a valid board")]
    InvalidLayout(#[from] LayoutError),
}

/// Encodes `layout` into a single-line transfer string.
pub(crate) fn encode(layout: &BoardLayout) -> Result<String, LayoutTransferError> {
    let payload = LayoutPayload {
        start: layout.start(),
        end: layout.end(),
        pipes: layout.pipes().to_vec(),
    };
    let json = serde_json::to_vec(&payload).map_err(LayoutTransferError::InvalidPayload)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    let size = layout.size();
    Ok(format!(
        "{TRANSFER_HEADER}:{}x{}:{encoded}",
        size.columns(),
        size.rows()
    ))
}

/// Decodes and validates a transfer string.
pub(crate) fn decode(value: &str) -> Result<BoardLayout, LayoutTransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LayoutTransferError::Empty);
    }

    let mut parts = trimmed.splitn(4, FIELD_DELIMITER);
    let domain = parts.next().ok_or(LayoutTransferError::MissingField("prefix"))?;
    let version = parts
        .next()
        .ok_or(LayoutTransferError::MissingField("version"))?;
    let dimensions = parts
        .next()
        .ok_or(LayoutTransferError::MissingField("grid dimensions"))?;
    let payload = parts
        .next()
        .ok_or(LayoutTransferError::MissingField("payload"))?;

    if domain != TRANSFER_DOMAIN {
        return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != TRANSFER_VERSION {
        return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
    }

    let size = parse_dimensions(dimensions)?;
    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(LayoutTransferError::InvalidEncoding)?;
    let decoded: LayoutPayload =
        serde_json::from_slice(&bytes).map_err(LayoutTransferError::InvalidPayload)?;

    let layout = decoded
        .pipes
        .into_iter()
        .try_fold(BoardLayout::new(size, decoded.start, decoded.end)?, |layout, (cell, shape)| {
            layout.with_pipe(cell, shape)
        })?;
    Ok(layout)
}

/// Returns whether `value` looks like a transfer string rather than a path or
/// layout text.
pub(crate) fn is_transfer_string(value: &str) -> bool {
    value
        .trim_start()
        .strip_prefix(TRANSFER_HEADER)
        .is_some_and(|rest| rest.starts_with(FIELD_DELIMITER))
}

fn parse_dimensions(dimensions: &str) -> Result<GridSize, LayoutTransferError> {
    let invalid = || LayoutTransferError::InvalidDimensions(dimensions.to_owned());
    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;
    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;
    let in_range = |edge: u32| (1..=MAXIMUM_GRID_EDGE).contains(&edge);
    if !in_range(columns) || !in_range(rows) {
        return Err(invalid());
    }
    Ok(GridSize::new(rows, columns))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORRIDOR: &str = "S> - 7\n. . |\nE> - J\n";

    #[test]
    fn encoded_layout_carries_dimensions_and_decodes_back() {
        let layout: BoardLayout = CORRIDOR.parse().expect("corridor parses");
        let encoded = encode(&layout).expect("layout encodes");
        assert!(encoded.starts_with("pipes:v1:3x3:"), "{encoded}");
        assert!(is_transfer_string(&encoded));

        let decoded = decode(&format!("  {encoded}\n")).expect("layout decodes");
        assert_eq!(decoded, layout);
    }

    #[test]
    fn dimensions_accept_either_separator_case() {
        assert_eq!(
            parse_dimensions("7X4").expect("valid"),
            GridSize::new(4, 7)
        );
        assert!(matches!(
            parse_dimensions("0x4"),
            Err(LayoutTransferError::InvalidDimensions(_))
        ));
        assert!(matches!(
            parse_dimensions("100000x100000"),
            Err(LayoutTransferError::InvalidDimensions(_))
        ));
        assert_eq!(
            parse_dimensions("256x256").expect("largest grid"),
            GridSize::new(256, 256)
        );
        assert!(matches!(
            parse_dimensions("seven"),
            Err(LayoutTransferError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn header_problems_are_reported() {
        assert!(matches!(decode("   "), Err(LayoutTransferError::Empty)));
        assert!(matches!(
            decode("tiles:v1:3x3:abc"),
            Err(LayoutTransferError::InvalidPrefix(prefix)) if prefix == "tiles"
        ));
        assert!(matches!(
            decode("pipes:v2:3x3:abc"),
            Err(LayoutTransferError::UnsupportedVersion(version)) if version == "v2"
        ));
        assert!(matches!(
            decode("pipes:v1:3x3"),
            Err(LayoutTransferError::MissingField("payload"))
        ));
        assert!(matches!(
            decode("pipes:v1:100000x100000:abc"),
            Err(LayoutTransferError::InvalidDimensions(_))
        ));
        assert!(matches!(
            decode("pipes:v1:3x3:%%%"),
            Err(LayoutTransferError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn payload_that_leaves_the_declared_grid_is_rejected() {
        let layout: BoardLayout = CORRIDOR.parse().expect("corridor parses");
        let encoded = encode(&layout).expect("layout encodes");
        let shrunk = encoded.replacen("3x3", "2x2", 1);
        assert!(matches!(
            decode(&shrunk),
            Err(LayoutTransferError::InvalidLayout(_))
        ));
    }

    #[test]
    fn plain_layout_text_is_not_mistaken_for_a_transfer_string() {
        assert!(!is_transfer_string(CORRIDOR));
        assert!(!is_transfer_string("pipes:v10:3x3:abc"));
    }
}
