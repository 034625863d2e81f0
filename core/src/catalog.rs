//! Static connectivity rules for pipes, start pieces and end pieces.
//!
//! Flow is described by its *heading*, the direction it travels. Flow heading
//! right enters the next cell through that cell's left edge, so a pipe
//! accepts it only when one of its two edges is the left edge. The tables
//! below are pure data: every `(heading, shape)` and `(heading, end)` pair
//! has an answer, and a missing connection is what ends a round in a loss.

use crate::{CellTag, DeadEnd, Direction, EndOrientation, FlowDirection, PipeShape};

/// Outcome of offering flow to a neighbouring cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connection {
    /// The cell holds a pipe that carries the flow onward in this state.
    Pipe(FlowDirection),
    /// The cell holds an end piece open toward the flow.
    End,
    /// The cell cannot take the flow.
    Blocked(DeadEnd),
}

/// Flow state a pipe of `shape` adopts when entered by flow heading `heading`,
/// or `None` when the shape has no edge facing the flow.
#[must_use]
pub const fn accept(heading: Direction, shape: PipeShape) -> Option<FlowDirection> {
    match (heading, shape) {
        (Direction::Right, PipeShape::Horizontal) => Some(FlowDirection::LeftToRight),
        (Direction::Right, PipeShape::TopLeft) => Some(FlowDirection::LeftToTop),
        (Direction::Right, PipeShape::BottomLeft) => Some(FlowDirection::LeftToBottom),
        (Direction::Left, PipeShape::Horizontal) => Some(FlowDirection::RightToLeft),
        (Direction::Left, PipeShape::TopRight) => Some(FlowDirection::RightToTop),
        (Direction::Left, PipeShape::BottomRight) => Some(FlowDirection::RightToBottom),
        (Direction::Down, PipeShape::Vertical) => Some(FlowDirection::TopToBottom),
        (Direction::Down, PipeShape::TopLeft) => Some(FlowDirection::TopToLeft),
        (Direction::Down, PipeShape::TopRight) => Some(FlowDirection::TopToRight),
        (Direction::Up, PipeShape::Vertical) => Some(FlowDirection::BottomToTop),
        (Direction::Up, PipeShape::BottomLeft) => Some(FlowDirection::BottomToLeft),
        (Direction::Up, PipeShape::BottomRight) => Some(FlowDirection::BottomToRight),
        _ => None,
    }
}

/// The three shapes that accept flow heading `heading`: the straight pipe
/// followed by the two turns.
#[must_use]
pub const fn compatible_shapes(heading: Direction) -> [PipeShape; 3] {
    match heading {
        Direction::Right => [
            PipeShape::Horizontal,
            PipeShape::TopLeft,
            PipeShape::BottomLeft,
        ],
        Direction::Left => [
            PipeShape::Horizontal,
            PipeShape::TopRight,
            PipeShape::BottomRight,
        ],
        Direction::Down => [PipeShape::Vertical, PipeShape::TopLeft, PipeShape::TopRight],
        Direction::Up => [
            PipeShape::Vertical,
            PipeShape::BottomLeft,
            PipeShape::BottomRight,
        ],
    }
}

/// Reports whether an end piece accepts flow heading `heading`.
///
/// Flow arrives through the edge opposite its heading, so the end must be open
/// on that edge.
#[must_use]
pub const fn end_accepts(end: EndOrientation, heading: Direction) -> bool {
    matches!(
        (end, heading),
        (EndOrientation::Left, Direction::Right)
            | (EndOrientation::Right, Direction::Left)
            | (EndOrientation::Up, Direction::Down)
            | (EndOrientation::Down, Direction::Up)
    )
}

/// Offers flow heading `heading` to a cell carrying `tag`.
#[must_use]
pub const fn connect(heading: Direction, tag: CellTag) -> Connection {
    match tag {
        CellTag::Empty => Connection::Blocked(DeadEnd::EmptyCell),
        CellTag::Pipe(shape) => match accept(heading, shape) {
            Some(flow) => Connection::Pipe(flow),
            None => Connection::Blocked(DeadEnd::Incompatible),
        },
        CellTag::End(end) => {
            if end_accepts(end, heading) {
                Connection::End
            } else {
                Connection::Blocked(DeadEnd::Incompatible)
            }
        }
        CellTag::Start(_) => Connection::Blocked(DeadEnd::Incompatible),
    }
}
