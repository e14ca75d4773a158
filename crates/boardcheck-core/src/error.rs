use thiserror::Error;

use crate::board::{ItemRef, NetCode};
use crate::geometry::Point;

/// Structural problems found while validating a board model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoardError {
    #[error("{item} refers to unknown net code {code}")]
    UnknownNet { item: ItemRef, code: NetCode },

    #[error("net '{net}' uses unknown netclass '{netclass}'")]
    UnknownNetClass { net: String, netclass: String },

    #[error("net code {0} is declared more than once")]
    DuplicateNetCode(NetCode),

    #[error("{0} does not exist on this board")]
    MissingItem(ItemRef),

    #[error("{item} is on layer {layer}, which does not exist")]
    InvalidLayer { item: ItemRef, layer: u32 },

    #[error("{item} has a negative size")]
    NegativeSize { item: ItemRef },
}

/// Why a set of graphic items could not be chained into closed polygons.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonizeError {
    #[error("no closed shapes were found")]
    Empty,

    #[error("outline is not closed: open end at ({}, {})", at.x, at.y)]
    OpenChain { at: Point },

    #[error("outline encloses no area near ({}, {})", at.x, at.y)]
    Degenerate { at: Point },
}

impl PolygonizeError {
    /// Where the failure was detected, if anywhere in particular.
    pub fn location(&self) -> Option<Point> {
        match self {
            PolygonizeError::Empty => None,
            PolygonizeError::OpenChain { at } | PolygonizeError::Degenerate { at } => Some(*at),
        }
    }
}
