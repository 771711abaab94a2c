//! Error types for move validation, navigation and record conversion.

use thiserror::Error;

use crate::format::RecordFormat;

/// Why a move, replay or navigation step was refused.
///
/// Whenever one of these is returned the [`Game`](crate::game::Game) is left
/// exactly as it was before the call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Illegal move: ({x}, {y}) is outside the board")]
    OutOfBounds { x: usize, y: usize },

    #[error("Illegal move: point ({x}, {y}) is not empty")]
    OccupiedPoint { x: usize, y: usize },

    #[error("Illegal move: ({x}, {y}) is suicide")]
    SuicideMove { x: usize, y: usize },

    #[error("Illegal move: ({x}, {y}) repeats an earlier position")]
    RepeatingPosition { x: usize, y: usize },

    #[error("Current node has no continuation")]
    NoNextNode,

    #[error("Current node is the root")]
    NoPreviousNode,

    #[error("Variation {index} does not exist ({available} available)")]
    NoSuchVariation { index: usize, available: usize },

    #[error("No node named {0:?}")]
    NodeNotFound(String),
}

/// Failure to read a game record.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecordError {
    #[error("Malformed {format} record: {message}{}", fragment.as_deref().map(|f| format!(" near {f:?}")).unwrap_or_default())]
    Malformed {
        format: RecordFormat,
        message: String,
        fragment: Option<String>,
    },

    #[error("Empty record")]
    Empty,

    #[error("Unknown {format} property {key}")]
    UnknownProperty { format: RecordFormat, key: String },

    #[error("{0} records cannot be written")]
    Unsupported(RecordFormat),

    #[error("Record cannot be replayed: {0}")]
    Game(#[from] GameError),
}

impl RecordError {
    pub(crate) fn malformed(format: RecordFormat, message: impl Into<String>) -> Self {
        RecordError::Malformed {
            format,
            message: message.into(),
            fragment: None,
        }
    }

    pub(crate) fn malformed_at(
        format: RecordFormat,
        message: impl Into<String>,
        fragment: &str,
    ) -> Self {
        // Fragments are capped at 40 characters.
        let fragment: String = fragment.chars().take(40).collect();
        RecordError::Malformed {
            format,
            message: message.into(),
            fragment: Some(fragment),
        }
    }
}
