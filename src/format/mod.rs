//! Conversion between [`Game`] and serialized game records.
//!
//! ## Formats
//!
//! - [`sgf`] - Smart Game Format text records, `(;FF[4]...)`
//! - [`jgo`] - structured-tree JSON records mirroring the move tree
//! - [`ngf`] - legacy vendor text records (read only, best effort)
//!
//! [`load`] picks the parser from the first character of a text payload.

use std::fmt;

use serde_json::Value;

use crate::error::RecordError;
use crate::game::Game;

pub mod jgo;
pub mod ngf;
pub mod sgf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordFormat {
    Sgf,
    Jgo,
    Ngf,
}

impl fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordFormat::Sgf => write!(f, "SGF"),
            RecordFormat::Jgo => write!(f, "JGO"),
            RecordFormat::Ngf => write!(f, "NGF"),
        }
    }
}

/// A record as handed to [`load`]: raw text, or JSON that has already been
/// decoded by the caller.
#[derive(Debug, Clone)]
pub enum RecordInput<'a> {
    Text(&'a str),
    Value(&'a Value),
}

/// Guess the format of a text payload from its first significant character:
/// `(` for SGF, `{` or `[` for JSON, anything else for the legacy format.
pub fn detect(text: &str) -> Option<RecordFormat> {
    let first = text
        .trim_start_matches('\u{feff}')
        .chars()
        .find(|c| !c.is_whitespace())?;
    Some(match first {
        '(' => RecordFormat::Sgf,
        '{' | '[' => RecordFormat::Jgo,
        _ => RecordFormat::Ngf,
    })
}

/// Build a [`Game`] from a record in any supported format.
pub fn load(input: RecordInput<'_>) -> Result<Game, RecordError> {
    match input {
        RecordInput::Value(value) => jgo::from_value(value),
        RecordInput::Text(text) => match detect(text) {
            Some(RecordFormat::Sgf) => sgf::parse(text),
            Some(RecordFormat::Jgo) => jgo::parse(text),
            Some(RecordFormat::Ngf) => ngf::parse(text),
            None => Err(RecordError::Empty),
        },
    }
}

/// Write `game` in `format`. The legacy format cannot be written.
pub fn save(game: &Game, format: RecordFormat) -> Result<String, RecordError> {
    match format {
        RecordFormat::Sgf => Ok(sgf::serialize(game)),
        RecordFormat::Jgo => jgo::serialize(game),
        RecordFormat::Ngf => Err(RecordError::Unsupported(RecordFormat::Ngf)),
    }
}

/// Letter used for coordinate `n`: `a-z` then `A-Z`.
pub fn coord_letter(n: usize) -> Option<char> {
    match n {
        0..=25 => Some((b'a' + n as u8) as char),
        26..=51 => Some((b'A' + (n - 26) as u8) as char),
        _ => None,
    }
}

/// Inverse of [`coord_letter`].
pub fn letter_coord(c: char) -> Option<usize> {
    match c {
        'a'..='z' => Some(c as usize - 'a' as usize),
        'A'..='Z' => Some(c as usize - 'A' as usize + 26),
        _ => None,
    }
}
