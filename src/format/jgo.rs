//! Structured-tree JSON records.
//!
//! The layout mirrors the move tree directly:
//!
//! ```json
//! {"size": 19, "info": {...}, "game": [root, node, node, [[node, ...], [node, ...]]]}
//! ```
//!
//! A sequence is a list of node objects; a trailing array of sequences marks
//! a branch point. Single-child chains are written flat.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{instrument, warn};

use super::RecordFormat;
use crate::color::Color;
use crate::constants::{DEFAULT_SIZE, MAX_SIZE};
use crate::error::RecordError;
use crate::game::{Game, GameConfig};
use crate::info::GameInfo;
use crate::position::Markup;
use crate::tree::{MarkupEntry, Move, MoveNode, MoveTree, NodeId, Setup};

const FORMAT: RecordFormat = RecordFormat::Jgo;

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Size {
    Square(usize),
    Rect { width: usize, height: usize },
}

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    size: Option<Size>,
    #[serde(default)]
    info: GameInfo,
    #[serde(default)]
    game: Vec<Entry>,
}

/// One element of a sequence.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Entry {
    Variations(Vec<Vec<Entry>>),
    Node(NodeDto),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct NodeDto {
    #[serde(rename = "move", default, skip_serializing_if = "Option::is_none")]
    mv: Option<MoveDto>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    setup: Vec<StoneDto>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    markup: Vec<MarkupDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    turn: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MoveDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y: Option<usize>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pass: bool,
    c: Color,
}

/// Setup stone; `c` is `1` black, `-1` white, `0` removal.
#[derive(Debug, Serialize, Deserialize)]
struct StoneDto {
    x: usize,
    y: usize,
    c: i8,
}

#[derive(Debug, Serialize, Deserialize)]
struct MarkupDto {
    x: usize,
    y: usize,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

// =============================================================================
// Reading
// =============================================================================

/// Decode a JSON text payload and read it as a record.
pub fn parse(text: &str) -> Result<Game, RecordError> {
    let value: Value = serde_json::from_str(text.trim_start_matches('\u{feff}'))
        .map_err(|e| RecordError::malformed(FORMAT, e.to_string()))?;
    from_value(&value)
}

/// Read an already decoded record. A bare array is taken as the `game` list.
#[instrument(skip_all)]
pub fn from_value(value: &Value) -> Result<Game, RecordError> {
    let record = match value {
        Value::Array(_) => Record {
            size: None,
            info: GameInfo::default(),
            game: Vec::deserialize(value)
                .map_err(|e| RecordError::malformed(FORMAT, e.to_string()))?,
        },
        _ => Record::deserialize(value)
            .map_err(|e| RecordError::malformed(FORMAT, e.to_string()))?,
    };

    let (width, height) = match record.size {
        None => (DEFAULT_SIZE, DEFAULT_SIZE),
        Some(Size::Square(n)) => (n, n),
        Some(Size::Rect { width, height }) => (width, height),
    };
    if !(1..=MAX_SIZE).contains(&width) || !(1..=MAX_SIZE).contains(&height) {
        return Err(RecordError::malformed(
            FORMAT,
            format!("invalid board size {width}x{height}"),
        ));
    }

    let mut entries = record.game.iter();
    let mut tree = match entries.next() {
        None => MoveTree::default(),
        Some(Entry::Node(dto)) => MoveTree::new(to_node(dto)?),
        Some(Entry::Variations(_)) => {
            return Err(RecordError::malformed(FORMAT, "game must start with a root node"));
        }
    };
    let root = tree.root();
    read_sequence(&mut tree, root, entries.as_slice())?;

    Ok(Game::from_tree(tree, record.info, width, height, GameConfig::default())?)
}

fn read_sequence(tree: &mut MoveTree, parent: NodeId, seq: &[Entry]) -> Result<(), RecordError> {
    let mut parent = parent;
    for (i, entry) in seq.iter().enumerate() {
        match entry {
            Entry::Node(dto) => parent = tree.append_child(parent, to_node(dto)?),
            Entry::Variations(branches) => {
                if i + 1 != seq.len() {
                    return Err(RecordError::malformed(
                        FORMAT,
                        "variations must be the last element of a sequence",
                    ));
                }
                for branch in branches {
                    read_sequence(tree, parent, branch)?;
                }
            }
        }
    }
    Ok(())
}

fn to_node(dto: &NodeDto) -> Result<MoveNode, RecordError> {
    let mut node = MoveNode::default();
    node.turn = dto.turn;
    node.comment = dto.comment.clone();
    node.name = dto.name.clone();

    if let Some(mv) = &dto.mv {
        node.mv = Some(match (mv.pass, mv.x, mv.y) {
            (false, Some(x), Some(y)) => Move::play(x, y, mv.c),
            (true, _, _) => Move::pass(mv.c),
            _ => return Err(RecordError::malformed(FORMAT, "move without coordinates")),
        });
    }

    for stone in &dto.setup {
        let color = match stone.c {
            0 => None,
            c => Some(Color::from_sign(c.into()).ok_or_else(|| {
                RecordError::malformed(FORMAT, format!("invalid setup color {c}"))
            })?),
        };
        node.setup.push(Setup {
            x: stone.x,
            y: stone.y,
            color,
        });
    }

    for mark in &dto.markup {
        let markup = match mark.kind.as_str() {
            "LB" => Markup::Label(mark.text.clone().unwrap_or_default()),
            kind => match Markup::from_key(kind) {
                Some(markup) => markup,
                None => {
                    warn!(kind, "Skipping unknown markup type");
                    continue;
                }
            },
        };
        node.markup.push(MarkupEntry {
            x: mark.x,
            y: mark.y,
            markup,
        });
    }

    Ok(node)
}

// =============================================================================
// Writing
// =============================================================================

/// The record as a JSON value.
pub fn to_value(game: &Game) -> Result<Value, RecordError> {
    let size = if game.width() == game.height() {
        Size::Square(game.width())
    } else {
        Size::Rect {
            width: game.width(),
            height: game.height(),
        }
    };
    let record = Record {
        size: Some(size),
        info: game.info().clone(),
        game: write_sequence(game.tree(), game.tree().root()),
    };
    serde_json::to_value(&record).map_err(|e| RecordError::malformed(FORMAT, e.to_string()))
}

/// The record as JSON text.
pub fn serialize(game: &Game) -> Result<String, RecordError> {
    let value = to_value(game)?;
    serde_json::to_string(&value).map_err(|e| RecordError::malformed(FORMAT, e.to_string()))
}

fn write_sequence(tree: &MoveTree, id: NodeId) -> Vec<Entry> {
    let mut seq = Vec::new();
    let mut cur = id;
    loop {
        let node = tree.get(cur);
        seq.push(Entry::Node(from_node(node)));
        match node.children() {
            [] => break,
            [only] => cur = *only,
            many => {
                let branches = many.iter().map(|&child| write_sequence(tree, child)).collect();
                seq.push(Entry::Variations(branches));
                break;
            }
        }
    }
    seq
}

fn from_node(node: &MoveNode) -> NodeDto {
    NodeDto {
        mv: node.mv.map(|mv| match mv.point {
            Some((x, y)) => MoveDto {
                x: Some(x),
                y: Some(y),
                pass: false,
                c: mv.color,
            },
            None => MoveDto {
                x: None,
                y: None,
                pass: true,
                c: mv.color,
            },
        }),
        setup: node
            .setup
            .iter()
            .map(|s| StoneDto {
                x: s.x,
                y: s.y,
                c: s.color.map_or(0, Color::sign),
            })
            .collect(),
        markup: node
            .markup
            .iter()
            .map(|m| MarkupDto {
                x: m.x,
                y: m.y,
                kind: m.markup.key().to_string(),
                text: match &m.markup {
                    Markup::Label(text) => Some(text.clone()),
                    _ => None,
                },
            })
            .collect(),
        turn: node.turn,
        comment: node.comment.clone(),
        name: node.name.clone(),
    }
}
