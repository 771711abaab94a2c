//! Record metadata: players, komi, handicap and free-form game properties.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::color::Color;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<String>,
}

impl PlayerInfo {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.rank.is_none()
    }
}

/// Game-level information shared by every record format.
///
/// Properties without a dedicated field are kept in `extra` under their SGF
/// key so they survive conversion between formats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameInfo {
    #[serde(default, skip_serializing_if = "PlayerInfo::is_empty")]
    pub black: PlayerInfo,
    #[serde(default, skip_serializing_if = "PlayerInfo::is_empty")]
    pub white: PlayerInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub komi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handicap: Option<u32>,
    /// `GM` tag; carried through but never interpreted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl GameInfo {
    pub fn player(&self, color: Color) -> &PlayerInfo {
        match color {
            Color::Black => &self.black,
            Color::White => &self.white,
        }
    }

    pub fn player_mut(&mut self, color: Color) -> &mut PlayerInfo {
        match color {
            Color::Black => &mut self.black,
            Color::White => &mut self.white,
        }
    }
}
