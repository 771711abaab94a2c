//! Legacy vendor text records (read only, best effort).
//!
//! There is no published grammar for this format. The reader relies on fixed
//! header lines and picks every `PM` move line out of the rest of the text:
//!
//! - line 2: board size
//! - lines 3 and 4: white and black player, `name rank`
//! - line 6: handicap, line 8: komi, line 9: date `YYYYMMDD`
//! - line 11: result sentence
//! - `PM<n><n><B|W><x><y>`: a move, coordinates `B` = 0; anything off the
//!   board is a pass

use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, instrument};

use super::RecordFormat;
use crate::color::Color;
use crate::constants::MAX_SIZE;
use crate::error::RecordError;
use crate::game::{Game, GameConfig};
use crate::info::{GameInfo, PlayerInfo};
use crate::tree::{Move, MoveNode, MoveTree};

const FORMAT: RecordFormat = RecordFormat::Ngf;

fn move_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^PM[A-Za-z]{2}([BW])([A-Za-z])([A-Za-z])").expect("move pattern is valid")
    })
}

fn player_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.*?)\s+(\S+)$").expect("player pattern is valid"))
}

fn result_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(white|black)\s+wins?\b(?:.*?\b(resign|time)|.*?(\d+(?:\.\d+)?)\s*(?:point|pt))?")
            .expect("result pattern is valid")
    })
}

#[instrument(skip_all, fields(len = text.len()))]
pub fn parse(text: &str) -> Result<Game, RecordError> {
    let lines: Vec<&str> = text
        .trim_start_matches('\u{feff}')
        .lines()
        .map(str::trim)
        .collect();
    let line = |n: usize| lines.get(n - 1).copied().unwrap_or("");

    let size: usize = line(2)
        .parse()
        .ok()
        .filter(|n| (1..=MAX_SIZE).contains(n))
        .ok_or_else(|| RecordError::malformed_at(FORMAT, "invalid board size", line(2)))?;

    let mut info = GameInfo {
        white: read_player(line(3)),
        black: read_player(line(4)),
        ..GameInfo::default()
    };
    if !line(1).is_empty() {
        info.game_name = Some(line(1).to_string());
    }
    info.handicap = line(6).parse().ok().filter(|h: &u32| *h > 0);
    info.komi = line(8).parse().ok();
    info.date = read_date(line(9));
    info.result = read_result(line(11));

    let mut tree = MoveTree::default();
    let mut parent = tree.root();
    for caps in move_re().captures_iter(text) {
        let color = if &caps[1] == "B" {
            Color::Black
        } else {
            Color::White
        };
        let mv = match (coord(&caps[2], size), coord(&caps[3], size)) {
            (Some(x), Some(y)) => Move::play(x, y, color),
            _ => Move::pass(color),
        };
        parent = tree.append_child(parent, MoveNode::with_move(mv));
    }
    debug!(size, "Read legacy record");

    Ok(Game::from_tree(tree, info, size, size, GameConfig::default())?)
}

fn coord(letter: &str, size: usize) -> Option<usize> {
    let c = letter.chars().next()?.to_ascii_uppercase();
    let n = (c as usize).checked_sub('B' as usize)?;
    (n < size).then_some(n)
}

fn read_player(line: &str) -> PlayerInfo {
    if line.is_empty() {
        return PlayerInfo::default();
    }
    match player_re().captures(line) {
        Some(caps) => PlayerInfo {
            name: Some(caps[1].to_string()),
            rank: Some(caps[2].to_string()),
        },
        None => PlayerInfo {
            name: Some(line.to_string()),
            rank: None,
        },
    }
}

fn read_date(line: &str) -> Option<String> {
    let digits: String = line.chars().take_while(char::is_ascii_digit).collect();
    (digits.len() >= 8).then(|| format!("{}-{}-{}", &digits[0..4], &digits[4..6], &digits[6..8]))
}

fn read_result(line: &str) -> Option<String> {
    let caps = result_re().captures(line)?;
    let winner = if caps[1].eq_ignore_ascii_case("black") {
        'B'
    } else {
        'W'
    };
    let margin = match (caps.get(2), caps.get(3)) {
        (Some(how), _) if how.as_str().eq_ignore_ascii_case("resign") => "R".to_string(),
        (Some(_), _) => "T".to_string(),
        (None, Some(points)) => points.as_str().to_string(),
        (None, None) => String::new(),
    };
    Some(format!("{winner}+{margin}"))
}
