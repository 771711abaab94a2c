//! Smart Game Format (SGF, FF[4]) reader and writer.
//!
//! The reader tokenizes the whole record with one regular expression into
//! `(`, `)` and node chunks, rebuilding variations with a stack of parent
//! nodes. Each node chunk is split into `KEY[value][value]...` groups that
//! are dispatched on [`Property`]. Unknown keys are logged and skipped unless
//! parsing strictly.

use std::fmt::{self, Write};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, instrument, warn};

use super::{RecordFormat, coord_letter, letter_coord};
use crate::color::Color;
use crate::constants::{DEFAULT_SIZE, MAX_SIZE, TT_PASS_MAX_SIZE};
use crate::error::RecordError;
use crate::game::{Game, GameConfig};
use crate::info::GameInfo;
use crate::position::{Markup, Point};
use crate::tree::{MarkupEntry, Move, MoveNode, MoveTree, NodeId, Setup};

const FORMAT: RecordFormat = RecordFormat::Sgf;

/// Root properties kept verbatim in [`GameInfo::extra`].
const INFO_KEYS: &[&str] = &[
    "AN", "AP", "BT", "CP", "GC", "ON", "OT", "RO", "SO", "TM", "US", "WT",
];

/// Known properties this reader has no use for.
const IGNORED_KEYS: &[&str] = &[
    "AR", "BL", "BM", "CA", "DM", "DO", "FF", "FG", "GB", "GW", "HO", "IT", "KO", "LN", "MN",
    "OB", "OW", "PM", "ST", "TE", "UC", "V", "VW", "WL",
];

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)\(|\)|;(?:\s*[A-Za-z]+(?:\s*\[(?:[^\]\\]|\\.)*\])+)*")
            .expect("SGF token pattern is valid")
    })
}

fn property_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)([A-Za-z]+)((?:\s*\[(?:[^\]\\]|\\.)*\])+)")
            .expect("SGF property pattern is valid")
    })
}

fn value_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)\[((?:[^\]\\]|\\.)*)\]").expect("SGF value pattern is valid")
    })
}

/// What a property key means.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Property {
    Move(Color),
    Setup(Option<Color>),
    Turn,
    Comment,
    NodeName,
    Markup(Markup),
    Label,
    Size,
    Komi,
    Handicap,
    PlayerName(Color),
    PlayerRank(Color),
    GameType,
    Date,
    Result,
    GameName,
    Event,
    Place,
    Rules,
    Info(String),
    Ignored,
    Unknown,
}

impl Property {
    fn classify(key: &str) -> Self {
        match key {
            "B" => Property::Move(Color::Black),
            "W" => Property::Move(Color::White),
            "AB" => Property::Setup(Some(Color::Black)),
            "AW" => Property::Setup(Some(Color::White)),
            "AE" => Property::Setup(None),
            "PL" => Property::Turn,
            "C" => Property::Comment,
            "N" => Property::NodeName,
            "LB" => Property::Label,
            "SZ" => Property::Size,
            "KM" => Property::Komi,
            "HA" => Property::Handicap,
            "PB" => Property::PlayerName(Color::Black),
            "PW" => Property::PlayerName(Color::White),
            "BR" => Property::PlayerRank(Color::Black),
            "WR" => Property::PlayerRank(Color::White),
            "GM" => Property::GameType,
            "DT" => Property::Date,
            "RE" => Property::Result,
            "GN" => Property::GameName,
            "EV" => Property::Event,
            "PC" => Property::Place,
            "RU" => Property::Rules,
            _ => {
                if let Some(markup) = Markup::from_key(key) {
                    Property::Markup(markup)
                } else if INFO_KEYS.contains(&key) {
                    Property::Info(key.to_string())
                } else if IGNORED_KEYS.contains(&key) {
                    Property::Ignored
                } else {
                    Property::Unknown
                }
            }
        }
    }
}

/// Read an SGF record. Unknown properties are skipped with a warning.
pub fn parse(text: &str) -> Result<Game, RecordError> {
    Reader::new(false).read(text)
}

/// Read an SGF record, failing on the first unknown property.
pub fn parse_strict(text: &str) -> Result<Game, RecordError> {
    Reader::new(true).read(text)
}

struct Reader {
    strict: bool,
    tree: MoveTree,
    info: GameInfo,
    width: usize,
    height: usize,
}

impl Reader {
    fn new(strict: bool) -> Self {
        Self {
            strict,
            tree: MoveTree::default(),
            info: GameInfo::default(),
            width: DEFAULT_SIZE,
            height: DEFAULT_SIZE,
        }
    }

    #[instrument(skip_all, fields(len = text.len(), strict = self.strict))]
    fn read(mut self, text: &str) -> Result<Game, RecordError> {
        let mut stack: Vec<Option<NodeId>> = Vec::new();
        let mut current: Option<NodeId> = None;
        let mut opened = false;
        let mut last_end = 0;

        for token in token_re().find_iter(text) {
            let skipped = text[last_end..token.start()].trim();
            if !skipped.is_empty() {
                if !opened {
                    return Err(RecordError::malformed_at(
                        FORMAT,
                        "record must start with '('",
                        skipped,
                    ));
                }
                warn!(fragment = %skipped.chars().take(40).collect::<String>(), "Skipping unreadable SGF text");
            }
            last_end = token.end();

            match token.as_str() {
                "(" => {
                    if opened && stack.is_empty() {
                        debug!("Ignoring further game trees in collection");
                        break;
                    }
                    opened = true;
                    stack.push(current);
                }
                ")" => match stack.pop() {
                    Some(parent) => current = parent,
                    None => {
                        return Err(RecordError::malformed_at(
                            FORMAT,
                            "unbalanced ')'",
                            &text[token.start()..],
                        ));
                    }
                },
                chunk => {
                    if !opened {
                        return Err(RecordError::malformed_at(
                            FORMAT,
                            "record must start with '('",
                            chunk,
                        ));
                    }
                    let id = match current {
                        None => self.tree.root(),
                        Some(parent) => self.tree.append_child(parent, MoveNode::default()),
                    };
                    current = Some(id);
                    self.read_node(id, &chunk[1..])?;
                }
            }
        }

        if !opened {
            return Err(RecordError::malformed(FORMAT, "no game tree found"));
        }
        if !stack.is_empty() {
            warn!(open = stack.len(), "SGF record ends inside a game tree");
        }
        let game = Game::from_tree(
            self.tree,
            self.info,
            self.width,
            self.height,
            GameConfig::default(),
        )?;
        Ok(game)
    }

    fn read_node(&mut self, id: NodeId, chunk: &str) -> Result<(), RecordError> {
        for caps in property_re().captures_iter(chunk) {
            // FF[3] allowed lowercase letters in keys; only capitals count.
            let key: String = caps[1].chars().filter(char::is_ascii_uppercase).collect();
            let values: Vec<String> = value_re()
                .captures_iter(&caps[2])
                .map(|v| unescape(&v[1]))
                .collect();
            self.apply(id, &key, &values)?;
        }
        Ok(())
    }

    fn apply(&mut self, id: NodeId, key: &str, values: &[String]) -> Result<(), RecordError> {
        let first = values.first().map(String::as_str).unwrap_or("");
        match Property::classify(key) {
            Property::Move(color) => {
                let mv = if first.is_empty() || (first == "tt" && self.tt_is_pass()) {
                    Some(Move::pass(color))
                } else {
                    self.point(first).map(|(x, y)| Move::play(x, y, color))
                };
                match mv {
                    Some(mv) => self.tree.get_mut(id).mv = Some(mv),
                    None => warn!(key, value = first, "Skipping move with bad coordinates"),
                }
            }
            Property::Setup(color) => {
                let points: Vec<Point> = values.iter().flat_map(|v| self.points(v)).collect();
                let node = self.tree.get_mut(id);
                node.setup
                    .extend(points.into_iter().map(|(x, y)| Setup { x, y, color }));
            }
            Property::Turn => match first.chars().next().and_then(Color::from_letter) {
                Some(color) => self.tree.get_mut(id).turn = Some(color),
                None => warn!(value = first, "Skipping bad PL value"),
            },
            Property::Comment => self.tree.get_mut(id).comment = Some(first.to_string()),
            Property::NodeName => self.tree.get_mut(id).name = Some(first.to_string()),
            Property::Markup(markup) => {
                let points: Vec<Point> = values.iter().flat_map(|v| self.points(v)).collect();
                let node = self.tree.get_mut(id);
                node.markup.extend(points.into_iter().map(|(x, y)| MarkupEntry {
                    x,
                    y,
                    markup: markup.clone(),
                }));
            }
            Property::Label => {
                for value in values {
                    let (point, text) = value.split_once(':').unwrap_or((value.as_str(), ""));
                    match self.point(point) {
                        Some((x, y)) => self.tree.get_mut(id).markup.push(MarkupEntry {
                            x,
                            y,
                            markup: Markup::Label(text.to_string()),
                        }),
                        None => warn!(value = %value, "Skipping label with bad coordinates"),
                    }
                }
            }
            Property::Size => {
                let (w, h) = first.split_once(':').unwrap_or((first, first));
                match (w.trim().parse::<usize>(), h.trim().parse::<usize>()) {
                    (Ok(w), Ok(h)) if (1..=MAX_SIZE).contains(&w) && (1..=MAX_SIZE).contains(&h) => {
                        self.width = w;
                        self.height = h;
                    }
                    _ => {
                        return Err(RecordError::malformed_at(FORMAT, "invalid board size", first));
                    }
                }
            }
            Property::Komi => match first.trim().parse::<f64>() {
                Ok(komi) => self.info.komi = Some(komi),
                Err(_) => warn!(value = first, "Skipping bad KM value"),
            },
            Property::Handicap => match first.trim().parse::<u32>() {
                Ok(handicap) => self.info.handicap = Some(handicap),
                Err(_) => warn!(value = first, "Skipping bad HA value"),
            },
            Property::PlayerName(color) => {
                self.info.player_mut(color).name = Some(first.to_string());
            }
            Property::PlayerRank(color) => {
                self.info.player_mut(color).rank = Some(first.to_string());
            }
            Property::GameType => self.info.game_type = Some(first.to_string()),
            Property::Date => self.info.date = Some(first.to_string()),
            Property::Result => self.info.result = Some(first.to_string()),
            Property::GameName => self.info.game_name = Some(first.to_string()),
            Property::Event => self.info.event = Some(first.to_string()),
            Property::Place => self.info.place = Some(first.to_string()),
            Property::Rules => self.info.rules = Some(first.to_string()),
            Property::Info(key) => {
                self.info.extra.insert(key, first.to_string());
            }
            Property::Ignored => debug!(key, "Ignoring SGF property"),
            Property::Unknown => {
                if self.strict {
                    return Err(RecordError::UnknownProperty {
                        format: FORMAT,
                        key: key.to_string(),
                    });
                }
                warn!(key, "Skipping unknown SGF property");
            }
        }
        Ok(())
    }

    fn tt_is_pass(&self) -> bool {
        self.width <= TT_PASS_MAX_SIZE && self.height <= TT_PASS_MAX_SIZE
    }

    fn point(&self, value: &str) -> Option<Point> {
        let mut chars = value.trim().chars();
        let x = chars.next().and_then(letter_coord)?;
        let y = chars.next().and_then(letter_coord)?;
        chars.next().is_none().then_some((x, y))
    }

    /// A single point or a compressed rectangle `aa:cc`.
    fn points(&self, value: &str) -> Vec<Point> {
        match value.split_once(':') {
            None => match self.point(value) {
                Some(p) => vec![p],
                None => {
                    warn!(value, "Skipping bad point");
                    Vec::new()
                }
            },
            Some((a, b)) => match (self.point(a), self.point(b)) {
                (Some((x1, y1)), Some((x2, y2))) => {
                    let mut out = Vec::new();
                    for y in y1.min(y2)..=y1.max(y2) {
                        for x in x1.min(x2)..=x1.max(x2) {
                            out.push((x, y));
                        }
                    }
                    out
                }
                _ => {
                    warn!(value, "Skipping bad point range");
                    Vec::new()
                }
            },
        }
    }
}

/// Resolve SGF escapes: `\` + newline is a soft line break, `\x` is `x`.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\n') => {
                if chars.peek() == Some(&'\r') {
                    chars.next();
                }
            }
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\\' || c == ']' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

// =============================================================================
// Writer
// =============================================================================

/// Write `game` as an SGF record.
pub fn serialize(game: &Game) -> String {
    Record(game).to_string()
}

struct Record<'a>(&'a Game);

impl fmt::Display for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = self.0.tree();
        f.write_str("(;")?;
        write_root_properties(f, self.0)?;
        write_sequence(f, tree, tree.root(), true)?;
        f.write_char(')')
    }
}

fn write_root_properties(out: &mut impl Write, game: &Game) -> fmt::Result {
    let info = game.info();
    out.write_str("FF[4]")?;
    if let Some(game_type) = &info.game_type {
        write!(out, "GM[{}]", escape(game_type))?;
    }
    out.write_str("CA[UTF-8]")?;
    if game.width() == game.height() {
        write!(out, "SZ[{}]", game.width())?;
    } else {
        write!(out, "SZ[{}:{}]", game.width(), game.height())?;
    }
    if let Some(komi) = info.komi {
        write!(out, "KM[{komi}]")?;
    }
    if let Some(handicap) = info.handicap {
        write!(out, "HA[{handicap}]")?;
    }
    let text_props = [
        ("PB", &info.black.name),
        ("BR", &info.black.rank),
        ("PW", &info.white.name),
        ("WR", &info.white.rank),
        ("DT", &info.date),
        ("RE", &info.result),
        ("GN", &info.game_name),
        ("EV", &info.event),
        ("PC", &info.place),
        ("RU", &info.rules),
    ];
    for (key, value) in text_props {
        if let Some(value) = value {
            write!(out, "{key}[{}]", escape(value))?;
        }
    }
    for (key, value) in &info.extra {
        if INFO_KEYS.contains(&key.as_str()) {
            write!(out, "{key}[{}]", escape(value))?;
        } else {
            warn!(key = %key, "Skipping game info key with no SGF property");
        }
    }
    Ok(())
}

/// Write `id` and its main line; branch points open one `(...)` per child.
fn write_sequence(out: &mut impl Write, tree: &MoveTree, id: NodeId, is_root: bool) -> fmt::Result {
    let mut cur = id;
    let mut first = is_root;
    loop {
        if !first {
            out.write_char(';')?;
        }
        first = false;
        write_node(out, tree.get(cur))?;
        match tree.get(cur).children() {
            [] => return Ok(()),
            [only] => cur = *only,
            many => {
                for &child in many {
                    out.write_char('(')?;
                    write_sequence(out, tree, child, false)?;
                    out.write_char(')')?;
                }
                return Ok(());
            }
        }
    }
}

fn write_point(out: &mut impl Write, (x, y): Point) -> fmt::Result {
    if let (Some(a), Some(b)) = (coord_letter(x), coord_letter(y)) {
        out.write_char(a)?;
        out.write_char(b)?;
    }
    Ok(())
}

fn write_node(out: &mut impl Write, node: &MoveNode) -> fmt::Result {
    if let Some(mv) = node.mv {
        out.write_char(mv.color.letter())?;
        out.write_char('[')?;
        if let Some(point) = mv.point {
            write_point(out, point)?;
        }
        out.write_char(']')?;
    }
    if let Some(turn) = node.turn {
        write!(out, "PL[{}]", turn.letter())?;
    }
    for (key, color) in [
        ("AB", Some(Color::Black)),
        ("AW", Some(Color::White)),
        ("AE", None),
    ] {
        let points: Vec<Point> = node
            .setup
            .iter()
            .filter(|s| s.color == color)
            .map(|s| (s.x, s.y))
            .collect();
        if !points.is_empty() {
            out.write_str(key)?;
            for point in points {
                out.write_char('[')?;
                write_point(out, point)?;
                out.write_char(']')?;
            }
        }
    }
    let mut keys: Vec<&'static str> = node.markup.iter().map(|m| m.markup.key()).collect();
    keys.sort_unstable();
    keys.dedup();
    for key in keys {
        out.write_str(key)?;
        for entry in node.markup.iter().filter(|m| m.markup.key() == key) {
            out.write_char('[')?;
            write_point(out, (entry.x, entry.y))?;
            if let Markup::Label(text) = &entry.markup {
                write!(out, ":{}", escape(text))?;
            }
            out.write_char(']')?;
        }
    }
    if let Some(name) = &node.name {
        write!(out, "N[{}]", escape(name))?;
    }
    if let Some(comment) = &node.comment {
        write!(out, "C[{}]", escape(comment))?;
    }
    Ok(())
}
