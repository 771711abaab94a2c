//! Go position representation and capture resolution.
//!
//! This module provides one board snapshot:
//! - Stones and markup, each kept in a bounds-checked [`Grid`]
//! - The color to move
//! - Stones removed at this position, plus cumulative capture counts
//!
//! Liberty and capture searches are flood fills over the 4-connected
//! neighbors of a point, using a scratch grid to mark visited points.

use crate::color::Color;
use crate::error::GameError;
use crate::grid::Grid;

/// A point on the board as `(x, y)`, zero based from the top left corner.
pub type Point = (usize, usize);

/// Annotation drawn on a single point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    Circle,
    Square,
    Triangle,
    Cross,
    Selected,
    Dimmed,
    Label(String),
    TerritoryBlack,
    TerritoryWhite,
}

impl Markup {
    /// SGF property key for this annotation.
    pub fn key(&self) -> &'static str {
        match self {
            Markup::Circle => "CR",
            Markup::Square => "SQ",
            Markup::Triangle => "TR",
            Markup::Cross => "MA",
            Markup::Selected => "SL",
            Markup::Dimmed => "DD",
            Markup::Label(_) => "LB",
            Markup::TerritoryBlack => "TB",
            Markup::TerritoryWhite => "TW",
        }
    }

    /// Inverse of [`Markup::key`]; labels need their text and are built elsewhere.
    pub fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "CR" => Markup::Circle,
            "SQ" => Markup::Square,
            "TR" => Markup::Triangle,
            "MA" => Markup::Cross,
            "SL" => Markup::Selected,
            "DD" => Markup::Dimmed,
            "TB" => Markup::TerritoryBlack,
            "TW" => Markup::TerritoryWhite,
            _ => return None,
        })
    }
}

/// Number of stones captured by each color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureCount {
    pub black: usize,
    pub white: usize,
}

impl CaptureCount {
    pub fn get(&self, capturer: Color) -> usize {
        match capturer {
            Color::Black => self.black,
            Color::White => self.white,
        }
    }

    fn add(&mut self, capturer: Color, n: usize) {
        match capturer {
            Color::Black => self.black += n,
            Color::White => self.white += n,
        }
    }
}

/// A Go position (board state).
#[derive(Debug, Clone)]
pub struct Position {
    stones: Grid<Color>,
    markup: Grid<Markup>,
    /// Color to move next
    pub turn: Color,
    /// Black stones removed at this position
    captured_black: Vec<Point>,
    /// White stones removed at this position
    captured_white: Vec<Point>,
    /// Cumulative captures up to and including this position
    pub capture_count: CaptureCount,
}

impl Position {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            stones: Grid::new(width, height),
            markup: Grid::new(width, height),
            turn: Color::Black,
            captured_black: Vec::new(),
            captured_white: Vec::new(),
            capture_count: CaptureCount::default(),
        }
    }

    pub fn width(&self) -> usize {
        self.stones.width()
    }

    pub fn height(&self) -> usize {
        self.stones.height()
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        self.stones.contains(x, y)
    }

    pub fn stones(&self) -> &Grid<Color> {
        &self.stones
    }

    pub fn stone(&self, x: usize, y: usize) -> Option<Color> {
        self.stones.get(x, y).copied()
    }

    pub fn set_stone(&mut self, x: usize, y: usize, color: Color) {
        self.stones.set(x, y, color);
    }

    pub fn remove_stone(&mut self, x: usize, y: usize) {
        self.stones.unset(x, y);
    }

    pub fn markups(&self) -> &Grid<Markup> {
        &self.markup
    }

    pub fn markup(&self, x: usize, y: usize) -> Option<&Markup> {
        self.markup.get(x, y)
    }

    pub fn set_markup(&mut self, x: usize, y: usize, markup: Markup) {
        self.markup.set(x, y, markup);
    }

    pub fn remove_markup(&mut self, x: usize, y: usize) {
        self.markup.unset(x, y);
    }

    /// Stones of `color` removed at this position (not cumulative).
    pub fn captures_of(&self, color: Color) -> &[Point] {
        match color {
            Color::Black => &self.captured_black,
            Color::White => &self.captured_white,
        }
    }

    /// Copy for the next step of the game: stones, size, turn and capture
    /// totals are kept; markup and this position's capture lists are not.
    pub fn snapshot(&self) -> Position {
        Position {
            stones: self.stones.clone(),
            markup: Grid::new(self.width(), self.height()),
            turn: self.turn,
            captured_black: Vec::new(),
            captured_white: Vec::new(),
            capture_count: self.capture_count,
        }
    }

    /// Same stones on a board of the same size. Turn, markup and captures
    /// are ignored.
    pub fn is_same_as(&self, other: &Position) -> bool {
        self.stones.is_same_as(&other.stones)
    }

    /// Does the group of `color` containing `(x, y)` have at least one liberty?
    ///
    /// Returns false when the point does not hold a stone of `color`.
    pub fn has_liberties(&self, x: usize, y: usize, color: Color) -> bool {
        if self.stone(x, y) != Some(color) {
            return false;
        }
        let mut visited: Grid<bool> = Grid::new(self.width(), self.height());
        let mut stack = vec![(x, y)];
        while let Some((cx, cy)) = stack.pop() {
            if visited.has(cx, cy) {
                continue;
            }
            visited.set(cx, cy, true);
            for (nx, ny) in self.stones.neighbors(cx, cy) {
                match self.stone(nx, ny) {
                    None => return true,
                    Some(c) if c == color && !visited.has(nx, ny) => stack.push((nx, ny)),
                    _ => {}
                }
            }
        }
        false
    }

    /// Can the enemy group at `(x, y)` be taken off the board?
    pub fn can_capture(&self, x: usize, y: usize, color: Color) -> bool {
        self.stone(x, y) == Some(color) && !self.has_liberties(x, y, color)
    }

    /// Remove the whole group of `color` at `(x, y)`, recording the stones
    /// in this position's capture list. Returns the number removed.
    pub fn capture_group(&mut self, x: usize, y: usize, color: Color) -> usize {
        let mut stack = vec![(x, y)];
        let mut count = 0;
        while let Some((cx, cy)) = stack.pop() {
            if self.stone(cx, cy) != Some(color) {
                continue;
            }
            self.stones.unset(cx, cy);
            match color {
                Color::Black => self.captured_black.push((cx, cy)),
                Color::White => self.captured_white.push((cx, cy)),
            }
            count += 1;
            for n in self.stones.neighbors(cx, cy) {
                if self.stone(n.0, n.1) == Some(color) {
                    stack.push(n);
                }
            }
        }
        count
    }

    /// Capture every enemy group next to a stone of `friendly` just placed
    /// at `(x, y)` that is left without liberties. Returns the number of
    /// stones removed.
    pub fn capture_adjacent(&mut self, x: usize, y: usize, friendly: Color) -> usize {
        let enemy = friendly.opposite();
        let mut total = 0;
        for (nx, ny) in self.stones.neighbors(x, y) {
            if self.can_capture(nx, ny, enemy) {
                total += self.capture_group(nx, ny, enemy);
            }
        }
        self.capture_count.add(friendly, total);
        total
    }

    /// Place a stone of `color` and resolve captures.
    ///
    /// Bounds and occupancy are the caller's concern. When the move captures
    /// nothing and leaves its own group without liberties it is suicide:
    /// rejected unless `allow_suicide`, in which case the group is removed
    /// and counted as captured by the opponent.
    ///
    /// Returns the number of enemy stones captured. On error the position
    /// has been modified and must be discarded.
    pub fn play(
        &mut self,
        x: usize,
        y: usize,
        color: Color,
        allow_suicide: bool,
    ) -> Result<usize, GameError> {
        self.stones.set(x, y, color);
        let captured = self.capture_adjacent(x, y, color);
        if captured == 0 && !self.has_liberties(x, y, color) {
            if !allow_suicide {
                return Err(GameError::SuicideMove { x, y });
            }
            let lost = self.capture_group(x, y, color);
            self.capture_count.add(color.opposite(), lost);
        }
        Ok(captured)
    }
}
