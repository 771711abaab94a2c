//! Territory scoring.
//!
//! - [`ScoreState`] classifies every point of a position as stone,
//!   territory candidate or neutral, with manual dead-stone marking
//! - [`Scorer`] tallies a classification into a [`Score`]
//! - [`ScoreEstimator`] builds the classification from a per-point
//!   ownership map instead of manual marking

use std::fmt;

use crate::color::Color;
use crate::constants::DEFAULT_ESTIMATOR_THRESHOLD;
use crate::game::Game;
use crate::grid::Grid;
use crate::position::{CaptureCount, Position};

/// Classification of one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Black,
    White,
    BlackCandidate,
    WhiteCandidate,
    Neutral,
    Unknown,
}

impl CellState {
    fn stone(color: Color) -> Self {
        match color {
            Color::Black => CellState::Black,
            Color::White => CellState::White,
        }
    }

    fn candidate(color: Color) -> Self {
        match color {
            Color::Black => CellState::BlackCandidate,
            Color::White => CellState::WhiteCandidate,
        }
    }
}

/// Per-point classification of a position, seeded from its stones.
#[derive(Debug, Clone)]
pub struct ScoreState {
    original: Grid<CellState>,
    state: Grid<CellState>,
}

impl ScoreState {
    pub fn new(position: &Position) -> Self {
        let mut original = Grid::new(position.width(), position.height());
        original.populate(CellState::Unknown);
        for cell in position.stones().get_all() {
            original.set(cell.x, cell.y, CellState::stone(cell.value));
        }
        let mut score = Self {
            state: original.clone(),
            original,
        };
        score.determine_states_grid();
        score
    }

    pub fn from_game(game: &Game) -> Self {
        Self::new(game.position())
    }

    pub fn grid(&self) -> &Grid<CellState> {
        &self.state
    }

    pub fn state(&self, x: usize, y: usize) -> CellState {
        self.state.get(x, y).copied().unwrap_or(CellState::Unknown)
    }

    fn original(&self, x: usize, y: usize) -> CellState {
        self.original.get(x, y).copied().unwrap_or(CellState::Unknown)
    }

    /// Is the stone originally at `(x, y)` currently marked dead?
    pub fn is_dead(&self, x: usize, y: usize) -> bool {
        matches!(
            (self.original(x, y), self.state(x, y)),
            (CellState::Black, CellState::WhiteCandidate)
                | (CellState::White, CellState::BlackCandidate)
        )
    }

    /// Mark the stone at `(x, y)` dead together with everything reachable
    /// from it without crossing a stone of the other color. Returns false
    /// when there is no live stone there.
    pub fn mark_dead(&mut self, x: usize, y: usize) -> bool {
        let (color, margin) = match self.state(x, y) {
            CellState::Black => (CellState::WhiteCandidate, CellState::White),
            CellState::White => (CellState::BlackCandidate, CellState::Black),
            _ => return false,
        };
        self.territory_set(x, y, color, margin);
        self.determine_states_grid();
        true
    }

    /// Mark a live stone dead, or bring a candidate region back to its
    /// original coloring.
    pub fn toggle(&mut self, x: usize, y: usize) {
        match self.state(x, y) {
            CellState::Black | CellState::White => {
                self.mark_dead(x, y);
            }
            CellState::BlackCandidate => {
                self.territory_reset(x, y, CellState::Black);
                self.determine_states_grid();
            }
            CellState::WhiteCandidate => {
                self.territory_reset(x, y, CellState::White);
                self.determine_states_grid();
            }
            CellState::Neutral | CellState::Unknown => {}
        }
    }

    fn territory_set(&mut self, x: usize, y: usize, color: CellState, margin: CellState) {
        let mut stack = vec![(x, y)];
        while let Some((cx, cy)) = stack.pop() {
            let s = self.state(cx, cy);
            if s == color || s == margin {
                continue;
            }
            self.state.set(cx, cy, color);
            stack.extend(self.state.neighbors(cx, cy));
        }
    }

    fn territory_reset(&mut self, x: usize, y: usize, margin: CellState) {
        let mut stack = vec![(x, y)];
        while let Some((cx, cy)) = stack.pop() {
            let o = self.original(cx, cy);
            if o == margin || self.state(cx, cy) == o {
                continue;
            }
            self.state.set(cx, cy, o);
            stack.extend(self.state.neighbors(cx, cy));
        }
    }

    /// Relax every empty point to the color(s) next to it until nothing
    /// changes. Dead-stone marks are left in place.
    pub fn determine_states_grid(&mut self) {
        let (w, h) = (self.state.width(), self.state.height());
        for y in 0..h {
            for x in 0..w {
                if self.original(x, y) == CellState::Unknown {
                    self.state.set(x, y, CellState::Unknown);
                }
            }
        }

        // A point only ever moves from unknown to a candidate and from a
        // candidate to neutral, so this terminates.
        let mut changed = true;
        while changed {
            changed = false;
            for y in 0..h {
                for x in 0..w {
                    if self.original(x, y) != CellState::Unknown {
                        continue;
                    }
                    let s = self.state(x, y);
                    let (mut black, mut white) = (false, false);
                    for (nx, ny) in self.state.neighbors(x, y) {
                        match self.state(nx, ny) {
                            CellState::Black | CellState::BlackCandidate => black = true,
                            CellState::White | CellState::WhiteCandidate => white = true,
                            CellState::Neutral => {
                                black = true;
                                white = true;
                            }
                            CellState::Unknown => {}
                        }
                    }
                    let t = match (black, white) {
                        (true, true) => CellState::Neutral,
                        (true, false) => CellState::BlackCandidate,
                        (false, true) => CellState::WhiteCandidate,
                        (false, false) => continue,
                    };
                    if t != s {
                        self.state.set(x, y, t);
                        changed = true;
                    }
                }
            }
        }
    }
}

/// Which points make up a player's total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScoringMethod {
    /// Stones on the board plus territory
    Area,
    /// Territory plus prisoners
    #[default]
    Territory,
}

/// One player's share of a [`Score`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SideScore {
    pub stones: usize,
    pub territory: usize,
    /// Prisoners: earlier captures plus dead enemy stones inside territory
    pub captures: usize,
    pub komi: f64,
}

impl SideScore {
    pub fn area(&self) -> f64 {
        (self.stones + self.territory) as f64 + self.komi
    }

    pub fn territory_total(&self) -> f64 {
        (self.territory + self.captures) as f64 + self.komi
    }

    pub fn total(&self, method: ScoringMethod) -> f64 {
        match method {
            ScoringMethod::Area => self.area(),
            ScoringMethod::Territory => self.territory_total(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Score {
    pub black: SideScore,
    pub white: SideScore,
}

impl Score {
    pub fn side(&self, color: Color) -> &SideScore {
        match color {
            Color::Black => &self.black,
            Color::White => &self.white,
        }
    }

    /// `B+N`, `W+N`, or `?` on a tie.
    pub fn result(&self, method: ScoringMethod) -> String {
        let diff = self.black.total(method) - self.white.total(method);
        if diff > 0.0 {
            format!("B+{diff}")
        } else if diff < 0.0 {
            format!("W+{}", -diff)
        } else {
            "?".to_string()
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, side) in [("Black", &self.black), ("White", &self.white)] {
            writeln!(
                f,
                "{name}: stones {} territory {} captures {} komi {} | area {} territory {}",
                side.stones,
                side.territory,
                side.captures,
                side.komi,
                side.area(),
                side.territory_total()
            )?;
        }
        Ok(())
    }
}

/// Tallies a finished [`ScoreState`].
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    komi: f64,
    prior_captures: CaptureCount,
}

impl Scorer {
    /// `komi` goes to White; `prior_captures` are the captures made during play.
    pub fn new(komi: f64, prior_captures: CaptureCount) -> Self {
        Self {
            komi,
            prior_captures,
        }
    }

    pub fn for_game(game: &Game) -> Self {
        Self::new(game.komi(), game.capture_count())
    }

    pub fn score(&self, state: &ScoreState) -> Score {
        let mut score = Score::default();
        score.white.komi = self.komi;
        score.black.captures = self.prior_captures.black;
        score.white.captures = self.prior_captures.white;
        let grid = state.grid();
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                match state.state(x, y) {
                    CellState::Black => score.black.stones += 1,
                    CellState::White => score.white.stones += 1,
                    CellState::BlackCandidate => {
                        score.black.territory += 1;
                        if state.is_dead(x, y) {
                            score.black.captures += 1;
                        }
                    }
                    CellState::WhiteCandidate => {
                        score.white.territory += 1;
                        if state.is_dead(x, y) {
                            score.white.captures += 1;
                        }
                    }
                    CellState::Neutral | CellState::Unknown => {}
                }
            }
        }
        score
    }
}

/// Builds a classification from an ownership map: one value per point in
/// `[-1, 1]`, positive meaning black. Points whose value does not reach the
/// threshold in either direction are neutral.
#[derive(Debug, Clone, Copy)]
pub struct ScoreEstimator {
    threshold: f64,
}

impl Default for ScoreEstimator {
    fn default() -> Self {
        Self::with_threshold(DEFAULT_ESTIMATOR_THRESHOLD)
    }
}

impl ScoreEstimator {
    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn owner(&self, value: f64) -> Option<Color> {
        if value >= self.threshold {
            Some(Color::Black)
        } else if value <= -self.threshold {
            Some(Color::White)
        } else {
            None
        }
    }

    /// Classification of `position` under `ownership`. Stones standing in
    /// the other color's area are dead; uncertain stones stay alive.
    pub fn states(&self, position: &Position, ownership: &Grid<f64>) -> ScoreState {
        let mut score = ScoreState::new(position);
        for y in 0..position.height() {
            for x in 0..position.width() {
                let owner = self.owner(ownership.get(x, y).copied().unwrap_or(0.0));
                let state = match (position.stone(x, y), owner) {
                    (Some(stone), Some(owner)) if stone == owner => CellState::stone(stone),
                    (Some(_), Some(owner)) => CellState::candidate(owner),
                    (Some(stone), None) => CellState::stone(stone),
                    (None, Some(owner)) => CellState::candidate(owner),
                    (None, None) => CellState::Neutral,
                };
                score.state.set(x, y, state);
            }
        }
        score
    }

    pub fn estimate(&self, game: &Game, ownership: &Grid<f64>) -> Score {
        Scorer::for_game(game).score(&self.states(game.position(), ownership))
    }
}
