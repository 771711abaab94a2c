//! Monte Carlo ownership estimation.
//!
//! Plays random legal games to the end from a position and records who owns
//! each point at the end of every playout. The averaged result is an
//! ownership map for [`ScoreEstimator`](crate::score::ScoreEstimator):
//! `1.0` always black, `-1.0` always white.

use tracing::debug;

use crate::color::Color;
use crate::constants::PLAYOUT_LENGTH_FACTOR;
use crate::grid::Grid;
use crate::position::{Point, Position};

/// Check if a point is "eyeish" (every neighbor is a stone of one color).
///
/// Returns the color of the surrounding stones.
/// Note: This may return a color for false eyes.
pub fn is_eyeish(pos: &Position, x: usize, y: usize) -> Option<Color> {
    if pos.stone(x, y).is_some() {
        return None;
    }
    let mut eyecolor = None;
    for (nx, ny) in pos.stones().neighbors(x, y) {
        match (pos.stone(nx, ny), eyecolor) {
            (None, _) => return None,
            (Some(c), None) => eyecolor = Some(c),
            (Some(c), Some(e)) if c != e => return None,
            _ => {}
        }
    }
    eyecolor
}

/// Average ownership over `playouts` random games from `position`.
pub fn ownership(position: &Position, playouts: usize, seed: u64) -> Grid<f64> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let (w, h) = (position.width(), position.height());
    let mut total = vec![0.0f64; w * h];

    for _ in 0..playouts {
        let end = mcplayout(position, &mut rng);
        for y in 0..h {
            for x in 0..w {
                let owner = end.stone(x, y).or_else(|| is_eyeish(&end, x, y));
                total[y * w + x] += match owner {
                    Some(Color::Black) => 1.0,
                    Some(Color::White) => -1.0,
                    None => 0.0,
                };
            }
        }
    }

    let mut map = Grid::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let value = if playouts == 0 {
                0.0
            } else {
                total[y * w + x] / playouts as f64
            };
            map.set(x, y, value);
        }
    }
    debug!(playouts, "Computed ownership map");
    map
}

/// Play random moves until two consecutive passes or the length limit.
/// Returns the final position.
pub fn mcplayout(position: &Position, rng: &mut fastrand::Rng) -> Position {
    let mut pos = position.snapshot();
    let limit = position.width() * position.height() * PLAYOUT_LENGTH_FACTOR;
    let mut passes = 0;
    let mut moves = 0;

    while passes < 2 && moves < limit {
        let color = pos.turn;
        match choose_random_move(&pos, color, rng) {
            Some(next) => {
                pos = next;
                passes = 0;
            }
            None => passes += 1,
        }
        pos.turn = color.opposite();
        moves += 1;
    }
    pos
}

/// Pick a random legal move for `color` that does not fill its own eye.
/// Returns the position after that move.
fn choose_random_move(pos: &Position, color: Color, rng: &mut fastrand::Rng) -> Option<Position> {
    let mut candidates: Vec<Point> = Vec::new();
    for y in 0..pos.height() {
        for x in 0..pos.width() {
            if pos.stone(x, y).is_none() && is_eyeish(pos, x, y) != Some(color) {
                candidates.push((x, y));
            }
        }
    }
    rng.shuffle(&mut candidates);

    // Some candidates might be suicide moves
    for (x, y) in candidates {
        let mut test_pos = pos.snapshot();
        if test_pos.play(x, y, color, false).is_ok() {
            return Some(test_pos);
        }
    }
    None
}
