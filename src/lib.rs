//! goban-kifu: Go rules engine, move tree and game record conversion.
//!
//! This crate validates and replays moves under capture, suicide and ko
//! rules, navigates a branching record of variations, scores finished
//! positions and converts records between formats.
//!
//! ## Modules
//!
//! - [`grid`] - Bounded 2D container used for stones, markup and scoring
//! - [`position`] - One board snapshot and the liberty/capture search
//! - [`tree`] - Arena move tree of moves, setup, markup and comments
//! - [`path`] - Sparse record of the variation chosen at each step
//! - [`game`] - Validation, navigation and node replay
//! - [`score`] - Territory classification, dead stones and scoring
//! - [`playout`] - Monte Carlo ownership map for the score estimator
//! - [`format`] - SGF, structured JSON and legacy record converters
//! - [`info`] - Players, komi and other record metadata
//!
//! ## Example
//!
//! ```
//! use goban_kifu::format::{self, RecordFormat, RecordInput};
//! use goban_kifu::score::{ScoreState, Scorer, ScoringMethod};
//!
//! let mut game = format::load(RecordInput::Text("(;SZ[9]KM[6.5];B[cc];W[gg])")).unwrap();
//! game.last().unwrap();
//! assert_eq!(game.move_number(), 2);
//!
//! // Play on, then score the position
//! game.play(2, 6, None).unwrap();
//! let score = Scorer::for_game(&game).score(&ScoreState::from_game(&game));
//! println!("{}", score.result(ScoringMethod::Territory));
//!
//! let sgf = format::save(&game, RecordFormat::Sgf).unwrap();
//! assert!(sgf.contains(";B[cg]"));
//! ```

pub mod color;
pub mod constants;
pub mod error;
pub mod format;
pub mod game;
pub mod grid;
pub mod info;
pub mod path;
pub mod playout;
pub mod position;
pub mod score;
pub mod tree;
