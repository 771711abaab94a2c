//! Integration tests for goban-kifu
//!
//! Board scenarios run through the public `Game` API; record tests load real
//! SGF/JSON text and compare trees and replayed positions after conversion.

use goban_kifu::color::Color;
use goban_kifu::error::{GameError, RecordError};
use goban_kifu::format::{self, RecordFormat, RecordInput, jgo, sgf};
use goban_kifu::game::{Game, GotoTarget, Repetition};
use goban_kifu::grid::Grid;
use goban_kifu::path::PathState;
use goban_kifu::position::{CaptureCount, Point};
use goban_kifu::score::{CellState, ScoreEstimator, ScoreState, Scorer, ScoringMethod};
use goban_kifu::tree::{Move, MoveTree};

// =============================================================================
// Helper functions
// =============================================================================

/// A game whose root carries the given setup stones. Black is to move.
fn game_with(size: usize, black: &[Point], white: &[Point]) -> Game {
    let mut game = Game::new(size, size);
    for &(x, y) in black {
        game.add_stone(x, y, Color::Black).unwrap();
    }
    for &(x, y) in white {
        game.add_stone(x, y, Color::White).unwrap();
    }
    game
}

type NodeSummary = (
    Option<Move>,
    Option<String>,
    Option<String>,
    Vec<(usize, usize, String)>,
    Vec<(usize, usize, i8)>,
);

/// Node contents in walk order, with setup and markup sorted so that
/// serialization order does not matter.
fn summarize(tree: &MoveTree) -> Vec<NodeSummary> {
    tree.walk()
        .into_iter()
        .map(|id| {
            let node = tree.get(id);
            let mut markup: Vec<_> = node
                .markup
                .iter()
                .map(|m| (m.x, m.y, format!("{:?}", m.markup)))
                .collect();
            markup.sort();
            let mut setup: Vec<_> = node
                .setup
                .iter()
                .map(|s| (s.x, s.y, s.color.map_or(0, Color::sign)))
                .collect();
            setup.sort();
            (node.mv, node.comment.clone(), node.name.clone(), markup, setup)
        })
        .collect()
}

/// Replay both games along their main lines and compare every position.
fn assert_same_main_line(a: &mut Game, b: &mut Game) {
    a.first();
    b.first();
    loop {
        assert!(a.position().is_same_as(b.position()));
        assert_eq!(a.move_number(), b.move_number());
        assert_eq!(a.turn(), b.turn());
        match (a.next(Some(0)), b.next(Some(0))) {
            (Ok(()), Ok(())) => {}
            (Err(GameError::NoNextNode), Err(GameError::NoNextNode)) => break,
            other => panic!("main lines diverge: {other:?}"),
        }
    }
}

const RECORD: &str = r"(;GM[1]FF[4]CA[UTF-8]SZ[13]KM[6.5]HA[0]
PB[Black \] Name]BR[3d]PW[White]WR[5k]RE[W+R]DT[2024-05-01]GC[friendly game]
AB[cc][dd]AW[jj]
;B[gg]C[a comment with \] bracket
and a second line]TR[aa][bb]LB[cd:A]
;W[hh]
(;B[ii];W[]C[white passes];B[kk])
(;B[jk]N[alt];W[ab]))";

// =============================================================================
// Captures and suicide
// =============================================================================

#[test]
fn test_capture_only_when_last_liberty_filled() {
    // White at (2,2) has one liberty left at (2,3)
    let mut game = game_with(5, &[(2, 1), (1, 2), (3, 2)], &[(2, 2)]);
    let captured = game.play(2, 3, Some(Color::Black)).unwrap();
    assert_eq!(captured, vec![(2, 2)]);
    assert_eq!(game.position().stone(2, 2), None);
    assert_eq!(game.capture_count(), CaptureCount { black: 1, white: 0 });
}

#[test]
fn test_no_capture_with_liberties_left() {
    // White pair (2,2)-(2,3) still has (2,4) and (1,3) after black plays (3,3)
    let mut game = game_with(5, &[(2, 1), (1, 2), (3, 2)], &[(2, 2), (2, 3)]);
    let captured = game.play(3, 3, Some(Color::Black)).unwrap();
    assert!(captured.is_empty());
    assert_eq!(game.position().stone(2, 2), Some(Color::White));
    assert_eq!(game.position().stone(2, 3), Some(Color::White));
}

#[test]
fn test_capture_larger_group() {
    // White chain along the top edge: (0,0) (1,0) (2,0)
    let mut game = game_with(5, &[(0, 1), (1, 1), (2, 1)], &[(0, 0), (1, 0), (2, 0)]);
    let mut captured = game.play(3, 0, Some(Color::Black)).unwrap();
    captured.sort();
    assert_eq!(captured, vec![(0, 0), (1, 0), (2, 0)]);
    assert_eq!(game.capture_count().black, 3);
}

#[test]
fn test_suicide_rejected_then_allowed() {
    let mut game = game_with(5, &[], &[(1, 0), (0, 1)]);
    assert_eq!(
        game.play(0, 0, Some(Color::Black)),
        Err(GameError::SuicideMove { x: 0, y: 0 })
    );
    // Nothing changed
    assert_eq!(game.move_number(), 0);
    assert_eq!(game.position().stone(0, 0), None);
    assert!(!game.node().has_children());

    game.config_mut().allow_suicide = true;
    game.play(0, 0, Some(Color::Black)).unwrap();
    assert_eq!(game.position().stone(0, 0), None);
    assert_eq!(game.capture_count(), CaptureCount { black: 0, white: 1 });
    assert_eq!(game.turn(), Color::White);
}

#[test]
fn test_capture_is_not_suicide() {
    // Black at (0,0) is surrounded but takes the white stone at (1,0)
    let mut game = game_with(5, &[(2, 0), (1, 1)], &[(1, 0), (0, 1), (0, 2)]);
    let captured = game.play(0, 0, Some(Color::Black)).unwrap();
    assert_eq!(captured, vec![(1, 0)]);
    assert_eq!(game.position().stone(0, 0), Some(Color::Black));
}

#[test]
fn test_no_over_capture_of_surrounding_stones() {
    let white = [(1, 0), (0, 1), (2, 1), (1, 2)];
    let mut game = game_with(5, &[], &white);
    // Every white stone keeps other liberties, so black's stone has none
    assert_eq!(
        game.play(1, 1, Some(Color::Black)),
        Err(GameError::SuicideMove { x: 1, y: 1 })
    );

    game.config_mut().allow_suicide = true;
    let captured = game.play(1, 1, Some(Color::Black)).unwrap();
    assert!(captured.is_empty());
    for (x, y) in white {
        assert_eq!(game.position().stone(x, y), Some(Color::White));
    }
    assert_eq!(game.capture_count(), CaptureCount { black: 0, white: 1 });
}

#[test]
fn test_four_moves_without_captures() {
    let mut game = Game::new(9, 9);
    game.play(2, 2, None).unwrap();
    game.play(2, 3, None).unwrap();
    game.play(3, 2, None).unwrap();
    game.play(3, 3, None).unwrap();
    assert_eq!(game.capture_count(), CaptureCount { black: 0, white: 0 });
    assert_eq!(game.move_number(), 4);
    assert_eq!(game.turn(), Color::Black);
}

// =============================================================================
// Repetition
// =============================================================================

/// White at (1,1) in atari; black captures at (2,1) and can be retaken.
fn ko_game() -> Game {
    game_with(
        5,
        &[(1, 0), (0, 1), (1, 2)],
        &[(1, 1), (2, 0), (3, 1), (2, 2)],
    )
}

#[test]
fn test_ko_recapture_rejected() {
    let mut game = ko_game();
    assert_eq!(game.play(2, 1, None).unwrap(), vec![(1, 1)]);
    assert_eq!(
        game.play(1, 1, None),
        Err(GameError::RepeatingPosition { x: 1, y: 1 })
    );
    assert_eq!(game.move_number(), 1);
    assert!(!game.is_valid_move(1, 1, Color::White));

    // After an exchange elsewhere the recapture is fine
    game.play(4, 4, None).unwrap();
    game.play(4, 0, None).unwrap();
    assert_eq!(game.play(1, 1, None).unwrap(), vec![(2, 1)]);
}

#[test]
fn test_ko_recapture_rejected_after_comment_node() {
    // Same shape as `ko_game`, with a comment-only node after the capture
    let mut game =
        sgf::parse("(;SZ[5]AB[ba][ab][bc]AW[bb][ca][db][cc];B[cb];C[ko!])").unwrap();
    game.last().unwrap();
    assert_eq!(game.node().comment.as_deref(), Some("ko!"));
    assert_eq!(game.turn(), Color::White);
    assert_eq!(
        game.play(1, 1, None),
        Err(GameError::RepeatingPosition { x: 1, y: 1 })
    );

    // A recorded retake behind the comment fails to replay
    let mut bad =
        sgf::parse("(;SZ[5]AB[ba][ab][bc]AW[bb][ca][db][cc];B[cb];C[ko!];W[bb])").unwrap();
    assert_eq!(
        bad.last(),
        Err(GameError::RepeatingPosition { x: 1, y: 1 })
    );
}

#[test]
fn test_repetition_none_allows_immediate_recapture() {
    let mut game = ko_game();
    game.config_mut().repetition = Repetition::None;
    game.play(2, 1, None).unwrap();
    assert_eq!(game.play(1, 1, None).unwrap(), vec![(2, 1)]);
}

#[test]
fn test_superko_checks_whole_line() {
    let mut game = ko_game();
    game.config_mut().repetition = Repetition::All;
    game.play(2, 1, None).unwrap();
    assert!(game.play(1, 1, None).is_err());
    game.play(4, 4, None).unwrap();
    game.play(4, 0, None).unwrap();
    game.play(1, 1, None).unwrap();
    // Retaking again recreates the position after black's (4,0)
    assert_eq!(
        game.play(2, 1, None),
        Err(GameError::RepeatingPosition { x: 2, y: 1 })
    );
}

#[test]
fn test_snapshot_is_same_until_changed() {
    let game = ko_game();
    let pos = game.position();
    let mut copy = pos.snapshot();
    assert!(copy.is_same_as(pos));
    copy.set_stone(4, 4, Color::Black);
    assert!(!copy.is_same_as(pos));
    copy.remove_stone(4, 4);
    assert!(copy.is_same_as(pos));
    copy.remove_stone(1, 1);
    assert!(!copy.is_same_as(pos));
}

// =============================================================================
// Navigation
// =============================================================================

const NAV: &str = "(;SZ[9]C[root];B[aa]C[first];W[bb](;B[cc];W[dd]N[end])(;B[ee]C[side];W[ff]))";

#[test]
fn test_last_and_named_goto() {
    let mut game = sgf::parse(NAV).unwrap();
    game.last().unwrap();
    assert_eq!(game.move_number(), 4);
    assert_eq!(game.node().name.as_deref(), Some("end"));

    game.first();
    game.goto(GotoTarget::Named("end".into())).unwrap();
    assert_eq!(game.move_number(), 4);
    assert_eq!(game.position().stone(3, 3), Some(Color::White));
    assert_eq!(game.path().move_count(), 4);
    assert_eq!(game.path().branches(), 0);
}

#[test]
fn test_forks_and_remembered_variation() {
    let mut game = sgf::parse(NAV).unwrap();
    game.next_fork().unwrap();
    assert_eq!(game.move_number(), 2);
    assert_eq!(game.node().children().len(), 2);

    game.next(Some(1)).unwrap();
    assert_eq!(game.node().mv, Some(Move::play(4, 4, Color::Black)));
    assert_eq!(game.path().branches(), 1);
    game.previous().unwrap();
    assert_eq!(game.path().branches(), 0);
    game.next(None).unwrap();
    assert_eq!(game.node().mv, Some(Move::play(4, 4, Color::Black)));

    game.last().unwrap();
    game.previous_fork().unwrap();
    assert_eq!(game.move_number(), 2);
    assert_eq!(
        game.next(Some(5)),
        Err(GameError::NoSuchVariation { index: 5, available: 2 })
    );
}

#[test]
fn test_goto_move_follows_current_line() {
    let mut game = sgf::parse(NAV).unwrap();
    game.goto(GotoTarget::Move(2)).unwrap();
    game.next(Some(1)).unwrap();
    game.first();
    game.goto(GotoTarget::Move(3)).unwrap();
    assert_eq!(game.node().comment.as_deref(), Some("side"));

    let saved = game.path().clone();
    game.first();
    game.goto(GotoTarget::Path(saved.clone())).unwrap();
    assert!(game.path().is_same_as(&saved));
    assert_eq!(game.node().comment.as_deref(), Some("side"));
}

#[test]
fn test_comment_navigation() {
    let mut game = sgf::parse(NAV).unwrap();
    assert!(game.next_comment().unwrap());
    assert_eq!(game.node().comment.as_deref(), Some("first"));
    // Main line has no later comment
    assert!(!game.next_comment().unwrap());
    assert_eq!(game.move_number(), 1);

    game.goto(GotoTarget::Path(PathState::from_route(&[0, 0, 1]))).unwrap();
    game.next(None).unwrap();
    assert!(game.previous_comment().unwrap());
    assert_eq!(game.node().comment.as_deref(), Some("side"));
    assert!(game.previous_comment().unwrap());
    assert!(game.previous_comment().unwrap());
    assert_eq!(game.current_node(), game.tree().root());
    assert!(!game.previous_comment().unwrap());
}

#[test]
fn test_failed_goto_leaves_game_unchanged() {
    let mut game = sgf::parse(NAV).unwrap();
    game.goto(GotoTarget::Move(3)).unwrap();
    let node = game.current_node();
    assert_eq!(
        game.goto(GotoTarget::Named("missing".into())),
        Err(GameError::NodeNotFound("missing".into()))
    );
    assert_eq!(game.current_node(), node);
    assert_eq!(game.move_number(), 3);
}

#[test]
fn test_illegal_move_in_record_stops_replay() {
    let mut game = sgf::parse("(;SZ[9];B[aa];W[aa];B[bb])").unwrap();
    assert_eq!(game.last(), Err(GameError::OccupiedPoint { x: 0, y: 0 }));
    assert_eq!(game.move_number(), 1);
    assert_eq!(
        game.goto(GotoTarget::Move(3)),
        Err(GameError::OccupiedPoint { x: 0, y: 0 })
    );
    assert_eq!(game.move_number(), 1);
}

// =============================================================================
// Record formats
// =============================================================================

#[test]
fn test_sgf_reads_everything() {
    let mut game = sgf::parse(RECORD).unwrap();
    let info = game.info();
    assert_eq!(game.width(), 13);
    assert_eq!(info.black.name.as_deref(), Some("Black ] Name"));
    assert_eq!(info.white.rank.as_deref(), Some("5k"));
    assert_eq!(info.result.as_deref(), Some("W+R"));
    assert_eq!(info.extra.get("GC").map(String::as_str), Some("friendly game"));
    assert_eq!(game.komi(), 6.5);
    assert_eq!(game.position().stone(2, 2), Some(Color::Black));
    assert_eq!(game.position().stone(9, 9), Some(Color::White));

    game.next(None).unwrap();
    assert_eq!(
        game.node().comment.as_deref(),
        Some("a comment with ] bracket\nand a second line")
    );
    assert_eq!(game.node().markup.len(), 3);

    game.last().unwrap();
    assert_eq!(game.move_number(), 5);
    assert_eq!(game.position().stone(10, 10), Some(Color::Black));
}

#[test]
fn test_sgf_roundtrip() {
    let mut original = sgf::parse(RECORD).unwrap();
    let text = sgf::serialize(&original);
    let mut reparsed = sgf::parse(&text).unwrap();

    assert_eq!(summarize(original.tree()), summarize(reparsed.tree()));
    assert_eq!(original.info(), reparsed.info());
    assert_eq!(
        (original.width(), original.height()),
        (reparsed.width(), reparsed.height())
    );
    assert_same_main_line(&mut original, &mut reparsed);
}

#[test]
fn test_jgo_roundtrip() {
    let mut original = sgf::parse(RECORD).unwrap();
    let text = jgo::serialize(&original).unwrap();
    let mut reparsed = jgo::parse(&text).unwrap();
    assert_eq!(summarize(original.tree()), summarize(reparsed.tree()));
    assert_eq!(original.info(), reparsed.info());
    assert_same_main_line(&mut original, &mut reparsed);

    // and back to SGF without losing anything
    let back = sgf::parse(&sgf::serialize(&reparsed)).unwrap();
    assert_eq!(summarize(original.tree()), summarize(back.tree()));
}

#[test]
fn test_jgo_info_survives_sgf() {
    let value = serde_json::json!({
        "size": 9,
        "info": {"komi": 6.5, "SO": "archive", "note": "kept in JSON only"},
        "game": [{}, {"move": {"x": 4, "y": 4, "c": 1}}]
    });
    let original = jgo::from_value(&value).unwrap();
    let text = sgf::serialize(&original);
    assert!(text.contains("SO[archive]"));
    assert!(!text.contains("note["));
    assert!(!text.contains("GM["));

    let back = sgf::parse(&text).unwrap();
    let mut expected = original.info().clone();
    expected.extra.remove("note");
    assert_eq!(back.info(), &expected);
    assert_eq!(summarize(original.tree()), summarize(back.tree()));

    // A game type read from SGF is written back
    let go = sgf::parse("(;GM[1]SZ[9])").unwrap();
    assert!(sgf::serialize(&go).contains("GM[1]"));
}

#[test]
fn test_load_dispatches_on_input() {
    let from_sgf = format::load(RecordInput::Text("  (;SZ[9];B[ee])")).unwrap();
    assert_eq!(from_sgf.width(), 9);

    let value = serde_json::json!({
        "size": 9,
        "game": [{}, {"move": {"x": 4, "y": 4, "c": 1}}]
    });
    let from_value = format::load(RecordInput::Value(&value)).unwrap();
    assert_eq!(summarize(from_sgf.tree()), summarize(from_value.tree()));

    let text = value.to_string();
    let from_text = format::load(RecordInput::Text(&text)).unwrap();
    assert_eq!(summarize(from_sgf.tree()), summarize(from_text.tree()));

    assert_eq!(
        format::save(&from_sgf, RecordFormat::Ngf),
        Err(RecordError::Unsupported(RecordFormat::Ngf))
    );
}

#[test]
fn test_sgf_passes_and_sizes() {
    let game = sgf::parse("(;SZ[19];B[tt];W[])").unwrap();
    let tree = game.tree();
    let first = tree.get(tree.root()).children()[0];
    assert_eq!(tree.get(first).mv, Some(Move::pass(Color::Black)));
    assert!(sgf::serialize(&game).contains(";B[];W[]"));

    let big = sgf::parse("(;SZ[21];B[tt])").unwrap();
    let first = big.tree().get(big.tree().root()).children()[0];
    assert_eq!(big.tree().get(first).mv, Some(Move::play(19, 19, Color::Black)));

    let rect = sgf::parse("(;SZ[7:5];B[gd])").unwrap();
    assert_eq!((rect.width(), rect.height()), (7, 5));
    assert!(sgf::serialize(&rect).contains("SZ[7:5]"));
}

#[test]
fn test_sgf_errors() {
    assert!(matches!(
        sgf::parse("no tree here"),
        Err(RecordError::Malformed { .. })
    ));
    assert!(matches!(
        sgf::parse("(;SZ[abc])"),
        Err(RecordError::Malformed { .. })
    ));
    assert!(sgf::parse("(;SZ[9]XX[1];B[aa])").is_ok());
    assert_eq!(
        sgf::parse_strict("(;SZ[9]XX[1];B[aa])").unwrap_err(),
        RecordError::UnknownProperty {
            format: RecordFormat::Sgf,
            key: "XX".into()
        }
    );
}

#[test]
fn test_sgf_handicap_and_turn_override() {
    let mut game = sgf::parse("(;SZ[9]HA[2]AB[cc][gg];W[ee];B[dd]PL[B])").unwrap();
    assert_eq!(game.turn(), Color::White);
    game.last().unwrap();
    assert_eq!(game.turn(), Color::Black);
}

// =============================================================================
// Scoring
// =============================================================================

/// Black wall on column 3, white wall on column 4.
const WALL: &str = "(;SZ[9]KM[6.5]AB[da:di]AW[ea:ei])";

#[test]
fn test_wall_territory_score() {
    let game = sgf::parse(WALL).unwrap();
    let state = ScoreState::from_game(&game);
    assert_eq!(state.state(0, 0), CellState::BlackCandidate);
    assert_eq!(state.state(8, 8), CellState::WhiteCandidate);

    let score = Scorer::for_game(&game).score(&state);
    assert_eq!(score.black.territory, 27);
    assert_eq!(score.white.territory, 36);
    assert_eq!(score.black.stones, 9);
    assert_eq!(score.white.stones, 9);
    assert_eq!(score.result(ScoringMethod::Territory), "W+15.5");
    assert_eq!(score.result(ScoringMethod::Area), "W+15.5");
}

#[test]
fn test_dead_stone_marking() {
    let mut game = sgf::parse(WALL).unwrap();
    game.add_stone(1, 1, Color::White).unwrap();
    let mut state = ScoreState::from_game(&game);
    // The white stone spoils black's area until marked dead
    assert_eq!(state.state(0, 0), CellState::Neutral);

    assert!(state.mark_dead(1, 1));
    assert!(state.is_dead(1, 1));
    let score = Scorer::for_game(&game).score(&state);
    assert_eq!(score.black.territory, 27);
    assert_eq!(score.black.captures, 1);
    assert_eq!(score.result(ScoringMethod::Territory), "W+14.5");

    state.toggle(1, 1);
    assert!(!state.is_dead(1, 1));
    assert_eq!(state.state(1, 1), CellState::White);
}

#[test]
fn test_estimator_with_ownership_map() {
    let mut game = sgf::parse(WALL).unwrap();
    game.add_stone(1, 1, Color::White).unwrap();
    let mut ownership = Grid::new(9, 9);
    for y in 0..9 {
        for x in 0..9 {
            ownership.set(x, y, if x <= 3 { 0.9 } else { -0.8 });
        }
    }
    let score = ScoreEstimator::default().estimate(&game, &ownership);
    assert_eq!(score.black.territory, 27);
    assert_eq!(score.black.captures, 1);
    assert_eq!(score.white.territory, 36);
    assert_eq!(score.result(ScoringMethod::Territory), "W+14.5");

    // Nobody is sure enough at a high threshold
    let unsure = ScoreEstimator::with_threshold(0.95).estimate(&game, &ownership);
    assert_eq!(unsure.black.territory, 0);
    assert_eq!(unsure.white.territory, 0);
}

#[test]
fn test_tie_prints_question_mark() {
    let game = sgf::parse("(;SZ[4]KM[0]AB[ba:bd]AW[ca:cd])").unwrap();
    let score = Scorer::for_game(&game).score(&ScoreState::from_game(&game));
    assert_eq!(score.result(ScoringMethod::Area), "?");
}

#[test]
fn test_playout_ownership_feeds_estimator() {
    let game = sgf::parse(WALL).unwrap();
    let ownership = goban_kifu::playout::ownership(game.position(), 8, 11);
    assert_eq!((ownership.width(), ownership.height()), (9, 9));
    let score = ScoreEstimator::default().estimate(&game, &ownership);
    let counted = score.black.stones
        + score.white.stones
        + score.black.territory
        + score.white.territory;
    assert!(counted <= 81);
}
