//! Game orchestrator: move validation, tree navigation and node replay.
//!
//! A [`Game`] owns the move tree, a stack of positions (one per node on the
//! line from the root to the current node) and the [`PathState`] describing
//! that line. Every navigation step either succeeds completely or leaves the
//! game untouched.

use tracing::debug;

use crate::color::Color;
use crate::constants::{DEFAULT_KOMI, DEFAULT_SIZE};
use crate::error::GameError;
use crate::info::GameInfo;
use crate::path::PathState;
use crate::position::{CaptureCount, Markup, Point, Position};
use crate::tree::{MarkupEntry, Move, MoveNode, MoveTree, NodeId, Setup};

/// Which earlier positions a move may not recreate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Repetition {
    /// Anything goes
    None,
    /// Not the position before the opponent's last move
    #[default]
    Ko,
    /// No position seen earlier on the current line (superko)
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    pub allow_suicide: bool,
    /// Let a move overwrite an occupied point
    pub allow_rewrite: bool,
    /// `next()` without an index re-enters the variation last taken
    pub remember_path: bool,
    pub repetition: Repetition,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            allow_suicide: false,
            allow_rewrite: false,
            remember_path: true,
            repetition: Repetition::Ko,
        }
    }
}

/// Where [`Game::goto`] should land.
#[derive(Debug, Clone, PartialEq)]
pub enum GotoTarget {
    /// First node on the remembered line with this move number
    Move(usize),
    /// First node carrying this name
    Named(String),
    /// Exactly this path from the root
    Path(PathState),
}

/// A game record being viewed or edited.
#[derive(Debug, Clone)]
pub struct Game {
    tree: MoveTree,
    node: NodeId,
    history: Vec<Position>,
    path: PathState,
    info: GameInfo,
    config: GameConfig,
}

impl Default for Game {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE, DEFAULT_SIZE)
    }
}

impl Game {
    /// Empty record on a `width` x `height` board.
    pub fn new(width: usize, height: usize) -> Self {
        let tree = MoveTree::default();
        Self {
            node: tree.root(),
            tree,
            history: vec![Position::new(width, height)],
            path: PathState::new(),
            info: GameInfo::default(),
            config: GameConfig::default(),
        }
    }

    /// Game over an existing tree, positioned on its root.
    ///
    /// Fails when the root node itself cannot be replayed on an empty board.
    pub fn from_tree(
        tree: MoveTree,
        info: GameInfo,
        width: usize,
        height: usize,
        config: GameConfig,
    ) -> Result<Self, GameError> {
        let mut base = Position::new(width, height);
        if info.handicap.is_some_and(|h| h >= 2) {
            base.turn = Color::White;
        }
        let mut game = Self {
            node: tree.root(),
            tree,
            history: Vec::new(),
            path: PathState::new(),
            info,
            config,
        };
        let root = game.replay(game.node, &base)?;
        game.history.push(root);
        Ok(game)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn tree(&self) -> &MoveTree {
        &self.tree
    }

    pub fn current_node(&self) -> NodeId {
        self.node
    }

    pub fn node(&self) -> &MoveNode {
        self.tree.get(self.node)
    }

    pub fn position(&self) -> &Position {
        // history always holds the root position
        &self.history[self.history.len() - 1]
    }

    pub fn path(&self) -> &PathState {
        &self.path
    }

    pub fn info(&self) -> &GameInfo {
        &self.info
    }

    pub fn info_mut(&mut self) -> &mut GameInfo {
        &mut self.info
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut GameConfig {
        &mut self.config
    }

    pub fn width(&self) -> usize {
        self.history[0].width()
    }

    pub fn height(&self) -> usize {
        self.history[0].height()
    }

    pub fn komi(&self) -> f64 {
        self.info.komi.unwrap_or(DEFAULT_KOMI)
    }

    pub fn handicap(&self) -> u32 {
        self.info.handicap.unwrap_or(0)
    }

    pub fn turn(&self) -> Color {
        self.position().turn
    }

    pub fn capture_count(&self) -> CaptureCount {
        self.position().capture_count
    }

    pub fn move_number(&self) -> usize {
        self.tree.move_number(self.node)
    }

    pub fn is_valid_move(&self, x: usize, y: usize, color: Color) -> bool {
        self.validate_move(x, y, color).is_ok()
    }

    // =========================================================================
    // Validation and replay
    // =========================================================================

    /// Position after `color` plays at `(x, y)` from the current position.
    ///
    /// Nothing is committed; the caller decides what to do with the result.
    pub fn validate_move(&self, x: usize, y: usize, color: Color) -> Result<Position, GameError> {
        self.validate_on(self.position(), Some(self.node), x, y, color)
    }

    /// `tip` is the node whose position sits on top of `history`, the parent
    /// of the node being validated.
    fn validate_on(
        &self,
        base: &Position,
        tip: Option<NodeId>,
        x: usize,
        y: usize,
        color: Color,
    ) -> Result<Position, GameError> {
        if !base.contains(x, y) {
            return Err(GameError::OutOfBounds { x, y });
        }
        if base.stone(x, y).is_some() && !self.config.allow_rewrite {
            return Err(GameError::OccupiedPoint { x, y });
        }
        let mut pos = base.snapshot();
        pos.remove_stone(x, y);
        pos.play(x, y, color, self.config.allow_suicide)?;
        if self.is_repeating(&pos, tip) {
            return Err(GameError::RepeatingPosition { x, y });
        }
        pos.turn = color.opposite();
        Ok(pos)
    }

    fn is_repeating(&self, pos: &Position, tip: Option<NodeId>) -> bool {
        match self.config.repetition {
            Repetition::None => false,
            Repetition::Ko => self
                .before_last_move(tip)
                .is_some_and(|p| p.is_same_as(pos)),
            Repetition::All => self.history.iter().any(|p| p.is_same_as(pos)),
        }
    }

    /// Position before the last move on the line ending at `tip`. Nodes
    /// without a move (comments, setup) are skipped.
    fn before_last_move(&self, tip: Option<NodeId>) -> Option<&Position> {
        let mut id = tip?;
        let mut depth = self.history.len().checked_sub(1)?;
        while !self.tree.get(id).is_move() {
            id = self.tree.get(id).parent()?;
            depth = depth.checked_sub(1)?;
        }
        self.history.get(depth.checked_sub(1)?)
    }

    /// Board state after node `id`, starting from `base`.
    ///
    /// Applied in order: move, turn override, setup, markup.
    fn replay(&self, id: NodeId, base: &Position) -> Result<Position, GameError> {
        let node = self.tree.get(id);
        let mut pos = match node.mv {
            Some(Move {
                color,
                point: Some((x, y)),
            }) => self.validate_on(base, node.parent(), x, y, color)?,
            Some(Move { color, point: None }) => {
                let mut pos = base.snapshot();
                pos.turn = color.opposite();
                pos
            }
            None => base.snapshot(),
        };
        if let Some(turn) = node.turn {
            pos.turn = turn;
        }
        apply_setup(&mut pos, &node.setup);
        for entry in &node.markup {
            pos.set_markup(entry.x, entry.y, entry.markup.clone());
        }
        Ok(pos)
    }

    /// Replay the current node again, replacing its position.
    ///
    /// Used after the node's content has been edited in place.
    pub fn execute_node(&mut self) -> Result<(), GameError> {
        let last = self.history.len() - 1;
        let pos = if last == 0 {
            let mut base = Position::new(self.width(), self.height());
            if self.handicap() >= 2 {
                base.turn = Color::White;
            }
            self.replay(self.node, &base)?
        } else {
            // Validation of the node's move looks at the positions before it.
            let current = self.history.pop();
            let result = self.replay(self.node, &self.history[last - 1]);
            if let Some(current) = current {
                self.history.push(current);
            }
            result?
        };
        self.history[last] = pos;
        Ok(())
    }

    fn commit(&mut self, child: NodeId, index: usize, pos: Position) {
        self.tree.get_mut(self.node).last_selected = index;
        self.history.push(pos);
        self.node = child;
        self.path.advance(index);
        debug!(
            step = self.path.move_count(),
            variation = index,
            "Advanced to node {}",
            child.index()
        );
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Step to child `index` of the current node, or to the remembered (or
    /// first) child when `index` is `None`.
    pub fn next(&mut self, index: Option<usize>) -> Result<(), GameError> {
        let node = self.tree.get(self.node);
        let available = node.children().len();
        if available == 0 {
            return Err(GameError::NoNextNode);
        }
        let index = index.unwrap_or(if self.config.remember_path && node.last_selected < available {
            node.last_selected
        } else {
            0
        });
        let Some(&child) = node.children().get(index) else {
            return Err(GameError::NoSuchVariation { index, available });
        };
        let pos = self.replay(child, self.position())?;
        self.commit(child, index, pos);
        Ok(())
    }

    pub fn previous(&mut self) -> Result<(), GameError> {
        let Some(parent) = self.node().parent() else {
            return Err(GameError::NoPreviousNode);
        };
        self.history.pop();
        self.node = parent;
        self.path.retreat();
        Ok(())
    }

    /// Back to the root.
    pub fn first(&mut self) {
        self.history.truncate(1);
        self.node = self.tree.root();
        self.path = PathState::new();
    }

    /// Follow the remembered line to its end. Stops at the first node that
    /// cannot be replayed, returning its error.
    pub fn last(&mut self) -> Result<(), GameError> {
        while self.node().has_children() {
            self.next(None)?;
        }
        Ok(())
    }

    /// Replay from the root to `target`. On error the game is restored to
    /// where it was before the call.
    pub fn goto(&mut self, target: GotoTarget) -> Result<(), GameError> {
        let saved = (self.node, self.history.clone(), self.path.clone());
        let result = match target {
            GotoTarget::Move(n) => self.goto_move(n),
            GotoTarget::Named(name) => match self.tree.find_named(&name) {
                Some(id) => {
                    let path = PathState::from_route(&self.tree.route_to(id));
                    self.goto_path(&path)
                }
                None => Err(GameError::NodeNotFound(name)),
            },
            GotoTarget::Path(path) => self.goto_path(&path),
        };
        if result.is_err() {
            (self.node, self.history, self.path) = saved;
        }
        result
    }

    fn goto_move(&mut self, n: usize) -> Result<(), GameError> {
        let remembered = self.path.clone();
        self.first();
        while self.move_number() < n && self.node().has_children() {
            let step = self.path.move_count();
            let index = (step < remembered.move_count()).then(|| remembered.choice(step));
            self.next(index)?;
        }
        Ok(())
    }

    fn goto_path(&mut self, path: &PathState) -> Result<(), GameError> {
        self.first();
        for step in 0..path.move_count() {
            if !self.node().has_children() {
                break;
            }
            self.next(Some(path.choice(step)))?;
        }
        Ok(())
    }

    /// Advance until reaching a node with more than one child.
    pub fn next_fork(&mut self) -> Result<(), GameError> {
        while self.node().has_children() {
            self.next(None)?;
            if self.node().children().len() > 1 {
                break;
            }
        }
        Ok(())
    }

    /// Go back until reaching a node with more than one child, or the root.
    pub fn previous_fork(&mut self) -> Result<(), GameError> {
        while self.node().parent().is_some() {
            self.previous()?;
            if self.node().children().len() > 1 {
                break;
            }
        }
        Ok(())
    }

    /// Advance to the next node on the remembered line carrying a comment.
    /// Returns false, without moving, when there is none.
    pub fn next_comment(&mut self) -> Result<bool, GameError> {
        let mut steps = Vec::new();
        let mut cur = self.node;
        loop {
            let node = self.tree.get(cur);
            let available = node.children().len();
            if available == 0 {
                return Ok(false);
            }
            let index = if self.config.remember_path && node.last_selected < available {
                node.last_selected
            } else {
                0
            };
            cur = node.children()[index];
            steps.push(index);
            if self.tree.get(cur).comment.is_some() {
                break;
            }
        }
        let saved = (self.node, self.history.clone(), self.path.clone());
        for index in steps {
            if let Err(e) = self.next(Some(index)) {
                (self.node, self.history, self.path) = saved;
                return Err(e);
            }
        }
        Ok(true)
    }

    /// Go back to the closest ancestor carrying a comment.
    /// Returns false, without moving, when there is none.
    pub fn previous_comment(&mut self) -> Result<bool, GameError> {
        let mut steps = 0;
        let mut cur = self.node;
        loop {
            let Some(parent) = self.tree.get(cur).parent() else {
                return Ok(false);
            };
            cur = parent;
            steps += 1;
            if self.tree.get(cur).comment.is_some() {
                break;
            }
        }
        for _ in 0..steps {
            self.previous()?;
        }
        Ok(true)
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Play a stone for `color` (default: the side to move) at `(x, y)`.
    ///
    /// An existing child with the same move is entered instead of creating a
    /// duplicate variation. Returns the enemy stones captured.
    pub fn play(&mut self, x: usize, y: usize, color: Option<Color>) -> Result<Vec<Point>, GameError> {
        let color = color.unwrap_or(self.turn());
        let mv = Move::play(x, y, color);
        self.enter_or_create(mv)?;
        Ok(self.position().captures_of(color.opposite()).to_vec())
    }

    pub fn pass(&mut self, color: Option<Color>) -> Result<(), GameError> {
        let color = color.unwrap_or(self.turn());
        self.enter_or_create(Move::pass(color))
    }

    fn enter_or_create(&mut self, mv: Move) -> Result<(), GameError> {
        let existing = self
            .node()
            .children()
            .iter()
            .position(|&c| self.tree.get(c).mv == Some(mv));
        if let Some(index) = existing {
            return self.next(Some(index));
        }
        let node = MoveNode::with_move(mv);
        let pos = match mv.point {
            Some((x, y)) => self.validate_move(x, y, mv.color)?,
            None => {
                let mut pos = self.position().snapshot();
                pos.turn = mv.color.opposite();
                pos
            }
        };
        let child = self.tree.append_child(self.node, node);
        let index = self.node().children().len() - 1;
        self.commit(child, index, pos);
        Ok(())
    }

    /// Put a stone on the board at the current node, outside turn order.
    pub fn add_stone(&mut self, x: usize, y: usize, color: Color) -> Result<(), GameError> {
        if !self.position().contains(x, y) {
            return Err(GameError::OutOfBounds { x, y });
        }
        if self.position().stone(x, y).is_some() {
            return Err(GameError::OccupiedPoint { x, y });
        }
        self.edit_setup(Setup {
            x,
            y,
            color: Some(color),
        });
        Ok(())
    }

    /// Take a stone off the board at the current node.
    pub fn remove_stone(&mut self, x: usize, y: usize) -> Result<(), GameError> {
        if !self.position().contains(x, y) {
            return Err(GameError::OutOfBounds { x, y });
        }
        if self.position().stone(x, y).is_some() {
            self.edit_setup(Setup { x, y, color: None });
        }
        Ok(())
    }

    fn edit_setup(&mut self, setup: Setup) {
        let node = self.tree.get_mut(self.node);
        node.setup.retain(|s| (s.x, s.y) != (setup.x, setup.y));
        node.setup.push(setup);
        let last = self.history.len() - 1;
        apply_setup(&mut self.history[last], &[setup]);
    }

    pub fn add_markup(&mut self, x: usize, y: usize, markup: Markup) -> Result<(), GameError> {
        if !self.position().contains(x, y) {
            return Err(GameError::OutOfBounds { x, y });
        }
        let node = self.tree.get_mut(self.node);
        node.markup.retain(|m| (m.x, m.y) != (x, y));
        node.markup.push(MarkupEntry {
            x,
            y,
            markup: markup.clone(),
        });
        let last = self.history.len() - 1;
        self.history[last].set_markup(x, y, markup);
        Ok(())
    }

    pub fn remove_markup(&mut self, x: usize, y: usize) -> Result<(), GameError> {
        if !self.position().contains(x, y) {
            return Err(GameError::OutOfBounds { x, y });
        }
        self.tree
            .get_mut(self.node)
            .markup
            .retain(|m| (m.x, m.y) != (x, y));
        let last = self.history.len() - 1;
        self.history[last].remove_markup(x, y);
        Ok(())
    }

    pub fn set_comment(&mut self, comment: Option<String>) {
        self.tree.get_mut(self.node).comment = comment;
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.tree.get_mut(self.node).name = name;
    }

    /// Detach the current node and its subtree, stepping back to its parent.
    pub fn delete_branch(&mut self) -> Result<(), GameError> {
        let id = self.node;
        self.previous()?;
        self.tree.remove(id);
        Ok(())
    }
}

/// Apply setup instructions: placements and removals first, then remove
/// enemy groups left without liberties next to placed stones, then placed
/// groups that have none themselves.
fn apply_setup(pos: &mut Position, setup: &[Setup]) {
    for s in setup {
        match s.color {
            Some(color) => pos.set_stone(s.x, s.y, color),
            None => pos.remove_stone(s.x, s.y),
        }
    }
    let placed = setup
        .iter()
        .filter_map(|s| s.color.map(|c| (s.x, s.y, c)));
    for (x, y, color) in placed.clone() {
        if pos.stone(x, y) == Some(color) {
            pos.capture_adjacent(x, y, color);
        }
    }
    for (x, y, color) in placed {
        if pos.can_capture(x, y, color) {
            pos.capture_group(x, y, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_game() {
        let game = Game::new(9, 9);
        assert_eq!(game.width(), 9);
        assert_eq!(game.turn(), Color::Black);
        assert_eq!(game.move_number(), 0);
        assert_eq!(game.path().move_count(), 0);
    }

    #[test]
    fn test_validate_move_does_not_commit() {
        let game = Game::new(9, 9);
        let pos = game.validate_move(4, 4, Color::Black).unwrap();
        assert_eq!(pos.stone(4, 4), Some(Color::Black));
        assert_eq!(pos.turn, Color::White);
        assert_eq!(game.position().stone(4, 4), None);
    }

    #[test]
    fn test_out_of_bounds_and_occupied() {
        let mut game = Game::new(9, 9);
        assert_eq!(
            game.play(9, 0, None),
            Err(GameError::OutOfBounds { x: 9, y: 0 })
        );
        game.play(0, 0, None).unwrap();
        assert_eq!(
            game.play(0, 0, None),
            Err(GameError::OccupiedPoint { x: 0, y: 0 })
        );
        assert_eq!(game.move_number(), 1);
    }

    #[test]
    fn test_allow_rewrite() {
        let mut game = Game::new(9, 9);
        game.config_mut().allow_rewrite = true;
        game.play(0, 0, None).unwrap();
        game.play(0, 0, None).unwrap();
        assert_eq!(game.position().stone(0, 0), Some(Color::White));
    }

    #[test]
    fn test_play_reuses_existing_child() {
        let mut game = Game::new(9, 9);
        game.play(2, 2, None).unwrap();
        game.previous().unwrap();
        game.play(2, 2, None).unwrap();
        assert_eq!(game.tree().get(game.tree().root()).children().len(), 1);
    }

    #[test]
    fn test_pass_flips_turn() {
        let mut game = Game::new(9, 9);
        game.pass(None).unwrap();
        assert_eq!(game.turn(), Color::White);
        assert_eq!(game.move_number(), 1);
        assert!(game.node().mv.is_some_and(|m| m.is_pass()));
    }

    #[test]
    fn test_setup_and_markup_edit() {
        let mut game = Game::new(9, 9);
        game.add_stone(3, 3, Color::White).unwrap();
        assert_eq!(game.position().stone(3, 3), Some(Color::White));
        assert_eq!(
            game.add_stone(3, 3, Color::Black),
            Err(GameError::OccupiedPoint { x: 3, y: 3 })
        );
        game.remove_stone(3, 3).unwrap();
        assert_eq!(game.position().stone(3, 3), None);
        assert_eq!(game.node().setup.len(), 1);

        game.add_markup(1, 1, Markup::Triangle).unwrap();
        assert_eq!(game.position().markup(1, 1), Some(&Markup::Triangle));
        game.remove_markup(1, 1).unwrap();
        assert!(game.node().markup.is_empty());
        assert_eq!(game.position().markup(1, 1), None);
    }

    #[test]
    fn test_setup_captures_on_placement() {
        let mut game = Game::new(5, 5);
        game.add_stone(1, 0, Color::Black).unwrap();
        game.add_stone(0, 0, Color::White).unwrap();
        game.add_stone(0, 1, Color::Black).unwrap();
        assert_eq!(game.position().stone(0, 0), None);
    }

    #[test]
    fn test_markup_is_per_node() {
        let mut game = Game::new(9, 9);
        game.add_markup(0, 0, Markup::Circle).unwrap();
        game.play(4, 4, None).unwrap();
        assert_eq!(game.position().markup(0, 0), None);
        game.previous().unwrap();
        assert_eq!(game.position().markup(0, 0), Some(&Markup::Circle));
    }

    #[test]
    fn test_delete_branch() {
        let mut game = Game::new(9, 9);
        game.play(4, 4, None).unwrap();
        game.delete_branch().unwrap();
        assert_eq!(game.current_node(), game.tree().root());
        assert!(!game.node().has_children());
        assert_eq!(game.delete_branch(), Err(GameError::NoPreviousNode));
    }

    #[test]
    fn test_handicap_makes_white_first() {
        let mut info = GameInfo::default();
        info.handicap = Some(2);
        let game =
            Game::from_tree(MoveTree::default(), info, 9, 9, GameConfig::default()).unwrap();
        assert_eq!(game.turn(), Color::White);
    }

    #[test]
    fn test_execute_node_after_edit() {
        let mut game = Game::new(9, 9);
        game.play(4, 4, None).unwrap();
        let id = game.current_node();
        game.tree.get_mut(id).turn = Some(Color::Black);
        game.execute_node().unwrap();
        assert_eq!(game.turn(), Color::Black);
        assert_eq!(game.position().stone(4, 4), Some(Color::Black));
    }
}
