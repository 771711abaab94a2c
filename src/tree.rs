//! The move tree: every explored continuation of a game record.
//!
//! Nodes live in an arena owned by [`MoveTree`] and refer to each other by
//! [`NodeId`]. The `children` list of a node is the only ownership path; the
//! `parent` field is a back-reference used for walking up. A node detached
//! from its parent stays in the arena but is no longer reachable.

use crate::color::Color;
use crate::position::{Markup, Point};

/// Stable handle of a node inside a [`MoveTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A played move: a stone at a point, or a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub color: Color,
    /// `None` for a pass
    pub point: Option<Point>,
}

impl Move {
    pub fn play(x: usize, y: usize, color: Color) -> Self {
        Self {
            color,
            point: Some((x, y)),
        }
    }

    pub fn pass(color: Color) -> Self {
        Self { color, point: None }
    }

    pub fn is_pass(&self) -> bool {
        self.point.is_none()
    }
}

/// Direct stone placement (`Some`) or removal (`None`) outside turn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Setup {
    pub x: usize,
    pub y: usize,
    pub color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupEntry {
    pub x: usize,
    pub y: usize,
    pub markup: Markup,
}

/// One node of the move tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveNode {
    pub mv: Option<Move>,
    /// Color to move after this node, overriding the normal alternation
    pub turn: Option<Color>,
    pub setup: Vec<Setup>,
    pub markup: Vec<MarkupEntry>,
    pub comment: Option<String>,
    pub name: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Child chosen the last time play left this node
    pub(crate) last_selected: usize,
}

impl MoveNode {
    pub fn with_move(mv: Move) -> Self {
        Self {
            mv: Some(mv),
            ..Self::default()
        }
    }

    pub fn is_move(&self) -> bool {
        self.mv.is_some()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Arena of [`MoveNode`]s rooted at [`MoveTree::root`].
#[derive(Debug, Clone)]
pub struct MoveTree {
    nodes: Vec<MoveNode>,
    root: NodeId,
}

impl Default for MoveTree {
    fn default() -> Self {
        Self::new(MoveNode::default())
    }
}

impl MoveTree {
    pub fn new(root: MoveNode) -> Self {
        let mut root = root;
        root.parent = None;
        root.children.clear();
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> &MoveNode {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut MoveNode {
        &mut self.nodes[id.0]
    }

    /// Add a detached node to the arena.
    pub fn create(&mut self, node: MoveNode) -> NodeId {
        let mut node = node;
        node.parent = None;
        node.children.clear();
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Create `node` and attach it as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, node: MoveNode) -> NodeId {
        let id = self.create(node);
        self.append_to(id, parent);
        id
    }

    /// Re-parent `id` under `parent`, detaching it from any prior parent.
    pub fn append_to(&mut self, id: NodeId, parent: NodeId) {
        self.remove(id);
        self.nodes[id.0].parent = Some(parent);
        self.nodes[parent.0].children.push(id);
    }

    /// Detach `id` from its parent. The subtree becomes unreachable.
    pub fn remove(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            let siblings = &mut self.nodes[parent.0].children;
            if let Some(i) = siblings.iter().position(|&c| c == id) {
                siblings.remove(i);
            }
            let parent = &mut self.nodes[parent.0];
            if parent.last_selected >= parent.children.len() {
                parent.last_selected = 0;
            }
        }
    }

    /// Swap `id` with its previous sibling. Returns false at the first slot.
    pub fn move_up(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.nodes[id.0].parent else {
            return false;
        };
        let siblings = &mut self.nodes[parent.0].children;
        match siblings.iter().position(|&c| c == id) {
            Some(i) if i > 0 => {
                siblings.swap(i - 1, i);
                true
            }
            _ => false,
        }
    }

    /// Swap `id` with its next sibling. Returns false at the last slot.
    pub fn move_down(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.nodes[id.0].parent else {
            return false;
        };
        let siblings = &mut self.nodes[parent.0].children;
        match siblings.iter().position(|&c| c == id) {
            Some(i) if i + 1 < siblings.len() => {
                siblings.swap(i, i + 1);
                true
            }
            _ => false,
        }
    }

    /// Splice `node` between `id` and its children: the new node becomes the
    /// only child of `id` and adopts all of its former children.
    pub fn insert_node(&mut self, id: NodeId, node: MoveNode) -> NodeId {
        let new_id = self.create(node);
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for &child in &children {
            self.nodes[child.0].parent = Some(new_id);
        }
        self.nodes[new_id.0].children = children;
        self.nodes[new_id.0].parent = Some(id);
        self.nodes[id.0].children.push(new_id);
        self.nodes[id.0].last_selected = 0;
        new_id
    }

    /// Children of `id` that carry a move.
    pub fn move_variations(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(|&c| self.nodes[c.0].is_move())
            .collect()
    }

    /// More than one child plays a move.
    pub fn has_move_variations(&self, id: NodeId) -> bool {
        self.move_variations(id).len() > 1
    }

    /// Index among the children of `id` of the child playing at `(x, y)`.
    pub fn move_variation_at(&self, id: NodeId, x: usize, y: usize) -> Option<usize> {
        self.nodes[id.0].children.iter().position(|&c| {
            self.nodes[c.0]
                .mv
                .is_some_and(|mv| mv.point == Some((x, y)))
        })
    }

    pub fn is_move_variation(&self, id: NodeId, x: usize, y: usize) -> bool {
        self.move_variation_at(id, x, y).is_some()
    }

    /// Number of move nodes on the way from the root to `id`, inclusive.
    pub fn move_number(&self, id: NodeId) -> usize {
        let mut count = 0;
        let mut cur = Some(id);
        while let Some(n) = cur {
            if self.nodes[n.0].is_move() {
                count += 1;
            }
            cur = self.nodes[n.0].parent;
        }
        count
    }

    /// Number of steps from the root to `id`.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut cur = self.nodes[id.0].parent;
        while let Some(n) = cur {
            depth += 1;
            cur = self.nodes[n.0].parent;
        }
        depth
    }

    /// Child indices leading from the root down to `id`.
    pub fn route_to(&self, id: NodeId) -> Vec<usize> {
        let mut route = Vec::new();
        let mut cur = id;
        while let Some(parent) = self.nodes[cur.0].parent {
            let i = self.nodes[parent.0]
                .children
                .iter()
                .position(|&c| c == cur)
                .unwrap_or(0);
            route.push(i);
            cur = parent;
        }
        route.reverse();
        route
    }

    /// First node named `name` in depth-first, first-child-first order.
    pub fn find_named(&self, name: &str) -> Option<NodeId> {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if node.name.as_deref() == Some(name) {
                return Some(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// Nodes reachable from the root, depth first.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        out
    }
}
