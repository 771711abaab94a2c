//! Which variation was taken at each step of the current line.
//!
//! Only non-default choices (child index above zero) are stored, so a path
//! costs memory proportional to the number of branches taken, not to the
//! length of the line.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathState {
    /// Steps taken from the root
    m: usize,
    /// Step number -> child index chosen there
    choices: BTreeMap<usize, usize>,
}

impl PathState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of steps taken from the root.
    pub fn move_count(&self) -> usize {
        self.m
    }

    /// Number of non-default choices on the path.
    pub fn branches(&self) -> usize {
        self.choices.len()
    }

    /// Child index chosen when leaving step `step` (0 if none recorded).
    pub fn choice(&self, step: usize) -> usize {
        self.choices.get(&step).copied().unwrap_or(0)
    }

    pub fn choices(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.choices.iter().map(|(&k, &v)| (k, v))
    }

    /// Take child `index` from the current step.
    pub fn advance(&mut self, index: usize) {
        if index > 0 {
            self.choices.insert(self.m, index);
        } else {
            self.choices.remove(&self.m);
        }
        self.m += 1;
    }

    /// Undo the last step.
    pub fn retreat(&mut self) {
        if self.m == 0 {
            return;
        }
        self.m -= 1;
        self.choices.remove(&self.m);
    }

    /// Jump to step `n`, forgetting choices made at or after it.
    pub fn set_move(&mut self, n: usize) {
        self.m = n;
        self.choices.retain(|&k, _| k < n);
    }

    /// Same step count and the same branch choices.
    pub fn is_same_as(&self, other: &PathState) -> bool {
        self.m == other.m
            && self.branches() == other.branches()
            && self.choices.iter().all(|(k, v)| other.choices.get(k) == Some(v))
    }

    /// Path following `route` child indices from the root.
    pub fn from_route(route: &[usize]) -> Self {
        let mut path = Self::new();
        for &i in route {
            path.advance(i);
        }
        path
    }
}
