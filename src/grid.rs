//! Bounded 2D container used for stones, markup and scoring states.
//!
//! Every lookup is bounds-checked: reading outside the grid yields the empty
//! cell and writing outside the grid does nothing.

use tracing::warn;

/// A populated cell, as returned by [`Grid::get_all`] and [`Grid::compare`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell<T> {
    pub x: usize,
    pub y: usize,
    pub value: T,
}

/// Cells added and removed going from one grid to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridDiff<T> {
    pub add: Vec<Cell<T>>,
    pub remove: Vec<Cell<T>>,
}

impl<T> Default for GridDiff<T> {
    fn default() -> Self {
        Self {
            add: Vec::new(),
            remove: Vec::new(),
        }
    }
}

impl<T> GridDiff<T> {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// A width x height array of optional values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<Option<T>>,
}

impl<T> Default for Grid<T> {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            cells: Vec::new(),
        }
    }
}

impl<T: Clone + PartialEq> Grid<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Reshape the grid, dropping every value.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.cells = vec![None; width * height];
    }

    #[inline]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    fn idx(&self, x: usize, y: usize) -> Option<usize> {
        self.contains(x, y).then(|| y * self.width + x)
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        self.idx(x, y).and_then(|i| self.cells[i].as_ref())
    }

    pub fn has(&self, x: usize, y: usize) -> bool {
        self.get(x, y).is_some()
    }

    /// True when the cell holds exactly `value`.
    pub fn is(&self, x: usize, y: usize, value: &T) -> bool {
        self.get(x, y) == Some(value)
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        if let Some(i) = self.idx(x, y) {
            self.cells[i] = Some(value);
        }
    }

    pub fn unset(&mut self, x: usize, y: usize) {
        if let Some(i) = self.idx(x, y) {
            self.cells[i] = None;
        }
    }

    /// Fill every cell with `value`.
    pub fn populate(&mut self, value: T) {
        for cell in &mut self.cells {
            *cell = Some(value.clone());
        }
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = None;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// Populated cells in row-major order.
    pub fn get_all(&self) -> Vec<Cell<T>> {
        let mut out = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if let Some(value) = self.get(x, y) {
                    out.push(Cell {
                        x,
                        y,
                        value: value.clone(),
                    });
                }
            }
        }
        out
    }

    /// Same size and same content.
    pub fn is_same_as(&self, other: &Grid<T>) -> bool {
        self == other
    }

    /// Diff from `self` to `other`: what must be added and removed to turn
    /// this grid into `other`. A changed value appears in both lists.
    ///
    /// Grids of different sizes cannot be compared and yield an empty diff.
    pub fn compare(&self, other: &Grid<T>) -> GridDiff<T> {
        let mut diff = GridDiff::default();
        if self.width != other.width || self.height != other.height {
            warn!(
                from = ?(self.width, self.height),
                to = ?(other.width, other.height),
                "Cannot compare grids of different size"
            );
            return diff;
        }
        for y in 0..self.height {
            for x in 0..self.width {
                let before = self.get(x, y);
                let after = other.get(x, y);
                if before == after {
                    continue;
                }
                if let Some(value) = before {
                    diff.remove.push(Cell {
                        x,
                        y,
                        value: value.clone(),
                    });
                }
                if let Some(value) = after {
                    diff.add.push(Cell {
                        x,
                        y,
                        value: value.clone(),
                    });
                }
            }
        }
        diff
    }

    /// The in-bounds orthogonal neighbors (west, east, north, south).
    pub fn neighbors(&self, x: usize, y: usize) -> std::vec::IntoIter<(usize, usize)> {
        let (w, h) = (self.width, self.height);
        let mut v = Vec::with_capacity(4);
        if x < w && y < h {
            if x > 0 {
                v.push((x - 1, y));
            }
            if x + 1 < w {
                v.push((x + 1, y));
            }
            if y > 0 {
                v.push((x, y - 1));
            }
            if y + 1 < h {
                v.push((x, y + 1));
            }
        }
        v.into_iter()
    }
}
