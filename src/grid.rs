//! Board storage: a fixed-size grid of letter cells. Row 0 is the top.

use std::fmt;
use thiserror::Error;

/// Single cell: either empty or holding one letter of the alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    Letter(char),
}

impl Cell {
    #[inline]
    pub fn letter(self) -> Option<char> {
        match self {
            Self::Letter(c) => Some(c),
            Self::Empty => None,
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::Empty
    }
}

/// Cell coordinate. Ordering is row-major, which is what match identity sorts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Neighbour one step in `dir`, or None if that would leave a `rows` x `cols` grid.
    pub fn step(self, dir: Direction, rows: usize, cols: usize) -> Option<Self> {
        let (dr, dc) = dir.delta();
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        (row < rows && col < cols).then_some(Self { row, col })
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The four orthogonal directions used for cursor movement, swaps and adjacency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// (row delta, column delta).
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Self::Up => (-1, 0),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
            Self::Right => (0, 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

/// Fixed-size letter grid, row-major flat storage (row * cols + col).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Create an all-empty grid.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Cell::Empty; rows * cols],
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> Option<usize> {
        self.is_in_bounds(row, col).then(|| row * self.cols + col)
    }

    fn out_of_bounds(&self, row: usize, col: usize) -> GridError {
        GridError::OutOfBounds {
            row,
            col,
            rows: self.rows,
            cols: self.cols,
        }
    }

    #[inline]
    pub fn is_in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Result<Cell, GridError> {
        self.index(row, col)
            .map(|idx| self.cells[idx])
            .ok_or_else(|| self.out_of_bounds(row, col))
    }

    pub fn set(&mut self, row: usize, col: usize, cell: Cell) -> Result<(), GridError> {
        let idx = self
            .index(row, col)
            .ok_or_else(|| self.out_of_bounds(row, col))?;
        self.cells[idx] = cell;
        Ok(())
    }

    #[inline]
    pub fn get_at(&self, pos: Pos) -> Result<Cell, GridError> {
        self.get(pos.row, pos.col)
    }

    /// Set a cell the caller already knows is on the grid. Panics otherwise.
    pub(crate) fn put(&mut self, pos: Pos, cell: Cell) {
        assert!(
            self.is_in_bounds(pos.row, pos.col),
            "{pos} is outside the {}x{} grid",
            self.rows,
            self.cols
        );
        let idx = pos.row * self.cols + pos.col;
        self.cells[idx] = cell;
    }

    /// Exchange the contents of two cells. Both must be in bounds; nothing changes otherwise.
    pub fn swap(&mut self, a: Pos, b: Pos) -> Result<(), GridError> {
        let ia = self
            .index(a.row, a.col)
            .ok_or_else(|| self.out_of_bounds(a.row, a.col))?;
        let ib = self
            .index(b.row, b.col)
            .ok_or_else(|| self.out_of_bounds(b.row, b.col))?;
        self.cells.swap(ia, ib);
        Ok(())
    }

    /// In-bounds orthogonal neighbours of `pos`.
    pub fn neighbours(&self, pos: Pos) -> impl Iterator<Item = Pos> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(move |dir| pos.step(dir, self.rows, self.cols))
    }

    /// All cells with their coordinates, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Pos, Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, &cell)| (Pos::new(i / self.cols, i % self.cols), cell))
    }

    /// One row as a slice; empty slice when `row` is out of range.
    pub fn row(&self, row: usize) -> &[Cell] {
        if row >= self.rows {
            return &[];
        }
        let start = row * self.cols;
        &self.cells[start..start + self.cols]
    }

    pub fn letter_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }

    /// Letters of the grid with multiplicity, sorted. Positions are ignored.
    pub fn letter_multiset(&self) -> Vec<char> {
        let mut letters: Vec<char> = self.cells.iter().filter_map(|c| c.letter()).collect();
        letters.sort_unstable();
        letters
    }

    /// Build a grid from string rows, `_` or `.` for empty. Test fixture helper.
    #[cfg(test)]
    pub fn from_rows(rows: &[&str]) -> Self {
        let cols = rows.first().map_or(0, |r| r.chars().count());
        let mut grid = Self::new(rows.len(), cols);
        for (r, line) in rows.iter().enumerate() {
            assert_eq!(line.chars().count(), cols, "ragged fixture row {r}");
            for (c, ch) in line.chars().enumerate() {
                let cell = match ch {
                    '_' | '.' => Cell::Empty,
                    other => Cell::Letter(other),
                };
                grid.set(r, c, cell).unwrap();
            }
        }
        grid
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            if r > 0 {
                writeln!(f)?;
            }
            for cell in self.row(r) {
                write!(f, "{}", cell.letter().unwrap_or('_'))?;
            }
        }
        Ok(())
    }
}
