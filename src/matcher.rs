//! Match detection: connected groups of the same letter (4-neighbour) of at least `min_size` cells.

use crate::grid::{Grid, Pos};

/// A crushable group. Cells are sorted row-major, so two matches with the same cells compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Match {
    letter: char,
    cells: Vec<Pos>,
}

impl Match {
    pub fn letter(&self) -> char {
        self.letter
    }

    pub fn cells(&self) -> &[Pos] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, pos: Pos) -> bool {
        self.cells.binary_search(&pos).is_ok()
    }
}

/// All disjoint matches in `grid`, ordered by their first (top-left-most) cell.
///
/// Flood fill over same-letter cells; components smaller than `min_size` are discarded.
/// Result depends only on grid contents, never on previous calls.
pub fn find_matches(grid: &Grid, min_size: usize) -> Vec<Match> {
    let mut visited = vec![false; grid.rows() * grid.cols()];
    let flat = |p: Pos| p.row * grid.cols() + p.col;
    let mut matches = Vec::new();

    for (start, cell) in grid.iter() {
        let Some(letter) = cell.letter() else {
            continue;
        };
        if visited[flat(start)] {
            continue;
        }
        visited[flat(start)] = true;

        let mut component = Vec::new();
        let mut stack = vec![start];
        while let Some(pos) = stack.pop() {
            component.push(pos);
            for next in grid.neighbours(pos) {
                if visited[flat(next)] {
                    continue;
                }
                if grid.get_at(next).ok().and_then(|c| c.letter()) == Some(letter) {
                    visited[flat(next)] = true;
                    stack.push(next);
                }
            }
        }

        if component.len() >= min_size {
            component.sort_unstable();
            matches.push(Match {
                letter,
                cells: component,
            });
        }
    }
    matches
}
