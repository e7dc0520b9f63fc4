//! Column gravity: letters slide straight down into empty cells, keeping their vertical order.

use crate::grid::{Cell, Grid, Pos};

/// One letter that changed position during a settle pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fall {
    pub letter: char,
    pub from: Pos,
    pub to: Pos,
}

/// Compact every column downward in one pass. Returns the letters that moved.
///
/// Columns are independent; nothing moves sideways. Empty space ends up at the top.
pub fn settle(grid: &mut Grid) -> Vec<Fall> {
    let mut falls = Vec::new();
    for col in 0..grid.cols() {
        // Next free slot, scanning upward from the floor.
        let mut write = grid.rows();
        for row in (0..grid.rows()).rev() {
            let Ok(Cell::Letter(letter)) = grid.get(row, col) else {
                continue;
            };
            write -= 1;
            if write != row {
                grid.put(Pos::new(write, col), Cell::Letter(letter));
                grid.put(Pos::new(row, col), Cell::Empty);
                falls.push(Fall {
                    letter,
                    from: Pos::new(row, col),
                    to: Pos::new(write, col),
                });
            }
        }
    }
    falls
}

/// True if no letter sits above an empty cell in its column.
pub fn is_settled(grid: &Grid) -> bool {
    (0..grid.cols()).all(|col| {
        let mut seen_letter = false;
        (0..grid.rows()).all(|row| match grid.get(row, col) {
            Ok(Cell::Letter(_)) => {
                seen_letter = true;
                true
            }
            _ => !seen_letter,
        })
    })
}
