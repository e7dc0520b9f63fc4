//! Game state: board, cursor, score, next letter and spawning.
//!
//! Every mutation (swap, drop, spawn) is a triggering event: the board is settled and the
//! cascade engine is run to idle before the call returns.

use crate::cascade::{CascadeEngine, CascadeReport};
use crate::config::BoardConfig;
use crate::gravity;
use crate::grid::{Cell, Direction, Grid, Pos};
use crate::input::Intent;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace};

/// What applying an intent or a tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing happened (no spawn due, or nothing to do).
    Idle,
    CursorMoved,
    /// The board was mutated and fully resolved.
    Resolved(CascadeReport),
    /// Invalid swap, drop into a full column, or input after game over.
    Rejected,
    Quit,
    /// A spawn was due but the top row is full.
    GameOver,
}

/// Read-only view published to the renderer after each loop iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub grid: Grid,
    pub cursor: Pos,
    pub score: u64,
    /// Deepest cascade depth of the most recent resolution that crushed anything.
    pub last_depth: Option<u32>,
    pub next_letter: char,
    pub turn: u64,
    pub game_over: bool,
    /// Cells emptied by the most recent resolution.
    pub crushed: Vec<Pos>,
}

#[derive(Debug)]
pub struct GameState {
    grid: Grid,
    cursor: Pos,
    score: u64,
    turn: u64,
    alphabet: Vec<char>,
    next_letter: char,
    engine: CascadeEngine,
    rng: StdRng,
    spawn_every: u32,
    ticks: u64,
    game_over: bool,
    last_depth: Option<u32>,
    crushed: Vec<Pos>,
}

impl GameState {
    /// Build the starting board from a validated config, or from `preset` when given.
    ///
    /// The starting board is stabilised without scoring, so play begins with no standing
    /// match and a score of zero.
    pub fn new(config: &BoardConfig, preset: Option<Grid>) -> Self {
        let mut rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let alphabet = config.alphabet.clone();

        let mut grid = preset.unwrap_or_else(|| {
            let mut grid = Grid::new(config.rows, config.cols);
            let first_fill = config.rows.saturating_sub(config.fill_rows);
            for row in first_fill..config.rows {
                for col in 0..config.cols {
                    let letter = alphabet[rng.random_range(0..alphabet.len())];
                    grid.put(Pos::new(row, col), Cell::Letter(letter));
                }
            }
            grid
        });

        let mut engine = CascadeEngine::new(config.policy, config.min_match);
        gravity::settle(&mut grid);
        let mut discarded = 0;
        let settled = engine.resolve(&mut grid, &mut discarded);
        debug!(
            crushed = settled.letters_crushed(),
            "starting board stabilised"
        );

        let next_letter = alphabet[rng.random_range(0..alphabet.len())];
        let cursor = Pos::new(grid.rows() / 2, grid.cols() / 2);
        Self {
            grid,
            cursor,
            score: 0,
            turn: 0,
            alphabet,
            next_letter,
            engine,
            rng,
            spawn_every: config.spawn_every,
            ticks: 0,
            game_over: false,
            last_depth: None,
            crushed: Vec::new(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn cursor(&self) -> Pos {
        self.cursor
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn next_letter(&self) -> char {
        self.next_letter
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn last_depth(&self) -> Option<u32> {
        self.last_depth
    }

    pub fn is_cascade_idle(&self) -> bool {
        self.engine.is_idle()
    }

    /// Apply one player intent.
    pub fn apply(&mut self, intent: Intent) -> Outcome {
        if intent == Intent::Quit {
            return Outcome::Quit;
        }
        if self.game_over {
            return Outcome::Rejected;
        }
        match intent {
            Intent::MoveCursor(dir) => self.move_cursor(dir),
            Intent::Swap(dir) => self.swap(dir),
            Intent::Drop => self.drop_letter(),
            Intent::Quit => Outcome::Quit,
        }
    }

    /// Advance the spawn clock by one tick.
    pub fn tick(&mut self) -> Outcome {
        if self.game_over {
            return Outcome::Idle;
        }
        self.ticks += 1;
        if self.spawn_every == 0 || self.ticks % u64::from(self.spawn_every) != 0 {
            return Outcome::Idle;
        }
        self.spawn()
    }

    fn move_cursor(&mut self, dir: Direction) -> Outcome {
        match self.cursor.step(dir, self.grid.rows(), self.grid.cols()) {
            Some(pos) => {
                self.cursor = pos;
                Outcome::CursorMoved
            }
            None => Outcome::Rejected,
        }
    }

    /// Swap the cursor cell with its neighbour. Out-of-bounds targets are a silent no-op.
    fn swap(&mut self, dir: Direction) -> Outcome {
        let Some(target) = self.cursor.step(dir, self.grid.rows(), self.grid.cols()) else {
            trace!(cursor = %self.cursor, ?dir, "swap rejected");
            return Outcome::Rejected;
        };
        if self.grid.swap(self.cursor, target).is_err() {
            return Outcome::Rejected;
        }
        self.turn += 1;
        Outcome::Resolved(self.resolve())
    }

    /// Drop the next letter into the cursor's column. A full column rejects the drop.
    fn drop_letter(&mut self) -> Outcome {
        let col = self.cursor.col;
        if !matches!(self.grid.get(0, col), Ok(Cell::Empty)) {
            trace!(col, "drop rejected, column full");
            return Outcome::Rejected;
        }
        self.grid.put(Pos::new(0, col), Cell::Letter(self.next_letter));
        self.next_letter = self.random_letter();
        self.turn += 1;
        Outcome::Resolved(self.resolve())
    }

    fn spawn(&mut self) -> Outcome {
        let free: Vec<usize> = (0..self.grid.cols())
            .filter(|&col| matches!(self.grid.get(0, col), Ok(Cell::Empty)))
            .collect();
        if free.is_empty() {
            self.game_over = true;
            info!(score = self.score, turn = self.turn, "board full, game over");
            return Outcome::GameOver;
        }
        let col = free[self.rng.random_range(0..free.len())];
        let letter = self.random_letter();
        self.grid.put(Pos::new(0, col), Cell::Letter(letter));
        trace!(col, %letter, "spawned");
        Outcome::Resolved(self.resolve())
    }

    fn random_letter(&mut self) -> char {
        self.alphabet[self.rng.random_range(0..self.alphabet.len())]
    }

    /// Settle the mutated board, then run the cascade engine to idle.
    fn resolve(&mut self) -> CascadeReport {
        let mut falls = gravity::settle(&mut self.grid);
        let mut report = self.engine.resolve(&mut self.grid, &mut self.score);
        falls.append(&mut report.falls);
        report.falls = falls;
        self.crushed = report.crushed_cells().collect();
        if let Some(depth) = report.max_depth() {
            self.last_depth = Some(depth);
            debug!(
                depth,
                points = report.points(),
                letters = report.letters_crushed(),
                score = self.score,
                "cascade resolved"
            );
        }
        report
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            grid: self.grid.clone(),
            cursor: self.cursor,
            score: self.score,
            last_depth: self.last_depth,
            next_letter: self.next_letter,
            turn: self.turn,
            game_over: self.game_over,
            crushed: self.crushed.clone(),
        }
    }

    /// Build a state around an exact board, no random fill, spawning disabled.
    #[cfg(test)]
    pub fn with_grid(grid: Grid) -> Self {
        let config = BoardConfig {
            rows: grid.rows(),
            cols: grid.cols(),
            spawn_every: 0,
            fill_rows: 0,
            seed: Some(7),
            ..BoardConfig::default()
        };
        Self::new(&config, Some(grid))
    }

    #[cfg(test)]
    pub fn set_cursor(&mut self, pos: Pos) {
        self.cursor = pos;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher;

    #[test]
    fn standing_match_is_crushed_at_start_without_score() {
        // 5x5 with a ready-made row of three A; a swap away from it changes nothing.
        let grid = Grid::from_rows(&["_____", "_____", "_____", "_____", "BAAAC"]);
        let mut state = GameState::with_grid(grid);
        assert_eq!(state.grid().to_string(), "_____\n_____\n_____\n_____\nB___C");
        state.set_cursor(Pos::new(0, 0));
        let outcome = state.apply(Intent::Swap(Direction::Right));
        assert!(matches!(outcome, Outcome::Resolved(ref r) if r.is_quiet()));
        assert_eq!(state.score(), 0);
    }

    #[test]
    fn swap_completing_a_row_scores_once_at_depth_zero() {
        let grid = Grid::from_rows(&["____", "____", "AABC", "BCAC"]);
        let mut state = GameState::with_grid(grid);
        state.set_cursor(Pos::new(2, 2));
        let Outcome::Resolved(report) = state.apply(Intent::Swap(Direction::Down)) else {
            panic!("swap should resolve");
        };
        assert_eq!(report.crushes.len(), 1);
        assert_eq!(report.crushes[0].depth, 0);
        assert_eq!(report.crushes[0].matches.len(), 1);
        assert_eq!(report.crushes[0].matches[0].len(), 3);
        assert_eq!(state.score(), 3 * 10);
        assert_eq!(state.last_depth(), Some(0));
        assert!(state.is_cascade_idle());
    }

    #[test]
    fn gravity_after_a_crush_cascades_at_depth_one() {
        // Swapping the top A down makes a vertical A A A; crushing it drops the B
        // beside the two B on the floor.
        let grid = Grid::from_rows(&[
            "A___", //
            "B___", //
            "A___", //
            "ABBC", //
        ]);
        let mut state = GameState::with_grid(grid);
        state.set_cursor(Pos::new(0, 0));
        let Outcome::Resolved(report) = state.apply(Intent::Swap(Direction::Down)) else {
            panic!("swap should resolve");
        };
        assert_eq!(report.crushes.len(), 2);
        assert_eq!(report.crushes[0].depth, 0);
        assert_eq!(report.crushes[0].points, 3 * 10);
        assert_eq!(report.crushes[1].depth, 1);
        assert_eq!(report.crushes[1].letters(), 3);
        assert_eq!(report.crushes[1].points, 3 * 10 * 2);
        assert_eq!(state.score(), 90);
        assert_eq!(state.last_depth(), Some(1));
        assert_eq!(state.grid().to_string(), "____\n____\n____\n___C");
        assert!(state.is_cascade_idle());
        assert!(matcher::find_matches(state.grid(), 3).is_empty());
    }

    #[test]
    fn out_of_bounds_swap_never_mutates() {
        let grid = Grid::from_rows(&["___", "AB_", "BAC"]);
        let mut state = GameState::with_grid(grid);
        state.set_cursor(Pos::new(2, 0));
        let before = state.snapshot();
        assert_eq!(state.apply(Intent::Swap(Direction::Left)), Outcome::Rejected);
        assert_eq!(state.apply(Intent::Swap(Direction::Down)), Outcome::Rejected);
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut state = GameState::with_grid(Grid::new(3, 3));
        state.set_cursor(Pos::new(0, 2));
        assert_eq!(state.apply(Intent::MoveCursor(Direction::Up)), Outcome::Rejected);
        assert_eq!(state.apply(Intent::MoveCursor(Direction::Right)), Outcome::Rejected);
        assert_eq!(
            state.apply(Intent::MoveCursor(Direction::Left)),
            Outcome::CursorMoved
        );
        assert_eq!(state.cursor(), Pos::new(0, 1));
    }

    #[test]
    fn drop_falls_to_the_bottom_and_draws_a_new_letter() {
        let mut state = GameState::with_grid(Grid::new(4, 3));
        state.set_cursor(Pos::new(0, 1));
        let letter = state.next_letter();
        assert!(matches!(state.apply(Intent::Drop), Outcome::Resolved(_)));
        assert_eq!(state.grid().get(3, 1), Ok(Cell::Letter(letter)));
        assert_eq!(state.grid().letter_count(), 1);
        assert_eq!(state.turn(), 1);
    }

    #[test]
    fn drop_into_full_column_is_rejected() {
        let grid = Grid::from_rows(&["A_", "B_", "A_"]);
        let mut state = GameState::with_grid(grid);
        state.set_cursor(Pos::new(1, 0));
        let letter = state.next_letter();
        assert_eq!(state.apply(Intent::Drop), Outcome::Rejected);
        assert_eq!(state.next_letter(), letter);
        assert_eq!(state.turn(), 0);
    }

    #[test]
    fn spawning_follows_the_schedule_and_ends_when_full() {
        let config = BoardConfig {
            rows: 3,
            cols: 3,
            alphabet: vec!['A', 'B', 'C', 'D', 'E', 'F'],
            spawn_every: 2,
            fill_rows: 0,
            seed: Some(42),
            ..BoardConfig::default()
        };
        let mut state = GameState::new(&config, None);
        assert_eq!(state.tick(), Outcome::Idle);
        assert!(matches!(state.tick(), Outcome::Resolved(_)));
        assert!(gravity::is_settled(state.grid()));
        let mut guard = 0;
        while !state.is_game_over() {
            state.tick();
            guard += 1;
            assert!(guard < 1_000, "board never filled");
        }
        assert_eq!(state.apply(Intent::Drop), Outcome::Rejected);
        assert_eq!(state.apply(Intent::Quit), Outcome::Quit);
        assert!(state.snapshot().game_over);
    }

    fn single_letter_state(rows: &[&str]) -> GameState {
        let grid = Grid::from_rows(rows);
        let config = BoardConfig {
            rows: grid.rows(),
            cols: grid.cols(),
            alphabet: vec!['A'],
            spawn_every: 1,
            fill_rows: 0,
            seed: Some(3),
            ..BoardConfig::default()
        };
        GameState::new(&config, Some(grid))
    }

    #[test]
    fn spawned_letter_completing_a_group_scores_at_depth_zero() {
        // Wherever the A lands it touches the pair on the floor.
        let mut state = single_letter_state(&["___", "___", "AA_"]);
        assert_eq!(state.score(), 0);
        let Outcome::Resolved(report) = state.tick() else {
            panic!("spawn should resolve");
        };
        assert_eq!(report.crushes.len(), 1);
        assert_eq!(report.crushes[0].depth, 0);
        assert_eq!(report.crushes[0].letters(), 3);
        assert_eq!(state.score(), 3 * 10);
        assert_eq!(state.last_depth(), Some(0));
        assert_eq!(state.grid().letter_count(), 0);
        assert_eq!(state.turn(), 0);
    }

    #[test]
    fn dropped_letter_completing_a_column_scores_at_depth_zero() {
        let mut state = single_letter_state(&["___", "A__", "A__"]);
        state.set_cursor(Pos::new(0, 0));
        assert_eq!(state.next_letter(), 'A');
        let Outcome::Resolved(report) = state.apply(Intent::Drop) else {
            panic!("drop should resolve");
        };
        assert_eq!(report.crushes.len(), 1);
        assert_eq!(report.crushes[0].depth, 0);
        assert_eq!(report.crushes[0].points, 3 * 10);
        assert_eq!(state.score(), 3 * 10);
        assert_eq!(state.last_depth(), Some(0));
        assert_eq!(state.grid().letter_count(), 0);
        assert_eq!(state.turn(), 1);
    }

    #[test]
    fn seeded_states_are_reproducible() {
        let config = BoardConfig {
            seed: Some(1234),
            ..BoardConfig::default()
        };
        let a = GameState::new(&config, None);
        let b = GameState::new(&config, None);
        assert_eq!(a.snapshot(), b.snapshot());
        assert!(matcher::find_matches(a.grid(), config.min_match).is_empty());
        assert_eq!(a.score(), 0);
    }
}
