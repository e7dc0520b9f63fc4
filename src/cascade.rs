//! Cascade/score engine: detect -> crush -> fall, repeated until the board is quiet.
//!
//! Depth 0 is the crush caused directly by the triggering event (a swap, a drop or a spawn).
//! Every further crush in the same resolution is caused by letters falling into new adjacency
//! and is scored with a larger multiplier.

use crate::gravity::{self, Fall};
use crate::grid::{Cell, Grid, Pos};
use crate::matcher::{self, Match};

/// Scoring policy: `points = base_points * size`, `multiplier(depth) = 1 + cascade_step * depth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScorePolicy {
    pub base_points: u64,
    pub cascade_step: u64,
}

impl Default for ScorePolicy {
    fn default() -> Self {
        Self {
            base_points: 10,
            cascade_step: 1,
        }
    }
}

impl ScorePolicy {
    /// Points for crushing a group of `size` letters, before the cascade multiplier.
    #[inline]
    pub fn points(&self, size: usize) -> u64 {
        self.base_points.saturating_mul(size as u64)
    }

    #[inline]
    pub fn multiplier(&self, depth: u32) -> u64 {
        1 + self.cascade_step.saturating_mul(u64::from(depth))
    }

    pub fn score(&self, size: usize, depth: u32) -> u64 {
        self.points(size).saturating_mul(self.multiplier(depth))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Detecting,
    Crushing(Vec<Match>),
    Falling,
}

/// Everything crushed in one pass (all simultaneous matches) at one depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crush {
    pub depth: u32,
    pub matches: Vec<Match>,
    pub points: u64,
}

impl Crush {
    pub fn letters(&self) -> usize {
        self.matches.iter().map(Match::len).sum()
    }
}

/// Result of resolving one triggering event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub crushes: Vec<Crush>,
    pub falls: Vec<Fall>,
}

impl CascadeReport {
    pub fn points(&self) -> u64 {
        self.crushes.iter().map(|c| c.points).sum()
    }

    /// Deepest crush depth, None if nothing was crushed.
    pub fn max_depth(&self) -> Option<u32> {
        self.crushes.last().map(|c| c.depth)
    }

    pub fn letters_crushed(&self) -> usize {
        self.crushes.iter().map(Crush::letters).sum()
    }

    pub fn crushed_cells(&self) -> impl Iterator<Item = Pos> + '_ {
        self.crushes
            .iter()
            .flat_map(|c| c.matches.iter())
            .flat_map(|m| m.cells().iter().copied())
    }

    pub fn is_quiet(&self) -> bool {
        self.crushes.is_empty()
    }
}

/// Cascade resolution as an explicit state machine over [`Phase`].
#[derive(Debug, Clone)]
pub struct CascadeEngine {
    policy: ScorePolicy,
    min_match: usize,
    phase: Phase,
    depth: u32,
    report: CascadeReport,
}

impl CascadeEngine {
    pub fn new(policy: ScorePolicy, min_match: usize) -> Self {
        Self {
            policy,
            min_match,
            phase: Phase::Idle,
            depth: 0,
            report: CascadeReport::default(),
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Depth the next crush would be scored at.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn policy(&self) -> ScorePolicy {
        self.policy
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Start a new resolution. Ignored unless idle.
    pub fn trigger(&mut self) {
        if self.is_idle() {
            self.depth = 0;
            self.report = CascadeReport::default();
            self.phase = Phase::Detecting;
        }
    }

    /// Advance one state. Returns false once the engine is back to idle.
    pub fn step(&mut self, grid: &mut Grid, score: &mut u64) -> bool {
        self.phase = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => Phase::Idle,
            Phase::Detecting => {
                let matches = matcher::find_matches(grid, self.min_match);
                if matches.is_empty() {
                    self.depth = 0;
                    Phase::Idle
                } else {
                    Phase::Crushing(matches)
                }
            }
            Phase::Crushing(matches) => {
                let mut points = 0u64;
                for m in &matches {
                    for &pos in m.cells() {
                        grid.put(pos, Cell::Empty);
                    }
                    points = points.saturating_add(self.policy.score(m.len(), self.depth));
                }
                *score = score.saturating_add(points);
                self.report.crushes.push(Crush {
                    depth: self.depth,
                    matches,
                    points,
                });
                self.depth += 1;
                Phase::Falling
            }
            Phase::Falling => {
                let falls = gravity::settle(grid);
                self.report.falls.extend(falls);
                Phase::Detecting
            }
        };
        !self.is_idle()
    }

    /// Trigger and run to idle. Always terminates: every crush removes at least one letter.
    pub fn resolve(&mut self, grid: &mut Grid, score: &mut u64) -> CascadeReport {
        self.trigger();
        while self.step(grid, score) {}
        std::mem::take(&mut self.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> CascadeEngine {
        CascadeEngine::new(ScorePolicy::default(), 3)
    }

    #[test]
    fn multiplier_policy_defaults() {
        let policy = ScorePolicy::default();
        assert_eq!(policy.multiplier(0), 1);
        for depth in 1..10 {
            assert!(policy.multiplier(depth) > policy.multiplier(depth - 1));
        }
        assert_eq!(policy.multiplier(3), 4);
        assert!(policy.score(3, 1) > policy.score(3, 0));
        assert!(policy.points(4) >= policy.points(3));
    }

    #[test]
    fn quiet_grid_returns_to_idle_immediately() {
        let mut grid = Grid::from_rows(&["___", "AB_", "BAC"]);
        let mut score = 0;
        let mut engine = engine();
        engine.trigger();
        assert_eq!(engine.phase(), &Phase::Detecting);
        assert!(!engine.step(&mut grid, &mut score));
        assert!(engine.is_idle());
        assert_eq!(score, 0);
    }

    #[test]
    fn empty_grid_yields_no_match() {
        let mut grid = Grid::new(4, 4);
        let mut score = 0;
        let report = engine().resolve(&mut grid, &mut score);
        assert!(report.is_quiet());
        assert_eq!(report.max_depth(), None);
    }

    #[test]
    fn walks_every_phase_in_order() {
        let mut grid = Grid::from_rows(&["B__", "AAA"]);
        let mut score = 0;
        let mut engine = engine();
        engine.trigger();
        assert!(engine.step(&mut grid, &mut score));
        assert!(matches!(engine.phase(), Phase::Crushing(m) if m.len() == 1));
        assert!(engine.step(&mut grid, &mut score));
        assert_eq!(engine.phase(), &Phase::Falling);
        assert_eq!(engine.depth(), 1);
        assert_eq!(score, 30);
        assert!(engine.step(&mut grid, &mut score));
        assert_eq!(engine.phase(), &Phase::Detecting);
        assert_eq!(grid.to_string(), "___\nB__");
        assert!(!engine.step(&mut grid, &mut score));
        assert!(engine.is_idle());
        assert_eq!(engine.depth(), 0);
    }

    #[test]
    fn simultaneous_matches_score_in_one_pass() {
        let mut grid = Grid::from_rows(&["AAAC", "BBBC"]);
        let mut score = 0;
        let report = engine().resolve(&mut grid, &mut score);
        assert_eq!(report.crushes.len(), 1);
        assert_eq!(report.crushes[0].matches.len(), 2);
        assert_eq!(report.crushes[0].depth, 0);
        assert_eq!(score, 60);
    }

    #[test]
    fn gravity_induced_match_scores_at_depth_one() {
        // Crushing the B column drops the top A next to the two below it.
        let mut grid = Grid::from_rows(&["A__", "B__", "B__", "BAA"]);
        let mut score = 0;
        let report = engine().resolve(&mut grid, &mut score);
        assert_eq!(report.crushes.len(), 2);
        assert_eq!(report.crushes[0].depth, 0);
        assert_eq!(report.crushes[0].points, 3 * 10);
        assert_eq!(report.crushes[1].depth, 1);
        assert_eq!(report.crushes[1].points, 3 * 10 * 2);
        assert_eq!(score, 90);
        assert_eq!(report.max_depth(), Some(1));
        assert_eq!(grid.letter_count(), 0);
    }

    #[test]
    fn cascade_terminates_within_letter_count_passes() {
        let mut grid = Grid::from_rows(&[
            "ABCA", "CABC", "ABCA", "AABB", "CCAB", "BBCC", "AACA",
        ]);
        let letters = grid.letter_count();
        let mut score = 0;
        let mut engine = engine();
        engine.trigger();
        let mut detecting_passes = 0;
        loop {
            if engine.phase() == &Phase::Detecting {
                detecting_passes += 1;
            }
            if !engine.step(&mut grid, &mut score) {
                break;
            }
            assert!(detecting_passes <= letters + 1);
        }
        assert!(gravity::is_settled(&grid));
        assert!(matcher::find_matches(&grid, 3).is_empty());
    }

    #[test]
    fn trigger_while_busy_is_ignored() {
        let mut grid = Grid::from_rows(&["AAA"]);
        let mut score = 0;
        let mut engine = engine();
        engine.trigger();
        engine.step(&mut grid, &mut score);
        engine.trigger();
        assert!(matches!(engine.phase(), Phase::Crushing(_)));
    }
}
