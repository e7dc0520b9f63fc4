//! Board configuration: startup parameters, validation and preset boards.

use crate::cascade::ScorePolicy;
use crate::gravity;
use crate::grid::{Cell, Grid};
use std::path::Path;
use thiserror::Error;

/// Largest accepted row/column count.
pub const MAX_DIMENSION: usize = 64;
/// The alphabet must fit a single case of the Latin alphabet worth of colours and keys.
pub const MAX_ALPHABET: usize = 26;
/// Accepted game loop rates, in ticks per second.
pub const TICK_RATE_RANGE: std::ops::RangeInclusive<f64> = 0.1..=1000.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("grid must be 1..={max} x 1..={max}, got {rows}x{cols}")]
    Dimensions { rows: usize, cols: usize, max: usize },
    #[error("alphabet is empty")]
    EmptyAlphabet,
    #[error("alphabet has {0} letters, at most 26 are allowed")]
    AlphabetTooLarge(usize),
    #[error("letter {0:?} appears more than once in the alphabet")]
    DuplicateLetter(char),
    #[error("{0:?} cannot be used as a letter")]
    InvalidLetter(char),
    #[error("minimum match size {min_match} must be between 2 and {limit} (min(rows, cols))")]
    MinMatch { min_match: usize, limit: usize },
    #[error("cascade step must be at least 1 so cascades score more than direct crushes")]
    CascadeStep,
    #[error("fill rows {fill_rows} exceed grid height {rows}")]
    FillRows { fill_rows: usize, rows: usize },
    #[error("tick rate must be between 0.1 and 1000 ticks per second, got {0}")]
    TickRate(f64),
    #[error("preset board: {0}")]
    Preset(String),
    #[error("preset board letter {letter:?} at line {line} is not in the alphabet")]
    PresetLetter { letter: char, line: usize },
    #[error("cannot read preset board: {0}")]
    Io(#[from] std::io::Error),
}

/// Immutable game parameters, supplied once before the loop starts.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardConfig {
    pub rows: usize,
    pub cols: usize,
    pub alphabet: Vec<char>,
    pub min_match: usize,
    /// Spawn one letter every N ticks; 0 disables spawning.
    pub spawn_every: u32,
    /// Rows of random letters at the bottom of a fresh board.
    pub fill_rows: usize,
    pub policy: ScorePolicy,
    /// Game loop ticks per second.
    pub tick_rate: f64,
    pub seed: Option<u64>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            rows: 10,
            cols: 10,
            alphabet: vec!['A', 'B', 'C'],
            min_match: 3,
            spawn_every: 8,
            fill_rows: 4,
            policy: ScorePolicy::default(),
            tick_rate: 10.0,
            seed: None,
        }
    }
}

impl BoardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_DIMENSION).contains(&self.rows) || !(1..=MAX_DIMENSION).contains(&self.cols) {
            return Err(ConfigError::Dimensions {
                rows: self.rows,
                cols: self.cols,
                max: MAX_DIMENSION,
            });
        }
        validate_alphabet(&self.alphabet)?;
        let limit = self.rows.min(self.cols);
        if self.min_match < 2 || self.min_match > limit {
            return Err(ConfigError::MinMatch {
                min_match: self.min_match,
                limit,
            });
        }
        if self.policy.cascade_step == 0 {
            return Err(ConfigError::CascadeStep);
        }
        if self.fill_rows > self.rows {
            return Err(ConfigError::FillRows {
                fill_rows: self.fill_rows,
                rows: self.rows,
            });
        }
        if !TICK_RATE_RANGE.contains(&self.tick_rate) {
            return Err(ConfigError::TickRate(self.tick_rate));
        }
        Ok(())
    }

    /// Adopt a preset's dimensions. The preset replaces the random initial fill.
    pub fn fit_preset(&mut self, preset: &Grid) {
        self.rows = preset.rows();
        self.cols = preset.cols();
        self.fill_rows = 0;
    }
}

fn validate_alphabet(alphabet: &[char]) -> Result<(), ConfigError> {
    if alphabet.is_empty() {
        return Err(ConfigError::EmptyAlphabet);
    }
    if alphabet.len() > MAX_ALPHABET {
        return Err(ConfigError::AlphabetTooLarge(alphabet.len()));
    }
    for (i, &c) in alphabet.iter().enumerate() {
        if is_empty_marker(c) || c.is_whitespace() || c.is_control() {
            return Err(ConfigError::InvalidLetter(c));
        }
        if alphabet[..i].contains(&c) {
            return Err(ConfigError::DuplicateLetter(c));
        }
    }
    Ok(())
}

#[inline]
fn is_empty_marker(c: char) -> bool {
    c == '_' || c == '.'
}

/// Parse a preset board: one line per row, `_`/`.` empty, `#` comments and blank lines skipped.
/// Floating letters are settled before the board is returned.
pub fn parse_preset(text: &str, alphabet: &[char]) -> Result<Grid, ConfigError> {
    let lines: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'))
        .collect();
    let Some(&(_, first)) = lines.first() else {
        return Err(ConfigError::Preset("no rows".into()));
    };
    let cols = first.chars().count();
    if lines.len() > MAX_DIMENSION || cols > MAX_DIMENSION {
        return Err(ConfigError::Dimensions {
            rows: lines.len(),
            cols,
            max: MAX_DIMENSION,
        });
    }

    let mut grid = Grid::new(lines.len(), cols);
    for (row, &(line_no, line)) in lines.iter().enumerate() {
        if line.chars().count() != cols {
            return Err(ConfigError::Preset(format!(
                "line {line_no} has {} cells, expected {cols}",
                line.chars().count()
            )));
        }
        for (col, ch) in line.chars().enumerate() {
            let cell = if is_empty_marker(ch) {
                Cell::Empty
            } else if alphabet.contains(&ch) {
                Cell::Letter(ch)
            } else {
                return Err(ConfigError::PresetLetter {
                    letter: ch,
                    line: line_no,
                });
            };
            grid.set(row, col, cell)
                .map_err(|e| ConfigError::Preset(e.to_string()))?;
        }
    }
    gravity::settle(&mut grid);
    Ok(grid)
}

pub fn load_preset(path: &Path, alphabet: &[char]) -> Result<Grid, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    parse_preset(&text, alphabet)
}
