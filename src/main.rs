//! Lettercrush: swap letters on a falling grid, crush connected groups, chain cascades.

mod app;
mod cascade;
mod config;
mod game;
mod game_loop;
mod gravity;
mod grid;
mod input;
mod matcher;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use cascade::ScorePolicy;
use clap::{Parser, ValueEnum};
use config::{BoardConfig, ConfigError};
use grid::Grid;
use input::KeyMap;
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<()> {
    let args = Args::parse();
    // Validate before touching the terminal so errors print normally.
    let (config, preset) = args.board_config().context("invalid board configuration")?;
    let _guard = init_logging(&args)?;
    info!(?config, preset = preset.is_some(), "lettercrush starting");

    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let score = App::new(config, preset, theme, KeyMap::default()).run()?;
    info!(score, "lettercrush exiting");
    println!("Final score: {score}");
    Ok(())
}

/// Log to a daily-rotated file; the terminal belongs to the board.
fn init_logging(args: &Args) -> Result<WorkerGuard> {
    let log_dir = args.log_dir.clone().unwrap_or_else(|| {
        std::env::var("XDG_STATE_HOME")
            .map(PathBuf::from)
            .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".local/state")))
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
            .join("lettercrush")
    });
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let file_appender = rolling::daily(&log_dir, "lettercrush.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let default_filter = if args.debug {
        "debug"
    } else {
        "warn,lettercrush=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    info!(log_path = %log_dir.display(), "logging initialised");
    Ok(guard)
}

/// Letter-crush puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "lettercrush",
    version,
    about = "Swap adjacent letters to form connected groups; crushed groups let the board fall and chain.",
    long_about = "Lettercrush is a terminal puzzle game.\n\n\
        Letters fall to the bottom of a grid. Swap two neighbouring letters so that at least \
        --min-match equal letters touch (up/down/left/right); the group is crushed, the letters \
        above fall, and any new groups crush again for a higher multiplier.\n\n\
        CONTROLS:\n  h/j/k/l or arrows       Move cursor\n  H/J/K/L or shift+arrows Swap with neighbour\n  \
        i / Space / Enter       Drop next letter\n  q / Esc                 Quit\n\n\
        Use --preset to start from a board file (one line per row, _ for empty)."
)]
pub struct Args {
    /// Grid height in cells.
    #[arg(long, default_value = "10", value_name = "ROWS")]
    pub rows: usize,

    /// Grid width in cells.
    #[arg(long, default_value = "10", value_name = "COLS")]
    pub cols: usize,

    /// Letters that can appear on the board.
    #[arg(short, long, default_value = "ABC", value_name = "LETTERS")]
    pub alphabet: String,

    /// Smallest connected group that gets crushed.
    #[arg(short, long, default_value = "3", value_name = "N")]
    pub min_match: usize,

    /// Spawn a letter every N ticks (0 disables spawning).
    #[arg(long, default_value = "8", value_name = "TICKS")]
    pub spawn_every: u32,

    /// Rows of random letters on a fresh board.
    #[arg(long, default_value = "4", value_name = "ROWS")]
    pub fill_rows: usize,

    /// Points per crushed letter.
    #[arg(long, default_value = "10", value_name = "N")]
    pub base_points: u64,

    /// Multiplier growth per cascade step: multiplier = 1 + step * depth.
    #[arg(long, default_value = "1", value_name = "N")]
    pub cascade_step: u64,

    /// Game loop ticks per second.
    #[arg(long, default_value = "10.0", value_name = "RATE")]
    pub tick_rate: f64,

    /// Seed for letter generation (random if not set).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Start from a board file instead of a random fill. Overrides --rows/--cols/--fill-rows.
    #[arg(short, long, value_name = "FILE")]
    pub preset: Option<PathBuf>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Directory for log files (default: $XDG_STATE_HOME/lettercrush).
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Verbose logging.
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Build and validate the board configuration, loading the preset board if one was given.
    pub fn board_config(&self) -> Result<(BoardConfig, Option<Grid>), ConfigError> {
        let mut config = BoardConfig {
            rows: self.rows,
            cols: self.cols,
            alphabet: self.alphabet.chars().collect(),
            min_match: self.min_match,
            spawn_every: self.spawn_every,
            fill_rows: self.fill_rows,
            policy: ScorePolicy {
                base_points: self.base_points,
                cascade_step: self.cascade_step,
            },
            tick_rate: self.tick_rate,
            seed: self.seed,
        };
        let preset = match &self.preset {
            Some(path) => {
                let grid = config::load_preset(path, &config.alphabet)?;
                config.fit_preset(&grid);
                Some(grid)
            }
            None => None,
        };
        config.validate()?;
        Ok((config, preset))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_the_default_board() {
        let args = Args::parse_from(["lettercrush"]);
        let (config, preset) = args.board_config().unwrap();
        assert_eq!(config, BoardConfig::default());
        assert!(preset.is_none());
    }

    #[test]
    fn flags_reach_the_config() {
        let args = Args::parse_from([
            "lettercrush",
            "--rows",
            "6",
            "--cols",
            "7",
            "--alphabet",
            "XYZW",
            "--min-match",
            "4",
            "--cascade-step",
            "2",
            "--seed",
            "42",
        ]);
        let (config, _) = args.board_config().unwrap();
        assert_eq!((config.rows, config.cols), (6, 7));
        assert_eq!(config.alphabet, vec!['X', 'Y', 'Z', 'W']);
        assert_eq!(config.min_match, 4);
        assert_eq!(config.policy.cascade_step, 2);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn invalid_flags_are_rejected_before_startup() {
        let args = Args::parse_from(["lettercrush", "--alphabet", "AA"]);
        assert!(matches!(
            args.board_config(),
            Err(ConfigError::DuplicateLetter('A'))
        ));
    }

    #[test]
    fn vanishing_tick_rate_is_rejected_before_startup() {
        let args = Args::parse_from(["lettercrush", "--tick-rate", "1e-20"]);
        assert!(matches!(args.board_config(), Err(ConfigError::TickRate(_))));
    }

    #[test]
    fn missing_preset_file_is_an_io_error() {
        let args = Args::parse_from(["lettercrush", "--preset", "/nonexistent/board.txt"]);
        assert!(matches!(args.board_config(), Err(ConfigError::Io(_))));
    }

    #[test]
    fn palette_aliases_parse() {
        let args = Args::parse_from(["lettercrush", "--palette", "colourblind"]);
        assert_eq!(args.palette, Palette::Colorblind);
    }
}
