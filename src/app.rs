//! App: terminal init, input thread, tick/draw loop and teardown.

use crate::config::BoardConfig;
use crate::game::GameState;
use crate::game_loop::{GameLoop, LoopStatus};
use crate::grid::Grid;
use crate::input::{InputThread, KeyMap};
use crate::theme::Theme;
use crate::ui::{self, View};
use anyhow::{Context, Result};
use ratatui::DefaultTerminal;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Intents buffered between the input thread and the loop; the producer blocks when full.
const INTENT_QUEUE_CAPACITY: usize = 64;

pub struct App {
    config: BoardConfig,
    preset: Option<Grid>,
    theme: Theme,
    keymap: KeyMap,
}

impl App {
    pub fn new(config: BoardConfig, preset: Option<Grid>, theme: Theme, keymap: KeyMap) -> Self {
        Self {
            config,
            preset,
            theme,
            keymap,
        }
    }

    /// Take over the terminal, play until quit, restore the terminal. Returns the final score.
    pub fn run(self) -> Result<u64> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode().context("enabling raw mode")?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
        let result = ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))
            .context("creating terminal")
            .and_then(|mut terminal| self.play(&mut terminal));

        // Restore
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn play(self, terminal: &mut DefaultTerminal) -> Result<u64> {
        let Self {
            config,
            preset,
            theme,
            keymap,
        } = self;
        let help = keymap.help();
        let (tx, rx) = mpsc::sync_channel(INTENT_QUEUE_CAPACITY);
        let input = InputThread::spawn(keymap, tx).context("spawning input thread")?;
        let mut game = GameLoop::new(GameState::new(&config, preset), rx);
        info!(
            rows = config.rows,
            cols = config.cols,
            alphabet = %config.alphabet.iter().collect::<String>(),
            "game started"
        );

        let view = View {
            theme: &theme,
            alphabet: &config.alphabet,
            help: &help,
        };
        let tick_interval = Duration::from_secs_f64(1.0 / config.tick_rate);
        let result = run_loop(terminal, &mut game, &view, tick_interval);
        let score = game.snapshot().score;

        // The input thread may be blocked on a full queue; dropping the receiver frees it.
        drop(game);
        input.stop();
        debug!("input thread joined");

        result.map(|()| score)
    }
}

fn run_loop(
    terminal: &mut DefaultTerminal,
    game: &mut GameLoop,
    view: &View<'_>,
    tick_interval: Duration,
) -> Result<()> {
    loop {
        let started = Instant::now();
        let status = game.tick();
        terminal
            .draw(|f| ui::draw(f, game.snapshot(), view))
            .context("drawing frame")?;
        if status == LoopStatus::Halted {
            return Ok(());
        }
        let elapsed = started.elapsed();
        if elapsed < tick_interval {
            std::thread::sleep(tick_interval - elapsed);
        }
    }
}
