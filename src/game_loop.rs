//! Game loop: sole consumer of the intent queue and sole owner of the game state.

use crate::game::{GameState, Outcome, Snapshot};
use crate::input::Intent;
use std::sync::mpsc::{Receiver, TryRecvError};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStatus {
    Running,
    Halted,
}

pub struct GameLoop {
    state: GameState,
    intents: Receiver<Intent>,
    halted: bool,
    published: Snapshot,
}

impl GameLoop {
    pub fn new(state: GameState, intents: Receiver<Intent>) -> Self {
        let published = state.snapshot();
        Self {
            state,
            intents,
            halted: false,
            published,
        }
    }

    /// One iteration: at most one intent, then one spawn-clock tick, then publish.
    ///
    /// Each mutation resolves its whole cascade before returning, so a quit queued behind a
    /// swap is only seen after that swap's cascade is idle.
    pub fn tick(&mut self) -> LoopStatus {
        if self.halted {
            return LoopStatus::Halted;
        }

        match self.intents.try_recv() {
            Ok(intent) => {
                if self.state.apply(intent) == Outcome::Quit {
                    info!(score = self.state.score(), "quit requested");
                    self.halted = true;
                    return LoopStatus::Halted;
                }
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                warn!("input queue closed, stopping");
                self.halted = true;
                return LoopStatus::Halted;
            }
        }

        self.state.tick();
        self.published = self.state.snapshot();
        LoopStatus::Running
    }

    /// Last completed iteration's view. Never reflects a board mid-cascade.
    pub fn snapshot(&self) -> &Snapshot {
        &self.published
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }
}
