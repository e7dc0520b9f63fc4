//! Key bindings and the input-capture thread.
//!
//! The capture thread is the only producer of [`Intent`]s; it never touches the board.

use crate::grid::Direction;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace};

/// How long the capture thread blocks on the terminal before re-checking its stop flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One discrete player action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    MoveCursor(Direction),
    Swap(Direction),
    Drop,
    Quit,
}

/// Capture-agnostic key identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Arrow(Direction),
    ShiftArrow(Direction),
    Enter,
    Esc,
}

impl Key {
    /// Convert a terminal key press. Releases, repeats and ctrl/alt chords map to nothing.
    pub fn from_event(key: KeyEvent) -> Option<Self> {
        let KeyEvent {
            code,
            modifiers,
            kind,
            ..
        } = key;
        if kind != KeyEventKind::Press {
            return None;
        }
        if modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            return None;
        }
        let shift = modifiers.contains(KeyModifiers::SHIFT);
        let arrow = |dir| {
            if shift {
                Self::ShiftArrow(dir)
            } else {
                Self::Arrow(dir)
            }
        };
        match code {
            KeyCode::Char(c) => Some(Self::Char(c)),
            KeyCode::Left => Some(arrow(Direction::Left)),
            KeyCode::Right => Some(arrow(Direction::Right)),
            KeyCode::Up => Some(arrow(Direction::Up)),
            KeyCode::Down => Some(arrow(Direction::Down)),
            KeyCode::Enter => Some(Self::Enter),
            KeyCode::Esc => Some(Self::Esc),
            _ => None,
        }
    }
}

/// `{key: intent}` table. Unbound keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMap {
    bindings: HashMap<Key, Intent>,
}

impl Default for KeyMap {
    /// Vim-style movement on h/j/k/l, shifted for swaps; arrows mirror them.
    fn default() -> Self {
        let mut map = Self::empty();
        for (lower, upper, dir) in [
            ('h', 'H', Direction::Left),
            ('j', 'J', Direction::Down),
            ('k', 'K', Direction::Up),
            ('l', 'L', Direction::Right),
        ] {
            map.bind(Key::Char(lower), Intent::MoveCursor(dir));
            map.bind(Key::Char(upper), Intent::Swap(dir));
            map.bind(Key::Arrow(dir), Intent::MoveCursor(dir));
            map.bind(Key::ShiftArrow(dir), Intent::Swap(dir));
        }
        map.bind(Key::Char('i'), Intent::Drop);
        map.bind(Key::Char(' '), Intent::Drop);
        map.bind(Key::Enter, Intent::Drop);
        map.bind(Key::Char('q'), Intent::Quit);
        map.bind(Key::Esc, Intent::Quit);
        map
    }
}

impl KeyMap {
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Bind `key`, replacing any previous binding. Returns the old intent.
    pub fn bind(&mut self, key: Key, intent: Intent) -> Option<Intent> {
        self.bindings.insert(key, intent)
    }

    pub fn unbind(&mut self, key: Key) -> Option<Intent> {
        self.bindings.remove(&key)
    }

    pub fn intent_for(&self, key: Key) -> Option<Intent> {
        self.bindings.get(&key).copied()
    }

    /// Help line entries (key label, intent) for the renderer, sorted for stable output.
    pub fn help(&self) -> Vec<(String, Intent)> {
        let mut entries: Vec<(String, Intent)> = self
            .bindings
            .iter()
            .map(|(key, intent)| (key_label(*key), *intent))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

fn key_label(key: Key) -> String {
    let dir = |d: Direction| match d {
        Direction::Up => "Up",
        Direction::Down => "Down",
        Direction::Left => "Left",
        Direction::Right => "Right",
    };
    match key {
        Key::Char(' ') => "Space".to_string(),
        Key::Char(c) => c.to_string(),
        Key::Arrow(d) => dir(d).to_string(),
        Key::ShiftArrow(d) => format!("S-{}", dir(d)),
        Key::Enter => "Enter".to_string(),
        Key::Esc => "Esc".to_string(),
    }
}

/// Map each key to an intent and enqueue it, in order. Stops after forwarding `Quit`
/// or when the consumer has gone away. Returns the number of intents sent.
pub fn forward_keys<I>(keys: I, keymap: &KeyMap, tx: &SyncSender<Intent>) -> usize
where
    I: IntoIterator<Item = Key>,
{
    let mut sent = 0;
    for key in keys {
        let Some(intent) = keymap.intent_for(key) else {
            trace!(?key, "unbound key ignored");
            continue;
        };
        if tx.send(intent).is_err() {
            break;
        }
        sent += 1;
        if intent == Intent::Quit {
            break;
        }
    }
    sent
}

/// Background thread reading terminal key presses.
pub struct InputThread {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl InputThread {
    pub fn spawn(keymap: KeyMap, tx: SyncSender<Intent>) -> std::io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name("input".into())
            .spawn(move || {
                debug!("input thread started");
                let keys = std::iter::from_fn(|| next_key(&flag)).flatten();
                let sent = forward_keys(keys, &keymap, &tx);
                debug!(sent, "input thread stopped");
            })?;
        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Ask the thread to stop and wait for it.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for InputThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Outer None ends the stream; inner None is a poll timeout or a non-key event.
fn next_key(running: &AtomicBool) -> Option<Option<Key>> {
    if !running.load(Ordering::Relaxed) {
        return None;
    }
    match event::poll(POLL_INTERVAL) {
        Ok(false) => Some(None),
        Ok(true) => match event::read() {
            Ok(Event::Key(key)) => Some(Key::from_event(key)),
            Ok(_) => Some(None),
            Err(err) => {
                debug!(%err, "terminal read failed");
                None
            }
        },
        Err(err) => {
            debug!(%err, "terminal poll failed");
            None
        }
    }
}
