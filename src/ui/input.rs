//! Input state tracker.
//!
//! The puzzle is turn-based, so only key presses matter: every Press (or
//! auto-Repeat while held) becomes at most one action. Release events are
//! dropped. Ctrl+C and Ctrl+Z are read from the modifiers because raw mode
//! delivers them as ordinary key events.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use meepo::domain::actor::MoveDir;
use meepo::sim::step::Command;

/// What the front-end should do for one key press.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Game(Command),
    /// Reload the current level from its definition.
    Restart,
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_UNDO: &[KeyCode] = &[KeyCode::Char('z'), KeyCode::Char('Z'), KeyCode::Char('u'), KeyCode::Char('U')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

/// Map one key event to an action. Ctrl chords are checked first so
/// Ctrl+Z undoes and Ctrl+C quits regardless of the plain bindings.
pub fn action_for(key: &KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Action::Game(Command::Quit)),
            KeyCode::Char('z') | KeyCode::Char('Z') => Some(Action::Game(Command::Undo)),
            _ => None,
        };
    }

    let code = key.code;
    let dir = if KEYS_LEFT.contains(&code) {
        Some(MoveDir::Left)
    } else if KEYS_RIGHT.contains(&code) {
        Some(MoveDir::Right)
    } else if KEYS_UP.contains(&code) {
        Some(MoveDir::Up)
    } else if KEYS_DOWN.contains(&code) {
        Some(MoveDir::Down)
    } else {
        None
    };

    if let Some(dir) = dir {
        Some(Action::Game(Command::Move(dir)))
    } else if KEYS_UNDO.contains(&code) {
        Some(Action::Game(Command::Undo))
    } else if KEYS_RESTART.contains(&code) {
        Some(Action::Restart)
    } else if KEYS_QUIT.contains(&code) {
        Some(Action::Game(Command::Quit))
    } else {
        None
    }
}

pub struct InputState {
    /// Actions decoded during the most recent drain_events() call, in order.
    actions: Vec<Action>,
}

impl InputState {
    pub fn new() -> Self {
        InputState { actions: Vec::with_capacity(8) }
    }

    /// Wait up to `timeout` for the first event, then drain whatever else
    /// is pending without blocking. Call once per frame.
    pub fn drain_events(&mut self, timeout: Duration) {
        self.actions.clear();

        let mut wait = timeout;
        while poll(wait).unwrap_or(false) {
            wait = Duration::ZERO;
            if let Ok(Event::Key(key)) = event::read() {
                if let Some(action) = action_for(&key) {
                    self.actions.push(action);
                }
            }
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
}
