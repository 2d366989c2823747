//! GameState: the complete value of a running puzzle.
//!
//! ## Ownership
//!
//! The state owns every actor record outright. The player and the link
//! tiles are referenced by `ActorId`, never by pointer, so cloning the
//! state (for a snapshot) yields a fully independent copy.
//!
//! ## Derived data
//!
//!   - `rules`:  a pure function of link neighborhoods. Only
//!               `refresh_rules()` writes it.
//!   - `player`: resolved by flag reapplication inside `refresh_rules()`,
//!               cleared by a loss, restored by undo.

use crate::domain::actor::{Actor, ActorId, ActorStore, Bounds, Kind};
use crate::domain::registry;
use crate::domain::rules::{self, Rule, RuleSet};
use crate::domain::tile::Symbol;
use super::history::HistoryStack;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    Running,
    Terminated,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Won,
    /// Player eliminated. The run keeps going so the move can be undone.
    Lost,
    Quit,
}

/// What a rule refresh changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleChange {
    pub formed: Vec<Rule>,
    pub broken: Vec<Rule>,
    pub player_changed: bool,
}

#[derive(Clone, Debug)]
pub struct GameState {
    pub name: String,
    pub bounds: Bounds,

    // ── Live state (snapshotted) ──
    pub actors: ActorStore,
    /// Link tiles, tracked separately from the store for rule scans.
    pub links: Vec<ActorId>,
    pub rules: RuleSet,
    pub player: Option<ActorId>,
    /// Accepted moves since load.
    pub moves: u32,

    // ── Undo ──
    pub history: HistoryStack,

    // ── Meta ──
    pub status: Status,
    pub outcome: Option<Outcome>,
}

// ── Construction ──

impl GameState {
    /// Build from an already-validated symbol grid (row-major, rectangular).
    /// Actors are created in row-major scan order; rules are not yet derived.
    pub fn from_grid(name: &str, grid: &[Vec<Symbol>], history_limit: usize) -> Self {
        let height = grid.len();
        let width = grid.first().map_or(0, Vec::len);
        let mut actors = ActorStore::new();
        let mut links = vec![];

        for (y, row) in grid.iter().enumerate() {
            for (x, &sym) in row.iter().enumerate() {
                if let Some(kind) = Kind::from_symbol(sym) {
                    let id = actors.add(x, y, kind);
                    if kind == Kind::Link {
                        links.push(id);
                    }
                }
            }
        }

        GameState {
            name: name.to_string(),
            bounds: Bounds { width, height },
            actors,
            links,
            rules: RuleSet::new(),
            player: None,
            moves: 0,
            history: HistoryStack::with_limit(history_limit),
            status: Status::Running,
            outcome: None,
        }
    }
}

// ── Rules ──

impl GameState {
    /// Re-derive the active rule set from link neighborhoods and reapply
    /// every flag. Idempotent when nothing moved in between.
    pub fn refresh_rules(&mut self) -> RuleChange {
        let candidates = rules::derive_candidates(&self.actors, &self.links);
        let next = self.rules.merge(&candidates);
        let prev_player = self.player;
        self.player = registry::reapply(&mut self.actors, &self.rules, &next, self.player);
        let (formed, broken) = next.diff(&self.rules);
        self.rules = next;
        RuleChange {
            formed,
            broken,
            player_changed: prev_player != self.player,
        }
    }
}

// ── Read-only queries for the front-end ──

impl GameState {
    pub fn player_actor(&self) -> Option<&Actor> {
        self.player.and_then(|id| self.actors.get(id))
    }

    pub fn player_pos(&self) -> Option<(usize, usize)> {
        self.player_actor().map(|p| (p.x, p.y))
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter()
    }

    pub fn rule_strings(&self) -> Vec<String> {
        self.rules.to_strings()
    }

    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    pub fn width(&self) -> usize {
        self.bounds.width
    }

    pub fn height(&self) -> usize {
        self.bounds.height
    }
}
