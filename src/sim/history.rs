//! Undo history: point-in-time snapshots of the live state.
//!
//! ## Snapshot contents
//!   actors, link ids, active rules, player reference, move counter.
//!
//! Snapshots never include a history of their own. Undo pops the live
//! stack, so undo after undo walks further back in time and there is
//! no redo. Every field is an owned value, so a snapshot cannot observe
//! later mutation of the live state.

use std::collections::VecDeque;

use crate::domain::actor::{ActorId, ActorStore};
use crate::domain::rules::RuleSet;
use super::world::GameState;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub actors: ActorStore,
    pub links: Vec<ActorId>,
    pub rules: RuleSet,
    pub player: Option<ActorId>,
    pub moves: u32,
}

/// Capture a full snapshot from the current state.
pub fn capture_snapshot(w: &GameState) -> Snapshot {
    Snapshot {
        actors: w.actors.clone(),
        links: w.links.clone(),
        rules: w.rules.clone(),
        player: w.player,
        moves: w.moves,
    }
}

/// Replace the live state with `snap`. History and status are left alone.
pub fn restore_snapshot(w: &mut GameState, snap: Snapshot) {
    w.actors = snap.actors;
    w.links = snap.links;
    w.rules = snap.rules;
    w.player = snap.player;
    w.moves = snap.moves;
}

/// LIFO of snapshots. `limit == 0` keeps everything; otherwise the
/// oldest snapshot is dropped once the limit is reached.
#[derive(Clone, Debug, Default)]
pub struct HistoryStack {
    snapshots: VecDeque<Snapshot>,
    limit: usize,
}

impl HistoryStack {
    pub fn with_limit(limit: usize) -> Self {
        HistoryStack { snapshots: VecDeque::new(), limit }
    }

    pub fn push(&mut self, snap: Snapshot) {
        if self.limit > 0 && self.snapshots.len() >= self.limit {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(snap);
    }

    pub fn pop(&mut self) -> Option<Snapshot> {
        self.snapshots.pop_back()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::Kind;
    use crate::domain::tile::Noun;

    fn snap(moves: u32) -> Snapshot {
        Snapshot {
            actors: ActorStore::new(),
            links: vec![],
            rules: RuleSet::new(),
            player: None,
            moves,
        }
    }

    #[test]
    fn pop_is_lifo() {
        let mut h = HistoryStack::with_limit(0);
        assert!(h.is_empty());
        h.push(snap(1));
        h.push(snap(2));
        assert_eq!(h.pop().map(|s| s.moves), Some(2));
        assert_eq!(h.pop().map(|s| s.moves), Some(1));
        assert!(h.pop().is_none());
    }

    #[test]
    fn limit_drops_oldest() {
        let mut h = HistoryStack::with_limit(2);
        for m in 1..=3 {
            h.push(snap(m));
        }
        assert_eq!(h.len(), 2);
        assert_eq!(h.pop().map(|s| s.moves), Some(3));
        assert_eq!(h.pop().map(|s| s.moves), Some(2));
        assert!(h.is_empty());
    }

    #[test]
    fn snapshot_is_independent_of_live_state() {
        let mut store = ActorStore::new();
        let id = store.add(0, 0, Kind::Character(Noun::Rock));
        let mut s = snap(0);
        s.actors = store.clone();

        store.get_mut(id).unwrap().x = 5;
        store.add(1, 1, Kind::Character(Noun::Bush));

        assert_eq!(s.actors.get(id).map(|a| a.x), Some(0));
        assert_eq!(s.actors.len(), 1);
    }
}
