//! Player move resolution with push chains.
//!
//! Resolution is two-step: build a plan against an immutable view of
//! the store, then apply it. A rejected move never touches the store.
//!
//! ## Cell Classification
//! ┌───────────────────────────────────────┬──────────┐
//! │ Actors in cell                        │ Class    │
//! ├───────────────────────────────────────┼──────────┤
//! │ off-grid                              │ Edge     │
//! │ any actor with stop && !push          │ Blocked  │
//! │ any actor with push                   │ Push     │
//! │ none, or only pass-through actors     │ Open     │
//! └───────────────────────────────────────┴──────────┘
//!
//! ## Move Truth Table
//! ┌───────────────────┬─────────────────────────────────────────┐
//! │ Destination       │ Result                                  │
//! ├───────────────────┼─────────────────────────────────────────┤
//! │ no player         │ reject (NoPlayer)                       │
//! │ Edge              │ reject (OutOfBounds)                    │
//! │ Blocked           │ reject (Blocked)                        │
//! │ Push, chain → Open│ shift chain far end first, step player  │
//! │ Push, chain → Edge/Blocked │ reject (PushBlocked)           │
//! │ Open              │ step player                             │
//! └───────────────────┴─────────────────────────────────────────┘

use std::fmt;

use super::actor::{ActorId, ActorStore, Bounds, MoveDir};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Cell {
    Edge,
    Blocked,
    Push,
    Open,
}

/// Classify (x, y), ignoring `skip` (the mover itself).
fn classify(store: &ActorStore, at: Option<(usize, usize)>, skip: ActorId) -> Cell {
    let Some((x, y)) = at else { return Cell::Edge };
    let mut push = false;
    for actor in store.actors_at(x, y).filter(|a| a.id != skip) {
        if actor.blocks() {
            return Cell::Blocked;
        }
        push |= actor.is_push();
    }
    if push { Cell::Push } else { Cell::Open }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rejection {
    NoPlayer,
    OutOfBounds,
    Blocked,
    PushBlocked,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rejection::NoPlayer => "no player",
            Rejection::OutOfBounds => "edge of map",
            Rejection::Blocked => "blocked",
            Rejection::PushBlocked => "push blocked",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveResult {
    Moved {
        player: ActorId,
        from: (usize, usize),
        to: (usize, usize),
        /// Pushed actors with their new cells, far end of the chain first.
        pushed: Vec<(ActorId, (usize, usize))>,
    },
    Rejected(Rejection),
}

impl MoveResult {
    pub fn accepted(&self) -> bool {
        matches!(self, MoveResult::Moved { .. })
    }
}

/// Resolve one player step in `dir`. Mutates `store` only on success.
pub fn try_move(
    store: &mut ActorStore,
    bounds: Bounds,
    player: Option<ActorId>,
    dir: MoveDir,
) -> MoveResult {
    let Some((pid, from)) = player.and_then(|id| store.get(id)).map(|p| (p.id, (p.x, p.y))) else {
        return MoveResult::Rejected(Rejection::NoPlayer);
    };
    let Some(dest) = bounds.step(from.0, from.1, dir) else {
        return MoveResult::Rejected(Rejection::OutOfBounds);
    };

    let mut pushed = vec![];
    match classify(store, Some(dest), pid) {
        Cell::Edge => return MoveResult::Rejected(Rejection::OutOfBounds),
        Cell::Blocked => return MoveResult::Rejected(Rejection::Blocked),
        Cell::Open => {}
        Cell::Push => {
            // Walk the chain until it ends on an open cell.
            let mut chain = vec![dest];
            let mut cursor = dest;
            loop {
                let next = bounds.step(cursor.0, cursor.1, dir);
                match (classify(store, next, pid), next) {
                    (Cell::Push, Some(cell)) => {
                        chain.push(cell);
                        cursor = cell;
                    }
                    (Cell::Open, _) => break,
                    _ => return MoveResult::Rejected(Rejection::PushBlocked),
                }
            }

            // Far end inward so no cell is entered before it is vacated.
            for &(cx, cy) in chain.iter().rev() {
                let movers: Vec<ActorId> = store
                    .actors_at(cx, cy)
                    .filter(|a| a.id != pid && a.is_push())
                    .map(|a| a.id)
                    .collect();
                let target = bounds.step(cx, cy, dir).unwrap_or((cx, cy));
                for id in movers {
                    if let Some(a) = store.get_mut(id) {
                        (a.x, a.y) = target;
                    }
                    pushed.push((id, target));
                }
            }
        }
    }

    if let Some(p) = store.get_mut(pid) {
        (p.x, p.y) = dest;
    }
    MoveResult::Moved { player: pid, from, to: dest, pushed }
}
