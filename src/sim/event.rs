//! Events emitted during a simulation step.
//! The presentation layer consumes these for messages and logging.

use crate::domain::actor::ActorId;
use crate::domain::movement::Rejection;
use crate::domain::rules::Rule;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    PlayerMoved { from: (usize, usize), to: (usize, usize) },
    ActorPushed { id: ActorId, to: (usize, usize) },
    MoveRejected { reason: Rejection },
    RuleFormed { rule: Rule },
    RuleBroken { rule: Rule },
    PlayerChanged { player: Option<ActorId> },
    Won,
    Lost,
    Undone,
    NothingToUndo,
    Quit,
}
