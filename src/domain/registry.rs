//! Rule → flag application over every character of the rule's noun.
//!
//! Runs in two phases each tick:
//!   1. **Clear**: every rule active before the recompute clears its flag
//!      on all matching characters. Clearing `isYou` unsets the player.
//!   2. **Apply**: every rule of the new set, in order, sets its flag.
//!      Applying `isYou` reassigns the player to each matched actor, so the
//!      last actor matched by the last `isYou` rule ends up as the player.
//!
//! Afterwards only the resolved player keeps the `player` flag.

use super::actor::{Actor, ActorId, ActorStore};
use super::rules::{Rule, RuleSet};
use super::tile::Property;

fn matching(store: &mut ActorStore, rule: Rule) -> impl Iterator<Item = &mut Actor> {
    store
        .characters_mut()
        .filter(move |a| a.noun() == Some(rule.subject))
}

/// Clear phase. Returns the player reference after clearing.
pub fn clear_rules(store: &mut ActorStore, rules: &RuleSet, player: Option<ActorId>) -> Option<ActorId> {
    let mut player = player;
    for &rule in rules.iter() {
        for actor in matching(store, rule) {
            if let Some(flags) = actor.flags.as_mut() {
                flags.set(rule.attribute, false);
            }
        }
        if rule.attribute == Property::You {
            player = None;
        }
    }
    player
}

/// Apply phase. Returns the player reference after applying.
pub fn apply_rules(store: &mut ActorStore, rules: &RuleSet, player: Option<ActorId>) -> Option<ActorId> {
    let mut player = player;
    for &rule in rules.iter() {
        for actor in matching(store, rule) {
            if let Some(flags) = actor.flags.as_mut() {
                flags.set(rule.attribute, true);
            }
            if rule.attribute == Property::You {
                player = Some(actor.id);
            }
        }
    }

    // Invariant: at most one actor holds the player flag, and it is `player`.
    let player = player.filter(|id| store.get(*id).map_or(false, |a| a.has(Property::You)));
    for actor in store.characters_mut() {
        if Some(actor.id) != player {
            if let Some(flags) = actor.flags.as_mut() {
                flags.player = false;
            }
        }
    }
    player
}

/// Full reapplication: clear `prev`, then apply `next`.
pub fn reapply(
    store: &mut ActorStore,
    prev: &RuleSet,
    next: &RuleSet,
    player: Option<ActorId>,
) -> Option<ActorId> {
    let player = clear_rules(store, prev, player);
    apply_rules(store, next, player)
}
