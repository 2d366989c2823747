//! The step function: advances the game by one command.
//!
//! Processing order for a move:
//!   1. Capture pre-move snapshot
//!   2. Movement resolution (player + push chain)
//!   3. On acceptance: push snapshot onto history
//!   4. Rule re-derivation + flag reapplication (may change the player)
//!   5. Win / lose check
//!
//! A rejected move stops after step 2 and leaves the state untouched.
//! The whole tick runs against one owned `GameState`; callers only ever
//! see the state before or after it.

use tracing::{debug, info};

use crate::domain::actor::MoveDir;
use crate::domain::movement::{self, MoveResult};
use crate::domain::tile::Property;
use super::event::GameEvent;
use super::history;
use super::world::{GameState, Outcome, Status};

/// One discrete input.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Move(MoveDir),
    Undo,
    Quit,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

/// (state, command) → (next state, events). Terminated states pass through.
pub fn step(mut world: GameState, command: Command) -> (GameState, Vec<GameEvent>) {
    let events = apply(&mut world, command);
    (world, events)
}

fn apply(world: &mut GameState, command: Command) -> Vec<GameEvent> {
    if world.status == Status::Terminated {
        return vec![];
    }

    let mut events: Vec<GameEvent> = Vec::new();
    match command {
        Command::Move(dir) => {
            if resolve_move(world, dir, &mut events) {
                resolve_rules(world, &mut events);
                resolve_win_lose(world, &mut events);
            }
        }
        Command::Undo => resolve_undo(world, &mut events),
        Command::Quit => {
            world.status = Status::Terminated;
            world.outcome = Some(Outcome::Quit);
            info!(moves = world.moves, "quit");
            events.push(GameEvent::Quit);
        }
    }
    events
}

// ══════════════════════════════════════════════════════════════
// Movement
// ══════════════════════════════════════════════════════════════

fn resolve_move(world: &mut GameState, dir: MoveDir, events: &mut Vec<GameEvent>) -> bool {
    let save = history::capture_snapshot(world);

    match movement::try_move(&mut world.actors, world.bounds, world.player, dir) {
        MoveResult::Moved { from, to, pushed, .. } => {
            world.history.push(save);
            world.moves += 1;
            debug!(?dir, ?from, ?to, pushed = pushed.len(), "move_accepted");
            events.push(GameEvent::PlayerMoved { from, to });
            events.extend(pushed.into_iter().map(|(id, to)| GameEvent::ActorPushed { id, to }));
            true
        }
        MoveResult::Rejected(reason) => {
            debug!(?dir, %reason, "move_rejected");
            events.push(GameEvent::MoveRejected { reason });
            false
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Rules
// ══════════════════════════════════════════════════════════════

fn resolve_rules(world: &mut GameState, events: &mut Vec<GameEvent>) {
    let change = world.refresh_rules();
    for rule in change.broken {
        info!(%rule, "rule_broken");
        events.push(GameEvent::RuleBroken { rule });
    }
    for rule in change.formed {
        info!(%rule, "rule_formed");
        events.push(GameEvent::RuleFormed { rule });
    }
    if change.player_changed {
        info!(player = ?world.player, "player_changed");
        events.push(GameEvent::PlayerChanged { player: world.player });
    }
}

// ══════════════════════════════════════════════════════════════
// Win / lose check
// ══════════════════════════════════════════════════════════════

/// Characters on the player's cell (the player included) decide the
/// outcome. Any isVictory wins, even if an isLose shares the cell.
fn resolve_win_lose(world: &mut GameState, events: &mut Vec<GameEvent>) {
    let Some((px, py)) = world.player_pos() else { return };

    let mut win = false;
    let mut lose = false;
    for actor in world.actors.characters().filter(|a| a.is_at(px, py)) {
        win |= actor.has(Property::Victory);
        lose |= actor.has(Property::Lose);
    }

    if win {
        world.status = Status::Terminated;
        world.outcome = Some(Outcome::Won);
        info!(level = %world.name, moves = world.moves, "won");
        events.push(GameEvent::Won);
    } else if lose {
        if let Some(id) = world.player.take() {
            world.actors.remove(id);
        }
        world.outcome = Some(Outcome::Lost);
        info!(level = %world.name, x = px, y = py, "lost");
        events.push(GameEvent::Lost);
    }
}

// ══════════════════════════════════════════════════════════════
// Undo
// ══════════════════════════════════════════════════════════════

fn resolve_undo(world: &mut GameState, events: &mut Vec<GameEvent>) {
    match world.history.pop() {
        Some(snap) => {
            history::restore_snapshot(world, snap);
            world.outcome = None;
            info!(moves = world.moves, remaining = world.history.len(), "undo");
            events.push(GameEvent::Undone);
        }
        None => {
            debug!("undo_empty");
            events.push(GameEvent::NothingToUndo);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::actor::{Actor, ActorId, Kind};
    use crate::domain::movement::Rejection;
    use crate::domain::tile::Noun;
    use crate::sim::level::{load_level, LevelDef};

    /// Helper: build a loaded level from a string diagram.
    fn game(rows: &[&str]) -> GameState {
        let def = LevelDef {
            name: "test".to_string(),
            rows: rows.iter().map(|s| s.to_string()).collect(),
        };
        load_level(&def, &GameConfig::default()).expect("valid test map")
    }

    fn go(world: GameState, dirs: &[MoveDir]) -> (GameState, Vec<GameEvent>) {
        let mut world = world;
        let mut all = vec![];
        for &d in dirs {
            let (next, events) = step(world, Command::Move(d));
            world = next;
            all.extend(events);
        }
        (world, all)
    }

    fn first(world: &GameState, kind: Kind) -> &Actor {
        world.actors().find(|a| a.kind == kind).expect("actor of kind")
    }

    fn positions(world: &GameState) -> Vec<(ActorId, usize, usize)> {
        world.actors().map(|a| (a.id, a.x, a.y)).collect()
    }

    // ── Movement ──

    #[test]
    fn move_right_in_five_by_five() {
        let w = game(&["MIY..", ".....", "..1..", ".....", "....."]);
        assert_eq!(w.player_pos(), Some((2, 2)));
        let (w, events) = go(w, &[MoveDir::Right]);
        assert_eq!(w.player_pos(), Some((3, 2)));
        assert_eq!(events[0], GameEvent::PlayerMoved { from: (2, 2), to: (3, 2) });
        assert_eq!(w.history.len(), 1);
    }

    #[test]
    fn move_against_edge_is_rejected() {
        let w = game(&["MIY", "..1"]);
        let before = positions(&w);
        let (w, events) = go(w, &[MoveDir::Down]);
        assert_eq!(events, vec![GameEvent::MoveRejected { reason: Rejection::OutOfBounds }]);
        assert_eq!(positions(&w), before);
        assert!(w.history.is_empty());
        assert_eq!(w.moves, 0);
    }

    #[test]
    fn move_without_player_is_noop() {
        let w = game(&["MI.", "..1"]);
        assert!(w.player.is_none());
        let (w, events) = go(w, &[MoveDir::Left]);
        assert_eq!(events, vec![GameEvent::MoveRejected { reason: Rejection::NoPlayer }]);
        assert!(w.history.is_empty());
    }

    #[test]
    fn push_word_forms_rule_after_existing_rules() {
        let w = game(&["MIY....", "..1W.IP"]);
        let (w, events) = go(w, &[MoveDir::Right]);
        assert_eq!(w.player_pos(), Some((3, 1)));
        assert_eq!(first(&w, Kind::Subject(Noun::Wall)).x, 4);
        assert_eq!(w.rule_strings(), vec!["Meepo isYou", "Wall isPush"]);
        assert!(events.contains(&GameEvent::RuleFormed { rule: "Wall isPush".parse().unwrap() }));
    }

    #[test]
    fn wall_is_push_lets_player_push_walls() {
        let w = game(&["WIP.", "12..", "MIY."]);
        let wall = first(&w, Kind::Character(Noun::Wall)).id;
        let (w, _) = go(w, &[MoveDir::Right]);
        assert_eq!(w.player_pos(), Some((1, 1)));
        assert_eq!(w.actors.get(wall).map(|a| a.x), Some(2));
    }

    #[test]
    fn without_push_rule_wall_is_walked_over() {
        let w = game(&["....", "12..", "MIY."]);
        let wall = first(&w, Kind::Character(Noun::Wall)).id;
        let (w, _) = go(w, &[MoveDir::Right]);
        assert_eq!(w.player_pos(), Some((1, 1)));
        assert_eq!(w.actors.get(wall).map(|a| a.x), Some(1));
    }

    #[test]
    fn wall_is_stop_blocks_player() {
        let w = game(&["WIS.", "12..", "MIY."]);
        let (w, events) = go(w, &[MoveDir::Right]);
        assert_eq!(w.player_pos(), Some((0, 1)));
        assert_eq!(events, vec![GameEvent::MoveRejected { reason: Rejection::Blocked }]);
    }

    #[test]
    fn push_rule_formed_later_overrides_stop() {
        // Walls are stop; pushing P under the link adds "Wall isPush".
        let w = game(&[
            "WIS..",
            ".....",
            "WI.P1",
            ".....",
            "..2..",
            "MIY..",
        ]);
        let (w, _) = go(w, &[MoveDir::Left]);
        assert_eq!(w.rule_strings(), vec!["Wall isStop", "Meepo isYou", "Wall isPush"]);
        let wall = first(&w, Kind::Character(Noun::Wall)).id;
        // Walk round to the wall's left and push it right.
        let (w, _) = go(w, &[MoveDir::Down, MoveDir::Left, MoveDir::Left, MoveDir::Down]);
        assert_eq!(w.player_pos(), Some((1, 4)));
        let (w, _) = go(w, &[MoveDir::Right]);
        assert_eq!(w.actors.get(wall).map(|a| (a.x, a.y)), Some((3, 4)));
    }

    // ── Rules & player ──

    #[test]
    fn breaking_is_you_unsets_player() {
        let w = game(&[".....", "MIY..", "..1.."]);
        let (w, events) = go(w, &[MoveDir::Up]);
        assert!(w.player.is_none());
        assert!(w.rule_strings().is_empty());
        assert!(events.contains(&GameEvent::PlayerChanged { player: None }));
        let (w, events) = go(w, &[MoveDir::Left]);
        assert_eq!(events, vec![GameEvent::MoveRejected { reason: Rejection::NoPlayer }]);
        assert!(w.is_running());
    }

    #[test]
    fn new_is_you_rule_transfers_control() {
        let w = game(&["MIY...", ".F.IY.", "1...4."]);
        let meepo = w.player;
        let flag = first(&w, Kind::Character(Noun::Flag)).id;
        let (w, _) = go(w, &[MoveDir::Up]);
        assert_eq!(w.player, meepo);
        let (w, events) = go(w, &[MoveDir::Right]);
        assert_eq!(first(&w, Kind::Subject(Noun::Flag)).x, 2);
        assert_eq!(w.rule_strings(), vec!["Meepo isYou", "Flag isYou"]);
        assert_eq!(w.player, Some(flag));
        assert!(events.contains(&GameEvent::PlayerChanged { player: Some(flag) }));
    }

    // ── Win / lose ──

    #[test]
    fn stepping_on_victory_wins_and_terminates() {
        let w = game(&["MIY", "FIV", "14."]);
        let (w, events) = go(w, &[MoveDir::Right]);
        assert!(events.contains(&GameEvent::Won));
        assert_eq!(w.status, Status::Terminated);
        assert_eq!(w.outcome, Some(Outcome::Won));

        let (w2, events) = step(w.clone(), Command::Undo);
        assert!(events.is_empty());
        assert_eq!(w2.player_pos(), w.player_pos());
    }

    #[test]
    fn stepping_on_lose_removes_player_but_keeps_running() {
        let w = game(&["MIY", "FIL", "14."]);
        let count = w.actors.len();
        let (w, events) = go(w, &[MoveDir::Right]);
        assert!(events.contains(&GameEvent::Lost));
        assert!(w.player.is_none());
        assert_eq!(w.actors.len(), count - 1);
        assert_eq!(w.outcome, Some(Outcome::Lost));
        assert!(w.is_running());
    }

    #[test]
    fn victory_dominates_lose_on_same_cell() {
        let mut w = game(&["MIY", "FIV", "BIL", "14."]);
        w.actors.add(1, 3, Kind::Character(Noun::Bush));
        w.refresh_rules();
        let (w, events) = go(w, &[MoveDir::Right]);
        assert!(events.contains(&GameEvent::Won));
        assert!(!events.contains(&GameEvent::Lost));
        assert_eq!(w.outcome, Some(Outcome::Won));
    }

    #[test]
    fn player_itself_can_be_the_victory() {
        let w = game(&["MIY", "MIV", "1.."]);
        let (w, events) = go(w, &[MoveDir::Right]);
        assert!(events.contains(&GameEvent::Won));
        assert!(!w.is_running());
    }

    // ── Undo ──

    #[test]
    fn undo_restores_positions_rules_and_player() {
        let w = game(&["MIY....", "..1W.IP"]);
        let before_pos = positions(&w);
        let before_rules = w.rule_strings();
        let before_player = w.player;

        let (w, _) = go(w, &[MoveDir::Right]);
        assert_ne!(w.rule_strings(), before_rules);

        let (w, events) = step(w, Command::Undo);
        assert_eq!(events, vec![GameEvent::Undone]);
        assert_eq!(positions(&w), before_pos);
        assert_eq!(w.rule_strings(), before_rules);
        assert_eq!(w.player, before_player);
        assert_eq!(w.moves, 0);
    }

    #[test]
    fn undo_after_loss_brings_player_back() {
        let w = game(&["MIY", "FIL", "14."]);
        let start = w.player_pos();
        let (w, _) = go(w, &[MoveDir::Right]);
        assert!(w.player.is_none());
        let (w, _) = step(w, Command::Undo);
        assert_eq!(w.player_pos(), start);
        assert_eq!(w.outcome, None);
        let (w, events) = go(w, &[MoveDir::Right]);
        assert!(events.contains(&GameEvent::Lost));
        assert!(w.player.is_none());
    }

    #[test]
    fn undo_twice_walks_back_two_moves() {
        let w = game(&["MIY..", ".....", "1...."]);
        let (w, _) = go(w, &[MoveDir::Right, MoveDir::Right, MoveDir::Up]);
        assert_eq!(w.player_pos(), Some((2, 1)));
        let (w, _) = step(w, Command::Undo);
        assert_eq!(w.player_pos(), Some((2, 2)));
        let (w, _) = step(w, Command::Undo);
        assert_eq!(w.player_pos(), Some((1, 2)));
        assert_eq!(w.history.len(), 1);
    }

    #[test]
    fn undo_with_empty_history_is_noop() {
        let w = game(&["MIY", "1.."]);
        let before = positions(&w);
        let (w, events) = step(w, Command::Undo);
        assert_eq!(events, vec![GameEvent::NothingToUndo]);
        assert_eq!(positions(&w), before);
        assert!(w.is_running());
    }

    #[test]
    fn rejected_move_leaves_history_untouched() {
        let w = game(&["MIY", "1.."]);
        let (w, _) = go(w, &[MoveDir::Right, MoveDir::Down]);
        assert_eq!(w.history.len(), 1);
    }

    #[test]
    fn snapshot_unaffected_by_later_moves() {
        let w = game(&["MIY..", "1...."]);
        let (w, _) = go(w, &[MoveDir::Right]);
        let (mut w, _) = go(w, &[MoveDir::Right, MoveDir::Right]);
        // Oldest snapshot still shows the player at the start column.
        let mut oldest = None;
        while let Some(s) = w.history.pop() {
            oldest = Some(s);
        }
        let oldest = oldest.unwrap();
        let p = oldest.player.and_then(|id| oldest.actors.get(id)).unwrap();
        assert_eq!((p.x, p.y), (0, 1));
    }

    // ── Quit ──

    #[test]
    fn quit_terminates_and_ignores_further_input() {
        let w = game(&["MIY", "1.."]);
        let (w, events) = step(w, Command::Quit);
        assert_eq!(events, vec![GameEvent::Quit]);
        assert_eq!(w.outcome, Some(Outcome::Quit));
        let (w, events) = step(w, Command::Move(MoveDir::Right));
        assert!(events.is_empty());
        assert_eq!(w.player_pos(), Some((0, 1)));
    }

    // ── Properties ──

    #[test]
    fn rule_set_never_has_duplicates() {
        let mut w = game(&["MIY.MIY", ".......", "1......"]);
        for d in [MoveDir::Right, MoveDir::Right, MoveDir::Up, MoveDir::Right, MoveDir::Down] {
            let (next, _) = step(w, Command::Move(d));
            w = next;
            let rules = w.rule_strings();
            let mut unique = rules.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(rules.len(), unique.len());
        }
    }
}
