//! Entry point and game loop.

mod ui;

use std::error::Error;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use meepo::config::GameConfig;
use meepo::sim::event::GameEvent;
use meepo::sim::level::{load_level, resolve_levels, LevelDef};
use meepo::sim::step::{self, Command};
use meepo::sim::world::{GameState, Outcome};
use ui::input::{Action, InputState};
use ui::renderer::{Hud, Renderer};

/// Pause on a cleared level before the next one loads.
const ADVANCE_DELAY: Duration = Duration::from_millis(900);

fn main() {
    let config = GameConfig::load();

    if let Err(e) = init_logging(&config) {
        eprintln!("Logging disabled: {e}");
    }
    if let Some(msg) = &config.load_warning {
        warn!("{msg}");
    }

    let cli_path = std::env::args_os().nth(1).map(PathBuf::from);
    let levels = match resolve_levels(&config, cli_path.as_deref()) {
        Ok(levels) => levels,
        Err(e) => {
            error!(error = %e, "level_resolve_failed");
            eprintln!("Could not load levels: {e}");
            std::process::exit(1);
        }
    };

    // Validate the first map before the terminal switches modes.
    let Some(first) = levels.first() else {
        eprintln!("No levels to play");
        std::process::exit(1);
    };
    let world = match load_level(first, &config) {
        Ok(w) => w,
        Err(e) => {
            error!(level = %first.name, error = %e, "level_load_failed");
            eprintln!("{}: {e}", first.name);
            std::process::exit(1);
        }
    };

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(world, &levels, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    match result {
        Ok(summary) => {
            info!(cleared = summary.cleared, total = levels.len(), "session_end");
            println!("Levels cleared: {}/{}", summary.cleared, levels.len());
        }
        Err(e) => {
            error!(error = %e, "game_error");
            eprintln!("Game error: {e}");
        }
    }
}

/// Structured logs go to a file; the terminal belongs to the game.
fn init_logging(config: &GameConfig) -> Result<(), Box<dyn Error>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log.file)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| e.to_string())?;
    Ok(())
}

struct Summary {
    cleared: usize,
}

fn game_loop(
    mut world: GameState,
    levels: &[LevelDef],
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<Summary, Box<dyn Error>> {
    let mut input = InputState::new();
    let poll = Duration::from_millis(config.poll_ms);
    let mut index = 0;
    let mut cleared = 0;
    let mut won_at: Option<Instant> = None;
    let mut message = String::new();

    loop {
        let hud = Hud { index, total: levels.len(), message: message.clone() };
        renderer.render(&world, &hud)?;

        input.drain_events(poll);
        for &action in input.actions() {
            match action {
                Action::Restart => {
                    world = load_level(&levels[index], config)?;
                    won_at = None;
                    message = "Restarted".into();
                    info!(level = %world.name, "restart");
                }
                // A finished level ignores every command, so quitting is
                // handled out here.
                Action::Game(Command::Quit) if !world.is_running() => {
                    return Ok(Summary { cleared });
                }
                Action::Game(cmd) => {
                    let (next, events) = step::step(world, cmd);
                    world = next;
                    if let Some(note) = event_message(&events) {
                        message = note;
                    }
                    if events.contains(&GameEvent::Won) {
                        cleared += 1;
                    }
                }
            }
        }

        match world.outcome {
            Some(Outcome::Quit) => return Ok(Summary { cleared }),
            Some(Outcome::Won) if index + 1 < levels.len() => {
                let since = *won_at.get_or_insert_with(Instant::now);
                if since.elapsed() >= ADVANCE_DELAY {
                    index += 1;
                    world = load_level(&levels[index], config)?;
                    won_at = None;
                    message.clear();
                    renderer.invalidate();
                }
            }
            _ => {}
        }
    }
}

/// One short line describing what the last command changed. An empty
/// string clears the previous note; `None` keeps it.
fn event_message(events: &[GameEvent]) -> Option<String> {
    for event in events {
        match event {
            GameEvent::MoveRejected { reason } => return Some(format!("Can't move: {reason}")),
            GameEvent::NothingToUndo => return Some("Nothing to undo".into()),
            _ => {}
        }
    }

    let formed = events.iter().find_map(|e| match e {
        GameEvent::RuleFormed { rule } => Some(format!("+ {rule}")),
        _ => None,
    });
    let broken = events.iter().find_map(|e| match e {
        GameEvent::RuleBroken { rule } => Some(format!("- {rule}")),
        _ => None,
    });
    let acted = events
        .iter()
        .any(|e| matches!(e, GameEvent::PlayerMoved { .. } | GameEvent::Undone));

    formed.or(broken).or_else(|| acted.then(String::new))
}

#[cfg(test)]
mod tests {
    use super::*;
    use meepo::domain::movement::Rejection;

    #[test]
    fn event_message_prefers_formed_rules() {
        let formed = GameEvent::RuleFormed { rule: "Wall isPush".parse().unwrap() };
        let broken = GameEvent::RuleBroken { rule: "Wall isStop".parse().unwrap() };
        let moved = GameEvent::PlayerMoved { from: (0, 0), to: (1, 0) };
        assert_eq!(event_message(&[moved.clone(), broken.clone(), formed]), Some("+ Wall isPush".into()));
        assert_eq!(event_message(&[moved.clone(), broken]), Some("- Wall isStop".into()));
        assert_eq!(event_message(&[moved]), Some(String::new()));
    }

    #[test]
    fn event_message_reports_rejections_and_empty_undo() {
        let rejected = GameEvent::MoveRejected { reason: Rejection::Blocked };
        assert_eq!(event_message(&[rejected]), Some("Can't move: blocked".into()));
        assert_eq!(event_message(&[GameEvent::NothingToUndo]), Some("Nothing to undo".into()));
        assert_eq!(event_message(&[GameEvent::Won]), None);
    }
}
