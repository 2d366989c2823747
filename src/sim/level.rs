//! Level loader.
//!
//! ## Sources (priority order):
//!   1. Explicit map file (CLI argument or `general.level`)
//!   2. `levels/` directory (individual `.txt` files, by file name)
//!   3. Built-in embedded levels
//!
//! ## Level file format (`.txt`):
//!   Optional line 1: `# Level Name`
//!   Lines: map rows, one symbol per cell (see `domain::tile` legend)
//!
//! Rows must be non-empty and all the same length. Any symbol outside
//! the legend is fatal; there is no partial load.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::domain::tile::Symbol;
use super::world::GameState;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("map is empty")]
    Empty,
    #[error("row {row} has {actual} cells, expected {expected}")]
    Ragged { row: usize, expected: usize, actual: usize },
    #[error("unrecognized symbol {symbol:?} at ({x}, {y})")]
    UnknownSymbol { symbol: char, x: usize, y: usize },
    #[error("failed to read map {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Level definition: name plus raw rows, not yet validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelDef {
    pub name: String,
    pub rows: Vec<String>,
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Validate rows into a rectangular symbol grid.
pub fn parse_grid<S: AsRef<str>>(rows: &[S]) -> Result<Vec<Vec<Symbol>>, MapError> {
    let width = rows.first().map_or(0, |r| r.as_ref().chars().count());
    if width == 0 {
        return Err(MapError::Empty);
    }

    let mut grid = Vec::with_capacity(rows.len());
    for (y, row) in rows.iter().enumerate() {
        let row = row.as_ref();
        let actual = row.chars().count();
        if actual != width {
            return Err(MapError::Ragged { row: y, expected: width, actual });
        }
        let cells = row
            .chars()
            .enumerate()
            .map(|(x, ch)| Symbol::from_char(ch).ok_or(MapError::UnknownSymbol { symbol: ch, x, y }))
            .collect::<Result<Vec<_>, _>>()?;
        grid.push(cells);
    }
    Ok(grid)
}

/// Build a ready-to-play state: actors placed, rules derived, player resolved.
pub fn load_level(def: &LevelDef, config: &GameConfig) -> Result<GameState, MapError> {
    let grid = parse_grid(&def.rows)?;
    let mut world = GameState::from_grid(&def.name, &grid, config.history_limit);
    world.refresh_rules();
    info!(
        level = %def.name,
        width = world.width(),
        height = world.height(),
        actors = world.actors.len(),
        rules = ?world.rule_strings(),
        has_player = world.player.is_some(),
        "level_loaded"
    );
    Ok(world)
}

/// Parse a single level from text content.
pub fn parse_level_file(content: &str, fallback_name: &str) -> LevelDef {
    let mut name = String::new();
    let mut rows: Vec<String> = vec![];

    for line in content.lines() {
        let line = line.trim_end_matches('\r');
        if rows.is_empty() && name.is_empty() && line.starts_with('#') {
            name = line[1..].trim().to_string();
        } else if rows.is_empty() && line.trim().is_empty() {
            continue;
        } else {
            rows.push(line.to_string());
        }
    }

    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }

    if name.is_empty() {
        name = fallback_name.to_string();
    }

    LevelDef { name, rows }
}

pub fn load_level_file(path: &Path) -> Result<LevelDef, MapError> {
    let content = std::fs::read_to_string(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let stem = path.file_stem().unwrap_or_default().to_string_lossy().to_string();
    Ok(parse_level_file(&content, &stem))
}

/// Ordered level list for this run.
pub fn resolve_levels(config: &GameConfig, cli_path: Option<&Path>) -> Result<Vec<LevelDef>, MapError> {
    if let Some(path) = cli_path.or(config.level.as_deref()) {
        return Ok(vec![load_level_file(path)?]);
    }

    let dir = &config.levels_dir;
    if dir.is_dir() {
        let levels = load_from_directory(dir);
        if !levels.is_empty() {
            info!(dir = %dir.display(), count = levels.len(), "levels_from_directory");
            return Ok(levels.into_iter().map(|(_, def)| def).collect());
        }
        warn!(dir = %dir.display(), "no .txt levels found, using built-in levels");
    }

    Ok(embedded_levels())
}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .txt files)
// ══════════════════════════════════════════════════════════════

fn load_from_directory(dir: &Path) -> Vec<(String, LevelDef)> {
    let mut results = vec![];

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "levels_dir_unreadable");
            return results;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().map_or(false, |e| e == "txt") {
            match load_level_file(&path) {
                Ok(def) => {
                    let filename = path.file_name()
                        .unwrap_or_default()
                        .to_string_lossy()
                        .to_string();
                    debug!(file = %filename, level = %def.name, "level_found");
                    results.push((filename, def));
                }
                Err(e) => warn!(error = %e, "level_skipped"),
            }
        }
    }

    results.sort_by(|a, b| a.0.cmp(&b.0));
    results
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

pub fn embedded_levels() -> Vec<LevelDef> {
    vec![
        make_embedded("Meepo is You", &[
            "...........",
            ".MIY...FIV.",
            "...........",
            "...2222....",
            ".1.2..2.4..",
            "...2222....",
            ".WIS.......",
            "...........",
        ]),
        make_embedded("Push the Wall", &[
            "MIY.....FIV",
            "...........",
            "..1.W..IP..",
            "...........",
            "222222222..",
            "...........",
            "........4..",
            "WIS........",
        ]),
        make_embedded("Rocks and Bushes", &[
            "MIY...RIP....",
            ".............",
            "BIL..........",
            "........5....",
            "..1..3..5..4.",
            "........5....",
            ".............",
            "FIV..........",
        ]),
        make_embedded("Become the Flag", &[
            "MIY......",
            "WIS......",
            "..1...F..",
            ".....IY..",
            "222222222",
            ".........",
            "......4..",
            "RIV.....3",
        ]),
    ]
}

fn make_embedded(name: &str, map: &[&str]) -> LevelDef {
    LevelDef {
        name: name.to_string(),
        rows: map.iter().map(|s| s.to_string()).collect(),
    }
}
