//! External configuration loader.
//!
//! Reads `config.toml` from the executable's directory (or CWD).
//! Falls back to sensible defaults if the file is missing or incomplete.
//!
//! ```toml
//! [general]
//! levels_dir = "levels"
//! level = ""            # one map file; overrides levels_dir
//! [game]
//! history_limit = 0     # 0 = unlimited undo
//! [ui]
//! poll_ms = 50
//! [log]
//! level = "info"
//! file = "meepo.log"
//! ```

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub levels_dir: PathBuf,
    pub level: Option<PathBuf>,
    pub history_limit: usize,
    pub poll_ms: u64,
    pub log: LogConfig,
    /// Problem found while loading, reported once logging is up.
    pub load_warning: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub level: String,
    pub file: PathBuf,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    game: TomlGame,
    #[serde(default)]
    ui: TomlUi,
    #[serde(default)]
    log: TomlLog,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default)]
    level: String,
}

#[derive(Deserialize, Debug)]
struct TomlGame {
    #[serde(default)]
    history_limit: usize,
}

#[derive(Deserialize, Debug)]
struct TomlUi {
    #[serde(default = "default_poll_ms")]
    poll_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlLog {
    #[serde(default = "default_log_level")]
    level: String,
    #[serde(default = "default_log_file")]
    file: String,
}

// ── Defaults ──

fn default_levels_dir() -> String {
    "levels".into()
}

fn default_poll_ms() -> u64 {
    50
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_file() -> String {
    "meepo.log".into()
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { levels_dir: default_levels_dir(), level: String::new() }
    }
}

impl Default for TomlGame {
    fn default() -> Self {
        TomlGame { history_limit: 0 }
    }
}

impl Default for TomlUi {
    fn default() -> Self {
        TomlUi { poll_ms: default_poll_ms() }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog { level: default_log_level(), file: default_log_file() }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::resolve(TomlConfig::default(), &[])
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let (toml_cfg, warning) = load_toml(&search_dirs);
        let mut cfg = GameConfig::resolve(toml_cfg, &search_dirs);
        cfg.load_warning = warning;
        cfg
    }

    /// Parse config text directly. Relative paths are kept as written.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::resolve(toml_cfg, &[]))
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        let level = Some(toml_cfg.general.level.trim())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        GameConfig {
            levels_dir,
            level,
            history_limit: toml_cfg.game.history_limit,
            poll_ms: toml_cfg.ui.poll_ms.max(1),
            log: LogConfig {
                level: toml_cfg.log.level,
                file: PathBuf::from(toml_cfg.log.file),
            },
            load_warning: None,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> (TomlConfig, Option<String>) {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return (cfg, None),
                    Err(e) => {
                        let msg = format!("{} parse error, using defaults: {e}", path.display());
                        return (TomlConfig::default(), Some(msg));
                    }
                },
                Err(e) => {
                    let msg = format!("could not read {}: {e}", path.display());
                    return (TomlConfig::default(), Some(msg));
                }
            }
        }
    }
    (TomlConfig::default(), None)
}
