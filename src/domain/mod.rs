//! Pure game logic: no I/O, no logging.

pub mod actor;
pub mod movement;
pub mod registry;
pub mod rules;
pub mod tile;
