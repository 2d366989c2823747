//! Actors: every grid entity is one record with a kind tag.
//! Only characters carry behavior flags; word and link tiles answer
//! capability queries from their kind alone.

use super::tile::{Noun, Property, Symbol};

/// Movement direction of a discrete player step.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Left,
    Right,
    Up,
    Down,
}

impl MoveDir {
    /// Unit vector (dx, dy). y grows downward.
    pub fn delta(self) -> (i64, i64) {
        match self {
            MoveDir::Left => (-1, 0),
            MoveDir::Right => (1, 0),
            MoveDir::Up => (0, -1),
            MoveDir::Down => (0, 1),
        }
    }
}

/// Stable actor handle. Survives removal of other actors and snapshot copies.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct ActorId(pub u32);

/// Behavior flags set by rules. All independent.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Flags {
    pub player: bool,
    pub stop: bool,
    pub push: bool,
    pub win: bool,
    pub lose: bool,
}

impl Flags {
    pub fn get(&self, prop: Property) -> bool {
        match prop {
            Property::You => self.player,
            Property::Push => self.push,
            Property::Stop => self.stop,
            Property::Victory => self.win,
            Property::Lose => self.lose,
        }
    }

    pub fn set(&mut self, prop: Property, on: bool) {
        let slot = match prop {
            Property::You => &mut self.player,
            Property::Push => &mut self.push,
            Property::Stop => &mut self.stop,
            Property::Victory => &mut self.win,
            Property::Lose => &mut self.lose,
        };
        *slot = on;
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Kind {
    Character(Noun),
    Subject(Noun),
    Attribute(Property),
    Link,
}

impl Kind {
    /// Map symbol → actor kind. `None` for background cells.
    pub fn from_symbol(sym: Symbol) -> Option<Kind> {
        match sym {
            Symbol::Empty => None,
            Symbol::Character(n) => Some(Kind::Character(n)),
            Symbol::Subject(n) => Some(Kind::Subject(n)),
            Symbol::Attribute(p) => Some(Kind::Attribute(p)),
            Symbol::Link => Some(Kind::Link),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Actor {
    pub id: ActorId,
    pub x: usize,
    pub y: usize,
    pub kind: Kind,
    /// `Some` iff `kind` is a character.
    pub flags: Option<Flags>,
}

impl Actor {
    pub fn new(id: ActorId, x: usize, y: usize, kind: Kind) -> Self {
        let flags = match kind {
            Kind::Character(_) => Some(Flags::default()),
            _ => None,
        };
        Actor { id, x, y, kind, flags }
    }

    /// Character type, if this actor is a character.
    pub fn noun(&self) -> Option<Noun> {
        match self.kind {
            Kind::Character(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_character(&self) -> bool {
        matches!(self.kind, Kind::Character(_))
    }

    /// Subject or Attribute tile.
    pub fn is_word(&self) -> bool {
        matches!(self.kind, Kind::Subject(_) | Kind::Attribute(_))
    }

    pub fn has(&self, prop: Property) -> bool {
        self.flags.map_or(false, |f| f.get(prop))
    }

    /// Words are always pushable; links never move.
    pub fn is_push(&self) -> bool {
        match self.kind {
            Kind::Subject(_) | Kind::Attribute(_) => true,
            Kind::Link => false,
            Kind::Character(_) => self.has(Property::Push),
        }
    }

    pub fn is_stop(&self) -> bool {
        match self.kind {
            Kind::Link => true,
            Kind::Subject(_) | Kind::Attribute(_) => false,
            Kind::Character(_) => self.has(Property::Stop),
        }
    }

    /// Stops movement and cannot be pushed out of the way.
    pub fn blocks(&self) -> bool {
        self.is_stop() && !self.is_push()
    }

    pub fn is_at(&self, x: usize, y: usize) -> bool {
        self.x == x && self.y == y
    }
}

/// Grid dimensions.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Bounds {
    pub width: usize,
    pub height: usize,
}

impl Bounds {
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Neighbor cell in `dir`, or `None` past the edge.
    pub fn step(&self, x: usize, y: usize, dir: MoveDir) -> Option<(usize, usize)> {
        let (dx, dy) = dir.delta();
        let nx = usize::try_from(x as i64 + dx).ok()?;
        let ny = usize::try_from(y as i64 + dy).ok()?;
        self.contains(nx, ny).then_some((nx, ny))
    }
}

// ══════════════════════════════════════════════════════════════
// ActorStore
// ══════════════════════════════════════════════════════════════

/// All actors in insertion order (row-major map scan order).
/// Several actors may share a cell.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActorStore {
    actors: Vec<Actor>,
    next_id: u32,
}

impl ActorStore {
    pub fn new() -> Self {
        ActorStore::default()
    }

    pub fn add(&mut self, x: usize, y: usize, kind: Kind) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        self.actors.push(Actor::new(id, x, y, kind));
        id
    }

    /// Remove an actor, keeping the order of the rest.
    pub fn remove(&mut self, id: ActorId) -> Option<Actor> {
        let idx = self.actors.iter().position(|a| a.id == id)?;
        Some(self.actors.remove(idx))
    }

    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.actors.iter().find(|a| a.id == id)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|a| a.id == id)
    }

    /// First actor at (x, y) in store order.
    pub fn actor_at(&self, x: usize, y: usize) -> Option<&Actor> {
        self.actors.iter().find(|a| a.is_at(x, y))
    }

    pub fn actors_at(&self, x: usize, y: usize) -> impl Iterator<Item = &Actor> {
        self.actors.iter().filter(move |a| a.is_at(x, y))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter()
    }

    /// Character-typed actors only, in store order.
    pub fn characters(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter().filter(|a| a.is_character())
    }

    pub fn characters_mut(&mut self) -> impl Iterator<Item = &mut Actor> {
        self.actors.iter_mut().filter(|a| a.is_character())
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_at_returns_first_in_store_order() {
        let mut store = ActorStore::new();
        let rock = store.add(1, 1, Kind::Character(Noun::Rock));
        let word = store.add(1, 1, Kind::Subject(Noun::Wall));
        store.add(2, 1, Kind::Link);

        assert_eq!(store.actor_at(1, 1).map(|a| a.id), Some(rock));
        assert_eq!(store.actors_at(1, 1).count(), 2);
        assert!(store.actor_at(0, 0).is_none());

        store.remove(rock);
        assert_eq!(store.actor_at(1, 1).map(|a| a.id), Some(word));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn ids_stay_stable_across_removal() {
        let mut store = ActorStore::new();
        let a = store.add(0, 0, Kind::Character(Noun::Meepo));
        let b = store.add(1, 0, Kind::Character(Noun::Wall));
        store.remove(a);
        let c = store.add(2, 0, Kind::Character(Noun::Flag));
        assert_ne!(c, a);
        assert_eq!(store.get(b).map(|x| x.x), Some(1));
        assert!(store.get(a).is_none());
    }

    #[test]
    fn characters_filter_skips_tiles() {
        let mut store = ActorStore::new();
        store.add(0, 0, Kind::Subject(Noun::Wall));
        store.add(1, 0, Kind::Link);
        store.add(2, 0, Kind::Attribute(Property::Push));
        store.add(3, 0, Kind::Character(Noun::Wall));
        let chars: Vec<_> = store.characters().map(|a| a.x).collect();
        assert_eq!(chars, vec![3]);
    }

    #[test]
    fn capabilities_follow_kind_and_flags() {
        let word = Actor::new(ActorId(0), 0, 0, Kind::Attribute(Property::You));
        assert!(word.is_push());
        assert!(!word.blocks());

        let link = Actor::new(ActorId(1), 0, 0, Kind::Link);
        assert!(!link.is_push());
        assert!(link.blocks());

        let mut wall = Actor::new(ActorId(2), 0, 0, Kind::Character(Noun::Wall));
        assert!(!wall.is_push() && !wall.is_stop());
        wall.flags.as_mut().unwrap().set(Property::Stop, true);
        assert!(wall.blocks());
        wall.flags.as_mut().unwrap().set(Property::Push, true);
        assert!(wall.is_push());
        assert!(!wall.blocks());
    }

    #[test]
    fn bounds_step_stops_at_edges() {
        let b = Bounds { width: 3, height: 2 };
        assert_eq!(b.step(0, 0, MoveDir::Left), None);
        assert_eq!(b.step(0, 0, MoveDir::Up), None);
        assert_eq!(b.step(2, 1, MoveDir::Right), None);
        assert_eq!(b.step(2, 1, MoveDir::Down), None);
        assert_eq!(b.step(1, 0, MoveDir::Down), Some((1, 1)));
    }
}
