//! Map legend and the noun / property keyword tables.
//! Semantics of each symbol are centralized here so the loader,
//! the rule engine and the renderer all agree on them.
//!
//! ## Legend
//!   '1'..'5' = Meepo, Wall, Rock, Flag, Bush (character spawn)
//!   'M' 'W' 'R' 'F' 'B' = Subject tile for the same nouns
//!   'Y' 'P' 'S' 'V' 'L' = Attribute tile: isYou, isPush, isStop, isVictory, isLose
//!   'I' = Link tile
//!   '.' = Empty

use std::fmt;

/// Character types. Closed set: every noun keyword maps to exactly one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Noun {
    Meepo,
    Wall,
    Rock,
    Flag,
    Bush,
}

impl Noun {
    pub const ALL: [Noun; 5] = [Noun::Meepo, Noun::Wall, Noun::Rock, Noun::Flag, Noun::Bush];

    pub fn keyword(self) -> &'static str {
        match self {
            Noun::Meepo => "Meepo",
            Noun::Wall => "Wall",
            Noun::Rock => "Rock",
            Noun::Flag => "Flag",
            Noun::Bush => "Bush",
        }
    }

    /// Keyword → character type lookup.
    pub fn from_keyword(word: &str) -> Option<Noun> {
        Noun::ALL.into_iter().find(|n| n.keyword() == word)
    }
}

impl fmt::Display for Noun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Behavior a rule can confer on a noun.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Property {
    You,
    Push,
    Stop,
    Victory,
    Lose,
}

impl Property {
    pub const ALL: [Property; 5] = [
        Property::You,
        Property::Push,
        Property::Stop,
        Property::Victory,
        Property::Lose,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Property::You => "isYou",
            Property::Push => "isPush",
            Property::Stop => "isStop",
            Property::Victory => "isVictory",
            Property::Lose => "isLose",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Property> {
        Property::ALL.into_iter().find(|p| p.keyword() == word)
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One cell of a tokenized map.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Symbol {
    Empty,
    Character(Noun),
    Subject(Noun),
    Attribute(Property),
    Link,
}

impl Symbol {
    pub fn from_char(ch: char) -> Option<Symbol> {
        let sym = match ch {
            '.' => Symbol::Empty,
            '1' => Symbol::Character(Noun::Meepo),
            '2' => Symbol::Character(Noun::Wall),
            '3' => Symbol::Character(Noun::Rock),
            '4' => Symbol::Character(Noun::Flag),
            '5' => Symbol::Character(Noun::Bush),
            'M' => Symbol::Subject(Noun::Meepo),
            'W' => Symbol::Subject(Noun::Wall),
            'R' => Symbol::Subject(Noun::Rock),
            'F' => Symbol::Subject(Noun::Flag),
            'B' => Symbol::Subject(Noun::Bush),
            'Y' => Symbol::Attribute(Property::You),
            'P' => Symbol::Attribute(Property::Push),
            'S' => Symbol::Attribute(Property::Stop),
            'V' => Symbol::Attribute(Property::Victory),
            'L' => Symbol::Attribute(Property::Lose),
            'I' => Symbol::Link,
            _ => return None,
        };
        Some(sym)
    }
}
