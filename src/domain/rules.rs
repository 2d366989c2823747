//! Rule derivation and the ordered active rule set.
//!
//! Pure functions over the actor store, no side effects.
//!
//! ## Link Evaluation Table
//!
//! Each link tile reads its four orthogonal neighbors. The two axes are
//! independent; each axis yields at most one rule.
//!
//! ┌───────────────────────────────┬──────────────────────────┐
//! │ Neighbors on axis             │ Emits                    │
//! ├───────────────────────────────┼──────────────────────────┤
//! │ Subject  | Attribute          │ "<Subject> <Attribute>"  │
//! │ Attribute | Subject           │ "<Subject> <Attribute>"  │
//! │ Subject  | Subject            │ nothing                  │
//! │ Attribute | Attribute         │ nothing                  │
//! │ any side missing / off-grid   │ nothing                  │
//! │ diagonal neighbors            │ never read               │
//! └───────────────────────────────┴──────────────────────────┘
//!
//! ## Merge Order
//!
//! ┌───────┬───────────────────────────────────────────────────┐
//! │ Phase │ Contents                                          │
//! ├───────┼───────────────────────────────────────────────────┤
//! │ 1     │ previous rules still derived, prior relative order│
//! │ 2     │ new rules, first-seen candidate order, deduped    │
//! └───────┴───────────────────────────────────────────────────┘
//!
//! Flag application walks the merged list in order, so phase 2 rules
//! are applied after phase 1 rules.

use std::fmt;
use std::str::FromStr;

use super::actor::{ActorId, ActorStore, Kind};
use super::tile::{Noun, Property};

/// A (subject, attribute) pair. Canonical form: `"Wall isPush"`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Rule {
    pub subject: Noun,
    pub attribute: Property,
}

impl Rule {
    pub fn new(subject: Noun, attribute: Property) -> Self {
        Rule { subject, attribute }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.subject, self.attribute)
    }
}

impl FromStr for Rule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split(' ');
        let (Some(subj), Some(attr), None) = (words.next(), words.next(), words.next()) else {
            return Err(format!("not a rule: {s:?}"));
        };
        let subject = Noun::from_keyword(subj).ok_or_else(|| format!("unknown noun {subj:?}"))?;
        let attribute =
            Property::from_keyword(attr).ok_or_else(|| format!("unknown attribute {attr:?}"))?;
        Ok(Rule { subject, attribute })
    }
}

// ══════════════════════════════════════════════════════════════
// Link evaluation
// ══════════════════════════════════════════════════════════════

/// Word tile on a cell: the first Subject or Attribute there, if any.
/// Unlike `ActorStore::actor_at`, which returns the first actor of any
/// kind, characters sharing the cell are skipped so they cannot hide a word.
fn word_at(store: &ActorStore, x: Option<usize>, y: Option<usize>) -> Option<Kind> {
    let (x, y) = (x?, y?);
    store.actors_at(x, y).find(|a| a.is_word()).map(|a| a.kind)
}

fn pair(a: Option<Kind>, b: Option<Kind>) -> Option<Rule> {
    match (a?, b?) {
        (Kind::Subject(n), Kind::Attribute(p)) | (Kind::Attribute(p), Kind::Subject(n)) => {
            Some(Rule::new(n, p))
        }
        _ => None,
    }
}

/// Rules emitted by a link at (x, y): horizontal axis first, then vertical.
/// Cells past the right/bottom edge simply hold no actors.
pub fn evaluate_link(store: &ActorStore, x: usize, y: usize) -> Vec<Rule> {
    let left = word_at(store, x.checked_sub(1), Some(y));
    let right = word_at(store, x.checked_add(1), Some(y));
    let up = word_at(store, Some(x), y.checked_sub(1));
    let down = word_at(store, Some(x), y.checked_add(1));

    [pair(left, right), pair(up, down)].into_iter().flatten().collect()
}

/// Candidate list for this tick: every rule from every link, duplicates kept.
pub fn derive_candidates(store: &ActorStore, links: &[ActorId]) -> Vec<Rule> {
    links
        .iter()
        .filter_map(|id| store.get(*id))
        .flat_map(|link| evaluate_link(store, link.x, link.y))
        .collect()
}

// ══════════════════════════════════════════════════════════════
// RuleSet
// ══════════════════════════════════════════════════════════════

/// De-duplicated, order-significant active rules.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        RuleSet::default()
    }

    /// Two-phase merge of this tick's candidates against `self`.
    pub fn merge(&self, candidates: &[Rule]) -> RuleSet {
        let mut rules: Vec<Rule> = self
            .rules
            .iter()
            .filter(|r| candidates.contains(r))
            .copied()
            .collect();
        for rule in candidates {
            if !rules.contains(rule) {
                rules.push(*rule);
            }
        }
        RuleSet { rules }
    }

    /// Rules in `self` that `prev` did not have, and rules `prev` had that are gone.
    pub fn diff(&self, prev: &RuleSet) -> (Vec<Rule>, Vec<Rule>) {
        let formed = self.rules.iter().filter(|r| !prev.contains(r)).copied().collect();
        let broken = prev.rules.iter().filter(|r| !self.contains(r)).copied().collect();
        (formed, broken)
    }

    pub fn contains(&self, rule: &Rule) -> bool {
        self.rules.contains(rule)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Canonical strings in order, for display.
    pub fn to_strings(&self) -> Vec<String> {
        self.rules.iter().map(Rule::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<Rule> for RuleSet {
    /// Builds a set from an already-ordered sequence, dropping repeats.
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        RuleSet::new().merge(&iter.into_iter().collect::<Vec<_>>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::Symbol;

    /// Helper: build a store from a string diagram, returning link ids.
    fn store_from(rows: &[&str]) -> (ActorStore, Vec<ActorId>) {
        let mut store = ActorStore::new();
        let mut links = vec![];
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let sym = Symbol::from_char(ch).expect("legend symbol");
                if let Some(kind) = Kind::from_symbol(sym) {
                    let id = store.add(x, y, kind);
                    if kind == Kind::Link {
                        links.push(id);
                    }
                }
            }
        }
        (store, links)
    }

    fn rule(s: &str) -> Rule {
        s.parse().unwrap()
    }

    #[test]
    fn canonical_string_round_trips() {
        let r = Rule::new(Noun::Wall, Property::Push);
        assert_eq!(r.to_string(), "Wall isPush");
        assert_eq!(rule("Wall isPush"), r);
        assert!("Wall".parse::<Rule>().is_err());
        assert!("Wall isPush extra".parse::<Rule>().is_err());
        assert!("isPush Wall".parse::<Rule>().is_err());
    }

    #[test]
    fn horizontal_subject_link_attribute() {
        let (s, links) = store_from(&["WIP"]);
        assert_eq!(derive_candidates(&s, &links), vec![rule("Wall isPush")]);
    }

    #[test]
    fn reversed_order_still_forms_rule() {
        let (s, links) = store_from(&["PIW"]);
        assert_eq!(derive_candidates(&s, &links), vec![rule("Wall isPush")]);
    }

    #[test]
    fn vertical_alignment_forms_rule() {
        let (s, links) = store_from(&[".F.", ".I.", ".V."]);
        assert_eq!(derive_candidates(&s, &links), vec![rule("Flag isVictory")]);
    }

    #[test]
    fn one_link_can_emit_two_rules() {
        let (s, links) = store_from(&[".M.", "WIP", ".Y."]);
        assert_eq!(
            derive_candidates(&s, &links),
            vec![rule("Wall isPush"), rule("Meepo isYou")]
        );
    }

    #[test]
    fn diagonal_or_gapped_words_emit_nothing() {
        let (s, links) = store_from(&["W..", ".I.", "..P"]);
        assert!(derive_candidates(&s, &links).is_empty());

        let (s, links) = store_from(&["W.I.P"]);
        assert!(derive_candidates(&s, &links).is_empty());
    }

    #[test]
    fn same_kind_pairs_emit_nothing() {
        let (s, links) = store_from(&["WIR", ".I.", "..."]);
        assert!(derive_candidates(&s, &links).is_empty());
        let (s, links) = store_from(&["YIP"]);
        assert!(derive_candidates(&s, &links).is_empty());
    }

    #[test]
    fn link_on_edge_reads_missing_neighbors_as_nothing() {
        let (s, links) = store_from(&["IP", "W."]);
        assert!(derive_candidates(&s, &links).is_empty());
    }

    #[test]
    fn character_on_word_cell_does_not_hide_word() {
        let (mut s, links) = store_from(&["..IP"]);
        s.add(1, 0, Kind::Character(Noun::Rock));
        s.add(1, 0, Kind::Subject(Noun::Wall));
        assert_eq!(derive_candidates(&s, &links), vec![rule("Wall isPush")]);
    }

    #[test]
    fn duplicates_are_kept_in_candidates() {
        let (s, links) = store_from(&["WIP", "...", "WIP"]);
        assert_eq!(derive_candidates(&s, &links).len(), 2);
    }

    #[test]
    fn merge_keeps_previous_rules_first() {
        let prev: RuleSet = [rule("Wall isStop")].into_iter().collect();
        let next = prev.merge(&[rule("Flag isVictory"), rule("Wall isStop")]);
        assert_eq!(next.to_strings(), vec!["Wall isStop", "Flag isVictory"]);
    }

    #[test]
    fn merge_drops_rules_no_longer_derived() {
        let prev: RuleSet = [rule("Wall isStop"), rule("Meepo isYou")].into_iter().collect();
        let next = prev.merge(&[rule("Meepo isYou")]);
        assert_eq!(next.to_strings(), vec!["Meepo isYou"]);
    }

    #[test]
    fn merge_deduplicates_new_rules_in_first_seen_order() {
        let next = RuleSet::new().merge(&[
            rule("Rock isPush"),
            rule("Meepo isYou"),
            rule("Rock isPush"),
        ]);
        assert_eq!(next.to_strings(), vec!["Rock isPush", "Meepo isYou"]);
    }

    #[test]
    fn merge_is_idempotent() {
        let cands = [rule("Bush isLose"), rule("Meepo isYou"), rule("Bush isLose")];
        let once = RuleSet::new().merge(&cands);
        let twice = once.merge(&cands);
        assert_eq!(once, twice);
    }

    #[test]
    fn diff_reports_formed_and_broken() {
        let prev: RuleSet = [rule("Wall isStop"), rule("Meepo isYou")].into_iter().collect();
        let next = prev.merge(&[rule("Meepo isYou"), rule("Wall isPush")]);
        let (formed, broken) = next.diff(&prev);
        assert_eq!(formed, vec![rule("Wall isPush")]);
        assert_eq!(broken, vec![rule("Wall isStop")]);
    }
}
