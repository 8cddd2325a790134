//! Hierarchical gameplay tags.
//!
//! Tags are dotted labels such as `Ability.Movement.Sprint`. A tag matches a
//! query tag when it is equal to it or nested below it, so querying
//! `Ability.Movement` finds both sprint and crouch abilities.

use std::collections::BTreeSet;
use std::fmt;

use smol_str::SmolStr;

/// A single hierarchical label used to gate, trigger or cancel abilities and
/// to classify effects.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct GameplayTag(SmolStr);

impl GameplayTag {
    pub const SEPARATOR: char = '.';

    pub fn new(name: impl AsRef<str>) -> Self {
        Self(SmolStr::new(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if `self` is `other` or a descendant of `other`.
    pub fn matches(&self, other: &GameplayTag) -> bool {
        let this = self.as_str();
        let query = other.as_str();
        match this.strip_prefix(query) {
            Some("") => true,
            Some(rest) => rest.starts_with(Self::SEPARATOR),
            None => false,
        }
    }

    /// Returns the direct parent tag, if any.
    pub fn parent(&self) -> Option<GameplayTag> {
        self.as_str()
            .rsplit_once(Self::SEPARATOR)
            .map(|(parent, _)| GameplayTag::new(parent))
    }
}

impl fmt::Display for GameplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GameplayTag {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Ordered set of gameplay tags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TagSet(BTreeSet<GameplayTag>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(tag: impl Into<GameplayTag>) -> Self {
        let mut set = Self::new();
        set.insert(tag.into());
        set
    }

    pub fn insert(&mut self, tag: GameplayTag) -> bool {
        self.0.insert(tag)
    }

    pub fn remove(&mut self, tag: &GameplayTag) -> bool {
        self.0.remove(tag)
    }

    pub fn extend(&mut self, other: &TagSet) {
        self.0.extend(other.0.iter().cloned());
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameplayTag> {
        self.0.iter()
    }

    pub fn contains_exact(&self, tag: &GameplayTag) -> bool {
        self.0.contains(tag)
    }

    /// True if any tag in this set matches `query` hierarchically.
    pub fn has_tag(&self, query: &GameplayTag) -> bool {
        self.0.iter().any(|tag| tag.matches(query))
    }

    /// True if any tag of `query` is matched by this set. Empty queries never
    /// match.
    pub fn has_any(&self, query: &TagSet) -> bool {
        query.iter().any(|q| self.has_tag(q))
    }

    /// True if every tag of `query` is matched by this set. Empty queries
    /// always match.
    pub fn has_all(&self, query: &TagSet) -> bool {
        query.iter().all(|q| self.has_tag(q))
    }
}

impl FromIterator<GameplayTag> for TagSet {
    fn from_iter<I: IntoIterator<Item = GameplayTag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for TagSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(GameplayTag::new).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_tag_matches_parent_query() {
        let sprint = GameplayTag::new("Ability.Movement.Sprint");
        assert!(sprint.matches(&GameplayTag::new("Ability.Movement")));
        assert!(sprint.matches(&GameplayTag::new("Ability.Movement.Sprint")));
        assert!(!GameplayTag::new("Ability.Movement").matches(&sprint));
    }

    #[test]
    fn prefix_without_separator_does_not_match() {
        let tag = GameplayTag::new("Ability.Sprinting");
        assert!(!tag.matches(&GameplayTag::new("Ability.Sprint")));
    }

    #[test]
    fn parent_walks_one_level() {
        let tag = GameplayTag::new("State.InAir.Jumping");
        assert_eq!(tag.parent(), Some(GameplayTag::new("State.InAir")));
        assert_eq!(GameplayTag::new("State").parent(), None);
    }

    #[test]
    fn set_queries_are_hierarchical() {
        let owned: TagSet = ["Ability.Movement.Crouch", "State.Crouching"]
            .into_iter()
            .collect();

        assert!(owned.has_any(&TagSet::single("Ability.Movement")));
        assert!(!owned.has_any(&TagSet::single("Ability.Attack")));
        assert!(!owned.has_any(&TagSet::new()));
        assert!(owned.has_all(&TagSet::new()));
        assert!(owned.has_all(&["State", "Ability"].into_iter().collect()));
    }
}
