use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Keyword marking a character model (a leader, hero, or similar).
pub const CHARACTER: &str = "CHARACTER";

/// Keyword granting innate stealth to a unit.
pub const STEALTH: &str = "STEALTH";

/// A set of upper-cased keywords. Lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordSet(BTreeSet<String>);

impl KeywordSet {
    /// Create an empty keyword set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a keyword for storage and comparison.
    pub fn normalize(keyword: &str) -> String {
        keyword.trim().to_uppercase()
    }

    /// Add a keyword. Blank keywords are ignored.
    pub fn insert(&mut self, keyword: &str) {
        let k = Self::normalize(keyword);
        if !k.is_empty() {
            self.0.insert(k);
        }
    }

    /// Builder form of [`KeywordSet::insert`].
    pub fn with(mut self, keyword: &str) -> Self {
        self.insert(keyword);
        self
    }

    /// Returns true if the set holds the keyword, ignoring case.
    pub fn contains(&self, keyword: &str) -> bool {
        self.0.contains(&Self::normalize(keyword))
    }

    /// Returns true if the set holds the CHARACTER keyword.
    pub fn is_character(&self) -> bool {
        self.contains(CHARACTER)
    }

    /// Number of keywords in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the keywords in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for KeywordSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for k in iter {
            set.insert(k.as_ref());
        }
        set
    }
}

impl fmt::Display for KeywordSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list: Vec<&str> = self.iter().collect();
        write!(f, "{}", list.join(", "))
    }
}
