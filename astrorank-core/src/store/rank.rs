///! Rank values and the configured rank scale
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{AstroError, Result};

/// A rank assigned to an identifier.
///
/// Ranks are integers by default; a configuration may instead use labels
/// (e.g. `"good"`, `"bad"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rank {
    Int(i64),
    Label(String),
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Int(v) => write!(f, "{}", v),
            Rank::Label(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Rank {
    fn from(v: i64) -> Self {
        Rank::Int(v)
    }
}

/// Built-in key → rank table
pub fn default_rank_keys() -> BTreeMap<String, Rank> {
    let mut ranks = BTreeMap::new();
    for v in 0..=3 {
        ranks.insert(v.to_string(), Rank::Int(v));
    }
    ranks.insert("backtick".to_string(), Rank::Int(0));
    ranks
}

/// The set of accepted ranks and the keys that produce them
#[derive(Debug, Clone)]
pub struct RankScale {
    keys: BTreeMap<String, Rank>,
    numeric: bool,
}

impl Default for RankScale {
    fn default() -> Self {
        Self::new(default_rank_keys())
    }
}

impl RankScale {
    /// Build a scale from a key → value table.
    ///
    /// An empty table falls back to the built-in `0..=3` scale. Labels that
    /// would break the tab-delimited files (tabs, newlines, empty) are dropped.
    pub fn new(keys: BTreeMap<String, Rank>) -> Self {
        let keys: BTreeMap<String, Rank> = keys
            .into_iter()
            .filter(|(key, rank)| match rank {
                Rank::Label(label) if label.is_empty() || label.contains(['\t', '\n', '\r']) => {
                    tracing::warn!("Ignoring unusable rank label {:?} for key '{}'", label, key);
                    false
                }
                _ => true,
            })
            .collect();

        if keys.is_empty() {
            return Self::default();
        }

        let numeric = keys.values().all(|r| matches!(r, Rank::Int(_)));
        Self { keys, numeric }
    }

    /// Whether every configured value is an integer
    pub fn is_numeric(&self) -> bool {
        self.numeric
    }

    /// Whether `rank` is one of the configured values
    pub fn contains(&self, rank: &Rank) -> bool {
        self.keys.values().any(|r| r == rank)
    }

    /// Rank bound to a configured key, if any
    pub fn rank_for_key(&self, key: &str) -> Option<&Rank> {
        self.keys.get(key)
    }

    /// Key → rank table
    pub fn keys(&self) -> &BTreeMap<String, Rank> {
        &self.keys
    }

    /// Smallest and largest integer ranks
    pub fn range(&self) -> Option<(i64, i64)> {
        let values = self.keys.values().filter_map(|r| match r {
            Rank::Int(v) => Some(*v),
            Rank::Label(_) => None,
        });
        let (mut lo, mut hi) = (i64::MAX, i64::MIN);
        for v in values {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        (lo <= hi).then_some((lo, hi))
    }

    /// Human readable list of accepted keys and values
    pub fn describe(&self) -> String {
        let keys: Vec<&str> = self.keys.keys().map(String::as_str).collect();
        match (self.numeric, self.range()) {
            (true, Some((lo, hi))) => format!("{} (ranks {}-{})", keys.join(", "), lo, hi),
            _ => keys.join(", "),
        }
    }

    /// Interpret a persisted rank field using the scale's value type.
    ///
    /// Numeric scales accept any integer so that files written under an
    /// older configuration still load; label scales prefer a configured value
    /// with the same text, then accept any non-empty text.
    pub fn parse_stored(&self, field: &str) -> Option<Rank> {
        let field = field.trim();
        if field.is_empty() {
            return None;
        }
        if !self.numeric {
            if let Some(rank) = self.keys.values().find(|r| r.to_string() == field) {
                return Some(rank.clone());
            }
        }
        match field.parse::<i64>() {
            Ok(v) => Some(Rank::Int(v)),
            Err(_) if !self.numeric => Some(Rank::Label(field.to_string())),
            Err(_) => None,
        }
    }

    /// Resolve user input to a rank.
    ///
    /// The input may be a configured key (`"backtick"`) or the rendered value
    /// of a configured rank (`"2"`). Anything else is `InvalidRank`.
    pub fn resolve(&self, input: &str) -> Result<Rank> {
        let input = input.trim();
        if let Some(rank) = self.keys.get(input) {
            return Ok(rank.clone());
        }
        if let Some(rank) = self.keys.values().find(|r| r.to_string() == input) {
            return Ok(rank.clone());
        }
        Err(self.invalid(input))
    }

    /// Check that `rank` is accepted by this scale
    pub fn validate(&self, rank: &Rank) -> Result<()> {
        if self.contains(rank) {
            Ok(())
        } else {
            Err(self.invalid(&rank.to_string()))
        }
    }

    fn invalid(&self, value: &str) -> AstroError {
        AstroError::InvalidRank {
            value: value.to_string(),
            accepted: self.describe(),
        }
    }
}
