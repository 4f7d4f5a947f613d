///! Key combinations and the action dispatch table
///!
///! Bindings come from two config tables: `ranks` (key → rank value) and
///! `keys` (action → comma-separated key combinations). Both are folded into
///! a single lookup built once per session.
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::warn;

use crate::store::{Rank, RankScale};

/// Every key name a binding may use
const KEY_NAMES: &[&str] = &[
    "delete", "backspace", "backtick", "space", "return", "enter", "left", "up", "right", "down",
    "plus", "equal", "minus", "?", "bracketleft", "bracketright", "semicolon", "apostrophe",
    "backslash",
];

const SHIFT_PREFIX: &str = "shift+";

/// A key name with an optional shift modifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: String,
    pub shift: bool,
}

impl KeyCombo {
    /// Parse a single combination such as `"shift+right"`, `"q"` or `"+"`.
    ///
    /// Literal punctuation is mapped to its key name (`` ` `` → `backtick`,
    /// `=` → `equal`); upper-case letters imply shift.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let (shift, name) = match text.to_lowercase().strip_prefix(SHIFT_PREFIX) {
            Some(rest) => (true, rest.to_string()),
            None => (false, text.to_string()),
        };

        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_uppercase() {
                return Some(Self {
                    key: c.to_ascii_lowercase().to_string(),
                    shift: true,
                });
            }
        }

        let key = normalize_key(&name.to_lowercase())?;
        Some(Self { key, shift })
    }

    pub fn plain(key: &str) -> Self {
        Self {
            key: key.to_string(),
            shift: false,
        }
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shift {
            write!(f, "{}{}", SHIFT_PREFIX, self.key)
        } else {
            write!(f, "{}", self.key)
        }
    }
}

fn normalize_key(name: &str) -> Option<String> {
    let symbol = match name {
        "`" => Some("backtick"),
        "+" => Some("plus"),
        "=" => Some("equal"),
        "-" => Some("minus"),
        "[" => Some("bracketleft"),
        "]" => Some("bracketright"),
        ";" => Some("semicolon"),
        "'" => Some("apostrophe"),
        "\\" => Some("backslash"),
        " " => Some("space"),
        _ => None,
    };
    if let Some(symbol) = symbol {
        return Some(symbol.to_string());
    }

    let single_alnum = name.len() == 1
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if single_alnum || KEY_NAMES.contains(&name) {
        Some(name.to_string())
    } else {
        None
    }
}

/// Parse a comma-separated list of combinations; unknown names are skipped
/// with a warning
pub fn parse_key_string(spec: &str) -> Vec<KeyCombo> {
    spec.split(',')
        .filter(|part| !part.trim().is_empty())
        .filter_map(|part| {
            let combo = KeyCombo::parse(part);
            if combo.is_none() {
                warn!("Unknown key '{}' in binding '{}'", part.trim(), spec);
            }
            combo
        })
        .collect()
}

/// Operations a key can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ClearInput,
    Quit,
    ClearRank,
    Fit,
    Help,
    ToggleList,
    ToggleDark,
    Comment,
    ZoomIn,
    ZoomOut,
    Submit,
    Previous,
    First,
    Next,
    SkipUnranked,
    FetchSecondary,
    OpenBrowser,
}

impl Action {
    /// Declaration order; earlier actions win binding conflicts
    pub const ALL: [Action; 17] = [
        Action::ClearInput,
        Action::Quit,
        Action::ClearRank,
        Action::Fit,
        Action::Help,
        Action::ToggleList,
        Action::ToggleDark,
        Action::Comment,
        Action::ZoomIn,
        Action::ZoomOut,
        Action::Submit,
        Action::Previous,
        Action::First,
        Action::Next,
        Action::SkipUnranked,
        Action::FetchSecondary,
        Action::OpenBrowser,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == name.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ClearInput => "clear_input",
            Action::Quit => "quit",
            Action::ClearRank => "clear_rank",
            Action::Fit => "fit",
            Action::Help => "help",
            Action::ToggleList => "toggle_list",
            Action::ToggleDark => "toggle_dark",
            Action::Comment => "comment",
            Action::ZoomIn => "zoom_in",
            Action::ZoomOut => "zoom_out",
            Action::Submit => "submit",
            Action::Previous => "previous",
            Action::First => "first",
            Action::Next => "next",
            Action::SkipUnranked => "skip_unranked",
            Action::FetchSecondary => "fetch_secondary",
            Action::OpenBrowser => "open_browser",
        }
    }

    /// Built-in key string for this action
    pub fn default_keys(&self) -> &'static str {
        match self {
            Action::ClearInput => "delete,backspace",
            Action::Quit => "q",
            Action::ClearRank => "c",
            Action::Fit => "f",
            Action::Help => "?",
            Action::ToggleList => "l",
            Action::ToggleDark => "d",
            Action::Comment => "k",
            Action::ZoomIn => "plus,equal",
            Action::ZoomOut => "minus",
            Action::Submit => "return,enter",
            Action::Previous => "left,up",
            Action::First => "shift+left",
            Action::Next => "right,down",
            Action::SkipUnranked => "shift+right",
            Action::FetchSecondary => "w",
            Action::OpenBrowser => "b",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a key press resolves to
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Rank(Rank),
    Action(Action),
}

/// Lookup table from key combination to binding
#[derive(Debug, Clone)]
pub struct KeyBindings {
    table: HashMap<KeyCombo, Binding>,
    actions: Vec<(Action, Vec<KeyCombo>)>,
}

impl KeyBindings {
    /// Build the table from the rank scale and the `keys` overrides.
    ///
    /// Rank keys are registered first. A key already taken is reported and
    /// keeps its first binding.
    pub fn new(scale: &RankScale, overrides: &BTreeMap<String, String>) -> Self {
        for name in overrides.keys() {
            if Action::from_name(name).is_none() {
                warn!("Ignoring key binding for unknown action '{}'", name);
            }
        }

        let mut bindings = Self {
            table: HashMap::new(),
            actions: Vec::new(),
        };

        for (key, rank) in scale.keys() {
            match KeyCombo::parse(key) {
                Some(combo) => {
                    bindings.insert(combo, Binding::Rank(rank.clone()));
                }
                None => warn!("Unknown rank key '{}'", key),
            }
        }

        for action in Action::ALL {
            let spec = overrides
                .iter()
                .find(|(name, _)| Action::from_name(name) == Some(action))
                .map(|(_, spec)| spec.as_str())
                .unwrap_or(action.default_keys());

            let mut bound = Vec::new();
            for combo in parse_key_string(spec) {
                if bindings.insert(combo.clone(), Binding::Action(action)) {
                    bound.push(combo);
                }
            }
            bindings.actions.push((action, bound));
        }

        bindings
    }

    fn insert(&mut self, combo: KeyCombo, binding: Binding) -> bool {
        if let Some(existing) = self.table.get(&combo) {
            warn!(
                "Key '{}' already bound to {:?}, ignoring {:?}",
                combo, existing, binding
            );
            return false;
        }
        self.table.insert(combo, binding);
        true
    }

    pub fn lookup(&self, combo: &KeyCombo) -> Option<&Binding> {
        self.table.get(combo)
    }

    /// Keys bound to an action, in configuration order
    pub fn keys_for(&self, action: Action) -> &[KeyCombo] {
        self.actions
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, keys)| keys.as_slice())
            .unwrap_or(&[])
    }

    /// One `action: keys` line per action with at least one key
    pub fn help_lines(&self) -> Vec<String> {
        self.actions
            .iter()
            .filter(|(_, keys)| !keys.is_empty())
            .map(|(action, keys)| {
                let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
                format!("{:<16} {}", action.as_str(), keys.join(", "))
            })
            .collect()
    }
}
