//! Mood palette.
//!
//! # Responsibility
//! - Define the closed set of selectable mood categories.
//! - Own the exact persisted label for each category.
//!
//! # Invariants
//! - Declaration order is the palette order used by selectors and reports.
//! - `label()` and `from_label()` are exact inverses; no fuzzy matching.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// One selectable mood category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Happy,
    Calm,
    Neutral,
    Sad,
    Anxious,
}

impl Mood {
    /// Full palette in declaration order.
    pub const ALL: [Mood; 5] = [
        Mood::Happy,
        Mood::Calm,
        Mood::Neutral,
        Mood::Sad,
        Mood::Anxious,
    ];

    /// Persisted label, including the decorative symbol.
    pub fn label(self) -> &'static str {
        match self {
            Self::Happy => "Happy 😊",
            Self::Calm => "Calm 🙂",
            Self::Neutral => "Neutral 😐",
            Self::Sad => "Sad 😟",
            Self::Anxious => "Anxious 😬",
        }
    }

    /// Display name without the symbol.
    pub fn name(self) -> &'static str {
        match self {
            Self::Happy => "Happy",
            Self::Calm => "Calm",
            Self::Neutral => "Neutral",
            Self::Sad => "Sad",
            Self::Anxious => "Anxious",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Happy => "😊",
            Self::Calm => "🙂",
            Self::Neutral => "😐",
            Self::Sad => "😟",
            Self::Anxious => "😬",
        }
    }

    /// Resolves an exact persisted label back to its palette value.
    pub fn from_label(label: &str) -> Option<Mood> {
        Self::ALL.into_iter().find(|mood| mood.label() == label)
    }

    /// Zero-based position in the palette.
    pub fn palette_index(self) -> usize {
        self as usize
    }
}

impl Display for Mood {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
