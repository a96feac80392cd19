use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown category {value:?}. Use: staff, travel, food, utility")]
pub struct CategoryParseError {
    value: String,
}

/// Closed set of expense categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Staff,
    Travel,
    Food,
    Utility,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 4] = [
        ExpenseCategory::Staff,
        ExpenseCategory::Travel,
        ExpenseCategory::Food,
        ExpenseCategory::Utility,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            ExpenseCategory::Staff => "Staff",
            ExpenseCategory::Travel => "Travel",
            ExpenseCategory::Food => "Food",
            ExpenseCategory::Utility => "Utility",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            ExpenseCategory::Staff => "👥",
            ExpenseCategory::Travel => "✈️",
            ExpenseCategory::Food => "🍽️",
            ExpenseCategory::Utility => "⚡",
        }
    }

    /// Icon followed by the display name, e.g. "🍽️ Food".
    pub fn label(self) -> String {
        format!("{} {}", self.icon(), self.display_name())
    }

    /// Exact display-name lookup.
    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.display_name() == name)
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ExpenseCategory {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(category) = Self::from_display_name(trimmed) {
            return Ok(category);
        }
        Self::ALL
            .into_iter()
            .find(|c| c.display_name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| CategoryParseError {
                value: s.to_string(),
            })
    }
}
