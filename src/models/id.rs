use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid expense id {value:?}: ids are positive integers")]
pub struct IdError {
    value: String,
}

/// Store-assigned identifier of an expense.
///
/// `ExpenseId::UNSAVED` (zero) marks a record that has not been persisted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(u64);

impl ExpenseId {
    pub const UNSAVED: ExpenseId = ExpenseId(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_unsaved(self) -> bool {
        self.0 == 0
    }

    /// The following id, or `None` once the id space is used up.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for ExpenseId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for ExpenseId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u64>() {
            Ok(value) if value > 0 => Ok(Self(value)),
            _ => Err(IdError {
                value: s.to_string(),
            }),
        }
    }
}
