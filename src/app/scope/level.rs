//! Scope levels ordered from most to least specific

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ScopeError;

/// One of the four tiers a data file can be cached at
///
/// The derived ordering runs from the most specific tier to the least
/// specific one, which is also the order lookups search in.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ScopeLevel {
    Function,
    Class,
    #[default]
    Module,
    Global,
}

impl ScopeLevel {
    /// All levels, smallest scope first
    pub const ALL: [ScopeLevel; 4] = [
        ScopeLevel::Function,
        ScopeLevel::Class,
        ScopeLevel::Module,
        ScopeLevel::Global,
    ];

    /// Lowercase name used in configuration and diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeLevel::Function => "function",
            ScopeLevel::Class => "class",
            ScopeLevel::Module => "module",
            ScopeLevel::Global => "global",
        }
    }
}

impl fmt::Display for ScopeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeLevel {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "function" => Ok(ScopeLevel::Function),
            "class" => Ok(ScopeLevel::Class),
            "module" => Ok(ScopeLevel::Module),
            "global" => Ok(ScopeLevel::Global),
            other => Err(ScopeError::UnknownLevel {
                name: other.to_string(),
            }),
        }
    }
}
