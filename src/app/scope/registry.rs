//! Registry of searchable scope chains for one test invocation

use std::path::{Path, PathBuf};

use crate::constants::layout;
use crate::errors::{LookupError, LookupResult};

use super::chain::ScopeChain;
use super::level::ScopeLevel;

/// Where a lookup found its file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeMatch {
    /// Absolute path of the matching file
    pub path: PathBuf,
    /// Label of the chain that matched
    pub chain: String,
    /// Level within that chain
    pub level: ScopeLevel,
    /// Display name of the matching scope
    pub name: String,
}

/// Insertion-ordered collection of labelled scope chains
///
/// The requesting test's own chain is always registered first under
/// [`layout::REQUEST_CHAIN`]. Lookups search the most recently registered
/// chain first.
#[derive(Debug, Clone)]
pub struct ScopeRegistry {
    chains: Vec<(String, ScopeChain)>,
}

impl ScopeRegistry {
    /// Registry holding only the requesting test's chain
    pub fn new(request: ScopeChain) -> Self {
        Self {
            chains: vec![(layout::REQUEST_CHAIN.to_string(), request)],
        }
    }

    /// Register `chain` under `label`
    ///
    /// An existing chain with the same label is replaced and moves to the
    /// end of the search order.
    pub fn register(&mut self, label: impl Into<String>, chain: ScopeChain) {
        let label = label.into();
        self.chains.retain(|(existing, _)| *existing != label);
        self.chains.push((label, chain));
    }

    /// Whether a chain is registered under `label`
    pub fn contains(&self, label: &str) -> bool {
        self.chains.iter().any(|(existing, _)| existing == label)
    }

    /// Chain registered under `label`
    pub fn get(&self, label: &str) -> Option<&ScopeChain> {
        self.chains
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, chain)| chain)
    }

    /// Labels in search order (most recently registered first)
    pub fn search_order(&self) -> Vec<String> {
        self.chains
            .iter()
            .rev()
            .map(|(label, _)| label.clone())
            .collect()
    }

    /// Chains in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScopeChain)> {
        self.chains
            .iter()
            .map(|(label, chain)| (label.as_str(), chain))
    }

    /// Find the first existing `relative_path` across all chains
    ///
    /// Chains are searched newest first and, within a chain, from the
    /// smallest scope to the largest.
    pub fn lookup(&self, relative_path: &Path) -> LookupResult<ScopeMatch> {
        for (label, chain) in self.chains.iter().rev() {
            for (level, scope) in chain.iter() {
                let candidate = scope.path().join(relative_path);
                if candidate.exists() {
                    return Ok(ScopeMatch {
                        path: candidate,
                        chain: label.clone(),
                        level,
                        name: scope.name().to_string(),
                    });
                }
            }
        }

        Err(LookupError::NotFound {
            path: relative_path.to_path_buf(),
            searched: self.search_order(),
        })
    }
}
