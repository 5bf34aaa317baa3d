//! Scope chains: one directory per applicable level for a test identity
//!
//! The directory layout produced here is the only persisted format:
//!
//! ```text
//! <global_base>/
//!   <module_name>/
//!     <class_name>/            (only if the test has a class)
//!       <function_name>/
//!     <function_name>/         (only if the test has no class)
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::identity::TestIdentity;
use super::level::ScopeLevel;

/// A resolved scope directory and the name it was derived from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    path: PathBuf,
    name: String,
}

impl Scope {
    /// Scope named `name` inside `base`
    pub fn new(base: &Path, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: base.join(&name),
            name,
        }
    }

    /// Directory of this scope
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Display name for diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Ordered mapping from scope level to scope directory
///
/// Iteration always runs from the smallest scope to the largest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeChain {
    scopes: BTreeMap<ScopeLevel, Scope>,
}

impl ScopeChain {
    /// Build the chain for `identity` under the global directory `global_dir`
    ///
    /// The global tier is dropped when `keep_global` is false; that is how
    /// extra chains avoid searching the shared global directory twice.
    pub fn from_identity(
        global_dir: &Path,
        identity: &TestIdentity,
        keep_global: bool,
        strip_package_prefix: bool,
    ) -> Self {
        let mut scopes = BTreeMap::new();

        let global_name = global_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let global = Scope {
            path: global_dir.to_path_buf(),
            name: global_name,
        };

        let module = Scope::new(global.path(), identity.module_dir_name(strip_package_prefix));

        let class = identity
            .class()
            .map(|class| Scope::new(module.path(), class));

        if let Some(function) = identity.function() {
            let parent = class.as_ref().unwrap_or(&module);
            scopes.insert(ScopeLevel::Function, Scope::new(parent.path(), function));
        }
        if let Some(class) = class {
            scopes.insert(ScopeLevel::Class, class);
        }
        scopes.insert(ScopeLevel::Module, module);
        if keep_global {
            scopes.insert(ScopeLevel::Global, global);
        }

        Self { scopes }
    }

    /// Scope at `level`, if present
    pub fn get(&self, level: ScopeLevel) -> Option<&Scope> {
        self.scopes.get(&level)
    }

    /// Whether the chain has an entry for `level`
    pub fn contains(&self, level: ScopeLevel) -> bool {
        self.scopes.contains_key(&level)
    }

    /// Scopes from smallest to largest
    pub fn iter(&self) -> impl Iterator<Item = (ScopeLevel, &Scope)> {
        self.scopes.iter().map(|(level, scope)| (*level, scope))
    }

    /// The smallest scope present
    pub fn most_specific(&self) -> Option<(ScopeLevel, &Scope)> {
        self.iter().next()
    }

    /// Number of levels in the chain
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Whether the chain has no levels
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}
