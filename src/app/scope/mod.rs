//! Scope model: levels, test identities, scope chains and the registry
//!
//! A test's identity (module, optional class, optional function) resolves to
//! a [`ScopeChain`], one directory per applicable [`ScopeLevel`], nested
//! inside the global data directory. The [`ScopeRegistry`] holds the
//! requesting test's own chain plus any extra chains registered during the
//! test, and answers lookups of relative file paths.
//!
//! - [`level`] - the four ordered scope tiers
//! - [`identity`] - the test identity value type
//! - [`chain`] - identity-to-directory resolution
//! - [`registry`] - ordered chain collection and lookup

pub mod chain;
pub mod identity;
pub mod level;
pub mod registry;

pub use chain::{Scope, ScopeChain};
pub use identity::TestIdentity;
pub use level::ScopeLevel;
pub use registry::{ScopeMatch, ScopeRegistry};
