//! Test identity: the position of a test within the suite

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::layout;

/// Module, optional class and optional function naming one test
///
/// A function without a class nests directly under the module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestIdentity {
    module: String,
    class: Option<String>,
    function: Option<String>,
}

impl TestIdentity {
    /// Identity for a whole module
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            class: None,
            function: None,
        }
    }

    /// Identity derived from a Rust `module_path!()` string
    ///
    /// `::` separators become `.`, so the leading crate segment is treated
    /// as the package prefix, e.g. `my_crate::tests::io` names module
    /// `my_crate.tests.io`.
    pub fn from_module_path(module_path: &str) -> Self {
        let dotted = module_path
            .split("::")
            .collect::<Vec<_>>()
            .join(&layout::MODULE_SEPARATOR.to_string());
        Self::new(dotted)
    }

    /// Set the class name
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Set the function name
    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    /// Full module name as given
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Class name, if any
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// Function name, if any
    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    /// Directory name for the module tier
    ///
    /// With `strip_package_prefix`, everything up to and including the first
    /// `.` is dropped from a dotted module name.
    pub fn module_dir_name(&self, strip_package_prefix: bool) -> &str {
        if strip_package_prefix {
            if let Some((_, rest)) = self.module.split_once(layout::MODULE_SEPARATOR) {
                return rest;
            }
        }
        &self.module
    }
}

impl fmt::Display for TestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.module)?;
        if let Some(class) = &self.class {
            write!(f, "::{}", class)?;
        }
        if let Some(function) = &self.function {
            write!(f, "::{}", function)?;
        }
        Ok(())
    }
}

/// Build a [`TestIdentity`] for the enclosing module
///
/// ```rust
/// use datadir_mgr::datadir_identity;
///
/// let module = datadir_identity!();
/// let function = datadir_identity!(function = "test_download");
/// let method = datadir_identity!(class = "Parser", function = "test_parse");
/// assert_eq!(function.function(), Some("test_download"));
/// assert_eq!(method.class(), Some("Parser"));
/// assert_eq!(module.module(), function.module());
/// ```
#[macro_export]
macro_rules! datadir_identity {
    () => {
        $crate::app::scope::TestIdentity::from_module_path(module_path!())
    };
    (function = $function:expr) => {
        $crate::app::scope::TestIdentity::from_module_path(module_path!()).with_function($function)
    };
    (class = $class:expr) => {
        $crate::app::scope::TestIdentity::from_module_path(module_path!()).with_class($class)
    };
    (class = $class:expr, function = $function:expr) => {
        $crate::app::scope::TestIdentity::from_module_path(module_path!())
            .with_class($class)
            .with_function($function)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_dir_name_strips_first_segment() {
        let identity = TestIdentity::new("tests.module_test");
        assert_eq!(identity.module_dir_name(true), "module_test");
        assert_eq!(identity.module_dir_name(false), "tests.module_test");
    }

    #[test]
    fn test_module_dir_name_keeps_later_dots() {
        let identity = TestIdentity::new("pkg.sub.module_test");
        assert_eq!(identity.module_dir_name(true), "sub.module_test");
    }

    #[test]
    fn test_undotted_module_is_unchanged() {
        let identity = TestIdentity::new("module_test");
        assert_eq!(identity.module_dir_name(true), "module_test");
    }

    #[test]
    fn test_from_module_path() {
        let identity = TestIdentity::from_module_path("my_crate::tests::io");
        assert_eq!(identity.module(), "my_crate.tests.io");
        assert_eq!(identity.module_dir_name(true), "tests.io");
    }

    #[test]
    fn test_macro_uses_enclosing_module() {
        let identity = crate::datadir_identity!(function = "test_macro");
        assert_eq!(identity.module(), "datadir_mgr.app.scope.identity.tests");
        assert_eq!(identity.module_dir_name(true), "app.scope.identity.tests");
        assert_eq!(identity.function(), Some("test_macro"));
        assert_eq!(identity.class(), None);
    }

    #[test]
    fn test_display() {
        let identity = TestIdentity::new("m").with_class("C").with_function("f");
        assert_eq!(identity.to_string(), "m::C::f");
        assert_eq!(TestIdentity::new("m").with_function("f").to_string(), "m::f");
    }
}
