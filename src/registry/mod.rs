//! Test registry and discovery.
//!
//! Tests are registered explicitly into a tree of [`Namespace`]s. Discovery walks
//! that tree in registration order and applies the same naming rules a reflective
//! scan would: private names are skipped, groups must carry the group prefix and
//! functions/methods the function prefix. Namespaces registered under a foreign
//! path (re-exports of another suite) are not descended into.
//!
//! # Example
//!
//! ```
//! use autotest::registry::{Namespace, TestGroup};
//! use autotest::{ensure, TestOutcome};
//!
//! #[derive(Default)]
//! struct Counter { hits: u32 }
//!
//! fn test_increments(c: &mut Counter) -> TestOutcome {
//!     c.hits += 1;
//!     ensure!(c.hits == 1, "state leaked between tests: {}", c.hits);
//!     Ok(())
//! }
//!
//! let suite = Namespace::new("app.tests")
//!     .function("test_free", || Ok(()))
//!     .group(
//!         TestGroup::<Counter>::with_default("TestCounter")
//!             .method("test_a", test_increments)
//!             .method("test_b", test_increments),
//!     );
//!
//! let units = autotest::registry::discover(&suite, &Default::default());
//! assert_eq!(units.len(), 3);
//! ```

mod group;

pub use group::{GroupEntry, TestGroup, UnitFn};

use std::sync::Arc;

use crate::config::DiscoveryConfig;
use crate::harness::TestOutcome;

/// Shared, thread-safe test function.
pub type TestFn = Arc<dyn Fn() -> TestOutcome + Send + Sync>;

/// A named free test function.
#[derive(Clone)]
pub struct TestFunction {
    name: String,
    func: TestFn,
}

impl TestFunction {
    /// Wrap a function under a name.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn() -> TestOutcome + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Registered name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for TestFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestFunction").field("name", &self.name).finish()
    }
}

/// One registered item of a namespace.
pub enum Entry {
    /// A child namespace (module).
    Namespace(Namespace),
    /// A test group (class analogue).
    Group(Box<dyn GroupEntry>),
    /// A free test function.
    Function(TestFunction),
}

impl Entry {
    /// Name the entry is registered under.
    ///
    /// For a namespace this is the last segment of its dotted path.
    pub fn name(&self) -> &str {
        match self {
            Entry::Namespace(ns) => ns.name(),
            Entry::Group(group) => group.name(),
            Entry::Function(func) => func.name(),
        }
    }
}

/// A module-like collection of tests identified by a dotted path.
pub struct Namespace {
    path: String,
    entries: Vec<Entry>,
}

impl Namespace {
    /// Create an empty namespace, e.g. `Namespace::new("app.tests.helpers")`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    /// Register a free test function.
    pub fn function<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn() -> TestOutcome + Send + Sync + 'static,
    {
        self.entries
            .push(Entry::Function(TestFunction::new(name, func)));
        self
    }

    /// Register a test group.
    pub fn group<G: GroupEntry + 'static>(mut self, group: G) -> Self {
        self.entries.push(Entry::Group(Box::new(group)));
        self
    }

    /// Register a child namespace.
    pub fn namespace(mut self, child: Namespace) -> Self {
        self.entries.push(Entry::Namespace(child));
        self
    }

    /// Dotted path of this namespace.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last segment of the dotted path.
    pub fn name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    /// Registered entries, in registration order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Whether `self` is a genuine sub-module of `parent`.
    fn is_within(&self, parent: &str) -> bool {
        self.path
            .strip_prefix(parent)
            .is_some_and(|rest| rest.starts_with('.'))
    }
}

/// A discovered test, ready to run exactly once.
pub struct RunnableUnit {
    name: String,
    call: UnitFn,
}

impl RunnableUnit {
    /// Create a unit from a qualified name and a callable.
    pub fn new(name: impl Into<String>, call: UnitFn) -> Self {
        Self {
            name: name.into(),
            call,
        }
    }

    /// Qualified test name used in the report.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the unit.
    pub fn run(self) -> TestOutcome {
        (self.call)()
    }

    pub(crate) fn into_parts(self) -> (String, UnitFn) {
        (self.name, self.call)
    }
}

impl std::fmt::Debug for RunnableUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnableUnit").field("name", &self.name).finish()
    }
}

/// Collect every runnable test below `root`, depth-first in registration order.
pub fn discover(root: &Namespace, rules: &DiscoveryConfig) -> Vec<RunnableUnit> {
    let mut found = Vec::new();
    collect(root, root.path(), rules, &mut found);
    found
}

fn collect(ns: &Namespace, root: &str, rules: &DiscoveryConfig, found: &mut Vec<RunnableUnit>) {
    for entry in &ns.entries {
        if rules.is_private(entry.name()) {
            continue;
        }

        match entry {
            // Delve into modules in the same path, don't stray into imports.
            Entry::Namespace(child) => {
                if child.is_within(&ns.path) {
                    collect(child, root, rules, found);
                } else {
                    tracing::trace!(path = child.path(), parent = ns.path(), "skipping foreign namespace");
                }
            }

            Entry::Group(group) if group.name().starts_with(&rules.group_prefix) => {
                for (index, method) in group.methods().into_iter().enumerate() {
                    if !rules.is_test_function(method) {
                        continue;
                    }
                    if let Some(call) = group.bind(index) {
                        let qualname = format!("{}::{}", group.name(), method);
                        found.push(RunnableUnit::new(format_test_name(&ns.path, root, &qualname), call));
                    }
                }
            }

            Entry::Group(_) => {}

            Entry::Function(func) if rules.is_test_function(func.name()) => {
                let f = Arc::clone(&func.func);
                found.push(RunnableUnit::new(
                    format_test_name(&ns.path, root, func.name()),
                    Box::new(move || f()),
                ));
            }

            Entry::Function(_) => {}
        }
    }
}

/// Descriptive name of a test that explains where it lives.
///
/// The namespace path is made relative to the root and written with `/`
/// separators: `app.tests.db.rows` + `TestRow::test_x` under root `app.tests`
/// becomes `db/rows::TestRow::test_x`.
pub fn format_test_name(path: &str, root: &str, qualname: &str) -> String {
    let module = path
        .strip_prefix(root)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(path);
    format!("{}::{}", module.replace('.', "/"), qualname)
}
