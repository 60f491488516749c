//! autotest: a small, self-hosted test runner with datastore fixtures.
//!
//! Tests are plain functions returning [`TestOutcome`]. They are registered
//! into a tree of [`Namespace`]s, discovered by naming convention, run one
//! after another and summarized in a fixed-format text report.
//!
//! # Quick Start
//!
//! ```
//! use autotest::{ensure, Failure, Namespace, TestOutcome};
//!
//! fn test_addition() -> TestOutcome {
//!     ensure!(1 + 1 == 2, "arithmetic is broken");
//!     Ok(())
//! }
//!
//! let suite = Namespace::new("app.tests")
//!     .function("test_addition", test_addition)
//!     .function("test_message", || Err(Failure::message("boom")));
//!
//! let report = autotest::run(&suite, false, Some("Demo"));
//! assert!(report.contains("  Pass: app/tests::test_addition"));
//! assert!(report.contains("> Fail: app/tests::test_message"));
//! assert!(report.contains("1/2 passed"));
//! ```
//!
//! # Naming rules
//!
//! - Functions and group methods are collected when their name starts with
//!   `test_`.
//! - Groups ([`TestGroup`]) are collected when their name starts with `Test`.
//!   Each collected method runs against freshly built group state.
//! - Anything whose name starts with `_` is skipped.
//! - A child namespace is only descended into when its path lies below the
//!   parent's path.
//!
//! All prefixes are configurable through [`config::DiscoveryConfig`].
//!
//! # Configuration
//!
//! ```toml
//! [report]
//! header = "Billing tests"
//! quiet = false
//!
//! [app]
//! id = "APP1"
//! branch = "published"
//! environment-tags = ["debug"]
//!
//! [web]
//! endpoint = "/test"
//! static-app-id = "APP1"
//!
//! [profiles.ci.report]
//! quiet = true
//! ```
//!
//! Load it with [`builder()`]`.from_config_file(..)`; `AUTOTEST_*` environment
//! variables override file values (see [`config::env`]).
//!
//! # Fixtures
//!
//! [`fixtures`] provides scoped helpers over a [`fixtures::Datastore`]:
//! temporary rows and temporary transactions that are undone on every exit
//! path, table shape checks, and [`fixtures::raises`] for expected errors.

pub mod config;
pub mod core;
pub mod fixtures;
pub mod harness;
pub mod registry;
pub mod selftest;

#[cfg(feature = "web")]
pub mod web;

// Re-export commonly used types
pub use crate::core::{Error, Result, TestRunner, TestRunnerBuilder};
pub use config::Config;
pub use harness::{Failure, TestOutcome, TestOutput, TestResult};
pub use registry::{Namespace, TestGroup};

#[cfg(feature = "web")]
pub use web::TestPage;

/// Create a new test runner builder.
///
/// # Example
///
/// ```no_run
/// # fn main() -> autotest::Result<()> {
/// let report = autotest::builder()
///     .from_config_file("autotest.toml")?
///     .quiet(false)
///     .run(&autotest::selftest::suite())?;
/// println!("{report}");
/// # Ok(())
/// # }
/// ```
pub fn builder() -> TestRunnerBuilder {
    TestRunnerBuilder::new()
}

/// Run every test below `root` and return the report.
///
/// Uses default settings with `AUTOTEST_*` environment overrides applied;
/// `quiet` and `header` take precedence over both. The report is also logged
/// under the `autotest::report` target.
pub fn run(root: &Namespace, quiet: bool, header: Option<&str>) -> String {
    let runner = TestRunnerBuilder::new()
        .with_config(Config::from_env())
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid environment configuration, using defaults");
            TestRunner::default()
        });
    runner.run_with(root, Some(quiet), header)
}
