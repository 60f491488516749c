//! Test execution and reporting.
//!
//! The harness sits after discovery: `Namespace → discover → RunnableUnit → TestHarness`.
//! Each unit runs in turn; returned failures and panics are both recovered at the
//! unit boundary, so one failing test never stops the run.

pub mod failure;
mod formatter;
mod result;

pub use failure::{Failure, NO_INFO, TestOutcome, normalize};
pub use formatter::{ResultFormatter, render_result};
pub use result::TestResult;

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use crate::config::{DiscoveryConfig, ReportConfig};
use crate::registry::{Namespace, RunnableUnit, discover};

/// Aggregated results of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct TestOutput {
    /// Per-unit results, in discovery order.
    pub results: Vec<TestResult>,
    /// Number of passed tests.
    pub passed: usize,
    /// Number of failed tests.
    pub failed: usize,
}

impl TestOutput {
    /// Summarize a list of results.
    pub fn from_results(results: Vec<TestResult>) -> Self {
        let passed: usize = results.iter().sum();
        let failed = results.len() - passed;
        Self {
            results,
            passed,
            failed,
        }
    }

    /// Whether every test passed.
    pub fn overall_success(&self) -> bool {
        self.failed == 0
    }
}

/// Runs discovered tests and renders their report.
#[derive(Debug, Clone)]
pub struct TestHarness {
    rules: DiscoveryConfig,
    formatter: ResultFormatter,
}

impl TestHarness {
    /// Create a harness from discovery and report configuration.
    pub fn new(rules: &DiscoveryConfig, report: &ReportConfig) -> Self {
        Self {
            rules: rules.clone(),
            formatter: ResultFormatter::from_config(report),
        }
    }

    /// Discover and run every test below `root`.
    pub fn evaluate(&self, root: &Namespace) -> TestOutput {
        let units = discover(root, &self.rules);
        tracing::debug!(root = root.path(), count = units.len(), "collected tests");
        TestOutput::from_results(run_all(units))
    }

    /// Render the report for a finished run.
    pub fn report(&self, output: &TestOutput, header: &str, identity: &str, quiet: bool) -> String {
        self.formatter.render(output, header, identity, quiet)
    }
}

/// Run every unit in order, one result per unit.
pub fn run_all(units: Vec<RunnableUnit>) -> Vec<TestResult> {
    units.into_iter().map(run_unit).collect()
}

thread_local! {
    static IN_UNIT: Cell<bool> = const { Cell::new(false) };
}

/// Keep panics of running units off stderr; the report already carries them.
///
/// Panics on threads that are not running a unit go to the previous hook.
fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if IN_UNIT.with(Cell::get) {
                tracing::debug!(panic = %info, "test panicked");
            } else {
                previous(info);
            }
        }));
    });
}

/// Run a single unit, converting any failure or panic into a failed result.
pub fn run_unit(unit: RunnableUnit) -> TestResult {
    let (name, call) = unit.into_parts();

    install_panic_hook();
    let was_in_unit = IN_UNIT.replace(true);
    let caught = panic::catch_unwind(AssertUnwindSafe(call));
    IN_UNIT.set(was_in_unit);

    let outcome = match caught {
        Ok(outcome) => outcome,
        Err(payload) => Err(Failure::from_panic(payload)),
    };

    match outcome {
        Ok(()) => {
            tracing::debug!(test = %name, "pass");
            TestResult::passed(name)
        }
        Err(failure) => {
            tracing::debug!(test = %name, unexpected = failure.is_unexpected(), "fail");
            TestResult::failed(name, failure)
        }
    }
}
