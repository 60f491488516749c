//! Text report rendering for test runs.

use crate::config::ReportConfig;

use super::failure::normalize;
use super::{TestOutput, TestResult};

const SUCCESS_INDENT: &str = "  ";
const SUCCESS_LEADER: &str = "Pass: ";
const FAILURE_INDENT: &str = "> ";
const FAILURE_LEADER: &str = "Fail: ";
// len(FAILURE_LEADER) + indent
const ERROR_INDENT: &str = "        ";

/// Formats test results into the run report.
#[derive(Debug, Clone)]
pub struct ResultFormatter {
    width: usize,
    fill: char,
}

impl ResultFormatter {
    /// Create a formatter with the given banner width and fill character.
    pub fn new(width: usize, fill: char) -> Self {
        Self { width, fill }
    }

    /// Create a formatter from report configuration.
    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(config.width, config.fill)
    }

    /// Render the full report.
    ///
    /// `quiet` only filters passing lines; the summary always counts every
    /// result.
    pub fn render(&self, output: &TestOutput, header: &str, identity: &str, quiet: bool) -> String {
        let total = output.results.len();
        let mut log = Vec::with_capacity(total + 6);

        log.push(self.banner(header));
        log.push(self.banner(identity));
        log.push(format!("Collected {total} tests\n"));

        log.extend(
            output
                .results
                .iter()
                .filter(|result| !result.success || !quiet)
                .map(render_result),
        );

        log.push(format!("\n{}/{} passed", output.passed, total));
        log.push(format!("{} failed tests", output.failed));
        log.push(self.banner(if output.failed == 0 { "PASS" } else { "FAIL" }));

        log.join("\n")
    }

    /// Center ` text ` within the configured width.
    ///
    /// Text wider than the banner is returned unpadded. When the padding is
    /// odd the extra fill character goes on the right.
    pub fn banner(&self, text: &str) -> String {
        let padded = format!(" {text} ");
        let len = padded.chars().count();
        if len >= self.width {
            return padded;
        }

        let pad = self.width - len;
        let left = pad / 2;
        let right = pad - left;

        let mut line = String::with_capacity(self.width + padded.len());
        line.extend(std::iter::repeat_n(self.fill, left));
        line.push_str(&padded);
        line.extend(std::iter::repeat_n(self.fill, right));
        line
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::from_config(&ReportConfig::default())
    }
}

/// Render one result as its report line(s).
pub fn render_result(result: &TestResult) -> String {
    if result.success {
        return format!("{SUCCESS_INDENT}{SUCCESS_LEADER}{}", result.name);
    }

    let error = normalize(result.error.as_ref());
    let mut lines = vec![format!("{FAILURE_LEADER}{}", result.name)];
    lines.extend(error.lines().map(|line| format!("{ERROR_INDENT}{line}")));

    lines
        .iter()
        .map(|line| format!("{FAILURE_INDENT}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl std::fmt::Display for TestResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&render_result(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::Failure;
    use pretty_assertions::assert_eq;

    fn output(results: Vec<TestResult>) -> TestOutput {
        TestOutput::from_results(results)
    }

    #[test]
    fn test_banner_is_centered_to_width() {
        let fmt = ResultFormatter::default();
        let line = fmt.banner("PASS");
        assert_eq!(line.chars().count(), 50);
        assert_eq!(line, format!("{} PASS {}", "=".repeat(22), "=".repeat(22)));
    }

    #[test]
    fn test_banner_odd_padding_goes_right() {
        let fmt = ResultFormatter::new(10, '-');
        assert_eq!(fmt.banner("abc"), "-- abc ---");
    }

    #[test]
    fn test_banner_wider_than_width_is_unpadded() {
        let fmt = ResultFormatter::new(4, '=');
        assert_eq!(fmt.banner("long header"), " long header ");
    }

    #[test]
    fn test_render_pass_line() {
        assert_eq!(
            render_result(&TestResult::passed("mod/TestA::test_x")),
            "  Pass: mod/TestA::test_x"
        );
    }

    #[test]
    fn test_render_fail_line_indents_every_error_line() {
        let result = TestResult::failed("mod::test_bad", Failure::list(["first", "second"]));
        assert_eq!(
            render_result(&result),
            "> Fail: mod::test_bad\n>         first\n>         second"
        );
    }

    #[test]
    fn test_render_full_report_verbose() {
        let fmt = ResultFormatter::new(20, '=');
        let out = output(vec![
            TestResult::passed("t::test_ok"),
            TestResult::failed("t::test_bad", Failure::message("boom")),
        ]);
        let report = fmt.render(&out, "Suite", "app:main", false);
        let expected = "\
====== Suite =======
===== app:main =====
Collected 2 tests

  Pass: t::test_ok
> Fail: t::test_bad
>         boom

1/2 passed
1 failed tests
======= FAIL =======";
        assert_eq!(report, expected);
    }

    #[test]
    fn test_render_quiet_skips_passing_lines() {
        let fmt = ResultFormatter::default();
        let out = output(vec![
            TestResult::passed("t::test_ok"),
            TestResult::failed("t::test_bad", Failure::message("boom")),
        ]);
        let report = fmt.render(&out, "Suite", "app:main", true);
        assert!(!report.contains("Pass:"));
        assert!(report.contains("> Fail: t::test_bad"));
        assert!(report.contains("\n1/2 passed\n1 failed tests\n"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let fmt = ResultFormatter::default();
        let out = output(vec![TestResult::failed("t::a", Failure::fields([("k", "v")]))]);
        assert_eq!(
            fmt.render(&out, "h", "id", false),
            fmt.render(&out, "h", "id", false)
        );
    }
}
