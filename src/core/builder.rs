use crate::config::{Config, ConfigLoader};
use crate::core::error::{Error, Result};
use crate::harness::{TestHarness, TestOutput};
use crate::registry::Namespace;
use std::path::PathBuf;

/// Builder for configuring a [`TestRunner`].
#[derive(Debug, Default)]
pub struct TestRunnerBuilder {
    config: Option<Config>,
    header: Option<String>,
    quiet: Option<bool>,
}

impl TestRunnerBuilder {
    /// Create a new builder with no configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration directly.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Load configuration from a standalone TOML file, with profile and
    /// environment overrides applied.
    pub fn from_config_file(mut self, path: impl Into<PathBuf>) -> Result<Self> {
        self.config = Some(ConfigLoader::new().config_file(path).load()?);
        Ok(self)
    }

    /// Load configuration from defaults and `AUTOTEST_*` environment variables.
    pub fn from_env(mut self) -> Result<Self> {
        self.config = Some(ConfigLoader::new().load()?);
        Ok(self)
    }

    /// Override the report header.
    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// Override whether passing tests are hidden.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = Some(quiet);
        self
    }

    // --- Build and Execute ---

    /// Build the test runner.
    pub fn build(self) -> Result<TestRunner> {
        let mut config = self.config.ok_or_else(|| Error::config("no configuration provided"))?;

        if let Some(header) = self.header {
            config.report.header = Some(header);
        }
        if let Some(quiet) = self.quiet {
            config.report.quiet = quiet;
        }
        config.validate()?;

        Ok(TestRunner { config })
    }

    /// Build and immediately run `root`, returning the report.
    pub fn run(self, root: &Namespace) -> Result<String> {
        Ok(self.build()?.run(root))
    }
}

/// Runs a registered suite and produces its text report.
#[derive(Debug, Clone, Default)]
pub struct TestRunner {
    config: Config,
}

impl TestRunner {
    /// Effective configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn harness(&self) -> TestHarness {
        TestHarness::new(&self.config.discovery, &self.config.report)
    }

    /// Discover and run every test below `root` without rendering.
    pub fn execute(&self, root: &Namespace) -> TestOutput {
        self.harness().evaluate(root)
    }

    /// Render the report of a finished run.
    ///
    /// `quiet` and `header` fall back to the configured values.
    pub fn render(&self, output: &TestOutput, quiet: Option<bool>, header: Option<&str>) -> String {
        let report = &self.config.report;
        self.harness().report(
            output,
            header.unwrap_or_else(|| report.header_or_default()),
            &self.config.app.identity(),
            quiet.unwrap_or(report.quiet),
        )
    }

    /// Run `root` with the configured header and quiet flag.
    pub fn run(&self, root: &Namespace) -> String {
        self.run_with(root, None, None)
    }

    /// Run `root`, overriding the configured header and quiet flag.
    ///
    /// The report is logged at info level under the `autotest::report`
    /// target and returned.
    pub fn run_with(&self, root: &Namespace, quiet: Option<bool>, header: Option<&str>) -> String {
        let output = self.execute(root);
        let report = self.render(&output, quiet, header);
        tracing::info!(
            target: "autotest::report",
            passed = output.passed,
            failed = output.failed,
            "\n{report}"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::Failure;

    fn suite() -> Namespace {
        Namespace::new("tests")
            .function("test_ok", || Ok(()))
            .function("test_bad", || Err(Failure::message("boom")))
    }

    #[test]
    fn test_builder_error_missing_config() {
        let result = TestRunnerBuilder::new().header("x").build();
        let err = result.err().expect("should fail");
        assert!(err.to_string().contains("no configuration"));
    }

    #[test]
    fn test_builder_overrides_apply() {
        let runner = TestRunnerBuilder::new()
            .with_config(Config::default())
            .header("Orders")
            .quiet(false)
            .build()
            .unwrap();
        assert_eq!(runner.config().report.header.as_deref(), Some("Orders"));
        assert!(!runner.config().report.quiet);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let mut config = Config::default();
        config.report.width = 0;
        let result = TestRunnerBuilder::new().with_config(config).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autotest.toml");
        std::fs::write(&path, "[report]\nheader = \"From file\"\n").unwrap();

        crate::config::env::tests::without_env_vars(&["AUTOTEST_PROFILE", "AUTOTEST_HEADER"], || {
            let runner = TestRunnerBuilder::new().from_config_file(&path).unwrap().build().unwrap();
            assert!(runner.run(&suite()).starts_with("=================== From file ==================="));
        });
    }

    #[test]
    fn test_run_uses_configured_quiet() {
        let runner = TestRunnerBuilder::new().with_config(Config::default()).build().unwrap();
        let report = runner.run(&suite());
        assert!(!report.contains("Pass: tests::test_ok"));
        assert!(report.contains("> Fail: tests::test_bad"));
        assert!(report.contains("1/2 passed"));
    }

    #[test]
    fn test_run_with_overrides() {
        let runner = TestRunnerBuilder::new().with_config(Config::default()).build().unwrap();
        let report = runner.run_with(&suite(), Some(false), Some("Custom"));
        assert!(report.contains("  Pass: tests::test_ok"));
        assert!(report.starts_with("===================== Custom ====================="));
        assert!(report.contains("\n================== local:master ==================\n"));
    }
}
