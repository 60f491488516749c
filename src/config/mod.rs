//! Configuration types and loading from `autotest.toml`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::{Error, Result};

pub mod env;
mod loader;
pub use loader::ConfigLoader;

/// Complete configuration for a test run.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Report rendering configuration.
    #[serde(default)]
    pub report: ReportConfig,

    /// Discovery naming rules.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Identity of the application under test.
    #[serde(default)]
    pub app: AppConfig,

    /// Debug web page configuration.
    #[serde(default)]
    pub web: WebConfig,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a standalone TOML file.
    ///
    /// No profile or environment overrides are applied; use
    /// [`ConfigLoader`] for the layered load.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Defaults with `AUTOTEST_*` environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        env::apply_env_overrides(&mut config);
        config
    }

    /// Reject values that would make the report unreadable.
    pub fn validate(&self) -> Result<()> {
        if self.report.width == 0 {
            return Err(Error::invalid_config("report.width", "0"));
        }
        if self.report.fill.is_control() {
            return Err(Error::invalid_config(
                "report.fill",
                self.report.fill.escape_default().to_string(),
            ));
        }
        if !self.web.endpoint.starts_with('/') {
            return Err(Error::invalid_config("web.endpoint", &self.web.endpoint));
        }
        Ok(())
    }
}

/// Report rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// Text of the first banner line.
    pub header: Option<String>,

    /// Only show failing tests.
    pub quiet: bool,

    /// Total banner width.
    pub width: usize,

    /// Banner fill character.
    pub fill: char,
}

impl ReportConfig {
    /// Header text, falling back to the default banner title.
    pub fn header_or_default(&self) -> &str {
        self.header.as_deref().unwrap_or(DEFAULT_HEADER)
    }
}

/// Banner title used when no header is configured.
pub const DEFAULT_HEADER: &str = "Autotest";

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            header: None,
            quiet: true,
            width: 50,
            fill: '=',
        }
    }
}

/// Naming rules applied during discovery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Prefix of test functions and methods.
    #[serde(rename = "function-prefix")]
    pub function_prefix: String,

    /// Prefix of test groups.
    #[serde(rename = "group-prefix")]
    pub group_prefix: String,

    /// Prefix of names that are never collected.
    #[serde(rename = "private-prefix")]
    pub private_prefix: String,
}

impl DiscoveryConfig {
    /// Whether a name is hidden from discovery.
    pub fn is_private(&self, name: &str) -> bool {
        !self.private_prefix.is_empty() && name.starts_with(&self.private_prefix)
    }

    /// Whether a function or method name marks a test.
    pub fn is_test_function(&self, name: &str) -> bool {
        name.starts_with(&self.function_prefix) && !self.is_private(name)
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            function_prefix: "test_".to_string(),
            group_prefix: "Test".to_string(),
            private_prefix: "_".to_string(),
        }
    }
}

/// Identity of the running application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Application id.
    pub id: String,

    /// Branch or deployment under test.
    pub branch: String,

    /// Tags of the hosting environment, e.g. `debug`.
    #[serde(rename = "environment-tags")]
    pub environment_tags: Vec<String>,
}

impl AppConfig {
    /// `id:branch`, shown in the second report banner.
    pub fn identity(&self) -> String {
        format!("{}:{}", self.id, self.branch)
    }

    /// Whether the environment carries a tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.environment_tags.iter().any(|t| t == tag)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            id: "local".to_string(),
            branch: "master".to_string(),
            environment_tags: Vec::new(),
        }
    }
}

/// Debug web page configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WebConfig {
    /// Route serving the report.
    pub endpoint: String,

    /// Address the server binds to.
    pub bind: String,

    /// App id the page is published for; the page stays off when the running
    /// app id differs (the suite is then running as someone's dependency).
    #[serde(rename = "static-app-id")]
    pub static_app_id: Option<String>,

    /// Public origin used when logging where the page lives.
    pub origin: Option<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            endpoint: "/test".to_string(),
            bind: "127.0.0.1:3030".to_string(),
            static_app_id: None,
            origin: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = Config::default();
        assert!(config.report.header.is_none());
        assert!(config.report.quiet);
        assert_eq!(config.report.width, 50);
        assert_eq!(config.report.fill, '=');
        assert_eq!(config.discovery.function_prefix, "test_");
        assert_eq!(config.discovery.group_prefix, "Test");
        assert_eq!(config.discovery.private_prefix, "_");
        assert_eq!(config.app.identity(), "local:master");
        assert!(config.app.environment_tags.is_empty());
        assert_eq!(config.web.endpoint, "/test");
        assert!(config.web.static_app_id.is_none());
        assert!(!config.verbose);
    }

    #[test]
    fn test_config_deserialize_minimal() {
        let config = Config::from_toml_str(
            r#"
        [report]
        quiet = false
        "#,
        )
        .unwrap();
        assert!(!config.report.quiet);
        assert_eq!(config.report.width, 50);
        assert_eq!(config.discovery, DiscoveryConfig::default());
    }

    #[test]
    fn test_config_deserialize_full() {
        let toml_str = r#"
        verbose = true

        [report]
        header = "Billing tests"
        quiet = false
        width = 60
        fill = "-"

        [discovery]
        function-prefix = "check_"
        group-prefix = "Suite"
        private-prefix = "__"

        [app]
        id = "CCW3SYLSAQHLCF2A"
        branch = "published"
        environment-tags = ["debug", "staging"]

        [web]
        endpoint = "/selftest"
        bind = "0.0.0.0:8080"
        static-app-id = "CCW3SYLSAQHLCF2A"
        origin = "https://example.test"
        "#;
        let config = Config::from_toml_str(toml_str).unwrap();
        assert!(config.verbose);
        assert_eq!(config.report.header_or_default(), "Billing tests");
        assert_eq!(config.report.width, 60);
        assert_eq!(config.report.fill, '-');
        assert_eq!(config.discovery.function_prefix, "check_");
        assert_eq!(config.app.identity(), "CCW3SYLSAQHLCF2A:published");
        assert!(config.app.has_tag("debug"));
        assert_eq!(config.web.endpoint, "/selftest");
        assert_eq!(config.web.static_app_id.as_deref(), Some("CCW3SYLSAQHLCF2A"));
    }

    #[test]
    fn test_config_rejects_zero_width() {
        let result = Config::from_toml_str("[report]\nwidth = 0\n");
        assert!(result.unwrap_err().to_string().contains("report.width"));
    }

    #[test]
    fn test_config_rejects_relative_endpoint() {
        let result = Config::from_toml_str("[web]\nendpoint = \"test\"\n");
        assert!(result.unwrap_err().to_string().contains("web.endpoint"));
    }

    #[test]
    fn test_config_rejects_multi_char_fill() {
        let result = Config::from_toml_str("[report]\nfill = \"==\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_discovery_rules() {
        let rules = DiscoveryConfig::default();
        assert!(rules.is_test_function("test_ok"));
        assert!(!rules.is_test_function("helper"));
        assert!(rules.is_private("_hidden"));
        assert!(!rules.is_private("visible"));

        let no_private = DiscoveryConfig {
            private_prefix: String::new(),
            ..Default::default()
        };
        assert!(!no_private.is_private("_hidden"));
    }
}
