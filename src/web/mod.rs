//! Debug-only HTTP page that runs a suite and returns the report as plain text.
//!
//! The page is only mounted when the environment is tagged `debug` and the
//! running app id matches the configured static app id. A suite pulled in as
//! somebody else's dependency therefore never publishes a page.
//!
//! Append `?quiet=true` (or `?quiet=1`) to the URL to show only failing tests.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;

use crate::config::{AppConfig, Config, WebConfig};
use crate::core::builder::TestRunner;
use crate::core::error::{Error, Result};
use crate::registry::Namespace;

/// Environment tag that enables the page.
pub const DEBUG_TAG: &str = "debug";

#[derive(Clone)]
struct PageState {
    suite: Arc<Namespace>,
    runner: Arc<TestRunner>,
    header: Option<Arc<str>>,
}

/// Entry point for publishing a suite over HTTP.
pub struct TestPage;

impl TestPage {
    /// Mount `suite` at `web.endpoint` if the page is enabled for `app`.
    ///
    /// The report uses default discovery and report settings; see
    /// [`TestPage::mount_runner`] to supply a configured runner.
    pub fn mount(
        suite: Namespace,
        web: &WebConfig,
        app: &AppConfig,
        header: Option<&str>,
    ) -> Option<Router> {
        let config = Config {
            web: web.clone(),
            app: app.clone(),
            ..Config::default()
        };
        match crate::builder().with_config(config).build() {
            Ok(runner) => Self::mount_runner(suite, runner, header),
            Err(e) => {
                tracing::warn!(error = %e, "test page not mounted: invalid configuration");
                None
            }
        }
    }

    /// Mount `suite` using the web and app settings of `runner`.
    pub fn mount_runner(suite: Namespace, runner: TestRunner, header: Option<&str>) -> Option<Router> {
        let config = runner.config();
        if !is_enabled(&config.web, &config.app) {
            tracing::debug!(
                app = %config.app.id,
                tags = ?config.app.environment_tags,
                "test page disabled for this environment"
            );
            return None;
        }

        let endpoint = config.web.endpoint.clone();
        let origin = config
            .web
            .origin
            .clone()
            .unwrap_or_else(|| format!("http://{}", config.web.bind));
        tracing::info!("Tests can be run here: {origin}{endpoint}");

        let state = PageState {
            suite: Arc::new(suite),
            runner: Arc::new(runner),
            header: header.map(Arc::from),
        };
        Some(Router::new().route(&endpoint, get(run_tests)).with_state(state))
    }
}

/// Whether the page should be published for this app.
pub fn is_enabled(web: &WebConfig, app: &AppConfig) -> bool {
    app.has_tag(DEBUG_TAG) && web.static_app_id.as_deref() == Some(app.id.as_str())
}

/// Interpret the `quiet` query parameter.
///
/// Only `1` and `true` (any case) turn quiet mode on; absent means verbose.
pub fn parse_quiet(value: Option<&str>) -> bool {
    value.is_some_and(|v| matches!(v.to_lowercase().as_str(), "1" | "true"))
}

async fn run_tests(
    State(state): State<PageState>,
    Query(params): Query<HashMap<String, String>>,
) -> std::result::Result<String, (StatusCode, String)> {
    let quiet = parse_quiet(params.get("quiet").map(String::as_str));
    tracing::debug!(quiet, "running tests for page request");

    // Tests are synchronous and may block.
    tokio::task::spawn_blocking(move || {
        state
            .runner
            .run_with(&state.suite, Some(quiet), state.header.as_deref())
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "test run aborted");
        (StatusCode::INTERNAL_SERVER_ERROR, format!("test run aborted: {e}"))
    })
}

/// Serve `router` on `bind` until the process is stopped.
pub async fn serve(router: Router, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| Error::web(format!("failed to bind {bind}: {e}")))?;
    tracing::info!(addr = %bind, "serving test page");
    axum::serve(listener, router).await?;
    Ok(())
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

    fn debug_app() -> (WebConfig, AppConfig) {
        let web = WebConfig {
            static_app_id: Some("APP1".to_string()),
            ..WebConfig::default()
        };
        let app = AppConfig {
            id: "APP1".to_string(),
            environment_tags: vec!["debug".to_string()],
            ..AppConfig::default()
        };
        (web, app)
    }

    fn state(header: Option<&str>) -> PageState {
        let (web, app) = debug_app();
        let config = Config {
            web,
            app,
            ..Config::default()
        };
        PageState {
            suite: Arc::new(suite()),
            runner: Arc::new(crate::builder().with_config(config).build().unwrap()),
            header: header.map(Arc::from),
        }
    }

    fn query(pairs: &[(&str, &str)]) -> Query<HashMap<String, String>> {
        Query(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_parse_quiet() {
        assert!(parse_quiet(Some("1")));
        assert!(parse_quiet(Some("TRUE")));
        assert!(parse_quiet(Some("true")));
        assert!(!parse_quiet(Some("yes")));
        assert!(!parse_quiet(Some("0")));
        assert!(!parse_quiet(None));
    }

    #[test]
    fn test_is_enabled_requires_debug_and_matching_app() {
        let (web, app) = debug_app();
        assert!(is_enabled(&web, &app));

        let not_debug = AppConfig {
            environment_tags: vec!["published".to_string()],
            ..app.clone()
        };
        assert!(!is_enabled(&web, &not_debug));

        let dependency = AppConfig {
            id: "OTHER".to_string(),
            ..app.clone()
        };
        assert!(!is_enabled(&web, &dependency));

        assert!(!is_enabled(&WebConfig::default(), &app));
    }

    #[test]
    fn test_mount_disabled_returns_none() {
        let (web, _) = debug_app();
        assert!(TestPage::mount(suite(), &web, &AppConfig::default(), None).is_none());
    }

    #[test]
    fn test_mount_enabled_returns_router() {
        let (web, app) = debug_app();
        assert!(TestPage::mount(suite(), &web, &app, Some("Page")).is_some());
    }

    #[test]
    fn test_mount_invalid_config_returns_none() {
        let (web, app) = debug_app();
        let web = WebConfig {
            endpoint: "no-slash".to_string(),
            ..web
        };
        assert!(is_enabled(&web, &app));
        assert!(TestPage::mount(suite(), &web, &app, None).is_none());
    }

    #[tokio::test]
    async fn test_handler_verbose_by_default() {
        let body = run_tests(State(state(Some("Page"))), query(&[])).await.unwrap();
        assert!(body.contains(" Page "));
        assert!(body.contains("  Pass: tests::test_ok"));
        assert!(body.contains("> Fail: tests::test_bad"));
        assert!(body.contains("1/2 passed"));
    }

    #[tokio::test]
    async fn test_handler_quiet_query() {
        let body = run_tests(State(state(None)), query(&[("quiet", "True")]))
            .await
            .unwrap();
        assert!(!body.contains("Pass: tests::test_ok"));
        assert!(body.contains("> Fail: tests::test_bad"));
        assert!(body.contains("1 failed tests"));
    }
}
