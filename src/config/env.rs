//! Environment variable processing for runtime configuration overrides.
//!
//! Env var prefix: `AUTOTEST_`
//!
//! - `AUTOTEST_PROFILE`: select a configuration profile
//! - `AUTOTEST_HEADER`: override the report header
//! - `AUTOTEST_QUIET`: only show failing tests (1/true/yes or 0/false/no)
//! - `AUTOTEST_APP_ID`: application id shown in the report
//! - `AUTOTEST_APP_BRANCH`: branch shown in the report
//! - `AUTOTEST_ENV_TAGS`: comma-separated environment tags (e.g. `debug`)
//! - `AUTOTEST_WEB_ENDPOINT`: route of the debug test page
//! - `AUTOTEST_WEB_BIND`: bind address of the debug test page
//! - `AUTOTEST_WEB_STATIC_APP_ID`: app id the test page is published for
//! - `AUTOTEST_VERBOSE`: enable verbose output (1/true/yes or 0/false/no)

use super::Config;

const PREFIX: &str = "AUTOTEST_";

/// Read the active profile name from `AUTOTEST_PROFILE`.
pub fn get_profile_name() -> Option<String> {
    std::env::var("AUTOTEST_PROFILE").ok().filter(|s| !s.is_empty())
}

/// Apply individual env var overrides to a config.
///
/// Each override is applied only if the env var is set and parses correctly.
/// Invalid values are ignored.
pub fn apply_env_overrides(config: &mut Config) {
    if let Some(val) = env_str("HEADER") {
        config.report.header = Some(val);
    }

    if let Some(val) = env_bool("QUIET") {
        config.report.quiet = val;
    }

    if let Some(val) = env_str("APP_ID") {
        config.app.id = val;
    }

    if let Some(val) = env_str("APP_BRANCH") {
        config.app.branch = val;
    }

    if let Some(val) = env_str("ENV_TAGS") {
        config.app.environment_tags = split_tags(&val);
    }

    if let Some(val) = env_str("WEB_ENDPOINT") {
        if val.starts_with('/') {
            config.web.endpoint = val;
        } else {
            tracing::warn!(value = %val, "ignoring AUTOTEST_WEB_ENDPOINT without leading '/'");
        }
    }

    if let Some(val) = env_str("WEB_BIND") {
        config.web.bind = val;
    }

    if let Some(val) = env_str("WEB_STATIC_APP_ID") {
        config.web.static_app_id = Some(val);
    }

    if let Some(val) = env_bool("VERBOSE") {
        config.verbose = val;
    }
}

/// Summarize which env var overrides are currently active.
///
/// Returns a list of `(env_var_name, value)` pairs for display in `check`.
pub fn detect_active_overrides() -> Vec<(String, String)> {
    let keys = [
        "PROFILE",
        "HEADER",
        "QUIET",
        "APP_ID",
        "APP_BRANCH",
        "ENV_TAGS",
        "WEB_ENDPOINT",
        "WEB_BIND",
        "WEB_STATIC_APP_ID",
        "VERBOSE",
    ];

    let mut active = Vec::new();
    for key in keys {
        let full = format!("{PREFIX}{key}");
        if let Ok(val) = std::env::var(&full) {
            if !val.is_empty() {
                active.push((full, val));
            }
        }
    }
    active
}

/// Split a comma-separated tag list, dropping blanks.
pub fn split_tags(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

/// Parse a user-supplied flag: `1`/`true`/`yes` and `0`/`false`/`no`, any case.
///
/// Returns `None` for anything else.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

// --- helpers ---

fn env_str(suffix: &str) -> Option<String> {
    std::env::var(format!("{PREFIX}{suffix}"))
        .ok()
        .filter(|s| !s.is_empty())
}

fn env_bool(suffix: &str) -> Option<bool> {
    let val = env_str(suffix)?;
    let flag = parse_flag(&val);
    if flag.is_none() {
        tracing::warn!(value = %val, "ignoring {PREFIX}{suffix}: expected 1/true/yes or 0/false/no");
    }
    flag
}
