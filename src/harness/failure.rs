//! Failure payloads raised by tests and their normalized text form.

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Outcome of a single test unit.
pub type TestOutcome = std::result::Result<(), Failure>;

/// Placeholder shown when a failure carries no usable information.
pub const NO_INFO: &str = "Sorry, no info given.";

/// Why a test did not pass.
///
/// `Empty`, `Message`, `List` and `Fields` are deliberate assertion failures.
/// `Unexpected` is an error the test did not intend to raise: anything
/// propagated with `?` from a `std::error::Error`, or a panic.
///
/// `Failure` intentionally does not implement `std::error::Error`, so that
/// every error type converts into it through `?`.
#[derive(Debug, Clone)]
pub enum Failure {
    /// Assertion failed without a message.
    Empty,
    /// Assertion failed with a single message.
    Message(String),
    /// Assertion failed with several messages, one per line.
    List(Vec<String>),
    /// Assertion failed with named values, rendered as `key: value`.
    Fields(Vec<(String, String)>),
    /// The test itself crashed.
    Unexpected {
        /// Short type name of the error, or `panic`.
        kind: String,
        /// The error's display text.
        message: String,
        /// The original error, kept for [`Failure::downcast_ref`].
        source: Option<Arc<dyn StdError + Send + Sync>>,
    },
}

impl Failure {
    /// Create an assertion failure with a message.
    pub fn message(msg: impl Into<String>) -> Self {
        Failure::Message(msg.into())
    }

    /// Create an assertion failure from a list of messages.
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Failure::List(items.into_iter().map(Into::into).collect())
    }

    /// Create an assertion failure from key/value pairs.
    pub fn fields<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Failure::Fields(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Create an unexpected error without a source error attached.
    pub fn unexpected(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Failure::Unexpected {
            kind: kind.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Convert a caught panic payload into an unexpected failure.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic payload of unknown type".to_string()
        };
        Failure::unexpected("panic", message)
    }

    /// Whether this is a deliberate assertion failure.
    pub fn is_assertion(&self) -> bool {
        !self.is_unexpected()
    }

    /// Whether the test crashed rather than failing an assertion.
    pub fn is_unexpected(&self) -> bool {
        matches!(self, Failure::Unexpected { .. })
    }

    /// Kind name of an unexpected error.
    pub fn kind(&self) -> Option<&str> {
        match self {
            Failure::Unexpected { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Borrow the original error if it was raised as an `E`.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Failure::Unexpected {
                source: Some(source),
                ..
            } => source.downcast_ref::<E>(),
            _ => None,
        }
    }
}

impl<E> From<E> for Failure
where
    E: StdError + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Failure::Unexpected {
            kind: short_type_name::<E>().to_string(),
            message: err.to_string(),
            source: Some(Arc::new(err)),
        }
    }
}

impl PartialEq for Failure {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Failure::Empty, Failure::Empty) => true,
            (Failure::Message(a), Failure::Message(b)) => a == b,
            (Failure::List(a), Failure::List(b)) => a == b,
            (Failure::Fields(a), Failure::Fields(b)) => a == b,
            (
                Failure::Unexpected {
                    kind: ka,
                    message: ma,
                    ..
                },
                Failure::Unexpected {
                    kind: kb,
                    message: mb,
                    ..
                },
            ) => ka == kb && ma == mb,
            _ => false,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&normalize(Some(self)))
    }
}

/// Render a failure payload as human-readable, possibly multi-line, text.
///
/// Total: every input maps to a non-empty string. A missing or empty
/// payload yields [`NO_INFO`].
pub fn normalize(failure: Option<&Failure>) -> String {
    let rendered = match failure {
        None | Some(Failure::Empty) => return NO_INFO.to_string(),
        Some(Failure::Message(msg)) => msg.clone(),
        Some(Failure::List(items)) => items.join("\n"),
        Some(Failure::Fields(entries)) => entries
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join("\n"),
        Some(Failure::Unexpected { kind, message, .. }) => {
            return format!("Error during test: {kind}: {message}");
        }
    };

    if rendered.is_empty() {
        NO_INFO.to_string()
    } else {
        rendered
    }
}

/// Last path segment of a type name, without generic arguments.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Fail the current test unless a condition holds.
///
/// ```
/// use autotest::{ensure, TestOutcome};
///
/// fn test_math() -> TestOutcome {
///     ensure!(1 + 1 == 2, "arithmetic is broken");
///     Ok(())
/// }
/// # assert!(test_math().is_ok());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr $(,)?) => {
        if !$cond {
            return ::core::result::Result::Err($crate::Failure::Empty);
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return ::core::result::Result::Err($crate::Failure::message(format!($($arg)+)));
        }
    };
}

/// Fail the current test unless two values are equal.
///
/// The failure lists both sides as `left` and `right`.
#[macro_export]
macro_rules! ensure_eq {
    ($left:expr, $right:expr $(,)?) => {
        match (&$left, &$right) {
            (left, right) => {
                if !(*left == *right) {
                    return ::core::result::Result::Err($crate::Failure::fields([
                        ("left", format!("{left:?}")),
                        ("right", format!("{right:?}")),
                    ]));
                }
            }
        }
    };
    ($left:expr, $right:expr, $($arg:tt)+) => {
        match (&$left, &$right) {
            (left, right) => {
                if !(*left == *right) {
                    return ::core::result::Result::Err($crate::Failure::fields([
                        ("message", format!($($arg)+)),
                        ("left", format!("{left:?}")),
                        ("right", format!("{right:?}")),
                    ]));
                }
            }
        }
    };
}

/// Fail the current test unconditionally.
#[macro_export]
macro_rules! fail {
    () => {
        return ::core::result::Result::Err($crate::Failure::Empty)
    };
    ($($arg:tt)+) => {
        return ::core::result::Result::Err($crate::Failure::message(format!($($arg)+)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("disk full")]
    struct DiskFull;

    #[test]
    fn test_normalize_none_uses_placeholder() {
        assert_eq!(normalize(None), NO_INFO);
    }

    #[test]
    fn test_normalize_none_equals_empty_message() {
        assert_eq!(normalize(None), normalize(Some(&Failure::message(""))));
        assert_eq!(normalize(None), normalize(Some(&Failure::Empty)));
    }

    #[test]
    fn test_normalize_message_verbatim() {
        assert_eq!(normalize(Some(&Failure::message("boom"))), "boom");
    }

    #[test]
    fn test_normalize_whitespace_message_kept() {
        assert_eq!(normalize(Some(&Failure::message("   "))), "   ");
    }

    #[test]
    fn test_normalize_list_joined_by_newlines() {
        assert_eq!(normalize(Some(&Failure::list(["a", "b"]))), "a\nb");
    }

    #[test]
    fn test_normalize_empty_collections_use_placeholder() {
        assert_eq!(normalize(Some(&Failure::List(Vec::new()))), NO_INFO);
        assert_eq!(normalize(Some(&Failure::Fields(Vec::new()))), NO_INFO);
        assert_eq!(normalize(Some(&Failure::list([""]))), NO_INFO);
    }

    #[test]
    fn test_normalize_fields_key_value_lines() {
        let failure = Failure::fields([("expected", "1"), ("actual", "2")]);
        assert_eq!(normalize(Some(&failure)), "expected: 1\nactual: 2");
    }

    #[test]
    fn test_normalize_unexpected_names_kind() {
        let failure = Failure::unexpected("RuntimeError", "boom2");
        assert_eq!(
            normalize(Some(&failure)),
            "Error during test: RuntimeError: boom2"
        );
    }

    #[test]
    fn test_from_error_keeps_kind_and_source() {
        let failure: Failure = DiskFull.into();
        assert!(failure.is_unexpected());
        assert_eq!(failure.kind(), Some("DiskFull"));
        assert!(failure.downcast_ref::<DiskFull>().is_some());
        assert_eq!(failure.to_string(), "Error during test: DiskFull: disk full");
    }

    #[test]
    fn test_from_panic_payloads() {
        let failure = Failure::from_panic(Box::new("static message"));
        assert_eq!(failure, Failure::unexpected("panic", "static message"));

        let failure = Failure::from_panic(Box::new(String::from("owned message")));
        assert_eq!(failure, Failure::unexpected("panic", "owned message"));

        let failure = Failure::from_panic(Box::new(42_u8));
        assert_eq!(failure.kind(), Some("panic"));
    }

    #[test]
    fn test_ensure_macros() {
        fn passes() -> TestOutcome {
            ensure!(true);
            ensure_eq!(2, 1 + 1);
            Ok(())
        }
        fn fails_bare() -> TestOutcome {
            ensure!(false);
            Ok(())
        }
        fn fails_eq() -> TestOutcome {
            ensure_eq!(1, 2, "numbers differ");
            Ok(())
        }
        fn fails_always() -> TestOutcome {
            fail!("nope {}", 1);
        }

        assert!(passes().is_ok());
        assert_eq!(fails_bare(), Err(Failure::Empty));
        assert_eq!(
            fails_eq(),
            Err(Failure::fields([
                ("message", "numbers differ"),
                ("left", "1"),
                ("right", "2"),
            ]))
        );
        assert_eq!(fails_always(), Err(Failure::message("nope 1")));
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<DiskFull>(), "DiskFull");
        assert_eq!(short_type_name::<std::io::Error>(), "Error");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec");
    }
}
