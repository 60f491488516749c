//! Core types for running a suite: builder, runner, and error handling.

pub mod builder;
pub mod error;

pub use builder::{TestRunner, TestRunnerBuilder};
pub use error::{Error, Result};
