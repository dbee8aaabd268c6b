#![forbid(unsafe_code)]

//! Environment constants shared by the xcbazel library, its tests, and the
//! test helpers.

/// Environment variable overriding the Bazel binary named in the options.
///
/// # Examples
///
/// ```
/// use bazel_env::BAZEL_ENV;
/// assert_eq!(BAZEL_ENV, "XCBAZEL_BAZEL");
/// ```
pub const BAZEL_ENV: &str = "XCBAZEL_BAZEL";
