//! Ordered Bazel flag sequences.
//!
//! Order matters: Bazel lets a later occurrence of a flag override an earlier
//! one, so concatenation appends and never sorts.
//!
//! ```
//! use xcbazel::flags::BazelFlags;
//!
//! let a = BazelFlags::new(["--batch"], ["--announce_rc"]);
//! let b = BazelFlags::new([] as [&str; 0], ["--compilation_mode=dbg"]);
//! let joined = &a + &b;
//! assert_eq!(joined.build, ["--announce_rc", "--compilation_mode=dbg"]);
//! ```

use std::fmt::{self, Display, Formatter};
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Startup and build flags for one Bazel invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BazelFlags {
    /// Flags placed before the command verb.
    pub startup: Vec<String>,
    /// Flags placed after the command verb.
    pub build: Vec<String>,
}

impl BazelFlags {
    /// Create flags from startup and build sequences.
    pub fn new<S, B>(startup: S, build: B) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        B: IntoIterator,
        B::Item: Into<String>,
    {
        Self {
            startup: startup.into_iter().map(Into::into).collect(),
            build: build.into_iter().map(Into::into).collect(),
        }
    }

    /// Build-only flags.
    pub fn build_only<B>(build: B) -> Self
    where
        B: IntoIterator,
        B::Item: Into<String>,
    {
        Self::new(Vec::<String>::new(), build)
    }

    /// Parse whitespace-separated flag strings using shell quoting rules.
    ///
    /// Returns `None` when either string has unbalanced quotes.
    #[must_use]
    pub fn from_shell_words(startup: &str, build: &str) -> Option<Self> {
        Some(Self {
            startup: shlex::split(startup)?,
            build: shlex::split(build)?,
        })
    }

    /// Whether both sequences are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.startup.is_empty() && self.build.is_empty()
    }

    /// Replace every build flag named `name` with a single `name=value`.
    ///
    /// The replacement takes the position of the first removed occurrence,
    /// or is appended when the flag was absent.
    pub fn replace_build_flag(&mut self, name: &str, value: &str) {
        let prefix = format!("{name}=");
        let replacement = format!("{name}={value}");
        let position = self.build.iter().position(|f| f.starts_with(&prefix));
        self.build.retain(|f| !f.starts_with(&prefix));
        match position {
            Some(index) if index <= self.build.len() => self.build.insert(index, replacement),
            _ => self.build.push(replacement),
        }
    }
}

impl Add for BazelFlags {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl Add<&BazelFlags> for &BazelFlags {
    type Output = BazelFlags;

    fn add(self, rhs: &BazelFlags) -> BazelFlags {
        self.clone() + rhs.clone()
    }
}

impl AddAssign for BazelFlags {
    fn add_assign(&mut self, rhs: Self) {
        self.startup.extend(rhs.startup);
        self.build.extend(rhs.build);
    }
}

impl Display for BazelFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "startup=[{}] build=[{}]",
            self.startup.join(" "),
            self.build.join(" ")
        )
    }
}

/// Build configuration selecting a flag variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuildConfig {
    /// Debug builds.
    Debug,
    /// Release builds.
    Release,
}

impl BuildConfig {
    /// Both configurations, in rendering order.
    pub const ALL: [Self; 2] = [Self::Debug, Self::Release];

    /// Configuration name as shown in the IDE.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
        }
    }
}

/// Flags shared by both configurations plus per-configuration additions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BazelFlagsSet {
    /// Flags for every configuration.
    pub common: BazelFlags,
    /// Flags appended in Debug.
    pub debug_only: BazelFlags,
    /// Flags appended in Release.
    pub release_only: BazelFlags,
}

impl BazelFlagsSet {
    /// A set whose variants are just `common`.
    #[must_use]
    pub fn common(common: BazelFlags) -> Self {
        Self {
            common,
            ..Self::default()
        }
    }

    /// A set from explicit debug and release additions.
    #[must_use]
    pub const fn new(common: BazelFlags, debug_only: BazelFlags, release_only: BazelFlags) -> Self {
        Self {
            common,
            debug_only,
            release_only,
        }
    }

    /// `common + debug_only`.
    #[must_use]
    pub fn debug(&self) -> BazelFlags {
        &self.common + &self.debug_only
    }

    /// `common + release_only`.
    #[must_use]
    pub fn release(&self) -> BazelFlags {
        &self.common + &self.release_only
    }

    /// The variant for `config`.
    #[must_use]
    pub fn for_config(&self, config: BuildConfig) -> BazelFlags {
        match config {
            BuildConfig::Debug => self.debug(),
            BuildConfig::Release => self.release(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn flags(startup: &[&str], build: &[&str]) -> BazelFlags {
        BazelFlags::new(startup.iter().copied(), build.iter().copied())
    }

    #[rstest]
    fn concatenation_preserves_order() {
        let a = flags(&["--s1"], &["--b1", "--b2"]);
        let b = flags(&["--s2"], &["--b1"]);
        let sum = &a + &b;
        assert_eq!(sum.startup, ["--s1", "--s2"]);
        assert_eq!(sum.build, ["--b1", "--b2", "--b1"]);
        assert_ne!(&a + &b, &b + &a);
    }

    #[rstest]
    fn concatenation_is_associative() {
        let a = flags(&["--a"], &["--x=1"]);
        let b = flags(&[], &["--x=2"]);
        let c = flags(&["--c"], &[]);
        assert_eq!(&(&a + &b) + &c, &a + &(&b + &c));
    }

    #[rstest]
    fn set_variants_append_to_common() {
        let set = BazelFlagsSet::new(
            flags(&[], &["--common"]),
            flags(&[], &["--dbg"]),
            flags(&["--rel-startup"], &["--opt"]),
        );
        assert_eq!(set.debug().build, ["--common", "--dbg"]);
        assert_eq!(set.release(), flags(&["--rel-startup"], &["--common", "--opt"]));
        assert_eq!(set.for_config(BuildConfig::Debug), set.debug());
    }

    #[rstest]
    #[case(&["--a", "--cpu=x", "--b", "--cpu=y"], &["--a", "--cpu=z", "--b"])]
    #[case(&["--a"], &["--a", "--cpu=z"])]
    fn replace_build_flag(#[case] before: &[&str], #[case] after: &[&str]) {
        let mut subject = flags(&[], before);
        subject.replace_build_flag("--cpu", "z");
        assert_eq!(subject.build, after);
    }

    #[rstest]
    fn shell_words_respect_quotes() {
        let parsed = BazelFlags::from_shell_words("", "--copt='-DA B' --x").expect("balanced");
        assert_eq!(parsed.build, ["--copt=-DA B", "--x"]);
        assert!(BazelFlags::from_shell_words("'", "").is_none());
    }
}
