//! Caller-provided generation options.
//!
//! Options arrive already validated; deserialisation fills in defaults for
//! anything the caller leaves out.

use std::collections::BTreeMap;

use camino::Utf8PathBuf;
use serde::Deserialize;

use crate::flags::{BazelFlags, BazelFlagsSet};
use crate::label::BuildLabel;

/// Flag strings as persisted by front ends, split with shell rules on use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FlagStrings {
    /// Startup flags for every configuration.
    pub startup: String,
    /// Build flags for every configuration.
    pub build: String,
    /// Build flags appended in Debug.
    pub debug_build: String,
    /// Build flags appended in Release.
    pub release_build: String,
}

impl FlagStrings {
    /// Split into a [`BazelFlagsSet`].
    ///
    /// Returns `None` when any string has unbalanced quotes.
    #[must_use]
    pub fn to_flags_set(&self) -> Option<BazelFlagsSet> {
        Some(BazelFlagsSet::new(
            BazelFlags::from_shell_words(&self.startup, &self.build)?,
            BazelFlags::from_shell_words("", &self.debug_build)?,
            BazelFlags::from_shell_words("", &self.release_build)?,
        ))
    }
}

/// Options steering one generation pass.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    /// Name of the generated project bundle.
    pub project_name: String,
    /// Bazel binary invoked by generated phases.
    pub bazel_path: Utf8PathBuf,
    /// Absolute workspace root.
    pub workspace_root: Utf8PathBuf,
    /// Bazel execution root, when known.
    pub bazel_exec_root: Option<Utf8PathBuf>,
    /// Wrapper script invoked by build phases.
    pub build_script_path: Utf8PathBuf,
    /// Directory holding the compiler and linker stubs used by test runner
    /// configurations.
    pub stub_directory: Utf8PathBuf,
    /// Root labels to generate targets for.
    pub roots: Vec<BuildLabel>,
    /// Source path filters; `dir/...` recurses.
    pub path_filters: Vec<String>,
    /// Overrides Swift detection when set.
    pub swift_dependency_hint: Option<bool>,
    /// Select the 32-bit watch architecture for device builds.
    pub use_watch32: bool,
    /// Project-wide default flags.
    pub project_default_flags: FlagStrings,
    /// Exact-label flag overrides.
    pub target_overrides: BTreeMap<BuildLabel, FlagStrings>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            project_name: "Project".to_owned(),
            bazel_path: Utf8PathBuf::from("/usr/local/bin/bazel"),
            workspace_root: Utf8PathBuf::from("."),
            bazel_exec_root: None,
            build_script_path: Utf8PathBuf::from("${PROJECT_FILE_PATH}/.xcbazel/Scripts/bazel_build.py"),
            stub_directory: Utf8PathBuf::from("$(PROJECT_FILE_PATH)/.xcbazel/Utils"),
            roots: Vec::new(),
            path_filters: Vec::new(),
            swift_dependency_hint: None,
            use_watch32: false,
            project_default_flags: FlagStrings::default(),
            target_overrides: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_fill_missing_fields() {
        let options: GeneratorOptions = serde_json::from_str(
            r#"{"project_name": "Demo", "roots": ["//app:App"], "use_watch32": true}"#,
        )
        .expect("options parse");
        assert_eq!(options.project_name, "Demo");
        assert!(options.use_watch32);
        assert_eq!(options.bazel_path, Utf8PathBuf::from("/usr/local/bin/bazel"));
        assert!(options.target_overrides.is_empty());
    }

    #[rstest]
    fn flag_strings_split_per_variant() {
        let strings = FlagStrings {
            startup: "--batch".into(),
            build: "--a 'b c'".into(),
            debug_build: "--dbg".into(),
            release_build: String::new(),
        };
        let set = strings.to_flags_set().expect("balanced");
        assert_eq!(set.debug().build, ["--a", "b c", "--dbg"]);
        assert_eq!(set.release().startup, ["--batch"]);
    }
}
