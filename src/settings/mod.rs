//! Composition of Bazel flags into per-target build settings.
//!
//! [`BuildSettings`] is computed once per generation pass. Flags are layered
//! in a fixed order so that later layers can override earlier ones on the
//! Bazel command line:
//!
//! 1. universal flags
//! 2. cache-safe flags
//! 3. cache-affecting flags
//! 4. Swift or non-Swift flags
//! 5. project defaults
//! 6. exact-label overrides
//! 7. platform configuration flags
//!
//! The composed settings render to a canonical text consumed by the build
//! wrapper script.

mod options;
mod platform;

use std::collections::{BTreeMap, BTreeSet};

use camino::Utf8PathBuf;

use crate::flags::{BazelFlags, BazelFlagsSet, BuildConfig};
use crate::label::BuildLabel;
use crate::report::{Report, Warning};

pub use options::{FlagStrings, GeneratorOptions};
pub use platform::{PlatformConfiguration, PlatformType};

const WATCHOS_CPUS_FLAG: &str = "--watchos_cpus";
const WATCH32_CPU: &str = "armv7k";

fn universal_flags() -> BazelFlags {
    BazelFlags::build_only(["--verbose_failures", "--announce_rc"])
}

fn cache_safe_flags() -> BazelFlagsSet {
    BazelFlagsSet::common(BazelFlags::build_only([
        "--show_result=0",
        "--tool_tag=xcbazel:bazel_build",
    ]))
}

fn cache_affecting_flags() -> BazelFlagsSet {
    BazelFlagsSet::new(
        BazelFlags::build_only(["--features=debug_prefix_map_pwd_is_dot"]),
        BazelFlags::build_only(["--compilation_mode=dbg"]),
        BazelFlags::build_only([
            "--compilation_mode=opt",
            "--strip=always",
            "--apple_generate_dsym",
        ]),
    )
}

fn swift_flags() -> BazelFlagsSet {
    BazelFlagsSet::new(
        BazelFlags::build_only(["--features=swift.use_global_module_cache"]),
        BazelFlags::build_only([
            "--swiftcopt=-Xfrontend",
            "--swiftcopt=-serialize-debugging-options",
        ]),
        BazelFlags::default(),
    )
}

fn non_swift_flags() -> BazelFlagsSet {
    BazelFlagsSet::common(BazelFlags::build_only([
        "--features=-swift.use_global_module_cache",
    ]))
}

/// Fully composed settings for one generation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    bazel: Utf8PathBuf,
    bazel_exec_root: Option<Utf8PathBuf>,
    workspace_root: Utf8PathBuf,
    default_platform_configuration: PlatformConfiguration,
    universal: BazelFlags,
    cache_safe: BazelFlagsSet,
    cache_affecting: BazelFlagsSet,
    swift: BazelFlagsSet,
    non_swift: BazelFlagsSet,
    project_default: BazelFlagsSet,
    target_overrides: BTreeMap<BuildLabel, BazelFlagsSet>,
    platform_flags: BTreeMap<String, BazelFlags>,
    swift_targets: BTreeSet<BuildLabel>,
    targets: BTreeMap<BuildLabel, PlatformConfiguration>,
}

impl BuildSettings {
    /// Compose settings from options, the buildable targets with their
    /// platforms, and the set of Swift-bearing targets.
    ///
    /// Flag strings with unbalanced quotes are reported and treated as empty.
    #[must_use]
    pub fn compose(
        options: &GeneratorOptions,
        default_platform: PlatformType,
        targets: &BTreeMap<BuildLabel, PlatformType>,
        swift_targets: BTreeSet<BuildLabel>,
        report: &mut Report,
    ) -> Self {
        let mut split = |scope: &str, strings: &FlagStrings| {
            strings.to_flags_set().unwrap_or_else(|| {
                report.warn(Warning::InvalidFlagString {
                    scope: scope.to_owned(),
                });
                BazelFlagsSet::default()
            })
        };
        let project_default = split("project", &options.project_default_flags);
        let target_overrides = options
            .target_overrides
            .iter()
            .map(|(label, strings)| (label.clone(), split(label.as_str(), strings)))
            .collect();

        let platform_flags = PlatformConfiguration::all()
            .into_iter()
            .map(|config| {
                let mut flags = BazelFlags::build_only(config.flags());
                if options.use_watch32 && config.uses_watch_device_cpu() {
                    flags.replace_build_flag(WATCHOS_CPUS_FLAG, WATCH32_CPU);
                }
                (config.identifier(), flags)
            })
            .collect();

        Self {
            bazel: options.bazel_path.clone(),
            bazel_exec_root: options.bazel_exec_root.clone(),
            workspace_root: options.workspace_root.clone(),
            default_platform_configuration: default_platform.default_configuration(),
            universal: universal_flags(),
            cache_safe: cache_safe_flags(),
            cache_affecting: cache_affecting_flags(),
            swift: swift_flags(),
            non_swift: non_swift_flags(),
            project_default,
            target_overrides,
            platform_flags,
            swift_targets,
            targets: targets
                .iter()
                .map(|(label, platform)| (label.clone(), platform.default_configuration()))
                .collect(),
        }
    }

    /// The composed flags for one target, configuration and platform.
    #[must_use]
    pub fn flags_for(
        &self,
        label: &BuildLabel,
        config: BuildConfig,
        platform: &PlatformConfiguration,
    ) -> BazelFlags {
        let language = if self.swift_targets.contains(label) {
            &self.swift
        } else {
            &self.non_swift
        };
        let mut flags = self.universal.clone();
        flags += self.cache_safe.for_config(config);
        flags += self.cache_affecting.for_config(config);
        flags += language.for_config(config);
        flags += self.project_default.for_config(config);
        if let Some(overrides) = self.target_overrides.get(label) {
            flags += overrides.for_config(config);
        }
        if let Some(platform_flags) = self.platform_flags(&platform.identifier()) {
            flags += platform_flags.clone();
        }
        flags
    }

    /// Flags pinned to a platform configuration identifier.
    #[must_use]
    pub fn platform_flags(&self, identifier: &str) -> Option<&BazelFlags> {
        self.platform_flags.get(identifier)
    }

    /// Canonical text rendering; every collection is emitted in sorted order.
    ///
    /// Each buildable target also gets its fully composed flags per
    /// configuration on its platform's default configuration, under
    /// `target.<label>.<debug|release>`.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut line = |key: &str, value: &dyn std::fmt::Display| {
            out.push_str(&format!("{key} = {value}\n"));
        };
        line("bazel", &self.bazel);
        line(
            "bazel_exec_root",
            &self
                .bazel_exec_root
                .as_ref()
                .map_or_else(String::new, ToString::to_string),
        );
        line("workspace_root", &self.workspace_root);
        line(
            "default_platform_configuration",
            &self.default_platform_configuration,
        );
        line("universal", &self.universal);
        for (name, set) in [
            ("cache_safe", &self.cache_safe),
            ("cache_affecting", &self.cache_affecting),
            ("swift", &self.swift),
            ("non_swift", &self.non_swift),
            ("project_default", &self.project_default),
        ] {
            render_set(&mut line, name, set);
        }
        for (label, set) in &self.target_overrides {
            render_set(&mut line, &format!("override.{label}"), set);
        }
        for (identifier, flags) in &self.platform_flags {
            line(&format!("platform.{identifier}"), flags);
        }
        let swift: Vec<&str> = self.swift_targets.iter().map(BuildLabel::as_str).collect();
        line("swift_targets", &swift.join(" "));
        for (label, platform) in &self.targets {
            for config in BuildConfig::ALL {
                let key = format!("target.{label}.{}", config.name().to_lowercase());
                line(&key, &self.flags_for(label, config, platform));
            }
        }
        out
    }
}

fn render_set(line: &mut impl FnMut(&str, &dyn std::fmt::Display), name: &str, set: &BazelFlagsSet) {
    for config in BuildConfig::ALL {
        let key = format!("{name}.{}", config.name().to_lowercase());
        line(&key, &set.for_config(config));
    }
}
