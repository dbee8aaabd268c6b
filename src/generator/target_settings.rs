//! Build configurations of generated targets.

use camino::Utf8Path;

use crate::flags::BuildConfig;
use crate::project::{SettingValue, SettingsMap};
use crate::rule_entry::RuleEntry;
use crate::settings::PlatformType;

/// Prefix of the configurations that let Bazel, not the IDE, compile tests.
pub const TEST_RUNNER_PREFIX: &str = "__TestRunner_";
/// Flag value that turns the IDE's compiler and linker invocations into no-ops.
const NO_OP_FLAG: &str = "--version";

/// How a test bundle attaches to its host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostLink {
    /// Unit tests are injected through the bundle loader.
    Loader {
        /// Product name of the host.
        host_product: String,
        /// Whether the host uses the macOS bundle layout.
        macos: bool,
    },
    /// UI tests drive the host by target name.
    TargetName {
        /// Target name of the host.
        host_target: String,
    },
}

impl HostLink {
    /// Link style for `test`, hosted by a target named `host_name`.
    #[must_use]
    pub fn for_test(test: &RuleEntry, host_name: &str, host_platform: PlatformType) -> Option<Self> {
        if test.rule_type.ends_with("_unit_test") {
            Some(Self::Loader {
                host_product: host_name.to_owned(),
                macos: host_platform == PlatformType::Macos,
            })
        } else if test.rule_type.ends_with("_ui_test") {
            Some(Self::TargetName {
                host_target: host_name.to_owned(),
            })
        } else {
            None
        }
    }

    fn apply(&self, settings: &mut SettingsMap) {
        match self {
            Self::Loader {
                host_product,
                macos,
            } => {
                let binary = if *macos {
                    format!("{host_product}.app/Contents/MacOS/{host_product}")
                } else {
                    format!("{host_product}.app/{host_product}")
                };
                put(settings, "BUNDLE_LOADER", "$(TEST_HOST)");
                put(settings, "TEST_HOST", &format!("$(BUILT_PRODUCTS_DIR)/{binary}"));
            }
            Self::TargetName { host_target } => put(settings, "TEST_TARGET_NAME", host_target),
        }
    }
}

/// Settings shared by every configuration of a buildable target.
#[must_use]
pub fn buildable_settings(
    entry: &RuleEntry,
    name: &str,
    platform: PlatformType,
    host: Option<&HostLink>,
) -> SettingsMap {
    let mut settings = platform_settings(platform, entry.minimum_os_version.as_deref());
    put(&mut settings, "PRODUCT_NAME", name);
    put(&mut settings, "BAZEL_TARGET", entry.label.as_str());
    put(&mut settings, "BAZEL_TARGET_TYPE", &entry.rule_type);
    put(
        &mut settings,
        "BAZEL_BUILD_PATH",
        entry.label.package_name().unwrap_or_default(),
    );
    if let Some(bundle_id) = &entry.bundle_id {
        put(&mut settings, "PRODUCT_BUNDLE_IDENTIFIER", bundle_id);
    }
    if let Some(artifact) = &entry.secondary_artifact {
        put(&mut settings, "BAZEL_SECONDARY_ARTIFACT", artifact.as_str());
    }
    if let Some(point) = &entry.extension_point_identifier {
        put(&mut settings, "BAZEL_EXTENSION_POINT", point);
    }
    if let Some(host) = host {
        host.apply(&mut settings);
    }
    settings
}

/// SDK root and, when known, the deployment target.
#[must_use]
pub fn platform_settings(platform: PlatformType, minimum_os_version: Option<&str>) -> SettingsMap {
    let mut settings = SettingsMap::new();
    put(&mut settings, "SDKROOT", platform.sdk_root());
    if let Some(version) = minimum_os_version {
        put(&mut settings, platform.deployment_target_key(), version);
    }
    settings
}

/// Debug and Release configurations over `base`, followed by the test runner
/// pair when `test_runner` is set.
#[must_use]
pub fn configurations(
    base: &SettingsMap,
    test_runner: bool,
    stub_directory: &Utf8Path,
) -> Vec<(String, SettingsMap)> {
    let mut configs: Vec<(String, SettingsMap)> = BuildConfig::ALL
        .iter()
        .map(|config| (config.name().to_owned(), variant_settings(base, *config)))
        .collect();
    if test_runner {
        configs.extend(BuildConfig::ALL.iter().map(|config| {
            (
                format!("{TEST_RUNNER_PREFIX}{}", config.name()),
                test_runner_settings(&variant_settings(base, *config), stub_directory),
            )
        }));
    }
    configs
}

fn variant_settings(base: &SettingsMap, config: BuildConfig) -> SettingsMap {
    let mut settings = base.clone();
    let format = match config {
        BuildConfig::Debug => "dwarf",
        BuildConfig::Release => "dwarf-with-dsym",
    };
    settings
        .entry("DEBUG_INFORMATION_FORMAT".to_owned())
        .or_insert_with(|| format.into());
    settings
}

/// Layer the compiler stubs over a Debug or Release configuration.
#[must_use]
pub fn test_runner_settings(base: &SettingsMap, stub_directory: &Utf8Path) -> SettingsMap {
    let mut settings = base.clone();
    let stub = |tool: &str| stub_directory.join(tool).into_string();
    put(&mut settings, "CC", &stub("clang_stub.sh"));
    put(&mut settings, "LD", &stub("ld_stub.sh"));
    put(&mut settings, "SWIFT_EXEC", &stub("swiftc_stub.py"));
    for key in ["OTHER_CFLAGS", "OTHER_LDFLAGS", "OTHER_SWIFT_FLAGS"] {
        settings.insert(key.to_owned(), SettingValue::List(vec![NO_OP_FLAG.to_owned()]));
    }
    put(&mut settings, "ONLY_ACTIVE_ARCH", "YES");
    put(&mut settings, "HEADER_SEARCH_PATHS", "");
    put(&mut settings, "FRAMEWORK_SEARCH_PATHS", "");
    settings
}

fn put(settings: &mut SettingsMap, key: &str, value: &str) {
    settings.insert(key.to_owned(), value.into());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::BuildLabel;
    use crate::report::Report;
    use crate::rule_entry::ExtractionRecord;
    use rstest::rstest;

    fn entry(rule_type: &str) -> RuleEntry {
        let record = ExtractionRecord {
            label: "//tests:Tests".into(),
            rule_type: rule_type.into(),
            generated_files: Some(Vec::new()),
            ..ExtractionRecord::default()
        };
        RuleEntry::from_record(&record, &mut Report::default()).expect("entry")
    }

    fn text(settings: &SettingsMap, key: &str) -> Option<String> {
        match settings.get(key) {
            Some(SettingValue::Text(value)) => Some(value.clone()),
            _ => None,
        }
    }

    #[rstest]
    #[case(PlatformType::Ios, "$(BUILT_PRODUCTS_DIR)/Host.app/Host")]
    #[case(PlatformType::Macos, "$(BUILT_PRODUCTS_DIR)/Host.app/Contents/MacOS/Host")]
    fn loader_style_links_through_bundle_loader(
        #[case] platform: PlatformType,
        #[case] expected: &str,
    ) {
        let test = entry("ios_unit_test");
        let link = HostLink::for_test(&test, "Host", platform);
        let settings = buildable_settings(&test, "Tests", PlatformType::Ios, link.as_ref());
        assert_eq!(text(&settings, "BUNDLE_LOADER").as_deref(), Some("$(TEST_HOST)"));
        assert_eq!(text(&settings, "TEST_HOST").as_deref(), Some(expected));
        assert!(!settings.contains_key("TEST_TARGET_NAME"));
    }

    #[rstest]
    fn target_name_style_names_the_host() {
        let test = entry("ios_ui_test");
        let link = HostLink::for_test(&test, "Host", PlatformType::Ios);
        let settings = buildable_settings(&test, "Tests", PlatformType::Ios, link.as_ref());
        assert_eq!(text(&settings, "TEST_TARGET_NAME").as_deref(), Some("Host"));
        assert!(!settings.contains_key("BUNDLE_LOADER"));
        assert!(!settings.contains_key("TEST_HOST"));
    }

    #[rstest]
    fn test_runner_configurations_override_tools() {
        let base = platform_settings(PlatformType::Ios, Some("15.0"));
        let configs = configurations(&base, true, Utf8Path::new("/stubs"));
        let names: Vec<&str> = configs.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(
            names,
            ["Debug", "Release", "__TestRunner_Debug", "__TestRunner_Release"]
        );
        let runner = configs
            .iter()
            .find(|(name, _)| name == "__TestRunner_Release")
            .map(|(_, settings)| settings)
            .expect("runner config");
        assert_eq!(text(runner, "CC").as_deref(), Some("/stubs/clang_stub.sh"));
        assert_eq!(text(runner, "ONLY_ACTIVE_ARCH").as_deref(), Some("YES"));
        assert_eq!(text(runner, "HEADER_SEARCH_PATHS").as_deref(), Some(""));
        assert_eq!(
            text(runner, "DEBUG_INFORMATION_FORMAT").as_deref(),
            Some("dwarf-with-dsym")
        );
        assert_eq!(
            text(runner, "IPHONEOS_DEPLOYMENT_TARGET").as_deref(),
            Some("15.0")
        );
        assert_eq!(
            runner.get("OTHER_SWIFT_FLAGS"),
            Some(&SettingValue::List(vec!["--version".into()]))
        );
    }

    #[rstest]
    fn optional_metadata_is_omitted_when_absent() {
        let mut app = entry("ios_application");
        app.secondary_artifact = BuildLabel::parse("//app:App.ipa").ok();
        let settings = buildable_settings(&app, "App", PlatformType::Ios, None);
        assert_eq!(
            text(&settings, "BAZEL_SECONDARY_ARTIFACT").as_deref(),
            Some("//app:App.ipa")
        );
        assert!(!settings.contains_key("PRODUCT_BUNDLE_IDENTIFIER"));
        assert!(!settings.contains_key("BAZEL_EXTENSION_POINT"));
        assert_eq!(text(&settings, "BAZEL_BUILD_PATH").as_deref(), Some("tests"));
    }
}
