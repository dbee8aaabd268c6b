//! Target generation.
//!
//! [`ProjectGenerator::generate`] turns the rule entry map and the caller's
//! options into a [`ProjectGraph`] and serializes it. The pass runs in a
//! fixed order:
//!
//! 1. resolve the roots, expanding test suites and dropping ignored rules;
//! 2. plan the buildable set, pulling in test hosts and extensions;
//! 3. name the targets and compose the Bazel settings;
//! 4. emit the clean target, the buildable targets, and their edges;
//! 5. emit indexer targets for everything reachable;
//! 6. add the project-level configurations and serialize.
//!
//! Only unresolvable roots abort generation. Everything else degrades into
//! a [`Warning`] on the returned [`Report`].

// Scoped suppression for version-dependent lint false positives from
// miette/thiserror derive macros.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

pub mod build_phase;
pub mod indexer;
pub mod naming;
pub mod path_filter;
pub mod product;
pub mod target_settings;

use std::collections::{BTreeMap, BTreeSet, HashSet};

use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use miette::Diagnostic;
use thiserror::Error;

use crate::flags::BuildConfig;
use crate::label::BuildLabel;
use crate::project::{ObjectId, ProjectGraph, SettingsMap, Target, TargetKind, file_type};
use crate::report::{Report, Warning};
use crate::rule_entry::RuleEntry;
use crate::rule_entry_map::RuleEntryMap;
use crate::serializer::{self, GidGenerator, SerializeError};
use crate::settings::{BuildSettings, GeneratorOptions, PlatformType};

use indexer::{IndexerData, NON_ARC_FLAG};
use path_filter::PathFilter;
use product::ProductType;
use target_settings::HostLink;

/// Name of the legacy target running `bazel clean`.
pub const CLEAN_TARGET_NAME: &str = "_bazel_clean_";
/// Suffix of watch application placeholder targets.
pub const WATCH_STUB_SUFFIX: &str = "_WatchStub";
const WATCH_STUB_PRODUCT_TYPE: &str = "com.apple.product-type.application.watchapp2-container";
const DEFAULT_CONFIGURATION: &str = "Release";

/// Rules that never become buildable or indexer targets.
const IGNORED_RULE_TYPES: [&str; 4] = ["filegroup", "config_setting", "alias", "test_suite"];

/// Errors that abort generation.
#[derive(Debug, Error, Diagnostic)]
pub enum GenerateError {
    /// Root labels missing from the rule entry map.
    #[error("unresolved root labels: {}", join_labels(.labels))]
    #[diagnostic(
        code(xcbazel::generator::unresolved_roots),
        help("re-run extraction so every selected root has a record")
    )]
    UnresolvedRoots {
        /// Every root without an entry, in request order.
        labels: Vec<BuildLabel>,
    },
    /// The finished graph could not be written.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Serialize(#[from] SerializeError),
}

/// Output of one generation pass.
#[derive(Debug)]
pub struct GeneratedProject {
    /// `project.pbxproj` contents.
    pub pbxproj: Vec<u8>,
    /// JSON identifier table.
    pub object_table: Vec<u8>,
    /// Rendered Bazel settings for the build wrapper.
    pub build_settings: Vec<u8>,
    /// The object graph the files were written from.
    pub graph: ProjectGraph,
    /// Warnings collected during the pass.
    pub report: Report,
}

fn join_labels(labels: &[BuildLabel]) -> String {
    labels.iter().map(BuildLabel::as_str).join(", ")
}

fn is_ignored(entry: &RuleEntry) -> bool {
    IGNORED_RULE_TYPES.contains(&entry.rule_type.as_str())
}

fn platform_of(entry: &RuleEntry) -> Option<PlatformType> {
    entry.platform_type.as_deref().and_then(PlatformType::from_name)
}

/// Builds one project from a rule entry map.
#[derive(Debug)]
pub struct ProjectGenerator<'o> {
    options: &'o GeneratorOptions,
    report: Report,
}

/// Buildable targets keyed by label, with the names they were given.
struct Plan<'a> {
    entries: IndexMap<BuildLabel, &'a RuleEntry>,
    names: BTreeMap<BuildLabel, String>,
    /// Tests and their hosts; these carry test runner configurations.
    test_runner: BTreeSet<BuildLabel>,
}

impl<'o> ProjectGenerator<'o> {
    /// Generator over `options` with an empty report.
    #[must_use]
    pub fn new(options: &'o GeneratorOptions) -> Self {
        Self {
            options,
            report: Report::default(),
        }
    }

    /// Continue an existing report, e.g. the one filled while building the
    /// rule entry map.
    #[must_use]
    pub fn with_report(mut self, report: Report) -> Self {
        self.report = report;
        self
    }

    /// Run the generation pass.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::UnresolvedRoots`] listing every root without
    /// an entry, and [`GenerateError::Serialize`] when the graph cannot be
    /// written.
    pub fn generate(mut self, map: &RuleEntryMap) -> Result<GeneratedProject, GenerateError> {
        let options = self.options;
        let roots = self.resolve_roots(map)?;
        let plan = self.plan(map, &roots);

        let planned: Vec<&RuleEntry> = plan.entries.values().copied().collect();
        let reachable = map.reachable(&planned);
        for cycle in &reachable.cycles {
            self.report.warn(Warning::DependencyCycle {
                cycle: cycle.clone(),
            });
        }

        let swift_targets = Self::swift_targets(options, map, &planned);
        let default_platform = planned
            .first()
            .and_then(|entry| platform_of(entry))
            .unwrap_or(PlatformType::Ios);
        let target_platforms: BTreeMap<BuildLabel, PlatformType> = planned
            .iter()
            .map(|entry| {
                let platform = platform_of(entry).unwrap_or(default_platform);
                (entry.label.clone(), platform)
            })
            .collect();
        let settings = BuildSettings::compose(
            options,
            default_platform,
            &target_platforms,
            swift_targets,
            &mut self.report,
        );

        let mut graph = ProjectGraph::new(&options.project_name, options.workspace_root.as_str());
        let clean = Self::add_clean_target(&mut graph, options);
        let targets = self.add_buildable_targets(&mut graph, &plan, clean, default_platform);
        self.link_targets(&mut graph, map, &plan, &targets, clean, default_platform);

        let filter = PathFilter::new(&options.path_filters);
        let indexers = self.add_indexers(
            &mut graph,
            map,
            &plan,
            &reachable.entries,
            &filter,
            default_platform,
        );
        for build_file in reachable
            .entries
            .iter()
            .filter_map(|entry| entry.build_file.as_deref())
            .filter(|path| filter.accepts_file(path))
        {
            graph.add_file_reference(build_file, false);
        }

        Self::add_project_configurations(&mut graph, options, &plan, default_platform);
        graph.sort_groups();

        let mut gids = GidGenerator::new(&options.project_name);
        let serialized = serializer::serialize(&graph, &mut gids)?;
        tracing::info!(
            project = %options.project_name,
            buildable = targets.len(),
            indexers,
            missing_dependencies = reachable.missing_dependencies.len(),
            objects = gids.len(),
            warnings = self.report.warnings().len(),
            "generated project"
        );
        Ok(GeneratedProject {
            pbxproj: serialized.pbxproj,
            object_table: serialized.object_table,
            build_settings: settings.render().into_bytes(),
            graph,
            report: self.report,
        })
    }

    /// Deduplicated root entries with test suites expanded and ignored
    /// rules removed.
    fn resolve_roots<'a>(&self, map: &'a RuleEntryMap) -> Result<Vec<&'a RuleEntry>, GenerateError> {
        let requested: IndexSet<&BuildLabel> = self.options.roots.iter().collect();
        let resolution = map.resolve(requested);
        if !resolution.unresolved.is_empty() {
            return Err(GenerateError::UnresolvedRoots {
                labels: resolution.unresolved,
            });
        }
        let mut seen = HashSet::new();
        let mut roots = Vec::new();
        for entry in resolution.resolved {
            expand_suite(map, entry, &mut seen, &mut roots);
        }
        Ok(roots)
    }

    /// Roots first, then their test hosts and extensions, transitively.
    fn plan<'a>(&mut self, map: &'a RuleEntryMap, roots: &[&'a RuleEntry]) -> Plan<'a> {
        let mut entries: IndexMap<BuildLabel, &'a RuleEntry> = roots
            .iter()
            .map(|entry| (entry.label.clone(), *entry))
            .collect();
        let mut next = 0;
        while let Some((_, &entry)) = entries.get_index(next) {
            next += 1;
            if let Some(host) = entry.test_host.as_ref().and_then(|host| map.get(host))
                && !is_ignored(host)
            {
                entries.entry(host.label.clone()).or_insert(host);
            }
            for label in &entry.extensions {
                let Some(extension) = map.get(label) else {
                    self.report.warn(Warning::MissingExtension {
                        host: entry.label.clone(),
                        extension: label.clone(),
                    });
                    continue;
                };
                if entries.contains_key(label) {
                    continue;
                }
                self.check_extension(extension);
                entries.insert(label.clone(), extension);
            }
        }

        let names = naming::target_names(entries.keys());
        let test_runner = entries
            .values()
            .filter(|entry| entry.is_test())
            .flat_map(|entry| {
                std::iter::once(entry.label.clone()).chain(
                    entry
                        .test_host
                        .iter()
                        .filter(|host| entries.contains_key(*host))
                        .cloned(),
                )
            })
            .collect();
        tracing::debug!(buildable = entries.len(), "planned buildable targets");
        Plan {
            entries,
            names,
            test_runner,
        }
    }

    fn check_extension(&mut self, extension: &RuleEntry) {
        if extension.bundle_id.is_none() {
            self.report.warn(Warning::MissingBundleIdentifier {
                label: extension.label.clone(),
            });
        }
        if ProductType::from_rule_type(&extension.rule_type).is_extension()
            && extension.extension_point_identifier.is_none()
        {
            self.report.warn(Warning::AmbiguousBundleExtension {
                label: extension.label.clone(),
            });
        }
    }

    fn swift_targets(
        options: &GeneratorOptions,
        map: &RuleEntryMap,
        planned: &[&RuleEntry],
    ) -> BTreeSet<BuildLabel> {
        match options.swift_dependency_hint {
            Some(true) => planned.iter().map(|entry| entry.label.clone()).collect(),
            Some(false) => BTreeSet::new(),
            None => planned
                .iter()
                .filter(|entry| {
                    map.reachable(&[**entry])
                        .entries
                        .iter()
                        .any(|reached| reached.is_swift_bearing())
                })
                .map(|entry| entry.label.clone())
                .collect(),
        }
    }

    fn add_clean_target(graph: &mut ProjectGraph, options: &GeneratorOptions) -> ObjectId {
        let configurations = BuildConfig::ALL
            .iter()
            .map(|config| (config.name().to_owned(), SettingsMap::new()))
            .collect();
        let list = graph.add_configuration_list(configurations, DEFAULT_CONFIGURATION);
        graph.add_target(Target {
            name: CLEAN_TARGET_NAME.to_owned(),
            product_name: CLEAN_TARGET_NAME.to_owned(),
            kind: TargetKind::Legacy {
                build_tool_path: options.bazel_path.to_string(),
                build_arguments: "clean".to_owned(),
                build_working_directory: options.workspace_root.to_string(),
                pass_build_settings_in_environment: true,
            },
            build_configuration_list: list,
            build_phases: Vec::new(),
            dependencies: Vec::new(),
        })
    }

    fn add_buildable_targets(
        &mut self,
        graph: &mut ProjectGraph,
        plan: &Plan<'_>,
        clean: ObjectId,
        default_platform: PlatformType,
    ) -> BTreeMap<BuildLabel, ObjectId> {
        let mut targets = BTreeMap::new();
        for (label, entry) in &plan.entries {
            let Some(name) = plan.names.get(label) else {
                continue;
            };
            let platform = platform_of(entry).unwrap_or(default_platform);
            let host = self.host_link(plan, entry, default_platform);
            let settings = target_settings::buildable_settings(entry, name, platform, host.as_ref());
            let configurations = target_settings::configurations(
                &settings,
                plan.test_runner.contains(label),
                &self.options.stub_directory,
            );
            let list = graph.add_configuration_list(configurations, DEFAULT_CONFIGURATION);
            let product = ProductType::from_rule_type(&entry.rule_type);
            let product_reference = graph.add_product_reference(&product.file_name(name));
            let target = graph.add_target(Target {
                name: name.clone(),
                product_name: name.clone(),
                kind: TargetKind::Native {
                    product_type: product.identifier().to_owned(),
                    product_reference: Some(product_reference),
                },
                build_configuration_list: list,
                build_phases: Vec::new(),
                dependencies: Vec::new(),
            });
            graph.add_shell_script_phase(target, build_phase::bazel_build_phase(self.options, label));
            graph.add_dependency(target, clean);
            targets.insert(label.clone(), target);
        }
        targets
    }

    /// Host linkage of a test, or `None` with a warning when the host was
    /// not generated.
    fn host_link(
        &mut self,
        plan: &Plan<'_>,
        entry: &RuleEntry,
        default_platform: PlatformType,
    ) -> Option<HostLink> {
        let host = entry.test_host.as_ref()?;
        let (Some(host_entry), Some(host_name)) = (plan.entries.get(host), plan.names.get(host))
        else {
            self.report.warn(Warning::MissingTestHost {
                test: entry.label.clone(),
                host: host.clone(),
            });
            return None;
        };
        let host_platform = platform_of(host_entry).unwrap_or(default_platform);
        HostLink::for_test(entry, host_name, host_platform)
    }

    fn link_targets(
        &self,
        graph: &mut ProjectGraph,
        map: &RuleEntryMap,
        plan: &Plan<'_>,
        targets: &BTreeMap<BuildLabel, ObjectId>,
        clean: ObjectId,
        default_platform: PlatformType,
    ) {
        for (label, entry) in &plan.entries {
            let Some(&target) = targets.get(label) else {
                continue;
            };
            if let Some(&host) = entry.test_host.as_ref().and_then(|host| targets.get(host)) {
                graph.add_dependency(target, host);
            }
            for extension in &entry.extensions {
                let Some(&extension_target) = targets.get(extension) else {
                    continue;
                };
                graph.add_dependency(target, extension_target);
                let is_watch_app = map
                    .get(extension)
                    .is_some_and(|ext| ext.rule_type == "watchos_application");
                if let Some(name) = plan.names.get(extension)
                    && is_watch_app
                {
                    let platform = platform_of(entry).unwrap_or(default_platform);
                    let stub = self.add_watch_stub(graph, name, platform);
                    graph.add_dependency(target, stub);
                    graph.add_dependency(stub, clean);
                }
            }
        }
    }

    /// Placeholder container for a watch application; it has no phases.
    fn add_watch_stub(&self, graph: &mut ProjectGraph, watch_name: &str, platform: PlatformType) -> ObjectId {
        let name = format!("{watch_name}{WATCH_STUB_SUFFIX}");
        if let Some(existing) = graph.find_target(&name) {
            return existing;
        }
        let mut settings = target_settings::platform_settings(platform, None);
        settings.insert("PRODUCT_NAME".to_owned(), name.as_str().into());
        let configurations =
            target_settings::configurations(&settings, false, &self.options.stub_directory);
        let list = graph.add_configuration_list(configurations, DEFAULT_CONFIGURATION);
        graph.add_target(Target {
            product_name: name.clone(),
            name,
            kind: TargetKind::Native {
                product_type: WATCH_STUB_PRODUCT_TYPE.to_owned(),
                product_reference: None,
            },
            build_configuration_list: list,
            build_phases: Vec::new(),
            dependencies: Vec::new(),
        })
    }

    /// Emit merged indexer targets; returns how many were created.
    fn add_indexers(
        &mut self,
        graph: &mut ProjectGraph,
        map: &RuleEntryMap,
        plan: &Plan<'_>,
        reachable: &[&RuleEntry],
        filter: &PathFilter,
        default_platform: PlatformType,
    ) -> usize {
        let collected: Vec<IndexerData> = reachable
            .iter()
            .filter(|entry| !is_ignored(entry))
            .filter_map(|entry| {
                let name = plan
                    .names
                    .get(&entry.label)
                    .cloned()
                    .unwrap_or_else(|| naming::base_name(&entry.label));
                IndexerData::from_entry(entry, name, filter, map, &mut self.report)
            })
            .collect();
        let merged = indexer::merge(collected);
        for data in &merged {
            let name = data.target_name();
            let mut settings = data.settings.clone();
            settings.insert("PRODUCT_NAME".to_owned(), name.as_str().into());
            settings
                .entry("SDKROOT".to_owned())
                .or_insert_with(|| default_platform.sdk_root().into());
            let configurations =
                target_settings::configurations(&settings, false, &self.options.stub_directory);
            let list = graph.add_configuration_list(configurations, DEFAULT_CONFIGURATION);
            let target = graph.add_target(Target {
                product_name: name.clone(),
                name,
                kind: TargetKind::Native {
                    product_type: ProductType::StaticLibrary.identifier().to_owned(),
                    product_reference: None,
                },
                build_configuration_list: list,
                build_phases: Vec::new(),
                dependencies: Vec::new(),
            });
            let mut compiled = Vec::new();
            for source in &data.sources {
                let file = graph.add_file_reference(&source.path, source.generated);
                if file_type::is_compiled(&source.path) {
                    compiled.push((file, source.non_arc.then(|| NON_ARC_FLAG.to_owned())));
                }
            }
            graph.add_sources_phase(target, compiled);
        }
        merged.len()
    }

    fn add_project_configurations(
        graph: &mut ProjectGraph,
        options: &GeneratorOptions,
        plan: &Plan<'_>,
        default_platform: PlatformType,
    ) {
        let mut settings = target_settings::platform_settings(default_platform, None);
        let mut put = |key: &str, value: &str| {
            settings.insert(key.to_owned(), value.into());
        };
        put("BAZEL_WORKSPACE_ROOT", options.workspace_root.as_str());
        put("BAZEL_PATH", options.bazel_path.as_str());
        if let Some(exec_root) = &options.bazel_exec_root {
            put("BAZEL_EXEC_ROOT", exec_root.as_str());
        }
        put("ALWAYS_SEARCH_USER_PATHS", "NO");
        put("CODE_SIGNING_REQUIRED", "NO");
        put("CODE_SIGN_IDENTITY", "");
        put("ENABLE_TESTABILITY", "YES");
        let configurations = target_settings::configurations(
            &settings,
            !plan.test_runner.is_empty(),
            &options.stub_directory,
        );
        graph.add_project_configurations(configurations);
    }
}

/// Push `entry`, or the members of a test suite, onto `roots`.
fn expand_suite<'a>(
    map: &'a RuleEntryMap,
    entry: &'a RuleEntry,
    seen: &mut HashSet<BuildLabel>,
    roots: &mut Vec<&'a RuleEntry>,
) {
    if !seen.insert(entry.label.clone()) {
        return;
    }
    if entry.rule_type == "test_suite" {
        tracing::debug!(suite = %entry.label, members = entry.weak_dependencies.len(), "expanding test suite");
        for member in entry.weak_dependencies.iter().filter_map(|label| map.get(label)) {
            expand_suite(map, member, seen, roots);
        }
    } else if is_ignored(entry) {
        tracing::debug!(label = %entry.label, rule_type = %entry.rule_type, "ignoring root");
    } else {
        roots.push(entry);
    }
}
