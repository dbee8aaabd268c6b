#![allow(
    clippy::expect_used,
    reason = "generator tests use expect for descriptive failures"
)]

//! End-to-end tests of target generation over small rule graphs.

use rstest::rstest;
use serde_json::json;
use test_support::{RecordBuilder, label, options};
use xcbazel::generator::indexer::MAX_NAME_LENGTH;
use xcbazel::generator::{CLEAN_TARGET_NAME, GenerateError, GeneratedProject, ProjectGenerator};
use xcbazel::project::{ProjectGraph, SettingValue, TargetKind};
use xcbazel::report::{Report, Warning};
use xcbazel::rule_entry::ExtractionRecord;
use xcbazel::rule_entry_map::RuleEntryMap;
use xcbazel::settings::{FlagStrings, GeneratorOptions};

fn run(records: &[ExtractionRecord], options: &GeneratorOptions) -> GeneratedProject {
    let mut report = Report::default();
    let map = RuleEntryMap::from_records(records, &mut report);
    ProjectGenerator::new(options)
        .with_report(report)
        .generate(&map)
        .expect("generation succeeds")
}

fn indexers(graph: &ProjectGraph) -> Vec<String> {
    graph
        .targets()
        .filter(|(_, target)| target.name.starts_with("_idx_"))
        .map(|(_, target)| target.name.clone())
        .collect()
}

fn text<'a>(graph: &'a ProjectGraph, target: &str, config: &str, key: &str) -> Option<&'a str> {
    let id = graph.find_target(target)?;
    match graph.target_settings(id, config)?.get(key)? {
        SettingValue::Text(value) => Some(value.as_str()),
        SettingValue::List(_) => None,
    }
}

#[rstest]
fn application_and_library_scenario() {
    let records = [
        RecordBuilder::new("//app:App", "ios_application")
            .dep("//lib:Lib")
            .srcs(["app/main.m"])
            .build(),
        RecordBuilder::new("//lib:Lib", "objc_library")
            .srcs(["lib/lib.m"])
            .build(),
    ];
    let project = run(&records, &options("Demo", &["//app:App", "//lib:Lib"]));
    let graph = &project.graph;

    let clean = graph.find_target(CLEAN_TARGET_NAME).expect("clean target");
    assert!(matches!(
        graph.target(clean).map(|t| &t.kind),
        Some(TargetKind::Legacy { build_arguments, .. }) if build_arguments == "clean"
    ));
    let buildable: Vec<_> = graph
        .targets()
        .filter(|(id, target)| *id != clean && !target.name.starts_with("_idx_"))
        .collect();
    assert_eq!(buildable.len(), 2);
    for (id, _) in &buildable {
        assert!(graph.target_dependencies(*id).contains(&clean));
        let names: Vec<String> = graph
            .target_configurations(*id)
            .iter()
            .map(|config| config.name.clone())
            .collect();
        assert_eq!(names, ["Debug", "Release"]);
    }
    let runner_configs = graph
        .targets()
        .flat_map(|(id, _)| graph.target_configurations(id))
        .filter(|config| config.name.starts_with("__TestRunner_"))
        .count();
    assert_eq!(runner_configs, 0);
    assert!(project.report.is_empty(), "{:?}", project.report);
}

#[rstest]
#[case("ios_application", "$(BUILT_PRODUCTS_DIR)/Host.app/Host")]
#[case("macos_application", "$(BUILT_PRODUCTS_DIR)/Host.app/Contents/MacOS/Host")]
fn unit_tests_link_through_the_bundle_loader(#[case] host_rule: &str, #[case] test_host: &str) {
    let records = [
        RecordBuilder::new("//app:Host", host_rule).build(),
        RecordBuilder::new("//app:HostTests", "ios_unit_test")
            .test_host("//app:Host")
            .build(),
    ];
    let project = run(&records, &options("Demo", &["//app:HostTests"]));
    let graph = &project.graph;
    assert_eq!(
        text(graph, "HostTests", "Debug", "BUNDLE_LOADER"),
        Some("$(TEST_HOST)")
    );
    assert_eq!(text(graph, "HostTests", "Release", "TEST_HOST"), Some(test_host));
    let tests = graph.find_target("HostTests").expect("tests");
    let host = graph.find_target("Host").expect("host");
    assert!(graph.target_dependencies(tests).contains(&host));
    for target in ["HostTests", "Host"] {
        assert_eq!(
            text(graph, target, "__TestRunner_Debug", "ONLY_ACTIVE_ARCH"),
            Some("YES")
        );
    }
}

#[rstest]
fn ui_tests_name_their_host() {
    let records = [
        RecordBuilder::new("//app:Host", "ios_application").build(),
        RecordBuilder::new("//app:UITests", "ios_ui_test")
            .test_host("//app:Host")
            .build(),
    ];
    let project = run(&records, &options("Demo", &["//app:UITests"]));
    let graph = &project.graph;
    assert_eq!(
        text(graph, "UITests", "Debug", "TEST_TARGET_NAME"),
        Some("Host")
    );
    assert_eq!(text(graph, "UITests", "Debug", "BUNDLE_LOADER"), None);
}

#[rstest]
fn colliding_target_names_are_qualified() {
    let records = [
        RecordBuilder::new("//ios/app:App", "ios_application").build(),
        RecordBuilder::new("//mac/app:App", "macos_application").build(),
    ];
    let project = run(
        &records,
        &options("Demo", &["//ios/app:App", "//mac/app:App"]),
    );
    let graph = &project.graph;
    assert!(graph.find_target("ios-app-App").is_some());
    assert!(graph.find_target("mac-app-App").is_some());
    assert!(graph.find_target("App").is_none());
}

#[rstest]
fn compatible_indexers_merge() {
    let records = [
        RecordBuilder::new("//app:App", "ios_application")
            .dep("//a:A")
            .dep("//b:B")
            .dep("//c:C")
            .build(),
        RecordBuilder::new("//a:A", "objc_library")
            .srcs(["a/a.m"])
            .build(),
        RecordBuilder::new("//b:B", "objc_library")
            .srcs(["b/b.m"])
            .build(),
        RecordBuilder::new("//c:C", "objc_library")
            .srcs(["c/c.m"])
            .attribute("pch", json!("c/Prefix.pch"))
            .build(),
    ];
    let project = run(&records, &options("Demo", &["//app:App"]));
    let graph = &project.graph;
    let names = indexers(graph);
    assert_eq!(names.len(), 2, "{names:?}");
    let merged = names
        .iter()
        .find(|name| name.starts_with("_idx_A_B_"))
        .expect("A and B share an indexer");
    let id = graph.find_target(merged).expect("merged indexer");
    let files: Vec<String> = graph
        .compiled_files(id)
        .into_iter()
        .map(|(file, _)| file)
        .collect();
    assert_eq!(files, ["a.m", "b.m"]);
    let prefixed = names
        .iter()
        .find(|name| name.starts_with("_idx_C_"))
        .expect("C keeps its own indexer");
    assert_eq!(
        text(graph, prefixed, "Debug", "GCC_PREFIX_HEADER"),
        Some("$(BAZEL_WORKSPACE_ROOT)/c/Prefix.pch")
    );
}

#[rstest]
fn merged_indexer_names_stay_bounded() {
    let width = 40;
    let libraries: Vec<String> = (0..20)
        .map(|i| format!("//lib{i}:Library{i}{}", "x".repeat(width)))
        .collect();
    let mut app = RecordBuilder::new("//app:App", "ios_application");
    for library in &libraries {
        app = app.dep(library);
    }
    let mut records = vec![app.build()];
    records.extend(libraries.iter().enumerate().map(|(i, library)| {
        RecordBuilder::new(library, "objc_library")
            .srcs([format!("lib{i}/source.m")])
            .build()
    }));
    let project = run(&records, &options("Demo", &["//app:App"]));
    let names = indexers(&project.graph);
    assert_eq!(names.len(), 1, "{names:?}");
    let name = names.first().expect("one indexer");
    assert!(name.len() <= MAX_NAME_LENGTH, "{} bytes", name.len());
    assert!(name.contains("_18_more_"), "{name}");
}

#[rstest]
fn non_arc_sources_carry_the_flag() {
    let records = [RecordBuilder::new("//lib:Lib", "objc_library")
        .srcs(["lib/arc.m", "lib/mrc.m"])
        .non_arc(["lib/mrc.m"])
        .build()];
    let project = run(&records, &options("Demo", &["//lib:Lib"]));
    let graph = &project.graph;
    let name = indexers(graph).into_iter().next().expect("indexer");
    let id = graph.find_target(&name).expect("indexer target");
    assert_eq!(
        graph.compiled_files(id),
        [
            ("arc.m".to_owned(), None),
            ("mrc.m".to_owned(), Some("-fno-objc-arc".to_owned())),
        ]
    );
}

#[rstest]
fn filtered_sources_and_build_files_are_left_out() {
    let records = [
        RecordBuilder::new("//app:App", "ios_application")
            .dep("//app/sub:Sub")
            .srcs(["app/main.m"])
            .build_file("app/BUILD")
            .build(),
        RecordBuilder::new("//app/sub:Sub", "objc_library")
            .srcs(["app/sub/sub.m"])
            .build_file("app/sub/BUILD")
            .build(),
    ];
    let mut options = options("Demo", &["//app:App"]);
    options.path_filters = vec!["app".to_owned()];
    let project = run(&records, &options);
    let graph = &project.graph;
    let indexed: Vec<String> = indexers(graph)
        .iter()
        .filter_map(|name| graph.find_target(name))
        .flat_map(|id| graph.compiled_files(id))
        .map(|(file, _)| file)
        .collect();
    assert_eq!(indexed, ["main.m"]);
    let text = String::from_utf8(project.pbxproj).expect("utf-8");
    assert!(text.contains("path = BUILD;"));
    assert_eq!(text.matches("path = BUILD;").count(), 1);
}

#[rstest]
fn unresolved_roots_abort_with_every_label() {
    let records = [RecordBuilder::new("//app:App", "ios_application").build()];
    let map = RuleEntryMap::from_records(&records, &mut Report::default());
    let options = options("Demo", &["//gone:A", "//app:App", "//gone:B"]);
    let err = ProjectGenerator::new(&options)
        .generate(&map)
        .expect_err("unresolved roots");
    match err {
        GenerateError::UnresolvedRoots { labels } => {
            assert_eq!(labels, [label("//gone:A"), label("//gone:B")]);
        }
        GenerateError::Serialize(other) => panic!("unexpected error: {other}"),
    }
}

fn rendered_line<'a>(settings: &'a str, key: &str) -> &'a str {
    let prefix = format!("{key} = ");
    settings
        .lines()
        .find_map(|line| line.strip_prefix(prefix.as_str()))
        .unwrap_or_else(|| panic!("{key} missing from:\n{settings}"))
}

#[rstest]
fn rendered_target_flags_follow_layer_order() {
    let records = [
        RecordBuilder::new("//app:App", "ios_application")
            .dep("//lib:Lib")
            .build(),
        RecordBuilder::new("//lib:Lib", "objc_library")
            .srcs(["lib/lib.m"])
            .build(),
    ];
    let mut options = options("Demo", &["//app:App", "//lib:Lib"]);
    options.project_default_flags = FlagStrings {
        build: "--project_default".to_owned(),
        ..FlagStrings::default()
    };
    options.target_overrides.insert(
        label("//app:App"),
        FlagStrings {
            release_build: "--app_override".to_owned(),
            ..FlagStrings::default()
        },
    );
    let project = run(&records, &options);
    let settings = String::from_utf8(project.build_settings).expect("utf-8");

    let app = rendered_line(&settings, "target.//app:App.release");
    let layers = [
        "--announce_rc",
        "--show_result=0",
        "--compilation_mode=opt",
        "--features=-swift.use_global_module_cache",
        "--project_default",
        "--app_override",
        "--cpu=ios_sim_arm64",
    ];
    let positions: Vec<usize> = layers
        .iter()
        .map(|flag| app.find(*flag).unwrap_or_else(|| panic!("{flag} missing from {app}")))
        .collect();
    assert!(positions.windows(2).all(|w| w.first() < w.get(1)), "{app}");

    let lib = rendered_line(&settings, "target.//lib:Lib.release");
    assert!(!lib.contains("--app_override"), "{lib}");
    let debug = rendered_line(&settings, "target.//app:App.debug");
    assert!(debug.contains("--compilation_mode=dbg"), "{debug}");
    assert!(!debug.contains("--app_override"), "{debug}");
}

#[rstest]
#[case("//gone:Bridge", None)]
#[case("//hdr:Bridge", Some("$(BAZEL_WORKSPACE_ROOT)/hdr/Bridge.h"))]
fn bridging_header_labels_resolve_or_warn(#[case] header: &str, #[case] expected: Option<&str>) {
    let records = [
        RecordBuilder::new("//lib:Lib", "swift_library")
            .srcs(["lib/lib.swift"])
            .attribute("bridging_header", json!(header))
            .build(),
        RecordBuilder::new("//hdr:Bridge", "objc_library")
            .srcs(["hdr/Bridge.h"])
            .build(),
    ];
    let project = run(&records, &options("Demo", &["//lib:Lib"]));
    let graph = &project.graph;
    let name = indexers(graph).into_iter().next().expect("indexer");
    assert_eq!(
        text(graph, &name, "Debug", "SWIFT_OBJC_BRIDGING_HEADER"),
        expected
    );
    let warned = project.report.with_key("missing_bridging_header").count();
    assert_eq!(warned, usize::from(expected.is_none()), "{:?}", project.report);
}

#[rstest]
fn dependency_cycles_are_reported_once_in_canonical_order() {
    let records = [
        RecordBuilder::new("//app:App", "ios_application")
            .dep("//b:B")
            .build(),
        RecordBuilder::new("//b:B", "objc_library")
            .srcs(["b/b.m"])
            .dep("//a:A")
            .build(),
        RecordBuilder::new("//a:A", "objc_library")
            .srcs(["a/a.m"])
            .dep("//b:B")
            .build(),
    ];
    let project = run(&records, &options("Demo", &["//app:App"]));
    let cycles: Vec<&Warning> = project.report.with_key("dependency_cycle").collect();
    assert_eq!(
        cycles,
        [&Warning::DependencyCycle {
            cycle: vec![label("//a:A"), label("//b:B"), label("//a:A")],
        }]
    );
    assert!(project.graph.find_target("App").is_some());
}
