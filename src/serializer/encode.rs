//! Flatten a [`ProjectGraph`] into an identifier table.
//!
//! Encoding walks from the project root in field order. An object receives
//! its identifier the first time any field refers to it and is encoded right
//! after, so the visit order alone decides every identifier.

use std::collections::{BTreeMap, HashSet};

use crate::project::{
    BuildConfiguration, BuildFile, ConfigurationList, ContainerItemProxy, FileReference, FileType,
    Group, ObjectId, PbxObject, Project, ProjectGraph, SettingValue, ShellScriptBuildPhase,
    SourcesBuildPhase, Target, TargetDependency, TargetKind, VersionGroup,
};

use super::gid::GidGenerator;
use super::value::PlistValue;

/// Value of `buildActionMask` on every phase.
const BUILD_ACTION_MASK: i64 = 2_147_483_647;
/// `proxyType` of a proxy naming a target in the same project.
const PROXY_TYPE_TARGET: i64 = 1;

type Dict = BTreeMap<String, PlistValue>;

pub(super) struct Encoder<'a> {
    graph: &'a ProjectGraph,
    gids: &'a mut GidGenerator,
    encoded: HashSet<ObjectId>,
    objects: Dict,
}

impl<'a> Encoder<'a> {
    pub(super) fn new(graph: &'a ProjectGraph, gids: &'a mut GidGenerator) -> Self {
        Self {
            graph,
            gids,
            encoded: HashSet::new(),
            objects: Dict::new(),
        }
    }

    /// Encode everything reachable from the root; returns the root
    /// identifier and the object table.
    pub(super) fn encode(mut self) -> (String, Dict) {
        let root = self.reference(self.graph.root());
        (root, self.objects)
    }

    /// Identifier of `id`, encoding the object on its first visit.
    fn reference(&mut self, id: ObjectId) -> String {
        let graph = self.graph;
        let (gid, _) = self.gids.visit(id);
        if self.encoded.insert(id) {
            if let Some(object) = graph.get(id) {
                let encoded = self.encode_object(object);
                self.objects.insert(gid.clone(), PlistValue::Dict(encoded));
            }
        }
        gid
    }

    fn references(&mut self, ids: &[ObjectId]) -> PlistValue {
        PlistValue::Array(
            ids.iter()
                .map(|id| PlistValue::String(self.reference(*id)))
                .collect(),
        )
    }

    fn encode_object(&mut self, object: &PbxObject) -> Dict {
        let mut dict = Dict::new();
        dict.insert("isa".to_owned(), object.isa().into());
        match object {
            PbxObject::Project(project) => self.project(project, &mut dict),
            PbxObject::Group(group) => self.group(group, &mut dict),
            PbxObject::FileReference(file) => file_reference(file, &mut dict),
            PbxObject::VersionGroup(group) => self.version_group(group, &mut dict),
            PbxObject::Target(target) => self.target(target, &mut dict),
            PbxObject::ConfigurationList(list) => self.configuration_list(list, &mut dict),
            PbxObject::BuildConfiguration(config) => build_configuration(config, &mut dict),
            PbxObject::SourcesBuildPhase(phase) => self.sources_phase(phase, &mut dict),
            PbxObject::ShellScriptBuildPhase(phase) => shell_phase(phase, &mut dict),
            PbxObject::BuildFile(file) => self.build_file(file, &mut dict),
            PbxObject::TargetDependency(dep) => self.target_dependency(dep, &mut dict),
            PbxObject::ContainerItemProxy(proxy) => self.proxy(proxy, &mut dict),
        }
        dict
    }

    fn project(&mut self, project: &Project, dict: &mut Dict) {
        let attributes: Dict = project
            .attributes
            .iter()
            .map(|(key, value)| (key.clone(), value.as_str().into()))
            .collect();
        put(dict, "attributes", attributes.into());
        put(
            dict,
            "buildConfigurationList",
            self.reference(project.build_configuration_list).into(),
        );
        put(dict, "compatibilityVersion", "Xcode 3.2".into());
        put(dict, "developmentRegion", "en".into());
        put(dict, "hasScannedForEncodings", PlistValue::Integer(0));
        put(dict, "knownRegions", vec!["en", "Base"].into());
        put(dict, "mainGroup", self.reference(project.main_group).into());
        put(dict, "productRefGroup", self.reference(project.products_group).into());
        put(dict, "projectDirPath", project.project_dir_path.as_str().into());
        put(dict, "projectRoot", "".into());
        let targets = self.references(&project.targets);
        put(dict, "targets", targets);
    }

    fn group(&mut self, group: &Group, dict: &mut Dict) {
        let children = self.references(&group.children);
        put(dict, "children", children);
        put_opt(dict, "name", group.name.as_deref());
        put_opt(dict, "path", group.path.as_deref());
        put_opt(dict, "sourceTree", group.source_tree.map(|tree| tree.as_str()));
    }

    fn version_group(&mut self, group: &VersionGroup, dict: &mut Dict) {
        let children = self.references(&group.children);
        put(dict, "children", children);
        if let Some(current) = group.current_version {
            put(dict, "currentVersion", self.reference(current).into());
        }
        put(dict, "path", group.path.as_str().into());
        put(dict, "sourceTree", "<group>".into());
        put(dict, "versionGroupType", group.version_group_type.as_str().into());
    }

    fn target(&mut self, target: &Target, dict: &mut Dict) {
        put(
            dict,
            "buildConfigurationList",
            self.reference(target.build_configuration_list).into(),
        );
        let phases = self.references(&target.build_phases);
        put(dict, "buildPhases", phases);
        let dependencies = self.references(&target.dependencies);
        put(dict, "dependencies", dependencies);
        put(dict, "name", target.name.as_str().into());
        put(dict, "productName", target.product_name.as_str().into());
        match &target.kind {
            TargetKind::Native {
                product_type,
                product_reference,
            } => {
                put(dict, "buildRules", PlistValue::Array(Vec::new()));
                if let Some(product) = product_reference {
                    put(dict, "productReference", self.reference(*product).into());
                }
                put(dict, "productType", product_type.as_str().into());
            }
            TargetKind::Legacy {
                build_tool_path,
                build_arguments,
                build_working_directory,
                pass_build_settings_in_environment,
            } => {
                put(dict, "buildArgumentsString", build_arguments.as_str().into());
                put(dict, "buildToolPath", build_tool_path.as_str().into());
                put(
                    dict,
                    "buildWorkingDirectory",
                    build_working_directory.as_str().into(),
                );
                put(
                    dict,
                    "passBuildSettingsInEnvironment",
                    (*pass_build_settings_in_environment).into(),
                );
            }
            TargetKind::Aggregate => {}
        }
    }

    fn configuration_list(&mut self, list: &ConfigurationList, dict: &mut Dict) {
        let configurations = self.references(&list.configurations);
        put(dict, "buildConfigurations", configurations);
        put(dict, "defaultConfigurationIsVisible", PlistValue::Integer(0));
        put(
            dict,
            "defaultConfigurationName",
            list.default_configuration_name.as_str().into(),
        );
    }

    fn sources_phase(&mut self, phase: &SourcesBuildPhase, dict: &mut Dict) {
        put(dict, "buildActionMask", BUILD_ACTION_MASK.into());
        let files = self.references(&phase.files);
        put(dict, "files", files);
        put(dict, "runOnlyForDeploymentPostprocessing", PlistValue::Integer(0));
    }

    fn build_file(&mut self, file: &BuildFile, dict: &mut Dict) {
        put(dict, "fileRef", self.reference(file.file_ref).into());
        if let Some(flags) = &file.compiler_flags {
            let settings: Dict = [("COMPILER_FLAGS".to_owned(), flags.as_str().into())]
                .into_iter()
                .collect();
            put(dict, "settings", settings.into());
        }
    }

    fn target_dependency(&mut self, dep: &TargetDependency, dict: &mut Dict) {
        put(dict, "target", self.reference(dep.target).into());
        put(dict, "targetProxy", self.reference(dep.target_proxy).into());
    }

    fn proxy(&mut self, proxy: &ContainerItemProxy, dict: &mut Dict) {
        put(dict, "containerPortal", self.reference(proxy.container_portal).into());
        put(dict, "proxyType", PROXY_TYPE_TARGET.into());
        put(
            dict,
            "remoteGlobalIDString",
            self.reference(proxy.remote_global_id).into(),
        );
        put(dict, "remoteInfo", proxy.remote_info.as_str().into());
    }
}

fn file_reference(file: &FileReference, dict: &mut Dict) {
    match &file.file_type {
        FileType::LastKnown(uti) => put(dict, "lastKnownFileType", uti.as_str().into()),
        FileType::Explicit(uti) => {
            put(dict, "explicitFileType", uti.as_str().into());
            put(dict, "includeInIndex", PlistValue::Integer(0));
        }
    }
    put_opt(dict, "name", file.name.as_deref());
    put(dict, "path", file.path.as_str().into());
    put(dict, "sourceTree", file.source_tree.as_str().into());
}

fn build_configuration(config: &BuildConfiguration, dict: &mut Dict) {
    let settings: Dict = config
        .build_settings
        .iter()
        .map(|(key, value)| {
            let value = match value {
                SettingValue::Text(text) => text.as_str().into(),
                SettingValue::List(items) => items.clone().into(),
            };
            (key.clone(), value)
        })
        .collect();
    put(dict, "buildSettings", settings.into());
    put(dict, "name", config.name.as_str().into());
}

fn shell_phase(phase: &ShellScriptBuildPhase, dict: &mut Dict) {
    put(dict, "buildActionMask", BUILD_ACTION_MASK.into());
    put(dict, "files", PlistValue::Array(Vec::new()));
    put(dict, "inputPaths", phase.input_paths.clone().into());
    put(dict, "name", phase.name.as_str().into());
    put(dict, "outputPaths", phase.output_paths.clone().into());
    put(dict, "runOnlyForDeploymentPostprocessing", PlistValue::Integer(0));
    put(dict, "shellPath", phase.shell_path.as_str().into());
    put(dict, "shellScript", phase.shell_script.as_str().into());
    put(dict, "showEnvVarsInLog", phase.show_env_vars_in_log.into());
}

fn put(dict: &mut Dict, key: &str, value: PlistValue) {
    dict.insert(key.to_owned(), value);
}

fn put_opt(dict: &mut Dict, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        put(dict, key, value.into());
    }
}
