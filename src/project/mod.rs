//! Arena-backed Xcode project object graph.
//!
//! Every object lives in one [`ProjectGraph`] and refers to others by
//! [`ObjectId`]. Target dependencies go through a container item proxy, so
//! the graph flattens into an identifier table without cycles between owned
//! values. Objects carry no identifier of their own; the serializer assigns
//! one on first visit.

pub mod file_type;
mod objects;

use std::cmp::Ordering;

use camino::Utf8Path;

pub use objects::{
    BuildConfiguration, BuildFile, ConfigurationList, ContainerItemProxy, FileReference, FileType,
    Group, ObjectId, PbxObject, Project, SettingValue, SettingsMap, ShellScriptBuildPhase,
    SourceTree, SourcesBuildPhase, Target, TargetDependency, TargetKind, VersionGroup,
};

const ROOT: ObjectId = ObjectId(0);
const MAIN_GROUP: ObjectId = ObjectId(1);
const PRODUCTS_GROUP: ObjectId = ObjectId(2);
const PROJECT_CONFIGURATIONS: ObjectId = ObjectId(3);

/// Extension of a versioned Core Data model bundle.
const VERSIONED_MODEL_EXTENSION: &str = "xcdatamodeld";

/// One generated Xcode project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectGraph {
    objects: Vec<PbxObject>,
}

impl ProjectGraph {
    /// Create an empty project with its main and products groups.
    #[must_use]
    pub fn new(name: &str, project_dir_path: &str) -> Self {
        let project = Project {
            name: name.to_owned(),
            main_group: MAIN_GROUP,
            products_group: PRODUCTS_GROUP,
            build_configuration_list: PROJECT_CONFIGURATIONS,
            targets: Vec::new(),
            attributes: [("LastUpgradeCheck".to_owned(), "1500".to_owned())]
                .into_iter()
                .collect(),
            project_dir_path: project_dir_path.to_owned(),
        };
        let main_group = Group {
            children: vec![PRODUCTS_GROUP],
            source_tree: Some(SourceTree::Group),
            ..Group::default()
        };
        let products_group = Group {
            name: Some("Products".to_owned()),
            source_tree: Some(SourceTree::Group),
            ..Group::default()
        };
        let configurations = ConfigurationList {
            configurations: Vec::new(),
            default_configuration_name: "Release".to_owned(),
        };
        Self {
            objects: vec![
                PbxObject::Project(project),
                PbxObject::Group(main_group),
                PbxObject::Group(products_group),
                PbxObject::ConfigurationList(configurations),
            ],
        }
    }

    /// Identifier of the `PBXProject` root object.
    #[must_use]
    pub const fn root(&self) -> ObjectId {
        ROOT
    }

    /// Identifier of the top-level group.
    #[must_use]
    pub const fn main_group(&self) -> ObjectId {
        MAIN_GROUP
    }

    /// Look up an object.
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&PbxObject> {
        self.objects.get(id.0)
    }

    /// Number of objects in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the arena is empty. A constructed graph never is.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The project root object.
    #[must_use]
    pub fn project(&self) -> Option<&Project> {
        match self.objects.get(ROOT.0) {
            Some(PbxObject::Project(project)) => Some(project),
            _ => None,
        }
    }

    fn push(&mut self, object: PbxObject) -> ObjectId {
        let id = ObjectId(self.objects.len());
        self.objects.push(object);
        id
    }

    fn project_mut(&mut self) -> Option<&mut Project> {
        match self.objects.get_mut(ROOT.0) {
            Some(PbxObject::Project(project)) => Some(project),
            _ => None,
        }
    }

    fn target_mut(&mut self, id: ObjectId) -> Option<&mut Target> {
        match self.objects.get_mut(id.0) {
            Some(PbxObject::Target(target)) => Some(target),
            _ => None,
        }
    }

    /// Child of `parent` registered under `key`, or a freshly pushed object
    /// that is then registered.
    fn child_or_insert(
        &mut self,
        parent: ObjectId,
        key: (SourceTree, String),
        make: impl FnOnce() -> PbxObject,
    ) -> ObjectId {
        let existing = match self.objects.get(parent.0) {
            Some(PbxObject::Group(group)) => group.index.get(&key).copied(),
            Some(PbxObject::VersionGroup(group)) => group.index.get(&key).copied(),
            _ => None,
        };
        if let Some(id) = existing {
            return id;
        }
        let id = self.push(make());
        match self.objects.get_mut(parent.0) {
            Some(PbxObject::Group(group)) => {
                group.index.insert(key, id);
                group.children.push(id);
            }
            Some(PbxObject::VersionGroup(group)) => {
                group.index.insert(key, id);
                group.children.push(id);
            }
            _ => {}
        }
        id
    }

    /// Group for a workspace-relative directory, creating intermediate groups.
    pub fn group_for_path(&mut self, directory: &str) -> ObjectId {
        let mut current = MAIN_GROUP;
        for component in directory.split('/').filter(|c| !c.is_empty()) {
            current = self.child_or_insert(
                current,
                (SourceTree::Group, component.to_owned()),
                || {
                    PbxObject::Group(Group {
                        path: Some(component.to_owned()),
                        source_tree: Some(SourceTree::Group),
                        ..Group::default()
                    })
                },
            );
        }
        current
    }

    /// Reference a workspace-relative file, reusing an existing reference to
    /// the same path.
    ///
    /// Paths inside an `.xcdatamodeld` bundle resolve to the bundle's version
    /// group, which gains the `.xcdatamodel` entry as a child.
    pub fn add_file_reference(&mut self, path: &str, generated: bool) -> ObjectId {
        let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        let bundle_at = components.iter().position(|c| {
            Utf8Path::new(c).extension() == Some(VERSIONED_MODEL_EXTENSION)
        });
        if let Some(at) = bundle_at {
            let (parent, rest) = components.split_at(at);
            return self.add_versioned_model(&parent.join("/"), rest);
        }

        let (directory, file_name) = match components.split_last() {
            Some((last, parent)) => (parent.join("/"), (*last).to_owned()),
            None => (String::new(), path.to_owned()),
        };
        let group = self.group_for_path(&directory);
        let file_type = file_type::uti_for_path(&file_name).to_owned();
        let file_type = if generated {
            FileType::Explicit(file_type)
        } else {
            FileType::LastKnown(file_type)
        };
        self.child_or_insert(group, (SourceTree::Group, file_name.clone()), || {
            PbxObject::FileReference(FileReference {
                path: file_name,
                name: None,
                source_tree: SourceTree::Group,
                file_type,
            })
        })
    }

    /// `rest` starts with the bundle name and may continue with a version.
    fn add_versioned_model(&mut self, directory: &str, rest: &[&str]) -> ObjectId {
        let Some((bundle, inner)) = rest.split_first() else {
            return self.group_for_path(directory);
        };
        let parent = self.group_for_path(directory);
        let bundle = (*bundle).to_owned();
        let version_group = self.child_or_insert(parent, (SourceTree::Group, bundle.clone()), || {
            PbxObject::VersionGroup(VersionGroup {
                path: bundle,
                version_group_type: "wrapper.xcdatamodel".to_owned(),
                children: Vec::new(),
                current_version: None,
                index: indexmap::IndexMap::new(),
            })
        });
        let Some(version) = inner
            .first()
            .filter(|name| Utf8Path::new(name).extension() == Some("xcdatamodel"))
        else {
            return version_group;
        };
        let version_name = (*version).to_owned();
        self.child_or_insert(
            version_group,
            (SourceTree::Group, version_name.clone()),
            || {
                PbxObject::FileReference(FileReference {
                    path: version_name,
                    name: None,
                    source_tree: SourceTree::Group,
                    file_type: FileType::LastKnown("wrapper.xcdatamodel".to_owned()),
                })
            },
        );
        self.refresh_current_version(version_group);
        version_group
    }

    /// The lexically greatest version is current.
    fn refresh_current_version(&mut self, version_group: ObjectId) {
        let newest = match self.objects.get(version_group.0) {
            Some(PbxObject::VersionGroup(group)) => group
                .index
                .iter()
                .max_by(|(a, _), (b, _)| a.1.cmp(&b.1))
                .map(|(_, id)| *id),
            _ => None,
        };
        if let Some(PbxObject::VersionGroup(group)) = self.objects.get_mut(version_group.0) {
            group.current_version = newest;
        }
    }

    /// Reference a product in the products group.
    pub fn add_product_reference(&mut self, file_name: &str) -> ObjectId {
        let file_type = Utf8Path::new(file_name)
            .extension()
            .map_or("compiled.mach-o.executable", file_type::uti_for_extension)
            .to_owned();
        self.child_or_insert(
            PRODUCTS_GROUP,
            (SourceTree::BuiltProductsDir, file_name.to_owned()),
            || {
                PbxObject::FileReference(FileReference {
                    path: file_name.to_owned(),
                    name: None,
                    source_tree: SourceTree::BuiltProductsDir,
                    file_type: FileType::Explicit(file_type),
                })
            },
        )
    }

    /// Create a configuration list from `(name, settings)` pairs.
    pub fn add_configuration_list(
        &mut self,
        configurations: Vec<(String, SettingsMap)>,
        default_configuration_name: &str,
    ) -> ObjectId {
        let ids = self.add_configurations(configurations);
        self.push(PbxObject::ConfigurationList(ConfigurationList {
            configurations: ids,
            default_configuration_name: default_configuration_name.to_owned(),
        }))
    }

    fn add_configurations(&mut self, configurations: Vec<(String, SettingsMap)>) -> Vec<ObjectId> {
        configurations
            .into_iter()
            .map(|(name, build_settings)| {
                self.push(PbxObject::BuildConfiguration(BuildConfiguration {
                    name,
                    build_settings,
                }))
            })
            .collect()
    }

    /// Append configurations to the project-level list.
    pub fn add_project_configurations(&mut self, configurations: Vec<(String, SettingsMap)>) {
        let ids = self.add_configurations(configurations);
        if let Some(PbxObject::ConfigurationList(list)) =
            self.objects.get_mut(PROJECT_CONFIGURATIONS.0)
        {
            list.configurations.extend(ids);
        }
    }

    /// Add a target and list it on the project.
    pub fn add_target(&mut self, target: Target) -> ObjectId {
        let id = self.push(PbxObject::Target(target));
        if let Some(project) = self.project_mut() {
            project.targets.push(id);
        }
        id
    }

    /// Append a shell script phase to `target`.
    pub fn add_shell_script_phase(
        &mut self,
        target: ObjectId,
        phase: ShellScriptBuildPhase,
    ) -> ObjectId {
        let id = self.push(PbxObject::ShellScriptBuildPhase(phase));
        if let Some(target) = self.target_mut(target) {
            target.build_phases.push(id);
        }
        id
    }

    /// Append a compile-sources phase over `(file reference, compiler flags)`
    /// pairs to `target`.
    pub fn add_sources_phase(
        &mut self,
        target: ObjectId,
        files: Vec<(ObjectId, Option<String>)>,
    ) -> ObjectId {
        let build_files = files
            .into_iter()
            .map(|(file_ref, compiler_flags)| {
                self.push(PbxObject::BuildFile(BuildFile {
                    file_ref,
                    compiler_flags,
                }))
            })
            .collect();
        let id = self.push(PbxObject::SourcesBuildPhase(SourcesBuildPhase {
            files: build_files,
        }));
        if let Some(target) = self.target_mut(target) {
            target.build_phases.push(id);
        }
        id
    }

    /// Make `dependent` depend on `dependency` through a proxy.
    ///
    /// Repeated edges and self edges are ignored. Returns whether an edge was
    /// added.
    pub fn add_dependency(&mut self, dependent: ObjectId, dependency: ObjectId) -> bool {
        if dependent == dependency || self.target_dependencies(dependent).contains(&dependency) {
            return false;
        }
        let Some(remote_info) = self.target(dependency).map(|t| t.name.clone()) else {
            return false;
        };
        if self.target(dependent).is_none() {
            return false;
        }
        let proxy = self.push(PbxObject::ContainerItemProxy(ContainerItemProxy {
            container_portal: ROOT,
            remote_global_id: dependency,
            remote_info,
        }));
        let edge = self.push(PbxObject::TargetDependency(TargetDependency {
            target: dependency,
            target_proxy: proxy,
        }));
        if let Some(target) = self.target_mut(dependent) {
            target.dependencies.push(edge);
        }
        true
    }

    /// Look up a target.
    #[must_use]
    pub fn target(&self, id: ObjectId) -> Option<&Target> {
        match self.objects.get(id.0) {
            Some(PbxObject::Target(target)) => Some(target),
            _ => None,
        }
    }

    /// Targets in project order.
    pub fn targets(&self) -> impl Iterator<Item = (ObjectId, &Target)> {
        self.project()
            .into_iter()
            .flat_map(|project| project.targets.iter())
            .filter_map(|id| self.target(*id).map(|target| (*id, target)))
    }

    /// Find a target by name.
    #[must_use]
    pub fn find_target(&self, name: &str) -> Option<ObjectId> {
        self.targets()
            .find(|(_, target)| target.name == name)
            .map(|(id, _)| id)
    }

    /// Targets `id` depends on, in edge order.
    #[must_use]
    pub fn target_dependencies(&self, id: ObjectId) -> Vec<ObjectId> {
        self.target(id)
            .map(|target| {
                target
                    .dependencies
                    .iter()
                    .filter_map(|edge| match self.objects.get(edge.0) {
                        Some(PbxObject::TargetDependency(dep)) => Some(dep.target),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Build configurations of a target.
    #[must_use]
    pub fn target_configurations(&self, id: ObjectId) -> Vec<&BuildConfiguration> {
        let Some(target) = self.target(id) else {
            return Vec::new();
        };
        match self.objects.get(target.build_configuration_list.0) {
            Some(PbxObject::ConfigurationList(list)) => list
                .configurations
                .iter()
                .filter_map(|c| match self.objects.get(c.0) {
                    Some(PbxObject::BuildConfiguration(config)) => Some(config),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Settings of one named configuration of a target.
    #[must_use]
    pub fn target_settings(&self, id: ObjectId, configuration: &str) -> Option<&SettingsMap> {
        self.target_configurations(id)
            .into_iter()
            .find(|config| config.name == configuration)
            .map(|config| &config.build_settings)
    }

    /// File reference paths listed by the target's compile-sources phases,
    /// paired with their compiler flags.
    #[must_use]
    pub fn compiled_files(&self, id: ObjectId) -> Vec<(String, Option<String>)> {
        let Some(target) = self.target(id) else {
            return Vec::new();
        };
        target
            .build_phases
            .iter()
            .filter_map(|phase| match self.objects.get(phase.0) {
                Some(PbxObject::SourcesBuildPhase(phase)) => Some(phase),
                _ => None,
            })
            .flat_map(|phase| phase.files.iter())
            .filter_map(|file| match self.objects.get(file.0) {
                Some(PbxObject::BuildFile(build_file)) => Some(build_file),
                _ => None,
            })
            .filter_map(|build_file| {
                self.display_name(build_file.file_ref)
                    .map(|name| (name.to_owned(), build_file.compiler_flags.clone()))
            })
            .collect()
    }

    fn display_name(&self, id: ObjectId) -> Option<&str> {
        match self.objects.get(id.0)? {
            PbxObject::FileReference(file) => Some(file.name.as_deref().unwrap_or(&file.path)),
            PbxObject::VersionGroup(group) => Some(&group.path),
            PbxObject::Group(group) => group.name.as_deref().or(group.path.as_deref()),
            _ => None,
        }
    }

    /// Sort every group: subgroups first, then files, each by name.
    ///
    /// The products group stays last in the main group.
    pub fn sort_groups(&mut self) {
        let keys: Vec<Option<(bool, String)>> = (0..self.objects.len())
            .map(|index| {
                let id = ObjectId(index);
                let is_file = !matches!(self.objects.get(index), Some(PbxObject::Group(_)));
                self.display_name(id).map(|name| (is_file, name.to_owned()))
            })
            .collect();
        let order = |a: &ObjectId, b: &ObjectId| -> Ordering {
            let products = (*a == PRODUCTS_GROUP).cmp(&(*b == PRODUCTS_GROUP));
            products.then_with(|| keys.get(a.0).cmp(&keys.get(b.0)))
        };
        for object in &mut self.objects {
            if let PbxObject::Group(group) = object {
                group.children.sort_by(order);
            }
        }
    }
}
