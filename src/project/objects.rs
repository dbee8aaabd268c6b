//! Project object kinds stored in the [`super::ProjectGraph`] arena.

use std::collections::BTreeMap;

use indexmap::IndexMap;

/// Index of an object within one [`super::ProjectGraph`].
///
/// Ids are only meaningful for the graph that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub(super) usize);

/// Anchor a file reference's path is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceTree {
    /// Relative to the enclosing group.
    Group,
    /// Absolute path.
    Absolute,
    /// Relative to the project's source root.
    SourceRoot,
    /// Relative to the build products directory.
    BuiltProductsDir,
}

impl SourceTree {
    /// Name written to the project file.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Group => "<group>",
            Self::Absolute => "<absolute>",
            Self::SourceRoot => "SOURCE_ROOT",
            Self::BuiltProductsDir => "BUILT_PRODUCTS_DIR",
        }
    }
}

/// Type metadata of a file reference.
///
/// A reference carries exactly one of the two keys, so the variants are
/// mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileType {
    /// Pre-existing file; serialized as `lastKnownFileType`.
    LastKnown(String),
    /// Generated or product file; serialized as `explicitFileType`.
    Explicit(String),
}

/// A reference to one file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    /// Path relative to `source_tree`.
    pub path: String,
    /// Display name when it differs from the path.
    pub name: Option<String>,
    /// Anchor of `path`.
    pub source_tree: SourceTree,
    /// Type metadata.
    pub file_type: FileType,
}

/// A folder-like group of references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    /// Display name.
    pub name: Option<String>,
    /// Path component relative to the parent group.
    pub path: Option<String>,
    /// Anchor of `path`.
    pub source_tree: Option<SourceTree>,
    /// Children in display order.
    pub children: Vec<ObjectId>,
    pub(super) index: IndexMap<(SourceTree, String), ObjectId>,
}

/// A versioned bundle such as a Core Data model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionGroup {
    /// Path relative to the parent group.
    pub path: String,
    /// Bundle type, e.g. `wrapper.xcdatamodel`.
    pub version_group_type: String,
    /// Version references.
    pub children: Vec<ObjectId>,
    /// The active version.
    pub current_version: Option<ObjectId>,
    pub(super) index: IndexMap<(SourceTree, String), ObjectId>,
}

/// Target flavour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKind {
    /// Target built by the IDE from phases.
    Native {
        /// Product type identifier.
        product_type: String,
        /// Product file reference in the products group.
        product_reference: Option<ObjectId>,
    },
    /// Target delegating to an external tool.
    Legacy {
        /// Tool to run.
        build_tool_path: String,
        /// Arguments passed to the tool.
        build_arguments: String,
        /// Working directory of the tool.
        build_working_directory: String,
        /// Export build settings to the tool's environment.
        pass_build_settings_in_environment: bool,
    },
    /// Target grouping other targets.
    Aggregate,
}

/// A buildable unit of the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Unique target name.
    pub name: String,
    /// Product name.
    pub product_name: String,
    /// Flavour-specific data.
    pub kind: TargetKind,
    /// Configuration list.
    pub build_configuration_list: ObjectId,
    /// Build phases in execution order.
    pub build_phases: Vec<ObjectId>,
    /// `PBXTargetDependency` objects.
    pub dependencies: Vec<ObjectId>,
}

/// A value in a build configuration's settings map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SettingValue {
    /// Scalar setting.
    Text(String),
    /// List setting.
    List(Vec<String>),
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for SettingValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Build setting name to value.
pub type SettingsMap = BTreeMap<String, SettingValue>;

/// A named build configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfiguration {
    /// Configuration name, e.g. `Debug`.
    pub name: String,
    /// Settings applied in this configuration.
    pub build_settings: SettingsMap,
}

/// The configurations of a project or target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationList {
    /// `XCBuildConfiguration` objects.
    pub configurations: Vec<ObjectId>,
    /// Configuration used by command line builds.
    pub default_configuration_name: String,
}

/// Compile-sources phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcesBuildPhase {
    /// `PBXBuildFile` objects.
    pub files: Vec<ObjectId>,
}

/// Shell invocation phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellScriptBuildPhase {
    /// Phase title.
    pub name: String,
    /// Interpreter.
    pub shell_path: String,
    /// Script body.
    pub shell_script: String,
    /// Declared inputs.
    pub input_paths: Vec<String>,
    /// Declared outputs.
    pub output_paths: Vec<String>,
    /// Echo the environment into the build log.
    pub show_env_vars_in_log: bool,
}

/// One file inside a sources phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFile {
    /// The compiled file reference.
    pub file_ref: ObjectId,
    /// Per-file compiler flags.
    pub compiler_flags: Option<String>,
}

/// Edge from a target to the target it depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDependency {
    /// The depended-upon target.
    pub target: ObjectId,
    /// Proxy naming that target by identifier.
    pub target_proxy: ObjectId,
}

/// Names a target of a container by identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerItemProxy {
    /// The containing project.
    pub container_portal: ObjectId,
    /// The proxied target.
    pub remote_global_id: ObjectId,
    /// Name of the proxied target.
    pub remote_info: String,
}

/// The root object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Project name.
    pub name: String,
    /// Top of the file tree.
    pub main_group: ObjectId,
    /// Group holding product references.
    pub products_group: ObjectId,
    /// Project-level configurations.
    pub build_configuration_list: ObjectId,
    /// Targets in display order.
    pub targets: Vec<ObjectId>,
    /// Free-form project attributes.
    pub attributes: BTreeMap<String, String>,
    /// Directory the project paths are relative to.
    pub project_dir_path: String,
}

/// Any object stored in the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PbxObject {
    /// `PBXProject`.
    Project(Project),
    /// `PBXGroup`.
    Group(Group),
    /// `PBXFileReference`.
    FileReference(FileReference),
    /// `XCVersionGroup`.
    VersionGroup(VersionGroup),
    /// `PBXNativeTarget`, `PBXLegacyTarget` or `PBXAggregateTarget`.
    Target(Target),
    /// `XCConfigurationList`.
    ConfigurationList(ConfigurationList),
    /// `XCBuildConfiguration`.
    BuildConfiguration(BuildConfiguration),
    /// `PBXSourcesBuildPhase`.
    SourcesBuildPhase(SourcesBuildPhase),
    /// `PBXShellScriptBuildPhase`.
    ShellScriptBuildPhase(ShellScriptBuildPhase),
    /// `PBXBuildFile`.
    BuildFile(BuildFile),
    /// `PBXTargetDependency`.
    TargetDependency(TargetDependency),
    /// `PBXContainerItemProxy`.
    ContainerItemProxy(ContainerItemProxy),
}

impl PbxObject {
    /// The `isa` class name.
    #[must_use]
    pub const fn isa(&self) -> &'static str {
        match self {
            Self::Project(_) => "PBXProject",
            Self::Group(_) => "PBXGroup",
            Self::FileReference(_) => "PBXFileReference",
            Self::VersionGroup(_) => "XCVersionGroup",
            Self::Target(target) => match target.kind {
                TargetKind::Native { .. } => "PBXNativeTarget",
                TargetKind::Legacy { .. } => "PBXLegacyTarget",
                TargetKind::Aggregate => "PBXAggregateTarget",
            },
            Self::ConfigurationList(_) => "XCConfigurationList",
            Self::BuildConfiguration(_) => "XCBuildConfiguration",
            Self::SourcesBuildPhase(_) => "PBXSourcesBuildPhase",
            Self::ShellScriptBuildPhase(_) => "PBXShellScriptBuildPhase",
            Self::BuildFile(_) => "PBXBuildFile",
            Self::TargetDependency(_) => "PBXTargetDependency",
            Self::ContainerItemProxy(_) => "PBXContainerItemProxy",
        }
    }
}
