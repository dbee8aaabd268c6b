//! Rule type to product type mapping.

/// The kind of product a buildable target produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductType {
    /// `.app` bundle.
    Application,
    /// Watch application bundle.
    WatchApplication,
    /// App extension.
    AppExtension,
    /// Watch extension.
    WatchExtension,
    /// Unit test bundle hosted through a bundle loader.
    UnitTest,
    /// UI test bundle driving a host by target name.
    UiTest,
    /// Framework bundle.
    Framework,
    /// Resource or loadable bundle.
    Bundle,
    /// Command line tool.
    Tool,
    /// Static library.
    StaticLibrary,
}

impl ProductType {
    /// Infer the product from a Bazel rule class.
    #[must_use]
    pub fn from_rule_type(rule_type: &str) -> Self {
        match rule_type {
            "watchos_application" => Self::WatchApplication,
            "watchos_extension" => Self::WatchExtension,
            "macos_command_line_application" => Self::Tool,
            rule if rule.ends_with("_application") => Self::Application,
            rule if rule.ends_with("_extension") => Self::AppExtension,
            rule if rule.ends_with("_unit_test") => Self::UnitTest,
            rule if rule.ends_with("_ui_test") => Self::UiTest,
            rule if rule.ends_with("_framework") => Self::Framework,
            rule if rule.ends_with("_bundle") => Self::Bundle,
            rule if rule.ends_with("_binary") => Self::Tool,
            _ => Self::StaticLibrary,
        }
    }

    /// Product type identifier.
    #[must_use]
    pub const fn identifier(self) -> &'static str {
        match self {
            Self::Application => "com.apple.product-type.application",
            Self::WatchApplication => "com.apple.product-type.application.watchapp2",
            Self::AppExtension => "com.apple.product-type.app-extension",
            Self::WatchExtension => "com.apple.product-type.watchkit2-extension",
            Self::UnitTest => "com.apple.product-type.bundle.unit-test",
            Self::UiTest => "com.apple.product-type.bundle.ui-testing",
            Self::Framework => "com.apple.product-type.framework",
            Self::Bundle => "com.apple.product-type.bundle",
            Self::Tool => "com.apple.product-type.tool",
            Self::StaticLibrary => "com.apple.product-type.library.static",
        }
    }

    /// File name of the product for a target called `name`.
    #[must_use]
    pub fn file_name(self, name: &str) -> String {
        match self {
            Self::Application | Self::WatchApplication => format!("{name}.app"),
            Self::AppExtension | Self::WatchExtension => format!("{name}.appex"),
            Self::UnitTest | Self::UiTest => format!("{name}.xctest"),
            Self::Framework => format!("{name}.framework"),
            Self::Bundle => format!("{name}.bundle"),
            Self::Tool => name.to_owned(),
            Self::StaticLibrary => format!("lib{name}.a"),
        }
    }

    /// Whether the product is an extension that needs an extension point.
    #[must_use]
    pub const fn is_extension(self) -> bool {
        matches!(self, Self::AppExtension | Self::WatchExtension)
    }
}
