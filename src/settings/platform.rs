//! Platform configurations and their Bazel flags.

use std::fmt::{self, Display, Formatter};

/// Apple platform family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PlatformType {
    /// iOS and iPadOS.
    Ios,
    /// macOS.
    Macos,
    /// tvOS.
    Tvos,
    /// watchOS.
    Watchos,
}

impl PlatformType {
    /// Every platform, in rendering order.
    pub const ALL: [Self; 4] = [Self::Ios, Self::Macos, Self::Tvos, Self::Watchos];

    /// Parse the extractor's platform string.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ios" => Some(Self::Ios),
            "macos" | "darwin" => Some(Self::Macos),
            "tvos" => Some(Self::Tvos),
            "watchos" => Some(Self::Watchos),
            _ => None,
        }
    }

    /// Lowercase platform name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Macos => "macos",
            Self::Tvos => "tvos",
            Self::Watchos => "watchos",
        }
    }

    /// Value of `SDKROOT` for device builds.
    #[must_use]
    pub const fn sdk_root(self) -> &'static str {
        match self {
            Self::Ios => "iphoneos",
            Self::Macos => "macosx",
            Self::Tvos => "appletvos",
            Self::Watchos => "watchos",
        }
    }

    /// Build setting naming the minimum deployment target.
    #[must_use]
    pub const fn deployment_target_key(self) -> &'static str {
        match self {
            Self::Ios => "IPHONEOS_DEPLOYMENT_TARGET",
            Self::Macos => "MACOSX_DEPLOYMENT_TARGET",
            Self::Tvos => "TVOS_DEPLOYMENT_TARGET",
            Self::Watchos => "WATCHOS_DEPLOYMENT_TARGET",
        }
    }

    /// CPU names Bazel accepts for the platform.
    #[must_use]
    pub const fn cpus(self) -> &'static [&'static str] {
        match self {
            Self::Ios => &["i386", "x86_64", "sim_arm64", "armv7", "arm64", "arm64e"],
            Self::Macos => &["x86_64", "arm64", "arm64e"],
            Self::Tvos => &["x86_64", "sim_arm64", "arm64"],
            Self::Watchos => &["i386", "x86_64", "arm64", "armv7k", "arm64_32"],
        }
    }

    /// The configuration used when the IDE does not specify one.
    #[must_use]
    pub const fn default_configuration(self) -> PlatformConfiguration {
        let cpu = match self {
            Self::Ios | Self::Tvos => "sim_arm64",
            Self::Macos | Self::Watchos => "arm64",
        };
        PlatformConfiguration {
            platform: self,
            cpu,
        }
    }
}

impl Display for PlatformType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One platform and CPU pairing, identified as `<platform>_<cpu>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlatformConfiguration {
    /// Platform family.
    pub platform: PlatformType,
    /// Bazel CPU name.
    pub cpu: &'static str,
}

impl PlatformConfiguration {
    /// Every known configuration, ordered by platform then CPU list order.
    #[must_use]
    pub fn all() -> Vec<Self> {
        PlatformType::ALL
            .into_iter()
            .flat_map(|platform| {
                platform
                    .cpus()
                    .iter()
                    .copied()
                    .map(move |cpu| Self { platform, cpu })
            })
            .collect()
    }

    /// Identifier such as `ios_arm64`.
    #[must_use]
    pub fn identifier(&self) -> String {
        format!("{}_{}", self.platform.name(), self.cpu)
    }

    /// Whether this configuration targets physical hardware.
    #[must_use]
    pub fn is_device(&self) -> bool {
        !matches!(self.cpu, "i386" | "x86_64" | "sim_arm64") || self.platform == PlatformType::Macos
    }

    /// Flags selecting this configuration.
    ///
    /// iOS configurations also pin the CPU used for embedded watch bundles.
    #[must_use]
    pub fn flags(&self) -> Vec<String> {
        let mut flags = vec![format!("--apple_platform_type={}", self.platform.name())];
        match self.platform {
            PlatformType::Ios => flags.push(format!("--cpu=ios_{}", self.cpu)),
            PlatformType::Macos => flags.push(format!("--cpu=darwin_{}", self.cpu)),
            PlatformType::Tvos | PlatformType::Watchos => {
                flags.push(format!("--{}_cpus={}", self.platform.name(), self.cpu));
            }
        }
        if self.platform == PlatformType::Ios {
            let watch_cpu = if self.is_device() { "arm64_32" } else { "x86_64" };
            flags.push(format!("--watchos_cpus={watch_cpu}"));
        }
        flags
    }

    /// Whether the 32-bit watch architecture option applies here.
    #[must_use]
    pub fn uses_watch_device_cpu(&self) -> bool {
        self.is_device() && matches!(self.platform, PlatformType::Ios | PlatformType::Watchos)
    }
}

impl Display for PlatformConfiguration {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier())
    }
}
