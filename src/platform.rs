use crate::error::InstallError;
use crate::types::GitHubAsset;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platforms msdfgen ships prebuilt binaries for. The string form doubles as
/// the per-platform directory name under the bin root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformKey {
    Darwin,
    DarwinArm64,
    Linux,
    LinuxArm64,
    Win32,
}

impl PlatformKey {
    pub const ALL: [PlatformKey; 5] = [
        PlatformKey::Darwin,
        PlatformKey::DarwinArm64,
        PlatformKey::Linux,
        PlatformKey::LinuxArm64,
        PlatformKey::Win32,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformKey::Darwin => "darwin",
            PlatformKey::DarwinArm64 => "darwin_arm64",
            PlatformKey::Linux => "linux",
            PlatformKey::LinuxArm64 => "linux_arm64",
            PlatformKey::Win32 => "win32",
        }
    }

    pub fn is_darwin(&self) -> bool {
        matches!(self, PlatformKey::Darwin | PlatformKey::DarwinArm64)
    }

    /// Maps an `(os, arch)` pair as reported by `std::env::consts`.
    pub fn from_os_arch(os: &str, arch: &str) -> Result<Self, InstallError> {
        match (os, arch) {
            ("macos", "x86_64") => Ok(PlatformKey::Darwin),
            ("macos", "aarch64") => Ok(PlatformKey::DarwinArm64),
            ("linux", "x86_64") => Ok(PlatformKey::Linux),
            ("linux", "aarch64") => Ok(PlatformKey::LinuxArm64),
            ("windows", "x86_64") | ("windows", "x86") => Ok(PlatformKey::Win32),
            _ => Err(InstallError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            }),
        }
    }

    pub fn host() -> Result<Self, InstallError> {
        Self::from_os_arch(std::env::consts::OS, std::env::consts::ARCH)
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformKey {
    type Err = InstallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "darwin" | "mac-x64" => Ok(PlatformKey::Darwin),
            "darwin_arm64" | "mac-arm64" => Ok(PlatformKey::DarwinArm64),
            "linux" | "linux-x64" => Ok(PlatformKey::Linux),
            "linux_arm64" | "linux-arm64" => Ok(PlatformKey::LinuxArm64),
            "win32" | "windows" | "windows-x64" => Ok(PlatformKey::Win32),
            _ => Err(InstallError::UnknownPlatformKey(s.to_string())),
        }
    }
}

/// Naming table for the installed tool: which file each platform's binary is
/// stored as, and which name fragment identifies it inside archives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryLayout {
    pub tool_name: String,
    pub macos_binary: String,
    pub linux_binary: String,
    pub windows_binary: String,
}

impl BinaryLayout {
    pub fn for_tool(tool_name: &str) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            macos_binary: format!("{}.osx", tool_name),
            linux_binary: format!("{}.linux", tool_name),
            windows_binary: format!("{}.exe", tool_name),
        }
    }

    pub fn binary_name(&self, platform: PlatformKey) -> &str {
        match platform {
            PlatformKey::Darwin | PlatformKey::DarwinArm64 => &self.macos_binary,
            PlatformKey::Linux | PlatformKey::LinuxArm64 => &self.linux_binary,
            PlatformKey::Win32 => &self.windows_binary,
        }
    }
}

const MACOS_KEYWORDS: [&str; 3] = ["macos", "darwin", "osx"];
const LINUX_KEYWORDS: [&str; 1] = ["linux"];
const WINDOWS_KEYWORDS: [&str; 3] = ["windows", "win32", "win64"];
const ARM64_KEYWORDS: [&str; 2] = ["arm64", "aarch64"];
const X64_KEYWORDS: [&str; 2] = ["x64", "x86_64"];

fn contains_any(name: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| name.contains(k))
}

fn is_arm64(name: &str) -> bool {
    contains_any(name, &ARM64_KEYWORDS)
}

// Names without any architecture hint are assumed to be x64 builds.
fn is_x64(name: &str) -> bool {
    contains_any(name, &X64_KEYWORDS) || (!name.contains("arm") && !name.contains("aarch"))
}

/// Whether a release asset name looks like a build for `platform`.
pub fn asset_matches_platform(asset_name: &str, platform: PlatformKey) -> bool {
    let name = asset_name.to_lowercase();
    match platform {
        PlatformKey::Darwin => contains_any(&name, &MACOS_KEYWORDS) && is_x64(&name),
        PlatformKey::DarwinArm64 => contains_any(&name, &MACOS_KEYWORDS) && is_arm64(&name),
        PlatformKey::Linux => contains_any(&name, &LINUX_KEYWORDS) && is_x64(&name),
        PlatformKey::LinuxArm64 => contains_any(&name, &LINUX_KEYWORDS) && is_arm64(&name),
        PlatformKey::Win32 => contains_any(&name, &WINDOWS_KEYWORDS),
    }
}

/// First asset, in release order, whose name matches `platform`.
pub fn find_asset_for_platform(
    assets: &[GitHubAsset],
    platform: PlatformKey,
) -> Option<&GitHubAsset> {
    tracing::trace!(
        "Looking for {} among {} assets",
        platform,
        assets.len()
    );

    let found = assets
        .iter()
        .find(|asset| asset_matches_platform(&asset.name, platform));

    match found {
        Some(asset) => tracing::debug!("Matched asset '{}' for {}", asset.name, platform),
        None => tracing::debug!("No asset matched {}", platform),
    }
    found
}
