//! Target detection and the naming conventions derived from it
//!
//! Two token families exist: release assets use frp's names
//! (`linux|darwin|windows`, `amd64|arm64|arm`) while the artifact store uses
//! the runtime names (`linux|darwin|win32`, `x64|arm64|arm`).

use std::fmt;

use crate::config::{non_empty, vars, EnvMap};
use crate::error::{Error, Result};

/// Supported operating systems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    Darwin,
    Windows,
}

/// Supported CPU architectures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X64,
    Arm64,
    Arm,
}

/// Release archive formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

impl ArchiveFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::Zip => "zip",
        }
    }
}

impl Os {
    pub const ALL: [Os; 3] = [Os::Linux, Os::Darwin, Os::Windows];

    /// Parse a runtime OS name (`std::env::consts::OS` or the `win32` style)
    pub fn parse(token: &str) -> Result<Self> {
        match token {
            "linux" => Ok(Os::Linux),
            "darwin" | "macos" => Ok(Os::Darwin),
            "win32" | "windows" => Ok(Os::Windows),
            other => Err(Error::UnsupportedPlatform(other.to_owned())),
        }
    }

    /// Token used in release asset names
    pub fn asset_token(self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::Darwin => "darwin",
            Os::Windows => "windows",
        }
    }

    /// Token used in artifact file names
    pub fn file_token(self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::Darwin => "darwin",
            Os::Windows => "win32",
        }
    }

    pub fn archive_format(self) -> ArchiveFormat {
        match self {
            Os::Windows => ArchiveFormat::Zip,
            Os::Linux | Os::Darwin => ArchiveFormat::TarGz,
        }
    }

    pub fn exe_suffix(self) -> &'static str {
        match self {
            Os::Windows => ".exe",
            Os::Linux | Os::Darwin => "",
        }
    }

    pub fn is_windows(self) -> bool {
        self == Os::Windows
    }
}

impl Arch {
    pub const ALL: [Arch; 3] = [Arch::X64, Arch::Arm64, Arch::Arm];

    /// Parse a runtime architecture name (`std::env::consts::ARCH` or `x64` style)
    pub fn parse(token: &str) -> Result<Self> {
        match token {
            "x64" | "x86_64" | "amd64" => Ok(Arch::X64),
            "arm64" | "aarch64" => Ok(Arch::Arm64),
            "arm" => Ok(Arch::Arm),
            other => Err(Error::UnsupportedArch(other.to_owned())),
        }
    }

    pub fn asset_token(self) -> &'static str {
        match self {
            Arch::X64 => "amd64",
            Arch::Arm64 => "arm64",
            Arch::Arm => "arm",
        }
    }

    pub fn file_token(self) -> &'static str {
        match self {
            Arch::X64 => "x64",
            Arch::Arm64 => "arm64",
            Arch::Arm => "arm",
        }
    }
}

/// An (OS, architecture) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub os: Os,
    pub arch: Arch,
}

impl Target {
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Detect the running target, honouring `FRPC_FORCE_PLATFORM` and
    /// `FRPC_FORCE_ARCH`
    pub fn detect(env: &EnvMap) -> Result<Self> {
        let os = non_empty(env, vars::FORCE_PLATFORM).unwrap_or(std::env::consts::OS);
        let arch = non_empty(env, vars::FORCE_ARCH).unwrap_or(std::env::consts::ARCH);
        Ok(Self::new(Os::parse(os)?, Arch::parse(arch)?))
    }

    /// `<tool>_<version>_<os>_<arch>.<ext>`
    pub fn asset_name(&self, tool: &str, version: &str) -> String {
        format!(
            "{}_{}_{}_{}.{}",
            tool,
            version,
            self.os.asset_token(),
            self.arch.asset_token(),
            self.os.archive_format().extension()
        )
    }

    /// `<prefix>-<os>-<arch>[.exe]`
    pub fn artifact_name(&self, prefix: &str) -> String {
        format!("{}-{}{}", prefix, self, self.os.exe_suffix())
    }

    /// Name of the executable inside the release archive
    pub fn executable_name(&self, binary: &str) -> String {
        format!("{}{}", binary, self.os.exe_suffix())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os.file_token(), self.arch.file_token())
    }
}

/// Human-readable pattern of every artifact name the launcher accepts
pub fn supported_artifact_pattern(prefix: &str) -> String {
    let oses: Vec<_> = Os::ALL.iter().map(|o| o.file_token()).collect();
    let arches: Vec<_> = Arch::ALL.iter().map(|a| a.file_token()).collect();
    format!(
        "{}-{{{}}}-{{{}}}[.exe]",
        prefix,
        oses.join("|"),
        arches.join("|")
    )
}
