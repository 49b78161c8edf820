pub mod binder;
pub mod connector;
pub mod render;

pub use binder::{
    connect_once, fetch_developer_data, ConnectionAttempt, ConnectionState, DeveloperBinder,
    DeveloperData, DeveloperState, MountState, StatusBinder,
};
pub use connector::{normalize, ConnectError, ConnectResult, Connector, SnapshotSource};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_APPLICATION_VERSION: &str = "0.0.1";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationName {
    Unknown,
    VsCode,
    Jetbrains,
    Sublime,
    Obsidian,
    Cli,
}

impl Default for ApplicationName {
    fn default() -> Self {
        Self::Unknown
    }
}

impl ApplicationName {
    /// Spelling used on the wire by the Pieces OS API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationName::Unknown => "UNKNOWN",
            ApplicationName::VsCode => "VS_CODE",
            ApplicationName::Jetbrains => "JETBRAINS",
            ApplicationName::Sublime => "SUBLIME",
            ApplicationName::Obsidian => "OBSIDIAN",
            ApplicationName::Cli => "CLI",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ApplicationName::Unknown => "Unknown",
            ApplicationName::VsCode => "VsCode",
            ApplicationName::Jetbrains => "Jetbrains",
            ApplicationName::Sublime => "Sublime",
            ApplicationName::Obsidian => "Obsidian",
            ApplicationName::Cli => "Cli",
        }
    }
}

impl fmt::Display for ApplicationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ApplicationName {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match fold_enum_key(input).as_str() {
            "unknown" => Ok(ApplicationName::Unknown),
            "vscode" => Ok(ApplicationName::VsCode),
            "jetbrains" => Ok(ApplicationName::Jetbrains),
            "sublime" => Ok(ApplicationName::Sublime),
            "obsidian" => Ok(ApplicationName::Obsidian),
            "cli" => Ok(ApplicationName::Cli),
            other => Err(format!("Unknown application name: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Platform {
    Macos,
    Windows,
    Linux,
    Web,
    Unknown,
}

impl Default for Platform {
    fn default() -> Self {
        Self::Macos
    }
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Macos => "MACOS",
            Platform::Windows => "WINDOWS",
            Platform::Linux => "LINUX",
            Platform::Web => "WEB",
            Platform::Unknown => "UNKNOWN",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Platform::Macos => "Macos",
            Platform::Windows => "Windows",
            Platform::Linux => "Linux",
            Platform::Web => "Web",
            Platform::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match fold_enum_key(input).as_str() {
            "macos" => Ok(Platform::Macos),
            "windows" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            "web" => Ok(Platform::Web),
            "unknown" => Ok(Platform::Unknown),
            other => Err(format!("Unknown platform: {other}")),
        }
    }
}

fn fold_enum_key(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Identifies the calling application to the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackedApplication {
    pub name: ApplicationName,
    pub version: String,
    pub platform: Platform,
}

impl Default for TrackedApplication {
    fn default() -> Self {
        Self {
            name: ApplicationName::Unknown,
            version: DEFAULT_APPLICATION_VERSION.to_string(),
            platform: Platform::Macos,
        }
    }
}

impl fmt::Display for TrackedApplication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.name, self.version, self.platform)
    }
}

/// Request body of the connect call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeededConnectorConnection {
    pub application: TrackedApplication,
}

impl SeededConnectorConnection {
    pub fn new(application: TrackedApplication) -> Self {
        Self { application }
    }
}
