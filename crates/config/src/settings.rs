use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub remote: RemoteSettings,
    pub package: PackageSettings,
}

/// Publishing service connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    /// Service address. Empty disables every remote command.
    pub base_url: String,
    pub referer: String,
    pub timeout_secs: u64,
}
impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            referer: "https://y114git.github.io".to_string(),
            timeout_secs: 30,
        }
    }
}
impl RemoteSettings {
    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Values filled into packages that leave them blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageSettings {
    pub default_game_version: String,
    pub default_version: String,
}
impl Default for PackageSettings {
    fn default() -> Self {
        Self {
            default_game_version: "1.04".to_string(),
            default_version: "1.0.0".to_string(),
        }
    }
}
