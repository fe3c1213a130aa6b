use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use tracing::{debug, instrument};

use crate::ENV_PREFIX;
use crate::error::{ErrorKind, Result};
use crate::settings::Settings;

const FILE_STEM: &str = "config";

/// Builder for a layered [`Settings`] load.
#[derive(Debug, Clone)]
pub struct Loader {
    config_dir: Option<PathBuf>,
    file: Option<PathBuf>,
    env_prefix: String,
}
impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
impl Loader {
    /// Reads the platform config directory and `DELTAHUB_*` variables.
    pub fn new() -> Self {
        Self {
            config_dir: ProjectDirs::from("io.github", "y114git", "deltahub").map(|dirs| dirs.config_dir().to_path_buf()),
            file: None,
            env_prefix: ENV_PREFIX.to_string(),
        }
    }

    /// Replaces the platform config directory; `None` skips that layer.
    pub fn config_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.config_dir = dir;
        self
    }

    /// Adds an explicit config file above the directory layer. Its format
    /// follows its extension (TOML when unknown). The file must exist.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    #[instrument(skip(self), fields(config_dir = ?self.config_dir, file = ?self.file))]
    pub fn load(&self) -> Result<Settings> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(dir) = &self.config_dir {
            figment = figment
                .merge(Toml::file(dir.join(format!("{FILE_STEM}.toml"))))
                .merge(Yaml::file(dir.join(format!("{FILE_STEM}.yaml"))))
                .merge(Json::file(dir.join(format!("{FILE_STEM}.json"))));
        }
        if let Some(path) = &self.file {
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path.clone()));
            }
            figment = merge_file(figment, path);
        }
        figment = figment.merge(Env::prefixed(&self.env_prefix).split("__"));

        let settings: Settings = figment.extract().or_raise(|| ErrorKind::Invalid)?;
        validate(&settings)?;
        debug!(remote = settings.remote.is_configured(), "configuration loaded");
        Ok(settings)
    }
}

fn merge_file(figment: Figment, path: &Path) -> Figment {
    match path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase).as_deref() {
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => figment.merge(Toml::file(path)),
    }
}

fn validate(settings: &Settings) -> Result<()> {
    if settings.remote.timeout_secs == 0 {
        exn::bail!(ErrorKind::Invalid);
    }
    if settings.remote.is_configured() && settings.remote.referer.trim().is_empty() {
        exn::bail!(ErrorKind::Invalid);
    }
    Ok(())
}
