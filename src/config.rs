use anyhow::{Context, Result, anyhow};
use directories::UserDirs;
use log::info;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::tracker::DEFAULT_HISTORY_LENGTH;

#[derive(Debug, Clone, Deserialize)]
pub struct Meta {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    #[serde(default = "default_history_length")]
    pub history_length: usize,
    #[serde(default = "default_pointing_pose_id")]
    pub pointing_pose_id: usize,
    #[serde(default = "default_max_hands")]
    pub max_hands: usize,
}

fn default_history_length() -> usize {
    DEFAULT_HISTORY_LENGTH
}

fn default_pointing_pose_id() -> usize {
    2
}

fn default_max_hands() -> usize {
    2
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            history_length: default_history_length(),
            pointing_pose_id: default_pointing_pose_id(),
            max_hands: default_max_hands(),
        }
    }
}

/// Pose and motion artifact paths; relative paths resolve against the
/// config file's directory.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactPaths {
    pub pose: PathBuf,
    pub motion: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub meta: Meta,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    pub models: ArtifactPaths,
    pub labels: ArtifactPaths,
}

/// A validated config plus where it came from.
#[derive(Debug, Clone)]
pub struct ConfigState {
    pub path: PathBuf,
    pub config: Config,
}

fn config_dir() -> Result<PathBuf> {
    let dirs = UserDirs::new().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(dirs.home_dir().join(".config").join("handsign"))
}

fn default_config_text() -> &'static str {
    include_str!("../profiles/default.toml")
}

impl ConfigState {
    /// `~/.config/handsign/config.toml`, written from the bundled default
    /// on first use.
    pub fn load_or_install_default() -> Result<Self> {
        let dir = config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let path = dir.join("config.toml");
        if !path.exists() {
            fs::write(&path, default_config_text())
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("installed default config at {}", path.display());
        }
        Self::load(&path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
        let config = Self::parse(&txt)
            .map_err(|e| anyhow!("failed to load {}: {e}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            config,
        })
    }

    pub fn parse(txt: &str) -> Result<Config> {
        let config: Config = toml::from_str(txt)?;
        validate_config(&config)?;
        Ok(config)
    }

    pub fn name(&self) -> &str {
        self.config.meta.name.as_deref().unwrap_or("unnamed")
    }

    fn resolve(&self, p: &Path) -> PathBuf {
        if p.is_absolute() {
            return p.to_path_buf();
        }
        self.path
            .parent()
            .map(|dir| dir.join(p))
            .unwrap_or_else(|| p.to_path_buf())
    }

    pub fn pose_model_path(&self) -> PathBuf {
        self.resolve(&self.config.models.pose)
    }

    pub fn motion_model_path(&self) -> PathBuf {
        self.resolve(&self.config.models.motion)
    }

    pub fn pose_labels_path(&self) -> PathBuf {
        self.resolve(&self.config.labels.pose)
    }

    pub fn motion_labels_path(&self) -> PathBuf {
        self.resolve(&self.config.labels.motion)
    }
}

fn validate_config(c: &Config) -> Result<()> {
    if c.pipeline.history_length < 2 {
        return Err(anyhow!("pipeline.history_length must be at least 2"));
    }
    if c.pipeline.max_hands == 0 {
        return Err(anyhow!("pipeline.max_hands must be positive"));
    }
    for (key, p) in [
        ("models.pose", &c.models.pose),
        ("models.motion", &c.models.motion),
        ("labels.pose", &c.labels.pose),
        ("labels.motion", &c.labels.motion),
    ] {
        if p.as_os_str().is_empty() {
            return Err(anyhow!("{key} must not be empty"));
        }
    }
    Ok(())
}
