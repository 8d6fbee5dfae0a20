//! TOML configuration naming the boundary and vendor layer files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::dataset::LoadError;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub global: GlobalConfig,
    pub boundary: Option<BoundaryConfig>,
    #[serde(default)]
    pub layers: Vec<LayerConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Layer label given to user-submitted vendors
    #[serde(default = "default_submission_layer")]
    pub submission_layer: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            submission_layer: default_submission_layer(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_submission_layer() -> String {
    "Kiriman Pengguna".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct BoundaryConfig {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LayerConfig {
    pub name: String,
    pub path: PathBuf,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let mut config = Self::parse(&content).context("Failed to parse config file")?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, LoadError> {
        Ok(toml::from_str(content)?)
    }

    /// Make relative data paths relative to `base` (the config file's directory)
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(b) = self.boundary.as_mut() {
            resolve(&mut b.path);
        }
        for layer in &mut self.layers {
            resolve(&mut layer.path);
        }
    }
}
