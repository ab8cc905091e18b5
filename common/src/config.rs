use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
};

use eyre::{Context, Result};
use serde::Deserialize;

use crate::{plot::PlotTarget, series::LabelScheme};

pub const DEFAULT_OUT_DIR: &str = "fileSystemPlot";
pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;

/// A batch of charts, read from a yaml file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub name: String,
    #[serde(default)]
    pub settings: Settings,
    pub plots: Vec<PlotTarget>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub out_dir: PathBuf,
    pub width: u32,
    pub height: u32,
    pub labels: LabelScheme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            labels: LabelScheme::default(),
        }
    }
}

impl Settings {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yml::from_str(yaml)?;
        eyre::ensure!(
            config.settings.width > 0 && config.settings.height > 0,
            "Chart size must be non-zero, got {}x{}",
            config.settings.width,
            config.settings.height
        );
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml = read_to_string(path).wrap_err_with(|| format!("Reading config {path:?}"))?;
        Self::from_yaml(&yaml).wrap_err_with(|| format!("Parsing config {path:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config() {
        let config = Config::from_yaml(
            r#"
name: raidx
settings:
  out_dir: plots
  width: 800
  height: 600
  labels: reads-only
plots:
  - csv: results/testResult.csv
    filesystem: ext4
    file: test3
  - csv: results/other.csv
    filesystem: xfs
    file: test1
"#,
        )
        .unwrap();
        assert_eq!(config.name, "raidx");
        assert_eq!(config.settings.out_dir, PathBuf::from("plots"));
        assert_eq!(config.settings.size(), (800, 600));
        assert_eq!(config.settings.labels, LabelScheme::ReadsOnly);
        assert_eq!(config.plots.len(), 2);
        assert_eq!(config.plots[0].csv, PathBuf::from("results/testResult.csv"));
        assert_eq!(config.plots[1].filesystem, "xfs");
    }

    #[test]
    fn settings_default_when_missing() {
        let config = Config::from_yaml(
            r#"
name: minimal
plots:
  - csv: a.csv
    filesystem: ext4
    file: test0
"#,
        )
        .unwrap();
        assert_eq!(config.settings, Settings::default());
        assert_eq!(config.settings.out_dir, PathBuf::from(DEFAULT_OUT_DIR));

        let partial = Config::from_yaml("name: p\nsettings:\n  width: 1024\nplots: []\n").unwrap();
        assert_eq!(partial.settings.size(), (1024, DEFAULT_HEIGHT));
    }

    #[test]
    fn rejects_unknown_fields_and_zero_size() {
        assert!(Config::from_yaml("name: x\ncolour: red\nplots: []\n").is_err());
        assert!(Config::from_yaml("name: x\nsettings:\n  height: 0\nplots: []\n").is_err());
    }
}
