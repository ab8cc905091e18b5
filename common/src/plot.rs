use std::{
    fs::create_dir_all,
    path::{Path, PathBuf},
};

use eyre::{ContextCompat, Result, WrapErr};
use serde::Deserialize;
use tracing::debug;

pub const PLOT_EXTENSION: &str = "svg";

/// Which rows of which CSV a chart is drawn from
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlotTarget {
    pub csv: PathBuf,
    pub filesystem: String,
    pub file: String,
}

impl PlotTarget {
    pub fn new(
        csv: impl Into<PathBuf>,
        filesystem: impl Into<String>,
        file: impl Into<String>,
    ) -> Self {
        Self {
            csv: csv.into(),
            filesystem: filesystem.into(),
            file: file.into(),
        }
    }

    pub fn title(&self) -> String {
        format!("write/read test of {} in {}", self.file, self.filesystem)
    }

    fn csv_stem(&self) -> Result<&str> {
        self.csv
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("Invalid CSV path {:?}", self.csv))
    }
}

/// Where a rendered chart is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLayout {
    /// `<dir>/<csv stem>_<filesystem>_<file>.svg`, `dir` is created if missing
    Directory(PathBuf),
    /// `<filesystem>_<file>_test_result.svg` in the working directory
    WorkingDir,
    /// Exactly this path, parent directories are created if missing
    Explicit(PathBuf),
}

impl OutputLayout {
    /// Resolves the output file for `target`, creating directories the layout owns.
    /// Resolving the same target twice yields the same path.
    pub fn resolve(&self, target: &PlotTarget) -> Result<PathBuf> {
        let path = match self {
            Self::Directory(dir) => {
                let name = format!(
                    "{}_{}_{}.{PLOT_EXTENSION}",
                    target.csv_stem()?,
                    target.filesystem,
                    target.file
                );
                ensure_dirs(dir)?;
                dir.join(name)
            }
            Self::WorkingDir => PathBuf::from(format!(
                "{}_{}_test_result.{PLOT_EXTENSION}",
                target.filesystem, target.file
            )),
            Self::Explicit(path) => {
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    ensure_dirs(parent)?;
                }
                path.clone()
            }
        };
        debug!("Plot for {} -> {path:?}", target.title());
        Ok(path)
    }
}

pub fn ensure_dirs(dir: &Path) -> Result<()> {
    if !dir.exists() {
        debug!("Creating {dir:?}");
        create_dir_all(dir).wrap_err_with(|| format!("Creating plot dir {dir:?}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> PlotTarget {
        PlotTarget::new("/data/run1/testResult.csv", "ext4", "test3")
    }

    #[test]
    fn title_names_file_and_filesystem() {
        assert_eq!(target().title(), "write/read test of test3 in ext4");
    }

    #[test]
    fn directory_layout_creates_nested_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("fileSystemPlot").join("nested");
        let path = OutputLayout::Directory(dir.clone()).resolve(&target()).unwrap();

        assert!(dir.is_dir());
        assert_eq!(path, dir.join("testResult_ext4_test3.svg"));
        assert_eq!(
            OutputLayout::Directory(dir).resolve(&target()).unwrap(),
            path
        );
    }

    #[test]
    fn working_dir_layout() {
        assert_eq!(
            OutputLayout::WorkingDir.resolve(&target()).unwrap(),
            PathBuf::from("ext4_test3_test_result.svg")
        );
    }

    #[test]
    fn explicit_layout_creates_parent() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("a").join("b").join("chart.svg");
        let path = OutputLayout::Explicit(out.clone()).resolve(&target()).unwrap();
        assert_eq!(path, out);
        assert!(tmp.path().join("a").join("b").is_dir());
        assert!(!out.exists());
    }

    #[test]
    fn csv_without_stem_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let bad = PlotTarget::new("/", "ext4", "test3");
        assert!(OutputLayout::Directory(tmp.path().into()).resolve(&bad).is_err());
    }
}
