//! Package source discovery

use spkg_errors::{Error, InstallError};
use std::path::{Path, PathBuf};

/// A package directory on disk: `src/` holding the upstream source
/// (with its own `setup.py`) and an optional `patches/` directory of
/// unified diffs applied before installation.
#[derive(Debug, Clone)]
pub struct PackageSource {
    /// Package name; also the naming pattern for stale-artifact purge.
    pub name: String,
    /// Upstream source tree, cwd of the delegated installer.
    pub source_dir: PathBuf,
    /// Compatibility patches, applied in file-name order.
    pub patches_dir: PathBuf,
}

impl PackageSource {
    /// Discover a package layout rooted at `dir`. The package name is
    /// taken from the directory name.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` or `dir/src` is missing, or if the
    /// source ships no `setup.py` entry point.
    pub fn discover(dir: &Path) -> Result<Self, Error> {
        if !dir.is_dir() {
            return Err(InstallError::SourceNotFound {
                path: dir.display().to_string(),
            }
            .into());
        }

        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .map(ToString::to_string)
            .ok_or_else(|| InstallError::SourceNotFound {
                path: dir.display().to_string(),
            })?;

        let source_dir = dir.join("src");
        if !source_dir.is_dir() {
            return Err(InstallError::SourceNotFound {
                path: source_dir.display().to_string(),
            }
            .into());
        }

        if !source_dir.join("setup.py").is_file() {
            return Err(InstallError::MissingSetup {
                path: source_dir.display().to_string(),
            }
            .into());
        }

        Ok(Self {
            name,
            source_dir,
            patches_dir: dir.join("patches"),
        })
    }
}
