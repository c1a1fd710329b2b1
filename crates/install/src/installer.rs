//! The install procedure pipeline

use crate::package::PackageSource;
use crate::python;
use serde::Serialize;
use spkg_config::{Config, InstallPrefix};
use spkg_errors::{Error, InstallError};
use std::time::Instant;
use tokio::fs;

/// Summary of a completed install, rendered by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub package: String,
    /// Stale artifacts removed from site-packages before installing.
    pub purged: Vec<String>,
    /// Compatibility patches applied to the source tree.
    pub patches_applied: usize,
    pub duration_ms: u64,
}

/// Drives the install procedure for one package against a prefix.
pub struct Installer {
    config: Config,
    prefix: InstallPrefix,
}

impl Installer {
    #[must_use]
    pub fn new(config: Config, prefix: InstallPrefix) -> Self {
        Self { config, prefix }
    }

    /// Run the full procedure: apply patches, purge stale artifacts,
    /// delegate to the package's own installer.
    ///
    /// # Errors
    ///
    /// Returns the first failure; nothing is retried and no partial
    /// progress is rolled back.
    pub async fn install(&self, package: &PackageSource) -> Result<InstallReport, Error> {
        let start = Instant::now();
        tracing::info!(
            package = %package.name,
            prefix = %self.prefix.root().display(),
            "starting install procedure"
        );

        let patches_applied = self.apply_patches(package).await?;
        let purged = self.purge_stale_artifacts(package).await?;
        self.delegate(package).await?;

        let report = InstallReport {
            package: package.name.clone(),
            purged,
            patches_applied,
            duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        tracing::info!(
            package = %report.package,
            purged = report.purged.len(),
            patches = report.patches_applied,
            duration_ms = report.duration_ms,
            "install procedure completed"
        );
        Ok(report)
    }

    /// Apply every `patches/*.patch` to the source tree, in name order.
    async fn apply_patches(&self, package: &PackageSource) -> Result<usize, Error> {
        let patches = spkg_patch::collect_patches(&package.patches_dir).await?;
        for patch_path in &patches {
            spkg_patch::apply_patch_file(patch_path, &package.source_dir, 1).await?;
        }
        Ok(patches.len())
    }

    /// Remove previously installed `site-packages/<name>*` entries.
    /// A missing site-packages directory means nothing to purge.
    async fn purge_stale_artifacts(&self, package: &PackageSource) -> Result<Vec<String>, Error> {
        let site_packages = self.prefix.site_packages(&self.config);
        if !site_packages.is_dir() {
            return Ok(Vec::new());
        }

        let mut purged = Vec::new();
        let mut entries = fs::read_dir(&site_packages)
            .await
            .map_err(|e| filesystem_error("read_dir", &site_packages, &e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| filesystem_error("read_dir", &site_packages, &e))?
        {
            let Some(name) = entry.file_name().to_str().map(ToString::to_string) else {
                continue;
            };
            if !name.starts_with(&package.name) {
                continue;
            }

            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| filesystem_error("stat", &path, &e))?;
            if file_type.is_dir() {
                fs::remove_dir_all(&path)
                    .await
                    .map_err(|e| filesystem_error("remove_dir_all", &path, &e))?;
            } else {
                fs::remove_file(&path)
                    .await
                    .map_err(|e| filesystem_error("remove_file", &path, &e))?;
            }
            tracing::debug!(artifact = %name, "purged stale artifact");
            purged.push(name);
        }

        purged.sort();
        Ok(purged)
    }

    /// Delegate to `setup.py install` and propagate its failure.
    async fn delegate(&self, package: &PackageSource) -> Result<(), Error> {
        let result =
            python::run_setup_install(&self.config, &self.prefix, &package.source_dir).await?;
        if !result.success {
            return Err(InstallError::DelegateFailed {
                package: package.name.clone(),
                exit_code: result.exit_code,
                stderr: result.stderr,
            }
            .into());
        }
        Ok(())
    }
}

fn filesystem_error(operation: &str, path: &std::path::Path, err: &std::io::Error) -> Error {
    InstallError::FilesystemError {
        operation: operation.to_string(),
        path: path.display().to_string(),
        message: err.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_executable(path: &Path, body: &str) {
        std::fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms).unwrap();
    }

    /// Lay out a package dir plus a prefix, with a fake interpreter that
    /// records its invocation into the prefix.
    fn fixture(temp: &Path, interpreter_body: &str) -> (Config, InstallPrefix, PackageSource) {
        let pkg = temp.join("docutils");
        std::fs::create_dir_all(pkg.join("src")).unwrap();
        std::fs::write(pkg.join("src/setup.py"), "from distutils.core import setup\n").unwrap();

        let prefix_dir = temp.join("prefix");
        std::fs::create_dir_all(prefix_dir.join("lib/python/site-packages")).unwrap();

        let interpreter = temp.join("fake-python");
        write_executable(&interpreter, interpreter_body);

        let mut config = Config::default();
        config.python.command = interpreter.display().to_string();
        let prefix = InstallPrefix::new(&prefix_dir).unwrap();
        let package = PackageSource::discover(&pkg).unwrap();
        (config, prefix, package)
    }

    #[tokio::test]
    async fn successful_install_purges_stale_artifacts() {
        let temp = tempdir().unwrap();
        let (config, prefix, package) = fixture(temp.path(), "exit 0");

        let site = prefix.site_packages(&config);
        std::fs::create_dir_all(site.join("docutils-0.7.egg")).unwrap();
        std::fs::write(site.join("docutils.pth"), "docutils\n").unwrap();
        std::fs::write(site.join("roman.py"), "# unrelated\n").unwrap();

        let report = Installer::new(config.clone(), prefix.clone())
            .install(&package)
            .await
            .unwrap();

        assert_eq!(report.package, "docutils");
        assert_eq!(report.purged, vec!["docutils-0.7.egg", "docutils.pth"]);
        assert!(!site.join("docutils-0.7.egg").exists());
        assert!(site.join("roman.py").exists());
    }

    #[tokio::test]
    async fn delegate_failure_propagates() {
        let temp = tempdir().unwrap();
        let (config, prefix, package) = fixture(temp.path(), "echo 'boom' >&2; exit 1");

        let err = Installer::new(config, prefix)
            .install(&package)
            .await
            .unwrap_err();
        match err {
            Error::Install(InstallError::DelegateFailed {
                package,
                exit_code,
                stderr,
            }) => {
                assert_eq!(package, "docutils");
                assert_eq!(exit_code, Some(1));
                assert!(stderr.contains("boom"));
            }
            other => panic!("expected DelegateFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_site_packages_is_not_an_error() {
        let temp = tempdir().unwrap();
        let (config, prefix, package) = fixture(temp.path(), "exit 0");
        std::fs::remove_dir_all(prefix.site_packages(&config)).unwrap();

        let report = Installer::new(config, prefix)
            .install(&package)
            .await
            .unwrap();
        assert!(report.purged.is_empty());
    }

    #[tokio::test]
    async fn patches_are_applied_before_delegation() {
        let temp = tempdir().unwrap();
        let (config, prefix, package) = fixture(temp.path(), "exit 0");

        std::fs::create_dir_all(&package.patches_dir).unwrap();
        std::fs::write(
            package.source_dir.join("module.py"),
            "value = 1\n",
        )
        .unwrap();
        std::fs::write(
            package.patches_dir.join("01-bump.patch"),
            "--- a/module.py\n+++ b/module.py\n@@ -1 +1 @@\n-value = 1\n+value = 2\n",
        )
        .unwrap();

        let report = Installer::new(config, prefix)
            .install(&package)
            .await
            .unwrap();
        assert_eq!(report.patches_applied, 1);
        assert_eq!(
            std::fs::read_to_string(package.source_dir.join("module.py")).unwrap(),
            "value = 2\n"
        );
    }

    #[tokio::test]
    async fn failing_patch_aborts_before_purge_and_delegate() {
        let temp = tempdir().unwrap();
        let (config, prefix, package) = fixture(temp.path(), "exit 0");

        std::fs::create_dir_all(&package.patches_dir).unwrap();
        std::fs::write(package.source_dir.join("module.py"), "value = 9\n").unwrap();
        std::fs::write(
            package.patches_dir.join("01-bump.patch"),
            "--- a/module.py\n+++ b/module.py\n@@ -1 +1 @@\n-value = 1\n+value = 2\n",
        )
        .unwrap();

        let site = prefix.site_packages(&config);
        std::fs::write(site.join("docutils.pth"), "docutils\n").unwrap();

        let err = Installer::new(config.clone(), prefix.clone())
            .install(&package)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Patch(_)));
        // Stale artifacts untouched: the pipeline never reached the purge.
        assert!(site.join("docutils.pth").exists());
    }
}
