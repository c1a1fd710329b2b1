//! Delegated installer invocation

use spkg_config::{Config, InstallPrefix, PREFIX_ENV_VAR};
use spkg_errors::{Error, InstallError};
use std::path::Path;
use tokio::process::Command;

/// Captured result of a delegated installer run.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Run the package's own installer (`<python> setup.py install`) from the
/// source directory, blocking until it exits. The installation prefix is
/// exported to the child so the delegated installer places artifacts
/// under it.
///
/// # Errors
///
/// Returns `InstallError::InterpreterNotFound` if the interpreter cannot
/// be spawned. A non-zero exit from the child is reported through the
/// returned `CommandResult`, not as an error.
pub async fn run_setup_install(
    config: &Config,
    prefix: &InstallPrefix,
    source_dir: &Path,
) -> Result<CommandResult, Error> {
    let interpreter = &config.python.command;

    tracing::debug!(
        interpreter = %interpreter,
        source_dir = %source_dir.display(),
        "delegating to setup.py install"
    );

    let output = Command::new(interpreter)
        .args(["setup.py", "install"])
        .current_dir(source_dir)
        .env(PREFIX_ENV_VAR, prefix.root())
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::from(InstallError::InterpreterNotFound {
                    interpreter: interpreter.clone(),
                })
            } else {
                Error::io_with_path(&e, source_dir)
            }
        })?;

    let result = CommandResult {
        success: output.status.success(),
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    if result.success {
        tracing::info!(interpreter = %interpreter, "delegated installer succeeded");
    } else {
        tracing::error!(
            interpreter = %interpreter,
            exit_code = ?result.exit_code,
            "delegated installer failed"
        );
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    fn fake_interpreter(dir: &Path, body: &str) -> String {
        let path = dir.join("fake-python");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path.display().to_string()
    }

    fn config_with(command: String) -> Config {
        let mut config = Config::default();
        config.python.command = command;
        config
    }

    #[tokio::test]
    async fn captures_successful_run() {
        let temp = tempdir().unwrap();
        let config = config_with(fake_interpreter(temp.path(), "echo installing; exit 0"));
        let prefix = InstallPrefix::new("/opt/spkg").unwrap();

        let result = run_setup_install(&config, &prefix, temp.path())
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.stdout.contains("installing"));
    }

    #[tokio::test]
    async fn captures_failure_and_stderr() {
        let temp = tempdir().unwrap();
        let config = config_with(fake_interpreter(
            temp.path(),
            "echo 'SandboxViolation' >&2; exit 3",
        ));
        let prefix = InstallPrefix::new("/opt/spkg").unwrap();

        let result = run_setup_install(&config, &prefix, temp.path())
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
        assert!(result.stderr.contains("SandboxViolation"));
    }

    #[tokio::test]
    async fn exports_prefix_to_child() {
        let temp = tempdir().unwrap();
        let config = config_with(fake_interpreter(
            temp.path(),
            "printf '%s' \"$SPKG_LOCAL\"; exit 0",
        ));
        let prefix = InstallPrefix::new("/opt/spkg").unwrap();

        let result = run_setup_install(&config, &prefix, temp.path())
            .await
            .unwrap();
        assert_eq!(result.stdout, "/opt/spkg");
    }

    #[tokio::test]
    async fn missing_interpreter_is_reported() {
        let temp = tempdir().unwrap();
        let config = config_with("spkg-no-such-interpreter".to_string());
        let prefix = InstallPrefix::new("/opt/spkg").unwrap();

        let err = run_setup_install(&config, &prefix, temp.path())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Install(InstallError::InterpreterNotFound { .. })
        ));
    }
}
