#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package install procedure for spkg
//!
//! The procedure is a linear pipeline against a managed installation
//! prefix: apply the package's compatibility patches, purge stale
//! artifacts left by a previous install, then delegate to the package's
//! own installer (`setup.py install`). Any failure aborts the whole
//! procedure; the source tree is left in place for inspection. No
//! retries, no rollback.

mod installer;
mod package;
mod python;

pub use installer::{InstallReport, Installer};
pub use package::PackageSource;
pub use python::CommandResult;
