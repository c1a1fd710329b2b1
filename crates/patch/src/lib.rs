#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Unified diff engine for spkg
//!
//! Compatibility patches ship next to a package's source as standard
//! unified diffs (`---`/`+++`/`@@` hunk syntax). This crate parses and
//! applies them in-process, strictly: every context and removed line must
//! match the target exactly, so "applies cleanly against the pinned
//! revision" is a checked property rather than a convention. There is no
//! fuzz and no fallback to an external `patch(1)`.

mod apply;
mod model;
mod parser;

pub use apply::{apply_patch_file, collect_patches, PatchOutcome};
pub use model::{Hunk, HunkLine, Patch};
pub use parser::parse;
