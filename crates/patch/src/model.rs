//! Patch data model

use spkg_errors::{Error, PatchError};
use std::path::{Component, Path, PathBuf};

/// One file section of a unified diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Path from the `---` header.
    pub old_path: String,
    /// Path from the `+++` header.
    pub new_path: String,
    /// Hunks in file order.
    pub hunks: Vec<Hunk>,
}

/// A single `@@` hunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// 1-based first line in the old file (0 for pure insertions).
    pub old_start: usize,
    /// Number of old-file lines the hunk spans.
    pub old_len: usize,
    /// 1-based first line in the new file.
    pub new_start: usize,
    /// Number of new-file lines the hunk spans.
    pub new_len: usize,
    pub lines: Vec<HunkLine>,
}

/// One line of a hunk body, without its leading marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    Context(String),
    Removed(String),
    Added(String),
}

impl Patch {
    /// Resolve the file this patch targets, relative to a source tree,
    /// with `-pN`-style component stripping.
    ///
    /// The `+++` path is used unless it names `/dev/null`, in which case
    /// the `---` path is used (file deletion).
    ///
    /// # Errors
    ///
    /// Returns an error if the path has fewer than `strip` components, or
    /// if the stripped path is absolute or escapes the tree via `..`.
    pub fn target_path(&self, strip: usize) -> Result<PathBuf, Error> {
        let raw = if self.new_path == "/dev/null" {
            &self.old_path
        } else {
            &self.new_path
        };

        let path = Path::new(raw);
        let components: Vec<Component<'_>> = path.components().collect();
        if components.len() <= strip {
            return Err(PatchError::StripTooDeep {
                strip,
                path: raw.clone(),
            }
            .into());
        }

        let mut stripped = PathBuf::new();
        for component in &components[strip..] {
            match component {
                Component::Normal(part) => stripped.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(PatchError::TargetEscapes { path: raw.clone() }.into());
                }
            }
        }

        if stripped.as_os_str().is_empty() {
            return Err(PatchError::TargetEscapes { path: raw.clone() }.into());
        }

        Ok(stripped)
    }
}

impl Hunk {
    /// Count of old-file lines (context + removed) in the body.
    #[must_use]
    pub fn old_line_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l, HunkLine::Context(_) | HunkLine::Removed(_)))
            .count()
    }

    /// Count of new-file lines (context + added) in the body.
    #[must_use]
    pub fn new_line_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| matches!(l, HunkLine::Context(_) | HunkLine::Added(_)))
            .count()
    }
}
