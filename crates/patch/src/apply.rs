//! Strict patch application

use crate::model::{Hunk, HunkLine, Patch};
use spkg_errors::{Error, PatchError};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Result of applying one patch file to a source tree.
#[derive(Debug, Clone)]
pub struct PatchOutcome {
    /// The patch file that was applied.
    pub patch_path: PathBuf,
    /// Files rewritten inside the source tree.
    pub files: Vec<PathBuf>,
    /// Total hunks applied.
    pub hunks: usize,
}

impl Patch {
    /// Apply this patch to file content, strictly.
    ///
    /// Every context and removed line must match the target at the
    /// position the hunk header names (1-based, in old-file coordinates).
    /// Hunks are applied in order and must not overlap.
    ///
    /// # Errors
    ///
    /// Returns `PatchError::HunkMismatch` naming the first hunk whose
    /// context or removed lines differ from the target.
    pub fn apply(&self, content: &str) -> Result<String, Error> {
        let old: Vec<&str> = content.lines().collect();
        let mut out: Vec<String> = Vec::with_capacity(old.len());
        let mut cursor = 0usize; // 0-based index into `old`

        for (index, hunk) in self.hunks.iter().enumerate() {
            let start = hunk_start(hunk);
            if start < cursor {
                return Err(PatchError::ParseError {
                    line: hunk.old_start,
                    message: format!("hunk #{} overlaps the previous hunk", index + 1),
                }
                .into());
            }
            if start > old.len() {
                return Err(mismatch(index, start, first_old_line(hunk), None));
            }

            out.extend(old[cursor..start].iter().map(ToString::to_string));
            cursor = start;

            for line in &hunk.lines {
                match line {
                    HunkLine::Context(expected) | HunkLine::Removed(expected) => {
                        let found = old.get(cursor).copied();
                        if found != Some(expected.as_str()) {
                            return Err(mismatch(
                                index,
                                cursor,
                                Some(expected.as_str()),
                                found,
                            ));
                        }
                        if matches!(line, HunkLine::Context(_)) {
                            out.push(expected.clone());
                        }
                        cursor += 1;
                    }
                    HunkLine::Added(added) => out.push(added.clone()),
                }
            }
        }

        out.extend(old[cursor..].iter().map(ToString::to_string));

        let mut result = out.join("\n");
        if content.ends_with('\n') && !result.is_empty() {
            result.push('\n');
        }
        Ok(result)
    }
}

/// 0-based old-file index at which a hunk begins.
///
/// A pure insertion (`old_len == 0`) names the line *after* which it
/// inserts, so its start is `old_start` itself.
fn hunk_start(hunk: &Hunk) -> usize {
    if hunk.old_len == 0 {
        hunk.old_start
    } else {
        hunk.old_start.saturating_sub(1)
    }
}

fn first_old_line(hunk: &Hunk) -> Option<&str> {
    hunk.lines.iter().find_map(|l| match l {
        HunkLine::Context(s) | HunkLine::Removed(s) => Some(s.as_str()),
        HunkLine::Added(_) => None,
    })
}

fn mismatch(index: usize, cursor: usize, expected: Option<&str>, found: Option<&str>) -> Error {
    PatchError::HunkMismatch {
        hunk: index + 1,
        line: cursor + 1,
        expected: expected.unwrap_or_default().to_string(),
        found: found.map(ToString::to_string),
    }
    .into()
}

/// Apply every file section of a patch file to `source_dir`, rewriting
/// the targets in place. Nothing is written until every section has
/// applied cleanly in memory.
///
/// # Errors
///
/// Returns an error if the patch is malformed, a target is missing or
/// escapes the tree, or any hunk fails to apply.
pub async fn apply_patch_file(
    patch_path: &Path,
    source_dir: &Path,
    strip: usize,
) -> Result<PatchOutcome, Error> {
    let input = fs::read_to_string(patch_path)
        .await
        .map_err(|e| Error::io_with_path(&e, patch_path))?;
    let patches = crate::parse(&input)?;

    // First pass: apply everything in memory so a mid-patch failure
    // leaves the tree untouched.
    let mut rewrites = Vec::with_capacity(patches.len());
    let mut hunks = 0;
    for patch in &patches {
        let target = source_dir.join(patch.target_path(strip)?);
        if !target.exists() {
            return Err(PatchError::TargetNotFound {
                path: target.display().to_string(),
            }
            .into());
        }
        let content = fs::read_to_string(&target)
            .await
            .map_err(|e| Error::io_with_path(&e, &target))?;
        let patched = patch.apply(&content)?;
        hunks += patch.hunks.len();
        rewrites.push((target, patched));
    }

    let mut files = Vec::with_capacity(rewrites.len());
    for (target, patched) in rewrites {
        fs::write(&target, patched)
            .await
            .map_err(|e| Error::io_with_path(&e, &target))?;
        tracing::debug!(target = %target.display(), "patched file rewritten");
        files.push(target);
    }

    tracing::info!(
        patch = %patch_path.display(),
        files = files.len(),
        hunks,
        "patch applied"
    );

    Ok(PatchOutcome {
        patch_path: patch_path.to_path_buf(),
        files,
        hunks,
    })
}

/// Collect `*.patch` files under a directory, sorted by file name.
/// A missing directory yields an empty list.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub async fn collect_patches(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut patches = Vec::new();
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|e| Error::io_with_path(&e, dir))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Error::io_with_path(&e, dir))?
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("patch") {
            patches.push(path);
        }
    }

    patches.sort();
    Ok(patches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const TARGET: &str = "\
def greet():
    print 'hello'
greet()
";

    const PATCH: &str = "\
--- a/greet.py
+++ b/greet.py
@@ -1,3 +1,3 @@
 def greet():
-    print 'hello'
+    print('hello')
 greet()
";

    #[test]
    fn applies_cleanly() {
        let patch = &crate::parse(PATCH).unwrap()[0];
        let result = patch.apply(TARGET).unwrap();
        assert_eq!(result, "def greet():\n    print('hello')\ngreet()\n");
    }

    #[test]
    fn drifted_target_is_a_mismatch() {
        let patch = &crate::parse(PATCH).unwrap()[0];
        let drifted = TARGET.replace("'hello'", "'goodbye'");
        let err = patch.apply(&drifted).unwrap_err();
        assert!(matches!(
            err,
            Error::Patch(PatchError::HunkMismatch { hunk: 1, .. })
        ));
    }

    #[test]
    fn pure_insertion_hunk() {
        let input = "\
--- a/x
+++ b/x
@@ -1,0 +2,1 @@
+inserted
";
        let patch = &crate::parse(input).unwrap()[0];
        let result = patch.apply("first\nsecond\n").unwrap();
        assert_eq!(result, "first\ninserted\nsecond\n");
    }

    #[test]
    fn multiple_hunks_track_offsets() {
        let input = "\
--- a/x
+++ b/x
@@ -1,2 +1,3 @@
 one
+one-and-a-half
 two
@@ -4,2 +5,2 @@
 four
-five
+FIVE
";
        let patch = &crate::parse(input).unwrap()[0];
        let result = patch.apply("one\ntwo\nthree\nfour\nfive\n").unwrap();
        assert_eq!(result, "one\none-and-a-half\ntwo\nthree\nfour\nFIVE\n");
    }

    #[test]
    fn preserves_missing_trailing_newline() {
        let patch = &crate::parse(PATCH).unwrap()[0];
        let target = TARGET.trim_end_matches('\n');
        let result = patch.apply(target).unwrap();
        assert!(!result.ends_with('\n'));
    }

    #[tokio::test]
    async fn patch_file_rewrites_target() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("src");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("greet.py"), TARGET).unwrap();
        let patch_path = temp.path().join("fix-print.patch");
        std::fs::write(&patch_path, PATCH).unwrap();

        let outcome = apply_patch_file(&patch_path, &source, 1).await.unwrap();
        assert_eq!(outcome.hunks, 1);
        assert_eq!(outcome.files.len(), 1);

        let patched = std::fs::read_to_string(source.join("greet.py")).unwrap();
        assert!(patched.contains("print('hello')"));
    }

    #[tokio::test]
    async fn failing_patch_leaves_target_untouched() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("src");
        std::fs::create_dir_all(&source).unwrap();
        let drifted = TARGET.replace("'hello'", "'goodbye'");
        std::fs::write(source.join("greet.py"), &drifted).unwrap();
        let patch_path = temp.path().join("fix-print.patch");
        std::fs::write(&patch_path, PATCH).unwrap();

        let err = apply_patch_file(&patch_path, &source, 1).await.unwrap_err();
        assert!(matches!(err, Error::Patch(PatchError::HunkMismatch { .. })));
        assert_eq!(
            std::fs::read_to_string(source.join("greet.py")).unwrap(),
            drifted
        );
    }

    #[tokio::test]
    async fn collect_patches_sorts_and_filters() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("02-second.patch"), "").unwrap();
        std::fs::write(temp.path().join("01-first.patch"), "").unwrap();
        std::fs::write(temp.path().join("notes.txt"), "").unwrap();

        let patches = collect_patches(temp.path()).await.unwrap();
        let names: Vec<_> = patches
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["01-first.patch", "02-second.patch"]);
    }

    #[tokio::test]
    async fn missing_patch_dir_is_empty() {
        let temp = tempdir().unwrap();
        let patches = collect_patches(&temp.path().join("patches")).await.unwrap();
        assert!(patches.is_empty());
    }
}
