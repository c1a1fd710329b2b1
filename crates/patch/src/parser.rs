//! Unified diff parsing

use crate::model::{Hunk, HunkLine, Patch};
use spkg_errors::{Error, PatchError};

/// Parse a unified diff into its file sections.
///
/// Leading prose (mail headers, `diff` command lines, commentary) before
/// the first `---` header is skipped, as `patch(1)` does. Hunk headers
/// must be consistent with their bodies.
///
/// # Errors
///
/// Returns `PatchError::ParseError` on malformed headers or bodies and
/// `PatchError::Empty` if no file section is found.
pub fn parse(input: &str) -> Result<Vec<Patch>, Error> {
    let mut patches = Vec::new();
    let mut lines = input.lines().enumerate().peekable();

    while let Some(&(_, line)) = lines.peek() {
        if line.starts_with("--- ") {
            patches.push(parse_file_section(&mut lines)?);
        } else {
            lines.next();
        }
    }

    if patches.is_empty() {
        return Err(PatchError::Empty.into());
    }
    Ok(patches)
}

fn parse_file_section<'a, I>(lines: &mut std::iter::Peekable<I>) -> Result<Patch, Error>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let (old_line_no, old_header) = lines.next().ok_or_else(|| parse_error(0, "missing --- header"))?;
    let old_path = header_path(old_header, "--- ")
        .ok_or_else(|| parse_error(old_line_no + 1, "malformed --- header"))?;

    let (new_line_no, new_header) = lines
        .next()
        .ok_or_else(|| parse_error(old_line_no + 2, "missing +++ header"))?;
    let new_path = header_path(new_header, "+++ ")
        .ok_or_else(|| parse_error(new_line_no + 1, "malformed +++ header"))?;

    let mut hunks = Vec::new();
    while let Some(&(line_no, line)) = lines.peek() {
        if !line.starts_with("@@ ") {
            break;
        }
        lines.next();
        hunks.push(parse_hunk(line_no, line, lines)?);
    }

    if hunks.is_empty() {
        return Err(parse_error(new_line_no + 2, "file section has no hunks"));
    }

    Ok(Patch {
        old_path,
        new_path,
        hunks,
    })
}

fn parse_hunk<'a, I>(
    header_no: usize,
    header: &str,
    lines: &mut std::iter::Peekable<I>,
) -> Result<Hunk, Error>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let (old_start, old_len, new_start, new_len) =
        parse_hunk_header(header).ok_or_else(|| parse_error(header_no + 1, "malformed @@ header"))?;

    let mut body = Vec::new();
    let mut old_seen = 0;
    let mut new_seen = 0;

    while old_seen < old_len || new_seen < new_len {
        let Some(&(line_no, line)) = lines.peek() else {
            return Err(parse_error(header_no + 1, "hunk body truncated"));
        };

        let hunk_line = match line.as_bytes().first() {
            Some(b' ') => {
                old_seen += 1;
                new_seen += 1;
                HunkLine::Context(line[1..].to_string())
            }
            Some(b'-') => {
                old_seen += 1;
                HunkLine::Removed(line[1..].to_string())
            }
            Some(b'+') => {
                new_seen += 1;
                HunkLine::Added(line[1..].to_string())
            }
            Some(b'\\') => {
                // "\ No newline at end of file" marker; line-wise
                // application preserves the target's trailing newline.
                lines.next();
                continue;
            }
            // Some producers emit a bare empty line for empty context.
            None => {
                old_seen += 1;
                new_seen += 1;
                HunkLine::Context(String::new())
            }
            _ => {
                return Err(parse_error(line_no + 1, "unexpected line in hunk body"));
            }
        };
        lines.next();
        body.push(hunk_line);
    }

    // Trailing no-newline marker after the last body line.
    if let Some(&(_, line)) = lines.peek() {
        if line.starts_with('\\') {
            lines.next();
        }
    }

    let hunk = Hunk {
        old_start,
        old_len,
        new_start,
        new_len,
        lines: body,
    };

    if hunk.old_line_count() != old_len || hunk.new_line_count() != new_len {
        return Err(parse_error(
            header_no + 1,
            "hunk body does not match @@ header counts",
        ));
    }

    Ok(hunk)
}

/// Parse `@@ -l[,s] +l[,s] @@` into (old_start, old_len, new_start, new_len).
fn parse_hunk_header(header: &str) -> Option<(usize, usize, usize, usize)> {
    let rest = header.strip_prefix("@@ -")?;
    let (old_range, rest) = rest.split_once(" +")?;
    let (new_range, _) = rest.split_once(" @@")?;

    let (old_start, old_len) = parse_range(old_range)?;
    let (new_start, new_len) = parse_range(new_range)?;
    Some((old_start, old_len, new_start, new_len))
}

fn parse_range(range: &str) -> Option<(usize, usize)> {
    match range.split_once(',') {
        Some((start, len)) => Some((start.parse().ok()?, len.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

/// Extract the path from a `---`/`+++` header, dropping the timestamp
/// that follows a tab.
fn header_path(line: &str, prefix: &str) -> Option<String> {
    let rest = line.strip_prefix(prefix)?;
    let path = rest.split('\t').next()?.trim_end();
    if path.is_empty() {
        return None;
    }
    Some(path.to_string())
}

fn parse_error(line: usize, message: &str) -> Error {
    PatchError::ParseError {
        line,
        message: message.to_string(),
    }
    .into()
}
