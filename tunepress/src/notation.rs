//! ABC tunebook text handling
//!
//! Line-level work only: splitting a tunebook into tunes, restoring the `X:`
//! marker, inserting the MIDI directive set, and pulling the index/title
//! header fields. The ABC grammar itself is abc2midi's problem.

/// Replace every character outside `[A-Za-z0-9_\-.]` with `_`.
///
/// Applied to every computed output stem before it touches the filesystem.
/// Idempotent.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Split a tunebook into raw tune bodies.
///
/// Bodies are the text between `X:` markers, in document order, marker
/// stripped. Anything before the first marker is file header, not a tune,
/// and is dropped. The split is a plain substring split, so a stray `X:`
/// inside a tune starts a new body; garbage in, garbage out.
pub fn split_tunes(document: &str) -> impl Iterator<Item = &str> {
    document.split("X:").skip(1)
}

/// Restore the `X:` marker and insert the directive set after the header line.
///
/// Insertion is positional: directives land between line 0 and line 1. The
/// `X:` field is single-line in ABC, so line 0 is the whole header.
pub fn inject_directives(body: &str, directives: &[String]) -> String {
    let restored = format!("X:{body}");
    let mut lines: Vec<String> = restored.split('\n').map(str::to_owned).collect();
    let tail = lines.split_off(1);
    lines.extend(directives.iter().cloned());
    lines.extend(tail);
    lines.join("\n")
}

/// Trimmed remainder of the first `X:` line, if any.
pub fn tune_index(tune: &str) -> Option<&str> {
    tune.lines()
        .find_map(|line| line.strip_prefix("X:"))
        .map(str::trim)
}

/// Trimmed remainder of the first `T:` line, if any.
pub fn tune_title(tune: &str) -> Option<&str> {
    tune.lines()
        .find_map(|line| line.strip_prefix("T:"))
        .map(str::trim)
}
