//! Filesystem-safe naming.

/// Maximum length of a sanitized name, in characters.
pub const MAX_NAME_CHARS: usize = 180;

const RESERVED: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Maps arbitrary display text to a name that is safe to use as a file name.
///
/// Reserved characters and control characters are removed, the result is
/// capped at [`MAX_NAME_CHARS`] characters, and surrounding whitespace plus
/// trailing dots are trimmed. Truncation happens before trimming so that the
/// function is idempotent.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !RESERVED.contains(c) && !c.is_control())
        .collect();

    let trimmed = trim_name(&cleaned);
    let truncated: String = trimmed.chars().take(MAX_NAME_CHARS).collect();
    trim_name(&truncated).to_string()
}

fn trim_name(name: &str) -> &str {
    name.trim_start()
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace())
}

/// Splits a file name into stem and extension (`"a.mp3"` -> `("a", Some("mp3"))`).
pub fn split_extension(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < file_name.len() => {
            (&file_name[..idx], Some(&file_name[idx + 1..]))
        }
        _ => (file_name, None),
    }
}

/// Returns `file_name` with ` (n)` inserted before the extension.
pub fn with_counter(file_name: &str, n: usize) -> String {
    match split_extension(file_name) {
        (stem, Some(ext)) => format!("{} ({}).{}", stem, n, ext),
        (stem, None) => format!("{} ({})", stem, n),
    }
}
