use chrono::{DateTime, Utc};

/// Archive file extension, without the dot.
pub const ARCHIVE_EXTENSION: &str = "infbk";

/// Keep ASCII letters, digits, `-` and `_`; map spaces to `_`; drop the rest.
/// An empty result becomes `"backup"`.
pub fn sanitize_filename(name: &str) -> String {
    let out: String = name
        .chars()
        .filter_map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => Some(c),
            ' ' => Some('_'),
            _ => None,
        })
        .collect();
    if out.is_empty() {
        "backup".to_string()
    } else {
        out
    }
}

/// `<sanitized-name>_<YYYYMMDD_HHMMSS>.infbk`
pub fn archive_filename(project_name: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}_{}.{ARCHIVE_EXTENSION}",
        sanitize_filename(project_name),
        at.format("%Y%m%d_%H%M%S")
    )
}
