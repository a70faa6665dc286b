//! Storage names for uploaded documents and organization namespaces

use regex::Regex;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};

fn unsafe_chars() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("static pattern"))
}

/// Reduce an uploaded filename to a flat, ASCII-only storage name
///
/// Accented letters fold to their ASCII base (NFKD, combining marks
/// dropped), path separators become spaces, whitespace runs become `_`,
/// everything outside `[A-Za-z0-9_.-]` is dropped, and leading/trailing `.` and `_`
/// are trimmed. A name with nothing left is rejected.
pub fn secure_filename(filename: &str) -> Result<String> {
    let folded: String = filename.nfkd().filter(char::is_ascii).collect();
    let flattened = folded.replace(['/', '\\'], " ");
    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let stripped = unsafe_chars().replace_all(&joined, "");
    let name = stripped.trim_matches(|c| c == '.' || c == '_');

    if name.is_empty() {
        return Err(Error::validation(format!(
            "Filename {:?} has no usable characters",
            filename
        )));
    }
    Ok(name.to_string())
}

/// Storage namespace that holds an organization's documents
pub fn namespace_for(organization_id: &str, suffix: &str) -> String {
    format!("{}{}", organization_id, suffix)
}
