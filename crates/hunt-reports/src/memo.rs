//! Free-form mob notes.

use hunt_types::MemoEntry;

use crate::error::ReportError;

/// Trim and check a memo's text.
///
/// # Errors
///
/// Returns [`ReportError::InvalidMemo`] if the text is blank or longer than
/// `max_chars` characters.
pub fn validate_memo(text: &str, max_chars: usize) -> Result<String, ReportError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ReportError::InvalidMemo(String::from("memo must not be empty")));
    }
    if text.chars().count() > max_chars {
        return Err(ReportError::InvalidMemo(format!(
            "memo exceeds {max_chars} characters"
        )));
    }
    Ok(text.to_owned())
}

/// Order memos newest first.
pub fn newest_first(mut memos: Vec<MemoEntry>) -> Vec<MemoEntry> {
    memos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    memos
}
