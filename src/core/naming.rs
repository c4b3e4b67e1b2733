//! core::naming
//!
//! Naming rule for users and groups.
//!
//! # Rule
//!
//! - Must not be empty
//! - First character is an ASCII letter or digit
//! - Remaining characters are ASCII letters, digits, or one of `-_.@`
//!
//! Because the first character can never be `.`, a valid name can never be
//! `.`, `..`, or collide with the store's hidden entries (`.tmp`, `.lock`).

/// Punctuation allowed after the first character.
pub const EXTRA_NAME_CHARS: [char; 4] = ['-', '_', '.', '@'];

/// Check a name against the naming rule.
///
/// # Example
///
/// ```
/// use whawty_groups::core::naming::is_valid_name;
///
/// assert!(is_valid_name("hugo@example.com"));
/// assert!(!is_valid_name("@hugo"));
/// ```
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || EXTRA_NAME_CHARS.contains(&c))
}

/// Describe why a name is invalid, for error messages.
///
/// Returns `None` when the name is valid.
pub fn explain_invalid(name: &str) -> Option<String> {
    let first = match name.chars().next() {
        None => return Some("name cannot be empty".into()),
        Some(c) => c,
    };
    if !first.is_ascii_alphanumeric() {
        return Some(format!("name must start with a letter or digit, not '{first}'"));
    }
    name.chars()
        .find(|c| !(c.is_ascii_alphanumeric() || EXTRA_NAME_CHARS.contains(c)))
        .map(|c| format!("name cannot contain '{c}'"))
}
