//! Search term derivation.
//!
//! Library full-text search misses long decorated titles such as
//! `"Song (Remastered 2011) [Live]"`, so trailing bracketed groups are dropped
//! and separator punctuation is blanked before searching.

const SEPARATORS: [char; 7] = ['[', ']', '(', ')', '-', '.', ','];

/// Derive a library search term from a song title.
///
/// Trailing `(...)` and `[...]` groups are removed as long as something is
/// left, then `[ ] ( ) - . ,` become spaces and whitespace is collapsed.
///
/// # Examples
///
/// ```
/// use core_library::derive_search_term;
///
/// assert_eq!(derive_search_term("Song Title (Remastered) [Live]"), "Song Title");
/// assert_eq!(derive_search_term("Mr. Blue Sky"), "Mr Blue Sky");
/// assert_eq!(derive_search_term("(Intro)"), "Intro");
/// ```
pub fn derive_search_term(title: &str) -> String {
    let mut base = title.trim();

    while let Some(stripped) = strip_trailing_group(base) {
        if stripped.is_empty() {
            break;
        }
        base = stripped;
    }

    base.chars()
        .map(|c| if SEPARATORS.contains(&c) { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_trailing_group(title: &str) -> Option<&str> {
    let open = match title.chars().last()? {
        ')' => '(',
        ']' => '[',
        _ => return None,
    };
    let start = title.rfind(open)?;
    Some(title[..start].trim_end())
}
