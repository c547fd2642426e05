/// Matching key for titles: lower-cased, punctuation replaced by spaces,
/// whitespace collapsed and trimmed.
///
/// Word characters are letters, digits and `_`; everything else that is not
/// whitespace counts as punctuation.
pub fn normalize_title(title: &str) -> String {
    let lowercase = title.to_lowercase();
    let cleaned: String = lowercase
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapses runs of whitespace (including newlines from Atom payloads).
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
