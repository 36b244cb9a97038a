/// Collapse every whitespace run into a single space and trim the ends.
///
/// Reference scripts arrive as free-form text files; normalizing here keeps
/// token indices stable no matter how the file was wrapped.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into alignment tokens on Unicode whitespace.
pub fn tokenize_words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}
