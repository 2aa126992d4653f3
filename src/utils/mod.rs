/// Normalize raw search text consistently for both storage and lookup.
/// Strips leading and trailing whitespace and lowercases the string.
/// Whitespace runs inside the string are left alone.
pub fn normalize_phrase(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[test]
fn test_normalize_phrase() {
    assert_eq!(normalize_phrase("Test phrase "), "test phrase");
    assert_eq!(normalize_phrase("  SHOUTING\t"), "shouting");
    assert_eq!(normalize_phrase("already normal"), "already normal");

    // Internal whitespace runs are preserved as-is.
    assert_eq!(normalize_phrase(" two  spaces "), "two  spaces");

    assert_eq!(normalize_phrase("   "), "");
    assert_eq!(normalize_phrase(""), "");
}
