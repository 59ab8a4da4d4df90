//! Text normalization helpers for OCR output

/// Split raw OCR text into trimmed, non-empty lines.
#[must_use]
pub fn normalized_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

/// Normalize a value for case-insensitive comparison (trim + lower-case).
#[must_use]
pub fn normalize_for_match(value: &str) -> String {
    value.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_lines_drops_blanks() {
        let text = "Name: Alice\n\n   \nDegree: BSc\n";
        assert_eq!(normalized_lines(text), vec!["Name: Alice", "Degree: BSc"]);
    }

    #[test]
    fn test_normalized_lines_trims() {
        assert_eq!(normalized_lines("  a  \n\tb\t"), vec!["a", "b"]);
    }

    #[test]
    fn test_normalized_lines_empty_input() {
        assert!(normalized_lines("").is_empty());
        assert!(normalized_lines("\n\n  \n").is_empty());
    }

    #[test]
    fn test_normalize_for_match() {
        assert_eq!(normalize_for_match("  Prashant Singh "), "prashant singh");
        assert_eq!(normalize_for_match("231B225"), "231b225");
    }
}
