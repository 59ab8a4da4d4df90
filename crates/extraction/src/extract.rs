//! Heuristic label/value extraction from OCR text
//!
//! Scans each line for a fixed set of label keywords and a `:` delimiter and
//! maps the text after the delimiter to a derived field key. A line may
//! satisfy several keywords at once ("Name and Registration: ..."), in which
//! case it contributes every matching field.

use std::collections::BTreeMap;

use crate::normalize::normalized_lines;

/// Field key used when no keyword matched anywhere in the document
pub const RAW_FALLBACK_KEY: &str = "raw";

/// Maximum length of the raw fallback value
pub const RAW_FALLBACK_LIMIT: usize = 500;

/// Label keyword (matched against the lower-cased line) and the field key it
/// produces. Listed in precedence order for readability; precedence only
/// matters across lines, where the first matching line wins.
const KEYWORDS: &[(&str, &str)] = &[
    ("name", "student_name"),
    ("registration", "registration_no"),
    ("degree", "degree"),
    ("date of birth", "date_of_birth"),
    ("year", "year"),
    ("class", "classification"),
];

/// Extract labelled fields from raw OCR text.
///
/// First match wins: once a key has a value, later lines do not overwrite it.
/// When no keyword matches on any line, the result is a single `raw` field
/// holding the first 500 characters of the input. Never fails; empty or
/// garbage input degrades to the `raw` fallback.
#[must_use]
pub fn extract_fields(ocr_text: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();

    for line in normalized_lines(ocr_text) {
        let lower = line.to_lowercase();
        let Some((_, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();

        for (keyword, key) in KEYWORDS {
            if lower.contains(keyword) && !out.contains_key(*key) {
                out.insert((*key).to_string(), value.to_string());
            }
        }
    }

    if out.is_empty() {
        let raw: String = ocr_text.chars().take(RAW_FALLBACK_LIMIT).collect();
        out.insert(RAW_FALLBACK_KEY.to_string(), raw);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_student_name() {
        let fields = extract_fields("Name: Prashant Singh\n");
        assert_eq!(fields.get("student_name").unwrap(), "Prashant Singh");
    }

    #[test]
    fn test_extracts_all_known_labels() {
        let text = "Name: Alice Example\n\
                    Registration No: 231B225\n\
                    Degree: B.Tech Computer Science\n\
                    Date of Birth: 2001-04-12\n\
                    Year of Passing: 2023\n\
                    Class: First Division";
        let fields = extract_fields(text);
        assert_eq!(fields.get("student_name").unwrap(), "Alice Example");
        assert_eq!(fields.get("registration_no").unwrap(), "231B225");
        assert_eq!(fields.get("degree").unwrap(), "B.Tech Computer Science");
        assert_eq!(fields.get("date_of_birth").unwrap(), "2001-04-12");
        assert_eq!(fields.get("year").unwrap(), "2023");
        assert_eq!(fields.get("classification").unwrap(), "First Division");
    }

    #[test]
    fn test_value_is_everything_after_first_colon() {
        let fields = extract_fields("Name: Singh: Prashant");
        assert_eq!(fields.get("student_name").unwrap(), "Singh: Prashant");
    }

    #[test]
    fn test_keyword_without_delimiter_is_ignored() {
        let fields = extract_fields("Name Prashant Singh");
        assert_eq!(fields.len(), 1);
        assert!(fields.contains_key(RAW_FALLBACK_KEY));
    }

    #[test]
    fn test_first_match_wins() {
        let fields = extract_fields("Name: First\nName: Second");
        assert_eq!(fields.get("student_name").unwrap(), "First");
    }

    #[test]
    fn test_line_matching_multiple_keywords() {
        let fields = extract_fields("Name and Registration: combined value");
        assert_eq!(fields.get("student_name").unwrap(), "combined value");
        assert_eq!(fields.get("registration_no").unwrap(), "combined value");
    }

    #[test]
    fn test_raw_fallback_when_nothing_matched() {
        let text = "Lorem ipsum dolor sit amet";
        let fields = extract_fields(text);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get(RAW_FALLBACK_KEY).unwrap(), text);
    }

    #[test]
    fn test_raw_fallback_is_capped_at_500_chars() {
        let text = "x".repeat(800);
        let fields = extract_fields(&text);
        assert_eq!(fields.get(RAW_FALLBACK_KEY).unwrap().len(), RAW_FALLBACK_LIMIT);
    }

    #[test]
    fn test_empty_input_degrades_to_empty_raw() {
        let fields = extract_fields("");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get(RAW_FALLBACK_KEY).unwrap(), "");
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let fields = extract_fields("NAME: Bob\nDEGREE: MSc");
        assert_eq!(fields.get("student_name").unwrap(), "Bob");
        assert_eq!(fields.get("degree").unwrap(), "MSc");
    }
}
