//! Verification matching between a submitted claim and a stored student record
//!
//! The caller resolves the stored record (case-insensitive registration-number
//! lookup) and hands it here; the matcher itself is a pure comparison that
//! enumerates every checked field and a list of the mismatched ones.

use serde::{Deserialize, Serialize};

use crate::normalize::normalize_for_match;

/// Absolute difference under which two numeric grades are considered equal.
/// Absorbs rounding/representation differences ("6.10" vs "6.1").
pub const GRADE_TOLERANCE: f64 = 0.1;

/// Confidence reported on a successful verification. This is a flat placeholder
/// constant carried over from the source system, not a computed probability.
pub const VERIFIED_CONFIDENCE: f64 = 0.8;

/// Submitted identity and grade claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationClaim {
    pub student_name: String,
    pub enrollment_number: String,
    #[serde(default)]
    pub cgpa: Option<String>,
    #[serde(default)]
    pub sgpa: Option<String>,
}

/// Stored student data the claim is compared against
#[derive(Debug, Clone)]
pub struct StoredStudent {
    pub name: String,
    pub reg_no: String,
    pub cgpa: Option<String>,
    pub sgpa: Option<String>,
}

/// Overall verdict of a verification attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    Verified,
    Mismatch,
    NotFound,
}

/// One field-level comparison. `matched` is `None` when the field was not
/// supplied or has no stored counterpart (not applicable).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldComparison {
    pub field: String,
    pub submitted: Option<String>,
    pub stored: Option<String>,
    pub matched: Option<bool>,
}

/// Full verification result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verified: bool,
    pub status: VerificationStatus,
    pub confidence_score: f64,
    pub field_comparisons: Vec<FieldComparison>,
    pub mismatches: Vec<FieldComparison>,
}

impl VerificationResult {
    fn not_found() -> Self {
        Self {
            verified: false,
            status: VerificationStatus::NotFound,
            confidence_score: 0.0,
            field_comparisons: Vec::new(),
            mismatches: Vec::new(),
        }
    }
}

/// Compare two grade values. Numeric comparison within [`GRADE_TOLERANCE`]
/// when both sides parse; otherwise trimmed case-insensitive string equality.
fn grades_match(submitted: &str, stored: &str) -> bool {
    match (submitted.trim().parse::<f64>(), stored.trim().parse::<f64>()) {
        (Ok(a), Ok(b)) => (a - b).abs() <= GRADE_TOLERANCE,
        _ => normalize_for_match(submitted) == normalize_for_match(stored),
    }
}

fn compare_grade(
    field: &str,
    submitted: Option<&String>,
    stored: Option<&String>,
) -> FieldComparison {
    let matched = match (submitted, stored) {
        (Some(sub), Some(sto)) => Some(grades_match(sub, sto)),
        // Grades are optional corroborating evidence; absence on either side
        // never blocks verification.
        _ => None,
    };
    FieldComparison {
        field: field.to_string(),
        submitted: submitted.cloned(),
        stored: stored.cloned(),
        matched,
    }
}

/// Match a submitted claim against an optionally found stored record.
#[must_use]
pub fn verify_claim(
    claim: &VerificationClaim,
    stored: Option<&StoredStudent>,
) -> VerificationResult {
    let Some(student) = stored else {
        return VerificationResult::not_found();
    };

    let mut comparisons = Vec::with_capacity(4);

    comparisons.push(FieldComparison {
        field: "student_name".to_string(),
        submitted: Some(claim.student_name.clone()),
        stored: Some(student.name.clone()),
        matched: Some(
            normalize_for_match(&claim.student_name) == normalize_for_match(&student.name),
        ),
    });

    // The record was found by registration number, so this always matches;
    // it is enumerated so the caller sees every checked field.
    comparisons.push(FieldComparison {
        field: "enrollment_number".to_string(),
        submitted: Some(claim.enrollment_number.clone()),
        stored: Some(student.reg_no.clone()),
        matched: Some(
            normalize_for_match(&claim.enrollment_number) == normalize_for_match(&student.reg_no),
        ),
    });

    comparisons.push(compare_grade("cgpa", claim.cgpa.as_ref(), student.cgpa.as_ref()));
    comparisons.push(compare_grade("sgpa", claim.sgpa.as_ref(), student.sgpa.as_ref()));

    let mismatches: Vec<FieldComparison> = comparisons
        .iter()
        .filter(|c| c.matched == Some(false))
        .cloned()
        .collect();

    if mismatches.is_empty() {
        VerificationResult {
            verified: true,
            status: VerificationStatus::Verified,
            confidence_score: VERIFIED_CONFIDENCE,
            field_comparisons: comparisons,
            mismatches,
        }
    } else {
        VerificationResult {
            verified: false,
            status: VerificationStatus::Mismatch,
            confidence_score: 0.0,
            field_comparisons: comparisons,
            mismatches,
        }
    }
}
