//! Field extraction and verification matching for certificate documents
//!
//! This crate holds the pure logic of the service: normalizing raw OCR text,
//! scanning it for labelled fields, and comparing a submitted claim against a
//! stored student record. Nothing here performs I/O; the api-server crate
//! wires these functions to OCR output and the database.

pub mod extract;
pub mod normalize;
pub mod verify;

pub use extract::{extract_fields, RAW_FALLBACK_KEY, RAW_FALLBACK_LIMIT};
pub use normalize::{normalize_for_match, normalized_lines};
pub use verify::{
    verify_claim, FieldComparison, StoredStudent, VerificationClaim, VerificationResult,
    VerificationStatus, GRADE_TOLERANCE, VERIFIED_CONFIDENCE,
};
