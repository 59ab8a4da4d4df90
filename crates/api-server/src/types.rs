//! API request and response types

use std::collections::BTreeMap;

use cert_verify_common::DocumentKind;
use cert_verify_extraction::VerificationResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok" when the server is up
    pub status: String,
    /// Server version
    pub version: String,
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error message
    pub error: String,
}

/// Response to a successful certificate upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Database identifier of the stored certificate
    pub id: i32,

    /// Document kind derived from the upload filename
    pub file_type: DocumentKind,

    /// Document summary (AI or deterministic fallback)
    pub summary: String,

    /// Fields extracted from the OCR text
    pub extracted_fields: BTreeMap<String, String>,

    /// Verification outcome when both a name and a registration number were
    /// extracted; null otherwise
    pub verification: Option<VerificationResult>,

    /// Mirrors the verification confidence; 0.0 when no verification ran
    pub confidence_score: f64,
}

/// Query parameters for the certificate listing
#[derive(Debug, Clone, Deserialize)]
pub struct ListQuery {
    /// Page size, clamped server-side
    pub limit: Option<i64>,
    /// Rows to skip
    pub offset: Option<i64>,
}

/// One row in the certificate listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateSummary {
    /// Database identifier
    pub id: i32,

    /// Processing status
    pub status: String,

    /// Insertion timestamp
    pub created_at: DateTime<Utc>,

    /// Stored summary, truncated for the listing
    pub summary: Option<String>,
}

/// Response to the certificate listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListCertificatesResponse {
    /// Certificates, newest first
    pub certificates: Vec<CertificateSummary>,

    /// Number of rows in this page
    pub count: usize,

    /// Effective limit after clamping
    pub limit: i64,

    /// Effective offset
    pub offset: i64,
}

/// One extracted field in the certificate detail response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldEntry {
    /// Field value as extracted
    pub value: Option<String>,

    /// Extraction confidence, when one was recorded
    pub confidence: Option<f32>,
}

/// Full certificate detail response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateResponse {
    /// Database identifier
    pub id: i32,

    /// Processing status
    pub status: String,

    /// Insertion timestamp
    pub created_at: DateTime<Utc>,

    /// Stored document summary
    pub summary: Option<String>,

    /// Extracted fields keyed by field name
    pub extracted_fields: BTreeMap<String, FieldEntry>,

    /// Number of extracted fields
    pub field_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_response_serialization() {
        let response = UploadResponse {
            id: 7,
            file_type: DocumentKind::Image,
            summary: "A degree certificate.".to_string(),
            extracted_fields: BTreeMap::from([(
                "student_name".to_string(),
                "Alice".to_string(),
            )]),
            verification: None,
            confidence_score: 0.0,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["file_type"], "image");
        assert!(json["verification"].is_null());
        assert_eq!(json["confidence_score"], 0.0);
        assert_eq!(json["extracted_fields"]["student_name"], "Alice");
    }

    #[test]
    fn test_list_query_deserialization() {
        let query: ListQuery = serde_json::from_str(r#"{"limit": 5}"#).unwrap();
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.offset, None);

        let query: ListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, None);
    }
}
