//! Storage layer for the certificate verification service
//!
//! Structured data lives in `PostgreSQL` across three tables:
//! - **students**: the verification roster (name, registration number, grades)
//! - **certificates**: one row per uploaded document
//! - **extracted_fields**: key/value pairs extracted from each document,
//!   removed with their certificate via `ON DELETE CASCADE`
//!
//! Uploaded files themselves stay on the local filesystem; only their stored
//! path is recorded here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod certificate_storage;

pub use certificate_storage::{
    CertificateStorage, PostgresCertificateStorage, PostgresConfig, SUMMARY_FIELD_KEY,
};

/// Storage layer errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("PostgreSQL error: {0}")]
    PostgresError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A student row from the verification roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    /// Database identifier
    pub id: i32,

    /// Full name as enrolled
    pub name: String,

    /// Date of birth as recorded, if any
    pub dob: Option<String>,

    /// Registration / enrollment number, unique when present
    pub reg_no: Option<String>,

    /// Cumulative GPA as recorded, if any
    pub cgpa: Option<String>,

    /// Semester GPA as recorded, if any
    pub sgpa: Option<String>,

    /// Insertion timestamp
    pub created_at: DateTime<Utc>,
}

/// A student to insert into the roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStudent {
    /// Full name as enrolled
    pub name: String,

    /// Date of birth, if known
    pub dob: Option<String>,

    /// Registration / enrollment number
    pub reg_no: Option<String>,

    /// Cumulative GPA, if known
    pub cgpa: Option<String>,

    /// Semester GPA, if known
    pub sgpa: Option<String>,
}

/// A stored certificate row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateRecord {
    /// Database identifier
    pub id: i32,

    /// Matched student, when verification found one
    pub student_id: Option<i32>,

    /// Path of the stored document on disk
    pub image_path: String,

    /// Processing status (e.g. "processed")
    pub status: String,

    /// Insertion timestamp
    pub created_at: DateTime<Utc>,
}

/// A certificate to persist, together with its extracted fields.
///
/// The certificate row and all field rows are written in one transaction, so
/// a failed field insert leaves no orphan certificate behind.
#[derive(Debug, Clone)]
pub struct NewCertificate {
    /// Matched student, when verification found one
    pub student_id: Option<i32>,

    /// Path of the stored document on disk
    pub image_path: String,

    /// Processing status
    pub status: String,

    /// Extracted fields, in insertion order
    pub fields: Vec<NewField>,
}

/// One extracted key/value pair to persist with a certificate
#[derive(Debug, Clone)]
pub struct NewField {
    /// Field key (e.g. "student_name")
    pub key: String,

    /// Field value as extracted
    pub value: Option<String>,

    /// Extraction confidence, when the producer reports one
    pub confidence: Option<f32>,
}

/// One extracted key/value pair belonging to a stored certificate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRecord {
    /// Field key (e.g. "student_name")
    pub key: String,

    /// Field value as extracted
    pub value: Option<String>,

    /// Extraction confidence, when one was recorded
    pub confidence: Option<f32>,
}

/// A certificate row as returned by the listing query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateListItem {
    /// Database identifier
    pub id: i32,

    /// Processing status
    pub status: String,

    /// Insertion timestamp
    pub created_at: DateTime<Utc>,

    /// Stored summary, when one was persisted with the certificate
    pub summary: Option<String>,
}

/// A certificate together with all of its extracted fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateDetail {
    /// The certificate row
    pub certificate: CertificateRecord,

    /// All extracted fields, in stored order
    pub fields: Vec<FieldRecord>,
}
