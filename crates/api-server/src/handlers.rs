//! HTTP request handlers for API endpoints

use std::collections::BTreeMap;
use std::path::{Path as FsPath, PathBuf};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use cert_verify_common::{content_type_for, DocumentKind, ProcessingError};
use cert_verify_extraction::{extract_fields, verify_claim, StoredStudent, VerificationClaim};
use cert_verify_storage::{NewCertificate, NewField, StorageError, SUMMARY_FIELD_KEY};

use crate::types::{
    CertificateResponse, CertificateSummary, ErrorBody, FieldEntry, HealthResponse,
    ListCertificatesResponse, ListQuery, UploadResponse,
};
use crate::ApiState;

/// Default page size for the certificate listing
pub const DEFAULT_LIST_LIMIT: i64 = 20;

/// Maximum page size for the certificate listing
pub const MAX_LIST_LIMIT: i64 = 100;

/// Characters of summary shown in the listing
const LIST_SUMMARY_CHARS: usize = 200;

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

fn bad_request(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, message)
}

fn not_found(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::NOT_FOUND, message)
}

fn internal(message: impl Into<String>) -> ApiError {
    let message = message.into();
    error!("{}", message);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, message)
}

/// Map a pipeline error to its HTTP status. Validation failures are the
/// client's fault; everything else is a processing error.
fn processing_error_response(err: &ProcessingError) -> ApiError {
    let status = match err {
        ProcessingError::UnsupportedFileType(_)
        | ProcessingError::EmptyUpload(_)
        | ProcessingError::NoTextExtracted => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("{}", err);
    }
    api_error(status, err.to_string())
}

/// Validate an upload before any OCR or storage work
fn validate_upload(filename: &str, data: &[u8]) -> Result<DocumentKind, ProcessingError> {
    if filename.is_empty() {
        return Err(ProcessingError::EmptyUpload("no file selected".to_string()));
    }
    let Some(kind) = DocumentKind::from_filename(filename) else {
        return Err(ProcessingError::UnsupportedFileType(filename.to_string()));
    };
    if data.is_empty() {
        return Err(ProcessingError::EmptyUpload(filename.to_string()));
    }
    Ok(kind)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Upload a certificate document for processing
///
/// Pipeline: validate → store file → OCR → field extraction → summary →
/// optional verification → one DB transaction. Validation failures reject
/// with 400 before any OCR or storage work.
pub async fn upload_certificate(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    // Locate the file part
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| bad_request(format!("Failed to read upload: {e}")))?;
            upload = Some((filename, data.to_vec()));
            break;
        }
    }

    let Some((filename, data)) = upload else {
        return Err(bad_request("No file part in request"));
    };
    let kind = validate_upload(&filename, &data).map_err(|e| processing_error_response(&e))?;

    // Store under a unique name; only the basename of the client filename is kept
    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(|e| internal(format!("Failed to create upload directory: {e}")))?;
    let safe_name = FsPath::new(&filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    let stored_path = state
        .upload_dir
        .join(format!("{}_{}", Uuid::new_v4(), safe_name));
    tokio::fs::write(&stored_path, &data)
        .await
        .map_err(|e| internal(format!("Failed to store upload: {e}")))?;

    info!(
        "Stored upload {} as {} ({} bytes)",
        filename,
        stored_path.display(),
        data.len()
    );

    // Invalid or unprocessable documents must not accumulate on disk
    match process_document(&state, &stored_path, kind).await {
        Ok(response) => Ok(response),
        Err(e) => {
            let _ = tokio::fs::remove_file(&stored_path).await;
            Err(e)
        }
    }
}

/// Run the pipeline over a stored document: OCR, extraction, summary,
/// optional verification, one DB transaction. The caller removes the stored
/// file when this fails.
async fn process_document(
    state: &ApiState,
    stored_path: &FsPath,
    kind: DocumentKind,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    // OCR is blocking work
    let ocr = state.ocr.clone();
    let ocr_path = stored_path.to_path_buf();
    let text = tokio::task::spawn_blocking(move || ocr.read_text(&ocr_path))
        .await
        .map_err(|e| internal(format!("OCR task panicked: {e}")))?
        .map_err(|e| processing_error_response(&ProcessingError::OcrError(e.to_string())))?;

    if text.trim().is_empty() {
        return Err(processing_error_response(&ProcessingError::NoTextExtracted));
    }

    let fields = extract_fields(&text);
    let summary = state.summarizer.summarize(&text).await;

    // Verify against the roster when both identity fields were extracted
    let mut student_id = None;
    let verification = match (fields.get("student_name"), fields.get("registration_no")) {
        (Some(name), Some(reg_no)) => {
            let student = state
                .storage
                .find_student_by_reg_no(reg_no)
                .await
                .map_err(|e| internal(format!("Student lookup failed: {e}")))?;

            let stored = student.as_ref().map(|s| StoredStudent {
                name: s.name.clone(),
                reg_no: s.reg_no.clone().unwrap_or_default(),
                cgpa: s.cgpa.clone(),
                sgpa: s.sgpa.clone(),
            });

            let claim = VerificationClaim {
                student_name: name.clone(),
                enrollment_number: reg_no.clone(),
                cgpa: fields.get("cgpa").cloned(),
                sgpa: fields.get("sgpa").cloned(),
            };
            let result = verify_claim(&claim, stored.as_ref());
            if result.verified {
                student_id = student.map(|s| s.id);
            }
            Some(result)
        }
        _ => {
            warn!("Skipping verification: name or registration number not extracted");
            None
        }
    };
    let confidence_score = verification.as_ref().map_or(0.0, |v| v.confidence_score);

    // Persist certificate and fields in one transaction
    let mut new_fields: Vec<NewField> = fields
        .iter()
        .map(|(key, value)| NewField {
            key: key.clone(),
            value: Some(value.clone()),
            confidence: None,
        })
        .collect();
    new_fields.push(NewField {
        key: SUMMARY_FIELD_KEY.to_string(),
        value: Some(summary.text().to_string()),
        confidence: None,
    });

    let record = state
        .storage
        .create_certificate(&NewCertificate {
            student_id,
            image_path: stored_path.to_string_lossy().into_owned(),
            status: "processed".to_string(),
            fields: new_fields,
        })
        .await
        .map_err(|e| internal(format!("Failed to store certificate: {e}")))?;

    info!(
        "Certificate {} processed: {} fields extracted, verification {}",
        record.id,
        fields.len(),
        verification
            .as_ref()
            .map_or("skipped", |v| if v.verified { "passed" } else { "failed" })
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            id: record.id,
            file_type: kind,
            summary: summary.text().to_string(),
            extracted_fields: fields,
            verification,
            confidence_score,
        }),
    ))
}

/// List stored certificates, newest first
pub async fn list_certificates(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = clamp_limit(query.limit);
    let offset = query.offset.unwrap_or(0).max(0);

    let items = state
        .storage
        .list_certificates(limit, offset)
        .await
        .map_err(|e| internal(format!("Failed to list certificates: {e}")))?;

    let certificates: Vec<CertificateSummary> = items
        .into_iter()
        .map(|item| CertificateSummary {
            id: item.id,
            status: item.status,
            created_at: item.created_at,
            summary: item.summary.map(|s| truncate_summary(&s)),
        })
        .collect();

    Ok(Json(ListCertificatesResponse {
        count: certificates.len(),
        certificates,
        limit,
        offset,
    }))
}

/// Retrieve one certificate with its extracted fields
pub async fn get_certificate(
    State(state): State<ApiState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = match state.storage.get_certificate(id).await {
        Ok(detail) => detail,
        Err(StorageError::NotFound(_)) => {
            return Err(not_found(format!("Certificate {id} not found")));
        }
        Err(e) => return Err(internal(format!("Failed to load certificate: {e}"))),
    };

    // The stored summary is surfaced as its own field, not among the extractions
    let mut summary = None;
    let mut extracted_fields = BTreeMap::new();
    for field in detail.fields {
        if field.key == SUMMARY_FIELD_KEY {
            summary = field.value;
        } else {
            extracted_fields.insert(
                field.key,
                FieldEntry {
                    value: field.value,
                    confidence: field.confidence,
                },
            );
        }
    }

    Ok(Json(CertificateResponse {
        id: detail.certificate.id,
        status: detail.certificate.status,
        created_at: detail.certificate.created_at,
        summary,
        field_count: extracted_fields.len(),
        extracted_fields,
    }))
}

/// Stream the stored document for a certificate
pub async fn get_certificate_image(
    State(state): State<ApiState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = match state.storage.get_certificate(id).await {
        Ok(detail) => detail,
        Err(StorageError::NotFound(_)) => {
            return Err(not_found(format!("Certificate {id} not found")));
        }
        Err(e) => return Err(internal(format!("Failed to load certificate: {e}"))),
    };

    let image_path = PathBuf::from(&detail.certificate.image_path);
    let data = tokio::fs::read(&image_path).await.map_err(|_| {
        warn!("Stored file missing for certificate {id}: {}", image_path.display());
        not_found(format!("Stored file for certificate {id} is missing"))
    })?;

    let content_type = content_type_for(&detail.certificate.image_path);
    Ok(([(header::CONTENT_TYPE, content_type)], data))
}

/// Verify a submitted claim against the student roster
pub async fn verify_student(
    State(state): State<ApiState>,
    Json(claim): Json<VerificationClaim>,
) -> Result<impl IntoResponse, ApiError> {
    let student = state
        .storage
        .find_student_by_reg_no(&claim.enrollment_number)
        .await
        .map_err(|e| internal(format!("Student lookup failed: {e}")))?;

    let stored = student.map(|s| StoredStudent {
        name: s.name,
        reg_no: s.reg_no.unwrap_or_default(),
        cgpa: s.cgpa,
        sgpa: s.sgpa,
    });

    Ok(Json(verify_claim(&claim, stored.as_ref())))
}

/// Clamp a requested page size into `[1, MAX_LIST_LIMIT]`, defaulting when absent
fn clamp_limit(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}

/// Shorten a stored summary for the listing view
fn truncate_summary(summary: &str) -> String {
    if summary.chars().count() <= LIST_SUMMARY_CHARS {
        return summary.to_string();
    }
    let mut truncated: String = summary.chars().take(LIST_SUMMARY_CHARS).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_LIST_LIMIT);
        assert_eq!(clamp_limit(Some(5)), 5);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-3)), 1);
        assert_eq!(clamp_limit(Some(1000)), MAX_LIST_LIMIT);
    }

    #[test]
    fn test_truncate_summary_short_text_unchanged() {
        assert_eq!(truncate_summary("short"), "short");
    }

    #[test]
    fn test_validate_upload() {
        assert_eq!(
            validate_upload("cert.png", b"data").unwrap(),
            DocumentKind::Image
        );
        assert_eq!(
            validate_upload("cert.pdf", b"data").unwrap(),
            DocumentKind::Pdf
        );
        assert!(matches!(
            validate_upload("", b"data"),
            Err(ProcessingError::EmptyUpload(_))
        ));
        assert!(matches!(
            validate_upload("cert.exe", b"data"),
            Err(ProcessingError::UnsupportedFileType(_))
        ));
        assert!(matches!(
            validate_upload("cert.png", b""),
            Err(ProcessingError::EmptyUpload(_))
        ));
    }

    #[test]
    fn test_processing_error_statuses() {
        let (status, _) =
            processing_error_response(&ProcessingError::UnsupportedFileType("x.exe".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = processing_error_response(&ProcessingError::NoTextExtracted);
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) =
            processing_error_response(&ProcessingError::OcrError("engine exploded".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) =
            processing_error_response(&ProcessingError::StorageError("db down".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_truncate_summary_long_text() {
        let long = "z".repeat(300);
        let truncated = truncate_summary(&long);
        assert_eq!(truncated.chars().count(), LIST_SUMMARY_CHARS + 3);
        assert!(truncated.ends_with("..."));
    }
}
