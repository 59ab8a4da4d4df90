//! Certificate storage implementation using `PostgreSQL`
//!
//! Persists uploaded certificates with their extracted fields and looks up
//! students from the verification roster.

use crate::{
    CertificateDetail, CertificateListItem, CertificateRecord, FieldRecord, NewCertificate,
    NewStudent, StorageError, StorageResult, StudentRecord,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_postgres::{Client, NoTls};

/// `PostgreSQL` configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// Full connection URL; when set it overrides the individual fields
    pub url: Option<String>,

    /// Database host
    pub host: String,

    /// Database port
    pub port: u16,

    /// Database name
    pub database: String,

    /// Database user
    pub user: String,

    /// Database password
    pub password: String,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("DATABASE_URL").ok(),
            host: std::env::var("POSTGRES_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("POSTGRES_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5432),
            database: std::env::var("POSTGRES_DB").unwrap_or_else(|_| "cert_verify".to_string()),
            user: std::env::var("POSTGRES_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("POSTGRES_PASSWORD").unwrap_or_default(),
        }
    }
}

impl PostgresConfig {
    /// Build connection string
    #[must_use]
    pub fn connection_string(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }

        format!(
            "host={} port={} dbname={} user={} password={}",
            self.host, self.port, self.database, self.user, self.password
        )
    }
}

/// Key under which the document summary is stored alongside extracted fields
pub const SUMMARY_FIELD_KEY: &str = "ai_summary";

/// Certificate storage trait
#[async_trait::async_trait]
pub trait CertificateStorage: Send + Sync {
    /// Initialize database schema (create tables if not exist)
    async fn init_schema(&self) -> StorageResult<()>;

    /// Persist a certificate with its extracted fields atomically
    async fn create_certificate(&self, cert: &NewCertificate) -> StorageResult<CertificateRecord>;

    /// List stored certificates, newest first
    async fn list_certificates(
        &self,
        limit: i64,
        offset: i64,
    ) -> StorageResult<Vec<CertificateListItem>>;

    /// Retrieve a certificate with all of its fields
    async fn get_certificate(&self, id: i32) -> StorageResult<CertificateDetail>;

    /// Look up a student by registration number, case-insensitively
    async fn find_student_by_reg_no(&self, reg_no: &str) -> StorageResult<Option<StudentRecord>>;

    /// Insert a student into the verification roster
    async fn insert_student(&self, student: &NewStudent) -> StorageResult<StudentRecord>;
}

/// `PostgreSQL` certificate storage implementation
pub struct PostgresCertificateStorage {
    // tokio-postgres transactions need &mut Client, but the trait takes &self
    client: Mutex<Client>,
}

impl PostgresCertificateStorage {
    /// Create a new `PostgreSQL` certificate storage client
    pub async fn new(config: PostgresConfig) -> StorageResult<Self> {
        let (client, connection) = tokio_postgres::connect(&config.connection_string(), NoTls)
            .await
            .map_err(|e| StorageError::PostgresError(e.to_string()))?;

        // Spawn connection in background
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {}", e);
            }
        });

        Ok(Self {
            client: Mutex::new(client),
        })
    }
}

#[async_trait::async_trait]
impl CertificateStorage for PostgresCertificateStorage {
    async fn init_schema(&self) -> StorageResult<()> {
        let client = self.client.lock().await;

        client
            .execute(
                r"
                CREATE TABLE IF NOT EXISTS students (
                    id SERIAL PRIMARY KEY,
                    name TEXT NOT NULL,
                    dob TEXT,
                    reg_no TEXT UNIQUE,
                    cgpa TEXT,
                    sgpa TEXT,
                    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT now()
                )
                ",
                &[],
            )
            .await
            .map_err(|e| StorageError::PostgresError(e.to_string()))?;

        client
            .execute(
                r"
                CREATE TABLE IF NOT EXISTS certificates (
                    id SERIAL PRIMARY KEY,
                    student_id INTEGER REFERENCES students(id),
                    image_path TEXT NOT NULL,
                    status TEXT NOT NULL DEFAULT 'processed',
                    created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT now()
                )
                ",
                &[],
            )
            .await
            .map_err(|e| StorageError::PostgresError(e.to_string()))?;

        client
            .execute(
                r"
                CREATE TABLE IF NOT EXISTS extracted_fields (
                    id SERIAL PRIMARY KEY,
                    certificate_id INTEGER NOT NULL
                        REFERENCES certificates(id) ON DELETE CASCADE,
                    key TEXT NOT NULL,
                    value TEXT,
                    confidence REAL
                )
                ",
                &[],
            )
            .await
            .map_err(|e| StorageError::PostgresError(e.to_string()))?;

        client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_fields_certificate_id \
                 ON extracted_fields(certificate_id)",
                &[],
            )
            .await
            .map_err(|e| StorageError::PostgresError(e.to_string()))?;

        client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_certificates_created_at \
                 ON certificates(created_at)",
                &[],
            )
            .await
            .map_err(|e| StorageError::PostgresError(e.to_string()))?;

        tracing::info!("PostgreSQL schema initialized");

        Ok(())
    }

    async fn create_certificate(&self, cert: &NewCertificate) -> StorageResult<CertificateRecord> {
        let mut client = self.client.lock().await;

        let transaction = client
            .transaction()
            .await
            .map_err(|e| StorageError::PostgresError(e.to_string()))?;

        let row = transaction
            .query_one(
                r"
                INSERT INTO certificates (student_id, image_path, status)
                VALUES ($1, $2, $3)
                RETURNING id, created_at
                ",
                &[&cert.student_id, &cert.image_path, &cert.status],
            )
            .await
            .map_err(|e| StorageError::PostgresError(e.to_string()))?;

        let id: i32 = row.get(0);

        for field in &cert.fields {
            transaction
                .execute(
                    "INSERT INTO extracted_fields (certificate_id, key, value, confidence) \
                     VALUES ($1, $2, $3, $4)",
                    &[&id, &field.key, &field.value, &field.confidence],
                )
                .await
                .map_err(|e| StorageError::PostgresError(e.to_string()))?;
        }

        // Dropping the transaction without commit rolls everything back
        transaction
            .commit()
            .await
            .map_err(|e| StorageError::PostgresError(e.to_string()))?;

        Ok(CertificateRecord {
            id,
            student_id: cert.student_id,
            image_path: cert.image_path.clone(),
            status: cert.status.clone(),
            created_at: row.get(1),
        })
    }

    async fn list_certificates(
        &self,
        limit: i64,
        offset: i64,
    ) -> StorageResult<Vec<CertificateListItem>> {
        let client = self.client.lock().await;

        let rows = client
            .query(
                r"
                SELECT c.id, c.status, c.created_at,
                       (SELECT f.value FROM extracted_fields f
                        WHERE f.certificate_id = c.id AND f.key = $3
                        LIMIT 1) AS summary
                FROM certificates c
                ORDER BY c.created_at DESC, c.id DESC
                LIMIT $1 OFFSET $2
                ",
                &[&limit, &offset, &SUMMARY_FIELD_KEY],
            )
            .await
            .map_err(|e| StorageError::PostgresError(e.to_string()))?;

        let items = rows
            .into_iter()
            .map(|row| CertificateListItem {
                id: row.get(0),
                status: row.get(1),
                created_at: row.get(2),
                summary: row.get(3),
            })
            .collect();

        Ok(items)
    }

    async fn get_certificate(&self, id: i32) -> StorageResult<CertificateDetail> {
        let client = self.client.lock().await;

        let row = client
            .query_opt(
                r"
                SELECT id, student_id, image_path, status, created_at
                FROM certificates
                WHERE id = $1
                ",
                &[&id],
            )
            .await
            .map_err(|e| StorageError::PostgresError(e.to_string()))?
            .ok_or_else(|| StorageError::NotFound(format!("certificate {id}")))?;

        let certificate = CertificateRecord {
            id: row.get(0),
            student_id: row.get(1),
            image_path: row.get(2),
            status: row.get(3),
            created_at: row.get(4),
        };

        let field_rows = client
            .query(
                r"
                SELECT key, value, confidence
                FROM extracted_fields
                WHERE certificate_id = $1
                ORDER BY id
                ",
                &[&id],
            )
            .await
            .map_err(|e| StorageError::PostgresError(e.to_string()))?;

        let fields = field_rows
            .into_iter()
            .map(|row| FieldRecord {
                key: row.get(0),
                value: row.get(1),
                confidence: row.get(2),
            })
            .collect();

        Ok(CertificateDetail {
            certificate,
            fields,
        })
    }

    async fn find_student_by_reg_no(&self, reg_no: &str) -> StorageResult<Option<StudentRecord>> {
        let client = self.client.lock().await;

        let row = client
            .query_opt(
                r"
                SELECT id, name, dob, reg_no, cgpa, sgpa, created_at
                FROM students
                WHERE reg_no IS NOT NULL AND LOWER(reg_no) = LOWER($1)
                ",
                &[&reg_no],
            )
            .await
            .map_err(|e| StorageError::PostgresError(e.to_string()))?;

        Ok(row.map(|row| StudentRecord {
            id: row.get(0),
            name: row.get(1),
            dob: row.get(2),
            reg_no: row.get(3),
            cgpa: row.get(4),
            sgpa: row.get(5),
            created_at: row.get(6),
        }))
    }

    async fn insert_student(&self, student: &NewStudent) -> StorageResult<StudentRecord> {
        let client = self.client.lock().await;

        let row = client
            .query_one(
                r"
                INSERT INTO students (name, dob, reg_no, cgpa, sgpa)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, created_at
                ",
                &[
                    &student.name,
                    &student.dob,
                    &student.reg_no,
                    &student.cgpa,
                    &student.sgpa,
                ],
            )
            .await
            .map_err(|e| StorageError::PostgresError(e.to_string()))?;

        Ok(StudentRecord {
            id: row.get(0),
            name: student.name.clone(),
            dob: student.dob.clone(),
            reg_no: student.reg_no.clone(),
            cgpa: student.cgpa.clone(),
            sgpa: student.sgpa.clone(),
            created_at: row.get(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_config_connection_string_from_parts() {
        let config = PostgresConfig {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            database: "testdb".to_string(),
            user: "testuser".to_string(),
            password: "testpass".to_string(),
        };

        let conn_str = config.connection_string();
        assert!(conn_str.contains("host=localhost"));
        assert!(conn_str.contains("port=5432"));
        assert!(conn_str.contains("dbname=testdb"));
        assert!(conn_str.contains("user=testuser"));
        assert!(conn_str.contains("password=testpass"));
    }

    #[test]
    fn test_postgres_config_url_overrides_parts() {
        let config = PostgresConfig {
            url: Some("postgres://u:p@db.example.com:5433/certs".to_string()),
            host: "ignored".to_string(),
            port: 1,
            database: "ignored".to_string(),
            user: "ignored".to_string(),
            password: "ignored".to_string(),
        };

        assert_eq!(
            config.connection_string(),
            "postgres://u:p@db.example.com:5433/certs"
        );
    }
}
