//! # Student Repository
//!
//! Students and the metadata of their documents.
//!
//! ## Insurance Gate Inputs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  students.has_insurance_document  ──┐                                   │
//! │                                     ├──► Student::has_insurance_coverage│
//! │  documents WHERE doc_type = 'ISG' ──┘                                   │
//! │                                                                         │
//! │  register_document("ISG", ..) inserts the document AND sets the flag   │
//! │  in one transaction. The flag can still be toggled independently.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbResult, ServiceResult};
use crate::repository::{new_id, now};
use staj_core::validation::{validate_internship_score, validate_new_student, validate_required};
use staj_core::{CoreError, Document, NewStudent, Student, WeekdaySet, ISG_DOCUMENT_TYPE};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct StudentRow {
    id: String,
    full_name: String,
    school_number: String,
    field_of_study: String,
    sub_field: String,
    class_name: String,
    school_days: Json<WeekdaySet>,
    has_insurance_document: bool,
    internship_score: Option<u8>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StudentRow {
    fn into_student(self, documents: Vec<Document>) -> Student {
        Student {
            id: self.id,
            full_name: self.full_name,
            school_number: self.school_number,
            field_of_study: self.field_of_study,
            sub_field: self.sub_field,
            class_name: self.class_name,
            school_days: self.school_days.0,
            has_insurance_document: self.has_insurance_document,
            documents,
            internship_score: self.internship_score,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

// =============================================================================
// Connection-Level Queries
// =============================================================================

/// Loads a student with all their documents.
pub async fn fetch_student(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Student>> {
    let row: Option<StudentRow> = sqlx::query_as(
        r#"
        SELECT id, full_name, school_number, field_of_study, sub_field, class_name,
               school_days, has_insurance_document, internship_score,
               created_at, updated_at
        FROM students
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let documents = fetch_documents(conn, id).await?;
    Ok(Some(row.into_student(documents)))
}

/// Documents of one student, oldest first.
pub async fn fetch_documents(
    conn: &mut SqliteConnection,
    student_id: &str,
) -> DbResult<Vec<Document>> {
    let documents = sqlx::query_as(
        r#"
        SELECT id, student_id, doc_type, file_name, content_type, created_at
        FROM documents
        WHERE student_id = ?1
        ORDER BY created_at, id
        "#,
    )
    .bind(student_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(documents)
}

pub async fn student_exists(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM students WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(found.is_some())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for student database operations.
///
/// ## Usage
/// ```rust,ignore
/// let student = db.students().create(&new_student).await?;
/// db.students().register_document(&student.id, "ISG", "isg.pdf", "application/pdf").await?;
/// ```
#[derive(Debug, Clone)]
pub struct StudentRepository {
    pool: SqlitePool,
}

impl StudentRepository {
    /// Creates a new StudentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StudentRepository { pool }
    }

    /// Creates a student without documents and without insurance.
    pub async fn create(&self, new: &NewStudent) -> ServiceResult<Student> {
        validate_new_student(new)?;

        let timestamp = now();
        let student = Student {
            id: new_id(),
            full_name: new.full_name.trim().to_string(),
            school_number: new.school_number.trim().to_string(),
            field_of_study: new.field_of_study.trim().to_string(),
            sub_field: new.sub_field.trim().to_string(),
            class_name: new.class_name.trim().to_string(),
            school_days: new.school_days.clone(),
            has_insurance_document: false,
            documents: Vec::new(),
            internship_score: None,
            created_at: timestamp,
            updated_at: timestamp,
        };

        debug!(id = %student.id, school_number = %student.school_number, "Creating student");

        sqlx::query(
            r#"
            INSERT INTO students (
                id, full_name, school_number, field_of_study, sub_field, class_name,
                school_days, has_insurance_document, internship_score,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&student.id)
        .bind(&student.full_name)
        .bind(&student.school_number)
        .bind(&student.field_of_study)
        .bind(&student.sub_field)
        .bind(&student.class_name)
        .bind(Json(&student.school_days))
        .bind(student.has_insurance_document)
        .bind(student.internship_score)
        .bind(student.created_at)
        .bind(student.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(student)
    }

    /// Gets a student by ID, documents included.
    pub async fn get(&self, id: &str) -> DbResult<Option<Student>> {
        let mut conn = self.pool.acquire().await?;
        fetch_student(&mut conn, id).await
    }

    /// Lists all students ordered by name, documents included.
    pub async fn list(&self) -> DbResult<Vec<Student>> {
        let rows: Vec<StudentRow> = sqlx::query_as(
            r#"
            SELECT id, full_name, school_number, field_of_study, sub_field, class_name,
                   school_days, has_insurance_document, internship_score,
                   created_at, updated_at
            FROM students
            ORDER BY full_name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let documents: Vec<Document> = sqlx::query_as(
            r#"
            SELECT id, student_id, doc_type, file_name, content_type, created_at
            FROM documents
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_student: HashMap<String, Vec<Document>> = HashMap::new();
        for doc in documents {
            by_student.entry(doc.student_id.clone()).or_default().push(doc);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let docs = by_student.remove(&row.id).unwrap_or_default();
                row.into_student(docs)
            })
            .collect())
    }

    /// Number of students. Used by the seed binary.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Records document metadata for a student.
    ///
    /// ## Rules
    /// - Student must exist (`StudentNotFound`)
    /// - Type `"ISG"` also sets `has_insurance_document`, atomically
    pub async fn register_document(
        &self,
        student_id: &str,
        doc_type: &str,
        file_name: &str,
        content_type: &str,
    ) -> ServiceResult<Document> {
        validate_required("type", doc_type, 50)?;
        validate_required("fileName", file_name, 255)?;

        let document = Document {
            id: new_id(),
            student_id: student_id.to_string(),
            doc_type: doc_type.trim().to_string(),
            file_name: file_name.trim().to_string(),
            content_type: content_type.trim().to_string(),
            created_at: now(),
        };

        let mut tx = self.pool.begin().await?;

        if !student_exists(&mut tx, student_id).await? {
            return Err(CoreError::StudentNotFound(student_id.to_string()).into());
        }

        sqlx::query(
            r#"
            INSERT INTO documents (id, student_id, doc_type, file_name, content_type, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&document.id)
        .bind(&document.student_id)
        .bind(&document.doc_type)
        .bind(&document.file_name)
        .bind(&document.content_type)
        .bind(document.created_at)
        .execute(&mut *tx)
        .await?;

        if document.doc_type == ISG_DOCUMENT_TYPE {
            sqlx::query(
                "UPDATE students SET has_insurance_document = 1, updated_at = ?2 WHERE id = ?1",
            )
            .bind(student_id)
            .bind(document.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            student_id = %student_id,
            doc_type = %document.doc_type,
            "Document registered"
        );
        Ok(document)
    }

    /// Flips the insurance flag and returns its new value. Documents are
    /// untouched, so an ISG document keeps the student covered.
    pub async fn toggle_insurance_document(&self, id: &str) -> ServiceResult<bool> {
        let flag: Option<bool> = sqlx::query_scalar(
            r#"
            UPDATE students
            SET has_insurance_document = NOT has_insurance_document, updated_at = ?2
            WHERE id = ?1
            RETURNING has_insurance_document
            "#,
        )
        .bind(id)
        .bind(now())
        .fetch_optional(&self.pool)
        .await?;

        let flag = flag.ok_or_else(|| CoreError::StudentNotFound(id.to_string()))?;
        debug!(id = %id, has_insurance_document = flag, "Insurance flag toggled");
        Ok(flag)
    }

    /// Records the teacher-assigned internship score (0..=100).
    pub async fn set_internship_score(&self, id: &str, score: u8) -> ServiceResult<()> {
        validate_internship_score(score)?;

        let result = sqlx::query(
            "UPDATE students SET internship_score = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(score)
        .bind(now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::StudentNotFound(id.to_string()).into());
        }
        Ok(())
    }

    /// Deletes a student. Documents, placements, attendance and visit
    /// reports cascade.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        info!(id = %id, "Deleting student");

        let result = sqlx::query("DELETE FROM students WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::StudentNotFound(id.to_string()).into());
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::pool::{Database, DbConfig};
    use staj_core::{ErrorKind, Weekday};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_student(school_number: &str) -> NewStudent {
        NewStudent {
            full_name: "Ayşe Yılmaz".to_string(),
            school_number: school_number.to_string(),
            field_of_study: "Bilişim".to_string(),
            sub_field: "Yazılım".to_string(),
            class_name: "12-A".to_string(),
            school_days: [Weekday::Monday, Weekday::Tuesday].into_iter().collect(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_student() {
        let db = test_db().await;
        let repo = db.students();

        let created = repo.create(&new_student("1001")).await.unwrap();
        let fetched = repo.get(&created.id).await.unwrap().unwrap();

        assert_eq!(fetched.full_name, "Ayşe Yılmaz");
        assert_eq!(fetched.school_days, created.school_days);
        assert!(!fetched.has_insurance_document);
        assert!(fetched.documents.is_empty());
        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let db = test_db().await;
        let mut input = new_student("1001");
        input.full_name = "  ".to_string();

        let err = db.students().create(&input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BusinessRuleViolation);
    }

    #[tokio::test]
    async fn test_isg_document_sets_flag() {
        let db = test_db().await;
        let repo = db.students();
        let student = repo.create(&new_student("1001")).await.unwrap();

        repo.register_document(&student.id, "Contract", "c.pdf", "application/pdf")
            .await
            .unwrap();
        let fetched = repo.get(&student.id).await.unwrap().unwrap();
        assert!(!fetched.has_insurance_document);
        assert!(!fetched.has_insurance_coverage());

        repo.register_document(&student.id, "ISG", "isg.pdf", "application/pdf")
            .await
            .unwrap();
        let fetched = repo.get(&student.id).await.unwrap().unwrap();
        assert!(fetched.has_insurance_document);
        assert_eq!(fetched.documents.len(), 2);
    }

    #[tokio::test]
    async fn test_clearing_flag_keeps_isg_coverage() {
        let db = test_db().await;
        let repo = db.students();
        let student = repo.create(&new_student("1001")).await.unwrap();

        repo.register_document(&student.id, "ISG", "isg.pdf", "application/pdf")
            .await
            .unwrap();
        assert!(!repo.toggle_insurance_document(&student.id).await.unwrap());

        let fetched = repo.get(&student.id).await.unwrap().unwrap();
        assert!(!fetched.has_insurance_document);
        assert!(fetched.has_insurance_coverage());
    }

    #[tokio::test]
    async fn test_toggle_insurance_document() {
        let db = test_db().await;
        let repo = db.students();
        let student = repo.create(&new_student("1001")).await.unwrap();

        assert!(repo.toggle_insurance_document(&student.id).await.unwrap());
        assert!(repo.get(&student.id).await.unwrap().unwrap().has_insurance_document);
        assert!(!repo.toggle_insurance_document(&student.id).await.unwrap());

        let err = repo.toggle_insurance_document("missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_document_for_missing_student() {
        let db = test_db().await;
        let err = db
            .students()
            .register_document("missing", "ISG", "isg.pdf", "application/pdf")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(CoreError::StudentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_internship_score_bounds() {
        let db = test_db().await;
        let repo = db.students();
        let student = repo.create(&new_student("1001")).await.unwrap();

        repo.set_internship_score(&student.id, 85).await.unwrap();
        assert_eq!(
            repo.get(&student.id).await.unwrap().unwrap().internship_score,
            Some(85)
        );

        let err = repo.set_internship_score(&student.id, 101).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BusinessRuleViolation);

        let err = repo.set_internship_score("missing", 50).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_list_groups_documents() {
        let db = test_db().await;
        let repo = db.students();
        let a = repo.create(&new_student("1001")).await.unwrap();
        let b = repo.create(&new_student("1002")).await.unwrap();
        repo.register_document(&b.id, "ISG", "isg.pdf", "application/pdf")
            .await
            .unwrap();

        let students = repo.list().await.unwrap();
        assert_eq!(students.len(), 2);
        assert_eq!(repo.count().await.unwrap(), 2);

        let find = |id: &str| students.iter().find(|s| s.id == id).unwrap();
        assert!(find(&a.id).documents.is_empty());
        assert_eq!(find(&b.id).documents.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_student() {
        let db = test_db().await;
        let repo = db.students();
        let student = repo.create(&new_student("1001")).await.unwrap();
        repo.register_document(&student.id, "ISG", "isg.pdf", "application/pdf")
            .await
            .unwrap();

        repo.delete(&student.id).await.unwrap();
        assert!(repo.get(&student.id).await.unwrap().is_none());

        let err = repo.delete(&student.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
