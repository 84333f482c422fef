//! # Visit Report Repository
//!
//! Notes a teacher writes after visiting a student at the host company.
//! The teacher id comes from the caller, never from the request body.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult, ServiceError, ServiceResult};
use crate::repository::{new_id, now};
use staj_core::validation::{validate_max_len, validate_required, MAX_NOTE_LEN};
use staj_core::{NewVisitReport, VisitReport};

/// Repository for visit reports.
#[derive(Debug, Clone)]
pub struct VisitReportRepository {
    pool: SqlitePool,
}

impl VisitReportRepository {
    /// Creates a new VisitReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        VisitReportRepository { pool }
    }

    /// Files a report on behalf of `teacher_id`.
    pub async fn create(&self, teacher_id: &str, new: &NewVisitReport) -> ServiceResult<VisitReport> {
        validate_required("teacherId", teacher_id, 64)?;
        let note = new.note.as_deref().unwrap_or_default().trim();
        validate_max_len("note", note, MAX_NOTE_LEN)?;

        let report = VisitReport {
            id: new_id(),
            teacher_id: teacher_id.to_string(),
            student_id: new.student_id.clone(),
            company_id: new.company_id.clone(),
            visit_date: new.visit_date,
            note: note.to_string(),
            created_at: now(),
        };

        debug!(
            teacher_id = %report.teacher_id,
            student_id = %report.student_id,
            visit_date = %report.visit_date,
            "Creating visit report"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO visit_reports (id, teacher_id, student_id, company_id, visit_date, note, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&report.id)
        .bind(&report.teacher_id)
        .bind(&report.student_id)
        .bind(&report.company_id)
        .bind(report.visit_date)
        .bind(&report.note)
        .bind(report.created_at)
        .execute(&self.pool)
        .await;

        match result.map_err(DbError::from) {
            Ok(_) => Ok(report),
            // SQLite doesn't say which reference failed
            Err(DbError::ForeignKeyViolation { message }) => Err(ServiceError::Store(
                DbError::ForeignKeyViolation {
                    message: format!(
                        "student {} or company {} does not exist ({message})",
                        report.student_id, report.company_id
                    ),
                },
            )),
            Err(err) => Err(err.into()),
        }
    }

    /// Reports ordered by visit date, optionally for one teacher only.
    pub async fn list(&self, teacher_id: Option<&str>) -> DbResult<Vec<VisitReport>> {
        let reports = sqlx::query_as(
            r#"
            SELECT id, teacher_id, student_id, company_id, visit_date, note, created_at
            FROM visit_reports
            WHERE ?1 IS NULL OR teacher_id = ?1
            ORDER BY visit_date, created_at
            "#,
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reports)
    }

    /// Deletes a report. Returns false if it did not exist.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM visit_reports WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDate;
    use staj_core::{NewCompany, NewStudent, WeekdaySet};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    #[tokio::test]
    async fn test_visit_reports_filtered_and_ordered() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let student = db
            .students()
            .create(&NewStudent {
                full_name: "Ayşe Yılmaz".to_string(),
                school_number: "1001".to_string(),
                field_of_study: "Bilişim".to_string(),
                sub_field: String::new(),
                class_name: String::new(),
                school_days: WeekdaySet::new(),
            })
            .await
            .unwrap();
        let company = db
            .companies()
            .create(&NewCompany {
                name: "Yazılım A.Ş.".to_string(),
                address: String::new(),
                accepted_fields: vec!["Bilişim".to_string()],
                operating_days: WeekdaySet::workweek(),
                quota: 1,
            })
            .await
            .unwrap();

        let report = |d: u32| NewVisitReport {
            student_id: student.id.clone(),
            company_id: company.id.clone(),
            visit_date: day(d),
            note: Some(" Öğrenci uyum sağladı ".to_string()),
        };

        let repo = db.visit_reports();
        repo.create("t-1", &report(20)).await.unwrap();
        let early = repo.create("t-1", &report(2)).await.unwrap();
        repo.create("t-2", &report(10)).await.unwrap();

        assert_eq!(early.note, "Öğrenci uyum sağladı");

        let mine = repo.list(Some("t-1")).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].visit_date, day(2));
        assert_eq!(repo.list(None).await.unwrap().len(), 3);

        assert!(repo.delete(&early.id).await.unwrap());
        assert!(!repo.delete(&early.id).await.unwrap());
        assert_eq!(repo.list(Some("t-1")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_references_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .visit_reports()
            .create(
                "t-1",
                &NewVisitReport {
                    student_id: "missing".to_string(),
                    company_id: "missing".to_string(),
                    visit_date: day(1),
                    note: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Store(DbError::ForeignKeyViolation { .. })
        ));
    }
}
