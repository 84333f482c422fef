//! # Attendance Repository
//!
//! One row per student per day, enforced by `UNIQUE (student_id, date)`.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult, ServiceError, ServiceResult};
use crate::repository::{new_id, now};
use staj_core::validation::{validate_max_len, MAX_NOTE_LEN};
use staj_core::{Attendance, CoreError, NewAttendance};

/// Repository for attendance records.
#[derive(Debug, Clone)]
pub struct AttendanceRepository {
    pool: SqlitePool,
}

impl AttendanceRepository {
    /// Creates a new AttendanceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AttendanceRepository { pool }
    }

    /// Records a day of attendance.
    ///
    /// ## Errors
    /// - `DuplicateAttendance` if the student already has a record that day
    /// - `StudentNotFound` if the student does not exist
    pub async fn record(&self, new: &NewAttendance) -> ServiceResult<Attendance> {
        validate_max_len("note", &new.note, MAX_NOTE_LEN)?;

        let attendance = Attendance {
            id: new_id(),
            student_id: new.student_id.clone(),
            date: new.date,
            is_present: new.is_present,
            note: new.note.trim().to_string(),
            created_at: now(),
        };

        debug!(
            student_id = %attendance.student_id,
            date = %attendance.date,
            is_present = attendance.is_present,
            "Recording attendance"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO attendances (id, student_id, date, is_present, note, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&attendance.id)
        .bind(&attendance.student_id)
        .bind(attendance.date)
        .bind(attendance.is_present)
        .bind(&attendance.note)
        .bind(attendance.created_at)
        .execute(&self.pool)
        .await;

        match result.map_err(DbError::from) {
            Ok(_) => Ok(attendance),
            Err(DbError::UniqueViolation { .. }) => Err(CoreError::DuplicateAttendance {
                student_id: attendance.student_id,
                date: attendance.date.to_string(),
            }
            .into()),
            Err(DbError::ForeignKeyViolation { .. }) => {
                Err(CoreError::StudentNotFound(attendance.student_id).into())
            }
            Err(err) => Err(ServiceError::Store(err)),
        }
    }

    /// A student's attendance, newest first.
    pub async fn list_for_student(&self, student_id: &str) -> DbResult<Vec<Attendance>> {
        let records = sqlx::query_as(
            r#"
            SELECT id, student_id, date, is_present, note, created_at
            FROM attendances
            WHERE student_id = ?1
            ORDER BY date DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Deletes one attendance record. Returns false if it did not exist.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM attendances WHERE id = ?1")
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
    use staj_core::{NewStudent, WeekdaySet};

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let student = db
            .students()
            .create(&NewStudent {
                full_name: "Can Demir".to_string(),
                school_number: "2001".to_string(),
                field_of_study: "Elektrik".to_string(),
                sub_field: String::new(),
                class_name: String::new(),
                school_days: WeekdaySet::new(),
            })
            .await
            .unwrap();
        (db, student.id)
    }

    fn entry(student_id: &str, day: u32) -> NewAttendance {
        NewAttendance {
            student_id: student_id.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            is_present: true,
            note: String::new(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_attendance_rejected() {
        let (db, student_id) = setup().await;
        let repo = db.attendance();

        repo.record(&entry(&student_id, 3)).await.unwrap();
        let err = repo.record(&entry(&student_id, 3)).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(CoreError::DuplicateAttendance { .. })
        ));

        assert_eq!(repo.list_for_student(&student_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_student() {
        let (db, _) = setup().await;
        let err = db.attendance().record(&entry("missing", 3)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::StudentNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_newest_first_and_delete() {
        let (db, student_id) = setup().await;
        let repo = db.attendance();

        repo.record(&entry(&student_id, 3)).await.unwrap();
        let latest = repo.record(&entry(&student_id, 5)).await.unwrap();
        repo.record(&entry(&student_id, 4)).await.unwrap();

        let days: Vec<u32> = repo
            .list_for_student(&student_id)
            .await
            .unwrap()
            .iter()
            .map(|a| chrono::Datelike::day(&a.date))
            .collect();
        assert_eq!(days, vec![5, 4, 3]);

        assert!(repo.delete(&latest.id).await.unwrap());
        assert!(!repo.delete(&latest.id).await.unwrap());
        assert_eq!(repo.list_for_student(&student_id).await.unwrap().len(), 2);
    }
}
