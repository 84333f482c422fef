//! # Teacher Repository
//!
//! Coordinator teachers and their inspection schedule.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbResult, ServiceResult};
use crate::repository::placement::PlacementRepository;
use crate::repository::{new_id, now};
use staj_core::validation::validate_new_teacher;
use staj_core::{
    AssignedCompany, CoreError, InspectionSchedule, NewTeacher, PlacementScope, Teacher,
    TeacherSchedule, WeekdaySet,
};

#[derive(Debug, sqlx::FromRow)]
struct TeacherRow {
    id: String,
    full_name: String,
    email: String,
    inspection_days: Json<WeekdaySet>,
    created_at: DateTime<Utc>,
}

impl From<TeacherRow> for Teacher {
    fn from(row: TeacherRow) -> Self {
        Teacher {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            inspection_days: row.inspection_days.0,
            created_at: row.created_at,
        }
    }
}

/// Placement joined with its company and student names.
#[derive(Debug, sqlx::FromRow)]
struct AssignmentRow {
    teacher_id: String,
    company_id: String,
    company_name: String,
    student_name: String,
}

const SELECT_TEACHERS: &str =
    "SELECT id, full_name, email, inspection_days, created_at FROM teachers";

/// Repository for teachers.
#[derive(Debug, Clone)]
pub struct TeacherRepository {
    pool: SqlitePool,
}

impl TeacherRepository {
    /// Creates a new TeacherRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TeacherRepository { pool }
    }

    pub async fn create(&self, new: &NewTeacher) -> ServiceResult<Teacher> {
        validate_new_teacher(new)?;

        let teacher = Teacher {
            id: new_id(),
            full_name: new.full_name.trim().to_string(),
            email: new.email.trim().to_lowercase(),
            inspection_days: new.inspection_days.clone(),
            created_at: now(),
        };

        debug!(id = %teacher.id, "Creating teacher");

        sqlx::query(
            r#"
            INSERT INTO teachers (id, full_name, email, inspection_days, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&teacher.id)
        .bind(&teacher.full_name)
        .bind(&teacher.email)
        .bind(Json(&teacher.inspection_days))
        .bind(teacher.created_at)
        .execute(&self.pool)
        .await?;

        Ok(teacher)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Teacher>> {
        let row: Option<TeacherRow> = sqlx::query_as(&format!("{SELECT_TEACHERS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Teacher::from))
    }

    /// All teachers, by name.
    pub async fn list(&self) -> DbResult<Vec<Teacher>> {
        let rows: Vec<TeacherRow> =
            sqlx::query_as(&format!("{SELECT_TEACHERS} ORDER BY full_name, id"))
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(Teacher::from).collect())
    }

    /// Deletes a teacher.
    ///
    /// ## Rules
    /// - Teacher must exist (`TeacherNotFound`)
    /// - Refused while any placement names the teacher (`TeacherHasPlacements`)
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM teachers WHERE id = ?1)")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(CoreError::TeacherNotFound(id.to_string()).into());
        }

        let placements: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM placements WHERE teacher_id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if placements > 0 {
            return Err(CoreError::TeacherHasPlacements {
                teacher_id: id.to_string(),
                placements,
            }
            .into());
        }

        sqlx::query("DELETE FROM teachers WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(id = %id, "Teacher deleted");
        Ok(())
    }

    /// Replaces the days the teacher visits host companies.
    pub async fn update_inspection_days(&self, id: &str, days: &WeekdaySet) -> ServiceResult<()> {
        debug!(id = %id, days = %days, "Updating inspection days");

        let result = sqlx::query("UPDATE teachers SET inspection_days = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Json(days))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::TeacherNotFound(id.to_string()).into());
        }
        Ok(())
    }

    /// Inspection days plus every placement the teacher coordinates.
    pub async fn inspection_schedule(&self, id: &str) -> ServiceResult<InspectionSchedule> {
        let teacher = self
            .get(id)
            .await?
            .ok_or_else(|| CoreError::TeacherNotFound(id.to_string()))?;

        let assigned_placements = PlacementRepository::new(self.pool.clone())
            .list(&PlacementScope::Teacher(teacher.id.clone()))
            .await?;

        Ok(InspectionSchedule {
            teacher_id: teacher.id,
            inspection_days: teacher.inspection_days,
            assigned_placements,
        })
    }

    /// Every teacher with their inspection days and the companies they visit.
    pub async fn all_schedules(&self) -> DbResult<Vec<TeacherSchedule>> {
        let teachers = self.list().await?;

        let rows: Vec<AssignmentRow> = sqlx::query_as(
            r#"
            SELECT p.teacher_id, p.company_id, c.name AS company_name, s.full_name AS student_name
            FROM placements p
            JOIN companies c ON c.id = p.company_id
            JOIN students s ON s.id = p.student_id
            ORDER BY p.start_date, c.name, s.full_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_teacher: HashMap<String, Vec<AssignedCompany>> = HashMap::new();
        for row in rows {
            by_teacher
                .entry(row.teacher_id)
                .or_default()
                .push(AssignedCompany {
                    company_id: row.company_id,
                    company_name: row.company_name,
                    student_name: row.student_name,
                });
        }

        Ok(teachers
            .into_iter()
            .map(|teacher| TeacherSchedule {
                assigned_companies: by_teacher.remove(&teacher.id).unwrap_or_default(),
                teacher_id: teacher.id,
                teacher_name: teacher.full_name,
                inspection_days: teacher.inspection_days,
            })
            .collect())
    }
}
