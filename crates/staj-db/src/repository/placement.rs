//! # Placement Repository
//!
//! Placement rows. Creation goes through
//! [`PlacementService`](crate::service::PlacementService), which runs the
//! eligibility rules; everything here is a plain store operation.
//!
//! ## Overlap Query
//! ```text
//! existing [a1, a2] overlaps requested [b1, b2]  ⇔  a1 <= b2 AND b1 <= a2
//!
//!   WHERE start_date <= :end AND :start <= end_date
//!
//! ISO-8601 date text compares in calendar order, so the comparison runs
//! in SQL against the (owner, start_date, end_date) indexes.
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbResult, ServiceResult};
use crate::repository::audit::{insert_entry, new_entry};
use crate::repository::company::fetch_company;
use crate::repository::now;
use staj_core::validation::{validate_max_len, validate_rating, MAX_NOTE_LEN};
use staj_core::{
    AuditAction, CoreError, DateRange, Placement, PlacementScope, PlacementUpdate,
    WeekdaySet, PLACEMENT_ENTITY,
};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct PlacementRow {
    id: String,
    student_id: String,
    company_id: String,
    teacher_id: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    intern_days: Json<WeekdaySet>,
    student_rating: Option<u8>,
    student_comment: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PlacementRow> for Placement {
    fn from(row: PlacementRow) -> Self {
        Placement {
            id: row.id,
            student_id: row.student_id,
            company_id: row.company_id,
            teacher_id: row.teacher_id,
            start_date: row.start_date,
            end_date: row.end_date,
            intern_days: row.intern_days.0,
            student_rating: row.student_rating,
            student_comment: row.student_comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_PLACEMENTS: &str = "SELECT id, student_id, company_id, teacher_id, start_date, \
     end_date, intern_days, student_rating, student_comment, created_at, updated_at \
     FROM placements";

fn into_placements(rows: Vec<PlacementRow>) -> Vec<Placement> {
    rows.into_iter().map(Placement::from).collect()
}

// =============================================================================
// Connection-Level Queries
// =============================================================================

pub async fn fetch_placement(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Placement>> {
    let row: Option<PlacementRow> = sqlx::query_as(
        r#"
        SELECT id, student_id, company_id, teacher_id, start_date, end_date, intern_days,
               student_rating, student_comment, created_at, updated_at
        FROM placements
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Placement::from))
}

/// Placements of a student whose range overlaps `[start, end]`.
pub async fn overlapping_for_student(
    conn: &mut SqliteConnection,
    student_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> DbResult<Vec<Placement>> {
    let rows: Vec<PlacementRow> = sqlx::query_as(
        r#"
        SELECT id, student_id, company_id, teacher_id, start_date, end_date, intern_days,
               student_rating, student_comment, created_at, updated_at
        FROM placements
        WHERE student_id = ?1 AND start_date <= ?3 AND ?2 <= end_date
        ORDER BY start_date, id
        "#,
    )
    .bind(student_id)
    .bind(start)
    .bind(end)
    .fetch_all(&mut *conn)
    .await?;

    Ok(into_placements(rows))
}

/// Placements at a company whose range overlaps `[start, end]`.
pub async fn overlapping_for_company(
    conn: &mut SqliteConnection,
    company_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> DbResult<Vec<Placement>> {
    let rows: Vec<PlacementRow> = sqlx::query_as(
        r#"
        SELECT id, student_id, company_id, teacher_id, start_date, end_date, intern_days,
               student_rating, student_comment, created_at, updated_at
        FROM placements
        WHERE company_id = ?1 AND start_date <= ?3 AND ?2 <= end_date
        ORDER BY start_date, id
        "#,
    )
    .bind(company_id)
    .bind(start)
    .bind(end)
    .fetch_all(&mut *conn)
    .await?;

    Ok(into_placements(rows))
}

/// Inserts a placement row on the given connection.
pub async fn insert_placement(conn: &mut SqliteConnection, placement: &Placement) -> DbResult<()> {
    debug!(
        id = %placement.id,
        student_id = %placement.student_id,
        company_id = %placement.company_id,
        "Inserting placement"
    );

    sqlx::query(
        r#"
        INSERT INTO placements (
            id, student_id, company_id, teacher_id, start_date, end_date, intern_days,
            student_rating, student_comment, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&placement.id)
    .bind(&placement.student_id)
    .bind(&placement.company_id)
    .bind(&placement.teacher_id)
    .bind(placement.start_date)
    .bind(placement.end_date)
    .bind(Json(&placement.intern_days))
    .bind(placement.student_rating)
    .bind(&placement.student_comment)
    .bind(placement.created_at)
    .bind(placement.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for placement reads and post-creation changes.
#[derive(Debug, Clone)]
pub struct PlacementRepository {
    pool: SqlitePool,
}

impl PlacementRepository {
    /// Creates a new PlacementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PlacementRepository { pool }
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Placement>> {
        let mut conn = self.pool.acquire().await?;
        fetch_placement(&mut conn, id).await
    }

    /// Lists placements visible in `scope`, ordered by start date.
    ///
    /// ## Scopes
    /// ```text
    /// All              every placement (teachers, administrators)
    /// Student(id)      the student's own placements
    /// Company(id)      placements hosted by the company
    /// Teacher(id)      placements the teacher coordinates
    /// ```
    pub async fn list(&self, scope: &PlacementScope) -> DbResult<Vec<Placement>> {
        let owner = match scope {
            PlacementScope::All => None,
            PlacementScope::Student(id) => Some(("student_id", id)),
            PlacementScope::Company(id) => Some(("company_id", id)),
            PlacementScope::Teacher(id) => Some(("teacher_id", id)),
        };

        let sql = match owner {
            None => format!("{SELECT_PLACEMENTS} ORDER BY start_date, id"),
            Some((column, _)) => {
                format!("{SELECT_PLACEMENTS} WHERE {column} = ?1 ORDER BY start_date, id")
            }
        };

        let mut query = sqlx::query_as::<_, PlacementRow>(&sql);
        if let Some((_, id)) = owner {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(into_placements(rows))
    }

    /// Applies a partial update. Eligibility is NOT re-evaluated.
    ///
    /// ## Rules
    /// - Placement must exist (`PlacementNotFound`)
    /// - A new company must exist (`CompanyNotFound`)
    /// - The resulting range must satisfy start <= end
    /// - An `Update` audit entry with the patch as metadata is written in
    ///   the same transaction
    pub async fn update(
        &self,
        id: &str,
        patch: &PlacementUpdate,
        actor_id: &str,
    ) -> ServiceResult<Placement> {
        let mut tx = self.pool.begin().await?;

        let mut placement = fetch_placement(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::PlacementNotFound(id.to_string()))?;

        if patch.is_empty() {
            return Ok(placement);
        }

        if let Some(company_id) = &patch.company_id {
            if fetch_company(&mut tx, company_id).await?.is_none() {
                return Err(CoreError::CompanyNotFound(company_id.clone()).into());
            }
            placement.company_id = company_id.clone();
        }

        let start = patch.start_date.unwrap_or(placement.start_date);
        let end = patch.end_date.unwrap_or(placement.end_date);
        let period = DateRange::new(start, end)?;
        placement.start_date = period.start();
        placement.end_date = period.end();
        placement.updated_at = now();

        sqlx::query(
            r#"
            UPDATE placements
            SET company_id = ?2, start_date = ?3, end_date = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&placement.id)
        .bind(&placement.company_id)
        .bind(placement.start_date)
        .bind(placement.end_date)
        .bind(placement.updated_at)
        .execute(&mut *tx)
        .await?;

        let metadata = serde_json::to_string(patch).map_err(crate::error::DbError::from)?;
        let entry = new_entry(
            Some(actor_id),
            AuditAction::Update,
            PLACEMENT_ENTITY,
            &placement.id,
            metadata,
        );
        insert_entry(&mut tx, &entry).await?;

        tx.commit().await?;

        info!(placement_id = %placement.id, actor_id = %actor_id, "Placement updated");
        Ok(placement)
    }

    /// Records the student's rating of the host company.
    ///
    /// Only the placement's own student may rate it: any other student gets
    /// `PlacementNotFound`, same as a missing placement.
    pub async fn rate(
        &self,
        placement_id: &str,
        student_id: &str,
        rating: u8,
        comment: Option<&str>,
    ) -> ServiceResult<()> {
        validate_rating(rating)?;
        if let Some(comment) = comment {
            validate_max_len("comment", comment, MAX_NOTE_LEN)?;
        }

        let result = sqlx::query(
            r#"
            UPDATE placements
            SET student_rating = ?3, student_comment = ?4, updated_at = ?5
            WHERE id = ?1 AND student_id = ?2
            "#,
        )
        .bind(placement_id)
        .bind(student_id)
        .bind(rating)
        .bind(comment.map(str::trim))
        .bind(now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::PlacementNotFound(placement_id.to_string()).into());
        }

        debug!(placement_id = %placement_id, rating, "Placement rated");
        Ok(())
    }

    /// Total number of placements.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM placements")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
