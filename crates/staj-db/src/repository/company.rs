//! # Company Repository
//!
//! Host companies: accepted fields, operating days, quota, and the
//! rating students leave on their placements.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbResult, ServiceResult};
use crate::repository::{new_id, now};
use staj_core::validation::validate_new_company;
use staj_core::{Company, CompanyRatingSummary, CoreError, NewCompany, WeekdaySet};

#[derive(Debug, sqlx::FromRow)]
struct CompanyRow {
    id: String,
    name: String,
    address: String,
    accepted_fields: Json<Vec<String>>,
    operating_days: Json<WeekdaySet>,
    quota: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Company {
            id: row.id,
            name: row.name,
            address: row.address,
            accepted_fields: row.accepted_fields.0,
            operating_days: row.operating_days.0,
            quota: row.quota,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Loads a company by ID.
pub async fn fetch_company(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Company>> {
    let row: Option<CompanyRow> = sqlx::query_as(
        r#"
        SELECT id, name, address, accepted_fields, operating_days, quota,
               created_at, updated_at
        FROM companies
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Company::from))
}

/// Repository for company database operations.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    pool: SqlitePool,
}

impl CompanyRepository {
    /// Creates a new CompanyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CompanyRepository { pool }
    }

    /// Creates a company.
    ///
    /// ## Rules
    /// - Name required, at least one accepted field
    /// - Quota >= 1
    pub async fn create(&self, new: &NewCompany) -> ServiceResult<Company> {
        validate_new_company(new)?;

        let timestamp = now();
        let company = Company {
            id: new_id(),
            name: new.name.trim().to_string(),
            address: new.address.trim().to_string(),
            accepted_fields: new
                .accepted_fields
                .iter()
                .map(|f| f.trim().to_string())
                .collect(),
            operating_days: new.operating_days.clone(),
            quota: new.quota,
            created_at: timestamp,
            updated_at: timestamp,
        };

        debug!(id = %company.id, quota = company.quota, "Creating company");

        sqlx::query(
            r#"
            INSERT INTO companies (
                id, name, address, accepted_fields, operating_days, quota,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&company.id)
        .bind(&company.name)
        .bind(&company.address)
        .bind(Json(&company.accepted_fields))
        .bind(Json(&company.operating_days))
        .bind(company.quota)
        .bind(company.created_at)
        .bind(company.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(company)
    }

    /// Gets a company by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Company>> {
        let mut conn = self.pool.acquire().await?;
        fetch_company(&mut conn, id).await
    }

    /// Lists all companies ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Company>> {
        let rows: Vec<CompanyRow> = sqlx::query_as(
            r#"
            SELECT id, name, address, accepted_fields, operating_days, quota,
                   created_at, updated_at
            FROM companies
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Company::from).collect())
    }

    /// Average student rating over rated placements.
    ///
    /// `average_rating` is `None` until at least one placement is rated.
    pub async fn rating_summary(&self, company_id: &str) -> ServiceResult<CompanyRatingSummary> {
        let mut conn = self.pool.acquire().await?;
        if fetch_company(&mut conn, company_id).await?.is_none() {
            return Err(CoreError::CompanyNotFound(company_id.to_string()).into());
        }

        let (average_rating, rating_count): (Option<f64>, i64) = sqlx::query_as(
            r#"
            SELECT AVG(student_rating), COUNT(student_rating)
            FROM placements
            WHERE company_id = ?1
            "#,
        )
        .bind(company_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(CompanyRatingSummary {
            company_id: company_id.to_string(),
            average_rating,
            rating_count: rating_count as u32,
        })
    }

    /// Deletes a company. Its placements and visit reports cascade.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        info!(id = %id, "Deleting company");

        let result = sqlx::query("DELETE FROM companies WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::CompanyNotFound(id.to_string()).into());
        }
        Ok(())
    }
}
