//! # Audit Log Repository
//!
//! Append-only record of who changed which entity.
//!
//! ## Same-Transaction Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   SINGLE TRANSACTION                                    │
//! │                                                                         │
//! │  1. INSERT INTO placements (...)                                       │
//! │  2. INSERT INTO audit_logs (action = 'Create', entity = 'Placement',   │
//! │                             metadata = <request JSON>)                 │
//! │                                                                         │
//! │  COMMIT ← both rows or neither                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers pass their transaction's connection to [`insert_entry`].

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{new_id, now};
use staj_core::{AuditAction, AuditLogEntry};

/// Builds an entry stamped with a fresh id and the current time.
pub fn new_entry(
    actor_id: Option<&str>,
    action: AuditAction,
    entity_name: &str,
    entity_id: &str,
    metadata: String,
) -> AuditLogEntry {
    AuditLogEntry {
        id: new_id(),
        actor_id: actor_id.map(str::to_string),
        action,
        entity_name: entity_name.to_string(),
        entity_id: entity_id.to_string(),
        metadata,
        created_at: now(),
    }
}

/// Appends an entry on the given connection.
pub async fn insert_entry(conn: &mut SqliteConnection, entry: &AuditLogEntry) -> DbResult<()> {
    debug!(
        entity_name = %entry.entity_name,
        entity_id = %entry.entity_id,
        action = ?entry.action,
        "Writing audit entry"
    );

    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, actor_id, action, entity_name, entity_id, metadata, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.actor_id)
    .bind(entry.action)
    .bind(&entry.entity_name)
    .bind(&entry.entity_id)
    .bind(&entry.metadata)
    .bind(entry.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Repository for reading the audit log.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    pool: SqlitePool,
}

impl AuditLogRepository {
    /// Creates a new AuditLogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AuditLogRepository { pool }
    }

    /// Entries for one entity, oldest first.
    pub async fn list_for_entity(
        &self,
        entity_name: &str,
        entity_id: &str,
    ) -> DbResult<Vec<AuditLogEntry>> {
        let entries = sqlx::query_as(
            r#"
            SELECT id, actor_id, action, entity_name, entity_id, metadata, created_at
            FROM audit_logs
            WHERE entity_name = ?1 AND entity_id = ?2
            ORDER BY created_at, rowid
            "#,
        )
        .bind(entity_name)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Total number of entries. Used to assert "no writes" on rejection.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
