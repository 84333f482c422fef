//! # Placement Service
//!
//! Admits or rejects new placements.
//!
//! ## Decision Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_placement(request, acting_teacher_id)                          │
//! │       │  request.teacher_id := acting_teacher_id                       │
//! │       ▼                                                                 │
//! │  admission lock (one decision in flight per Database)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────── BEGIN ─────────────────────────────────┐ │
//! │  │  fetch_student      ── None ──► StudentNotFound                   │ │
//! │  │  fetch_company      ── None ──► CompanyNotFound                   │ │
//! │  │  overlapping_for_student / overlapping_for_company                │ │
//! │  │       │                                                           │ │
//! │  │       ▼                                                           │ │
//! │  │  eligibility::evaluate ── Err(reason) ──► Rejected (rollback)     │ │
//! │  │       │                                                           │ │
//! │  │       ▼                                                           │ │
//! │  │  insert_placement + insert_entry(Create, request JSON)            │ │
//! │  └─────────────────────────── COMMIT ────────────────────────────────┘ │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ServiceResponse { success, message, data: placement id }              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Without the lock, two requests could both read "quota not yet full" and
//! both insert. The lock plus the transaction make read, decide and write
//! one unit.

use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{DbError, ServiceResult};
use crate::repository::audit::{insert_entry, new_entry};
use crate::repository::company::fetch_company;
use crate::repository::placement::{
    insert_placement, overlapping_for_company, overlapping_for_student,
};
use crate::repository::student::fetch_student;
use crate::repository::{new_id, now};
use staj_core::eligibility::{self, EligibilityContext};
use staj_core::validation::validate_placement_request;
use staj_core::{
    AuditAction, CoreError, ErrorKind, Placement, PlacementRequest, ServiceResponse,
    PLACEMENT_ENTITY,
};

/// Message of a successful placement.
pub const PLACEMENT_CREATED: &str = "Placement created.";

/// Message shown for any store failure. Details go to the log only.
pub const SERVICE_UNAVAILABLE: &str = "Service temporarily unavailable. Please try again later.";

/// Coordinates placement creation.
///
/// Obtained from [`Database::placement_service`](crate::Database::placement_service);
/// every service from the same `Database` shares one admission lock.
#[derive(Debug, Clone)]
pub struct PlacementService {
    pool: SqlitePool,
    admission: Arc<Mutex<()>>,
}

impl PlacementService {
    pub fn new(pool: SqlitePool, admission: Arc<Mutex<()>>) -> Self {
        PlacementService { pool, admission }
    }

    /// Caller-facing entry point.
    ///
    /// The acting teacher replaces whatever `teacher_id` the request carried.
    /// Business and not-found failures return their message verbatim; store
    /// failures return [`SERVICE_UNAVAILABLE`].
    pub async fn create_placement(
        &self,
        mut request: PlacementRequest,
        acting_teacher_id: &str,
    ) -> ServiceResponse<String> {
        request.teacher_id = acting_teacher_id.to_string();

        match self.try_create_placement(&request).await {
            Ok(placement_id) => ServiceResponse::ok(PLACEMENT_CREATED, placement_id),
            Err(err) if err.kind() == ErrorKind::StoreFailure => {
                warn!(
                    student_id = %request.student_id,
                    company_id = %request.company_id,
                    error = %err,
                    "Placement failed on store error"
                );
                ServiceResponse::fail(SERVICE_UNAVAILABLE)
            }
            Err(err) => ServiceResponse::fail(err.to_string()),
        }
    }

    /// Evaluates the request and, if admissible, persists the placement and
    /// its audit entry atomically. Returns the new placement id.
    ///
    /// Rejections write nothing.
    pub async fn try_create_placement(&self, request: &PlacementRequest) -> ServiceResult<String> {
        validate_placement_request(request)?;

        let _admission = self.admission.lock().await;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let student = fetch_student(&mut tx, &request.student_id)
            .await?
            .ok_or_else(|| CoreError::StudentNotFound(request.student_id.clone()))?;

        let company = fetch_company(&mut tx, &request.company_id)
            .await?
            .ok_or_else(|| CoreError::CompanyNotFound(request.company_id.clone()))?;

        let student_placements = overlapping_for_student(
            &mut tx,
            &request.student_id,
            request.start_date,
            request.end_date,
        )
        .await?;

        let company_placements = overlapping_for_company(
            &mut tx,
            &request.company_id,
            request.start_date,
            request.end_date,
        )
        .await?;

        let ctx = EligibilityContext::new(
            request,
            &student,
            &company,
            &student_placements,
            &company_placements,
        );

        if let Err(reason) = eligibility::evaluate(&ctx) {
            info!(
                student_id = %request.student_id,
                company_id = %request.company_id,
                rule = eligibility::first_failing_rule(&ctx).unwrap_or_default(),
                "Placement rejected"
            );
            return Err(reason.into());
        }

        let timestamp = now();
        let placement = Placement {
            id: new_id(),
            student_id: request.student_id.clone(),
            company_id: request.company_id.clone(),
            teacher_id: request.teacher_id.clone(),
            start_date: request.start_date,
            end_date: request.end_date,
            intern_days: request.intern_days.clone(),
            student_rating: None,
            student_comment: None,
            created_at: timestamp,
            updated_at: timestamp,
        };

        insert_placement(&mut tx, &placement).await?;

        let metadata = serde_json::to_string(request).map_err(DbError::from)?;
        let entry = new_entry(
            Some(&request.teacher_id),
            AuditAction::Create,
            PLACEMENT_ENTITY,
            &placement.id,
            metadata,
        );
        insert_entry(&mut tx, &entry).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            placement_id = %placement.id,
            student_id = %placement.student_id,
            company_id = %placement.company_id,
            teacher_id = %placement.teacher_id,
            "Placement created"
        );

        Ok(placement.id)
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
    use chrono::NaiveDate;
    use staj_core::{NewCompany, NewStudent, PlacementScope, RejectionReason, Weekday, WeekdaySet};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn days(list: &[Weekday]) -> WeekdaySet {
        list.iter().copied().collect()
    }

    async fn setup(quota: u32) -> (Database, String, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let student = db
            .students()
            .create(&NewStudent {
                full_name: "Ayşe Yılmaz".to_string(),
                school_number: "1001".to_string(),
                field_of_study: "Bilişim".to_string(),
                sub_field: String::new(),
                class_name: "12-A".to_string(),
                school_days: days(&[Weekday::Monday, Weekday::Tuesday]),
            })
            .await
            .unwrap();
        db.students().toggle_insurance_document(&student.id).await.unwrap();

        let company = db
            .companies()
            .create(&NewCompany {
                name: "Yazılım A.Ş.".to_string(),
                address: String::new(),
                accepted_fields: vec!["Bilişim".to_string()],
                operating_days: WeekdaySet::workweek(),
                quota,
            })
            .await
            .unwrap();

        (db, student.id, company.id)
    }

    fn request(student_id: &str, company_id: &str, start: u32, end: u32) -> PlacementRequest {
        PlacementRequest {
            student_id: student_id.to_string(),
            company_id: company_id.to_string(),
            teacher_id: "t-1".to_string(),
            start_date: day(start),
            end_date: day(end),
            intern_days: days(&[Weekday::Wednesday, Weekday::Thursday, Weekday::Friday]),
        }
    }

    #[tokio::test]
    async fn test_success_writes_placement_and_audit() {
        let (db, student_id, company_id) = setup(2).await;
        let req = request(&student_id, &company_id, 1, 20);

        let id = db.placement_service().try_create_placement(&req).await.unwrap();

        let stored = db.placements().get(&id).await.unwrap().unwrap();
        assert_eq!(stored.student_id, student_id);
        assert_eq!(stored.intern_days, req.intern_days);

        let entries = db
            .audit_log()
            .list_for_entity(PLACEMENT_ENTITY, &id)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::Create);
        assert_eq!(entries[0].actor_id.as_deref(), Some("t-1"));

        let logged: PlacementRequest = serde_json::from_str(&entries[0].metadata).unwrap();
        assert_eq!(logged, req);
    }

    #[tokio::test]
    async fn test_missing_student_and_company_write_nothing() {
        let (db, student_id, company_id) = setup(2).await;
        let service = db.placement_service();

        let err = service
            .try_create_placement(&request("missing", &company_id, 1, 20))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::StudentNotFound(_))));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = service
            .try_create_placement(&request(&student_id, "missing", 1, 20))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::CompanyNotFound(_))));

        assert_eq!(db.placements().count().await.unwrap(), 0);
        assert_eq!(db.audit_log().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_blank_ids_are_not_found() {
        let (db, student_id, _) = setup(2).await;
        let service = db.placement_service();

        let err = service
            .try_create_placement(&request("", "", 1, 20))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(CoreError::StudentNotFound(_))));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let long_id = "c".repeat(100);
        let response = service
            .create_placement(request(&student_id, &long_id, 1, 20), "t-1")
            .await;
        assert!(!response.success);
        assert_eq!(response.message, CoreError::CompanyNotFound(long_id).to_string());

        assert_eq!(db.placements().count().await.unwrap(), 0);
        assert_eq!(db.audit_log().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rejection_is_idempotent() {
        let (db, student_id, company_id) = setup(2).await;
        let mut req = request(&student_id, &company_id, 1, 20);
        req.intern_days = days(&[Weekday::Monday]);

        let first = db.placement_service().create_placement(req.clone(), "t-1").await;
        let second = db.placement_service().create_placement(req, "t-1").await;

        assert!(!first.success);
        assert_eq!(first, second);
        assert_eq!(
            first.message,
            RejectionReason::SchoolDayConflict {
                days: days(&[Weekday::Monday])
            }
            .to_string()
        );
        assert_eq!(db.placements().count().await.unwrap(), 0);
        assert_eq!(db.audit_log().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_inverted_range_rejected() {
        let (db, student_id, company_id) = setup(1).await;
        let service = db.placement_service();
        service
            .try_create_placement(&request(&student_id, &company_id, 1, 30))
            .await
            .unwrap();

        // Overlaps nothing, so only the date order rule can catch it
        let err = service
            .try_create_placement(&request(&student_id, &company_id, 20, 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(CoreError::Rejected(RejectionReason::InvertedDateRange { .. }))
        ));
        assert_eq!(db.placements().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_insurance_wins_over_inverted_range() {
        let (db, student_id, company_id) = setup(2).await;
        db.students().toggle_insurance_document(&student_id).await.unwrap();

        let response = db
            .placement_service()
            .create_placement(request(&student_id, &company_id, 20, 1), "t-1")
            .await;
        assert!(!response.success);
        assert_eq!(
            response.message,
            RejectionReason::MissingInsuranceDocument.to_string()
        );
        assert_eq!(db.placements().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_acting_teacher_overrides_request() {
        let (db, student_id, company_id) = setup(2).await;
        let mut req = request(&student_id, &company_id, 1, 20);
        req.teacher_id = "spoofed".to_string();

        let response = db.placement_service().create_placement(req, "t-9").await;
        assert!(response.success);
        assert_eq!(response.message, PLACEMENT_CREATED);

        let id = response.data.unwrap();
        let stored = db.placements().get(&id).await.unwrap().unwrap();
        assert_eq!(stored.teacher_id, "t-9");

        let schedule = db
            .placements()
            .list(&PlacementScope::Teacher("t-9".into()))
            .await
            .unwrap();
        assert_eq!(schedule.len(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_hides_details() {
        let (db, student_id, company_id) = setup(2).await;
        db.close().await;

        let response = db
            .placement_service()
            .create_placement(request(&student_id, &company_id, 1, 20), "t-1")
            .await;
        assert!(!response.success);
        assert_eq!(response.message, SERVICE_UNAVAILABLE);
        assert!(response.data.is_none());
    }
}
