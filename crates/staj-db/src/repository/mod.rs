//! # Repository Module
//!
//! Database repository implementations for Staj.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Caller                                                                │
//! │       │  db.students().get("uuid")                                     │
//! │       ▼                                                                 │
//! │  StudentRepository (owns a pool handle)                                │
//! │       │  acquires a connection, delegates to                           │
//! │       ▼                                                                 │
//! │  student::fetch_student(&mut SqliteConnection, id)                     │
//! │       ▲                                                                 │
//! │       │  same function, inside one transaction                         │
//! │  PlacementService                                                      │
//! │                                                                         │
//! │  Connection-level functions are what the placement transaction uses:   │
//! │  every read that feeds an eligibility decision happens on the          │
//! │  transaction's connection.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`StudentRepository`](student::StudentRepository) - Students and their documents
//! - [`CompanyRepository`](company::CompanyRepository) - Host companies and ratings
//! - [`PlacementRepository`](placement::PlacementRepository) - Listing, patching, rating
//! - [`TeacherRepository`](teacher::TeacherRepository) - Teachers and inspection schedules
//! - [`AttendanceRepository`](attendance::AttendanceRepository) - Daily attendance
//! - [`VisitReportRepository`](visit_report::VisitReportRepository) - Teacher visits
//! - [`AuditLogRepository`](audit::AuditLogRepository) - Append-only audit trail

pub mod attendance;
pub mod audit;
pub mod company;
pub mod placement;
pub mod student;
pub mod teacher;
pub mod visit_report;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Fresh UUID v4 string for a new row.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current timestamp for created_at / updated_at columns.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}
