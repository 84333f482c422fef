//! # staj-db: Database Layer for Staj
//!
//! This crate provides persistence and placement coordination for Staj.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Staj Data Flow                                   │
//! │                                                                         │
//! │  Caller (HTTP handler, CLI, seed binary)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     staj-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐  ┌──────────────────┐  ┌──────────────┐   │   │
//! │  │   │   Database    │  │ PlacementService │  │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │  │   (service.rs)   │  │  (embedded)  │   │   │
//! │  │   │ SqlitePool    │  │ lock + tx +      │  │ 001_init.sql │   │   │
//! │  │   │ admission lock│  │ staj-core rules  │  │ ...          │   │   │
//! │  │   └───────┬───────┘  └────────┬─────────┘  └──────────────┘   │   │
//! │  │           │                   │                                │   │
//! │  │   ┌───────▼───────────────────▼──────────────────────────────┐ │   │
//! │  │   │  Repositories: student, company, placement, teacher,     │ │   │
//! │  │   │  attendance, visit_report, audit                         │ │   │
//! │  │   └──────────────────────────────────────────────────────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (STAJ_DB_PATH, WAL mode, foreign keys on)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and service error types
//! - [`repository`] - Repository implementations
//! - [`service`] - Placement admission
//!
//! ## Usage
//!
//! ```rust,ignore
//! use staj_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//!
//! let response = db.placement_service().create_placement(request, &teacher_id).await;
//! println!("{}", response.message);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, ServiceError, ServiceResult};
pub use pool::{Database, DbConfig};
pub use service::PlacementService;

// Repository re-exports for convenience
pub use repository::attendance::AttendanceRepository;
pub use repository::audit::AuditLogRepository;
pub use repository::company::CompanyRepository;
pub use repository::placement::PlacementRepository;
pub use repository::student::StudentRepository;
pub use repository::teacher::TeacherRepository;
pub use repository::visit_report::VisitReportRepository;
