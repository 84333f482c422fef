//! # staj-core: Pure Domain Logic for Staj
//!
//! This crate is the **heart** of the placement coordination system. It
//! decides whether a proposed internship placement is admissible, using
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Staj Architecture                                │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │             Presentation / HTTP layer (external)                │   │
//! │  │    acting user id + role ──► createPlacement(request)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               staj-db (PlacementService)                        │   │
//! │  │     transaction: read ─► evaluate ─► insert + audit             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ staj-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌─────────────┐ ┌───────────┐ │   │
//! │  │   │   types   │  │ schedule  │  │ eligibility │ │ validation│ │   │
//! │  │   │  Student  │  │ Weekday   │  │ rule chain  │ │  inputs   │ │   │
//! │  │   │ Placement │  │ DateRange │  │ rejections  │ │  ranges   │ │   │
//! │  │   └───────────┘  └───────────┘  └─────────────┘ └───────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Student, Company, Placement, etc.)
//! - [`schedule`] - Weekday sets and inclusive date ranges
//! - [`eligibility`] - Ordered placement eligibility rules
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use staj_core::schedule::{DateRange, Weekday, WeekdaySet};
//!
//! let school: WeekdaySet = [Weekday::Monday, Weekday::Tuesday].into_iter().collect();
//! let intern: WeekdaySet = [Weekday::Wednesday, Weekday::Thursday].into_iter().collect();
//! assert!(school.is_disjoint(&intern));
//!
//! let d = |day| NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
//! let a = DateRange::new(d(1), d(10)).unwrap();
//! let b = DateRange::new(d(10), d(20)).unwrap();
//! assert!(a.overlaps(&b));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod eligibility;
pub mod error;
pub mod schedule;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use eligibility::{EligibilityContext, RejectionReason};
pub use error::{CoreError, ErrorKind, ValidationError};
pub use schedule::{DateRange, Weekday, WeekdaySet};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Document type that satisfies the occupational safety insurance gate.
///
/// Compared exactly (case-sensitive) against `Document::doc_type`.
pub const ISG_DOCUMENT_TYPE: &str = "ISG";

/// Entity name recorded in audit entries for placements.
pub const PLACEMENT_ENTITY: &str = "Placement";

/// Lowest star rating a student can give a host company.
pub const MIN_RATING: u8 = 1;

/// Highest star rating a student can give a host company.
pub const MAX_RATING: u8 = 5;

/// Upper bound of the teacher-assigned internship score (0..=100).
pub const MAX_INTERNSHIP_SCORE: u8 = 100;
