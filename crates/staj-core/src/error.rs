//! # Error Types
//!
//! Domain-specific error types for staj-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  staj-core errors (this file)                                          │
//! │  ├── CoreError        - Domain errors (not found, rejected, ...)       │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── RejectionReason  - Failed eligibility rule (eligibility.rs)       │
//! │                                                                         │
//! │  staj-db errors (separate crate)                                       │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── ServiceError     - CoreError | DbError                            │
//! │                                                                         │
//! │  Every error maps onto one ErrorKind:                                  │
//! │    NotFound | BusinessRuleViolation | StoreFailure                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

use crate::eligibility::RejectionReason;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification callers branch on.
///
/// ```text
/// NotFound              → referenced record is missing, not retried
/// BusinessRuleViolation → fix the request and try again
/// StoreFailure          → try again later
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    BusinessRuleViolation,
    StoreFailure,
}

// =============================================================================
// Core Error
// =============================================================================

/// Domain errors raised by placement coordination operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced student does not exist.
    #[error("Student not found: {0}")]
    StudentNotFound(String),

    /// Referenced company does not exist.
    #[error("Company not found: {0}")]
    CompanyNotFound(String),

    /// Placement does not exist, or is not visible to the acting student.
    #[error("Placement not found: {0}")]
    PlacementNotFound(String),

    #[error("Teacher not found: {0}")]
    TeacherNotFound(String),

    /// Teachers coordinating placements cannot be removed.
    #[error("Teacher {teacher_id} still coordinates {placements} placement(s); remove them first")]
    TeacherHasPlacements { teacher_id: String, placements: i64 },

    /// An attendance record already exists for the student on that day.
    #[error("Attendance for student {student_id} on {date} already exists")]
    DuplicateAttendance { student_id: String, date: String },

    /// A placement eligibility rule failed.
    #[error(transparent)]
    Rejected(#[from] RejectionReason),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Classifies the error for callers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::StudentNotFound(_)
            | CoreError::CompanyNotFound(_)
            | CoreError::PlacementNotFound(_)
            | CoreError::TeacherNotFound(_) => ErrorKind::NotFound,
            CoreError::DuplicateAttendance { .. }
            | CoreError::TeacherHasPlacements { .. }
            | CoreError::Rejected(_)
            | CoreError::Validation(_) => ErrorKind::BusinessRuleViolation,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any business rule runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Range ends before it starts.
    #[error("{field} starts on {start} but ends on {end}")]
    InvertedRange {
        field: String,
        start: String,
        end: String,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::StudentNotFound("s-1".to_string());
        assert_eq!(err.to_string(), "Student not found: s-1");

        let err = CoreError::DuplicateAttendance {
            student_id: "s-1".to_string(),
            date: "2025-03-03".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Attendance for student s-1 on 2025-03-03 already exists"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "fullName".to_string(),
        };
        assert_eq!(err.to_string(), "fullName is required");

        let err = ValidationError::OutOfRange {
            field: "rating".to_string(),
            min: 1,
            max: 5,
        };
        assert_eq!(err.to_string(), "rating must be between 1 and 5");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            CoreError::CompanyNotFound("c".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CoreError::Rejected(RejectionReason::MissingInsuranceDocument).kind(),
            ErrorKind::BusinessRuleViolation
        );

        let busy = CoreError::TeacherHasPlacements {
            teacher_id: "t-1".into(),
            placements: 2,
        };
        assert_eq!(busy.kind(), ErrorKind::BusinessRuleViolation);
        assert_eq!(
            busy.to_string(),
            "Teacher t-1 still coordinates 2 placement(s); remove them first"
        );

        let validation_err = ValidationError::MustBePositive {
            field: "quota".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::BusinessRuleViolation);
    }
}
