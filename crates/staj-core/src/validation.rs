//! # Validation Module
//!
//! Input validation for Staj.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (HTTP / UI)                                           │
//! │  └── Deserialization, acting user id                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required names, lengths                                           │
//! │  └── Rating, score and quota bounds                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Eligibility rules (eligibility.rs), placements only          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE (student, date) attendance                                 │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use staj_core::validation::{validate_rating, validate_quota};
//!
//! validate_rating(4).unwrap();
//! assert!(validate_quota(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{NewCompany, NewStudent, NewTeacher, PlacementRequest};
use crate::{MAX_INTERNSHIP_SCORE, MAX_RATING, MIN_RATING};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Upper bound for names (students, companies, teachers).
pub const MAX_NAME_LEN: usize = 200;

/// Upper bound for free-text notes and comments.
pub const MAX_NOTE_LEN: usize = 2000;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required, bounded text field.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most `max` characters (not bytes)
///
/// ## Example
/// ```rust
/// use staj_core::validation::validate_required;
///
/// assert!(validate_required("fullName", "Ayşe Yılmaz", 200).is_ok());
/// assert!(validate_required("fullName", "   ", 200).is_err());
/// ```
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    validate_max_len(field, value, max)
}

/// Validates an optional text field's length.
pub fn validate_max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a student's star rating of a company.
///
/// ## Rules
/// - Between MIN_RATING (1) and MAX_RATING (5), inclusive
pub fn validate_rating(rating: u8) -> ValidationResult<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(ValidationError::OutOfRange {
            field: "rating".to_string(),
            min: MIN_RATING as i64,
            max: MAX_RATING as i64,
        });
    }
    Ok(())
}

/// Validates a teacher-assigned internship score (0..=100).
pub fn validate_internship_score(score: u8) -> ValidationResult<()> {
    if score > MAX_INTERNSHIP_SCORE {
        return Err(ValidationError::OutOfRange {
            field: "internshipScore".to_string(),
            min: 0,
            max: MAX_INTERNSHIP_SCORE as i64,
        });
    }
    Ok(())
}

/// Validates a company quota.
///
/// ## Rules
/// - Must be at least 1
pub fn validate_quota(quota: u32) -> ValidationResult<()> {
    if quota == 0 {
        return Err(ValidationError::MustBePositive {
            field: "quota".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

pub fn validate_new_student(student: &NewStudent) -> ValidationResult<()> {
    validate_required("fullName", &student.full_name, MAX_NAME_LEN)?;
    validate_required("schoolNumber", &student.school_number, 50)?;
    validate_required("fieldOfStudy", &student.field_of_study, 100)?;
    validate_max_len("subField", &student.sub_field, 100)?;
    validate_max_len("className", &student.class_name, 50)?;
    Ok(())
}

/// ## Rules
/// - Name required
/// - At least one accepted field, none blank
/// - Quota >= 1
pub fn validate_new_company(company: &NewCompany) -> ValidationResult<()> {
    validate_required("name", &company.name, MAX_NAME_LEN)?;
    validate_max_len("address", &company.address, 500)?;

    if company.accepted_fields.is_empty() {
        return Err(ValidationError::Required {
            field: "acceptedFields".to_string(),
        });
    }
    for field in &company.accepted_fields {
        validate_required("acceptedFields", field, 100)?;
    }

    validate_quota(company.quota)
}

pub fn validate_new_teacher(teacher: &NewTeacher) -> ValidationResult<()> {
    validate_required("fullName", &teacher.full_name, MAX_NAME_LEN)?;
    validate_required("email", &teacher.email, 254)?;

    if !teacher.email.contains('@') {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must contain '@'".to_string(),
        });
    }
    Ok(())
}

/// Shape checks on a placement request.
///
/// Student and company ids are not checked: any id that does not resolve,
/// blank ones included, is reported as not found by the lookup. Date order
/// is an eligibility rule.
pub fn validate_placement_request(request: &PlacementRequest) -> ValidationResult<()> {
    validate_required("teacherId", &request.teacher_id, 64)
}

// =============================================================================
// Unit Tests
// =============================================================================
