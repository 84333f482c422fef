//! # Domain Types
//!
//! Core domain types used throughout Staj.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Student      │   │    Company      │   │   Placement     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  field_of_study │   │  accepted_fields│   │  student_id     │       │
//! │  │  school_days    │   │  operating_days │   │  company_id     │       │
//! │  │  has_insurance  │   │  quota          │   │  start..end     │       │
//! │  │  documents[]    │   │                 │   │  intern_days    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ PlacementRequest│   │  AuditLogEntry  │   │ Attendance /    │       │
//! │  │  (transient)    │──►│  actor, action  │   │ VisitReport /   │       │
//! │  │                 │   │  metadata JSON  │   │ Teacher         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All identifiers are UUID v4 strings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::schedule::{DateRange, WeekdaySet};
use crate::ISG_DOCUMENT_TYPE;

// =============================================================================
// Student
// =============================================================================

/// A student who can be placed at a company.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub full_name: String,
    pub school_number: String,

    /// Main field of study ("Bilişim", "Elektrik", ...). Freeform.
    pub field_of_study: String,
    pub sub_field: String,
    pub class_name: String,

    /// Days the student attends school.
    pub school_days: WeekdaySet,

    /// Occupational safety insurance flag. May be stale relative to
    /// `documents`, see [`Student::has_insurance_coverage`].
    pub has_insurance_document: bool,

    pub documents: Vec<Document>,

    /// Teacher-assigned score, 0..=100.
    pub internship_score: Option<u8>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Student {
    /// True if the flag is set OR an ISG document is on file.
    pub fn has_insurance_coverage(&self) -> bool {
        self.has_insurance_document
            || self
                .documents
                .iter()
                .any(|doc| doc.doc_type == ISG_DOCUMENT_TYPE)
    }
}

/// Input for creating a student.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub full_name: String,
    pub school_number: String,
    pub field_of_study: String,
    #[serde(default)]
    pub sub_field: String,
    #[serde(default)]
    pub class_name: String,
    #[serde(default)]
    pub school_days: WeekdaySet,
}

/// Metadata of a document on file for a student.
///
/// Only metadata is tracked here; file contents live elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub student_id: String,
    /// "ISG", "Contract", "Other", ...
    #[serde(rename = "type")]
    pub doc_type: String,
    pub file_name: String,
    pub content_type: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Company
// =============================================================================

/// A company hosting interns.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    pub name: String,
    pub address: String,

    /// Fields of study the company hosts interns from.
    pub accepted_fields: Vec<String>,

    /// Days the company is open for interns.
    pub operating_days: WeekdaySet,

    /// Maximum placements with overlapping date ranges. At least 1.
    pub quota: u32,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Company {
    /// Case-insensitive (ordinal, not locale-aware) field lookup.
    pub fn accepts_field(&self, field: &str) -> bool {
        self.accepted_fields
            .iter()
            .any(|accepted| eq_ignore_case(accepted, field))
    }
}

/// Compares two strings char by char, each char folded to its single-char
/// uppercase. Chars whose uppercase expands (ß → SS) compare as themselves,
/// so lengths never change.
fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars().map(fold_char).eq(b.chars().map(fold_char))
}

fn fold_char(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

/// Input for creating a company.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewCompany {
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub accepted_fields: Vec<String>,
    pub operating_days: WeekdaySet,
    pub quota: u32,
}

/// Average student rating of a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRatingSummary {
    pub company_id: String,
    /// `None` when no placement has been rated yet.
    pub average_rating: Option<f64>,
    pub rating_count: u32,
}

// =============================================================================
// Teacher
// =============================================================================

/// A coordinator teacher.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    pub full_name: String,
    pub email: String,
    /// Days the teacher visits host companies.
    pub inspection_days: WeekdaySet,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewTeacher {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub inspection_days: WeekdaySet,
}

/// One company a teacher visits, with the intern placed there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AssignedCompany {
    pub company_id: String,
    pub company_name: String,
    pub student_name: String,
}

/// Admin overview row: a teacher, their inspection days and the companies
/// of every placement they coordinate.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSchedule {
    pub teacher_id: String,
    pub teacher_name: String,
    pub inspection_days: WeekdaySet,
    pub assigned_companies: Vec<AssignedCompany>,
}

/// A teacher's inspection days and the placements they coordinate.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InspectionSchedule {
    pub teacher_id: String,
    pub inspection_days: WeekdaySet,
    pub assigned_placements: Vec<Placement>,
}

// =============================================================================
// Placement
// =============================================================================

/// An assignment of one student to one company for an inclusive date range.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub id: String,
    pub student_id: String,
    pub company_id: String,
    /// Coordinator teacher.
    pub teacher_id: String,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    #[ts(as = "String")]
    pub end_date: NaiveDate,
    /// Days the student attends the company.
    pub intern_days: WeekdaySet,
    /// Student's 1..=5 rating of the company.
    pub student_rating: Option<u8>,
    pub student_comment: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Placement {
    /// The placement's date range, `None` if the stored dates are inverted.
    pub fn period(&self) -> Option<DateRange> {
        DateRange::new(self.start_date, self.end_date).ok()
    }
}

/// A proposed placement, evaluated by the eligibility rules.
///
/// Serialized verbatim into the audit entry of a successful placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRequest {
    pub student_id: String,
    pub company_id: String,
    pub teacher_id: String,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    #[ts(as = "String")]
    pub end_date: NaiveDate,
    #[serde(default)]
    pub intern_days: WeekdaySet,
}

impl PlacementRequest {
    /// The requested date range, rejecting `start_date > end_date`.
    pub fn period(&self) -> Result<DateRange, ValidationError> {
        DateRange::new(self.start_date, self.end_date)
    }
}

/// Partial update of a placement. Eligibility is not re-evaluated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PlacementUpdate {
    pub company_id: Option<String>,
    #[ts(as = "Option<String>")]
    pub start_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end_date: Option<NaiveDate>,
}

impl PlacementUpdate {
    pub fn is_empty(&self) -> bool {
        self.company_id.is_none() && self.start_date.is_none() && self.end_date.is_none()
    }
}

/// Which placements a caller may list. The caller derives it from the
/// acting user's role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementScope {
    /// Teachers and administrators.
    All,
    Student(String),
    Company(String),
    /// Placements coordinated by one teacher.
    Teacher(String),
}

// =============================================================================
// Audit Log
// =============================================================================

/// Kind of change recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "PascalCase"))]
#[ts(export)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

/// One audit log row.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: String,
    /// Acting user, if known.
    pub actor_id: Option<String>,
    pub action: AuditAction,
    /// e.g. "Placement".
    pub entity_name: String,
    pub entity_id: String,
    /// JSON details (for placements: the serialized request).
    pub metadata: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Attendance
// =============================================================================

/// Daily attendance of a student at the host company.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: String,
    pub student_id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub is_present: bool,
    pub note: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewAttendance {
    pub student_id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[serde(default = "default_present")]
    pub is_present: bool,
    #[serde(default)]
    pub note: String,
}

fn default_present() -> bool {
    true
}

// =============================================================================
// Visit Report
// =============================================================================

/// A teacher's visit to a student at the host company.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct VisitReport {
    pub id: String,
    pub teacher_id: String,
    pub student_id: String,
    pub company_id: String,
    #[ts(as = "String")]
    pub visit_date: NaiveDate,
    pub note: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewVisitReport {
    pub student_id: String,
    pub company_id: String,
    #[ts(as = "String")]
    pub visit_date: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
}

// =============================================================================
// Caller-Facing Response
// =============================================================================

/// Verdict handed to the presentation layer.
///
/// ```json
/// { "success": false, "message": "Selected intern days conflict with ...", "data": null }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ServiceResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        ServiceResponse {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        ServiceResponse {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Weekday;

    fn company(fields: &[&str]) -> Company {
        let now = Utc::now();
        Company {
            id: "c-1".to_string(),
            name: "Acme".to_string(),
            address: String::new(),
            accepted_fields: fields.iter().map(|f| f.to_string()).collect(),
            operating_days: WeekdaySet::workweek(),
            quota: 2,
            created_at: now,
            updated_at: now,
        }
    }

    fn student(flag: bool, doc_types: &[&str]) -> Student {
        let now = Utc::now();
        Student {
            id: "s-1".to_string(),
            full_name: "Ada".to_string(),
            school_number: "101".to_string(),
            field_of_study: "Bilişim".to_string(),
            sub_field: String::new(),
            class_name: String::new(),
            school_days: [Weekday::Monday].into_iter().collect(),
            has_insurance_document: flag,
            documents: doc_types
                .iter()
                .map(|t| Document {
                    id: format!("d-{t}"),
                    student_id: "s-1".to_string(),
                    doc_type: t.to_string(),
                    file_name: "scan.pdf".to_string(),
                    content_type: "application/pdf".to_string(),
                    created_at: now,
                })
                .collect(),
            internship_score: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_accepts_field_ignores_case() {
        let c = company(&["Bilişim", "Elektrik"]);
        assert!(c.accepts_field("bilişim"));
        assert!(c.accepts_field("BILIŞIM"));
        assert!(c.accepts_field("elektrik"));
        assert!(!c.accepts_field("Makine"));
        assert!(!c.accepts_field("Bilişim "));
        // 'İ' folds to itself, 'i' to 'I'
        assert!(!c.accepts_field("BİLİŞİM"));
    }

    #[test]
    fn test_accepts_field_does_not_expand_chars() {
        let c = company(&["STRASSE", "ﬁnans"]);
        assert!(!c.accepts_field("Straße"));
        assert!(!c.accepts_field("FINANS"));
        assert!(c.accepts_field("strasse"));
        assert!(c.accepts_field("ﬁNANS"));

        // No single-char uppercase: compared as is
        let c = company(&["Straße"]);
        assert!(c.accepts_field("STRAßE"));
        assert!(!c.accepts_field("STRASSE"));
    }

    #[test]
    fn test_insurance_coverage_flag_or_document() {
        assert!(student(true, &[]).has_insurance_coverage());
        assert!(student(false, &["ISG"]).has_insurance_coverage());
        assert!(!student(false, &["Contract", "Other"]).has_insurance_coverage());
        // Type comparison is exact
        assert!(!student(false, &["isg"]).has_insurance_coverage());
    }

    #[test]
    fn test_request_period() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
        let mut request = PlacementRequest {
            student_id: "s".into(),
            company_id: "c".into(),
            teacher_id: "t".into(),
            start_date: d(1),
            end_date: d(20),
            intern_days: WeekdaySet::new(),
        };
        assert_eq!(request.period().unwrap().days(), 20);

        request.end_date = d(1);
        request.start_date = d(2);
        assert!(request.period().is_err());
    }

    #[test]
    fn test_request_json_shape() {
        let json = r#"{
            "studentId": "s",
            "companyId": "c",
            "teacherId": "t",
            "startDate": "2025-03-01",
            "endDate": "2025-06-01",
            "internDays": ["friday", "wednesday"]
        }"#;
        let request: PlacementRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.intern_days.len(), 2);
        assert!(request.intern_days.contains(Weekday::Wednesday));
    }

    #[test]
    fn test_service_response_serialization() {
        let ok = ServiceResponse::ok("created", "p-1".to_string());
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], "p-1");

        let fail: ServiceResponse<String> = ServiceResponse::fail("nope");
        let json = serde_json::to_value(&fail).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["data"].is_null());
    }
}
