//! # Eligibility Module
//!
//! Decides whether a [`PlacementRequest`] is admissible.
//!
//! ## Rule Chain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PlacementRequest + Student + Company + existing placements            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. insurance           flag OR "ISG" document on file                 │
//! │  2. field_of_study      company.accepted_fields ∋ student.field        │
//! │  3. school_days         intern_days ∩ school_days = ∅                  │
//! │  4. operating_days      intern_days ⊆ operating_days                   │
//! │  5. student_booking     no student placement overlaps the range        │
//! │  6. company_quota       overlapping company placements < quota         │
//! │  7. date_order          start <= end                                   │
//! │       │                                                                 │
//! │       ├── first rule returning Some(reason) wins, later rules skipped  │
//! │       ▼                                                                 │
//! │  Ok(())                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Existence of the student and company is a precondition checked by the
//! caller before a context can be built.
//!
//! ## Usage
//! ```rust,ignore
//! let ctx = EligibilityContext::new(&request, &student, &company, &student_placements, &company_placements);
//! eligibility::evaluate(&ctx)?;
//! ```

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

use crate::schedule::WeekdaySet;
use crate::types::{Company, Placement, PlacementRequest, Student};

// =============================================================================
// Rejection Reason
// =============================================================================

/// The failed rule, with a human-readable message.
///
/// Messages are stable: identical failing requests produce identical text.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, TS)]
#[ts(export)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RejectionReason {
    #[error("Placement start date {start} is after its end date {end}.")]
    InvertedDateRange { start: String, end: String },

    #[error("Student has no ISG insurance document. Placement cannot be made.")]
    MissingInsuranceDocument,

    #[error("Field mismatch. Student: {student_field}, company accepts: {}", accepted_fields.join(", "))]
    FieldMismatch {
        student_field: String,
        accepted_fields: Vec<String>,
    },

    #[error("Selected intern days conflict with the student's school days ({days}).")]
    SchoolDayConflict { days: WeekdaySet },

    #[error("Company does not operate on the selected days ({days}).")]
    CompanyClosed { days: WeekdaySet },

    #[error("Student already has another placement in this date range.")]
    StudentDoubleBooked,

    #[error("Company quota ({quota}) is full for this date range.")]
    QuotaExceeded { quota: u32, active: usize },
}

// =============================================================================
// Context
// =============================================================================

/// Everything the rules read. Built by the caller after loading records.
///
/// `student_placements` / `company_placements` are existing placements of
/// the student and of the company. They may be pre-filtered to the request
/// range; the rules re-apply the overlap test either way.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityContext<'a> {
    pub request: &'a PlacementRequest,
    pub student: &'a Student,
    pub company: &'a Company,
    pub student_placements: &'a [Placement],
    pub company_placements: &'a [Placement],
}

impl<'a> EligibilityContext<'a> {
    pub fn new(
        request: &'a PlacementRequest,
        student: &'a Student,
        company: &'a Company,
        student_placements: &'a [Placement],
        company_placements: &'a [Placement],
    ) -> Self {
        EligibilityContext {
            request,
            student,
            company,
            student_placements,
            company_placements,
        }
    }

    /// Existing placements among `placements` whose range overlaps the request.
    fn overlapping<'p>(
        &self,
        placements: &'p [Placement],
    ) -> impl Iterator<Item = &'p Placement> + 'p {
        let requested = self.request.period().ok();
        placements.iter().filter(move |existing| {
            match (requested, existing.period()) {
                (Some(requested), Some(period)) => requested.overlaps(&period),
                _ => false,
            }
        })
    }
}

// =============================================================================
// Rules
// =============================================================================

/// A single eligibility rule.
pub type Rule = fn(&EligibilityContext<'_>) -> Option<RejectionReason>;

/// The ordered rule chain, with names for logging.
pub const RULES: [(&str, Rule); 7] = [
    ("insurance", check_insurance),
    ("field_of_study", check_field_of_study),
    ("school_days", check_school_days),
    ("operating_days", check_operating_days),
    ("student_booking", check_student_booking),
    ("company_quota", check_company_quota),
    ("date_order", check_date_order),
];

/// Runs [`RULES`] in order and returns the first rejection.
pub fn evaluate(ctx: &EligibilityContext<'_>) -> Result<(), RejectionReason> {
    match RULES.iter().find_map(|(_, rule)| rule(ctx)) {
        Some(reason) => Err(reason),
        None => Ok(()),
    }
}

/// Name of the first failing rule, if any. Used for structured logs.
pub fn first_failing_rule(ctx: &EligibilityContext<'_>) -> Option<&'static str> {
    RULES
        .iter()
        .find(|(_, rule)| rule(ctx).is_some())
        .map(|(name, _)| *name)
}

/// An inverted range overlaps nothing, so rules 5 and 6 pass it; this rule
/// rejects it afterwards.
pub fn check_date_order(ctx: &EligibilityContext<'_>) -> Option<RejectionReason> {
    let request = ctx.request;
    if request.start_date > request.end_date {
        return Some(RejectionReason::InvertedDateRange {
            start: request.start_date.to_string(),
            end: request.end_date.to_string(),
        });
    }
    None
}

pub fn check_insurance(ctx: &EligibilityContext<'_>) -> Option<RejectionReason> {
    if ctx.student.has_insurance_coverage() {
        None
    } else {
        Some(RejectionReason::MissingInsuranceDocument)
    }
}

pub fn check_field_of_study(ctx: &EligibilityContext<'_>) -> Option<RejectionReason> {
    if ctx.company.accepts_field(&ctx.student.field_of_study) {
        return None;
    }
    Some(RejectionReason::FieldMismatch {
        student_field: ctx.student.field_of_study.clone(),
        accepted_fields: ctx.company.accepted_fields.clone(),
    })
}

pub fn check_school_days(ctx: &EligibilityContext<'_>) -> Option<RejectionReason> {
    let clash = ctx.request.intern_days.intersection(&ctx.student.school_days);
    if clash.is_empty() {
        None
    } else {
        Some(RejectionReason::SchoolDayConflict { days: clash })
    }
}

pub fn check_operating_days(ctx: &EligibilityContext<'_>) -> Option<RejectionReason> {
    let closed = ctx.request.intern_days.difference(&ctx.company.operating_days);
    if closed.is_empty() {
        None
    } else {
        Some(RejectionReason::CompanyClosed { days: closed })
    }
}

pub fn check_student_booking(ctx: &EligibilityContext<'_>) -> Option<RejectionReason> {
    let student_id = &ctx.request.student_id;
    let booked = ctx
        .overlapping(ctx.student_placements)
        .any(|existing| &existing.student_id == student_id);
    booked.then_some(RejectionReason::StudentDoubleBooked)
}

/// Quota is a concurrency cap: only placements overlapping the requested
/// range count against it.
pub fn check_company_quota(ctx: &EligibilityContext<'_>) -> Option<RejectionReason> {
    let company_id = &ctx.request.company_id;
    let active = ctx
        .overlapping(ctx.company_placements)
        .filter(|existing| &existing.company_id == company_id)
        .count();

    if active >= ctx.company.quota as usize {
        return Some(RejectionReason::QuotaExceeded {
            quota: ctx.company.quota,
            active,
        });
    }
    None
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Weekday;
    use crate::types::Document;
    use chrono::{NaiveDate, Utc};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn days(list: &[Weekday]) -> WeekdaySet {
        list.iter().copied().collect()
    }

    fn student() -> Student {
        let now = Utc::now();
        Student {
            id: "s-1".to_string(),
            full_name: "Ayşe Yılmaz".to_string(),
            school_number: "1001".to_string(),
            field_of_study: "Bilişim".to_string(),
            sub_field: String::new(),
            class_name: "12-A".to_string(),
            school_days: days(&[Weekday::Monday, Weekday::Tuesday]),
            has_insurance_document: true,
            documents: Vec::new(),
            internship_score: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn company(quota: u32) -> Company {
        let now = Utc::now();
        Company {
            id: "c-1".to_string(),
            name: "Yazılım A.Ş.".to_string(),
            address: String::new(),
            accepted_fields: vec!["Bilişim".to_string()],
            operating_days: WeekdaySet::workweek(),
            quota,
            created_at: now,
            updated_at: now,
        }
    }

    fn request(start: u32, end: u32, intern: &[Weekday]) -> PlacementRequest {
        PlacementRequest {
            student_id: "s-1".to_string(),
            company_id: "c-1".to_string(),
            teacher_id: "t-1".to_string(),
            start_date: day(start),
            end_date: day(end),
            intern_days: days(intern),
        }
    }

    fn placement(student_id: &str, company_id: &str, start: u32, end: u32) -> Placement {
        let now = Utc::now();
        Placement {
            id: format!("p-{student_id}-{start}"),
            student_id: student_id.to_string(),
            company_id: company_id.to_string(),
            teacher_id: "t-1".to_string(),
            start_date: day(start),
            end_date: day(end),
            intern_days: days(&[Weekday::Wednesday]),
            student_rating: None,
            student_comment: None,
            created_at: now,
            updated_at: now,
        }
    }

    const WED_THU_FRI: [Weekday; 3] = [Weekday::Wednesday, Weekday::Thursday, Weekday::Friday];

    #[test]
    fn test_eligible_request_passes() {
        let (s, c) = (student(), company(2));
        let req = request(1, 20, &WED_THU_FRI);
        let ctx = EligibilityContext::new(&req, &s, &c, &[], &[]);
        assert_eq!(evaluate(&ctx), Ok(()));
        assert_eq!(first_failing_rule(&ctx), None);
    }

    #[test]
    fn test_inverted_range_is_rejected_last() {
        let (s, c) = (student(), company(1));
        // Would be a double booking and a full quota for a forward range
        let existing = [placement("s-1", "c-1", 1, 30)];
        let req = request(20, 1, &WED_THU_FRI);
        let ctx = EligibilityContext::new(&req, &s, &c, &existing, &existing);

        assert_eq!(
            evaluate(&ctx),
            Err(RejectionReason::InvertedDateRange {
                start: "2025-03-20".to_string(),
                end: "2025-03-01".to_string(),
            })
        );
        assert_eq!(first_failing_rule(&ctx), Some("date_order"));
    }

    #[test]
    fn test_earlier_rules_win_over_inverted_range() {
        let mut s = student();
        s.has_insurance_document = false;
        let c = company(2);
        let req = request(20, 1, &WED_THU_FRI);
        let ctx = EligibilityContext::new(&req, &s, &c, &[], &[]);
        assert_eq!(evaluate(&ctx), Err(RejectionReason::MissingInsuranceDocument));

        let s = student();
        let req = request(20, 1, &[Weekday::Monday]);
        let ctx = EligibilityContext::new(&req, &s, &c, &[], &[]);
        assert_eq!(first_failing_rule(&ctx), Some("school_days"));
    }

    #[test]
    fn test_missing_insurance_wins_over_everything_else() {
        let mut s = student();
        s.has_insurance_document = false;
        s.field_of_study = "Makine".to_string();
        let c = company(1);
        let existing = [placement("s-1", "c-1", 1, 30)];
        // School day clash, closed day, double booking and full quota too
        let req = request(1, 20, &[Weekday::Monday, Weekday::Sunday]);
        let ctx = EligibilityContext::new(&req, &s, &c, &existing, &existing);

        assert_eq!(
            evaluate(&ctx),
            Err(RejectionReason::MissingInsuranceDocument)
        );
    }

    #[test]
    fn test_isg_document_satisfies_insurance_without_flag() {
        let mut s = student();
        s.has_insurance_document = false;
        s.documents.push(Document {
            id: "d-1".to_string(),
            student_id: "s-1".to_string(),
            doc_type: "ISG".to_string(),
            file_name: "isg.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            created_at: Utc::now(),
        });
        let c = company(2);
        let req = request(1, 20, &WED_THU_FRI);
        let ctx = EligibilityContext::new(&req, &s, &c, &[], &[]);

        assert_eq!(check_insurance(&ctx), None);
        assert_eq!(evaluate(&ctx), Ok(()));
    }

    #[test]
    fn test_field_mismatch_message_lists_accepted_fields() {
        let mut s = student();
        s.field_of_study = "Makine".to_string();
        let mut c = company(2);
        c.accepted_fields = vec!["Bilişim".to_string(), "Elektrik".to_string()];
        let req = request(1, 20, &WED_THU_FRI);
        let ctx = EligibilityContext::new(&req, &s, &c, &[], &[]);

        let reason = evaluate(&ctx).unwrap_err();
        assert_eq!(
            reason.to_string(),
            "Field mismatch. Student: Makine, company accepts: Bilişim, Elektrik"
        );
    }

    #[test]
    fn test_field_match_is_case_insensitive() {
        let mut s = student();
        s.field_of_study = "BILIŞIM".to_string();
        let c = company(2);
        let req = request(1, 20, &WED_THU_FRI);
        let ctx = EligibilityContext::new(&req, &s, &c, &[], &[]);
        assert_eq!(check_field_of_study(&ctx), None);
    }

    #[test]
    fn test_school_day_conflict() {
        let (s, c) = (student(), company(2));
        let req = request(1, 20, &[Weekday::Monday]);
        let ctx = EligibilityContext::new(&req, &s, &c, &[], &[]);

        assert_eq!(
            evaluate(&ctx),
            Err(RejectionReason::SchoolDayConflict {
                days: days(&[Weekday::Monday])
            })
        );
    }

    #[test]
    fn test_intern_days_outside_operating_days() {
        let (s, c) = (student(), company(2));
        let req = request(1, 20, &[Weekday::Friday, Weekday::Saturday]);
        let ctx = EligibilityContext::new(&req, &s, &c, &[], &[]);

        let reason = evaluate(&ctx).unwrap_err();
        assert_eq!(
            reason,
            RejectionReason::CompanyClosed {
                days: days(&[Weekday::Saturday])
            }
        );
        assert_eq!(
            reason.to_string(),
            "Company does not operate on the selected days (saturday)."
        );
    }

    #[test]
    fn test_empty_intern_days_pass_day_rules() {
        let (s, c) = (student(), company(2));
        let req = request(1, 20, &[]);
        let ctx = EligibilityContext::new(&req, &s, &c, &[], &[]);
        assert_eq!(check_school_days(&ctx), None);
        assert_eq!(check_operating_days(&ctx), None);
    }

    #[test]
    fn test_student_double_booking() {
        let (s, c) = (student(), company(5));
        let req = request(10, 20, &WED_THU_FRI);

        let touching = [placement("s-1", "c-9", 1, 10)];
        let ctx = EligibilityContext::new(&req, &s, &c, &touching, &[]);
        assert_eq!(evaluate(&ctx), Err(RejectionReason::StudentDoubleBooked));

        let before = [placement("s-1", "c-9", 1, 9)];
        let ctx = EligibilityContext::new(&req, &s, &c, &before, &[]);
        assert_eq!(evaluate(&ctx), Ok(()));
    }

    #[test]
    fn test_quota_boundary() {
        let s = student();
        let req = request(10, 20, &WED_THU_FRI);
        let c = company(2);

        let one = [placement("s-2", "c-1", 1, 15)];
        let ctx = EligibilityContext::new(&req, &s, &c, &[], &one);
        assert_eq!(evaluate(&ctx), Ok(()));

        let two = [placement("s-2", "c-1", 1, 15), placement("s-3", "c-1", 18, 30)];
        let ctx = EligibilityContext::new(&req, &s, &c, &[], &two);
        let reason = evaluate(&ctx).unwrap_err();
        assert_eq!(reason, RejectionReason::QuotaExceeded { quota: 2, active: 2 });
        assert_eq!(
            reason.to_string(),
            "Company quota (2) is full for this date range."
        );
    }

    #[test]
    fn test_quota_ignores_non_overlapping_placements() {
        let s = student();
        let req = request(10, 20, &WED_THU_FRI);
        let c = company(1);
        let history = [
            placement("s-2", "c-1", 1, 9),
            placement("s-3", "c-1", 21, 31),
        ];
        let ctx = EligibilityContext::new(&req, &s, &c, &[], &history);
        assert_eq!(check_company_quota(&ctx), None);
    }

    #[test]
    fn test_rejection_serializes_with_rule_tag() {
        let json = serde_json::to_value(RejectionReason::StudentDoubleBooked).unwrap();
        assert_eq!(json["rule"], "student_double_booked");
    }
}
