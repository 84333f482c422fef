//! # Schedule Module
//!
//! Value types for the two scheduling dimensions of a placement: the
//! weekly day pattern ([`WeekdaySet`]) and the calendar span ([`DateRange`]).
//!
//! ## Where These Are Used
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Student.school_days ──┐                                                │
//! │                        ├──► intern ∩ school = ∅ ?   (rule 4)            │
//! │  Request.intern_days ──┤                                                │
//! │                        ├──► intern ⊆ operating ?    (rule 5)            │
//! │  Company.operating ────┘                                                │
//! │                                                                         │
//! │  Request.period ───────┬──► overlaps(student placements)  (rule 6)      │
//! │                        └──► count overlaps(company) < quota (rule 7)    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why a Set Type?
//! Weekdays arrive from clients and storage as arrays. Comparing arrays
//! depends on element order and duplicates; a [`WeekdaySet`] does not.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Weekday
// =============================================================================

/// Day of the week, ordered Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All days, Monday through Sunday.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Lowercase English name, matching the serialized form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }

    /// Weekday a calendar date falls on.
    pub fn of(date: NaiveDate) -> Self {
        use chrono::Datelike;
        date.weekday().into()
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Weekday {
    type Err = ValidationError;

    /// Accepts full or three-letter names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Weekday::ALL
            .into_iter()
            .find(|day| day.as_str() == lowered || day.as_str()[..3] == lowered)
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "weekday".to_string(),
                reason: format!("'{s}' is not a day of the week"),
            })
    }
}

// =============================================================================
// Weekday Set
// =============================================================================

/// An order-independent set of weekdays.
///
/// Serializes as a sorted array (`["monday","wednesday"]`); duplicates in
/// the input collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(transparent)]
pub struct WeekdaySet(BTreeSet<Weekday>);

impl WeekdaySet {
    /// Empty set.
    pub fn new() -> Self {
        WeekdaySet(BTreeSet::new())
    }

    /// Monday through Friday.
    pub fn workweek() -> Self {
        Weekday::ALL[..5].iter().copied().collect()
    }

    pub fn insert(&mut self, day: Weekday) -> bool {
        self.0.insert(day)
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0.contains(&day)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        self.0.iter().copied()
    }

    /// Days present in both sets.
    pub fn intersection(&self, other: &WeekdaySet) -> WeekdaySet {
        WeekdaySet(self.0.intersection(&other.0).copied().collect())
    }

    /// Days in `self` that are not in `other`.
    pub fn difference(&self, other: &WeekdaySet) -> WeekdaySet {
        WeekdaySet(self.0.difference(&other.0).copied().collect())
    }

    pub fn is_disjoint(&self, other: &WeekdaySet) -> bool {
        self.0.is_disjoint(&other.0)
    }

    /// True when every day of `self` is in `other`. The empty set is a
    /// subset of everything.
    pub fn is_subset(&self, other: &WeekdaySet) -> bool {
        self.0.is_subset(&other.0)
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        WeekdaySet(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a WeekdaySet {
    type Item = Weekday;
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'a, Weekday>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

impl fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|d| d.as_str()).collect();
        f.write_str(&names.join(", "))
    }
}

// =============================================================================
// Date Range
// =============================================================================

/// Inclusive calendar range `[start, end]` with `start <= end`.
///
/// ## Overlap Rule
/// ```text
///   a: [a1 ─────── a2]
///   b:         [b1 ─────── b2]
///
///   overlaps(a, b)  ⇔  a1 <= b2  AND  b1 <= a2
/// ```
/// Both ends are inclusive, so ranges that share a single boundary day
/// overlap, while `[1, 10]` and `[11, 20]` do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[ts(as = "String")]
    start: NaiveDate,
    #[ts(as = "String")]
    end: NaiveDate,
}

impl DateRange {
    /// Builds a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedRange {
                field: "date range".to_string(),
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(DateRange { start, end })
    }

    /// A range covering exactly one day.
    pub const fn single_day(day: NaiveDate) -> Self {
        DateRange {
            start: day,
            end: day,
        }
    }

    #[inline]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    #[inline]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// True when the two ranges share at least one calendar day.
    #[inline]
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    #[inline]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Number of calendar days covered (at least 1).
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
