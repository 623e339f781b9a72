use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Query filters shared by participant listings and attendance reports.
#[derive(Debug, Default, Deserialize)]
pub struct ReportFilters {
    /// Free-text match against name, email and branch
    pub query: Option<String>,
    pub branch: Option<String>,
    pub year: Option<i64>,
    /// "all", "none" or a calendar day (YYYY-MM-DD)
    pub present_on: Option<String>,
    /// Comma-separated sort fields
    pub sort_by: Option<String>,
}

/// Parsed form of the `present_on` report filter.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PresentOn {
    AllDays,
    NoDays,
    Day(NaiveDate),
}

impl PresentOn {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(PresentOn::AllDays),
            "none" => Ok(PresentOn::NoDays),
            other => other
                .parse()
                .map(PresentOn::Day)
                .map_err(|_| Error::Validation(format!("invalid present_on filter '{other}'"))),
        }
    }
}

/// One row of the attendance report
#[derive(Debug, Serialize)]
pub struct AttendanceReportRow {
    pub id: i64,
    pub name: String,
    pub branch: String,
    pub year: i64,
    pub phone: String,
    pub email: String,
    pub attendance: Vec<NaiveDate>,
}

/// Aggregated attendance statistics for one event
#[derive(Debug, Serialize)]
pub struct AttendanceStats {
    pub total_registrations: i64,
    pub present_zero_days: i64,
    pub present_all_days: i64,
    /// One count per required day, offset from the event's start date
    pub day_wise_attendance: Vec<i64>,
}

const DEFAULT_ORDER: &str = "p.created_at desc, p.branch asc, p.year asc, p.name asc";

/// Build a whitelisted `order by` clause from the comma-separated sort
/// specification. `createdAt` sorts newest first, everything else
/// ascending; unknown fields are ignored.
pub(crate) fn order_clause(sort_by: Option<&str>) -> String {
    let Some(sort_by) = sort_by else {
        return DEFAULT_ORDER.to_string();
    };
    let mut columns = Vec::new();
    for field in sort_by.split(',').map(str::trim) {
        match field {
            "createdAt" | "created_at" => columns.push("p.created_at desc"),
            "branch" => columns.push("p.branch asc"),
            "year" => columns.push("p.year asc"),
            "name" => columns.push("p.name asc"),
            "email" => columns.push("p.email asc"),
            _ => {}
        }
    }
    if columns.is_empty() {
        DEFAULT_ORDER.to_string()
    } else {
        columns.join(", ")
    }
}

/// Escape `%`, `_` and the escape character itself for a `like ... escape
/// '\'` pattern.
pub(crate) fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
