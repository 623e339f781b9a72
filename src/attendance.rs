use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Attendance status of a participant for a single event. The status only
/// moves forward: marks are unique per calendar day and can only be added
/// inside the event window, so once `Attended` is reached no later mark
/// can lower it.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AttendanceStatus {
    NotAttended,
    PartiallyAttended,
    Attended,
}

impl AttendanceStatus {
    /// Derive the status from the number of recorded day marks against the
    /// event's required days.
    pub fn for_marks(marks: u32, required_days: u32) -> Self {
        if marks == 0 {
            AttendanceStatus::NotAttended
        } else if marks < required_days {
            AttendanceStatus::PartiallyAttended
        } else {
            AttendanceStatus::Attended
        }
    }
}

/// Whether a calendar day falls inside the event's date window, both ends
/// inclusive.
pub fn window_contains(start: NaiveDate, end: NaiveDate, day: NaiveDate) -> bool {
    start <= day && day <= end
}
