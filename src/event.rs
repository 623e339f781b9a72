use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use crate::{
    certificate::{CertificateMeta, OverlaySpec},
    error::{Error, Result},
};

/// Length of the rotating join code used for attendance check-in.
pub const EVENT_CODE_LENGTH: usize = 20;

/// A multi-day event with a fixed registration capacity
#[derive(PartialEq, Debug, FromRow, Clone, Serialize)]
pub struct Event {
    /// Unique event ID
    pub id: i64,

    pub title: String,

    pub description: String,

    /// Number of attendance days required for full attendance. The
    /// day-wise statistics series is keyed to this, not to the date span.
    pub days: i64,

    pub start_date: NaiveDate,

    pub end_date: NaiveDate,

    pub venue: String,

    pub time: String,

    /// Rotating join code for self-service attendance check-in
    pub code: String,

    /// Flips to false automatically once `registrations` reaches
    /// `max_register`
    pub is_registration_opened: bool,

    pub max_register: i64,

    /// Live registration counter; never exceeds `max_register`
    pub registrations: i64,

    pub created_at: DateTime<Utc>,

    /// Certificate template columns; all set together by the pipeline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_pdf_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_font_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_red: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_green: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_blue: Option<i64>,
}

impl Event {
    /// The configured certificate template, if every column is present.
    pub fn certificate_meta(&self) -> Option<CertificateMeta> {
        Some(CertificateMeta {
            pdf_file: self.cert_pdf_file.clone()?,
            font_file: self.cert_font_file.clone()?,
            spec: OverlaySpec {
                x: self.cert_x? as f32,
                y: self.cert_y? as f32,
                size: self.cert_size? as f32,
                color: [
                    self.cert_red? as u8,
                    self.cert_green? as u8,
                    self.cert_blue? as u8,
                ],
            },
        })
    }

    /// The calendar days the statistics series covers: `start_date + i`
    /// for `i` in `[0, days)`, independent of `end_date`.
    pub fn day_series(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.days).map(|i| self.start_date + Duration::days(i))
    }
}

/// A Json struct to create an event
#[derive(Debug, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub days: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub venue: String,
    pub time: String,
    pub max_register: i64,
    pub is_registration_opened: Option<bool>,
}

impl NewEvent {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("missing required field 'title'".to_string()));
        }
        if self.days < 1 {
            return Err(Error::Validation("'days' must be at least 1".to_string()));
        }
        if self.max_register < 1 {
            return Err(Error::Validation(
                "'max_register' must be at least 1".to_string(),
            ));
        }
        if self.end_date < self.start_date {
            return Err(Error::Validation(
                "'end_date' must not precede 'start_date'".to_string(),
            ));
        }
        Ok(())
    }
}

/// A Json struct to update an event; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub days: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub venue: Option<String>,
    pub time: Option<String>,
    pub max_register: Option<i64>,
    pub is_registration_opened: Option<bool>,
}

impl EventUpdate {
    /// The update applied over the current row, so the result can be
    /// validated with the same rules as a new event.
    pub fn merged(&self, current: &Event) -> NewEvent {
        NewEvent {
            title: self.title.clone().unwrap_or_else(|| current.title.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone()),
            days: self.days.unwrap_or(current.days),
            start_date: self.start_date.unwrap_or(current.start_date),
            end_date: self.end_date.unwrap_or(current.end_date),
            venue: self.venue.clone().unwrap_or_else(|| current.venue.clone()),
            time: self.time.clone().unwrap_or_else(|| current.time.clone()),
            max_register: self.max_register.unwrap_or(current.max_register),
            is_registration_opened: Some(
                self.is_registration_opened
                    .unwrap_or(current.is_registration_opened),
            ),
        }
    }
}

/// Events grouped by where today falls relative to their date window
#[derive(Debug, Default, Serialize)]
pub struct EventsOverview {
    pub previous_events: Vec<Event>,
    pub running_events: Vec<Event>,
    pub upcoming_events: Vec<Event>,
}

/// Split an event list into previous/running/upcoming relative to `today`.
pub fn group_by_window(events: Vec<Event>, today: NaiveDate) -> EventsOverview {
    let mut overview = EventsOverview::default();
    for event in events {
        if today < event.start_date {
            overview.upcoming_events.push(event);
        } else if today > event.end_date {
            overview.previous_events.push(event);
        } else {
            overview.running_events.push(event);
        }
    }
    overview
}

/// Generate a fresh join code.
pub fn generate_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(EVENT_CODE_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_event(start: &str, end: &str, days: i64) -> Event {
        Event {
            id: 1,
            title: "Workshop".to_string(),
            description: String::new(),
            days,
            start_date: start.parse().unwrap(),
            end_date: end.parse().unwrap(),
            venue: "Hall A".to_string(),
            time: "10:00".to_string(),
            code: "code".to_string(),
            is_registration_opened: true,
            max_register: 50,
            registrations: 0,
            created_at: Utc::now(),
            cert_pdf_file: None,
            cert_font_file: None,
            cert_x: None,
            cert_y: None,
            cert_size: None,
            cert_red: None,
            cert_green: None,
            cert_blue: None,
        }
    }

    #[test]
    fn day_series_is_keyed_to_days_not_span() {
        // a two-day series even though the window spans five days
        let event = sample_event("2024-01-01", "2024-01-05", 2);
        let series: Vec<NaiveDate> = event.day_series().collect();
        assert_eq!(
            series,
            vec![
                "2024-01-01".parse::<NaiveDate>().unwrap(),
                "2024-01-02".parse::<NaiveDate>().unwrap(),
            ]
        );
    }

    #[test]
    fn certificate_meta_requires_every_column() {
        let mut event = sample_event("2024-01-01", "2024-01-02", 2);
        assert!(event.certificate_meta().is_none());

        event.cert_pdf_file = Some("template.pdf".to_string());
        event.cert_font_file = Some("font.ttf".to_string());
        event.cert_x = Some(120.0);
        event.cert_y = Some(300.0);
        event.cert_size = Some(24.0);
        event.cert_red = Some(10);
        event.cert_green = Some(20);
        assert!(event.certificate_meta().is_none());

        event.cert_blue = Some(30);
        let meta = event.certificate_meta().unwrap();
        assert_eq!(meta.pdf_file, "template.pdf");
        assert_eq!(meta.spec.color, [10, 20, 30]);
    }

    #[test]
    fn grouping_splits_on_the_window() {
        let previous = sample_event("2024-01-01", "2024-01-02", 2);
        let running = sample_event("2024-02-01", "2024-02-03", 3);
        let upcoming = sample_event("2024-03-01", "2024-03-01", 1);
        let overview = group_by_window(
            vec![previous, running, upcoming],
            "2024-02-02".parse().unwrap(),
        );
        assert_eq!(overview.previous_events.len(), 1);
        assert_eq!(overview.running_events.len(), 1);
        assert_eq!(overview.upcoming_events.len(), 1);
        assert_eq!(overview.running_events[0].title, "Workshop");
    }

    #[test]
    fn merged_update_keeps_absent_fields_and_validates() {
        let current = sample_event("2024-01-01", "2024-01-03", 3);
        let merged = EventUpdate {
            days: Some(2),
            ..Default::default()
        }
        .merged(&current);
        assert_eq!(merged.title, "Workshop");
        assert_eq!(merged.days, 2);
        assert_eq!(merged.max_register, 50);
        assert!(merged.validate().is_ok());

        let merged = EventUpdate {
            days: Some(0),
            ..Default::default()
        }
        .merged(&current);
        assert!(merged.validate().is_err());

        let merged = EventUpdate {
            end_date: Some("2023-12-31".parse().unwrap()),
            ..Default::default()
        }
        .merged(&current);
        assert!(merged.validate().is_err());
    }

    #[test]
    fn new_event_validation() {
        let new = NewEvent {
            title: "Workshop".to_string(),
            description: String::new(),
            days: 0,
            start_date: "2024-01-01".parse().unwrap(),
            end_date: "2024-01-02".parse().unwrap(),
            venue: String::new(),
            time: String::new(),
            max_register: 10,
            is_registration_opened: None,
        };
        assert!(new.validate().is_err());

        let new = NewEvent {
            days: 2,
            end_date: "2023-12-31".parse().unwrap(),
            ..new
        };
        assert!(new.validate().is_err());
    }
}
