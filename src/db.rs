use std::{collections::HashMap, path::Path, time::Duration};

use chrono::{NaiveDate, Utc};
use futures::future::try_join_all;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::{
    attendance::{self, AttendanceStatus},
    certificate::OverlaySpec,
    error::{Error, Result},
    event::{self, Event, EventUpdate, NewEvent},
    feedback::{Feedback, FeedbackReportRow},
    participant::{NewParticipant, Participant, ParticipantOverview, ParticipantUpdate, RegisteredEvent},
    report::{escape_like, order_clause, AttendanceReportRow, AttendanceStats, PresentOn, ReportFilters},
};

const SCHEMA: &[&str] = &[
    "create table if not exists participants(
        id integer primary key autoincrement,
        name text not null,
        email text not null unique collate nocase,
        branch text not null,
        year integer not null,
        phone text not null,
        credential text not null,
        is_revoked boolean not null default 0,
        created_at text not null
    );",
    "create table if not exists events(
        id integer primary key autoincrement,
        title text not null,
        description text not null default '',
        days integer not null,
        start_date text not null,
        end_date text not null,
        venue text not null default '',
        time text not null default '',
        code text not null unique,
        is_registration_opened boolean not null default 1,
        max_register integer not null,
        registrations integer not null default 0,
        created_at text not null,
        cert_pdf_file text,
        cert_font_file text,
        cert_x real,
        cert_y real,
        cert_size real,
        cert_red integer,
        cert_green integer,
        cert_blue integer
    );",
    "create table if not exists registrations(
        participant integer not null,
        event integer not null,
        status text not null,
        created_at text not null,
        primary key(participant, event),
        foreign key(participant) references participants(id) on delete cascade,
        foreign key(event) references events(id) on delete cascade
    );",
    "create table if not exists attendance_marks(
        participant integer not null,
        event integer not null,
        day text not null,
        primary key(participant, event, day),
        foreign key(participant, event) references registrations(participant, event)
            on delete cascade
    );",
    "create table if not exists feedback(
        participant integer not null,
        event integer not null,
        response text not null,
        created_at text not null,
        primary key(participant, event),
        foreign key(participant) references participants(id) on delete cascade,
        foreign key(event) references events(id) on delete cascade
    );",
    "create index if not exists idx_registrations_event on registrations(event);",
    "create index if not exists idx_marks_event_day on attendance_marks(event, day);",
];

pub struct EventDb {
    db: SqlitePool,
}

impl EventDb {
    /// Open (creating if missing) the store. Foreign keys and a busy
    /// timeout are set on every connection; registration relies on both.
    pub async fn open(file: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(file)
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));
        let db = SqlitePoolOptions::new().connect_with(options).await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&db).await?;
        }
        Ok(EventDb { db })
    }

    // -- participants -----------------------------------------------------

    pub async fn add_participant(
        &self,
        new: &NewParticipant,
        credential: &str,
    ) -> Result<Participant> {
        log::debug!("creating participant {}", new.email);
        let result = sqlx::query(
            "insert into participants(name, email, branch, year, phone, credential, created_at)
                values(?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.branch)
        .bind(new.year)
        .bind(&new.phone)
        .bind(credential)
        .bind(Utc::now())
        .execute(&self.db)
        .await;

        match result {
            Ok(done) => self.get_participant(done.last_insert_rowid()).await,
            Err(e) if is_unique_violation(&e) => Err(Error::EmailTaken),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_participant(&self, id: i64) -> Result<Participant> {
        sqlx::query_as("select * from participants where id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(Error::ParticipantNotFound(id))
    }

    pub async fn list_participants(
        &self,
        event: Option<i64>,
        filters: &ReportFilters,
    ) -> Result<Vec<Participant>> {
        let mut sql = String::from("select p.* from participants p");
        if event.is_some() {
            sql.push_str(" join registrations r on r.participant = p.id and r.event = ?");
        }
        sql.push_str(" where 1 = 1");
        let pattern = like_pattern(filters);
        push_filter_sql(&mut sql, filters, pattern.is_some());
        sql.push_str(" order by ");
        sql.push_str(&order_clause(filters.sort_by.as_deref()));

        let mut query = sqlx::query_as(&sql);
        if let Some(event) = event {
            query = query.bind(event);
        }
        query = bind_filters(query, filters, &pattern);
        Ok(query.fetch_all(&self.db).await?)
    }

    pub async fn update_participant(
        &self,
        id: i64,
        update: &ParticipantUpdate,
    ) -> Result<Participant> {
        let current = self.get_participant(id).await?;
        let result = sqlx::query(
            "update participants set name = ?, email = ?, branch = ?, year = ?, phone = ?
                where id = ?",
        )
        .bind(update.name.as_ref().unwrap_or(&current.name))
        .bind(update.email.as_ref().unwrap_or(&current.email))
        .bind(update.branch.as_ref().unwrap_or(&current.branch))
        .bind(update.year.unwrap_or(current.year))
        .bind(update.phone.as_ref().unwrap_or(&current.phone))
        .bind(id)
        .execute(&self.db)
        .await;
        match result {
            Ok(_) => self.get_participant(id).await,
            Err(e) if is_unique_violation(&e) => Err(Error::EmailTaken),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a participant; registrations, marks and feedback cascade.
    pub async fn delete_participant(&self, id: i64) -> Result<()> {
        let done = sqlx::query("delete from participants where id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        if done.rows_affected() == 0 {
            return Err(Error::ParticipantNotFound(id));
        }
        log::debug!("deleted participant {}", id);
        Ok(())
    }

    pub async fn toggle_revoked(&self, id: i64) -> Result<Participant> {
        let done = sqlx::query("update participants set is_revoked = not is_revoked where id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        if done.rows_affected() == 0 {
            return Err(Error::ParticipantNotFound(id));
        }
        self.get_participant(id).await
    }

    /// Profile data plus every event the participant registered for, with
    /// status and marked days.
    pub async fn participant_overview(&self, id: i64) -> Result<ParticipantOverview> {
        let participant = self.get_participant(id).await?;
        let entries: Vec<(i64, AttendanceStatus)> = sqlx::query_as(
            "select event, status from registrations where participant = ?
                order by created_at desc",
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        let mut events = Vec::with_capacity(entries.len());
        for (event_id, status) in entries {
            let event = self.get_event(event_id).await?;
            let attendance = self.day_marks(id, event_id).await?;
            events.push(RegisteredEvent {
                event,
                status,
                attendance,
            });
        }
        Ok(ParticipantOverview {
            name: participant.name,
            email: participant.email,
            branch: participant.branch,
            year: participant.year,
            phone: participant.phone,
            events,
        })
    }

    // -- events -----------------------------------------------------------

    pub async fn add_event(&self, new: &NewEvent) -> Result<Event> {
        log::debug!("creating event {}", new.title);
        let done = sqlx::query(
            "insert into events(title, description, days, start_date, end_date, venue, time,
                code, is_registration_opened, max_register, created_at)
                values(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.days)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(&new.venue)
        .bind(&new.time)
        .bind(event::generate_code())
        .bind(new.is_registration_opened.unwrap_or(true))
        .bind(new.max_register)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;
        self.get_event(done.last_insert_rowid()).await
    }

    pub async fn get_event(&self, id: i64) -> Result<Event> {
        sqlx::query_as("select * from events where id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(Error::EventNotFound(id))
    }

    pub async fn list_events(&self) -> Result<Vec<Event>> {
        Ok(sqlx::query_as("select * from events order by created_at desc")
            .fetch_all(&self.db)
            .await?)
    }

    /// Apply a partial update. The merged row is validated like a new
    /// event, and the capacity write is conditional on the live counter so
    /// a shrink racing concurrent registrations can never leave
    /// `registrations` above `max_register`.
    pub async fn update_event(&self, id: i64, update: &EventUpdate) -> Result<Event> {
        let current = self.get_event(id).await?;
        let merged = update.merged(&current);
        merged.validate()?;
        let max_register = merged.max_register;
        let is_open = update
            .is_registration_opened
            .unwrap_or(current.is_registration_opened);
        let done = sqlx::query(
            "update events set title = ?, description = ?, days = ?, start_date = ?,
                end_date = ?, venue = ?, time = ?, max_register = ?,
                is_registration_opened = case when registrations >= ? then 0 else ? end
                where id = ? and registrations <= ?",
        )
        .bind(&merged.title)
        .bind(&merged.description)
        .bind(merged.days)
        .bind(merged.start_date)
        .bind(merged.end_date)
        .bind(&merged.venue)
        .bind(&merged.time)
        .bind(max_register)
        .bind(max_register)
        .bind(is_open)
        .bind(id)
        .bind(max_register)
        .execute(&self.db)
        .await?;
        if done.rows_affected() == 0 {
            // either the event vanished or the live counter is above the
            // requested cap
            self.get_event(id).await?;
            return Err(Error::CapacityBelowRegistered);
        }
        self.get_event(id).await
    }

    /// Rotate the join code, invalidating the previous one immediately.
    pub async fn rotate_code(&self, id: i64) -> Result<Event> {
        let done = sqlx::query("update events set code = ? where id = ?")
            .bind(event::generate_code())
            .bind(id)
            .execute(&self.db)
            .await?;
        if done.rows_affected() == 0 {
            return Err(Error::EventNotFound(id));
        }
        self.get_event(id).await
    }

    /// Re-open or close registration manually; refused when the event is
    /// already full. The fullness check lives in the `where` clause so a
    /// registration landing concurrently can't re-open a full event.
    pub async fn toggle_registration_open(&self, id: i64) -> Result<Event> {
        let done = sqlx::query(
            "update events set is_registration_opened = not is_registration_opened
                where id = ? and registrations < max_register",
        )
        .bind(id)
        .execute(&self.db)
        .await?;
        if done.rows_affected() == 0 {
            self.get_event(id).await?;
            return Err(Error::CapacityExceeded);
        }
        self.get_event(id).await
    }

    /// Remove the event row; registrations, marks and feedback cascade.
    /// Called by the purge job, not directly by handlers.
    pub async fn purge_event(&self, id: i64) -> Result<()> {
        sqlx::query("delete from events where id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        log::debug!("purged event {}", id);
        Ok(())
    }

    pub async fn set_certificate_meta(
        &self,
        id: i64,
        pdf_file: &str,
        font_file: &str,
        spec: &OverlaySpec,
    ) -> Result<()> {
        let done = sqlx::query(
            "update events set cert_pdf_file = ?, cert_font_file = ?, cert_x = ?, cert_y = ?,
                cert_size = ?, cert_red = ?, cert_green = ?, cert_blue = ? where id = ?",
        )
        .bind(pdf_file)
        .bind(font_file)
        .bind(f64::from(spec.x))
        .bind(f64::from(spec.y))
        .bind(f64::from(spec.size))
        .bind(i64::from(spec.color[0]))
        .bind(i64::from(spec.color[1]))
        .bind(i64::from(spec.color[2]))
        .bind(id)
        .execute(&self.db)
        .await?;
        if done.rows_affected() == 0 {
            return Err(Error::EventNotFound(id));
        }
        Ok(())
    }

    // -- registration -----------------------------------------------------

    /// Register a participant for an event. The capacity claim, the
    /// registration row and the counter update commit or roll back as one
    /// transaction, and the claim is a conditional increment so racing
    /// callers can never push `registrations` past `max_register`.
    pub async fn register_for_event(&self, participant_id: i64, event_id: i64) -> Result<Event> {
        let participant = self.get_participant(participant_id).await?;
        if participant.is_revoked {
            return Err(Error::AccountRevoked);
        }

        let mut tx = self.db.begin().await?;
        let claimed = sqlx::query(
            "update events set registrations = registrations + 1,
                is_registration_opened = case when registrations + 1 >= max_register
                                              then 0 else is_registration_opened end
                where id = ? and registrations < max_register",
        )
        .bind(event_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if claimed == 0 {
            let exists: Option<i64> = sqlx::query_scalar("select id from events where id = ?")
                .bind(event_id)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                return Err(Error::EventNotFound(event_id));
            }
            let registered: i64 = sqlx::query_scalar(
                "select count(*) from registrations where participant = ? and event = ?",
            )
            .bind(participant_id)
            .bind(event_id)
            .fetch_one(&mut *tx)
            .await?;
            return Err(if registered > 0 {
                Error::AlreadyRegistered
            } else {
                Error::CapacityExceeded
            });
        }

        let inserted = sqlx::query(
            "insert into registrations(participant, event, status, created_at) values(?, ?, ?, ?)",
        )
        .bind(participant_id)
        .bind(event_id)
        .bind(AttendanceStatus::NotAttended)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await;
        match inserted {
            // dropping the transaction rolls the increment back
            Err(e) if is_unique_violation(&e) => return Err(Error::AlreadyRegistered),
            Err(e) => return Err(e.into()),
            Ok(_) => {}
        }

        let event: Event = sqlx::query_as("select * from events where id = ?")
            .bind(event_id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        log::debug!(
            "participant {} registered for event {} ({}/{})",
            participant_id,
            event_id,
            event.registrations,
            event.max_register
        );
        Ok(event)
    }

    pub async fn registration_status(
        &self,
        participant_id: i64,
        event_id: i64,
    ) -> Result<Option<AttendanceStatus>> {
        Ok(sqlx::query_scalar(
            "select status from registrations where participant = ? and event = ?",
        )
        .bind(participant_id)
        .bind(event_id)
        .fetch_optional(&self.db)
        .await?)
    }

    // -- attendance -------------------------------------------------------

    /// Mark the caller present for today, resolving the event by its join
    /// code.
    pub async fn mark_attendance(&self, code: &str, participant_id: i64) -> Result<AttendanceStatus> {
        self.mark_attendance_on(code, participant_id, Utc::now().date_naive())
            .await
    }

    /// Day-injectable form of [`Self::mark_attendance`]. One mark per
    /// calendar day per pair; the mark table's primary key settles the
    /// double-mark race.
    pub async fn mark_attendance_on(
        &self,
        code: &str,
        participant_id: i64,
        day: NaiveDate,
    ) -> Result<AttendanceStatus> {
        let participant = self.get_participant(participant_id).await?;
        if participant.is_revoked {
            return Err(Error::AccountRevoked);
        }

        let mut tx = self.db.begin().await?;
        let event: Event = sqlx::query_as("select * from events where code = ?")
            .bind(code)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(Error::InvalidCode)?;

        let registered: i64 = sqlx::query_scalar(
            "select count(*) from registrations where participant = ? and event = ?",
        )
        .bind(participant_id)
        .bind(event.id)
        .fetch_one(&mut *tx)
        .await?;
        if registered == 0 {
            return Err(Error::NotRegistered);
        }

        if !attendance::window_contains(event.start_date, event.end_date, day) {
            return Err(Error::OutsideEventWindow);
        }

        let inserted = sqlx::query(
            "insert into attendance_marks(participant, event, day) values(?, ?, ?)",
        )
        .bind(participant_id)
        .bind(event.id)
        .bind(day)
        .execute(&mut *tx)
        .await;
        match inserted {
            Err(e) if is_unique_violation(&e) => return Err(Error::AlreadyMarkedToday),
            Err(e) => return Err(e.into()),
            Ok(_) => {}
        }

        let marks: i64 = sqlx::query_scalar(
            "select count(*) from attendance_marks where participant = ? and event = ?",
        )
        .bind(participant_id)
        .bind(event.id)
        .fetch_one(&mut *tx)
        .await?;
        let status = AttendanceStatus::for_marks(marks as u32, event.days as u32);
        sqlx::query("update registrations set status = ? where participant = ? and event = ?")
            .bind(status)
            .bind(participant_id)
            .bind(event.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        log::debug!(
            "marked participant {} present for event {} on {} ({} of {} days)",
            participant_id,
            event.id,
            day,
            marks,
            event.days
        );
        Ok(status)
    }

    /// The event and the caller's marked days for it.
    pub async fn attendance_for(
        &self,
        participant_id: i64,
        event_id: i64,
    ) -> Result<(Event, Vec<NaiveDate>)> {
        let event = self.get_event(event_id).await?;
        if self
            .registration_status(participant_id, event_id)
            .await?
            .is_none()
        {
            return Err(Error::NotRegistered);
        }
        let marks = self.day_marks(participant_id, event_id).await?;
        Ok((event, marks))
    }

    async fn day_marks(&self, participant_id: i64, event_id: i64) -> Result<Vec<NaiveDate>> {
        Ok(sqlx::query_scalar(
            "select day from attendance_marks where participant = ? and event = ? order by day",
        )
        .bind(participant_id)
        .bind(event_id)
        .fetch_all(&self.db)
        .await?)
    }

    // -- reporting --------------------------------------------------------

    pub async fn attendance_report(
        &self,
        event_id: i64,
        filters: &ReportFilters,
    ) -> Result<Vec<AttendanceReportRow>> {
        let event = self.get_event(event_id).await?;
        let present_on = filters
            .present_on
            .as_deref()
            .map(PresentOn::parse)
            .transpose()?;

        let mut sql = String::from(
            "select p.* from participants p join registrations r on r.participant = p.id
                where r.event = ?",
        );
        let pattern = like_pattern(filters);
        push_filter_sql(&mut sql, filters, pattern.is_some());
        sql.push_str(" order by ");
        sql.push_str(&order_clause(filters.sort_by.as_deref()));

        let mut query = sqlx::query_as::<_, Participant>(&sql).bind(event_id);
        query = bind_filters(query, filters, &pattern);
        let participants = query.fetch_all(&self.db).await?;

        let rows: Vec<(i64, NaiveDate)> = sqlx::query_as(
            "select participant, day from attendance_marks where event = ? order by day",
        )
        .bind(event_id)
        .fetch_all(&self.db)
        .await?;
        let mut marks: HashMap<i64, Vec<NaiveDate>> = HashMap::new();
        for (participant, day) in rows {
            marks.entry(participant).or_default().push(day);
        }

        let mut report = Vec::new();
        for p in participants {
            let attendance = marks.remove(&p.id).unwrap_or_default();
            let keep = match present_on {
                None => true,
                Some(PresentOn::AllDays) => attendance.len() as i64 == event.days,
                Some(PresentOn::NoDays) => attendance.is_empty(),
                Some(PresentOn::Day(day)) => attendance.contains(&day),
            };
            if keep {
                report.push(AttendanceReportRow {
                    id: p.id,
                    name: p.name,
                    branch: p.branch,
                    year: p.year,
                    phone: p.phone,
                    email: p.email,
                    attendance,
                });
            }
        }
        Ok(report)
    }

    /// Totals plus a day-wise series of exactly `event.days` counts. The
    /// series is keyed to the required day count, not to the date span.
    pub async fn attendance_stats(&self, event_id: i64) -> Result<AttendanceStats> {
        let event = self.get_event(event_id).await?;

        let total_registrations: i64 =
            sqlx::query_scalar("select count(*) from registrations where event = ?")
                .bind(event_id)
                .fetch_one(&self.db)
                .await?;
        let present_zero_days: i64 = sqlx::query_scalar(
            "select count(*) from registrations where event = ? and status = ?",
        )
        .bind(event_id)
        .bind(AttendanceStatus::NotAttended)
        .fetch_one(&self.db)
        .await?;
        let present_all_days: i64 = sqlx::query_scalar(
            "select count(*) from registrations where event = ? and status = ?",
        )
        .bind(event_id)
        .bind(AttendanceStatus::Attended)
        .fetch_one(&self.db)
        .await?;

        let day_wise_attendance = try_join_all(event.day_series().map(|day| {
            sqlx::query_scalar::<_, i64>(
                "select count(*) from attendance_marks where event = ? and day = ?",
            )
            .bind(event_id)
            .bind(day)
            .fetch_one(&self.db)
        }))
        .await?;

        Ok(AttendanceStats {
            total_registrations,
            present_zero_days,
            present_all_days,
            day_wise_attendance,
        })
    }

    // -- feedback ---------------------------------------------------------

    /// One feedback per (participant, event), and only once at least one
    /// day has been marked.
    pub async fn submit_feedback(
        &self,
        participant_id: i64,
        event_id: i64,
        response: &serde_json::Value,
    ) -> Result<Feedback> {
        if !response.as_array().is_some_and(|a| !a.is_empty()) {
            return Err(Error::Validation(
                "at least one response is required".to_string(),
            ));
        }
        self.get_event(event_id).await?;

        let marked: i64 = sqlx::query_scalar(
            "select count(*) from attendance_marks where participant = ? and event = ?",
        )
        .bind(participant_id)
        .bind(event_id)
        .fetch_one(&self.db)
        .await?;
        if marked == 0 {
            return Err(Error::NotAttended);
        }

        let inserted = sqlx::query(
            "insert into feedback(participant, event, response, created_at) values(?, ?, ?, ?)",
        )
        .bind(participant_id)
        .bind(event_id)
        .bind(response)
        .bind(Utc::now())
        .execute(&self.db)
        .await;
        match inserted {
            Err(e) if is_unique_violation(&e) => Err(Error::FeedbackExists),
            Err(e) => Err(e.into()),
            Ok(_) => Ok(sqlx::query_as(
                "select * from feedback where participant = ? and event = ?",
            )
            .bind(participant_id)
            .bind(event_id)
            .fetch_one(&self.db)
            .await?),
        }
    }

    pub async fn feedback_report(&self, event_id: i64) -> Result<Vec<FeedbackReportRow>> {
        self.get_event(event_id).await?;
        Ok(sqlx::query_as(
            "select p.name, p.email, p.branch, p.year, p.phone, f.response, f.created_at
                from feedback f join participants p on p.id = f.participant
                where f.event = ? order by f.created_at desc",
        )
        .bind(event_id)
        .fetch_all(&self.db)
        .await?)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(e) => e.message().contains("UNIQUE constraint failed"),
        _ => false,
    }
}

fn like_pattern(filters: &ReportFilters) -> Option<String> {
    filters
        .query
        .as_deref()
        .map(|q| format!("%{}%", escape_like(q)))
}

fn push_filter_sql(sql: &mut String, filters: &ReportFilters, has_pattern: bool) {
    if has_pattern {
        sql.push_str(
            " and (p.name like ? escape '\\' or p.email like ? escape '\\'
                or p.branch like ? escape '\\')",
        );
    }
    if filters.branch.is_some() {
        sql.push_str(" and p.branch = ?");
    }
    if filters.year.is_some() {
        sql.push_str(" and p.year = ?");
    }
}

fn bind_filters<'q, O>(
    mut query: sqlx::query::QueryAs<'q, sqlx::Sqlite, O, sqlx::sqlite::SqliteArguments<'q>>,
    filters: &'q ReportFilters,
    pattern: &'q Option<String>,
) -> sqlx::query::QueryAs<'q, sqlx::Sqlite, O, sqlx::sqlite::SqliteArguments<'q>> {
    if let Some(pattern) = pattern {
        query = query.bind(pattern).bind(pattern).bind(pattern);
    }
    if let Some(branch) = &filters.branch {
        query = query.bind(branch);
    }
    if let Some(year) = filters.year {
        query = query.bind(year);
    }
    query
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::EventDb;
    use crate::{event::NewEvent, participant::NewParticipant};

    pub async fn temp_db() -> (EventDb, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = EventDb::open(&dir.path().join("test.db")).await.unwrap();
        (db, dir)
    }

    pub fn participant(n: u32) -> NewParticipant {
        NewParticipant {
            name: format!("Participant {n}"),
            email: format!("participant{n}@example.org"),
            branch: "CSE".to_string(),
            year: 2,
            phone: format!("555{n:04}"),
        }
    }

    pub fn event(start: &str, end: &str, days: i64, max_register: i64) -> NewEvent {
        NewEvent {
            title: "Rust Workshop".to_string(),
            description: "hands-on sessions".to_string(),
            days,
            start_date: start.parse().unwrap(),
            end_date: end.parse().unwrap(),
            venue: "Hall A".to_string(),
            time: "10:00".to_string(),
            max_register,
            is_registration_opened: None,
        }
    }
}
