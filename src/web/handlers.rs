use std::{collections::HashMap, convert::Infallible, str::FromStr, sync::Arc};

use bytes::BufMut;
use chrono::{NaiveDate, Utc};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use warp::{
    http::StatusCode,
    multipart::{FormData, Part},
};

use crate::{
    assets::AssetStore,
    certificate::{self, OverlaySpec, TemplateUpload},
    db::EventDb,
    error::Error,
    event::{self, Event, EventUpdate, NewEvent},
    jobs::{Job, JobDispatcher},
    participant::{self, NewParticipant, Participant, ParticipantUpdate},
    report::ReportFilters,
};

/// A Json struct to store an event/participant ID
#[derive(Serialize, Deserialize, Debug)]
pub struct Id {
    pub id: i64,
}

/// A Json struct to update a participant by ID
#[derive(Deserialize, Debug)]
pub struct UpdateParticipant {
    pub id: i64,
    #[serde(flatten)]
    pub fields: ParticipantUpdate,
}

/// A Json struct to update an event by ID
#[derive(Deserialize, Debug)]
pub struct UpdateEvent {
    pub id: i64,
    #[serde(flatten)]
    pub fields: EventUpdate,
}

/// A Json struct holding an attendance check-in code
#[derive(Deserialize, Debug)]
pub struct MarkRequest {
    pub code: String,
}

/// A Json struct holding a feedback submission
#[derive(Deserialize, Debug)]
pub struct FeedbackRequest {
    pub event: i64,
    pub response: serde_json::Value,
}

/// Query arguments of the attendance report endpoint
#[derive(Deserialize, Debug)]
pub struct ReportQuery {
    pub id: i64,
    pub query: Option<String>,
    pub branch: Option<String>,
    pub year: Option<i64>,
    pub present_on: Option<String>,
    pub sort_by: Option<String>,
}

impl ReportQuery {
    pub fn filters(&self) -> ReportFilters {
        ReportFilters {
            query: self.query.clone(),
            branch: self.branch.clone(),
            year: self.year,
            present_on: self.present_on.clone(),
            sort_by: self.sort_by.clone(),
        }
    }
}

/// Query arguments of the participant listing endpoint
#[derive(Deserialize, Debug)]
pub struct ParticipantQuery {
    pub event: Option<i64>,
    pub query: Option<String>,
    pub branch: Option<String>,
    pub year: Option<i64>,
    pub sort_by: Option<String>,
}

impl ParticipantQuery {
    pub fn filters(&self) -> ReportFilters {
        ReportFilters {
            query: self.query.clone(),
            branch: self.branch.clone(),
            year: self.year,
            present_on: None,
            sort_by: self.sort_by.clone(),
        }
    }
}

/// A participant's marked days for one event
#[derive(Serialize, Debug)]
pub struct AttendanceView {
    pub event: Event,
    pub attendance: Vec<NaiveDate>,
}

fn status_for(e: &Error) -> StatusCode {
    match e {
        Error::EventNotFound(_) | Error::ParticipantNotFound(_) => StatusCode::NOT_FOUND,
        Error::AlreadyRegistered
        | Error::CapacityExceeded
        | Error::AlreadyMarkedToday
        | Error::FeedbackExists
        | Error::EmailTaken
        | Error::CapacityBelowRegistered => StatusCode::CONFLICT,
        Error::AccountRevoked => StatusCode::FORBIDDEN,
        Error::InvalidCode
        | Error::NotRegistered
        | Error::OutsideEventWindow
        | Error::NotAttended
        | Error::TemplateMissing
        | Error::NotEligible => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Validation(_) | Error::BadTemplate(_) | Error::BadFont => StatusCode::BAD_REQUEST,
        Error::AssetRead(_) | Error::Db(_) | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_reply(e: Error) -> warp::reply::WithStatus<String> {
    let code = status_for(&e);
    if code == StatusCode::INTERNAL_SERVER_ERROR {
        log::warn!("{}", e);
    }
    warp::reply::with_status(e.to_string(), code)
}

pub fn to_http_none_or_error(result: Result<(), Error>) -> Result<impl warp::Reply, Infallible> {
    match result {
        Ok(_) => Ok(warp::reply::with_status(
            "Success".to_string(),
            StatusCode::OK,
        )),
        Err(e) => Ok(error_reply(e)),
    }
}

pub fn to_http_output<T: Serialize>(result: Result<T, Error>) -> Result<impl warp::Reply, Infallible> {
    match result {
        Ok(data) => Ok(warp::reply::with_status(
            serde_json::to_string::<T>(&data).unwrap(),
            StatusCode::OK,
        )),
        Err(e) => Ok(error_reply(e)),
    }
}

pub fn to_http_pdf(result: Result<Vec<u8>, Error>) -> Result<Box<dyn warp::Reply>, Infallible> {
    match result {
        Ok(bytes) => Ok(Box::new(
            warp::http::Response::builder()
                .header("Content-Type", "application/pdf")
                .body(bytes)
                .unwrap(),
        )),
        Err(e) => Ok(Box::new(error_reply(e))),
    }
}

// -- participants ---------------------------------------------------------

pub async fn create_participant(
    new: NewParticipant,
    db: Arc<EventDb>,
    jobs: JobDispatcher,
) -> Result<impl warp::Reply, Infallible> {
    let result = async {
        new.validate()?;
        let credential = participant::generate_credential();
        let created = db.add_participant(&new, &credential).await?;
        jobs.enqueue(Job::SendLoginCredential {
            email: created.email.clone(),
            name: created.name.clone(),
            credential,
        });
        Ok::<Participant, Error>(created)
    }
    .await;
    to_http_output(result)
}

pub async fn list_participants(
    args: ParticipantQuery,
    db: Arc<EventDb>,
) -> Result<impl warp::Reply, Infallible> {
    to_http_output(db.list_participants(args.event, &args.filters()).await)
}

// -- events ---------------------------------------------------------------

pub async fn create_event(new: NewEvent, db: Arc<EventDb>) -> Result<impl warp::Reply, Infallible> {
    let result = async {
        new.validate()?;
        db.add_event(&new).await
    }
    .await;
    to_http_output(result)
}

pub async fn events_overview(db: Arc<EventDb>) -> Result<impl warp::Reply, Infallible> {
    let result = async {
        let events = db.list_events().await?;
        Ok(event::group_by_window(events, Utc::now().date_naive()))
    }
    .await;
    to_http_output(result)
}

pub async fn delete_event(
    event: Id,
    db: Arc<EventDb>,
    jobs: JobDispatcher,
) -> Result<impl warp::Reply, Infallible> {
    let result = async {
        // check existence up front so callers get a 404, then hand the
        // cascading cleanup to the background worker
        db.get_event(event.id).await?;
        jobs.enqueue(Job::PurgeEvent { event_id: event.id });
        Ok(())
    }
    .await;
    to_http_none_or_error(result)
}

// -- attendance -----------------------------------------------------------

pub async fn get_attendance(
    participant_id: i64,
    args: Id,
    db: Arc<EventDb>,
) -> Result<impl warp::Reply, Infallible> {
    let result = async {
        let (event, attendance) = db.attendance_for(participant_id, args.id).await?;
        Ok(AttendanceView { event, attendance })
    }
    .await;
    to_http_output(result)
}

// -- certificates ---------------------------------------------------------

/// One decoded part of a multipart upload.
pub struct UploadField {
    pub name: String,
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

pub async fn read_multipart(form: FormData) -> Result<Vec<UploadField>, Error> {
    let parts: Vec<Part> = form
        .try_collect()
        .await
        .map_err(|e| Error::Validation(format!("invalid multipart request: {e}")))?;

    let mut fields = Vec::with_capacity(parts.len());
    for part in parts {
        let name = part.name().to_string();
        let filename = part.filename().map(str::to_string);
        let bytes = part
            .stream()
            .try_fold(Vec::new(), |mut vec, data| {
                vec.put(data);
                async move { Ok(vec) }
            })
            .await
            .map_err(|e| Error::Validation(format!("invalid multipart request: {e}")))?;
        fields.push(UploadField {
            name,
            filename,
            bytes,
        });
    }
    Ok(fields)
}

/// A decoded certificate multipart form: the template pair, the overlay
/// geometry and, for previews, the name to draw.
pub struct CertificateForm {
    pub upload: TemplateUpload,
    pub name: Option<String>,
}

pub fn parse_certificate_form(fields: Vec<UploadField>) -> Result<CertificateForm, Error> {
    let mut pdf = None;
    let mut font = None;
    let mut text = HashMap::new();
    for field in fields {
        match (field.name.as_str(), field.filename) {
            ("template", Some(filename)) => pdf = Some((filename, field.bytes)),
            ("font", Some(filename)) => font = Some((filename, field.bytes)),
            (name, _) => {
                let value = String::from_utf8(field.bytes)
                    .map_err(|_| Error::Validation(format!("field '{name}' is not text")))?;
                text.insert(name.to_string(), value);
            }
        }
    }
    let (pdf_name, pdf_bytes) =
        pdf.ok_or_else(|| Error::Validation("missing 'template' file".to_string()))?;
    let (font_name, font_bytes) =
        font.ok_or_else(|| Error::Validation("missing 'font' file".to_string()))?;
    let spec = OverlaySpec {
        x: text_field(&text, "x")?,
        y: text_field(&text, "y")?,
        size: text_field(&text, "size")?,
        color: [
            text_field(&text, "red")?,
            text_field(&text, "green")?,
            text_field(&text, "blue")?,
        ],
    };
    Ok(CertificateForm {
        upload: TemplateUpload {
            pdf_name,
            pdf_bytes,
            font_name,
            font_bytes,
            spec,
        },
        name: text.get("name").cloned(),
    })
}

fn text_field<T: FromStr>(fields: &HashMap<String, String>, name: &str) -> Result<T, Error> {
    fields
        .get(name)
        .ok_or_else(|| Error::Validation(format!("missing field '{name}'")))?
        .trim()
        .parse()
        .map_err(|_| Error::Validation(format!("invalid value for field '{name}'")))
}

pub async fn set_certificate_template(
    event_id: i64,
    form: FormData,
    db: Arc<EventDb>,
    assets: AssetStore,
) -> Result<impl warp::Reply, Infallible> {
    let result = async {
        let form = parse_certificate_form(read_multipart(form).await?)?;
        certificate::set_template(&db, &assets, event_id, form.upload).await
    }
    .await;
    to_http_none_or_error(result)
}

pub async fn preview_certificate(form: FormData) -> Result<Box<dyn warp::Reply>, Infallible> {
    let result = async {
        let form = parse_certificate_form(read_multipart(form).await?)?;
        let name = form.name.as_deref().unwrap_or("Sample Name");
        certificate::preview(
            &form.upload.pdf_bytes,
            &form.upload.font_bytes,
            &form.upload.spec,
            name,
        )
    }
    .await;
    to_http_pdf(result)
}

pub async fn render_certificate(
    participant_id: i64,
    args: Id,
    db: Arc<EventDb>,
    assets: AssetStore,
) -> Result<Box<dyn warp::Reply>, Infallible> {
    to_http_pdf(certificate::render(&db, &assets, args.id, participant_id).await)
}
