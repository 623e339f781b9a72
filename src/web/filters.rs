use std::{convert::Infallible, sync::Arc};

use warp::{reject::Rejection, Filter};

use crate::{
    assets::AssetStore,
    db::EventDb,
    jobs::JobDispatcher,
    web::handlers::{
        create_event, create_participant, delete_event, events_overview, get_attendance,
        list_participants, preview_certificate, render_certificate, set_certificate_template,
        to_http_none_or_error, to_http_output, FeedbackRequest, Id, MarkRequest, ParticipantQuery,
        ReportQuery, UpdateEvent, UpdateParticipant,
    },
};

/// Header carrying the authenticated participant's ID, filled in by the
/// fronting auth proxy.
const PARTICIPANT_HEADER: &str = "x-participant-id";

const MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

pub fn with_db(
    db: Arc<EventDb>,
) -> impl Filter<Extract = (Arc<EventDb>,), Error = Infallible> + Clone {
    warp::any().map(move || db.clone())
}

pub fn with_assets(
    assets: AssetStore,
) -> impl Filter<Extract = (AssetStore,), Error = Infallible> + Clone {
    warp::any().map(move || assets.clone())
}

pub fn with_jobs(
    jobs: JobDispatcher,
) -> impl Filter<Extract = (JobDispatcher,), Error = Infallible> + Clone {
    warp::any().map(move || jobs.clone())
}

fn identity() -> impl Filter<Extract = (i64,), Error = Rejection> + Clone {
    warp::header::<i64>(PARTICIPANT_HEADER)
}

fn participant_filters(
    db: Arc<EventDb>,
    jobs: JobDispatcher,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Rejection> + Clone {
    let create_participant = warp::path!("participant")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_db(db.clone()))
        .and(with_jobs(jobs))
        .and_then(create_participant);

    let read_participants = warp::path!("participant")
        .and(warp::get())
        .and(warp::query::<ParticipantQuery>())
        .and(with_db(db.clone()))
        .and_then(list_participants);

    let read_overview = warp::path!("participant" / "overview")
        .and(warp::get())
        .and(identity())
        .and(with_db(db.clone()))
        .and_then(async |id: i64, db: Arc<EventDb>| {
            to_http_output(db.participant_overview(id).await)
        });

    let update_participant = warp::path!("participant")
        .and(warp::put())
        .and(warp::body::json())
        .and(with_db(db.clone()))
        .and_then(async |update: UpdateParticipant, db: Arc<EventDb>| {
            to_http_output(db.update_participant(update.id, &update.fields).await)
        });

    let revoke_participant = warp::path!("participant" / "revoke")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_db(db.clone()))
        .and_then(async |participant: Id, db: Arc<EventDb>| {
            to_http_output(db.toggle_revoked(participant.id).await)
        });

    let delete_participant = warp::path!("participant")
        .and(warp::delete())
        .and(warp::body::json())
        .and(with_db(db))
        .and_then(async |participant: Id, db: Arc<EventDb>| {
            to_http_none_or_error(db.delete_participant(participant.id).await)
        });

    create_participant
        .or(read_participants)
        .or(read_overview)
        .or(update_participant)
        .or(revoke_participant)
        .or(delete_participant)
}

fn event_filters(
    db: Arc<EventDb>,
    jobs: JobDispatcher,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Rejection> + Clone {
    let create_event = warp::path!("event")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_db(db.clone()))
        .and_then(create_event);

    let read_event = warp::path!("event")
        .and(warp::get())
        .and(warp::query::<Id>())
        .and(with_db(db.clone()))
        .and_then(async |event: Id, db: Arc<EventDb>| to_http_output(db.get_event(event.id).await));

    let read_overview = warp::path!("events")
        .and(warp::get())
        .and(with_db(db.clone()))
        .and_then(events_overview);

    let update_event = warp::path!("event")
        .and(warp::put())
        .and(warp::body::json())
        .and(with_db(db.clone()))
        .and_then(async |update: UpdateEvent, db: Arc<EventDb>| {
            to_http_output(db.update_event(update.id, &update.fields).await)
        });

    let rotate_code = warp::path!("event" / "code")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_db(db.clone()))
        .and_then(async |event: Id, db: Arc<EventDb>| {
            to_http_output(db.rotate_code(event.id).await)
        });

    let toggle_registration = warp::path!("event" / "registration")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_db(db.clone()))
        .and_then(async |event: Id, db: Arc<EventDb>| {
            to_http_output(db.toggle_registration_open(event.id).await)
        });

    let delete_event = warp::path!("event")
        .and(warp::delete())
        .and(warp::body::json())
        .and(with_db(db))
        .and(with_jobs(jobs))
        .and_then(delete_event);

    create_event
        .or(read_event)
        .or(read_overview)
        .or(update_event)
        .or(rotate_code)
        .or(toggle_registration)
        .or(delete_event)
}

fn attendance_filters(
    db: Arc<EventDb>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Rejection> + Clone {
    let register = warp::path!("event" / "register")
        .and(warp::post())
        .and(identity())
        .and(warp::body::json())
        .and(with_db(db.clone()))
        .and_then(async |participant: i64, event: Id, db: Arc<EventDb>| {
            to_http_output(db.register_for_event(participant, event.id).await)
        });

    let mark = warp::path!("event" / "attendance")
        .and(warp::post())
        .and(identity())
        .and(warp::body::json())
        .and(with_db(db.clone()))
        .and_then(async |participant: i64, mark: MarkRequest, db: Arc<EventDb>| {
            to_http_output(db.mark_attendance(&mark.code, participant).await)
        });

    let read = warp::path!("event" / "attendance")
        .and(warp::get())
        .and(identity())
        .and(warp::query::<Id>())
        .and(with_db(db))
        .and_then(get_attendance);

    register.or(mark).or(read)
}

fn report_filters(
    db: Arc<EventDb>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Rejection> + Clone {
    let report = warp::path!("event" / "report")
        .and(warp::get())
        .and(warp::query::<ReportQuery>())
        .and(with_db(db.clone()))
        .and_then(async |args: ReportQuery, db: Arc<EventDb>| {
            to_http_output(db.attendance_report(args.id, &args.filters()).await)
        });

    let stats = warp::path!("event" / "stats")
        .and(warp::get())
        .and(warp::query::<Id>())
        .and(with_db(db.clone()))
        .and_then(async |event: Id, db: Arc<EventDb>| {
            to_http_output(db.attendance_stats(event.id).await)
        });

    let feedback_report = warp::path!("event" / "feedback")
        .and(warp::get())
        .and(warp::query::<Id>())
        .and(with_db(db))
        .and_then(async |event: Id, db: Arc<EventDb>| {
            to_http_output(db.feedback_report(event.id).await)
        });

    report.or(stats).or(feedback_report)
}

fn feedback_filters(
    db: Arc<EventDb>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Rejection> + Clone {
    warp::path!("feedback")
        .and(warp::post())
        .and(identity())
        .and(warp::body::json())
        .and(with_db(db))
        .and_then(
            async |participant: i64, feedback: FeedbackRequest, db: Arc<EventDb>| {
                to_http_output(
                    db.submit_feedback(participant, feedback.event, &feedback.response)
                        .await,
                )
            },
        )
}

fn certificate_filters(
    db: Arc<EventDb>,
    assets: AssetStore,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Rejection> + Clone {
    let set_template = warp::path!("certificate" / "template" / i64)
        .and(warp::post())
        .and(warp::multipart::form().max_length(MAX_UPLOAD_BYTES))
        .and(with_db(db.clone()))
        .and(with_assets(assets.clone()))
        .and_then(set_certificate_template);

    let preview = warp::path!("certificate" / "preview")
        .and(warp::post())
        .and(warp::multipart::form().max_length(MAX_UPLOAD_BYTES))
        .and_then(preview_certificate);

    let render = warp::path!("certificate")
        .and(warp::get())
        .and(identity())
        .and(warp::query::<Id>())
        .and(with_db(db))
        .and(with_assets(assets))
        .and_then(render_certificate);

    set_template.or(preview).or(render)
}

pub fn api_filters(
    db: Arc<EventDb>,
    assets: AssetStore,
    jobs: JobDispatcher,
) -> impl Filter<Extract = (impl warp::Reply,), Error = Rejection> + Clone {
    participant_filters(db.clone(), jobs.clone())
        .or(event_filters(db.clone(), jobs))
        .or(attendance_filters(db.clone()))
        .or(report_filters(db.clone()))
        .or(feedback_filters(db.clone()))
        .or(certificate_filters(db, assets))
}
