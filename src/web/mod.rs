use std::{convert::Infallible, sync::Arc};

use warp::{http::Method, reject::Rejection, Filter};

use crate::{assets::AssetStore, db::EventDb, jobs::JobDispatcher, settings::Settings};

use filters::api_filters;

pub mod filters;
pub mod handlers;

async fn handle_rejection(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (code, msg) = if let Some(err) = err.find::<warp::filters::body::BodyDeserializeError>() {
        log::error!("{}", err);
        (warp::http::StatusCode::BAD_REQUEST, err.to_string())
    } else if let Some(err) = err.find::<warp::reject::MissingHeader>() {
        log::error!("Missing Header: {}", err);
        (warp::http::StatusCode::UNAUTHORIZED, err.to_string())
    } else if let Some(err) = err.find::<warp::reject::InvalidHeader>() {
        log::error!("Invalid Header: {}", err);
        (warp::http::StatusCode::UNAUTHORIZED, err.to_string())
    } else if let Some(err) = err.find::<warp::reject::MethodNotAllowed>() {
        log::error!("Method Not Allowed: {}", err);
        (warp::http::StatusCode::METHOD_NOT_ALLOWED, err.to_string())
    } else if let Some(err) = err.find::<warp::reject::InvalidQuery>() {
        log::error!("Invalid Query: {}", err);
        (warp::http::StatusCode::BAD_REQUEST, err.to_string())
    } else if let Some(err) = err.find::<warp::reject::PayloadTooLarge>() {
        log::error!("Payload Too Large: {}", err);
        (warp::http::StatusCode::PAYLOAD_TOO_LARGE, err.to_string())
    } else {
        log::error!("Unhandled Rejection: {:?}", err);
        (
            warp::http::StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error".to_string(),
        )
    };

    Ok(warp::reply::with_status(warp::reply::json(&msg), code))
}

pub async fn run_http_server(
    db: Arc<EventDb>,
    assets: AssetStore,
    jobs: JobDispatcher,
    settings: &Settings,
) -> anyhow::Result<()> {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec![
            "User-Agent",
            "Sec-Fetch-Mode",
            "Referer",
            "Origin",
            "Content-Type",
            "Access-Control-Allow-Origin",
            "Access-Control-Request-Method",
            "Access-Control-Request-Headers",
            "Access-Control-Allow-Headers",
            "X-Participant-Id",
        ])
        .allow_methods(&[
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]);

    let routes = api_filters(db, assets, jobs).recover(handle_rejection);

    warp::serve(routes.with(cors))
        .run(([0, 0, 0, 0], settings.web_port.unwrap_or(28010)))
        .await;

    Ok(())
}
