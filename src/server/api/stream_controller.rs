use axum::{
    Extension, Router,
    extract::{Path, Query, rejection::QueryRejection},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use tracing::debug;

use crate::{
    config::LiveMode,
    server::{
        error::{AppResult, Error},
        models::{ContentKind, PlaybackRequest},
        services::AppServices,
        utils::header_utils::range_header,
    },
};

#[derive(Deserialize)]
struct MovieQuery {
    ext: Option<String>,
}

#[derive(Deserialize)]
struct SegmentQuery {
    url: Option<String>,
}

pub struct StreamController;

impl StreamController {
    pub fn app() -> Router {
        // static segments win over {id} so live-segment never reaches the movie handler
        Router::new()
            .route("/live-segment", get(Self::live_segment))
            .route("/live/{id}", get(Self::live))
            .route("/series/{id}/{ext}", get(Self::series))
            .route("/{id}", get(Self::movie))
    }

    async fn movie(
        Extension(services): Extension<AppServices>,
        Path(id): Path<String>,
        query: Result<Query<MovieQuery>, QueryRejection>,
        headers: HeaderMap,
    ) -> AppResult<Response> {
        let Query(query) = query.map_err(Self::bad_query)?;
        let request = PlaybackRequest::new(ContentKind::Movie, id)
            .with_extension(query.ext)
            .with_range(range_header(&headers));

        Self::relay(&services, request).await
    }

    async fn series(
        Extension(services): Extension<AppServices>,
        Path((id, ext)): Path<(String, String)>,
        headers: HeaderMap,
    ) -> AppResult<Response> {
        let request = PlaybackRequest::new(ContentKind::Series, id)
            .with_extension(Some(ext))
            .with_range(range_header(&headers));

        Self::relay(&services, request).await
    }

    async fn live(
        Extension(services): Extension<AppServices>,
        Path(id): Path<String>,
        headers: HeaderMap,
    ) -> AppResult<Response> {
        let request =
            PlaybackRequest::new(ContentKind::Live, id).with_range(range_header(&headers));

        match services.config.live_mode {
            LiveMode::Redirect => {
                let target = services.locator.locate(&request)?;
                debug!("Redirecting live channel {}", request.id);
                Ok(Redirect::temporary(target.url.as_str()).into_response())
            }
            LiveMode::Relay => Self::relay(&services, request).await,
        }
    }

    async fn live_segment(
        Extension(services): Extension<AppServices>,
        query: Result<Query<SegmentQuery>, QueryRejection>,
        headers: HeaderMap,
    ) -> AppResult<Response> {
        let Query(query) = query.map_err(Self::bad_query)?;
        let url = query
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| Error::BadRequest("Missing url parameter".to_string()))?;

        let request =
            PlaybackRequest::new(ContentKind::Segment, url).with_range(range_header(&headers));

        Self::relay(&services, request).await
    }

    // axum's own rejection is plain text, ours is the json envelope
    fn bad_query(rejection: QueryRejection) -> Error {
        debug!("Rejected query string: {}", rejection.body_text());
        Error::BadRequest("Invalid query string".to_string())
    }

    // every variant funnels through here so header policy and cancellation stay in one place
    async fn relay(services: &AppServices, request: PlaybackRequest) -> AppResult<Response> {
        let target = services.locator.locate(&request)?;
        services.relay.relay(&target, request.range).await
    }
}
