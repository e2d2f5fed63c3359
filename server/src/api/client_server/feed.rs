use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{Query, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures_util::StreamExt;
use serde::Deserialize;
use tracing::warn;

use crate::{FeedMode, Services};

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    /// Overrides the configured `feed_mode`.
    pub mode: Option<FeedMode>,
}

/// # `GET /api/feed`
///
/// Recent posts from the accounts the reference account follows that pay the
/// beneficiary.
///
/// - `stream` mode: server-sent events, one `{"done": false, "post": ...}` per
///   post as it is found, then `{"done": true, "totalPosts": n}`. Failures are
///   reported in the last event, the status is always 200.
/// - `bulk` mode: one JSON array, newest first, or an error status.
pub async fn feed_route(
    State(services): State<Arc<Services>>,
    Query(query): Query<FeedQuery>,
) -> Response {
    match query.mode.unwrap_or(services.config.feed_mode) {
        FeedMode::Stream => stream_feed(&services).into_response(),
        FeedMode::Bulk => services
            .feed
            .collect()
            .await
            .map(Json)
            .into_response(),
    }
}

fn stream_feed(services: &Services) -> impl IntoResponse {
    let events = services.feed.events().map(|event| {
        let sse = Event::default().json_data(&event).unwrap_or_else(|e| {
            warn!("Could not encode feed event: {}", e);
            Event::default().comment("unencodable event")
        });

        Ok::<_, Infallible>(sse)
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
