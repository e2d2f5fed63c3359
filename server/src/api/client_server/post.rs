use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::error;

use crate::{service::post::Post, Error, Result, Services};

/// # `GET /api/post/{author}/{permlink}`
///
/// A single post, unfiltered.
pub async fn get_post_route(
    State(services): State<Arc<Services>>,
    Path((author, permlink)): Path<(String, String)>,
) -> Result<Json<Post>> {
    services
        .hive
        .get_content(&author, &permlink)
        .await
        .map(Json)
        .map_err(|e| match e {
            Error::NotFound(_) => e,
            e => {
                error!("Could not fetch {}/{}: {}", author, permlink, e);
                Error::BadServerResponse("Failed to fetch post")
            }
        })
}
