use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use super::{post::Post, upstream::Upstream};
use crate::{Error, Result};

pub const GET_FOLLOWING: &str = "condenser_api.get_following";
pub const GET_BLOG: &str = "condenser_api.get_blog";
pub const GET_CONTENT: &str = "condenser_api.get_content";

#[derive(Clone, Debug, Deserialize)]
pub struct FollowingEntry {
    #[serde(default)]
    pub follower: String,
    pub following: String,
    #[serde(default)]
    pub what: Vec<String>,
}

/// The `condenser_api` methods the feed needs.
#[derive(Clone)]
pub struct Hive {
    upstream: Upstream,
}

impl Hive {
    pub fn new(upstream: Upstream) -> Self {
        Self { upstream }
    }

    /// First page of the accounts `account` follows, in upstream order.
    pub async fn get_following(&self, account: &str, limit: u32) -> Result<Vec<FollowingEntry>> {
        let result = self
            .upstream
            .call(GET_FOLLOWING, json!([account, null, "blog", limit]))
            .await?;

        if result.is_null() {
            return Ok(Vec::new());
        }

        serde_json::from_value(result)
            .map_err(|_| Error::BadServerResponse("Following list has an unexpected shape."))
    }

    /// Up to `limit` of the most recent blog entries of `account`, reblogs
    /// included. Entries without a parseable post are skipped.
    pub async fn get_blog(&self, account: &str, limit: u32) -> Result<Vec<Post>> {
        let result = self
            .upstream
            .call(
                GET_BLOG,
                json!({
                    "account": account,
                    "start_entry_id": 0,
                    "limit": limit,
                    "observer": "",
                }),
            )
            .await?;

        let entries = match result {
            Value::Array(entries) => entries,
            Value::Null => return Ok(Vec::new()),
            _ => return Err(Error::BadServerResponse("Blog entries are not a list.")),
        };

        Ok(entries
            .into_iter()
            .filter_map(|mut entry| match entry.get_mut("comment").map(Value::take) {
                None | Some(Value::Null) => None,
                Some(comment) => serde_json::from_value::<Post>(comment)
                    .inspect_err(|e| warn!("Skipping unreadable post in {}'s blog: {}", account, e))
                    .ok(),
            })
            .collect())
    }

    pub async fn get_content(&self, author: &str, permlink: &str) -> Result<Post> {
        let result = self
            .upstream
            .call(GET_CONTENT, json!([author, permlink]))
            .await?;

        let post: Post = serde_json::from_value(result)
            .map_err(|_| Error::BadServerResponse("Post has an unexpected shape."))?;

        // Unknown posts come back as an empty record.
        if post.author.is_empty() {
            return Err(Error::NotFound("Post not found"));
        }

        Ok(post)
    }
}
