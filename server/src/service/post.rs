use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::utils::parse_timestamp;

/// A Hive post as returned by `condenser_api`.
///
/// Fields the feed does not look at are kept in `extra` and sent on to the
/// client unchanged.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Post {
    pub author: String,
    pub permlink: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub category: String,
    /// Upstream creation time, e.g. `2024-05-01T12:34:56` (UTC).
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub children: u32,
    #[serde(default, deserialize_with = "lenient_beneficiaries")]
    pub beneficiaries: Vec<Beneficiary>,
    #[serde(default)]
    pub pending_payout_value: String,
    #[serde(default)]
    pub total_payout_value: String,
    #[serde(default)]
    pub curator_payout_value: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Beneficiary {
    pub account: String,
    /// Basis points, 10000 is the whole reward.
    pub weight: u16,
}

/// Globally unique identity of a post.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PostId {
    pub author: String,
    pub permlink: String,
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.author, self.permlink)
    }
}

impl Post {
    pub fn id(&self) -> PostId {
        PostId {
            author: self.author.clone(),
            permlink: self.permlink.clone(),
        }
    }

    /// `None` when the upstream timestamp can't be parsed.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created)
    }

    pub fn has_beneficiary(&self, account: &str) -> bool {
        self.beneficiaries.iter().any(|b| b.account == account)
    }
}

/// Anything but an array counts as no beneficiaries; malformed entries are
/// dropped individually.
fn lenient_beneficiaries<'de, D>(deserializer: D) -> Result<Vec<Beneficiary>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Value::deserialize(deserializer)? {
        Value::Array(entries) => entries,
        _ => return Ok(Vec::new()),
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}
