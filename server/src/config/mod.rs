use std::{
    fmt,
    net::{IpAddr, Ipv4Addr},
    path::Path,
    time::Duration,
};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use url::Url;

use crate::{Error, Result};

/// Upstream refuses `get_following` pages larger than this.
const MAX_FOLLOWING_LIMIT: u32 = 1000;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_address")]
    pub address: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,

    /// Account whose following list decides which blogs are scanned.
    #[serde(default = "default_account")]
    pub reference_account: String,
    /// Only posts sharing rewards with this account are shown.
    #[serde(default = "default_account")]
    pub beneficiary: String,
    #[serde(default = "default_max_post_age_days")]
    pub max_post_age_days: u32,
    #[serde(default = "default_posts_per_account")]
    pub posts_per_account: u32,
    #[serde(default = "default_following_limit")]
    pub following_limit: u32,

    /// Tried in order for every call.
    #[serde(default = "default_api_nodes")]
    pub api_nodes: Vec<Url>,
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    #[serde(default)]
    pub feed_mode: FeedMode,

    #[serde(default = "default_log")]
    pub log: String,
}

/// How `/api/feed` delivers posts.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
    /// Server-sent events, one per post as it is found.
    #[default]
    Stream,
    /// A single JSON array, newest first.
    Bulk,
}

impl Config {
    /// Reads `[global]` from the TOML file at `path` (if any), then applies
    /// `TAPINTU_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path).nested());
        }

        figment
            .merge(Env::prefixed("TAPINTU_").ignore(&["CONFIG"]).global())
            .extract()
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_nodes.is_empty() {
            return Err(Error::BadConfig("At least one API node must be configured."));
        }

        if self.reference_account.is_empty() || self.beneficiary.is_empty() {
            return Err(Error::BadConfig(
                "reference_account and beneficiary must not be empty.",
            ));
        }

        if self.posts_per_account == 0 || self.following_limit == 0 {
            return Err(Error::BadConfig(
                "posts_per_account and following_limit must be positive.",
            ));
        }

        if self.following_limit > MAX_FOLLOWING_LIMIT {
            return Err(Error::BadConfig(
                "following_limit exceeds the 1000 accounts an API node returns per page.",
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            reference_account: default_account(),
            beneficiary: default_account(),
            max_post_age_days: default_max_post_age_days(),
            posts_per_account: default_posts_per_account(),
            following_limit: default_following_limit(),
            api_nodes: default_api_nodes(),
            request_timeout: default_request_timeout(),
            feed_mode: FeedMode::default(),
            log: default_log(),
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes = self
            .api_nodes
            .iter()
            .map(Url::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        let lines = [
            ("Address", format!("{}:{}", self.address, self.port)),
            ("Reference account", self.reference_account.clone()),
            ("Beneficiary", self.beneficiary.clone()),
            ("Maximum post age", format!("{} days", self.max_post_age_days)),
            ("Posts per account", self.posts_per_account.to_string()),
            ("Following limit", self.following_limit.to_string()),
            ("API nodes", nodes),
            ("Request timeout", format!("{:?}", self.request_timeout)),
            ("Feed mode", format!("{:?}", self.feed_mode)),
        ];

        let mut msg = "Active config values:\n\n".to_owned();
        for (name, value) in lines {
            msg += &format!("{name}: {value}\n");
        }

        write!(f, "{msg}")
    }
}

fn default_address() -> IpAddr {
    Ipv4Addr::LOCALHOST.into()
}

fn default_port() -> u16 {
    3000
}

fn default_account() -> String {
    "commentrewarder".to_owned()
}

fn default_max_post_age_days() -> u32 {
    7
}

fn default_posts_per_account() -> u32 {
    20
}

fn default_following_limit() -> u32 {
    100
}

fn default_api_nodes() -> Vec<Url> {
    ["https://api.hive.blog", "https://api.syncad.com"]
        .into_iter()
        .filter_map(|node| Url::parse(node).ok())
        .collect()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_log() -> String {
    "tapintu=info,tower_http=info,warn".to_owned()
}
