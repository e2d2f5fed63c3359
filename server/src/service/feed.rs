//! Assembles the beneficiary feed from the blogs of followed accounts.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, TimeDelta, Utc};
use futures_util::{
    stream::{self, Stream},
    StreamExt,
};
use serde::{Serialize, Serializer};
use tracing::{error, info, warn};

use super::{
    hive::Hive,
    post::{Post, PostId},
};
use crate::{Config, Error, Result};

/// Decides which posts belong in the feed.
#[derive(Clone, Debug)]
pub struct FeedFilter {
    beneficiary: String,
    cutoff: DateTime<Utc>,
}

impl FeedFilter {
    pub fn new(beneficiary: impl Into<String>, max_age_days: u32, now: DateTime<Utc>) -> Self {
        let cutoff = now
            .checked_sub_signed(TimeDelta::days(max_age_days.into()))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        Self {
            beneficiary: beneficiary.into(),
            cutoff,
        }
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    /// Recent enough and shares rewards with the beneficiary. Undated posts
    /// never match.
    pub fn matches(&self, post: &Post) -> bool {
        post.created_at().is_some_and(|created| created >= self.cutoff)
            && post.has_beneficiary(&self.beneficiary)
    }
}

struct Aggregation {
    hive: Hive,
    accounts: std::vec::IntoIter<String>,
    filter: FeedFilter,
    posts_per_account: u32,
    seen: HashSet<PostId>,
    pending: VecDeque<Post>,
}

impl Aggregation {
    async fn scan(&mut self, account: &str) {
        let posts = match self.hive.get_blog(account, self.posts_per_account).await {
            Ok(posts) => posts,
            Err(e) => {
                warn!("Skipping {}, could not fetch their posts: {}", account, e);
                return;
            }
        };

        for post in posts {
            if self.seen.contains(&post.id()) || !self.filter.matches(&post) {
                continue;
            }

            self.seen.insert(post.id());
            self.pending.push_back(post);
        }
    }
}

/// Lazily scans the blogs of `accounts`, one account at a time, yielding
/// each matching post the first time it is seen.
///
/// Posts come out in discovery order. A failed account is logged and
/// skipped. Dropping the stream stops the scan.
pub fn aggregate(
    hive: Hive,
    accounts: Vec<String>,
    filter: FeedFilter,
    posts_per_account: u32,
) -> impl Stream<Item = Post> + Send + 'static {
    let state = Aggregation {
        hive,
        accounts: accounts.into_iter(),
        filter,
        posts_per_account,
        seen: HashSet::new(),
        pending: VecDeque::new(),
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(post) = state.pending.pop_front() {
                return Some((post, state));
            }

            let account = state.accounts.next()?;
            state.scan(&account).await;
        }
    })
}

/// One message of the streamed feed.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedEvent {
    Post(Box<Post>),
    Done {
        total_posts: usize,
        error: Option<String>,
    },
}

impl FeedEvent {
    pub fn done(total_posts: usize) -> Self {
        Self::Done {
            total_posts,
            error: None,
        }
    }

    pub fn failed(error: &Error) -> Self {
        Self::Done {
            total_posts: 0,
            error: Some(error.to_string()),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent<'a> {
    done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    post: Option<&'a Post>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_posts: Option<usize>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

impl Serialize for FeedEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            Self::Post(post) => WireEvent {
                done: false,
                post: Some(post),
                total_posts: None,
                error: false,
                message: None,
            },
            Self::Done { total_posts, error } => WireEvent {
                done: true,
                post: None,
                total_posts: Some(*total_posts),
                error: error.is_some(),
                message: error.as_deref(),
            },
        };

        wire.serialize(serializer)
    }
}

/// Builds feeds for one configured reference account and beneficiary.
#[derive(Clone)]
pub struct FeedService {
    hive: Hive,
    reference_account: String,
    beneficiary: String,
    max_post_age_days: u32,
    posts_per_account: u32,
    following_limit: u32,
}

impl FeedService {
    pub fn new(hive: Hive, config: &Config) -> Self {
        Self {
            hive,
            reference_account: config.reference_account.clone(),
            beneficiary: config.beneficiary.clone(),
            max_post_age_days: config.max_post_age_days,
            posts_per_account: config.posts_per_account,
            following_limit: config.following_limit,
        }
    }

    /// Accounts followed by the reference account. An unreachable API or an
    /// empty list is reported as [`Error::NoFollowingData`].
    pub async fn resolve_following(&self) -> Result<Vec<String>> {
        let no_data = || Error::NoFollowingData {
            account: self.reference_account.clone(),
        };

        let entries = self
            .hive
            .get_following(&self.reference_account, self.following_limit)
            .await
            .map_err(|e| {
                error!(
                    "Could not fetch the following list of {}: {}",
                    self.reference_account, e
                );
                no_data()
            })?;

        if entries.is_empty() {
            error!("{} follows no accounts", self.reference_account);
            return Err(no_data());
        }

        info!(
            "{} follows {} accounts",
            self.reference_account,
            entries.len()
        );

        Ok(entries.into_iter().map(|entry| entry.following).collect())
    }

    pub fn filter(&self, now: DateTime<Utc>) -> FeedFilter {
        FeedFilter::new(self.beneficiary.clone(), self.max_post_age_days, now)
    }

    pub fn posts(
        &self,
        accounts: Vec<String>,
        now: DateTime<Utc>,
    ) -> impl Stream<Item = Post> + Send + 'static {
        aggregate(
            self.hive.clone(),
            accounts,
            self.filter(now),
            self.posts_per_account,
        )
    }

    /// The whole feed, newest first.
    pub async fn collect(&self) -> Result<Vec<Post>> {
        let now = Utc::now();
        let accounts = self.resolve_following().await?;

        let mut posts: Vec<Post> = self.posts(accounts, now).collect().await;
        posts.sort_by_key(|post| std::cmp::Reverse(post.created_at()));

        info!(
            "Collected {} posts with {} as beneficiary",
            posts.len(),
            self.beneficiary
        );

        Ok(posts)
    }

    /// The feed as events in discovery order, always ending with exactly one
    /// [`FeedEvent::Done`].
    pub fn events(&self) -> impl Stream<Item = FeedEvent> + Send + 'static {
        let feed = self.clone();

        stream::once(async move {
            let now = Utc::now();
            match feed.resolve_following().await {
                Ok(accounts) => feed.tally(feed.posts(accounts, now)).left_stream(),
                Err(e) => stream::iter([FeedEvent::failed(&e)]).right_stream(),
            }
        })
        .flatten()
    }

    fn tally(
        &self,
        posts: impl Stream<Item = Post> + Send + 'static,
    ) -> impl Stream<Item = FeedEvent> + Send + 'static {
        let beneficiary = self.beneficiary.clone();
        let mut total_posts = 0;

        posts
            .map(Some)
            .chain(stream::once(async { None }))
            .map(move |post| match post {
                Some(post) => {
                    total_posts += 1;
                    FeedEvent::Post(Box::new(post))
                }
                None => {
                    info!(
                        "Streamed {} posts with {} as beneficiary",
                        total_posts, beneficiary
                    );
                    FeedEvent::done(total_posts)
                }
            })
    }
}
