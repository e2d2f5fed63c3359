//! An in-memory Hive API node for driving the feed without a network.

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use serde_json::{json, Value};
use tapintu::{
    service::{
        hive::{GET_BLOG, GET_CONTENT, GET_FOLLOWING},
        upstream::{RpcError, RpcRequest, RpcResponse, Transport},
    },
    Config, Error, Result, Services,
};
use url::Url;

pub const NODE_A: &str = "https://a.example/";
pub const NODE_B: &str = "https://b.example/";

/// Hive timestamp `days` days before now.
pub fn days_ago(days: i64) -> String {
    (Utc::now() - TimeDelta::days(days))
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

pub fn post(author: &str, permlink: &str, created: &str, beneficiaries: &[&str]) -> Value {
    let beneficiaries: Vec<Value> = beneficiaries
        .iter()
        .map(|account| json!({ "account": account, "weight": 500 }))
        .collect();

    json!({
        "author": author,
        "permlink": permlink,
        "title": format!("{permlink} by {author}"),
        "body": "Hello **Hive**",
        "category": "hive",
        "created": created,
        "children": 2,
        "beneficiaries": beneficiaries,
        "pending_payout_value": "1.234 HBD",
        "total_payout_value": "0.000 HBD",
        "curator_payout_value": "0.000 HBD",
        "json_metadata": "{\"tags\":[\"hive\"]}",
    })
}

pub fn blog_entry(post: Value) -> Value {
    json!({ "blog": post["author"].clone(), "entry_id": 0, "comment": post })
}

#[derive(Default)]
pub struct FakeHive {
    /// `None` makes every node fail the following list.
    pub following: Option<Vec<String>>,
    /// Accounts missing here fail their blog fetch.
    pub blogs: HashMap<String, Vec<Value>>,
    pub content: HashMap<(String, String), Value>,
    /// Nodes that time out on every call.
    pub down: HashSet<String>,
    /// Nodes that answer every call with a JSON-RPC error.
    pub rejecting: HashSet<String>,
    pub calls: Mutex<Vec<(String, &'static str)>>,
}

impl FakeHive {
    pub fn following(mut self, accounts: &[&str]) -> Self {
        self.following = Some(accounts.iter().map(|a| (*a).to_owned()).collect());
        self
    }

    pub fn blog(mut self, account: &str, posts: Vec<Value>) -> Self {
        self.blogs
            .insert(account.to_owned(), posts.into_iter().map(blog_entry).collect());
        self
    }

    pub fn raw_blog(mut self, account: &str, entries: Vec<Value>) -> Self {
        self.blogs.insert(account.to_owned(), entries);
        self
    }

    pub fn content(mut self, post: Value) -> Self {
        let key = (
            post["author"].as_str().unwrap_or_default().to_owned(),
            post["permlink"].as_str().unwrap_or_default().to_owned(),
        );
        self.content.insert(key, post);
        self
    }

    pub fn down(mut self, node: &str) -> Self {
        self.down.insert(node.to_owned());
        self
    }

    pub fn rejecting(mut self, node: &str) -> Self {
        self.rejecting.insert(node.to_owned());
        self
    }

    pub fn calls(&self) -> Vec<(String, &'static str)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str) -> usize {
        self.calls().iter().filter(|(_, m)| *m == method).count()
    }

    fn answer(&self, request: &RpcRequest) -> Option<Value> {
        match request.method {
            GET_FOLLOWING => {
                let following = self.following.as_ref()?;
                let follower = request.params[0].as_str().unwrap_or_default();
                Some(
                    following
                        .iter()
                        .map(|account| {
                            json!({ "follower": follower, "following": account, "what": ["blog"] })
                        })
                        .collect(),
                )
            }
            GET_BLOG => {
                let account = request.params["account"].as_str()?;
                self.blogs.get(account).map(|entries| Value::from(entries.clone()))
            }
            GET_CONTENT => {
                let key = (
                    request.params[0].as_str()?.to_owned(),
                    request.params[1].as_str()?.to_owned(),
                );
                Some(self.content.get(&key).cloned().unwrap_or_else(|| {
                    json!({ "author": "", "permlink": "", "created": "1970-01-01T00:00:00" })
                }))
            }
            _ => None,
        }
    }
}

#[async_trait]
impl Transport for FakeHive {
    async fn send(&self, endpoint: &Url, request: &RpcRequest) -> Result<RpcResponse> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), request.method));

        if self.down.contains(endpoint.as_str()) {
            return Err(Error::Timeout {
                endpoint: endpoint.to_string(),
            });
        }

        if self.rejecting.contains(endpoint.as_str()) {
            return Ok(RpcResponse {
                result: None,
                error: Some(RpcError {
                    code: -32602,
                    message: "Invalid parameters".to_owned(),
                }),
            });
        }

        self.answer(request)
            .map(RpcResponse::success)
            .ok_or(Error::BadServerResponse("503 Service Unavailable"))
    }
}

pub fn config() -> Config {
    Config {
        api_nodes: vec![Url::parse(NODE_A).unwrap(), Url::parse(NODE_B).unwrap()],
        ..Config::default()
    }
}

pub fn services(hive: FakeHive) -> (Arc<Services>, Arc<FakeHive>) {
    services_with(config(), hive)
}

pub fn services_with(config: Config, hive: FakeHive) -> (Arc<Services>, Arc<FakeHive>) {
    let hive = Arc::new(hive);
    (Services::with_transport(config, hive.clone()), hive)
}
