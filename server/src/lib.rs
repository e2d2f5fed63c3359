pub mod api;
pub mod config;
pub mod service;
mod utils;

pub use api::router;
pub use config::{Config, FeedMode};
pub use service::Services;
pub use utils::error::{Error, Result};
pub use utils::parse_timestamp;
