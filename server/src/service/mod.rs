pub mod feed;
pub mod hive;
pub mod post;
pub mod upstream;

use std::sync::Arc;

use crate::{Config, Result};

use self::{
    feed::FeedService,
    hive::Hive,
    upstream::{HttpTransport, Transport, Upstream},
};

/// Everything a request handler needs, shared behind an `Arc`.
pub struct Services {
    pub config: Config,
    pub hive: Hive,
    pub feed: FeedService,
}

impl Services {
    /// Talks to the configured API nodes over HTTPS.
    pub fn build(config: Config) -> Result<Arc<Self>> {
        let transport = HttpTransport::new(config.request_timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Arc<Self> {
        let upstream = Upstream::new(config.api_nodes.clone(), transport);
        let hive = Hive::new(upstream);
        let feed = FeedService::new(hive.clone(), &config);

        Arc::new(Self { config, hive, feed })
    }
}
