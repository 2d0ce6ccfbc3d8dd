use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use newsmap::{Cache, NewsMap, NewsMapConfig, telemetry, web};

fn open_cache(config: &NewsMapConfig) -> Option<Cache> {
    if !config.cache.enabled {
        return None;
    }
    let ttl = Duration::from_secs(u64::from(config.cache.ttl_hours) * 60 * 60);
    match Cache::open(&config.cache.location, ttl) {
        Ok(cache) => {
            info!("Using cache at {}", config.cache.location);
            Some(cache)
        }
        Err(e) => {
            warn!("Cache unavailable at {}, continuing without it: {e:#}", config.cache.location);
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = NewsMapConfig::load()?;
    let _telemetry = telemetry::init(&config.logging)?;
    info!("Starting NewsMap {}", newsmap::VERSION);

    let cache = open_cache(&config);
    let newsmap = Arc::new(NewsMap::from_config(&config, cache)?);

    web::run(newsmap, &config.server).await
}
