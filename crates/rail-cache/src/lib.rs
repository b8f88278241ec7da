//! Redis caching layer for rail reference data
//!
//! Station, train and coach lookups are read-heavy and change only when the
//! catalog is re-seeded, so they can be served from Redis. Occupancy and
//! availability always go to the booking store.
//!
//! # Example
//!
//! ```no_run
//! use rail_cache::RedisCache;
//! use rail_core::traits::CacheService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = RedisCache::new("redis://127.0.0.1:6379").await?;
//!     cache.set("station:NDLS", &"New Delhi", 60).await?;
//!     let value: Option<String> = cache.get("station:NDLS").await?;
//!     assert_eq!(value, Some("New Delhi".to_string()));
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod keys;

pub use catalog::CachedCatalog;

use async_trait::async_trait;
use rail_core::error::AppError;
use rail_core::traits::CacheService;
use redis::{aio::ConnectionManager, AsyncCommands, Client, ErrorKind, RedisError};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

/// Catalog entries stored as JSON strings behind a multiplexed connection
#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    /// Open the client and establish the managed connection
    ///
    /// # Errors
    ///
    /// `AppError::CacheConnection` for a malformed URL or an unreachable server
    pub async fn new(url: &str) -> Result<Self, AppError> {
        let client = Client::open(url)
            .map_err(|e| AppError::CacheConnection(format!("Invalid Redis URL: {}", e)))?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            error!("Redis connection to {} failed: {}", url, e);
            AppError::CacheConnection(format!("Connection failed: {}", e))
        })?;

        debug!("Redis connection established");
        Ok(Self { manager })
    }

    fn conn(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

/// I/O failures are connection errors
fn cache_error(err: RedisError) -> AppError {
    match err.kind() {
        ErrorKind::IoError => AppError::CacheConnection(err.to_string()),
        _ => AppError::Cache(err.to_string()),
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        let raw: Option<String> = self.conn().get(key).await.map_err(cache_error)?;

        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| {
                error!("Stale or corrupt entry {}: {}", key, e);
                AppError::Serialization(e.to_string())
            })
        })
        .transpose()
    }

    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
    ) -> Result<(), AppError> {
        let json = serde_json::to_string(value)?;
        debug!("SET {} ({}s)", key, ttl_secs);

        self.conn()
            .set_ex::<_, _, ()>(key, json, ttl_secs)
            .await
            .map_err(cache_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rail_core::models::Station;

    async fn connect() -> RedisCache {
        RedisCache::new("redis://127.0.0.1:6379")
            .await
            .expect("Failed to connect to Redis")
    }

    fn new_delhi() -> Station {
        Station {
            code: "NDLS".to_string(),
            name: "New Delhi".to_string(),
            latitude: Some(28.6139),
            longitude: Some(77.209),
            state: Some("Delhi".to_string()),
            zone: Some("NR".to_string()),
        }
    }

    #[tokio::test]
    async fn test_malformed_url_is_a_connection_error() {
        let result = RedisCache::new("not a url").await;
        assert!(matches!(result, Err(AppError::CacheConnection(_))));
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn test_station_round_trip() {
        let cache = connect().await;
        let key = keys::station_key("NDLS");

        cache.set(&key, &new_delhi(), 60).await.unwrap();
        let cached: Option<Station> = cache.get(&key).await.unwrap();
        assert_eq!(cached, Some(new_delhi()));

        let missing: Option<Station> = cache.get(&keys::station_key("ZZZZ")).await.unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn test_entries_expire() {
        let cache = connect().await;
        let key = keys::station_key("AGC");

        cache.set(&key, &new_delhi(), 1).await.unwrap();
        tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;

        let result: Option<Station> = cache.get(&key).await.unwrap();
        assert_eq!(result, None);
    }
}
