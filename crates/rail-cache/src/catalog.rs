//! Read-through cache in front of a catalog repository

use crate::RedisCache;
use async_trait::async_trait;
use rail_core::{
    models::{ClassType, Coach, Station, Train},
    traits::{CacheService, CatalogRepository},
    AppResult,
};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::keys;

/// Catalog decorator that serves lookups from the cache when possible.
///
/// Cache failures are logged and fall through to the repository. Empty
/// results are not cached.
pub struct CachedCatalog<R: CatalogRepository, C: CacheService = RedisCache> {
    inner: Arc<R>,
    cache: Option<Arc<C>>,
    ttl_secs: u64,
}

impl<R: CatalogRepository, C: CacheService> CachedCatalog<R, C> {
    pub fn new(inner: Arc<R>, cache: Option<Arc<C>>, ttl_secs: u64) -> Self {
        Self {
            inner,
            cache,
            ttl_secs,
        }
    }

    async fn read_through<T, F, Fut>(&self, key: String, load: F) -> AppResult<Option<T>>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = AppResult<Option<T>>> + Send,
    {
        let Some(cache) = &self.cache else {
            return load().await;
        };

        match cache.get::<T>(&key).await {
            Ok(Some(value)) => return Ok(Some(value)),
            Ok(None) => debug!("Catalog cache MISS: {}", key),
            Err(e) => warn!("Cache error for {}: {}", key, e),
        }

        let value = load().await?;
        if let Some(ref v) = value {
            if let Err(e) = cache.set(&key, v, self.ttl_secs).await {
                warn!("Failed to cache {}: {}", key, e);
            }
        }
        Ok(value)
    }
}

#[async_trait]
impl<R: CatalogRepository, C: CacheService> CatalogRepository for CachedCatalog<R, C> {
    #[instrument(skip(self))]
    async fn find_station(&self, code: &str) -> AppResult<Option<Station>> {
        self.read_through(keys::station_key(code), || self.inner.find_station(code))
            .await
    }

    #[instrument(skip(self))]
    async fn find_train(&self, number: &str) -> AppResult<Option<Train>> {
        self.read_through(keys::train_key(number), || self.inner.find_train(number))
            .await
    }

    #[instrument(skip(self))]
    async fn find_coaches(&self, train_number: &str, class_type: ClassType) -> AppResult<Vec<Coach>> {
        let coaches = self
            .read_through(keys::coaches_key(train_number, class_type), || async {
                let coaches = self.inner.find_coaches(train_number, class_type).await?;
                Ok((!coaches.is_empty()).then_some(coaches))
            })
            .await?;

        Ok(coaches.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use rail_core::AppError;
    use rail_db::MemoryCatalogRepository;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MapCache {
        entries: Mutex<HashMap<String, String>>,
        broken: bool,
    }

    #[async_trait]
    impl CacheService for MapCache {
        async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
            if self.broken {
                return Err(AppError::CacheConnection("down".to_string()));
            }
            match self.entries.lock().get(key) {
                Some(json) => Ok(Some(serde_json::from_str(json)?)),
                None => Ok(None),
            }
        }

        async fn set<T: Serialize + Send + Sync>(
            &self,
            key: &str,
            value: &T,
            _ttl_secs: u64,
        ) -> AppResult<()> {
            if self.broken {
                return Err(AppError::CacheConnection("down".to_string()));
            }
            self.entries
                .lock()
                .insert(key.to_string(), serde_json::to_string(value)?);
            Ok(())
        }
    }

    /// Counts lookups that reach the backing repository
    struct Counting {
        inner: MemoryCatalogRepository,
        hits: AtomicUsize,
    }

    #[async_trait]
    impl CatalogRepository for Counting {
        async fn find_station(&self, code: &str) -> AppResult<Option<Station>> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            self.inner.find_station(code).await
        }

        async fn find_train(&self, number: &str) -> AppResult<Option<Train>> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            self.inner.find_train(number).await
        }

        async fn find_coaches(&self, train_number: &str, class_type: ClassType) -> AppResult<Vec<Coach>> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            self.inner.find_coaches(train_number, class_type).await
        }
    }

    fn backing() -> Arc<Counting> {
        let inner = MemoryCatalogRepository::new();
        inner.add_station(Station {
            code: "AGC".to_string(),
            name: "Agra Cantt".to_string(),
            latitude: Some(27.1767),
            longitude: Some(78.0081),
            state: None,
            zone: None,
        });
        inner.add_coach(Coach::with_layout("12002", "C1", ClassType::ChairCar, 70));
        Arc::new(Counting {
            inner,
            hits: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache() {
        let repo = backing();
        let catalog = CachedCatalog::new(repo.clone(), Some(Arc::new(MapCache::default())), 60);

        let first = catalog.find_station("agc").await.unwrap();
        let second = catalog.find_station("AGC").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(repo.hits.load(Ordering::SeqCst), 1);

        catalog.find_coaches("12002", ClassType::ChairCar).await.unwrap();
        let coaches = catalog.find_coaches("12002", ClassType::ChairCar).await.unwrap();
        assert_eq!(coaches.len(), 1);
        assert_eq!(repo.hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_misses_are_not_cached() {
        let repo = backing();
        let catalog = CachedCatalog::new(repo.clone(), Some(Arc::new(MapCache::default())), 60);

        assert!(catalog.find_station("XYZ").await.unwrap().is_none());
        assert!(catalog.find_station("XYZ").await.unwrap().is_none());
        assert_eq!(repo.hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_broken_cache_falls_through() {
        let repo = backing();
        let cache = MapCache {
            broken: true,
            ..Default::default()
        };
        let catalog = CachedCatalog::new(repo.clone(), Some(Arc::new(cache)), 60);

        assert!(catalog.find_station("AGC").await.unwrap().is_some());
        assert!(catalog.find_station("AGC").await.unwrap().is_some());
        assert_eq!(repo.hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_without_cache_goes_straight_to_repository() {
        let repo = backing();
        let catalog: CachedCatalog<Counting, MapCache> = CachedCatalog::new(repo.clone(), None, 60);

        catalog.find_station("AGC").await.unwrap();
        catalog.find_station("AGC").await.unwrap();
        assert_eq!(repo.hits.load(Ordering::SeqCst), 2);
    }
}
