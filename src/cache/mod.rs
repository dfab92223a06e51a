//! 对象缓存
//!
//! 值以 JSON 字符串存放，后端可选 moka（进程内）或 redis。

pub mod object_cache;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::errors::Result;
use object_cache::{moka::MokaCacheWrapper, redis::RedisObjectCache};

/// 缓存查询结果
#[derive(Debug, Clone, PartialEq)]
pub enum CacheResult<T> {
    Found(T),
    NotFound,
    // 键存在但值不可用（后端故障或反序列化失败）
    ExistsButNoValue,
}

#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get_raw(&self, key: &str) -> CacheResult<String>;
    /// ttl 为 0 时使用后端默认值
    async fn insert_raw(&self, key: String, value: String, ttl: u64);
    async fn remove(&self, key: &str);
}

impl dyn ObjectCache {
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<T> {
        match self.get_raw(key).await {
            CacheResult::Found(raw) => match serde_json::from_str(&raw) {
                Ok(value) => CacheResult::Found(value),
                Err(e) => {
                    warn!("缓存值反序列化失败 '{}': {}", key, e);
                    CacheResult::ExistsButNoValue
                }
            },
            CacheResult::NotFound => CacheResult::NotFound,
            CacheResult::ExistsButNoValue => CacheResult::ExistsButNoValue,
        }
    }

    pub async fn insert<T: Serialize>(&self, key: String, value: &T, ttl: u64) {
        match serde_json::to_string(value) {
            Ok(raw) => self.insert_raw(key, raw, ttl).await,
            Err(e) => warn!("缓存值序列化失败 '{}': {}", key, e),
        }
    }
}

/// 按 `cache.type` 创建缓存，redis 不可用时回退到 moka
pub async fn create_cache() -> Result<Arc<dyn ObjectCache>> {
    let config = AppConfig::get();

    match config.cache.cache_type.as_str() {
        "redis" => match RedisObjectCache::connect(&config.cache).await {
            Ok(cache) => {
                info!("使用 Redis 缓存: {}", config.cache.redis.url);
                return Ok(Arc::new(cache));
            }
            Err(e) => warn!("Redis 缓存初始化失败，回退到 Moka: {}", e),
        },
        "moka" => {}
        other => warn!("未知的缓存类型 '{}'，使用 Moka", other),
    }

    info!("使用 Moka 内存缓存");
    Ok(Arc::new(MokaCacheWrapper::new(
        config.cache.memory.max_capacity,
        config.cache.default_ttl,
    )))
}
