use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use tracing::{debug, error};

use crate::cache::{CacheResult, ObjectCache};
use crate::config::CacheConfig;
use crate::errors::{EduTaskError, Result};

pub struct RedisObjectCache {
    // 多路复用连接，可廉价克隆
    conn: MultiplexedConnection,
    key_prefix: String,
    ttl: u64,
}

impl RedisObjectCache {
    /// 建立连接并 PING 一次
    pub async fn connect(config: &CacheConfig) -> Result<Self> {
        let client = redis::Client::open(config.redis.url.as_str())
            .map_err(|e| EduTaskError::cache_connection(format!("Redis URL 无效: {e}")))?;

        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| EduTaskError::cache_connection(format!("Redis 连接失败: {e}")))?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| EduTaskError::cache_connection(format!("Redis ping failed: {e}")))?;
        debug!("Redis connection test successful: {}", pong);

        Ok(Self {
            conn,
            key_prefix: config.redis.key_prefix.clone(),
            ttl: config.default_ttl,
        })
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl ObjectCache for RedisObjectCache {
    async fn get_raw(&self, key: &str) -> CacheResult<String> {
        let mut conn = self.conn.clone();
        let result: redis::RedisResult<Option<String>> = conn.get(self.make_key(key)).await;

        match result {
            Ok(Some(data)) => CacheResult::Found(data),
            Ok(None) => CacheResult::NotFound,
            Err(e) => {
                error!("Failed to get key '{}': {}", key, e);
                CacheResult::ExistsButNoValue
            }
        }
    }

    async fn insert_raw(&self, key: String, value: String, ttl: u64) {
        let mut conn = self.conn.clone();
        let effective_ttl = if ttl == 0 { self.ttl } else { ttl };

        if let Err(e) = conn
            .set_ex::<String, String, ()>(self.make_key(&key), value, effective_ttl)
            .await
        {
            error!("Failed to insert key '{}' into cache: {}", key, e);
        }
    }

    async fn remove(&self, key: &str) {
        let mut conn = self.conn.clone();
        if let Err(e) = conn.del::<String, i32>(self.make_key(key)).await {
            error!("Failed to remove key '{}': {}", key, e);
        }
    }
}
