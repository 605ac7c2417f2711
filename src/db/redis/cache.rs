use std::{fmt::Display, sync::Arc};

use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    sync::{mpsc, oneshot, OnceCell},
    task::JoinHandle,
};

use crate::{error::AppResult, models::MediaType};

/// Pending writes beyond this are dropped rather than buffered
const WRITE_QUEUE_CAPACITY: usize = 256;

/// Reconnect backoff: `factor * exponent_base^attempt` milliseconds
const RECONNECT_EXPONENT_BASE: u64 = 2;
const RECONNECT_FACTOR_MS: u64 = 100;
const RECONNECT_RETRIES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Genre and runtime lookup for one catalog title
    Metadata {
        media_type: MediaType,
        catalog_id: String,
    },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Metadata {
                media_type,
                catalog_id,
            } => write!(f, "meta:{}:{}", media_type, catalog_id),
        }
    }
}

/// Creates a Redis client for caching
///
/// `Client::open` only validates the URL; no connection is made until the
/// first cache read or write.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

struct PendingWrite {
    key: String,
    json: String,
    ttl: u64,
}

/// Best-effort Redis cache for metadata lookups.
///
/// Reads that fail are logged and treated as misses, so an unreachable Redis
/// slows backfill down but never breaks it. Writes go through a bounded queue
/// drained by a background task. The connection is opened on first use and
/// re-established by `ConnectionManager` whenever it drops.
#[derive(Clone)]
pub struct Cache {
    client: Client,
    connection: Arc<OnceCell<ConnectionManager>>,
    writes: mpsc::Sender<PendingWrite>,
}

/// Stops the background writer once queued writes are flushed
pub struct CacheWriterHandle {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl CacheWriterHandle {
    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task panicked");
        }
    }
}

impl Cache {
    /// Spawns the writer task; must be called inside a tokio runtime
    pub fn new(client: Client) -> (Self, CacheWriterHandle) {
        let (writes, queue) = mpsc::channel(WRITE_QUEUE_CAPACITY);
        let (stop, stopped) = oneshot::channel();

        let cache = Self {
            client,
            connection: Arc::new(OnceCell::new()),
            writes,
        };

        let task = tokio::spawn(cache.clone().run_writer(queue, stopped));
        (cache, CacheWriterHandle { stop, task })
    }

    /// A failed first connect leaves the cell empty so the next call retries
    async fn connection(&self) -> AppResult<ConnectionManager> {
        let connection = self
            .connection
            .get_or_try_init(|| {
                ConnectionManager::new_with_backoff(
                    self.client.clone(),
                    RECONNECT_EXPONENT_BASE,
                    RECONNECT_FACTOR_MS,
                    RECONNECT_RETRIES,
                )
            })
            .await?;
        Ok(connection.clone())
    }

    /// Cached value for `key`, `None` on a miss or when Redis is unavailable
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let raw = match self.read(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    async fn read(&self, key: &CacheKey) -> AppResult<Option<String>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(key.to_string()).await?;
        Ok(raw)
    }

    /// Queues `value` for writing with a TTL in seconds
    pub fn put_in_background<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Cache serialization error");
                return;
            }
        };

        let write = PendingWrite {
            key: key.to_string(),
            json,
            ttl,
        };
        if let Err(e) = self.writes.try_send(write) {
            tracing::warn!(key = %key, error = %e, "Cache write dropped");
        }
    }

    async fn run_writer(
        self,
        mut queue: mpsc::Receiver<PendingWrite>,
        mut stopped: oneshot::Receiver<()>,
    ) {
        tracing::debug!("Cache writer started");

        loop {
            tokio::select! {
                Some(write) = queue.recv() => self.write(write).await,
                _ = &mut stopped => break,
            }
        }

        queue.close();
        let mut flushed = 0usize;
        while let Some(write) = queue.recv().await {
            self.write(write).await;
            flushed += 1;
        }
        tracing::info!(flushed, "Cache writer stopped");
    }

    async fn write(&self, write: PendingWrite) {
        let PendingWrite { key, json, ttl } = write;
        let result: AppResult<()> = async {
            let mut conn = self.connection().await?;
            let _: () = conn.set_ex(&key, json, ttl).await?;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            tracing::error!(key = %key, error = %e, "Cache write failed");
        }
    }
}
