use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use redis::{Client, ErrorKind, RedisResult};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, OnceCell};

use crate::error::AppError;
use crate::error::AppResult;
use crate::models::ItemId;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Metadata(ItemId),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Metadata(id) => write!(f, "meta:{}", id),
        }
    }
}

/// Creates a Redis client for caching
///
/// Opening a client does not connect; the cache connects on first use.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Lazily established Redis connection shared by readers and the writer task
///
/// Every operation, including the initial connect, is bounded by `timeout`.
/// A connect that fails or times out is retried on the next operation.
struct SharedConnection {
    client: Client,
    manager: OnceCell<ConnectionManager>,
    timeout: Duration,
}

impl SharedConnection {
    async fn run<T, F, Fut>(&self, op: F) -> RedisResult<T>
    where
        F: FnOnce(ConnectionManager) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        let attempt = async {
            match self
                .manager
                .get_or_try_init(|| ConnectionManager::new(self.client.clone()))
                .await
            {
                Ok(conn) => op(conn.clone()).await,
                Err(e) => Err(e),
            }
        };

        match tokio::time::timeout(self.timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err((ErrorKind::IoError, "Redis operation timed out").into()),
        }
    }
}

/// Cache handler for storing and retrieving data from Redis
///
/// Entries expire after the TTL given at write time; there is no other eviction.
#[derive(Clone)]
pub struct Cache {
    connection: Arc<SharedConnection>,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Initiates a graceful shutdown of the cache writer
    ///
    /// Sends a shutdown signal to the writer task, which flushes pending writes
    /// before exiting.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl Cache {
    /// Creates a new Cache instance with an async write background task
    ///
    /// `timeout` bounds each Redis round trip, so an unresponsive server costs a
    /// reader at most `timeout` before it falls back to the provider.
    pub async fn new(redis_client: Client, timeout: Duration) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let connection = Arc::new(SharedConnection {
            client: redis_client,
            manager: OnceCell::new(),
            timeout,
        });

        let writer_connection = Arc::clone(&connection);
        tokio::spawn(async move {
            Self::cache_writer_task(writer_connection, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            connection,
            write_tx,
        };

        let handle = CacheWriterHandle { shutdown_tx };

        (cache, handle)
    }

    /// Background task that processes cache write messages
    ///
    /// On shutdown signal, drains whatever is already queued and exits.
    async fn cache_writer_task(
        connection: Arc<SharedConnection>,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&connection, msg).await {
                        tracing::warn!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    let mut flushed = 0usize;
                    while let Ok(msg) = write_rx.try_recv() {
                        if let Err(e) = Self::write_to_redis(&connection, msg).await {
                            tracing::warn!(error = %e, "Failed to flush cache write during shutdown");
                        } else {
                            flushed += 1;
                        }
                    }

                    tracing::info!(flushed, "Cache writer task stopped");
                    break;
                }
            }
        }
    }

    /// Writes a single message to Redis
    async fn write_to_redis(connection: &SharedConnection, msg: CacheWriteMessage) -> AppResult<()> {
        let _: () = connection
            .run(|mut conn| async move { conn.set_ex(msg.key, msg.value, msg.ttl).await })
            .await?;
        Ok(())
    }

    /// Retrieves a value from the cache by key
    ///
    /// Returns `None` when the key is absent or expired. A Redis failure or a
    /// read slower than the cache timeout is an error.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let redis_key = key.to_string();
        let cached: Option<String> = self
            .connection
            .run(|mut conn| async move { conn.get(redis_key).await })
            .await?;

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Queues a value for storage without waiting for the write to complete
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let msg = CacheWriteMessage {
            key: format!("{}", key),
            value: json,
            ttl,
        };

        if let Err(e) = self.write_tx.send(msg) {
            tracing::error!(error = %e, "Failed to send cache write message");
        }
    }
}
