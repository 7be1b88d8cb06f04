//! # Memcached Store
//!
//! `CacheStore` backed by the `memcache` client. The client is blocking, so
//! every call runs on the blocking pool and is bounded by the configured I/O
//! timeout; an unreachable server costs at most that long and never takes the
//! search down with it.

use super::cache::{CacheError, CacheStore};
use async_trait::async_trait;
use memcache::MemcacheError;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::debug;

/// Longest relative TTL memcached accepts; larger values are read as a Unix
/// timestamp
const MAX_RELATIVE_TTL_SECS: u64 = 60 * 60 * 24 * 30;

pub struct MemcachedCacheStore {
    url: String,
    io_timeout: Duration,
    client: Mutex<Option<memcache::Client>>,
}

impl std::fmt::Debug for MemcachedCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemcachedCacheStore")
            .field("url", &self.url)
            .field("io_timeout", &self.io_timeout)
            .finish_non_exhaustive()
    }
}

impl MemcachedCacheStore {
    /// `address` is `host:port`; the connection is opened on first use
    #[must_use]
    pub fn new(address: impl Into<String>, io_timeout: Duration) -> Self {
        Self {
            url: format!("memcache://{}", address.into()),
            io_timeout,
            client: Mutex::new(None),
        }
    }

    async fn client(&self) -> Result<memcache::Client, CacheError> {
        let mut slot = self.client.lock().await;
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let url = self.url.clone();
        let io_timeout = self.io_timeout;
        let client = self
            .blocking(move || {
                let client = memcache::Client::connect(url.as_str())?;
                client.set_read_timeout(Some(io_timeout))?;
                client.set_write_timeout(Some(io_timeout))?;
                Ok(client)
            })
            .await?;

        *slot = Some(client.clone());
        Ok(client)
    }

    /// Run a client call on the blocking pool under the I/O timeout
    async fn blocking<F, T>(&self, call: F) -> Result<T, CacheError>
    where
        F: FnOnce() -> Result<T, MemcacheError> + Send + 'static,
        T: Send + 'static,
    {
        match timeout(self.io_timeout, tokio::task::spawn_blocking(call)).await {
            Err(_) => Err(CacheError::Unavailable(format!(
                "{}: timed out after {:?}",
                self.url, self.io_timeout
            ))),
            Ok(Err(join_error)) => Err(CacheError::Unavailable(format!(
                "{}: client call aborted: {join_error}",
                self.url
            ))),
            Ok(Ok(result)) => result.map_err(map_error),
        }
    }

    /// Drop the cached client after a failure so the next call reconnects
    async fn reset_on_error<T>(&self, result: Result<T, CacheError>) -> Result<T, CacheError> {
        if result.is_err() {
            *self.client.lock().await = None;
        }
        result
    }
}

fn map_error(err: MemcacheError) -> CacheError {
    match err {
        MemcacheError::IOError(e) => CacheError::Unavailable(e.to_string()),
        MemcacheError::PoolError(e) => CacheError::Unavailable(e.to_string()),
        other => CacheError::Protocol(other.to_string()),
    }
}

#[async_trait]
impl CacheStore for MemcachedCacheStore {
    fn name(&self) -> &'static str {
        "memcached"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let client = self.client().await?;
        let key = key.to_string();
        let result = self
            .blocking(move || client.get::<String>(&key))
            .await;

        let value = self.reset_on_error(result).await?;
        if value.is_none() {
            debug!("memcached miss");
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let client = self.client().await?;
        let key = key.to_string();
        let value = value.to_string();
        let ttl_secs = u32::try_from(ttl.as_secs().clamp(1, MAX_RELATIVE_TTL_SECS))
            .unwrap_or(u32::MAX);

        let result = self
            .blocking(move || client.set(&key, value.as_str(), ttl_secs))
            .await;
        self.reset_on_error(result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufStream};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    /// Line-based memcached stand-in: answers `version`, records every other
    /// command (with its payload for `set`) and answers it with `reply`
    async fn fake_server(reply: &'static str) -> (String, mpsc::UnboundedReceiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    return;
                };
                let tx = tx.clone();
                tokio::spawn(async move {
                    let mut stream = BufStream::new(socket);
                    loop {
                        let mut line = String::new();
                        match stream.read_line(&mut line).await {
                            Ok(0) | Err(_) => return,
                            Ok(_) => {}
                        }

                        let answer = if line.starts_with("version") {
                            "VERSION 1.6.21\r\n"
                        } else {
                            if line.starts_with("set") {
                                let mut payload = String::new();
                                let _ = stream.read_line(&mut payload).await;
                                line.push_str(&payload);
                            }
                            let _ = tx.send(line);
                            reply
                        };

                        if stream.write_all(answer.as_bytes()).await.is_err()
                            || stream.flush().await.is_err()
                        {
                            return;
                        }
                    }
                });
            }
        });

        (address, rx)
    }

    fn store(address: &str) -> MemcachedCacheStore {
        MemcachedCacheStore::new(address, Duration::from_secs(2))
    }

    #[tokio::test]
    async fn test_get_hit() {
        let (address, mut requests) = fake_server("VALUE token 0 5\r\nhello\r\nEND\r\n").await;

        let value = store(&address).get("token").await.unwrap();
        assert_eq!(value.as_deref(), Some("hello"));
        assert_eq!(requests.recv().await.unwrap(), "get token\r\n");
    }

    #[tokio::test]
    async fn test_get_miss() {
        let (address, _requests) = fake_server("END\r\n").await;
        assert_eq!(store(&address).get("token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_sends_ttl_and_payload() {
        let (address, mut requests) = fake_server("STORED\r\n").await;

        store(&address)
            .set("token", "abc", Duration::from_secs(3600))
            .await
            .unwrap();

        let request = requests.recv().await.unwrap();
        assert!(request.starts_with("set token 0 3600 3"), "{request}");
        assert!(request.ends_with("abc\r\n"), "{request}");
    }

    #[tokio::test]
    async fn test_oversized_value_header_is_an_error() {
        let (address, _requests) =
            fake_server("VALUE auth_token 0 18446744073709551615\r\n").await;

        let store = store(&address);
        assert!(store.get("auth_token").await.is_err());
        assert!(store.client.lock().await.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let store = store(&address);
        assert!(matches!(store.get("token").await, Err(CacheError::Unavailable(_))));
        assert!(matches!(
            store.set("token", "v", Duration::from_secs(1)).await,
            Err(CacheError::Unavailable(_))
        ));
    }
}
