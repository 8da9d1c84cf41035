//! The L2 remote cache tier (spec §4.5) and its wire transport (spec §6).
//!
//! The `RemoteCache` trait and its in-memory fake are grounded on the L2
//! adapter shape in `other_examples/c09d3413_nstefan-yastwai`'s
//! `TranslationCache` (an optional second tier behind a trait-like surface,
//! best-effort on write, promote-on-hit from the caller's side) and
//! `other_examples/2715974e_thichuong-multi-tier-cache`'s layered-tier
//! adapter pattern, restructured onto `parking_lot` locking to match the
//! teacher's synchronous concurrency idiom instead of `tokio::sync`.

use crate::config::RemoteCacheConfig;
use crate::entry::Entry;
use crate::error::{CacheError, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

/// The L2 remote cache surface the [`crate::coordinator::Coordinator`]
/// talks to. A real deployment backs this with a network service; this
/// crate provides [`InMemoryRemoteCache`] for tests and embedding without
/// one, plus [`TcpRemoteTransport`] for talking to an actual wire peer.
pub trait RemoteCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Entry>>;
    fn set(&self, key: &str, entry: &Entry, ttl_secs: u64) -> Result<()>;
    fn delete(&self, key: &str) -> Result<()>;
    fn exists(&self, key: &str) -> Result<bool>;
}

/// A `RemoteCache` backed by a process-local map. Behaves like a real
/// remote store from the caller's point of view (its own TTL clock, its
/// own key prefixing) without needing a network round trip, which is what
/// lets the coordinator and integration tests exercise the L2 contract
/// deterministically.
pub struct InMemoryRemoteCache {
    config: RemoteCacheConfig,
    store: RwLock<HashMap<String, (Entry, u64)>>, // value, expires_at_ms
}

impl InMemoryRemoteCache {
    pub fn new(config: RemoteCacheConfig) -> Self {
        Self {
            config,
            store: RwLock::new(HashMap::new()),
        }
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }
}

impl RemoteCache for InMemoryRemoteCache {
    fn get(&self, key: &str) -> Result<Option<Entry>> {
        let prefixed = self.prefixed(key);
        let now = crate::entry::now_ms();
        let mut store = self.store.write();
        match store.get(&prefixed) {
            Some((entry, expires_at)) if *expires_at > now => Ok(Some(entry.clone())),
            Some(_) => {
                store.remove(&prefixed);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, entry: &Entry, ttl_secs: u64) -> Result<()> {
        let prefixed = self.prefixed(key);
        let ttl = if ttl_secs == 0 {
            self.config.default_ttl_secs
        } else {
            ttl_secs
        };
        let expires_at = crate::entry::now_ms().saturating_add(ttl.saturating_mul(1000));
        self.store.write().insert(prefixed, (entry.clone(), expires_at));
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.store.write().remove(&self.prefixed(key));
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Serializes an entry into the self-describing text wire format spec §6
/// specifies for the remote protocol: a version-tagged, field-separated
/// line so a future format change can be rejected rather than
/// misinterpreted.
pub const WIRE_FORMAT_VERSION: u32 = 1;
const FIELD_SEP: char = '\u{1f}'; // unit separator; never appears in translated text

pub fn encode_entry(entry: &Entry) -> String {
    let escape = |s: &str| s.replace('\\', "\\\\").replace(FIELD_SEP, "\\u");
    format!(
        "v{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}",
        WIRE_FORMAT_VERSION,
        escape(&entry.key),
        escape(&entry.source_text),
        escape(&entry.source_lang),
        escape(&entry.target_lang),
        escape(&entry.translation),
        entry.confidence,
        entry.timestamp,
        entry.ttl,
        sep = FIELD_SEP,
    )
}

pub fn decode_entry(wire: &str) -> Result<Entry> {
    let unescape = |s: &str| s.replace("\\u", &FIELD_SEP.to_string()).replace("\\\\", "\\");
    let mut parts = wire.split(FIELD_SEP);
    let version_tag = parts
        .next()
        .ok_or_else(|| CacheError::InvalidFormat("empty wire payload".into()))?;
    let version: u32 = version_tag
        .strip_prefix('v')
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| CacheError::InvalidFormat(format!("bad version tag: {version_tag:?}")))?;
    if version > WIRE_FORMAT_VERSION {
        return Err(CacheError::InvalidFormat(format!(
            "unsupported wire format version {version}"
        )));
    }

    let mut next = || {
        parts
            .next()
            .ok_or_else(|| CacheError::InvalidFormat("truncated wire payload".into()))
    };
    let key = unescape(next()?);
    let source_text = unescape(next()?);
    let source_lang = unescape(next()?);
    let target_lang = unescape(next()?);
    let translation = unescape(next()?);
    let confidence: f64 = next()?
        .parse()
        .map_err(|_| CacheError::InvalidFormat("bad confidence field".into()))?;
    let timestamp: u64 = next()?
        .parse()
        .map_err(|_| CacheError::InvalidFormat("bad timestamp field".into()))?;
    let ttl: u64 = next()?
        .parse()
        .map_err(|_| CacheError::InvalidFormat("bad ttl field".into()))?;

    let mut entry = Entry::new(key, source_text, source_lang, target_lang, translation, confidence, ttl);
    entry.timestamp = timestamp;
    Ok(entry)
}

/// A single wire command sent to a remote transport (spec §6).
pub enum Command<'a> {
    Get(&'a str),
    Set(&'a str, &'a Entry, u64),
    Del(&'a str),
    Exists(&'a str),
}

/// Transport abstraction so the connection-pool/retry logic in
/// [`PooledRemoteCache`] doesn't depend on sockets directly, matching the
/// trait-at-the-seam idiom the teacher uses for injectable collaborators.
pub trait RemoteTransport: Send + Sync {
    fn send(&mut self, command: Command<'_>) -> Result<Option<String>>;
}

/// A transport that speaks the line-oriented wire protocol over a TCP
/// socket (`GET key`, `SET key EX secs payload`, `DEL key`, `EXISTS key`).
pub struct TcpRemoteTransport {
    stream: TcpStream,
    timeout: Duration,
}

impl TcpRemoteTransport {
    pub fn connect(addr: &str, timeout: Duration) -> Result<Self> {
        let stream = TcpStream::connect(addr).map_err(|e| CacheError::RemoteUnavailable(e.to_string()))?;
        stream
            .set_read_timeout(Some(timeout))
            .map_err(|e| CacheError::RemoteUnavailable(e.to_string()))?;
        stream
            .set_write_timeout(Some(timeout))
            .map_err(|e| CacheError::RemoteUnavailable(e.to_string()))?;
        Ok(Self { stream, timeout })
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        self.stream
            .write_all(format!("{line}\n").as_bytes())
            .map_err(|e| CacheError::RemoteUnavailable(e.to_string()))
    }

    fn read_line(&mut self) -> Result<String> {
        let mut buf = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            let n = self.stream.read(&mut byte).map_err(|e| {
                if matches!(e.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut) {
                    CacheError::Timeout(self.timeout)
                } else {
                    CacheError::RemoteUnavailable(e.to_string())
                }
            })?;
            if n == 0 || byte[0] == b'\n' {
                break;
            }
            buf.push(byte[0]);
        }
        String::from_utf8(buf).map_err(|e| CacheError::InvalidFormat(e.to_string()))
    }
}

impl RemoteTransport for TcpRemoteTransport {
    fn send(&mut self, command: Command<'_>) -> Result<Option<String>> {
        match command {
            Command::Get(key) => {
                self.write_line(&format!("GET {key}"))?;
                Ok(Some(self.read_line()?))
            }
            Command::Set(key, entry, ttl) => {
                self.write_line(&format!("SET {key} EX {ttl} {}", encode_entry(entry)))?;
                self.read_line()?;
                Ok(None)
            }
            Command::Del(key) => {
                self.write_line(&format!("DEL {key}"))?;
                self.read_line()?;
                Ok(None)
            }
            Command::Exists(key) => {
                self.write_line(&format!("EXISTS {key}"))?;
                Ok(Some(self.read_line()?))
            }
        }
    }
}

/// One pooled connection plus its consecutive-error count, used to decide
/// when a connection should be retired and replaced (spec §4.5).
struct PooledConnection {
    transport: Box<dyn RemoteTransport>,
    consecutive_errors: u32,
}

/// A fixed-size connection pool fronting a `RemoteTransport`, applying
/// per-command timeouts and auto-reconnect after `max_error_count`
/// consecutive failures (spec §4.5 "Connection management").
pub struct PooledRemoteCache<F: Fn() -> Result<Box<dyn RemoteTransport>> + Send + Sync> {
    config: RemoteCacheConfig,
    connect: F,
    pool: Mutex<Vec<PooledConnection>>,
}

impl<F: Fn() -> Result<Box<dyn RemoteTransport>> + Send + Sync> PooledRemoteCache<F> {
    pub fn new(config: RemoteCacheConfig, connect: F) -> Self {
        Self {
            config,
            connect,
            pool: Mutex::new(Vec::new()),
        }
    }

    fn with_connection<T>(&self, f: impl FnOnce(&mut dyn RemoteTransport) -> Result<T>) -> Result<T> {
        let mut pool = self.pool.lock();
        let mut conn = match pool.pop() {
            Some(c) => c,
            None => PooledConnection {
                transport: (self.connect)()?,
                consecutive_errors: 0,
            },
        };

        let result = f(conn.transport.as_mut());
        match &result {
            Ok(_) => conn.consecutive_errors = 0,
            Err(_) => conn.consecutive_errors += 1,
        }

        if conn.consecutive_errors < self.config.max_error_count && pool.len() < self.config.pool_size {
            pool.push(conn);
        }
        result
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }
}

impl<F: Fn() -> Result<Box<dyn RemoteTransport>> + Send + Sync> RemoteCache for PooledRemoteCache<F> {
    fn get(&self, key: &str) -> Result<Option<Entry>> {
        let prefixed = self.prefixed(key);
        let line = self.with_connection(|t| t.send(Command::Get(&prefixed)))?;
        match line {
            Some(payload) if !payload.is_empty() && payload != "(nil)" => Ok(Some(decode_entry(&payload)?)),
            _ => Ok(None),
        }
    }

    fn set(&self, key: &str, entry: &Entry, ttl_secs: u64) -> Result<()> {
        let prefixed = self.prefixed(key);
        let ttl = if ttl_secs == 0 { self.config.default_ttl_secs } else { ttl_secs };
        self.with_connection(|t| t.send(Command::Set(&prefixed, entry, ttl)))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let prefixed = self.prefixed(key);
        self.with_connection(|t| t.send(Command::Del(&prefixed)))?;
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let prefixed = self.prefixed(key);
        let line = self.with_connection(|t| t.send(Command::Exists(&prefixed)))?;
        Ok(matches!(line.as_deref(), Some("1")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str) -> Entry {
        Entry::new(key, "hi", "en", "fr", "bonjour", 0.9, 0)
    }

    #[test]
    fn in_memory_remote_roundtrips() {
        let cache = InMemoryRemoteCache::new(RemoteCacheConfig::default());
        cache.set("k1", &entry("k1"), 0).unwrap();
        let found = cache.get("k1").unwrap().unwrap();
        assert_eq!(found.translation, "bonjour");
    }

    #[test]
    fn in_memory_remote_missing_key_is_none() {
        let cache = InMemoryRemoteCache::new(RemoteCacheConfig::default());
        assert!(cache.get("nope").unwrap().is_none());
    }

    #[test]
    fn in_memory_remote_delete_removes_entry() {
        let cache = InMemoryRemoteCache::new(RemoteCacheConfig::default());
        cache.set("k1", &entry("k1"), 0).unwrap();
        cache.delete("k1").unwrap();
        assert!(cache.get("k1").unwrap().is_none());
    }

    #[test]
    fn in_memory_remote_ttl_expires() {
        let cache = InMemoryRemoteCache::new(RemoteCacheConfig::default());
        cache.set("k1", &entry("k1"), 0).unwrap();
        {
            let mut store = cache.store.write();
            for (_, expires_at) in store.values_mut() {
                *expires_at = crate::entry::now_ms().saturating_sub(1);
            }
        }
        assert!(cache.get("k1").unwrap().is_none());
    }

    #[test]
    fn wire_format_roundtrips() {
        let original = entry("en:fr:abc");
        let wire = encode_entry(&original);
        let decoded = decode_entry(&wire).unwrap();
        assert!(original.observable_eq(&decoded));
    }

    #[test]
    fn wire_format_rejects_future_version() {
        let bad = format!("v{}\u{1f}k\u{1f}t\u{1f}en\u{1f}fr\u{1f}x\u{1f}0.5\u{1f}0\u{1f}0", WIRE_FORMAT_VERSION + 1);
        assert!(decode_entry(&bad).is_err());
    }

    #[test]
    fn wire_format_rejects_truncated_payload() {
        assert!(decode_entry("v1\u{1f}onlykey").is_err());
    }

    #[test]
    fn key_prefix_is_applied() {
        let cache = InMemoryRemoteCache::new(RemoteCacheConfig {
            key_prefix: "custom:".to_string(),
            ..Default::default()
        });
        cache.set("k1", &entry("k1"), 0).unwrap();
        assert!(cache.store.read().contains_key("custom:k1"));
    }
}
