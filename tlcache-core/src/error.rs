//! Crate-wide error taxonomy.
//!
//! A single [`CacheError`] enum covers every fallible operation across the
//! entry store, eviction, remote/durable tiers, the coordinator, and the
//! language detection engine. Propagation policy (what the coordinator
//! absorbs versus surfaces) lives in `coordinator.rs`; this module only
//! defines the kinds and the HTTP status mapping for callers that expose
//! this crate over an API.

use std::fmt;

/// The error taxonomy shared by every fallible operation in this crate.
///
/// Variants are kinds, not call-site-specific messages: callers match on
/// the kind and, where useful, read the attached `message` for diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Missing text, invalid language code, or out-of-range confidence.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Entry absent or expired; also the outcome of a cache miss.
    #[error("not found")]
    NotFound,

    /// A component that must be initialized exactly once was initialized twice.
    #[error("already initialized")]
    AlreadyInitialized,

    /// A component was used before initialization.
    #[error("not initialized")]
    NotInitialized,

    /// L1 capacity reached and eviction could not make room.
    #[error("cache full")]
    Full,

    /// A deadline was exceeded at some tier.
    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The remote cache's connection pool is exhausted or all connections retired.
    #[error("remote cache unavailable: {0}")]
    RemoteUnavailable(String),

    /// Disk I/O failure in the durable store.
    #[error("storage error: {0}")]
    StorageError(String),

    /// Magic/version/length mismatch in a batch file, or an unparseable
    /// remote-cache serialization.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// The durable store's on-disk schema version is newer than this code understands.
    #[error("schema too new: stored version {stored}, code version {code}")]
    SchemaTooNew { stored: u32, code: u32 },

    /// A language detection result fell below the caller's confidence threshold.
    #[error("low confidence: {0:.3}")]
    LowConfidence(f64),
}

impl CacheError {
    /// Maps an error kind to the HTTP status an enclosing service should
    /// return, per spec: `400` InvalidInput, `404` NotFound (direct lookup
    /// endpoints only), `503` Timeout/RemoteUnavailable, `500` StorageError.
    /// Every other kind maps to `500` as a conservative default.
    pub fn http_status(&self) -> u16 {
        match self {
            CacheError::InvalidInput(_) => 400,
            CacheError::NotFound => 404,
            CacheError::Timeout(_) | CacheError::RemoteUnavailable(_) => 503,
            CacheError::StorageError(_) => 500,
            CacheError::SchemaTooNew { .. } => 500,
            CacheError::LowConfidence(_) => 422,
            CacheError::Full => 507,
            CacheError::AlreadyInitialized | CacheError::NotInitialized => 500,
            CacheError::InvalidFormat(_) => 500,
        }
    }

    /// `true` for kinds the coordinator absorbs on read paths, degrading to
    /// the next tier rather than surfacing to the caller (spec §7).
    pub fn is_degradable_on_read(&self) -> bool {
        matches!(
            self,
            CacheError::RemoteUnavailable(_) | CacheError::StorageError(_)
        )
    }
}

/// Structured `{kind, message}` shape callers receive, per spec §7
/// "User-visible failure". Produced from a [`CacheError`] for serialization
/// at an API boundary without leaking this crate's internal error type.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub kind: String,
    pub message: String,
    pub http_status: u16,
}

impl From<&CacheError> for ErrorResponse {
    fn from(err: &CacheError) -> Self {
        let kind = match err {
            CacheError::InvalidInput(_) => "InvalidInput",
            CacheError::NotFound => "NotFound",
            CacheError::AlreadyInitialized => "AlreadyInitialized",
            CacheError::NotInitialized => "NotInitialized",
            CacheError::Full => "Full",
            CacheError::Timeout(_) => "Timeout",
            CacheError::RemoteUnavailable(_) => "RemoteUnavailable",
            CacheError::StorageError(_) => "StorageError",
            CacheError::InvalidFormat(_) => "InvalidFormat",
            CacheError::SchemaTooNew { .. } => "SchemaTooNew",
            CacheError::LowConfidence(_) => "LowConfidence",
        };
        ErrorResponse {
            kind: kind.to_string(),
            message: err.to_string(),
            http_status: err.http_status(),
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.kind, self.http_status, self.message)
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_maps_to_400() {
        let err = CacheError::InvalidInput("missing text".into());
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(CacheError::NotFound.http_status(), 404);
    }

    #[test]
    fn timeout_and_remote_unavailable_map_to_503() {
        assert_eq!(
            CacheError::Timeout(std::time::Duration::from_millis(50)).http_status(),
            503
        );
        assert_eq!(
            CacheError::RemoteUnavailable("pool exhausted".into()).http_status(),
            503
        );
    }

    #[test]
    fn storage_error_maps_to_500() {
        assert_eq!(CacheError::StorageError("disk full".into()).http_status(), 500);
    }

    #[test]
    fn degradable_on_read_kinds() {
        assert!(CacheError::RemoteUnavailable("x".into()).is_degradable_on_read());
        assert!(CacheError::StorageError("x".into()).is_degradable_on_read());
        assert!(!CacheError::InvalidInput("x".into()).is_degradable_on_read());
        assert!(!CacheError::SchemaTooNew { stored: 2, code: 1 }.is_degradable_on_read());
    }

    #[test]
    fn error_response_roundtrips_kind_string() {
        let err = CacheError::SchemaTooNew { stored: 3, code: 2 };
        let resp = ErrorResponse::from(&err);
        assert_eq!(resp.kind, "SchemaTooNew");
        assert_eq!(resp.http_status, 500);
    }
}
