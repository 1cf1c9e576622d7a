//! Identity resolution for source documents and embedded sub-records
//!
//! Every record must map to a stable key before it can become a graph node.
//! Resolution is three-tiered: an explicit identity field wins, then the
//! trailing path segment of the record's canonical profile URL, then a
//! freshly generated token. The first two tiers are deterministic, so
//! identical records resolve to identical keys across runs; the generated
//! tier is a last resort that breaks cross-run idempotence and is logged as
//! a data-quality signal.

use std::fmt;

use tracing::warn;
use uuid::Uuid;

use crate::data::errors::IngestError;

/// Field carrying the explicit identity of a record.
pub const IDENTITY_FIELD: &str = "permalink";

/// Field carrying the record's canonical profile URL; its trailing path
/// segment doubles as an identity when the explicit field is absent.
pub const PROFILE_URL_FIELD: &str = "profile_url";

/// How a key was obtained. Keys resolved from the record itself are
/// reproducible; generated keys are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentitySource {
    Explicit,
    ProfileUrl,
    Generated,
}

/// A resolved identity key, unique within one node label's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    value: String,
    source: IdentitySource,
}

impl IdentityKey {
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn source(&self) -> IdentitySource {
        self.source
    }

    /// True when the key was generated rather than derived from the record.
    /// A generated key cannot be re-derived on a later run.
    pub fn is_generated(&self) -> bool {
        self.source == IdentitySource::Generated
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Resolves the identity key for a record.
///
/// Fails only when the record is not a mapping. For any mapping this
/// succeeds: records without an identity-bearing field fall through to a
/// generated token, reported via `warn!` and visible on the returned key's
/// `source`.
pub fn resolve_identity(record: &serde_json::Value) -> Result<IdentityKey, IngestError> {
    let map = record
        .as_object()
        .ok_or_else(|| IngestError::InvalidRecord("expected a JSON object".to_string()))?;

    if let Some(value) = map.get(IDENTITY_FIELD).and_then(serde_json::Value::as_str) {
        return Ok(IdentityKey {
            value: value.to_string(),
            source: IdentitySource::Explicit,
        });
    }

    if let Some(url) = map.get(PROFILE_URL_FIELD).and_then(serde_json::Value::as_str) {
        if let Some(segment) = url.rsplit('/').next().filter(|s| !s.is_empty()) {
            return Ok(IdentityKey {
                value: segment.to_string(),
                source: IdentitySource::ProfileUrl,
            });
        }
    }

    let token = Uuid::new_v4().to_string();
    warn!(
        name = map.get("name").and_then(serde_json::Value::as_str),
        key = %token,
        "record carries no identity field; generated a one-off key"
    );
    Ok(IdentityKey {
        value: token,
        source: IdentitySource::Generated,
    })
}
