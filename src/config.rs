//! Engine configuration.
//!
//! `EngineConfig` covers the tunables a host sets once at bootstrap:
//! page-cache enablement, render buffer pool sizing, and missing-key
//! strictness. All fields have defaults, so `EngineConfig::default()` (or
//! deserializing `{}`) yields a working configuration.

use educe::Educe;
use serde::{Deserialize, Serialize};

// ============================================================================
// Enums
// ============================================================================

/// Missing-key handling during template execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingKey {
    /// Render absent fields (and nulls) as the empty string (default).
    #[default]
    Empty,
    /// Fail the render when a referenced field is absent.
    Error,
}

// ============================================================================
// Main EngineConfig
// ============================================================================

/// Engine-wide settings, fixed at construction time.
///
/// # Example
/// ```json
/// {
///   "cache": true,
///   "pool_size": 64,
///   "missing_key": "error"
/// }
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Memoize composed pages by document-set fingerprint.
    #[serde(default = "defaults::cache")]
    #[educe(Default = defaults::cache())]
    pub cache: bool,

    /// Number of render buffers in the fixed-size pool.
    #[serde(default = "defaults::pool_size")]
    #[educe(Default = defaults::pool_size())]
    pub pool_size: usize,

    /// Initial capacity in bytes of each pooled render buffer.
    #[serde(default = "defaults::buffer_capacity")]
    #[educe(Default = defaults::buffer_capacity())]
    pub buffer_capacity: usize,

    /// Missing-key strictness applied to every composed instance.
    #[serde(default = "defaults::missing_key")]
    #[educe(Default = defaults::missing_key())]
    pub missing_key: MissingKey,
}

// ============================================================================
// Defaults
// ============================================================================

/// Default values for configuration fields, used by serde and educe.
pub mod defaults {
    use super::MissingKey;

    pub fn cache() -> bool {
        true
    }

    pub fn pool_size() -> usize {
        64
    }

    pub fn buffer_capacity() -> usize {
        8 * 1024
    }

    pub fn missing_key() -> MissingKey {
        MissingKey::Empty
    }
}
