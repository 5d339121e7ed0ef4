//! Gateway error types for `permagate-kernel`.
//!
//! [`GatewayError`] covers the failure modes the core itself can detect —
//! duplicate capability registrations, malformed content identifiers — plus
//! the opaque failures reported by collaborators across the trait boundary
//! (name resolution, data index, blocklist, manifest resolution, fetch
//! queue). The runtime crate maps variants onto HTTP statuses; this crate
//! stays transport-free.

use thiserror::Error;

/// Error type shared by the pipeline contracts and the collaborator boundary.
///
/// The enum is `#[non_exhaustive]` so future releases can add new failure
/// modes without breaking existing `match` arms.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum GatewayError {
    // ── Capabilities ─────────────────────────────────────────────────────────
    /// A second middleware declared a capability name that is already taken.
    /// This is a startup-fatal condition; the process must not begin serving.
    #[error("multiple middleware implementing the {0} capability")]
    DuplicateCapability(String),

    /// A capability `name` field is empty or whitespace-only.
    #[error("capability name cannot be empty")]
    EmptyCapabilityName,

    // ── Content identifiers ──────────────────────────────────────────────────
    /// The string is not a 43-character URL-safe base64 identifier.
    #[error("invalid content identifier '{0}'")]
    InvalidContentId(String),

    // ── Collaborator failures ────────────────────────────────────────────────
    /// The name-resolution collaborator failed for the given name.
    #[error("name resolution failed for '{0}': {1}")]
    NameResolution(String, String),

    /// The data source could not produce bytes for the given identifier.
    #[error("data unavailable for '{0}': {1}")]
    DataUnavailable(String, String),

    /// The manifest-path-resolution collaborator failed.
    #[error("manifest path resolution failed for '{0}': {1}")]
    ManifestResolution(String, String),

    /// The contiguous-data index failed a lookup or mutation.
    #[error("data index error: {0}")]
    Index(String),

    /// The blocklist collaborator failed a check.
    #[error("block list error: {0}")]
    BlockList(String),

    /// The fetch-worker collaborator rejected an enqueue.
    #[error("fetch queue error: {0}")]
    FetchQueue(String),
}
