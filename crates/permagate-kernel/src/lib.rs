//! `permagate-kernel` — gateway core contracts.
//!
//! This crate defines the *trait interfaces and domain types* for the
//! Permagate gateway. No HTTP framework types appear here — the runtime
//! lives in `permagate-gateway`.
//!
//! # Architecture mapping
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │             permagate-kernel  (this crate)                  │
//! │  PipelineUnit trait       CapabilityRegistry                │
//! │  ContentId / sandbox labels                                 │
//! │  Collaborator traits: NameResolver, ContiguousDataSource,   │
//! │  ContiguousDataIndex, BlockListValidator,                   │
//! │  ManifestPathResolver, TransactionFetcher                   │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │  depends on
//! ┌──────────────────────────▼──────────────────────────────────┐
//! │             permagate-gateway  (runtime crate)              │
//! │  GatewayApp + request-stage pipeline (axum)                 │
//! │  Sandbox / ArNS / data / admin middleware units             │
//! │  GatewayServer  (axum HTTP server)                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use permagate_kernel::{Capability, CapabilityRegistry, ContentId};
//!
//! let registry = CapabilityRegistry::new();
//! registry
//!     .register(Capability::new("sandbox", "1.0.0"))
//!     .expect("first registration always succeeds");
//!
//! let id: ContentId = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
//!     .parse()
//!     .unwrap();
//! assert_eq!(id.sandbox_label().unwrap().len(), 52);
//! ```

pub mod capability;
pub mod collaborators;
pub mod error;
pub mod id;
pub mod pipeline;
pub mod types;

// ── Flat re-exports ────────────────────────────────────────────────────────

pub use capability::{Capability, CapabilityRegistry};
pub use collaborators::{
    BlockListValidator, ContiguousDataIndex, ContiguousDataSource, ManifestPathResolver,
    NameResolver, TransactionFetcher,
};
pub use error::GatewayError;
pub use id::{CONTENT_ID_LENGTH, ContentId};
pub use pipeline::{PipelineBuilder, PipelineUnit};
pub use types::{
    BlockDataEntry, ContiguousData, DataAttributes, ManifestResolution, NameResolution,
};
