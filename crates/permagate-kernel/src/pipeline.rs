//! Two-phase middleware pipeline assembly.
//!
//! A [`PipelineUnit`] is the unit of composition for the gateway: phase 1
//! ([`declare_capabilities`](PipelineUnit::declare_capabilities)) announces
//! what the unit provides, phase 2 ([`apply`](PipelineUnit::apply)) takes the
//! in-progress application object by ownership, transforms it, and returns
//! it. The [`PipelineBuilder`] threads the application object through the
//! units strictly in list order:
//!
//! ```text
//! app₀ ──unit₁.declare──unit₁.apply──► app₁ ──unit₂.declare──unit₂.apply──► app₂ …
//! ```
//!
//! Unit *i*'s transform is fully applied (including any asynchronous
//! suspension) before unit *i+1*'s phase 1 runs. Any failure aborts the
//! whole assembly; the caller must not begin serving.
//!
//! The application object type `A` is opaque here — the runtime crate
//! instantiates it with its router builder.

use crate::capability::CapabilityRegistry;
use crate::error::GatewayError;
use async_trait::async_trait;
use tracing::debug;

/// A single composable middleware unit.
///
/// Implementations must be `Send + Sync`; each unit owns only its own
/// capability declarations and its own transform, the builder owns the
/// sequencing.
#[async_trait]
pub trait PipelineUnit<A: Send + 'static>: Send + Sync {
    /// Stable, human-readable identifier for this unit (used in logs).
    fn name(&self) -> &str;

    /// Phase 1: declare zero or more capabilities.
    ///
    /// A [`GatewayError::DuplicateCapability`] from the registry must be
    /// propagated — it is a fatal startup condition.
    async fn declare_capabilities(
        &self,
        registry: &CapabilityRegistry,
    ) -> Result<(), GatewayError>;

    /// Phase 2: transform the application object.
    async fn apply(&self, app: A) -> Result<A, GatewayError>;
}

/// Assembles an application object by running every unit's two phases in
/// list order.
pub struct PipelineBuilder<A: Send + 'static> {
    registry: CapabilityRegistry,
    units: Vec<Box<dyn PipelineUnit<A>>>,
}

impl<A: Send + 'static> PipelineBuilder<A> {
    /// Create a builder writing capability declarations into `registry`.
    pub fn new(registry: CapabilityRegistry) -> Self {
        Self {
            registry,
            units: Vec::new(),
        }
    }

    /// Append a unit to the end of the pipeline.
    pub fn with_unit(mut self, unit: impl PipelineUnit<A> + 'static) -> Self {
        self.units.push(Box::new(unit));
        self
    }

    /// Run every unit over `app` and return the final application object.
    ///
    /// Assembly is sequential and must complete before the caller opens a
    /// listening socket; there is no partial-pipeline serving state.
    pub async fn build(self, mut app: A) -> Result<A, GatewayError> {
        for unit in &self.units {
            debug!(unit = unit.name(), "declaring middleware capabilities");
            unit.declare_capabilities(&self.registry).await?;
            app = unit.apply(app).await?;
        }
        Ok(app)
    }
}
