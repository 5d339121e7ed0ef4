//! `permagate-gateway` — HTTP runtime for the Permagate gateway.
//!
//! This crate provides the concrete implementations of the pipeline
//! contracts defined in `permagate-kernel`:
//!
//! | Kernel contract | Implementation |
//! |----------------|----------------|
//! | [`PipelineUnit`](permagate_kernel::PipelineUnit) | the units in [`middleware`] |
//! | [`CapabilityRegistry`](permagate_kernel::CapabilityRegistry) | written during assembly, served by [`middleware::CapabilitiesMiddleware`] |
//! | Collaborator traits | injected via [`system::System`] |
//!
//! The [`server::GatewayServer`] wires everything together into an axum HTTP
//! service: a stage pipeline (metrics → sandbox → ArNS) ahead of route
//! matching, fixed info/admin routes, and a content-dispatch fallback.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use permagate_gateway::config::GatewayConfig;
//! use permagate_gateway::server::GatewayServer;
//! use permagate_gateway::system::System;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = GatewayConfig::from_env();
//!     let server = GatewayServer::new(config);
//!     server.start(System::in_memory()).await.unwrap();
//! }
//! ```

pub mod app;
pub mod config;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod stage;
pub mod system;
