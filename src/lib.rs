//! Vercel provider core
//!
//! This crate implements the core of a Terraform-style provider for the
//! Vercel platform: resources and data sources register in a
//! [`Provider`] and the framework dispatches lifecycle calls to them.
//!
//! # Overview
//!
//! The crate provides:
//!
//! - **Schema types**: Types for describing provider, resource, and data
//!   source schemas, including declarative attribute constraints
//! - **Resource / DataSource traits**: Capability objects the provider
//!   dispatches CRUD and read calls to
//! - **Validation**: Schema-driven config validation plus cross-field
//!   consistency helpers over tri-state [`Attr`] values
//! - **Planning**: Attribute-level state diffing with `force_new` handling
//! - **Retry**: Bounded exponential backoff for read-after-write paths
//! - **Reconciliation**: Minimal add/remove/update deltas for
//!   membership-style collections
//! - **Error types**: Common error types for resource implementations
//! - **Logging**: Integration with `tracing` for structured logging
//! - **Testing**: An in-process harness for driving a provider in tests
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use vercel_provider::{
//!     init_logging, Provider,
//!     resources::{ProjectResource, ProjectMembersResource},
//!     data_sources::ProjectDataSource,
//! };
//!
//! fn main() {
//!     init_logging();
//!
//!     // `client` implements the api::ProjectApi and api::ProjectMembersApi
//!     // traits; the HTTP layer lives outside this crate.
//!     let client = Arc::new(VercelClient::from_env());
//!
//!     let provider = Provider::new()
//!         .with_resource(ProjectResource::new(client.clone()))
//!         .with_resource(ProjectMembersResource::new(client.clone()))
//!         .with_data_source(ProjectDataSource::new(client));
//!
//!     let config = provider.configure(&serde_json::json!({}))?;
//!     // hand `provider` to the plugin server
//! }
//! ```
//!
//! # Upstream API
//!
//! Resources never speak HTTP themselves. Each depends on a narrow trait in
//! [`api`] (e.g. [`api::ProjectApi`]); the concrete REST client implements
//! those traits and is injected at construction. Tests substitute in-memory
//! fakes the same way.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod data_sources;
pub mod error;
pub mod logging;
pub mod plan;
pub mod provider;
pub mod reconcile;
pub mod resources;
pub mod retry;
pub mod schema;
pub mod testing;
pub mod validation;
pub mod validators;
pub mod value;

// Re-export main types at crate root
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use plan::{AttributeChange, PlanResult};
pub use provider::{DataSource, Provider, ProviderConfig, ProviderMetadata, Resource};
pub use reconcile::{reconcile, Keyed, Reconciliation};
pub use retry::{Attempt, Retry};
pub use schema::ProviderSchema;
pub use validation::{is_valid, validate, validate_result};
pub use value::Attr;

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
