//! Declarative cloud resource graph
//!
//! This crate describes infrastructure as a graph of stacks, each owning a
//! set of resource declarations, and synthesizes that graph into templates
//! an external deployment engine applies. Nothing here talks to a cloud API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                       App                        │
//! │         (context, stack ordering, synth)         │
//! └─────────────────┬───────────────────────────────┘
//!                   │ owns
//! ┌─────────────────▼───────────────────────────────┐
//! │                      Stack                       │
//! │  ┌──────────────┐  ┌────────────────────────┐   │
//! │  │   Template   │  │  exports / imports     │   │
//! │  │  resources   │  │  (CrossStackRef)       │   │
//! │  │  outputs     │  │                        │   │
//! │  └──────────────┘  └────────────────────────┘   │
//! └─────────────────┬───────────────────────────────┘
//!                   │ synth
//! ┌─────────────────▼───────────────────────────────┐
//! │  cdk.out/{stack}.template.json + manifest.json   │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! Provider-specific resource types live in separate crates that implement
//! [`ResourceProperties`].

pub mod app;
pub mod assembly;
pub mod error;
pub mod intrinsic;
pub mod stack;
pub mod summary;
pub mod template;

// Re-exports
pub use app::App;
pub use assembly::{AssemblyWriter, Manifest, StackArtifact};
pub use error::{CloudError, Result};
pub use stack::{CrossStackRef, Stack, StackEnv};
pub use summary::{StackSummary, SynthSummary};
pub use template::{
    DeletionPolicy, Export, Output, RemovalPolicy, Resource, ResourceProperties, Template,
};
