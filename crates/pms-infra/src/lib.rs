//! Deployment topology of the Product Management System
//!
//! Four stacks per environment:
//!
//! ```text
//!  NetworkStack-{env}   DatabaseStack-{env}   ContainerRegistryStack-{env}
//!         │                                              │
//!         └──────────────┐            ┌──────────────────┘
//!                        ▼            ▼
//!                 ECSFargateServiceStack-{env}
//! ```
//!
//! Configuration is resolved once from context and a snapshot of the
//! process environment, then threaded explicitly through every stack.

pub mod config;
pub mod environment;
pub mod error;
pub mod orchestrator;
pub mod stacks;

pub use config::{Context, DeployConfig, ProcessEnv};
pub use environment::{ResolvedEnvironment, resolve};
pub use error::{InfraError, Result};
pub use orchestrator::{Deployment, StackNames, orchestrate};
