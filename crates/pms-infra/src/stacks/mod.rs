//! The four stacks of the deployment
//!
//! Each module declares its resources into a [`pms_cloud::Stack`] and
//! returns a small handle exposing only what downstream stacks consume.

pub mod compute;
pub mod database;
pub mod network;
pub mod registry;

pub use compute::{ComputeInputs, ComputeService};
pub use database::TableHandle;
pub use network::{Network, VpcHandle};
pub use registry::RegistryHandle;
