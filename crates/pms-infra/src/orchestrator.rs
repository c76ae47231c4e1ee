//! Orchestration of the four stacks
//!
//! Network, database and registry stacks are independent; the compute stack
//! is built last from the network and registry handles.

use crate::config::{Context, DeployConfig};
use crate::error::{InfraError, Result};
use crate::stacks::{
    self, ComputeInputs, ComputeService, Network, RegistryHandle, TableHandle, VpcHandle,
};
use pms_cloud::{App, Stack, StackEnv};

/// Stack names of one environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackNames {
    pub network: String,
    pub database: String,
    pub registry: String,
    pub compute: String,
}

impl StackNames {
    pub fn for_env(env: &str) -> Self {
        Self {
            network: format!("NetworkStack-{}", env),
            database: format!("DatabaseStack-{}", env),
            registry: format!("ContainerRegistryStack-{}", env),
            compute: format!("ECSFargateServiceStack-{}", env),
        }
    }
}

/// A fully built app plus the handles its stacks produced
#[derive(Debug)]
pub struct Deployment {
    pub app: App,
    pub names: StackNames,
    pub network: VpcHandle,
    pub table: TableHandle,
    pub registry: RegistryHandle,
    pub compute: ComputeService,
}

/// The concrete VPC behind a network handle
pub fn require_vpc(network: &dyn Network) -> Result<&VpcHandle> {
    network.as_vpc().ok_or_else(|| InfraError::NetworkTypeMismatch {
        stack: network.stack_name().to_string(),
        found: network.kind().to_string(),
    })
}

/// Build every stack of the deployment
pub fn orchestrate(config: &DeployConfig, context: &Context) -> Result<Deployment> {
    let names = StackNames::for_env(&config.environment.name);
    let stack_env = StackEnv::new(config.account.clone(), &config.environment.region);
    let mut app = App::new(context.as_map().clone());

    tracing::info!(
        env = %config.environment.name,
        region = %config.environment.region,
        "Building deployment"
    );

    let mut network_stack = Stack::new(&names.network, stack_env.clone());
    let network = stacks::network::build(&mut network_stack)?;

    let mut database_stack = Stack::new(&names.database, stack_env.clone());
    let table = stacks::database::build(&mut database_stack, &config.environment)?;

    let mut registry_stack = Stack::new(&names.registry, stack_env.clone());
    let registry = stacks::registry::build(&mut registry_stack, &config.environment)?;

    let vpc = require_vpc(&network)?;
    let mut compute_stack = Stack::new(&names.compute, stack_env);
    let compute = stacks::compute::build(
        &mut compute_stack,
        ComputeInputs {
            network: vpc,
            registry: &registry,
            image_tag: &config.image_tag,
            notification_email: config.notification_email.as_deref(),
        },
    )?;

    for stack in [network_stack, database_stack, registry_stack, compute_stack] {
        app.add_stack(stack)?;
    }

    Ok(Deployment {
        app,
        names,
        network,
        table,
        registry,
        compute,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProcessEnv;

    #[derive(Debug)]
    struct PeeredNetwork;

    impl Network for PeeredNetwork {
        fn stack_name(&self) -> &str {
            "PeeringStack-dev"
        }

        fn kind(&self) -> &'static str {
            "peered"
        }
    }

    #[test]
    fn test_network_type_mismatch() {
        let err = require_vpc(&PeeredNetwork).unwrap_err();
        assert!(matches!(
            err,
            InfraError::NetworkTypeMismatch { ref stack, ref found }
                if stack == "PeeringStack-dev" && found == "peered"
        ));
    }

    #[test]
    fn test_stack_names() {
        let names = StackNames::for_env("staging");
        assert_eq!(names.network, "NetworkStack-staging");
        assert_eq!(names.compute, "ECSFargateServiceStack-staging");
    }

    #[test]
    fn test_stacks_are_pinned_to_region() {
        let env = ProcessEnv {
            default_account: Some("123456789012".to_string()),
            ..Default::default()
        };
        let config = DeployConfig::resolve(&Context::new(), &env);
        let deployment = orchestrate(&config, &Context::new()).unwrap();

        assert_eq!(deployment.app.stacks().len(), 4);
        for stack in deployment.app.stacks() {
            assert_eq!(stack.env().region, "us-east-2");
            assert_eq!(stack.env().account.as_deref(), Some("123456789012"));
        }
    }
}
