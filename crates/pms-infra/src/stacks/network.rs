//! Network stack: one VPC with public and private subnets across two AZs

use crate::error::{InfraError, Result};
use pms_cloud::{CrossStackRef, Stack};
use pms_cloud_aws::vpc::{SubnetConfiguration, SubnetType, Vpc};

pub const VPC_ID: &str = "ProductManagementVpc";
pub const MAX_AZS: usize = 2;
pub const NAT_GATEWAYS: usize = 1;
pub const SUBNET_CIDR_MASK: u8 = 24;

/// Network handle as seen by downstream stacks
pub trait Network: std::fmt::Debug {
    /// Stack that owns the network
    fn stack_name(&self) -> &str;

    /// Short description of the concrete network kind
    fn kind(&self) -> &'static str;

    /// The concrete VPC handle, when this network is one
    fn as_vpc(&self) -> Option<&VpcHandle> {
        None
    }
}

/// Exported identifiers of the VPC
#[derive(Debug, Clone, PartialEq)]
pub struct VpcHandle {
    stack: String,
    vpc_id: CrossStackRef,
    public_subnets: Vec<CrossStackRef>,
    private_subnets: Vec<CrossStackRef>,
}

impl VpcHandle {
    pub fn vpc_id(&self) -> &CrossStackRef {
        &self.vpc_id
    }

    pub fn public_subnets(&self) -> &[CrossStackRef] {
        &self.public_subnets
    }

    pub fn private_subnets(&self) -> &[CrossStackRef] {
        &self.private_subnets
    }
}

impl Network for VpcHandle {
    fn stack_name(&self) -> &str {
        &self.stack
    }

    fn kind(&self) -> &'static str {
        "vpc"
    }

    fn as_vpc(&self) -> Option<&VpcHandle> {
        Some(self)
    }
}

/// VPC layout of the deployment
pub fn vpc_props() -> Vpc {
    Vpc {
        max_azs: MAX_AZS,
        nat_gateways: NAT_GATEWAYS,
        subnet_configuration: vec![
            SubnetConfiguration::new("Public", SubnetType::Public, SUBNET_CIDR_MASK),
            SubnetConfiguration::new("Private", SubnetType::PrivateWithEgress, SUBNET_CIDR_MASK),
        ],
        ..Vpc::default()
    }
}

fn export_group(stack: &mut Stack, ids: &[serde_json::Value], label: &str) -> Result<Vec<CrossStackRef>> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| {
            stack
                .export(&format!("{}Subnet{}Id", label, i + 1), id.clone())
                .map_err(InfraError::from)
        })
        .collect()
}

/// Declare the VPC and export its identifiers
#[tracing::instrument(skip_all, fields(stack = %stack.name()))]
pub fn build(stack: &mut Stack) -> Result<VpcHandle> {
    stack.set_description("Product Management System network");
    let attrs = vpc_props().build(stack, VPC_ID)?;

    let public_ids = attrs
        .group(SubnetType::Public)
        .map(|g| g.subnet_ids.clone())
        .unwrap_or_default();
    let private_ids = attrs
        .group(SubnetType::PrivateWithEgress)
        .map(|g| g.subnet_ids.clone())
        .unwrap_or_default();

    let vpc_id = stack.export("VpcId", attrs.vpc_id.clone())?;
    let public_subnets = export_group(stack, &public_ids, "Public")?;
    let private_subnets = export_group(stack, &private_ids, "Private")?;

    tracing::info!(
        subnets = attrs.subnet_count(),
        nat_gateways = attrs.nat_gateway_ids.len(),
        "Network declared"
    );

    Ok(VpcHandle {
        stack: stack.name().to_string(),
        vpc_id,
        public_subnets,
        private_subnets,
    })
}
