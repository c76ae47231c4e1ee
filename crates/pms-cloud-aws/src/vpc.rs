//! VPC construct
//!
//! Expands a small configuration (AZ count, NAT count, subnet groups) into
//! the full set of EC2 resources: VPC, internet gateway, one subnet per
//! group per AZ with its route table, and the NAT gateways private subnets
//! egress through.

use crate::ec2::{
    CfnEip, CfnInternetGateway, CfnNatGateway, CfnRoute, CfnRouteTable, CfnSubnet,
    CfnSubnetRouteTableAssociation, CfnVpc, CfnVpcGatewayAttachment, Tag,
};
use pms_cloud::intrinsic::{get_att, get_azs, select};
use pms_cloud::{CloudError, Resource, Result, Stack};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::Ipv4Addr;

const DEFAULT_CIDR: &str = "10.0.0.0/16";
const ANYWHERE: &str = "0.0.0.0/0";

/// Routing class of a subnet group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubnetType {
    /// Routes to the internet gateway; instances may get public IPs
    Public,
    /// No inbound route; outbound through a NAT gateway
    PrivateWithEgress,
    /// No route to the internet at all
    PrivateIsolated,
}

impl SubnetType {
    fn tag_value(self) -> &'static str {
        match self {
            SubnetType::Public => "Public",
            SubnetType::PrivateWithEgress => "Private",
            SubnetType::PrivateIsolated => "Isolated",
        }
    }
}

/// One subnet group, replicated across every AZ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubnetConfiguration {
    pub name: String,
    pub subnet_type: SubnetType,
    /// Prefix length of each subnet in the group (e.g., 24)
    pub cidr_mask: u8,
}

impl SubnetConfiguration {
    pub fn new(name: impl Into<String>, subnet_type: SubnetType, cidr_mask: u8) -> Self {
        Self {
            name: name.into(),
            subnet_type,
            cidr_mask,
        }
    }
}

/// VPC construct configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vpc {
    /// Address range of the whole VPC
    pub cidr: String,
    pub max_azs: usize,
    /// NAT gateways, placed in the first public subnets
    pub nat_gateways: usize,
    pub subnet_configuration: Vec<SubnetConfiguration>,
}

impl Default for Vpc {
    fn default() -> Self {
        Self {
            cidr: DEFAULT_CIDR.to_string(),
            max_azs: 2,
            nat_gateways: 1,
            subnet_configuration: vec![
                SubnetConfiguration::new("Public", SubnetType::Public, 24),
                SubnetConfiguration::new("Private", SubnetType::PrivateWithEgress, 24),
            ],
        }
    }
}

/// A subnet group as declared in the stack
#[derive(Debug, Clone, PartialEq)]
pub struct SubnetGroup {
    pub name: String,
    pub subnet_type: SubnetType,
    /// `Ref`s to the subnets, one per AZ
    pub subnet_ids: Vec<Value>,
    pub cidr_blocks: Vec<String>,
}

/// What a built VPC exposes to the rest of its stack
#[derive(Debug, Clone, PartialEq)]
pub struct VpcAttributes {
    pub logical_id: String,
    pub vpc_id: Value,
    pub availability_zones: Vec<Value>,
    pub subnet_groups: Vec<SubnetGroup>,
    pub nat_gateway_ids: Vec<Value>,
}

impl VpcAttributes {
    /// First subnet group of the given type
    pub fn group(&self, subnet_type: SubnetType) -> Option<&SubnetGroup> {
        self.subnet_groups
            .iter()
            .find(|g| g.subnet_type == subnet_type)
    }

    pub fn subnet_count(&self) -> usize {
        self.subnet_groups.iter().map(|g| g.subnet_ids.len()).sum()
    }
}

impl Vpc {
    fn validate(&self) -> Result<()> {
        if self.max_azs == 0 {
            return Err(CloudError::InvalidConfig("max_azs must be at least 1".into()));
        }
        if self.subnet_configuration.is_empty() {
            return Err(CloudError::InvalidConfig(
                "at least one subnet group is required".into(),
            ));
        }

        let has_public = self
            .subnet_configuration
            .iter()
            .any(|s| s.subnet_type == SubnetType::Public);
        let has_egress = self
            .subnet_configuration
            .iter()
            .any(|s| s.subnet_type == SubnetType::PrivateWithEgress);

        if self.nat_gateways > 0 && !has_public {
            return Err(CloudError::InvalidConfig(
                "NAT gateways require a public subnet group".into(),
            ));
        }
        if self.nat_gateways > self.max_azs {
            return Err(CloudError::InvalidConfig(format!(
                "{} NAT gateways requested but only {} AZs",
                self.nat_gateways, self.max_azs
            )));
        }
        if has_egress && self.nat_gateways == 0 {
            return Err(CloudError::InvalidConfig(
                "PRIVATE_WITH_EGRESS subnets require at least one NAT gateway".into(),
            ));
        }
        Ok(())
    }

    /// Declare every resource of the VPC in `stack` under `id`
    pub fn build(&self, stack: &mut Stack, id: &str) -> Result<VpcAttributes> {
        self.validate()?;
        let (base, prefix) = parse_cidr(&self.cidr)?;
        let path = format!("{}/{}", stack.name(), id);

        let vpc_id = stack.add(
            id,
            &CfnVpc {
                cidr_block: self.cidr.clone(),
                enable_dns_hostnames: true,
                enable_dns_support: true,
                instance_tenancy: "default".to_string(),
                tags: vec![Tag::name(&path)],
            },
        )?;

        let availability_zones: Vec<Value> =
            (0..self.max_azs).map(|az| select(az, get_azs())).collect();

        let has_public = self
            .subnet_configuration
            .iter()
            .any(|s| s.subnet_type == SubnetType::Public);
        let igw = if has_public {
            let igw_id = format!("{}IGW", id);
            let igw = stack.add(
                &igw_id,
                &CfnInternetGateway {
                    tags: vec![Tag::name(&path)],
                },
            )?;
            stack.add(
                format!("{}VPCGW", id),
                &CfnVpcGatewayAttachment {
                    vpc_id: vpc_id.clone(),
                    internet_gateway_id: igw.clone(),
                },
            )?;
            Some(igw)
        } else {
            None
        };

        let mut block_index: u32 = 0;
        let mut subnet_groups = Vec::with_capacity(self.subnet_configuration.len());
        let mut nat_gateway_ids = Vec::with_capacity(self.nat_gateways);

        // Public groups first so NAT gateways exist before private routes need them
        let mut ordered: Vec<&SubnetConfiguration> = self.subnet_configuration.iter().collect();
        ordered.sort_by_key(|s| s.subnet_type != SubnetType::Public);

        for config in ordered {
            let mut group = SubnetGroup {
                name: config.name.clone(),
                subnet_type: config.subnet_type,
                subnet_ids: Vec::with_capacity(self.max_azs),
                cidr_blocks: Vec::with_capacity(self.max_azs),
            };

            for (az, zone) in availability_zones.iter().enumerate() {
                let cidr_block = carve(base, prefix, config.cidr_mask, block_index)?;
                block_index += 1;

                let subnet_name = format!("{}Subnet{}", config.name, az + 1);
                let prefix_id = format!("{}{}", id, subnet_name);
                let subnet_path = format!("{}/{}", path, subnet_name);

                let subnet_id = stack.add(
                    format!("{}Subnet", prefix_id),
                    &CfnSubnet {
                        vpc_id: vpc_id.clone(),
                        cidr_block: cidr_block.clone(),
                        availability_zone: zone.clone(),
                        map_public_ip_on_launch: config.subnet_type == SubnetType::Public,
                        tags: vec![
                            Tag::new("aws-cdk:subnet-name", &config.name),
                            Tag::new("aws-cdk:subnet-type", config.subnet_type.tag_value()),
                            Tag::name(&subnet_path),
                        ],
                    },
                )?;

                let route_table = stack.add(
                    format!("{}RouteTable", prefix_id),
                    &CfnRouteTable {
                        vpc_id: vpc_id.clone(),
                        tags: vec![Tag::name(&subnet_path)],
                    },
                )?;
                stack.add(
                    format!("{}RouteTableAssociation", prefix_id),
                    &CfnSubnetRouteTableAssociation {
                        route_table_id: route_table.clone(),
                        subnet_id: subnet_id.clone(),
                    },
                )?;

                match config.subnet_type {
                    SubnetType::Public => {
                        let route_id = format!("{}DefaultRoute", prefix_id);
                        let route = Resource::from_properties(&CfnRoute {
                            route_table_id: route_table,
                            destination_cidr_block: ANYWHERE.to_string(),
                            gateway_id: igw.clone(),
                            nat_gateway_id: None,
                        })?
                        .with_dependency(format!("{}VPCGW", id));
                        stack.add_resource(&route_id, route)?;

                        if nat_gateway_ids.len() < self.nat_gateways {
                            let eip_id = format!("{}EIP", prefix_id);
                            stack.add(
                                &eip_id,
                                &CfnEip {
                                    domain: "vpc".to_string(),
                                    tags: vec![Tag::name(&subnet_path)],
                                },
                            )?;
                            let nat = Resource::from_properties(&CfnNatGateway {
                                subnet_id: subnet_id.clone(),
                                allocation_id: get_att(&eip_id, "AllocationId"),
                                tags: vec![Tag::name(&subnet_path)],
                            })?
                            .with_dependency(route_id);
                            let nat_id =
                                stack.add_resource(format!("{}NATGateway", prefix_id), nat)?;
                            nat_gateway_ids.push(nat_id);
                        }
                    }
                    SubnetType::PrivateWithEgress => {
                        let nat = nat_gateway_ids
                            .get(az % nat_gateway_ids.len().max(1))
                            .cloned()
                            .ok_or_else(|| {
                                CloudError::InvalidConfig(
                                    "no NAT gateway available for private subnet".into(),
                                )
                            })?;
                        stack.add(
                            format!("{}DefaultRoute", prefix_id),
                            &CfnRoute {
                                route_table_id: route_table,
                                destination_cidr_block: ANYWHERE.to_string(),
                                gateway_id: None,
                                nat_gateway_id: Some(nat),
                            },
                        )?;
                    }
                    SubnetType::PrivateIsolated => {}
                }

                group.subnet_ids.push(subnet_id);
                group.cidr_blocks.push(cidr_block);
            }

            subnet_groups.push(group);
        }

        tracing::debug!(
            stack = %stack.name(),
            azs = self.max_azs,
            nat_gateways = nat_gateway_ids.len(),
            "Declared VPC {}",
            id
        );

        Ok(VpcAttributes {
            logical_id: id.to_string(),
            vpc_id,
            availability_zones,
            subnet_groups,
            nat_gateway_ids,
        })
    }
}

fn parse_cidr(cidr: &str) -> Result<(u32, u8)> {
    let invalid = || CloudError::InvalidConfig(format!("invalid CIDR block: {}", cidr));
    let (addr, prefix) = cidr.split_once('/').ok_or_else(invalid)?;
    let addr: Ipv4Addr = addr.parse().map_err(|_| invalid())?;
    let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
    if prefix > 32 {
        return Err(invalid());
    }
    Ok((u32::from(addr), prefix))
}

/// The `index`-th block of size `/mask` inside `base/prefix`
fn carve(base: u32, prefix: u8, mask: u8, index: u32) -> Result<String> {
    if mask < prefix || mask > 28 {
        return Err(CloudError::InvalidConfig(format!(
            "subnet mask /{} does not fit in a /{} VPC",
            mask, prefix
        )));
    }
    let capacity = 1u64 << (mask - prefix);
    if u64::from(index) >= capacity {
        return Err(CloudError::InvalidConfig(format!(
            "VPC /{} has room for only {} subnets of /{}",
            prefix, capacity, mask
        )));
    }
    let block = 1u32 << (32 - mask);
    let address = Ipv4Addr::from(base + index * block);
    Ok(format!("{}/{}", address, mask))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pms_cloud::StackEnv;
    use serde_json::json;

    fn stack() -> Stack {
        Stack::new("Network-test", StackEnv::new(None, "us-east-2"))
    }

    #[test]
    fn test_default_vpc_shape() {
        let mut stack = stack();
        let attrs = Vpc::default().build(&mut stack, "Vpc").unwrap();

        assert_eq!(stack.resource_count("AWS::EC2::VPC"), 1);
        assert_eq!(stack.resource_count("AWS::EC2::Subnet"), 4);
        assert_eq!(stack.resource_count("AWS::EC2::NatGateway"), 1);
        assert_eq!(stack.resource_count("AWS::EC2::EIP"), 1);
        assert_eq!(stack.resource_count("AWS::EC2::InternetGateway"), 1);
        assert_eq!(stack.resource_count("AWS::EC2::RouteTable"), 4);
        assert_eq!(attrs.subnet_count(), 4);
        assert_eq!(attrs.nat_gateway_ids.len(), 1);
    }

    #[test]
    fn test_cidr_blocks_are_carved_sequentially() {
        let mut stack = stack();
        let attrs = Vpc::default().build(&mut stack, "Vpc").unwrap();

        let public = attrs.group(SubnetType::Public).unwrap();
        let private = attrs.group(SubnetType::PrivateWithEgress).unwrap();
        assert_eq!(public.cidr_blocks, vec!["10.0.0.0/24", "10.0.1.0/24"]);
        assert_eq!(private.cidr_blocks, vec!["10.0.2.0/24", "10.0.3.0/24"]);
    }

    #[test]
    fn test_private_subnets_share_single_nat() {
        let mut stack = stack();
        Vpc::default().build(&mut stack, "Vpc").unwrap();

        for az in 1..=2 {
            let route = stack
                .resource(&format!("VpcPrivateSubnet{}DefaultRoute", az))
                .unwrap();
            assert_eq!(
                route.property("NatGatewayId"),
                Some(&json!({"Ref": "VpcPublicSubnet1NATGateway"}))
            );
        }
    }

    #[test]
    fn test_one_nat_regardless_of_az_count() {
        let mut stack = stack();
        let vpc = Vpc {
            max_azs: 3,
            ..Vpc::default()
        };
        vpc.build(&mut stack, "Vpc").unwrap();
        assert_eq!(stack.resource_count("AWS::EC2::Subnet"), 6);
        assert_eq!(stack.resource_count("AWS::EC2::NatGateway"), 1);
    }

    #[test]
    fn test_invalid_configurations() {
        let no_nat = Vpc {
            nat_gateways: 0,
            ..Vpc::default()
        };
        assert!(matches!(
            no_nat.build(&mut stack(), "Vpc"),
            Err(CloudError::InvalidConfig(_))
        ));

        let too_many_nat = Vpc {
            nat_gateways: 3,
            ..Vpc::default()
        };
        assert!(too_many_nat.build(&mut stack(), "Vpc").is_err());

        let bad_cidr = Vpc {
            cidr: "10.0.0.0".to_string(),
            ..Vpc::default()
        };
        assert!(bad_cidr.build(&mut stack(), "Vpc").is_err());
    }

    #[test]
    fn test_carve_capacity() {
        let (base, prefix) = parse_cidr("10.0.0.0/23").unwrap();
        assert_eq!(carve(base, prefix, 24, 1).unwrap(), "10.0.1.0/24");
        assert!(carve(base, prefix, 24, 2).is_err());
        assert!(carve(base, prefix, 22, 0).is_err());
    }
}
