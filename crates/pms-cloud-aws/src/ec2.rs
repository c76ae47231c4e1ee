//! EC2 / VPC resource properties

use pms_cloud::ResourceProperties;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Resource tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn name(value: impl Into<String>) -> Self {
        Self::new("Name", value)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnVpc {
    pub cidr_block: String,
    pub enable_dns_hostnames: bool,
    pub enable_dns_support: bool,
    pub instance_tenancy: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl ResourceProperties for CfnVpc {
    const RESOURCE_TYPE: &'static str = "AWS::EC2::VPC";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnSubnet {
    pub vpc_id: Value,
    pub cidr_block: String,
    pub availability_zone: Value,
    pub map_public_ip_on_launch: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl ResourceProperties for CfnSubnet {
    const RESOURCE_TYPE: &'static str = "AWS::EC2::Subnet";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnInternetGateway {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl ResourceProperties for CfnInternetGateway {
    const RESOURCE_TYPE: &'static str = "AWS::EC2::InternetGateway";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnVpcGatewayAttachment {
    pub vpc_id: Value,
    pub internet_gateway_id: Value,
}

impl ResourceProperties for CfnVpcGatewayAttachment {
    const RESOURCE_TYPE: &'static str = "AWS::EC2::VPCGatewayAttachment";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnRouteTable {
    pub vpc_id: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl ResourceProperties for CfnRouteTable {
    const RESOURCE_TYPE: &'static str = "AWS::EC2::RouteTable";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnSubnetRouteTableAssociation {
    pub route_table_id: Value,
    pub subnet_id: Value,
}

impl ResourceProperties for CfnSubnetRouteTableAssociation {
    const RESOURCE_TYPE: &'static str = "AWS::EC2::SubnetRouteTableAssociation";
}

/// Route; exactly one target is expected to be set
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnRoute {
    pub route_table_id: Value,
    pub destination_cidr_block: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nat_gateway_id: Option<Value>,
}

impl ResourceProperties for CfnRoute {
    const RESOURCE_TYPE: &'static str = "AWS::EC2::Route";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnEip {
    pub domain: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl ResourceProperties for CfnEip {
    const RESOURCE_TYPE: &'static str = "AWS::EC2::EIP";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnNatGateway {
    pub subnet_id: Value,
    pub allocation_id: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl ResourceProperties for CfnNatGateway {
    const RESOURCE_TYPE: &'static str = "AWS::EC2::NatGateway";
}

/// Ingress/egress rule embedded in a security group
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroupRule {
    pub ip_protocol: String,
    pub from_port: u16,
    pub to_port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_security_group_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SecurityGroupRule {
    /// TCP on a single port from anywhere
    pub fn tcp_from_anywhere(port: u16) -> Self {
        Self {
            ip_protocol: "tcp".to_string(),
            from_port: port,
            to_port: port,
            cidr_ip: Some("0.0.0.0/0".to_string()),
            source_security_group_id: None,
            description: Some(format!("Allow from anyone on port {}", port)),
        }
    }

    /// TCP on a single port from another security group
    pub fn tcp_from_group(port: u16, group_id: Value) -> Self {
        Self {
            ip_protocol: "tcp".to_string(),
            from_port: port,
            to_port: port,
            cidr_ip: None,
            source_security_group_id: Some(group_id),
            description: Some("Load balancer to target".to_string()),
        }
    }

    /// All outbound traffic
    pub fn all_outbound() -> Self {
        Self {
            ip_protocol: "-1".to_string(),
            from_port: 0,
            to_port: 0,
            cidr_ip: Some("0.0.0.0/0".to_string()),
            source_security_group_id: None,
            description: Some("Allow all outbound traffic by default".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnSecurityGroup {
    pub group_description: String,
    pub vpc_id: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_group_ingress: Vec<SecurityGroupRule>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_group_egress: Vec<SecurityGroupRule>,
}

impl ResourceProperties for CfnSecurityGroup {
    const RESOURCE_TYPE: &'static str = "AWS::EC2::SecurityGroup";
}
