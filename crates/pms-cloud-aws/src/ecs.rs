//! ECS cluster, task definition and service properties

use pms_cloud::ResourceProperties;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Container Insights setting of a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerInsights {
    Enabled,
    Enhanced,
    Disabled,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClusterSetting {
    pub name: String,
    pub value: ContainerInsights,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnCluster {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    pub cluster_settings: Vec<ClusterSetting>,
}

impl CfnCluster {
    pub fn with_container_insights(insights: ContainerInsights) -> Self {
        Self {
            cluster_name: None,
            cluster_settings: vec![ClusterSetting {
                name: "containerInsights".to_string(),
                value: insights,
            }],
        }
    }
}

impl ResourceProperties for CfnCluster {
    const RESOURCE_TYPE: &'static str = "AWS::ECS::Cluster";
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PortMapping {
    pub container_port: u16,
    pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyValuePair {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogConfiguration {
    pub log_driver: String,
    /// Driver options; keys keep their native spelling (`awslogs-group`, ...)
    pub options: BTreeMap<String, Value>,
}

impl LogConfiguration {
    pub fn aws_logs(log_group: Value, stream_prefix: &str, region: Value) -> Self {
        let mut options = BTreeMap::new();
        options.insert("awslogs-group".to_string(), log_group);
        options.insert(
            "awslogs-stream-prefix".to_string(),
            Value::String(stream_prefix.to_string()),
        );
        options.insert("awslogs-region".to_string(), region);
        Self {
            log_driver: "awslogs".to_string(),
            options,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerDefinition {
    pub name: String,
    pub image: Value,
    pub essential: bool,
    pub port_mappings: Vec<PortMapping>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<KeyValuePair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_configuration: Option<LogConfiguration>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnTaskDefinition {
    pub family: String,
    /// CPU units, as a string
    pub cpu: String,
    /// Memory in MiB, as a string
    pub memory: String,
    pub network_mode: String,
    pub requires_compatibilities: Vec<String>,
    pub execution_role_arn: Value,
    pub task_role_arn: Value,
    pub container_definitions: Vec<ContainerDefinition>,
}

impl ResourceProperties for CfnTaskDefinition {
    const RESOURCE_TYPE: &'static str = "AWS::ECS::TaskDefinition";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceLoadBalancer {
    pub container_name: String,
    pub container_port: u16,
    pub target_group_arn: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignPublicIp {
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AwsVpcConfiguration {
    pub assign_public_ip: AssignPublicIp,
    pub subnets: Vec<Value>,
    pub security_groups: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkConfiguration {
    #[serde(rename = "AwsvpcConfiguration")]
    pub awsvpc_configuration: AwsVpcConfiguration,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeploymentConfiguration {
    pub maximum_percent: u32,
    pub minimum_healthy_percent: u32,
}

impl Default for DeploymentConfiguration {
    fn default() -> Self {
        Self {
            maximum_percent: 200,
            minimum_healthy_percent: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnService {
    pub cluster: Value,
    pub launch_type: String,
    pub desired_count: u32,
    pub task_definition: Value,
    pub health_check_grace_period_seconds: u32,
    pub deployment_configuration: DeploymentConfiguration,
    pub load_balancers: Vec<ServiceLoadBalancer>,
    pub network_configuration: NetworkConfiguration,
}

impl ResourceProperties for CfnService {
    const RESOURCE_TYPE: &'static str = "AWS::ECS::Service";
}
