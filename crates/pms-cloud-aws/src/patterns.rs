//! Load-balanced Fargate service construct
//!
//! Expands to the roles, task definition, security groups, internet-facing
//! application load balancer, target group, listener and ECS service needed
//! to run one container behind HTTP.

use crate::ec2::{CfnSecurityGroup, SecurityGroupRule};
use crate::ecs::{
    AssignPublicIp, AwsVpcConfiguration, CfnService, CfnTaskDefinition, ContainerDefinition,
    DeploymentConfiguration, KeyValuePair, LogConfiguration, NetworkConfiguration, PortMapping,
    ServiceLoadBalancer,
};
use crate::elbv2::{CfnListener, CfnLoadBalancer, CfnTargetGroup, HealthCheck, ListenerAction, Scheme};
use crate::iam::{CfnPolicy, CfnRole, PolicyDocument, PolicyStatement};
use pms_cloud::intrinsic::get_att;
use pms_cloud::{CloudError, Resource, ResourceProperties, Result, Stack};
use serde_json::Value;
use std::collections::BTreeMap;

const ECS_TASKS_PRINCIPAL: &str = "ecs-tasks.amazonaws.com";

const ECR_PULL_ACTIONS: [&str; 3] = [
    "ecr:BatchCheckLayerAvailability",
    "ecr:GetDownloadUrlForLayer",
    "ecr:BatchGetImage",
];

const LOG_WRITE_ACTIONS: [&str; 2] = ["logs:CreateLogStream", "logs:PutLogEvents"];

/// Where the service's tasks and load balancer are placed
#[derive(Debug, Clone, PartialEq)]
pub struct ServicePlacement {
    pub vpc_id: Value,
    /// Subnets of the internet-facing load balancer
    pub public_subnets: Vec<Value>,
    /// Subnets the tasks run in
    pub private_subnets: Vec<Value>,
}

/// Log group the container ships its output to
#[derive(Debug, Clone, PartialEq)]
pub struct LogDestination {
    pub group_name: Value,
    pub group_arn: Value,
    pub stream_prefix: String,
}

/// Container image and where it is pulled from
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerImage {
    pub image: Value,
    /// Repository ARN the execution role may pull from; `None` allows any
    pub repository_arn: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct LoadBalancedFargateService {
    pub cpu: u32,
    pub memory_mib: u32,
    pub desired_count: u32,
    pub listener_port: u16,
    pub container_port: u16,
    pub container_name: String,
    pub health_check_grace_period_seconds: u32,
    pub environment: BTreeMap<String, String>,
    pub health_check: HealthCheck,
}

/// Identifiers of a declared load-balanced service
#[derive(Debug, Clone, PartialEq)]
pub struct FargateServiceAttributes {
    pub service_logical_id: String,
    /// `Fn::GetAtt Service.Name`
    pub service_name: Value,
    pub task_definition_logical_id: String,
    /// `Ref` to the role the running container assumes
    pub task_role: Value,
    pub target_group_logical_id: String,
    pub target_group_arn: Value,
    pub target_group_full_name: Value,
    pub load_balancer_logical_id: String,
    pub load_balancer_full_name: Value,
    pub image: Value,
}

/// Check a Fargate CPU/memory combination
pub fn validate_task_size(cpu: u32, memory_mib: u32) -> Result<()> {
    let allowed = match cpu {
        256 => matches!(memory_mib, 512 | 1024 | 2048),
        512 => (1024..=4096).contains(&memory_mib) && memory_mib % 1024 == 0,
        1024 => (2048..=8192).contains(&memory_mib) && memory_mib % 1024 == 0,
        2048 => (4096..=16384).contains(&memory_mib) && memory_mib % 1024 == 0,
        4096 => (8192..=30720).contains(&memory_mib) && memory_mib % 1024 == 0,
        _ => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(CloudError::InvalidProperties {
            resource_type: CfnTaskDefinition::RESOURCE_TYPE.to_string(),
            message: format!("unsupported Fargate size: cpu {} / memory {} MiB", cpu, memory_mib),
        })
    }
}

impl LoadBalancedFargateService {
    /// Declare the service in `stack` under `id`, running in `cluster`
    pub fn build(
        &self,
        stack: &mut Stack,
        id: &str,
        cluster: Value,
        placement: &ServicePlacement,
        image: &ContainerImage,
        logs: &LogDestination,
    ) -> Result<FargateServiceAttributes> {
        validate_task_size(self.cpu, self.memory_mib)?;
        if placement.public_subnets.is_empty() || placement.private_subnets.is_empty() {
            return Err(CloudError::InvalidConfig(format!(
                "{}: load-balanced service needs public and private subnets",
                id
            )));
        }
        if self.desired_count == 0 {
            tracing::warn!(stack = %stack.name(), "{} has a desired count of 0", id);
        }

        // Roles
        let execution_role_id = format!("{}TaskDefExecutionRole", id);
        let execution_role = stack.add(&execution_role_id, &CfnRole::for_service(ECS_TASKS_PRINCIPAL))?;

        let any = || Value::String("*".into());
        let statements = vec![
            PolicyStatement::allow(
                ECR_PULL_ACTIONS,
                vec![image.repository_arn.clone().unwrap_or_else(any)],
            ),
            PolicyStatement::allow(["ecr:GetAuthorizationToken"], vec![any()]),
            PolicyStatement::allow(LOG_WRITE_ACTIONS, vec![logs.group_arn.clone()]),
        ];
        stack.add(
            format!("{}DefaultPolicy", execution_role_id),
            &CfnPolicy {
                policy_name: format!("{}DefaultPolicy", execution_role_id),
                policy_document: PolicyDocument::new(statements),
                roles: vec![execution_role],
            },
        )?;

        let task_role_id = format!("{}TaskDefTaskRole", id);
        let task_role = stack.add(&task_role_id, &CfnRole::for_service(ECS_TASKS_PRINCIPAL))?;

        // Task definition
        let container = ContainerDefinition {
            name: self.container_name.clone(),
            image: image.image.clone(),
            essential: true,
            port_mappings: vec![PortMapping {
                container_port: self.container_port,
                protocol: "tcp".to_string(),
            }],
            environment: self
                .environment
                .iter()
                .map(|(name, value)| KeyValuePair {
                    name: name.clone(),
                    value: value.clone(),
                })
                .collect(),
            log_configuration: Some(LogConfiguration::aws_logs(
                logs.group_name.clone(),
                &logs.stream_prefix,
                stack.region_value(),
            )),
        };

        let task_definition_id = format!("{}TaskDef", id);
        let task_definition = stack.add(
            &task_definition_id,
            &CfnTaskDefinition {
                family: format!("{}{}", stack.name().replace('-', ""), task_definition_id),
                cpu: self.cpu.to_string(),
                memory: self.memory_mib.to_string(),
                network_mode: "awsvpc".to_string(),
                requires_compatibilities: vec!["FARGATE".to_string()],
                execution_role_arn: get_att(&execution_role_id, "Arn"),
                task_role_arn: get_att(&task_role_id, "Arn"),
                container_definitions: vec![container],
            },
        )?;

        // Security groups
        let lb_sg_id = format!("{}LBSecurityGroup", id);
        stack.add(
            &lb_sg_id,
            &CfnSecurityGroup {
                group_description: format!("{}/{}/LB/SecurityGroup", stack.name(), id),
                vpc_id: placement.vpc_id.clone(),
                security_group_ingress: vec![SecurityGroupRule::tcp_from_anywhere(self.listener_port)],
                security_group_egress: vec![SecurityGroupRule::all_outbound()],
            },
        )?;
        let lb_sg = get_att(&lb_sg_id, "GroupId");

        let service_sg_id = format!("{}ServiceSecurityGroup", id);
        stack.add(
            &service_sg_id,
            &CfnSecurityGroup {
                group_description: format!("{}/{}/Service/SecurityGroup", stack.name(), id),
                vpc_id: placement.vpc_id.clone(),
                security_group_ingress: vec![SecurityGroupRule::tcp_from_group(
                    self.container_port,
                    lb_sg.clone(),
                )],
                security_group_egress: vec![SecurityGroupRule::all_outbound()],
            },
        )?;

        // Load balancer
        let lb_id = format!("{}LB", id);
        let load_balancer = stack.add(
            &lb_id,
            &CfnLoadBalancer {
                load_balancer_type: "application".to_string(),
                scheme: Scheme::InternetFacing,
                subnets: placement.public_subnets.clone(),
                security_groups: vec![lb_sg],
            },
        )?;

        let target_group_id = format!("{}LBPublicListenerECSGroup", id);
        let mut target_group = CfnTargetGroup::http_ip(self.container_port, placement.vpc_id.clone());
        target_group.configure_health_check(&self.health_check);
        let target_group_arn = stack.add(&target_group_id, &target_group)?;

        let listener_id = format!("{}LBPublicListener", id);
        stack.add(
            &listener_id,
            &CfnListener {
                load_balancer_arn: load_balancer,
                port: self.listener_port,
                protocol: "HTTP".to_string(),
                default_actions: vec![ListenerAction::forward(target_group_arn.clone())],
            },
        )?;

        // Service
        let service_id = format!("{}Service", id);
        let service = Resource::from_properties(&CfnService {
            cluster,
            launch_type: "FARGATE".to_string(),
            desired_count: self.desired_count,
            task_definition,
            health_check_grace_period_seconds: self.health_check_grace_period_seconds,
            deployment_configuration: DeploymentConfiguration::default(),
            load_balancers: vec![ServiceLoadBalancer {
                container_name: self.container_name.clone(),
                container_port: self.container_port,
                target_group_arn: target_group_arn.clone(),
            }],
            network_configuration: NetworkConfiguration {
                awsvpc_configuration: AwsVpcConfiguration {
                    assign_public_ip: AssignPublicIp::Disabled,
                    subnets: placement.private_subnets.clone(),
                    security_groups: vec![get_att(&service_sg_id, "GroupId")],
                },
            },
        })?
        .with_dependency(&listener_id)
        .with_dependency(&task_role_id);
        stack.add_resource(&service_id, service)?;

        tracing::debug!(
            stack = %stack.name(),
            desired_count = self.desired_count,
            "Declared load-balanced Fargate service {}",
            id
        );

        Ok(FargateServiceAttributes {
            service_name: get_att(&service_id, "Name"),
            service_logical_id: service_id,
            task_definition_logical_id: task_definition_id,
            task_role,
            target_group_full_name: get_att(&target_group_id, "TargetGroupFullName"),
            target_group_arn,
            target_group_logical_id: target_group_id,
            load_balancer_full_name: get_att(&lb_id, "LoadBalancerFullName"),
            load_balancer_logical_id: lb_id,
            image: image.image.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pms_cloud::StackEnv;
    use serde_json::json;

    fn placement() -> ServicePlacement {
        ServicePlacement {
            vpc_id: json!({"Ref": "Vpc"}),
            public_subnets: vec![json!({"Ref": "PublicA"}), json!({"Ref": "PublicB"})],
            private_subnets: vec![json!({"Ref": "PrivateA"}), json!({"Ref": "PrivateB"})],
        }
    }

    fn logs() -> LogDestination {
        LogDestination {
            group_name: json!({"Ref": "LogGroup"}),
            group_arn: json!({"Fn::GetAtt": ["LogGroup", "Arn"]}),
            stream_prefix: "app".to_string(),
        }
    }

    fn service() -> LoadBalancedFargateService {
        LoadBalancedFargateService {
            cpu: 256,
            memory_mib: 512,
            desired_count: 1,
            listener_port: 8080,
            container_port: 80,
            container_name: "web".to_string(),
            health_check_grace_period_seconds: 30,
            environment: BTreeMap::new(),
            health_check: HealthCheck::default(),
        }
    }

    fn build(service: &LoadBalancedFargateService) -> (Stack, FargateServiceAttributes) {
        let mut stack = Stack::new("Svc", StackEnv::new(None, "us-east-2"));
        let attrs = service
            .build(
                &mut stack,
                "Web",
                json!({"Ref": "Cluster"}),
                &placement(),
                &ContainerImage {
                    image: json!("repo:v1"),
                    repository_arn: None,
                },
                &logs(),
            )
            .unwrap();
        (stack, attrs)
    }

    #[test]
    fn test_declares_full_service_graph() {
        let (stack, attrs) = build(&service());

        assert_eq!(stack.resource_count("AWS::ElasticLoadBalancingV2::LoadBalancer"), 1);
        assert_eq!(stack.resource_count("AWS::ElasticLoadBalancingV2::TargetGroup"), 1);
        assert_eq!(stack.resource_count("AWS::ElasticLoadBalancingV2::Listener"), 1);
        assert_eq!(stack.resource_count("AWS::ECS::Service"), 1);
        assert_eq!(stack.resource_count("AWS::IAM::Role"), 2);
        assert_eq!(stack.resource_count("AWS::EC2::SecurityGroup"), 2);

        let service = stack.resource(&attrs.service_logical_id).unwrap();
        assert!(service.depends_on.contains(&"WebLBPublicListener".to_string()));
        assert_eq!(attrs.service_name, json!({"Fn::GetAtt": ["WebService", "Name"]}));
        assert_eq!(attrs.target_group_arn, json!({"Ref": "WebLBPublicListenerECSGroup"}));
        assert_eq!(attrs.task_role, json!({"Ref": "WebTaskDefTaskRole"}));
    }

    #[test]
    fn test_listener_and_target_group_ports() {
        let mut service = service();
        service.health_check.path = "/ready".to_string();
        let (stack, attrs) = build(&service);

        let target_group = stack.resource(&attrs.target_group_logical_id).unwrap();
        assert_eq!(target_group.property("Port").unwrap(), 80);
        assert_eq!(target_group.property("HealthCheckPath").unwrap(), "/ready");

        let listener = stack.resource("WebLBPublicListener").unwrap();
        assert_eq!(listener.property("Port").unwrap(), 8080);
        assert_eq!(
            listener.property("DefaultActions").unwrap()[0]["TargetGroupArn"],
            attrs.target_group_arn
        );

        let service = stack.resource(&attrs.service_logical_id).unwrap();
        assert_eq!(service.property("HealthCheckGracePeriodSeconds").unwrap(), 30);
    }

    #[test]
    fn test_service_runs_in_private_subnets() {
        let (stack, attrs) = build(&service());
        let service = stack.resource(&attrs.service_logical_id).unwrap();
        let network = service.property("NetworkConfiguration").unwrap();
        assert_eq!(network["AwsvpcConfiguration"]["AssignPublicIp"], "DISABLED");
        assert_eq!(network["AwsvpcConfiguration"]["Subnets"][0], json!({"Ref": "PrivateA"}));

        let lb = stack.resource(&attrs.load_balancer_logical_id).unwrap();
        assert_eq!(lb.property("Scheme").unwrap(), "internet-facing");
        assert_eq!(lb.property("Subnets").unwrap()[1], json!({"Ref": "PublicB"}));
    }

    #[test]
    fn test_container_environment_and_logging() {
        let mut service = service();
        service.environment.insert("MODE".to_string(), "test".to_string());
        let (stack, attrs) = build(&service);

        let task = stack.resource(&attrs.task_definition_logical_id).unwrap();
        let container = &task.property("ContainerDefinitions").unwrap()[0];
        assert_eq!(container["Environment"], json!([{"Name": "MODE", "Value": "test"}]));
        assert_eq!(container["LogConfiguration"]["Options"]["awslogs-stream-prefix"], "app");
        assert_eq!(container["LogConfiguration"]["Options"]["awslogs-region"], "us-east-2");
        assert_eq!(task.property("NetworkMode").unwrap(), "awsvpc");
    }

    #[test]
    fn test_invalid_task_size() {
        assert!(validate_task_size(512, 1024).is_ok());
        assert!(validate_task_size(256, 4096).is_err());
        assert!(validate_task_size(300, 1024).is_err());
    }

    #[test]
    fn test_requires_subnets() {
        let mut stack = Stack::new("Svc", StackEnv::new(None, "us-east-2"));
        let mut empty = placement();
        empty.public_subnets.clear();
        let result = service().build(
            &mut stack,
            "Web",
            json!({"Ref": "Cluster"}),
            &empty,
            &ContainerImage {
                image: json!("repo:v1"),
                repository_arn: None,
            },
            &logs(),
        );
        assert!(result.is_err());
    }
}
