//! Compute stack: Fargate service behind a public load balancer
//!
//! Besides the service itself this stack owns the log group, the alarm
//! topic and its optional e-mail subscription, three health alarms and the
//! task role's access to the Products table.

use crate::error::Result;
use crate::stacks::database::TABLE_BASE_NAME;
use crate::stacks::network::VpcHandle;
use crate::stacks::registry::RegistryHandle;
use pms_cloud::intrinsic::{get_att, join};
use pms_cloud::{Output, RemovalPolicy, Resource, Stack};
use pms_cloud_aws::cloudwatch::{Alarm, ComparisonOperator, Metric, TreatMissingData};
use pms_cloud_aws::ecr;
use pms_cloud_aws::ecs::{CfnCluster, ContainerInsights};
use pms_cloud_aws::elbv2::HealthCheck;
use pms_cloud_aws::iam::{CfnPolicy, PolicyDocument, PolicyStatement};
use pms_cloud_aws::logs::{CfnLogGroup, RetentionDays};
use pms_cloud_aws::patterns::{
    ContainerImage, LoadBalancedFargateService, LogDestination, ServicePlacement,
};
use pms_cloud_aws::sns::{CfnSubscription, CfnTopic};
use serde_json::Value;
use std::collections::BTreeMap;

pub const LOG_GROUP_ID: &str = "ProductManagementLogs";
pub const TOPIC_ID: &str = "ProductManagementAlarms";
pub const SUBSCRIPTION_ID: &str = "ProductManagementAlarmsEmailSubscription";
pub const CLUSTER_ID: &str = "ProductManagementCluster";
pub const SERVICE_ID: &str = "ProductManagementFargateService";
pub const CPU_ALARM_ID: &str = "CpuUsageAlarm";
pub const MEMORY_ALARM_ID: &str = "MemoryUsageAlarm";
pub const HEALTH_ALARM_ID: &str = "ServiceHealthAlarm";
pub const TABLE_POLICY_ID: &str = "ProductsTableAccessPolicy";

pub const CPU_UNITS: u32 = 512;
pub const MEMORY_MIB: u32 = 1024;
pub const DESIRED_COUNT: u32 = 2;
pub const HTTP_PORT: u16 = 80;
pub const HEALTH_CHECK_GRACE_SECONDS: u32 = 60;
pub const HEALTH_CHECK_PATH: &str = "/health";
pub const LOG_STREAM_PREFIX: &str = "product-management";
pub const CONTAINER_NAME: &str = "web";

/// Item and table actions the CRUD service needs
pub const TABLE_ACTIONS: [&str; 7] = [
    "dynamodb:DescribeTable",
    "dynamodb:Query",
    "dynamodb:Scan",
    "dynamodb:GetItem",
    "dynamodb:PutItem",
    "dynamodb:UpdateItem",
    "dynamodb:DeleteItem",
];

/// Handles and settings the compute stack is built from
#[derive(Debug, Clone, Copy)]
pub struct ComputeInputs<'a> {
    pub network: &'a VpcHandle,
    pub registry: &'a RegistryHandle,
    pub image_tag: &'a str,
    /// Address subscribed to the alarm topic; empty counts as absent
    pub notification_email: Option<&'a str>,
}

/// What the compute stack declared
#[derive(Debug, Clone, PartialEq)]
pub struct ComputeService {
    pub cluster_name: Value,
    pub service_name: Value,
    pub target_group_arn: Value,
    pub image: Value,
    pub desired_count: u32,
    pub log_group_name: String,
    pub topic_name: String,
    pub alarm_names: Vec<String>,
    pub subscribed_email: Option<String>,
}

/// Fixed container environment
///
/// `DYNAMODB_TABLE_NAME` is the unsuffixed base name, not the name of the
/// table the database stack declares.
pub fn container_environment() -> BTreeMap<String, String> {
    [
        ("ASPNETCORE_ENVIRONMENT", "Production"),
        ("DYNAMODB_TABLE_NAME", TABLE_BASE_NAME),
        ("ASPNETCORE_URLS", "http://+:80"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// `arn:aws:dynamodb:{region}:{account}:table/Products`
///
/// Built from the base table name rather than from the database stack's
/// handle, so it does not match `Products-{env}`.
pub fn products_table_arn(stack: &Stack) -> Value {
    let region = &stack.env().region;
    match stack.account_value() {
        Value::String(account) => Value::String(format!(
            "arn:aws:dynamodb:{}:{}:table/{}",
            region, account, TABLE_BASE_NAME
        )),
        account => join(
            "",
            vec![
                Value::String(format!("arn:aws:dynamodb:{}:", region)),
                account,
                Value::String(format!(":table/{}", TABLE_BASE_NAME)),
            ],
        ),
    }
}

fn declare_alarm(stack: &mut Stack, id: &str, alarm: &Alarm, topic: &Value) -> Result<()> {
    let props = alarm.to_cfn(vec![topic.clone()])?;
    stack.add(id, &props)?;
    Ok(())
}

#[tracing::instrument(skip_all, fields(stack = %stack.name()))]
pub fn build(stack: &mut Stack, inputs: ComputeInputs<'_>) -> Result<ComputeService> {
    let stack_id = stack.name().to_string();
    stack.set_description("Product Management System Fargate service");

    // Log group
    let log_group_name = format!("/ecs/product-management-{}", stack_id);
    let log_group = Resource::from_properties(&CfnLogGroup::new(&log_group_name, RetentionDays::OneWeek))?
        .with_removal_policy(RemovalPolicy::Destroy);
    let log_group_ref = stack.add_resource(LOG_GROUP_ID, log_group)?;

    // Alarm topic
    let topic_name = format!("product-management-alarms-{}", stack_id.to_lowercase());
    let topic = stack.add(
        TOPIC_ID,
        &CfnTopic {
            topic_name: topic_name.clone(),
        },
    )?;

    let subscribed_email = inputs
        .notification_email
        .filter(|email| !email.is_empty())
        .map(str::to_string);
    match &subscribed_email {
        Some(email) => {
            stack.add(SUBSCRIPTION_ID, &CfnSubscription::email(topic.clone(), email))?;
            tracing::info!("Alarm notifications go to {}", email);
        }
        None => tracing::warn!("NOTIFICATION_EMAIL not set; alarm topic has no subscribers"),
    }

    // Cluster
    let cluster = stack.add(
        CLUSTER_ID,
        &CfnCluster::with_container_insights(ContainerInsights::Enabled),
    )?;

    // Cross-stack inputs
    let placement = ServicePlacement {
        vpc_id: stack.import(inputs.network.vpc_id()),
        public_subnets: inputs
            .network
            .public_subnets()
            .iter()
            .map(|s| stack.import(s))
            .collect(),
        private_subnets: inputs
            .network
            .private_subnets()
            .iter()
            .map(|s| stack.import(s))
            .collect(),
    };
    let repository_arn = stack.import(inputs.registry.arn_ref());
    let repository_name = stack.import(inputs.registry.name_ref());
    let image = ContainerImage {
        image: ecr::image_uri(repository_arn.clone(), repository_name, inputs.image_tag),
        repository_arn: Some(repository_arn),
    };

    // Service
    let service = LoadBalancedFargateService {
        cpu: CPU_UNITS,
        memory_mib: MEMORY_MIB,
        desired_count: DESIRED_COUNT,
        listener_port: HTTP_PORT,
        container_port: HTTP_PORT,
        container_name: CONTAINER_NAME.to_string(),
        health_check_grace_period_seconds: HEALTH_CHECK_GRACE_SECONDS,
        environment: container_environment(),
        health_check: HealthCheck {
            path: HEALTH_CHECK_PATH.to_string(),
            healthy_http_codes: "200".to_string(),
            interval_seconds: None,
        },
    };
    let attrs = service.build(
        stack,
        SERVICE_ID,
        cluster.clone(),
        &placement,
        &image,
        &LogDestination {
            group_name: log_group_ref,
            group_arn: get_att(LOG_GROUP_ID, "Arn"),
            stream_prefix: LOG_STREAM_PREFIX.to_string(),
        },
    )?;

    // Alarms
    let alarms = [
        (
            CPU_ALARM_ID,
            Alarm {
                alarm_name: format!("{}-high-cpu-usage", stack_id),
                description: Some("Alert when CPU usage is high".to_string()),
                metric: Metric::ecs_cpu_utilization(cluster.clone(), attrs.service_name.clone()),
                threshold: 80.0,
                evaluation_periods: 3,
                datapoints_to_alarm: 2,
                comparison_operator: ComparisonOperator::GreaterThanOrEqualToThreshold,
                treat_missing_data: TreatMissingData::Breaching,
            },
        ),
        (
            MEMORY_ALARM_ID,
            Alarm {
                alarm_name: format!("{}-high-memory-usage", stack_id),
                description: Some("Alert when memory usage is high".to_string()),
                metric: Metric::ecs_memory_utilization(cluster.clone(), attrs.service_name.clone()),
                threshold: 80.0,
                evaluation_periods: 3,
                datapoints_to_alarm: 2,
                comparison_operator: ComparisonOperator::GreaterThanOrEqualToThreshold,
                treat_missing_data: TreatMissingData::Breaching,
            },
        ),
        (
            HEALTH_ALARM_ID,
            Alarm {
                alarm_name: format!("{}-unhealthy-hosts", stack_id),
                description: Some("Alert when there are unhealthy hosts".to_string()),
                metric: Metric::alb_unhealthy_host_count(
                    attrs.load_balancer_full_name.clone(),
                    attrs.target_group_full_name.clone(),
                ),
                threshold: 1.0,
                evaluation_periods: 2,
                datapoints_to_alarm: 2,
                comparison_operator: ComparisonOperator::GreaterThanOrEqualToThreshold,
                treat_missing_data: TreatMissingData::Breaching,
            },
        ),
    ];
    let mut alarm_names = Vec::with_capacity(alarms.len());
    for (id, alarm) in &alarms {
        declare_alarm(stack, id, alarm, &topic)?;
        alarm_names.push(alarm.alarm_name.clone());
    }

    // Table access for the task role
    let table_arn = products_table_arn(stack);
    stack.add(
        TABLE_POLICY_ID,
        &CfnPolicy {
            policy_name: TABLE_POLICY_ID.to_string(),
            policy_document: PolicyDocument::new(vec![PolicyStatement::allow(
                TABLE_ACTIONS,
                vec![table_arn],
            )]),
            roles: vec![attrs.task_role.clone()],
        },
    )?;

    // Outputs
    stack.add_output("ClusterName", Output::new(cluster.clone()))?;
    stack.add_output("ServiceName", Output::new(attrs.service_name.clone()))?;
    stack.add_output("TargetGroupArn", Output::new(attrs.target_group_arn.clone()))?;

    tracing::info!(
        image_tag = %inputs.image_tag,
        desired_count = DESIRED_COUNT,
        alarms = alarm_names.len(),
        "Fargate service declared"
    );

    Ok(ComputeService {
        cluster_name: cluster,
        service_name: attrs.service_name,
        target_group_arn: attrs.target_group_arn,
        image: attrs.image,
        desired_count: DESIRED_COUNT,
        log_group_name,
        topic_name,
        alarm_names,
        subscribed_email,
    })
}
