//! CloudWatch metrics and alarms

use pms_cloud::{CloudError, ResourceProperties, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_PERIOD_SECONDS: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    GreaterThanOrEqualToThreshold,
    GreaterThanThreshold,
    LessThanThreshold,
    LessThanOrEqualToThreshold,
}

/// How an alarm treats periods without datapoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TreatMissingData {
    Breaching,
    NotBreaching,
    Ignore,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statistic {
    Average,
    Sum,
    Minimum,
    Maximum,
    SampleCount,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dimension {
    pub name: String,
    pub value: Value,
}

impl Dimension {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A metric an alarm can watch
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Vec<Dimension>,
    pub statistic: Statistic,
    pub period_seconds: u32,
}

impl Metric {
    pub fn new(namespace: impl Into<String>, metric_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            metric_name: metric_name.into(),
            dimensions: Vec::new(),
            statistic: Statistic::Average,
            period_seconds: DEFAULT_PERIOD_SECONDS,
        }
    }

    pub fn with_dimension(mut self, name: impl Into<String>, value: Value) -> Self {
        self.dimensions.push(Dimension::new(name, value));
        self
    }

    /// Average CPU utilization of an ECS service
    pub fn ecs_cpu_utilization(cluster_name: Value, service_name: Value) -> Self {
        Self::new("AWS/ECS", "CPUUtilization")
            .with_dimension("ClusterName", cluster_name)
            .with_dimension("ServiceName", service_name)
    }

    /// Average memory utilization of an ECS service
    pub fn ecs_memory_utilization(cluster_name: Value, service_name: Value) -> Self {
        Self::new("AWS/ECS", "MemoryUtilization")
            .with_dimension("ClusterName", cluster_name)
            .with_dimension("ServiceName", service_name)
    }

    /// Unhealthy targets behind an application load balancer target group
    pub fn alb_unhealthy_host_count(load_balancer_full_name: Value, target_group_full_name: Value) -> Self {
        Self::new("AWS/ApplicationELB", "UnHealthyHostCount")
            .with_dimension("LoadBalancer", load_balancer_full_name)
            .with_dimension("TargetGroup", target_group_full_name)
    }
}

/// Threshold alarm definition
#[derive(Debug, Clone, PartialEq)]
pub struct Alarm {
    pub alarm_name: String,
    pub description: Option<String>,
    pub metric: Metric,
    pub threshold: f64,
    pub evaluation_periods: u32,
    pub datapoints_to_alarm: u32,
    pub comparison_operator: ComparisonOperator,
    pub treat_missing_data: TreatMissingData,
}

impl Alarm {
    /// Resource properties with `actions` fired on ALARM
    pub fn to_cfn(&self, actions: Vec<Value>) -> Result<CfnAlarm> {
        if self.evaluation_periods == 0 {
            return Err(CloudError::InvalidProperties {
                resource_type: CfnAlarm::RESOURCE_TYPE.to_string(),
                message: format!("{}: evaluation_periods must be positive", self.alarm_name),
            });
        }
        if self.datapoints_to_alarm == 0 || self.datapoints_to_alarm > self.evaluation_periods {
            return Err(CloudError::InvalidProperties {
                resource_type: CfnAlarm::RESOURCE_TYPE.to_string(),
                message: format!(
                    "{}: datapoints_to_alarm must be within 1..={}",
                    self.alarm_name, self.evaluation_periods
                ),
            });
        }

        Ok(CfnAlarm {
            alarm_name: self.alarm_name.clone(),
            alarm_description: self.description.clone(),
            namespace: self.metric.namespace.clone(),
            metric_name: self.metric.metric_name.clone(),
            dimensions: self.metric.dimensions.clone(),
            statistic: self.metric.statistic,
            period: self.metric.period_seconds,
            threshold: self.threshold,
            evaluation_periods: self.evaluation_periods,
            datapoints_to_alarm: self.datapoints_to_alarm,
            comparison_operator: self.comparison_operator,
            treat_missing_data: self.treat_missing_data,
            alarm_actions: actions,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnAlarm {
    pub alarm_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm_description: Option<String>,
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Vec<Dimension>,
    pub statistic: Statistic,
    pub period: u32,
    pub threshold: f64,
    pub evaluation_periods: u32,
    pub datapoints_to_alarm: u32,
    pub comparison_operator: ComparisonOperator,
    pub treat_missing_data: TreatMissingData,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alarm_actions: Vec<Value>,
}

impl ResourceProperties for CfnAlarm {
    const RESOURCE_TYPE: &'static str = "AWS::CloudWatch::Alarm";
}
