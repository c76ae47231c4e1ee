//! Application load balancer properties

use pms_cloud::ResourceProperties;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scheme {
    InternetFacing,
    Internal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnLoadBalancer {
    #[serde(rename = "Type")]
    pub load_balancer_type: String,
    pub scheme: Scheme,
    pub subnets: Vec<Value>,
    pub security_groups: Vec<Value>,
}

impl ResourceProperties for CfnLoadBalancer {
    const RESOURCE_TYPE: &'static str = "AWS::ElasticLoadBalancingV2::LoadBalancer";
}

/// Target group health check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub path: String,
    /// Comma-separated list or range of HTTP codes (e.g., "200", "200-299")
    pub healthy_http_codes: String,
    pub interval_seconds: Option<u32>,
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            healthy_http_codes: "200".to_string(),
            interval_seconds: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Matcher {
    pub http_code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnTargetGroup {
    pub port: u16,
    pub protocol: String,
    pub target_type: String,
    pub vpc_id: Value,
    pub health_check_path: String,
    pub matcher: Matcher,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check_interval_seconds: Option<u32>,
}

impl CfnTargetGroup {
    /// HTTP target group of IP targets
    pub fn http_ip(port: u16, vpc_id: Value) -> Self {
        let mut group = Self {
            port,
            protocol: "HTTP".to_string(),
            target_type: "ip".to_string(),
            vpc_id,
            health_check_path: String::new(),
            matcher: Matcher {
                http_code: String::new(),
            },
            health_check_interval_seconds: None,
        };
        group.configure_health_check(&HealthCheck::default());
        group
    }

    pub fn configure_health_check(&mut self, health_check: &HealthCheck) {
        self.health_check_path = health_check.path.clone();
        self.matcher.http_code = health_check.healthy_http_codes.clone();
        self.health_check_interval_seconds = health_check.interval_seconds;
    }
}

impl ResourceProperties for CfnTargetGroup {
    const RESOURCE_TYPE: &'static str = "AWS::ElasticLoadBalancingV2::TargetGroup";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListenerAction {
    #[serde(rename = "Type")]
    pub action_type: String,
    pub target_group_arn: Value,
}

impl ListenerAction {
    pub fn forward(target_group_arn: Value) -> Self {
        Self {
            action_type: "forward".to_string(),
            target_group_arn,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnListener {
    pub load_balancer_arn: Value,
    pub port: u16,
    pub protocol: String,
    pub default_actions: Vec<ListenerAction>,
}

impl ResourceProperties for CfnListener {
    const RESOURCE_TYPE: &'static str = "AWS::ElasticLoadBalancingV2::Listener";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_health_check_is_applied() {
        let mut group = CfnTargetGroup::http_ip(80, json!({"Ref": "Vpc"}));
        assert_eq!(group.health_check_path, "/");

        group.configure_health_check(&HealthCheck {
            path: "/health".to_string(),
            healthy_http_codes: "200".to_string(),
            interval_seconds: None,
        });
        let value = serde_json::to_value(&group).unwrap();
        assert_eq!(value["HealthCheckPath"], "/health");
        assert_eq!(value["Matcher"]["HttpCode"], "200");
        assert_eq!(value["TargetType"], "ip");
    }

    #[test]
    fn test_scheme_spelling() {
        assert_eq!(
            serde_json::to_value(Scheme::InternetFacing).unwrap(),
            json!("internet-facing")
        );
    }
}
