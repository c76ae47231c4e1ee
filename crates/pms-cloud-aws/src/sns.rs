//! SNS topic and subscription properties

use pms_cloud::ResourceProperties;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnTopic {
    pub topic_name: String,
}

impl ResourceProperties for CfnTopic {
    const RESOURCE_TYPE: &'static str = "AWS::SNS::Topic";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionProtocol {
    Email,
    Https,
    Sqs,
    Lambda,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnSubscription {
    pub protocol: SubscriptionProtocol,
    pub topic_arn: Value,
    pub endpoint: String,
}

impl CfnSubscription {
    pub fn email(topic_arn: Value, address: impl Into<String>) -> Self {
        Self {
            protocol: SubscriptionProtocol::Email,
            topic_arn,
            endpoint: address.into(),
        }
    }
}

impl ResourceProperties for CfnSubscription {
    const RESOURCE_TYPE: &'static str = "AWS::SNS::Subscription";
}
