//! IAM roles, inline policies and policy documents

use pms_cloud::ResourceProperties;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

const POLICY_VERSION: &str = "2012-10-17";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub effect: Effect,
    pub action: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Value>,
}

impl PolicyStatement {
    /// Allow `actions` on `resources`
    pub fn allow<I, S>(actions: I, resources: Vec<Value>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let resource = match resources.len() {
            1 => resources.into_iter().next(),
            _ => Some(Value::Array(resources)),
        };
        Self {
            effect: Effect::Allow,
            action: actions.into_iter().map(Into::into).collect(),
            resource,
            principal: None,
        }
    }

    /// `sts:AssumeRole` trust for an AWS service principal
    pub fn assume_role_by_service(service: &str) -> Self {
        Self {
            effect: Effect::Allow,
            action: vec!["sts:AssumeRole".to_string()],
            resource: None,
            principal: Some(json!({ "Service": service })),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

impl PolicyDocument {
    pub fn new(statement: Vec<PolicyStatement>) -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnRole {
    pub assume_role_policy_document: PolicyDocument,
}

impl CfnRole {
    pub fn for_service(service: &str) -> Self {
        Self {
            assume_role_policy_document: PolicyDocument::new(vec![
                PolicyStatement::assume_role_by_service(service),
            ]),
        }
    }
}

impl ResourceProperties for CfnRole {
    const RESOURCE_TYPE: &'static str = "AWS::IAM::Role";
}

/// Inline policy attached to one or more roles
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnPolicy {
    pub policy_name: String,
    pub policy_document: PolicyDocument,
    pub roles: Vec<Value>,
}

impl ResourceProperties for CfnPolicy {
    const RESOURCE_TYPE: &'static str = "AWS::IAM::Policy";
}
