//! ECR repository properties

use pms_cloud::ResourceProperties;
use pms_cloud::intrinsic::{URL_SUFFIX, join, ref_, select, split};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnRepository {
    pub repository_name: String,
}

impl ResourceProperties for CfnRepository {
    const RESOURCE_TYPE: &'static str = "AWS::ECR::Repository";
}

/// Repository names: 2-256 chars, `/`-separated components of lowercase
/// alphanumeric runs joined by single `.`, `_` or `-`
pub fn is_valid_repository_name(name: &str) -> bool {
    (2..=256).contains(&name.len())
        && name.split('/').all(|component| {
            component.split(['.', '_', '-']).all(|run| {
                !run.is_empty() && run.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            })
        })
}

/// Image reference `{account}.dkr.ecr.{region}.{suffix}/{name}:{tag}` built from a repository ARN
///
/// The account and region are taken from the ARN so the reference also
/// works when the ARN is an imported value.
pub fn image_uri(repository_arn: Value, repository_name: Value, tag: &str) -> Value {
    let parts = split(":", repository_arn);
    join(
        "",
        vec![
            select(4, parts.clone()),
            Value::String(".dkr.ecr.".to_string()),
            select(3, parts),
            Value::String(".".to_string()),
            ref_(URL_SUFFIX),
            Value::String("/".to_string()),
            repository_name,
            Value::String(format!(":{}", tag)),
        ],
    )
}
