//! Intrinsic function helpers
//!
//! Values that are only known once the deployment engine applies a template
//! (resource ids, ARNs, imported exports) are expressed as intrinsic function
//! objects embedded in plain `serde_json::Value` trees.

use serde_json::{Value, json};

/// Pseudo parameter: the account the stack is deployed into
pub const ACCOUNT_ID: &str = "AWS::AccountId";

/// Pseudo parameter: the region the stack is deployed into
pub const REGION: &str = "AWS::Region";

/// Pseudo parameter: the domain suffix for the partition (`amazonaws.com`)
pub const URL_SUFFIX: &str = "AWS::URLSuffix";

/// `{"Ref": logical_id}`
pub fn ref_(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

/// `{"Fn::GetAtt": [logical_id, attribute]}`
pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

/// `{"Fn::Join": [separator, parts]}`
pub fn join(separator: &str, parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": [separator, parts] })
}

/// `{"Fn::Select": [index, list]}`
pub fn select(index: usize, list: Value) -> Value {
    json!({ "Fn::Select": [index, list] })
}

/// `{"Fn::Split": [delimiter, source]}`
pub fn split(delimiter: &str, source: Value) -> Value {
    json!({ "Fn::Split": [delimiter, source] })
}

/// `{"Fn::GetAZs": ""}` (availability zones of the stack's region)
pub fn get_azs() -> Value {
    json!({ "Fn::GetAZs": "" })
}

/// `{"Fn::ImportValue": export_name}`
pub fn import_value(export_name: &str) -> Value {
    json!({ "Fn::ImportValue": export_name })
}

/// A literal string if it is known at synthesis time, otherwise the given fallback token
pub fn literal_or(literal: Option<&str>, fallback: Value) -> Value {
    match literal {
        Some(s) if !s.is_empty() => Value::String(s.to_string()),
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_and_get_att_shapes() {
        assert_eq!(ref_("Vpc"), json!({"Ref": "Vpc"}));
        assert_eq!(
            get_att("Service", "Name"),
            json!({"Fn::GetAtt": ["Service", "Name"]})
        );
    }

    #[test]
    fn test_import_value_shape() {
        assert_eq!(
            import_value("NetworkStack-dev:VpcId"),
            json!({"Fn::ImportValue": "NetworkStack-dev:VpcId"})
        );
    }

    #[test]
    fn test_literal_or_falls_back_on_empty() {
        assert_eq!(literal_or(Some("123"), ref_(ACCOUNT_ID)), json!("123"));
        assert_eq!(literal_or(Some(""), ref_(ACCOUNT_ID)), ref_(ACCOUNT_ID));
        assert_eq!(literal_or(None, ref_(ACCOUNT_ID)), ref_(ACCOUNT_ID));
    }
}
