//! Configuration surface
//!
//! The process environment is read exactly once, into [`ProcessEnv`].
//! Context values come from an optional `cdk.json` style file and from
//! `-c key=value` arguments, the latter taking precedence.

use crate::environment::{self, ResolvedEnvironment};
use crate::error::{InfraError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_IMAGE_TAG: &str = "latest";

/// Snapshot of the environment variables the deployment reads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessEnv {
    /// `DEPLOY_ENV`
    pub deploy_env: Option<String>,
    /// `CDK_DEFAULT_REGION`
    pub default_region: Option<String>,
    /// `GITHUB_RUN_ID`
    pub github_run_id: Option<String>,
    /// `UNIQUE_ID`
    pub unique_id: Option<String>,
    /// `CDK_DEFAULT_ACCOUNT`
    pub default_account: Option<String>,
    /// `ECR_IMAGE_TAG`
    pub image_tag: Option<String>,
    /// `NOTIFICATION_EMAIL`
    pub notification_email: Option<String>,
}

impl ProcessEnv {
    pub const VARIABLES: [&'static str; 7] = [
        "DEPLOY_ENV",
        "CDK_DEFAULT_REGION",
        "GITHUB_RUN_ID",
        "UNIQUE_ID",
        "CDK_DEFAULT_ACCOUNT",
        "ECR_IMAGE_TAG",
        "NOTIFICATION_EMAIL",
    ];

    /// Read the current process environment
    pub fn capture() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_map(vars: &BTreeMap<String, String>) -> Self {
        Self::from_lookup(|name| vars.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            deploy_env: lookup("DEPLOY_ENV"),
            default_region: lookup("CDK_DEFAULT_REGION"),
            github_run_id: lookup("GITHUB_RUN_ID"),
            unique_id: lookup("UNIQUE_ID"),
            default_account: lookup("CDK_DEFAULT_ACCOUNT"),
            image_tag: lookup("ECR_IMAGE_TAG"),
            notification_email: lookup("NOTIFICATION_EMAIL"),
        }
    }
}

/// Context key/value pairs handed to the app
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Context {
    values: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct ContextFile {
    #[serde(default)]
    context: BTreeMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the `context` object of a `cdk.json` style file
    ///
    /// Non-string values (feature flags and the like) are kept in their
    /// JSON text form.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| InfraError::ContextFileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ContextFile =
            serde_json::from_str(&content).map_err(|e| InfraError::ContextFileFormat {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let values = file
            .context
            .into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect();
        tracing::debug!("Loaded context file: {}", path.display());
        Ok(Self { values })
    }

    /// Parse one `key=value` argument
    pub fn parse_arg(arg: &str) -> Result<(String, String)> {
        match arg.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => Err(InfraError::InvalidContextArg(arg.to_string())),
        }
    }

    /// Apply `key=value` arguments on top of the current values
    pub fn apply_args<I, S>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            let (key, value) = Self::parse_arg(arg.as_ref())?;
            self.values.insert(key, value);
        }
        Ok(())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, String)> for Context {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Everything the orchestrator needs to build the stacks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployConfig {
    pub environment: ResolvedEnvironment,
    pub account: Option<String>,
    pub image_tag: String,
    pub notification_email: Option<String>,
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

impl DeployConfig {
    pub fn resolve(context: &Context, env: &ProcessEnv) -> Self {
        let environment = environment::resolve(context, env);
        let config = Self {
            environment,
            account: non_empty(env.default_account.as_ref()),
            image_tag: non_empty(env.image_tag.as_ref())
                .unwrap_or_else(|| DEFAULT_IMAGE_TAG.to_string()),
            notification_email: non_empty(env.notification_email.as_ref()),
        };

        tracing::debug!(
            env = %config.environment.name,
            region = %config.environment.region,
            image_tag = %config.image_tag,
            "Resolved deploy configuration"
        );
        if config.account.is_none() {
            tracing::debug!("CDK_DEFAULT_ACCOUNT is not set; stacks are account-agnostic");
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_process_env_from_map() {
        let vars: BTreeMap<String, String> = [
            ("DEPLOY_ENV", "prod"),
            ("ECR_IMAGE_TAG", "v7"),
            ("UNRELATED", "x"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let env = ProcessEnv::from_map(&vars);
        assert_eq!(env.deploy_env.as_deref(), Some("prod"));
        assert_eq!(env.image_tag.as_deref(), Some("v7"));
        assert!(env.notification_email.is_none());
    }

    #[test]
    fn test_parse_arg() {
        assert_eq!(
            Context::parse_arg("env=staging").unwrap(),
            ("env".to_string(), "staging".to_string())
        );
        assert_eq!(
            Context::parse_arg("url=http://a=b").unwrap(),
            ("url".to_string(), "http://a=b".to_string())
        );
        assert!(Context::parse_arg("env").is_err());
        assert!(Context::parse_arg("=value").is_err());
    }

    #[test]
    fn test_args_override_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("cdk.json");
        fs::write(
            &path,
            r#"{"app": "pms-infra", "context": {"env": "qa", "region": "eu-west-1", "@aws-cdk/flag": true}}"#,
        )
        .unwrap();

        let mut context = Context::from_file(&path).unwrap();
        context.apply_args(["env=staging"]).unwrap();

        assert_eq!(context.get("env"), Some("staging"));
        assert_eq!(context.get("region"), Some("eu-west-1"));
        assert_eq!(context.get("@aws-cdk/flag"), Some("true"));
    }

    #[test]
    fn test_context_file_errors() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("missing.json");
        assert!(matches!(
            Context::from_file(&missing),
            Err(InfraError::ContextFileRead { .. })
        ));

        let broken = temp_dir.path().join("cdk.json");
        fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            Context::from_file(&broken),
            Err(InfraError::ContextFileFormat { .. })
        ));
    }

    #[test]
    fn test_deploy_config_defaults() {
        let config = DeployConfig::resolve(&Context::new(), &ProcessEnv::default());
        assert_eq!(config.image_tag, "latest");
        assert!(config.account.is_none());
        assert!(config.notification_email.is_none());
    }

    #[test]
    fn test_empty_email_is_absent() {
        let env = ProcessEnv {
            notification_email: Some(String::new()),
            image_tag: Some(String::new()),
            default_account: Some("123456789012".to_string()),
            ..Default::default()
        };
        let config = DeployConfig::resolve(&Context::new(), &env);
        assert!(config.notification_email.is_none());
        assert_eq!(config.image_tag, "latest");
        assert_eq!(config.account.as_deref(), Some("123456789012"));
    }
}
