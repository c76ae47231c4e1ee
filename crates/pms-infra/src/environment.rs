//! Environment resolution
//!
//! Every field is resolved as explicit context entry, then process
//! environment variable, then a literal default. The first non-empty value
//! wins, so an empty override behaves as if it were unset.

use crate::config::{Context, ProcessEnv};
use serde::Serialize;

pub const DEFAULT_ENV: &str = "dev";
pub const DEFAULT_REGION: &str = "us-east-2";

/// Environment name, region and uniqueness suffix of one deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEnvironment {
    pub name: String,
    pub region: String,
    /// Empty when no suffix should be appended
    pub unique_suffix: String,
}

impl ResolvedEnvironment {
    /// `{base}-{suffix}`, or `base` when there is no suffix
    pub fn with_suffix(&self, base: &str) -> String {
        if self.unique_suffix.is_empty() {
            base.to_string()
        } else {
            format!("{}-{}", base, self.unique_suffix)
        }
    }
}

fn first_non_empty<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Option<&'a str> {
    candidates.into_iter().flatten().find(|v| !v.is_empty())
}

/// Resolve the deployment environment. Never fails.
pub fn resolve(context: &Context, env: &ProcessEnv) -> ResolvedEnvironment {
    let name = first_non_empty([context.get("env"), env.deploy_env.as_deref()])
        .unwrap_or(DEFAULT_ENV);
    let region = first_non_empty([context.get("region"), env.default_region.as_deref()])
        .unwrap_or(DEFAULT_REGION);
    let unique_suffix = first_non_empty([
        context.get("uniqueId"),
        env.github_run_id.as_deref(),
        env.unique_id.as_deref(),
    ])
    .unwrap_or_default();

    ResolvedEnvironment {
        name: name.to_string(),
        region: region.to_string(),
        unique_suffix: unique_suffix.to_string(),
    }
}
