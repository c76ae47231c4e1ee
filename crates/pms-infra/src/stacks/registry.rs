//! Container registry stack: one ECR repository per environment

use crate::environment::ResolvedEnvironment;
use crate::error::{InfraError, Result};
use pms_cloud::intrinsic::get_att;
use pms_cloud::{CrossStackRef, RemovalPolicy, Resource, Stack};
use pms_cloud_aws::ecr::{self, CfnRepository};

pub const REPOSITORY_ID: &str = "ProductManagementRepo";
pub const REPOSITORY_PREFIX: &str = "product-management-system";

/// Exported identity of the image repository
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryHandle {
    repository_name: String,
    name_ref: CrossStackRef,
    arn_ref: CrossStackRef,
}

impl RegistryHandle {
    /// Literal repository name
    pub fn repository_name(&self) -> &str {
        &self.repository_name
    }

    pub fn name_ref(&self) -> &CrossStackRef {
        &self.name_ref
    }

    pub fn arn_ref(&self) -> &CrossStackRef {
        &self.arn_ref
    }
}

/// `product-management-system-{env}[-{suffix}]`
pub fn repository_name(env: &ResolvedEnvironment) -> String {
    env.with_suffix(&format!("{}-{}", REPOSITORY_PREFIX, env.name))
}

#[tracing::instrument(skip_all, fields(stack = %stack.name()))]
pub fn build(stack: &mut Stack, env: &ResolvedEnvironment) -> Result<RegistryHandle> {
    stack.set_description("Product Management System container registry");
    let name = repository_name(env);
    if !ecr::is_valid_repository_name(&name) {
        return Err(InfraError::InvalidConfig(format!(
            "'{}' is not a valid repository name",
            name
        )));
    }

    let repository = Resource::from_properties(&CfnRepository {
        repository_name: name.clone(),
    })?
    .with_removal_policy(RemovalPolicy::Destroy);
    let name_value = stack.add_resource(REPOSITORY_ID, repository)?;

    let name_ref = stack.export("RepositoryName", name_value)?;
    let arn_ref = stack.export("RepositoryArn", get_att(REPOSITORY_ID, "Arn"))?;

    tracing::info!(repository = %name, "Repository declared");

    Ok(RegistryHandle {
        repository_name: name,
        name_ref,
        arn_ref,
    })
}
