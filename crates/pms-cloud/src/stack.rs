//! Stacks: units of deployment that own a set of resources
//!
//! A stack exclusively owns the resources declared in it. Other stacks only
//! ever see a [`CrossStackRef`], which resolves to an `Fn::ImportValue` of an
//! export the producing stack declared up front. Producers are therefore
//! never mutated by their consumers.

use crate::error::{CloudError, Result};
use crate::intrinsic;
use crate::template::{Output, Resource, ResourceProperties, Template};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Deployment target of a stack
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackEnv {
    /// Account id; `None` leaves the account to the deployment engine
    pub account: Option<String>,

    /// Region (e.g., "us-east-2")
    pub region: String,
}

impl StackEnv {
    pub fn new(account: Option<String>, region: impl Into<String>) -> Self {
        Self {
            account: account.filter(|a| !a.is_empty()),
            region: region.into(),
        }
    }
}

/// Read-only reference to a value exported by another stack
#[derive(Debug, Clone, PartialEq)]
pub struct CrossStackRef {
    producer: String,
    export_name: String,
    value: Value,
}

impl CrossStackRef {
    /// Name of the stack that owns the referenced value
    pub fn producer(&self) -> &str {
        &self.producer
    }

    pub fn export_name(&self) -> &str {
        &self.export_name
    }
}

/// A stack under construction
#[derive(Debug, Clone)]
pub struct Stack {
    name: String,
    env: StackEnv,
    template: Template,
    dependencies: BTreeSet<String>,
}

impl Stack {
    pub fn new(name: impl Into<String>, env: StackEnv) -> Self {
        Self {
            name: name.into(),
            env,
            template: Template::new(),
            dependencies: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn env(&self) -> &StackEnv {
        &self.env
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Names of the stacks this stack imports from
    pub fn dependencies(&self) -> &BTreeSet<String> {
        &self.dependencies
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.template.description = Some(description.into());
    }

    /// Declare a resource and return a `Ref` to it
    pub fn add_resource(&mut self, logical_id: impl Into<String>, resource: Resource) -> Result<Value> {
        let logical_id = logical_id.into();
        if self.template.resources.contains_key(&logical_id) {
            return Err(CloudError::ResourceAlreadyExists {
                stack: self.name.clone(),
                logical_id,
            });
        }

        tracing::debug!(
            stack = %self.name,
            logical_id = %logical_id,
            resource_type = %resource.resource_type,
            "Declared resource"
        );
        let reference = intrinsic::ref_(&logical_id);
        self.template.resources.insert(logical_id, resource);
        Ok(reference)
    }

    /// Declare a resource from typed properties
    pub fn add<P: ResourceProperties>(&mut self, logical_id: impl Into<String>, props: &P) -> Result<Value> {
        let resource = Resource::from_properties(props)?;
        self.add_resource(logical_id, resource)
    }

    pub fn add_output(&mut self, name: impl Into<String>, output: Output) -> Result<()> {
        let name = name.into();
        if self.template.outputs.contains_key(&name) {
            return Err(CloudError::OutputAlreadyExists {
                stack: self.name.clone(),
                name,
            });
        }
        if let Some(export) = output.export_name() {
            let taken = self
                .template
                .outputs
                .values()
                .any(|o| o.export_name() == Some(export));
            if taken {
                return Err(CloudError::ExportAlreadyExists(export.to_string()));
            }
        }

        self.template.outputs.insert(name, output);
        Ok(())
    }

    /// Export a value for other stacks under `{stack}:{name}`
    pub fn export(&mut self, name: &str, value: Value) -> Result<CrossStackRef> {
        let export_name = format!("{}:{}", self.name, name);
        self.add_output(
            format!("Export{}", name),
            Output::new(value.clone()).with_export(export_name.clone()),
        )?;

        Ok(CrossStackRef {
            producer: self.name.clone(),
            export_name,
            value,
        })
    }

    /// Resolve a reference from this stack's point of view
    ///
    /// Imports from another stack record a dependency on the producer.
    pub fn import(&mut self, reference: &CrossStackRef) -> Value {
        if reference.producer == self.name {
            return reference.value.clone();
        }
        self.add_dependency(reference.producer.clone());
        intrinsic::import_value(&reference.export_name)
    }

    pub fn add_dependency(&mut self, stack_name: impl Into<String>) {
        let stack_name = stack_name.into();
        if stack_name != self.name {
            self.dependencies.insert(stack_name);
        }
    }

    /// Account as a literal when pinned, otherwise the `AWS::AccountId` pseudo parameter
    pub fn account_value(&self) -> Value {
        intrinsic::literal_or(
            self.env.account.as_deref(),
            intrinsic::ref_(intrinsic::ACCOUNT_ID),
        )
    }

    /// Region as a literal when pinned, otherwise the `AWS::Region` pseudo parameter
    pub fn region_value(&self) -> Value {
        intrinsic::literal_or(Some(&self.env.region), intrinsic::ref_(intrinsic::REGION))
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.template.resource(logical_id)
    }

    pub fn resources_of_type(&self, resource_type: &str) -> Vec<(&str, &Resource)> {
        self.template.resources_of_type(resource_type)
    }

    pub fn resource_count(&self, resource_type: &str) -> usize {
        self.template.resource_count(resource_type)
    }

    pub fn output(&self, name: &str) -> Option<&Output> {
        self.template.output(name)
    }
}
