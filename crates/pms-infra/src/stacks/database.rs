//! Database stack: the Products table

use crate::environment::ResolvedEnvironment;
use crate::error::Result;
use pms_cloud::{Output, RemovalPolicy, Resource, Stack};
use pms_cloud_aws::dynamodb::{Attribute, BillingMode, CfnTable};

pub const TABLE_ID: &str = "ProductsTable";
pub const TABLE_BASE_NAME: &str = "Products";
pub const PARTITION_KEY: &str = "Id";

/// The table the CRUD service reads and writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHandle {
    table_name: String,
    partition_key: String,
}

impl TableHandle {
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// String partition key every item is addressed by
    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }
}

/// `Products-{env}`
pub fn table_name(env: &ResolvedEnvironment) -> String {
    format!("{}-{}", TABLE_BASE_NAME, env.name)
}

#[tracing::instrument(skip_all, fields(stack = %stack.name()))]
pub fn build(stack: &mut Stack, env: &ResolvedEnvironment) -> Result<TableHandle> {
    stack.set_description("Product Management System data store");
    let name = table_name(env);

    let table = Resource::from_properties(&CfnTable::new(
        &name,
        &Attribute::string(PARTITION_KEY),
        BillingMode::PayPerRequest,
    ))?
    .with_removal_policy(RemovalPolicy::Destroy);
    let table_ref = stack.add_resource(TABLE_ID, table)?;
    stack.add_output(
        "TableName",
        Output::new(table_ref).with_description("Products table name"),
    )?;

    tracing::info!(table = %name, "Table declared");

    Ok(TableHandle {
        table_name: name,
        partition_key: PARTITION_KEY.to_string(),
    })
}
