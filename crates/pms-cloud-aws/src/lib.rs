//! AWS resource declarations for pms-cloud
//!
//! Each module holds the typed CloudFormation properties of one service.
//! `vpc` and `patterns` are higher-level constructs that expand into many
//! resources at once.

pub mod cloudwatch;
pub mod dynamodb;
pub mod ec2;
pub mod ecr;
pub mod ecs;
pub mod elbv2;
pub mod iam;
pub mod logs;
pub mod patterns;
pub mod sns;
pub mod vpc;

// Re-exports
pub use cloudwatch::{Alarm, ComparisonOperator, Metric, TreatMissingData};
pub use patterns::{
    ContainerImage, FargateServiceAttributes, LoadBalancedFargateService, LogDestination,
    ServicePlacement,
};
pub use vpc::{SubnetConfiguration, SubnetType, Vpc, VpcAttributes};
