//! CloudWatch Logs properties

use pms_cloud::ResourceProperties;
use serde::{Deserialize, Serialize};

/// Supported log retention periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionDays {
    OneDay,
    ThreeDays,
    OneWeek,
    TwoWeeks,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
}

impl RetentionDays {
    pub fn days(self) -> u32 {
        match self {
            RetentionDays::OneDay => 1,
            RetentionDays::ThreeDays => 3,
            RetentionDays::OneWeek => 7,
            RetentionDays::TwoWeeks => 14,
            RetentionDays::OneMonth => 30,
            RetentionDays::ThreeMonths => 90,
            RetentionDays::SixMonths => 180,
            RetentionDays::OneYear => 365,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnLogGroup {
    pub log_group_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_in_days: Option<u32>,
}

impl CfnLogGroup {
    pub fn new(name: impl Into<String>, retention: RetentionDays) -> Self {
        Self {
            log_group_name: name.into(),
            retention_in_days: Some(retention.days()),
        }
    }
}

impl ResourceProperties for CfnLogGroup {
    const RESOURCE_TYPE: &'static str = "AWS::Logs::LogGroup";
}
