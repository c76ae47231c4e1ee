//! Synthesis summaries

use crate::stack::Stack;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resource counts for a single stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackSummary {
    pub stack: String,

    /// Resource count per resource type
    pub resources: BTreeMap<String, usize>,

    pub outputs: usize,

    pub dependencies: Vec<String>,
}

impl StackSummary {
    pub fn from_stack(stack: &Stack) -> Self {
        Self {
            stack: stack.name().to_string(),
            resources: stack.template().counts_by_type(),
            outputs: stack.template().outputs.len(),
            dependencies: stack.dependencies().iter().cloned().collect(),
        }
    }

    pub fn total_resources(&self) -> usize {
        self.resources.values().sum()
    }
}

/// Summary of a synthesized app
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthSummary {
    pub stacks: Vec<StackSummary>,
}

impl SynthSummary {
    pub fn from_stacks<'a>(stacks: impl IntoIterator<Item = &'a Stack>) -> Self {
        Self {
            stacks: stacks.into_iter().map(StackSummary::from_stack).collect(),
        }
    }

    pub fn total_resources(&self) -> usize {
        self.stacks.iter().map(StackSummary::total_resources).sum()
    }

    pub fn total_outputs(&self) -> usize {
        self.stacks.iter().map(|s| s.outputs).sum()
    }

    /// Number of resources of a type across all stacks
    pub fn count_of(&self, resource_type: &str) -> usize {
        self.stacks
            .iter()
            .filter_map(|s| s.resources.get(resource_type))
            .sum()
    }
}

impl std::fmt::Display for SynthSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} stacks, {} resources, {} outputs",
            self.stacks.len(),
            self.total_resources(),
            self.total_outputs()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::StackEnv;
    use crate::template::{Output, Resource};
    use serde_json::{Map, json};

    #[test]
    fn test_summary_counts() {
        let mut a = Stack::new("A", StackEnv::default());
        a.add_resource("S1", Resource::new("AWS::EC2::Subnet", Map::new()))
            .unwrap();
        a.add_resource("S2", Resource::new("AWS::EC2::Subnet", Map::new()))
            .unwrap();
        let mut b = Stack::new("B", StackEnv::default());
        b.add_resource("T", Resource::new("AWS::DynamoDB::Table", Map::new()))
            .unwrap();
        b.add_output("TableName", Output::new(json!({"Ref": "T"})))
            .unwrap();

        let summary = SynthSummary::from_stacks([&a, &b]);
        assert_eq!(summary.total_resources(), 3);
        assert_eq!(summary.count_of("AWS::EC2::Subnet"), 2);
        assert_eq!(summary.count_of("AWS::ECS::Cluster"), 0);
        assert_eq!(summary.to_string(), "2 stacks, 3 resources, 1 outputs");
    }
}
