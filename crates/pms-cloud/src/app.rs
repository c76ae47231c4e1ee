//! App: the root of a resource graph
//!
//! An app owns the context map and every stack. Stacks are added fully
//! built; the app only orders and synthesizes them.

use crate::assembly::{AssemblyWriter, Manifest};
use crate::error::{CloudError, Result};
use crate::stack::Stack;
use crate::summary::SynthSummary;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Root of the stack graph
#[derive(Debug, Default)]
pub struct App {
    context: BTreeMap<String, String>,
    stacks: Vec<Stack>,
}

impl App {
    pub fn new(context: BTreeMap<String, String>) -> Self {
        Self {
            context,
            stacks: Vec::new(),
        }
    }

    pub fn context(&self) -> &BTreeMap<String, String> {
        &self.context
    }

    /// Context value for a key; empty strings count as absent
    pub fn try_get_context(&self, key: &str) -> Option<&str> {
        self.context
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn add_stack(&mut self, stack: Stack) -> Result<()> {
        if self.stack(stack.name()).is_some() {
            return Err(CloudError::StackAlreadyExists(stack.name().to_string()));
        }
        tracing::debug!(stack = %stack.name(), "Added stack");
        self.stacks.push(stack);
        Ok(())
    }

    pub fn stack(&self, name: &str) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.name() == name)
    }

    /// Stacks in insertion order
    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    /// Stacks ordered so that every dependency precedes its dependents
    ///
    /// Ties keep insertion order.
    pub fn ordered_stacks(&self) -> Result<Vec<&Stack>> {
        let index: HashMap<&str, usize> = self
            .stacks
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name(), i))
            .collect();

        for stack in &self.stacks {
            for dependency in stack.dependencies() {
                if !index.contains_key(dependency.as_str()) {
                    return Err(CloudError::MissingDependency {
                        stack: stack.name().to_string(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }

        let mut remaining: Vec<usize> = self
            .stacks
            .iter()
            .map(|s| s.dependencies().len())
            .collect();
        let mut placed = vec![false; self.stacks.len()];
        let mut ordered = Vec::with_capacity(self.stacks.len());

        while ordered.len() < self.stacks.len() {
            let next = (0..self.stacks.len()).find(|&i| !placed[i] && remaining[i] == 0);
            let Some(i) = next else {
                let cycle: Vec<&str> = (0..self.stacks.len())
                    .filter(|&i| !placed[i])
                    .map(|i| self.stacks[i].name())
                    .collect();
                return Err(CloudError::CircularDependency(cycle.join(" -> ")));
            };

            placed[i] = true;
            let name = self.stacks[i].name();
            ordered.push(&self.stacks[i]);
            for (j, stack) in self.stacks.iter().enumerate() {
                if stack.dependencies().contains(name) {
                    remaining[j] -= 1;
                }
            }
        }

        Ok(ordered)
    }

    pub fn summary(&self) -> Result<SynthSummary> {
        Ok(SynthSummary::from_stacks(self.ordered_stacks()?))
    }

    /// Write every stack template and the manifest to `out_dir`
    pub fn synth(&self, out_dir: impl AsRef<Path>) -> Result<Manifest> {
        let ordered = self.ordered_stacks()?;
        AssemblyWriter::new(out_dir).write(&ordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::StackEnv;
    use serde_json::json;

    fn env() -> StackEnv {
        StackEnv::new(None, "us-east-2")
    }

    #[test]
    fn test_duplicate_stack_is_rejected() {
        let mut app = App::default();
        app.add_stack(Stack::new("A", env())).unwrap();
        assert!(matches!(
            app.add_stack(Stack::new("A", env())),
            Err(CloudError::StackAlreadyExists(_))
        ));
    }

    #[test]
    fn test_ordered_stacks_puts_producers_first() {
        let mut producer = Stack::new("Network", env());
        let vpc = producer.export("VpcId", json!({"Ref": "Vpc"})).unwrap();
        let mut consumer = Stack::new("Service", env());
        consumer.import(&vpc);
        let independent = Stack::new("Database", env());

        let mut app = App::default();
        app.add_stack(consumer).unwrap();
        app.add_stack(independent).unwrap();
        app.add_stack(producer).unwrap();

        let names: Vec<&str> = app
            .ordered_stacks()
            .unwrap()
            .into_iter()
            .map(|s| s.name())
            .collect();
        assert_eq!(names, vec!["Database", "Network", "Service"]);
    }

    #[test]
    fn test_missing_dependency() {
        let mut consumer = Stack::new("Service", env());
        consumer.add_dependency("Network");
        let mut app = App::default();
        app.add_stack(consumer).unwrap();

        assert!(matches!(
            app.ordered_stacks(),
            Err(CloudError::MissingDependency { .. })
        ));
    }

    #[test]
    fn test_circular_dependency() {
        let mut a = Stack::new("A", env());
        a.add_dependency("B");
        let mut b = Stack::new("B", env());
        b.add_dependency("A");
        let mut app = App::default();
        app.add_stack(a).unwrap();
        app.add_stack(b).unwrap();

        assert!(matches!(
            app.ordered_stacks(),
            Err(CloudError::CircularDependency(_))
        ));
    }

    #[test]
    fn test_try_get_context_ignores_empty() {
        let mut context = BTreeMap::new();
        context.insert("env".to_string(), "staging".to_string());
        context.insert("uniqueId".to_string(), String::new());
        let app = App::new(context);

        assert_eq!(app.try_get_context("env"), Some("staging"));
        assert_eq!(app.try_get_context("uniqueId"), None);
        assert_eq!(app.try_get_context("region"), None);
    }
}
