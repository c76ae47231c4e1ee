//! Cloud assembly output
//!
//! Writes one `{stack}.template.json` per stack plus a `manifest.json`
//! describing stack environments and deployment order. The previous
//! manifest is kept as `manifest.json.backup`. Templates of stacks that are
//! no longer part of the app are removed.

use crate::error::{CloudError, Result};
use crate::stack::{Stack, StackEnv};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const MANIFEST_VERSION: u32 = 1;
const MANIFEST_FILE: &str = "manifest.json";
const MANIFEST_BACKUP: &str = "manifest.json.backup";
const TEMPLATE_SUFFIX: &str = ".template.json";

/// Assembly manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest format version
    pub version: u32,

    pub created_at: DateTime<Utc>,

    /// Stacks in deployment order
    pub stacks: Vec<StackArtifact>,
}

impl Manifest {
    pub fn stack(&self, name: &str) -> Option<&StackArtifact> {
        self.stacks.iter().find(|s| s.name == name)
    }

    /// Position of a stack in deployment order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.stacks.iter().position(|s| s.name == name)
    }
}

/// A single synthesized stack in the manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackArtifact {
    pub name: String,

    /// Template file name, relative to the assembly directory
    pub template_file: String,

    /// `aws://{account}/{region}`
    pub environment: String,

    pub env: StackEnv,

    pub dependencies: Vec<String>,

    pub resource_count: usize,

    pub outputs: Vec<String>,
}

impl StackArtifact {
    fn from_stack(stack: &Stack) -> Self {
        let env = stack.env().clone();
        let environment = format!(
            "aws://{}/{}",
            env.account.as_deref().unwrap_or("unknown-account"),
            if env.region.is_empty() {
                "unknown-region"
            } else {
                env.region.as_str()
            }
        );

        Self {
            name: stack.name().to_string(),
            template_file: template_file_name(stack.name()),
            environment,
            env,
            dependencies: stack.dependencies().iter().cloned().collect(),
            resource_count: stack.template().resources.len(),
            outputs: stack.template().outputs.keys().cloned().collect(),
        }
    }
}

fn template_file_name(stack_name: &str) -> String {
    format!("{}{}", stack_name, TEMPLATE_SUFFIX)
}

/// Writer for the assembly directory
pub struct AssemblyWriter {
    out_dir: PathBuf,
}

impl AssemblyWriter {
    pub fn new(out_dir: impl AsRef<Path>) -> Self {
        Self {
            out_dir: out_dir.as_ref().to_path_buf(),
        }
    }

    fn manifest_path(&self) -> PathBuf {
        self.out_dir.join(MANIFEST_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.out_dir.join(MANIFEST_BACKUP)
    }

    fn ensure_out_dir(&self) -> Result<()> {
        if !self.out_dir.exists() {
            fs::create_dir_all(&self.out_dir)?;
            tracing::debug!("Created assembly directory: {}", self.out_dir.display());
        }
        Ok(())
    }

    /// Delete templates whose file name is not in `keep`
    fn remove_stale_templates(&self, keep: &HashSet<String>) -> Result<()> {
        for entry in fs::read_dir(&self.out_dir)? {
            let path = entry?.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if path.is_file() && file_name.ends_with(TEMPLATE_SUFFIX) && !keep.contains(file_name) {
                fs::remove_file(&path)?;
                tracing::debug!("Removed stale template {}", path.display());
            }
        }
        Ok(())
    }

    /// Write templates and manifest for stacks already in deployment order
    pub fn write(&self, stacks: &[&Stack]) -> Result<Manifest> {
        self.ensure_out_dir()?;

        let mut written = HashSet::with_capacity(stacks.len());
        for stack in stacks {
            let file_name = template_file_name(stack.name());
            let path = self.out_dir.join(&file_name);
            fs::write(&path, stack.template().to_json_pretty()?)?;
            tracing::debug!(stack = %stack.name(), "Wrote {}", path.display());
            written.insert(file_name);
        }
        self.remove_stale_templates(&written)?;

        let manifest = Manifest {
            version: MANIFEST_VERSION,
            created_at: Utc::now(),
            stacks: stacks.iter().map(|s| StackArtifact::from_stack(s)).collect(),
        };

        let path = self.manifest_path();
        let backup = self.backup_path();
        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup)?;
            }
            fs::rename(&path, &backup)?;
            tracing::debug!("Created manifest backup");
        }

        fs::write(&path, serde_json::to_string_pretty(&manifest)?)?;
        tracing::info!(
            stacks = manifest.stacks.len(),
            "Wrote assembly to {}",
            self.out_dir.display()
        );
        Ok(manifest)
    }

    /// Load the manifest of a previous synthesis, if any
    pub fn load_manifest(&self) -> Result<Option<Manifest>> {
        let path = self.manifest_path();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let manifest: Manifest = serde_json::from_str(&content)?;
        if manifest.version > MANIFEST_VERSION {
            return Err(CloudError::AssemblyError(format!(
                "Manifest version {} is newer than supported version {}",
                manifest.version, MANIFEST_VERSION
            )));
        }

        Ok(Some(manifest))
    }
}
