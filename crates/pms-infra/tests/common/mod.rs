use pms_infra::{Context, DeployConfig, Deployment, ProcessEnv, orchestrate};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Temporary working directory for assembly output and context files
#[allow(dead_code)]
pub struct TestWorkspace {
    pub root: TempDir,
}

#[allow(dead_code)]
impl TestWorkspace {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn write_cdk_json(&self, content: &str) -> PathBuf {
        let path = self.root.path().join("cdk.json");
        fs::write(&path, content).unwrap();
        path
    }

    pub fn out_dir(&self) -> PathBuf {
        self.root.path().join("cdk.out")
    }
}

/// Context from `key=value` pairs
pub fn context(args: &[&str]) -> Context {
    let mut context = Context::new();
    context.apply_args(args).unwrap();
    context
}

/// Resolve and orchestrate with the given context and environment snapshot
pub fn deploy(args: &[&str], env: ProcessEnv) -> (DeployConfig, Deployment) {
    let context = context(args);
    let config = DeployConfig::resolve(&context, &env);
    let deployment = orchestrate(&config, &context).unwrap();
    (config, deployment)
}
