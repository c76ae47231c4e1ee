mod common;

use common::{TestWorkspace, deploy};
use pms_cloud::AssemblyWriter;
use pms_infra::{Context, DeployConfig, ProcessEnv, orchestrate};
use std::fs;

#[test]
fn test_synth_writes_templates_in_dependency_order() {
    let workspace = TestWorkspace::new();
    let (_, deployment) = deploy(&["env=qa"], ProcessEnv::default());

    let manifest = deployment.app.synth(workspace.out_dir()).unwrap();
    assert_eq!(manifest.stacks.len(), 4);

    let compute = manifest.position("ECSFargateServiceStack-qa").unwrap();
    assert!(manifest.position("NetworkStack-qa").unwrap() < compute);
    assert!(manifest.position("ContainerRegistryStack-qa").unwrap() < compute);

    for artifact in &manifest.stacks {
        let path = workspace.out_dir().join(&artifact.template_file);
        let template: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(template["AWSTemplateFormatVersion"], "2010-09-09");
        assert_eq!(
            template["Resources"].as_object().unwrap().len(),
            artifact.resource_count
        );
    }

    let artifact = manifest.stack("ECSFargateServiceStack-qa").unwrap();
    assert_eq!(artifact.environment, "aws://unknown-account/us-east-2");
    assert!(artifact.outputs.contains(&"TargetGroupArn".to_string()));
}

#[test]
fn test_synth_keeps_previous_manifest() {
    let workspace = TestWorkspace::new();
    let (_, deployment) = deploy(&[], ProcessEnv::default());

    deployment.app.synth(workspace.out_dir()).unwrap();
    deployment.app.synth(workspace.out_dir()).unwrap();

    assert!(workspace.out_dir().join("manifest.json.backup").exists());
    let loaded = AssemblyWriter::new(workspace.out_dir())
        .load_manifest()
        .unwrap()
        .unwrap();
    assert_eq!(loaded.stacks.len(), 4);
}

#[test]
fn test_synth_for_another_environment_replaces_templates() {
    let workspace = TestWorkspace::new();
    let (_, dev) = deploy(&["env=dev"], ProcessEnv::default());
    let (_, qa) = deploy(&["env=qa"], ProcessEnv::default());

    dev.app.synth(workspace.out_dir()).unwrap();
    let manifest = qa.app.synth(workspace.out_dir()).unwrap();

    let mut templates: Vec<String> = fs::read_dir(workspace.out_dir())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".template.json"))
        .collect();
    templates.sort();

    let mut expected: Vec<String> = manifest
        .stacks
        .iter()
        .map(|artifact| artifact.template_file.clone())
        .collect();
    expected.sort();
    assert_eq!(templates, expected);
    assert!(templates.iter().all(|name| name.contains("-qa.")));
}

#[test]
fn test_context_file_feeds_resolution() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_cdk_json(
        r#"{"app": "pms-infra", "context": {"env": "staging", "uniqueId": "7"}}"#,
    );

    let mut context = Context::from_file(&path).unwrap();
    context.apply_args(["region=ap-southeast-2"]).unwrap();
    let config = DeployConfig::resolve(&context, &ProcessEnv::default());
    let deployment = orchestrate(&config, &context).unwrap();

    assert_eq!(deployment.names.registry, "ContainerRegistryStack-staging");
    assert_eq!(
        deployment.registry.repository_name(),
        "product-management-system-staging-7"
    );
    assert_eq!(deployment.app.try_get_context("region"), Some("ap-southeast-2"));
    for stack in deployment.app.stacks() {
        assert_eq!(stack.env().region, "ap-southeast-2");
    }
}

#[test]
fn test_summary_counts() {
    let (_, deployment) = deploy(&[], ProcessEnv::default());
    let summary = deployment.app.summary().unwrap();

    assert_eq!(summary.stacks.len(), 4);
    assert_eq!(summary.count_of("AWS::CloudWatch::Alarm"), 3);
    assert_eq!(summary.count_of("AWS::DynamoDB::Table"), 1);
    assert_eq!(summary.count_of("AWS::ECR::Repository"), 1);
    assert!(summary.to_string().starts_with("4 stacks"));
}
