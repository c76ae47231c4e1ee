mod common;

use common::deploy;
use pms_infra::ProcessEnv;
use pms_infra::stacks::compute;
use serde_json::json;

#[test]
fn test_staging_names_end_to_end() {
    let (config, deployment) = deploy(&["env=staging"], ProcessEnv::default());

    assert_eq!(config.environment.name, "staging");
    assert_eq!(config.environment.region, "us-east-2");
    assert_eq!(config.environment.unique_suffix, "");
    assert_eq!(
        deployment.registry.repository_name(),
        "product-management-system-staging"
    );
    assert_eq!(deployment.table.table_name(), "Products-staging");
    assert_eq!(deployment.table.partition_key(), "Id");

    let names: Vec<&str> = deployment.app.stacks().iter().map(|s| s.name()).collect();
    assert_eq!(
        names,
        vec![
            "NetworkStack-staging",
            "DatabaseStack-staging",
            "ContainerRegistryStack-staging",
            "ECSFargateServiceStack-staging",
        ]
    );
}

#[test]
fn test_image_tag_and_desired_count() {
    let env = ProcessEnv {
        image_tag: Some("v2".to_string()),
        ..Default::default()
    };
    let (_, deployment) = deploy(&[], env);

    let parts = deployment.compute.image["Fn::Join"][1].as_array().unwrap();
    let last = parts.last().unwrap().as_str().unwrap();
    assert!(last.ends_with(":v2"));
    assert_eq!(deployment.compute.desired_count, 2);

    let stack = deployment.app.stack(&deployment.names.compute).unwrap();
    let (_, service) = stack.resources_of_type("AWS::ECS::Service")[0];
    assert_eq!(service.property("DesiredCount").unwrap(), 2);

    let (_, task) = stack.resources_of_type("AWS::ECS::TaskDefinition")[0];
    assert_eq!(task.property("Cpu").unwrap(), "512");
    assert_eq!(task.property("Memory").unwrap(), "1024");
    let container = &task.property("ContainerDefinitions").unwrap()[0];
    assert_eq!(container["Image"], deployment.compute.image);
    assert_eq!(container["PortMappings"][0]["ContainerPort"], 80);
}

#[test]
fn test_unique_suffix_names_repository_only() {
    let env = ProcessEnv {
        github_run_id: Some("98765".to_string()),
        ..Default::default()
    };
    let (_, deployment) = deploy(&["env=dev"], env);

    assert_eq!(
        deployment.registry.repository_name(),
        "product-management-system-dev-98765"
    );
    assert_eq!(deployment.table.table_name(), "Products-dev");
    assert_eq!(deployment.names.network, "NetworkStack-dev");
}

#[test]
fn test_subscription_follows_notification_email() {
    let (_, without) = deploy(&[], ProcessEnv::default());
    let stack = without.app.stack(&without.names.compute).unwrap();
    assert_eq!(stack.resource_count("AWS::SNS::Subscription"), 0);
    assert_eq!(stack.resource_count("AWS::CloudWatch::Alarm"), 3);

    let env = ProcessEnv {
        notification_email: Some("ops@example.com".to_string()),
        ..Default::default()
    };
    let (_, with) = deploy(&[], env);
    let stack = with.app.stack(&with.names.compute).unwrap();
    assert_eq!(stack.resource_count("AWS::SNS::Subscription"), 1);
    assert_eq!(stack.resource_count("AWS::CloudWatch::Alarm"), 3);
    assert_eq!(stack.resource_count("AWS::Logs::LogGroup"), 1);
    assert_eq!(stack.resource_count("AWS::ElasticLoadBalancingV2::LoadBalancer"), 1);
    assert_eq!(stack.resource_count("AWS::ElasticLoadBalancingV2::TargetGroup"), 1);

    let (_, subscription) = stack.resources_of_type("AWS::SNS::Subscription")[0];
    assert_eq!(subscription.property("Endpoint").unwrap(), "ops@example.com");
    assert_eq!(subscription.property("Protocol").unwrap(), "email");
}

#[test]
fn test_stack_dependencies() {
    let (_, deployment) = deploy(&[], ProcessEnv::default());
    let names = &deployment.names;

    let compute_stack = deployment.app.stack(&names.compute).unwrap();
    assert!(compute_stack.dependencies().contains(&names.network));
    assert!(compute_stack.dependencies().contains(&names.registry));
    assert!(!compute_stack.dependencies().contains(&names.database));

    for independent in [&names.network, &names.database, &names.registry] {
        let stack = deployment.app.stack(independent).unwrap();
        assert!(stack.dependencies().is_empty(), "{} has dependencies", independent);
    }
}

#[test]
fn test_network_counts() {
    let (_, deployment) = deploy(&[], ProcessEnv::default());
    let stack = deployment.app.stack(&deployment.names.network).unwrap();
    assert_eq!(stack.resource_count("AWS::EC2::NatGateway"), 1);
    assert_eq!(stack.resource_count("AWS::EC2::Subnet"), 4);
    assert_eq!(deployment.network.public_subnets().len(), 2);
}

#[test]
fn test_named_inconsistencies_are_preserved() {
    let env = ProcessEnv {
        default_account: Some("111122223333".to_string()),
        ..Default::default()
    };
    let (_, deployment) = deploy(&["env=prod", "region=eu-west-1"], env);
    let stack = deployment.app.stack(&deployment.names.compute).unwrap();

    let policy = stack.resource(compute::TABLE_POLICY_ID).unwrap();
    let statement = &policy.property("PolicyDocument").unwrap()["Statement"][0];
    assert_eq!(
        statement["Resource"],
        json!("arn:aws:dynamodb:eu-west-1:111122223333:table/Products")
    );
    assert_eq!(deployment.table.table_name(), "Products-prod");

    let (_, task) = stack.resources_of_type("AWS::ECS::TaskDefinition")[0];
    let container = &task.property("ContainerDefinitions").unwrap()[0];
    let table_var = container["Environment"]
        .as_array()
        .unwrap()
        .iter()
        .find(|kv| kv["Name"] == "DYNAMODB_TABLE_NAME")
        .unwrap();
    assert_eq!(table_var["Value"], "Products");
}

#[test]
fn test_outputs() {
    let (_, deployment) = deploy(&[], ProcessEnv::default());
    let stack = deployment.app.stack(&deployment.names.compute).unwrap();

    assert_eq!(
        stack.output("ClusterName").unwrap().value,
        json!({"Ref": compute::CLUSTER_ID})
    );
    assert_eq!(stack.output("ServiceName").unwrap().value, deployment.compute.service_name);
    assert_eq!(
        stack.output("TargetGroupArn").unwrap().value,
        deployment.compute.target_group_arn
    );
}
