use colored::Colorize;
use orgflow_cloud::{StackDeployer, StackScope, TemplateSource};
use orgflow_cloud_aws::AwsStackScope;
use orgflow_config::FileTemplateSource;
use std::path::Path;

async fn deployer(account_id: &str, region: &str) -> anyhow::Result<StackDeployer> {
    let sdk_config = orgflow_cloud_aws::load_config(region).await;
    let client = AwsStackScope::new(&sdk_config)
        .stacks_for(account_id, region)
        .await?;
    Ok(StackDeployer::new(client))
}

pub async fn deploy(
    account_id: &str,
    template: &str,
    region: &str,
    templates_dir: &Path,
    stack_prefix: &str,
) -> anyhow::Result<()> {
    let body = FileTemplateSource::new(templates_dir).load(template)?;
    let stack_name = orgflow_cloud::stack_name(stack_prefix, template);

    println!(
        "{}",
        format!("Deploying {} to {} ({})...", stack_name, account_id, region).blue()
    );
    let deployment = deployer(account_id, region)
        .await?
        .deploy_stack(&stack_name, &body)
        .await?;

    println!("  ✓ {}: {}", deployment.stack_name.cyan(), deployment.action);
    if let Some(stack) = &deployment.stack {
        for output in &stack.outputs {
            println!("    {} = {}", output.key, output.value);
        }
    }
    Ok(())
}

pub async fn delete(account_id: &str, stack_name: &str, region: &str) -> anyhow::Result<()> {
    deployer(account_id, region)
        .await?
        .delete_stack(stack_name)
        .await?;
    println!(
        "  ✓ deletion of {} in {} requested",
        stack_name.cyan(),
        account_id
    );
    Ok(())
}
