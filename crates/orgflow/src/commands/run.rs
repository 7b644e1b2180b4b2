use crate::console::ConsoleObserver;
use colored::Colorize;
use orgflow_cloud::{DeploymentPlan, RunResult, Sequencer, Stage, TemplateSource};
use orgflow_cloud_aws::{AwsOrganizations, AwsStackScope};
use orgflow_config::FileTemplateSource;
use std::path::Path;
use std::sync::Arc;

pub async fn launch(
    config: Option<&Path>,
    env: Option<&str>,
    region: Option<String>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let loaded = super::load(config, region)?;
    let templates = FileTemplateSource::for_project(&loaded.project_root);

    println!();
    match env {
        Some(env) => println!(
            "{} {} ({})",
            "🚀 Launching landing zone".green().bold(),
            env.cyan(),
            loaded.plan.region
        ),
        None => println!(
            "{} ({})",
            "🚀 Launching landing zone".green().bold(),
            loaded.plan.region
        ),
    }
    print_plan(&loaded.plan, loaded.plan.stages.iter(), Some(&templates));

    if dry_run {
        println!();
        println!("{}", "Dry run: nothing was changed".yellow());
        return Ok(());
    }

    let sequencer = sequencer(&loaded.plan.region, templates).await;
    let result = sequencer.launch(&loaded.plan).await?;
    finish(result)
}

pub async fn cleanup(config: Option<&Path>, region: Option<String>, yes: bool) -> anyhow::Result<()> {
    let loaded = super::load(config, region)?;

    println!();
    println!(
        "{} ({})",
        "🧹 Tearing down landing zone".red().bold(),
        loaded.plan.region
    );
    print_plan(&loaded.plan, loaded.plan.teardown_order(), None);

    if !yes {
        println!();
        anyhow::bail!(
            "cleanup closes every account listed above; re-run with --yes to confirm"
        );
    }

    let templates = FileTemplateSource::for_project(&loaded.project_root);
    let sequencer = sequencer(&loaded.plan.region, templates).await;
    let result = sequencer.cleanup(&loaded.plan).await?;
    finish(result)
}

async fn sequencer(region: &str, templates: FileTemplateSource) -> Sequencer {
    let sdk_config = orgflow_cloud_aws::load_config(region).await;
    Sequencer::new(
        Arc::new(AwsOrganizations::new(&sdk_config)),
        Arc::new(AwsStackScope::new(&sdk_config)),
        Arc::new(templates),
    )
    .with_observer(Arc::new(ConsoleObserver))
}

fn finish(result: RunResult) -> anyhow::Result<()> {
    println!();
    if result.is_success() {
        println!("{}", format!("✓ {}", result).green().bold());
    } else {
        println!("{}", format!("✗ {}", result).red().bold());
    }
    result.into_result()?;
    Ok(())
}

/// Print stages in the order given, flagging templates that cannot be read
fn print_plan<'a>(
    plan: &DeploymentPlan,
    stages: impl Iterator<Item = &'a Stage>,
    templates: Option<&FileTemplateSource>,
) {
    println!();
    for (index, stage) in stages.enumerate() {
        let placement = match &stage.ou_parent_id {
            Some(parent) => format!("OU under {}", parent),
            None => "root".to_string(),
        };
        println!(
            "{}",
            format!("{}. {} ({})", index + 1, stage.name, placement).bold()
        );

        for account in &stage.accounts {
            println!("  • {} <{}>", account.name.cyan(), account.email);
        }
        for template in &stage.templates {
            let missing = templates.is_some_and(|source| source.load(template).is_err());
            let line = format!("    ↳ stack {} ({})", plan.stack_name(template), template);
            if missing {
                println!("{} {}", line, "template not found".red());
            } else {
                println!("{}", line);
            }
        }
        for policy in &stage.policy_ids {
            println!("  🔒 {}", policy);
        }
    }
}
