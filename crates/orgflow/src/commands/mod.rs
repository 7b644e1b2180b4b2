pub mod organization;
pub mod run;
pub mod stack;

use colored::Colorize;
use orgflow_cloud::DeploymentPlan;
use std::path::{Path, PathBuf};

/// Project root of the accounts file and the plan it describes
pub struct LoadedPlan {
    pub project_root: PathBuf,
    pub plan: DeploymentPlan,
}

/// Resolve and parse the accounts file
///
/// `region` overrides the region declared in the file.
pub fn load(config: Option<&Path>, region: Option<String>) -> anyhow::Result<LoadedPlan> {
    let config_path = orgflow_config::find_config_file(config)?;
    let project_root = orgflow_config::project_root(&config_path);
    let mut plan = orgflow_config::load_plan(&config_path)?;
    if let Some(region) = region {
        plan = plan.with_region(region);
    }

    println!("📄 Loaded {}", config_path.display().to_string().cyan());
    Ok(LoadedPlan {
        project_root,
        plan,
    })
}
