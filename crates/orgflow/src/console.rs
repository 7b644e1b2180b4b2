use colored::Colorize;
use orgflow_cloud::{AccountRecord, CloudError, ProgressObserver, RunPhase, StackDeployment};

/// Prints run progress to the terminal
pub struct ConsoleObserver;

impl ProgressObserver for ConsoleObserver {
    fn stage_started(&self, phase: RunPhase, stage: &str) {
        println!();
        println!("{}", format!("■ {} {}", phase, stage).yellow().bold());
    }

    fn stage_succeeded(&self, _phase: RunPhase, stage: &str) {
        println!("  {} {}", "✓".green(), stage);
    }

    fn stage_failed(&self, _phase: RunPhase, stage: &str, error: &CloudError) {
        println!("  {} {}: {}", "✗".red(), stage, error.to_string().red());
    }

    fn account_ready(&self, _stage: &str, account: &AccountRecord) {
        println!(
            "  ✓ account {} ({})",
            account.name.cyan(),
            account.account_id
        );
    }

    fn stack_deployed(&self, account_id: &str, deployment: &StackDeployment) {
        println!(
            "    ✓ stack {} in {}: {}",
            deployment.stack_name.cyan(),
            account_id,
            deployment.action
        );
    }

    fn account_removed(&self, _stage: &str, name: &str, account_id: &str) {
        println!("  ✓ account {} ({}) closed", name.cyan(), account_id);
    }

    fn skipped(&self, _stage: &str, target: &str) {
        println!("  ℹ {} already gone", target.dimmed());
    }
}
