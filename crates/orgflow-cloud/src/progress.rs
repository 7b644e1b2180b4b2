//! Run progress reporting

use crate::account::AccountRecord;
use crate::error::CloudError;
use crate::plan::RunPhase;
use crate::stack::StackDeployment;

/// Receives progress events while a plan runs
///
/// Stage events are required; account and stack events default to no-ops.
pub trait ProgressObserver: Send + Sync {
    fn stage_started(&self, phase: RunPhase, stage: &str);

    fn stage_succeeded(&self, phase: RunPhase, stage: &str);

    fn stage_failed(&self, phase: RunPhase, stage: &str, error: &CloudError);

    fn account_ready(&self, _stage: &str, _account: &AccountRecord) {}

    fn stack_deployed(&self, _account_id: &str, _deployment: &StackDeployment) {}

    fn account_removed(&self, _stage: &str, _name: &str, _account_id: &str) {}

    /// A cleanup target was already gone
    fn skipped(&self, _stage: &str, _target: &str) {}
}

/// Reports progress through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn stage_started(&self, phase: RunPhase, stage: &str) {
        tracing::info!("[{}] stage {} started", phase, stage);
    }

    fn stage_succeeded(&self, phase: RunPhase, stage: &str) {
        tracing::info!("[{}] stage {} succeeded", phase, stage);
    }

    fn stage_failed(&self, phase: RunPhase, stage: &str, error: &CloudError) {
        tracing::error!("[{}] stage {} failed: {}", phase, stage, error);
    }

    fn account_ready(&self, stage: &str, account: &AccountRecord) {
        tracing::info!(
            "[{}] account {} ready ({})",
            stage,
            account.name,
            account.account_id
        );
    }

    fn stack_deployed(&self, account_id: &str, deployment: &StackDeployment) {
        tracing::info!(
            "stack {} in {}: {}",
            deployment.stack_name,
            account_id,
            deployment.action
        );
    }

    fn account_removed(&self, stage: &str, name: &str, account_id: &str) {
        tracing::info!("[{}] account {} ({}) closed", stage, name, account_id);
    }

    fn skipped(&self, stage: &str, target: &str) {
        tracing::warn!("[{}] {} not found, skipping", stage, target);
    }
}
