//! Stack deployment
//!
//! `deploy_stack` is idempotent: it tries an update first, falls back to a
//! create when the stack is missing, and treats "no changes" as success
//! without waiting.

use crate::client::{StackClient, UpdateOutcome};
use crate::error::{CloudError, Result};
use crate::poll::{PollOutcome, PollPolicy, poll_until};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// CloudFormation stack status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackStatus {
    CreateInProgress,
    CreateFailed,
    CreateComplete,
    RollbackInProgress,
    RollbackFailed,
    RollbackComplete,
    DeleteInProgress,
    DeleteFailed,
    DeleteComplete,
    UpdateInProgress,
    UpdateCompleteCleanupInProgress,
    UpdateComplete,
    UpdateFailed,
    UpdateRollbackInProgress,
    UpdateRollbackFailed,
    UpdateRollbackCompleteCleanupInProgress,
    UpdateRollbackComplete,
    ReviewInProgress,
    Other(String),
}

impl StackStatus {
    pub fn parse(value: &str) -> Self {
        match value {
            "CREATE_IN_PROGRESS" => StackStatus::CreateInProgress,
            "CREATE_FAILED" => StackStatus::CreateFailed,
            "CREATE_COMPLETE" => StackStatus::CreateComplete,
            "ROLLBACK_IN_PROGRESS" => StackStatus::RollbackInProgress,
            "ROLLBACK_FAILED" => StackStatus::RollbackFailed,
            "ROLLBACK_COMPLETE" => StackStatus::RollbackComplete,
            "DELETE_IN_PROGRESS" => StackStatus::DeleteInProgress,
            "DELETE_FAILED" => StackStatus::DeleteFailed,
            "DELETE_COMPLETE" => StackStatus::DeleteComplete,
            "UPDATE_IN_PROGRESS" => StackStatus::UpdateInProgress,
            "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS" => StackStatus::UpdateCompleteCleanupInProgress,
            "UPDATE_COMPLETE" => StackStatus::UpdateComplete,
            "UPDATE_FAILED" => StackStatus::UpdateFailed,
            "UPDATE_ROLLBACK_IN_PROGRESS" => StackStatus::UpdateRollbackInProgress,
            "UPDATE_ROLLBACK_FAILED" => StackStatus::UpdateRollbackFailed,
            "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS" => {
                StackStatus::UpdateRollbackCompleteCleanupInProgress
            }
            "UPDATE_ROLLBACK_COMPLETE" => StackStatus::UpdateRollbackComplete,
            "REVIEW_IN_PROGRESS" => StackStatus::ReviewInProgress,
            other => StackStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StackStatus::CreateInProgress => "CREATE_IN_PROGRESS",
            StackStatus::CreateFailed => "CREATE_FAILED",
            StackStatus::CreateComplete => "CREATE_COMPLETE",
            StackStatus::RollbackInProgress => "ROLLBACK_IN_PROGRESS",
            StackStatus::RollbackFailed => "ROLLBACK_FAILED",
            StackStatus::RollbackComplete => "ROLLBACK_COMPLETE",
            StackStatus::DeleteInProgress => "DELETE_IN_PROGRESS",
            StackStatus::DeleteFailed => "DELETE_FAILED",
            StackStatus::DeleteComplete => "DELETE_COMPLETE",
            StackStatus::UpdateInProgress => "UPDATE_IN_PROGRESS",
            StackStatus::UpdateCompleteCleanupInProgress => "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS",
            StackStatus::UpdateComplete => "UPDATE_COMPLETE",
            StackStatus::UpdateFailed => "UPDATE_FAILED",
            StackStatus::UpdateRollbackInProgress => "UPDATE_ROLLBACK_IN_PROGRESS",
            StackStatus::UpdateRollbackFailed => "UPDATE_ROLLBACK_FAILED",
            StackStatus::UpdateRollbackCompleteCleanupInProgress => {
                "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS"
            }
            StackStatus::UpdateRollbackComplete => "UPDATE_ROLLBACK_COMPLETE",
            StackStatus::ReviewInProgress => "REVIEW_IN_PROGRESS",
            StackStatus::Other(s) => s,
        }
    }

    /// Whether another transition is still expected
    pub fn is_in_progress(&self) -> bool {
        self.as_str().ends_with("_IN_PROGRESS")
    }
}

impl std::fmt::Display for StackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stack output value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackOutput {
    pub key: String,
    pub value: String,
}

/// Full details of a deployed stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackDescription {
    pub stack_id: String,
    pub stack_name: String,
    pub status: StackStatus,
    pub status_reason: Option<String>,
    pub outputs: Vec<StackOutput>,
}

/// What a deployment ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployAction {
    Created,
    Updated,
    NoUpdatesNeeded,
}

impl std::fmt::Display for DeployAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeployAction::Created => write!(f, "created"),
            DeployAction::Updated => write!(f, "updated"),
            DeployAction::NoUpdatesNeeded => write!(f, "no updates needed"),
        }
    }
}

/// Result of [`StackDeployer::deploy_stack`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackDeployment {
    pub stack_name: String,
    pub action: DeployAction,
    /// Details fetched after completion; `None` for `NoUpdatesNeeded`
    pub stack: Option<StackDescription>,
}

/// Submitted operation being waited on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StackOperation {
    Create,
    Update,
}

impl StackOperation {
    fn succeeded(&self, status: &StackStatus) -> bool {
        match self {
            StackOperation::Create => *status == StackStatus::CreateComplete,
            StackOperation::Update => *status == StackStatus::UpdateComplete,
        }
    }

    fn action(&self) -> DeployAction {
        match self {
            StackOperation::Create => DeployAction::Created,
            StackOperation::Update => DeployAction::Updated,
        }
    }
}

/// Deploys and deletes stacks through one account-scoped client
pub struct StackDeployer {
    client: Arc<dyn StackClient>,
    policy: PollPolicy,
}

impl StackDeployer {
    pub fn new(client: Arc<dyn StackClient>) -> Self {
        Self {
            client,
            policy: PollPolicy::stack_completion(),
        }
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Create or update `stack_name` with `template_body`
    pub async fn deploy_stack(
        &self,
        stack_name: &str,
        template_body: &str,
    ) -> Result<StackDeployment> {
        let operation = match self.client.update_stack(stack_name, template_body).await? {
            UpdateOutcome::NoChanges => {
                tracing::info!("Stack {} is up to date", stack_name);
                return Ok(StackDeployment {
                    stack_name: stack_name.to_string(),
                    action: DeployAction::NoUpdatesNeeded,
                    stack: None,
                });
            }
            UpdateOutcome::Submitted { stack_id } => {
                tracing::info!("Updating stack {} ({})", stack_name, stack_id);
                StackOperation::Update
            }
            UpdateOutcome::StackMissing => {
                let stack_id = self.client.create_stack(stack_name, template_body).await?;
                tracing::info!("Creating stack {} ({})", stack_name, stack_id);
                StackOperation::Create
            }
        };

        let stack = self.wait_for(stack_name, operation).await?;
        Ok(StackDeployment {
            stack_name: stack_name.to_string(),
            action: operation.action(),
            stack: Some(stack),
        })
    }

    async fn wait_for(
        &self,
        stack_name: &str,
        operation: StackOperation,
    ) -> Result<StackDescription> {
        let outcome = poll_until(&self.policy, |attempt| async move {
            let stack = self.client.describe_stack(stack_name).await?.ok_or_else(|| {
                CloudError::StackFailed {
                    stack_name: stack_name.to_string(),
                    status: StackStatus::DeleteComplete.to_string(),
                    reason: Some("stack disappeared while waiting".to_string()),
                }
            })?;

            tracing::debug!(
                "Stack {} is {} (check {}/{})",
                stack_name,
                stack.status,
                attempt + 1,
                self.policy.max_attempts
            );

            if stack.status.is_in_progress() {
                return Ok(None);
            }
            if operation.succeeded(&stack.status) {
                return Ok(Some(stack));
            }
            Err(CloudError::StackFailed {
                stack_name: stack_name.to_string(),
                status: stack.status.to_string(),
                reason: stack.status_reason,
            })
        })
        .await?;

        match outcome {
            PollOutcome::Ready(stack) => Ok(stack),
            PollOutcome::Exhausted { attempts } => Err(CloudError::DeploymentTimeout {
                stack_name: stack_name.to_string(),
                attempts,
            }),
        }
    }

    /// Request stack deletion without waiting
    ///
    /// Resources with a retain policy (e.g. buckets) survive the stack and
    /// can block the owning account's closure later on.
    pub async fn delete_stack(&self, stack_name: &str) -> Result<()> {
        tracing::info!("Deleting stack {}", stack_name);
        self.client.delete_stack(stack_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StackScope;
    use crate::testing::{InMemoryCloud, StackScript};
    use std::time::Duration;

    const REGION: &str = "us-east-1";
    const TEMPLATE: &str = "Resources: {}";

    async fn deployer(cloud: &InMemoryCloud, account_id: &str) -> StackDeployer {
        let client = cloud.stacks_for(account_id, REGION).await.unwrap();
        StackDeployer::new(client)
    }

    #[test]
    fn test_status_round_trip_and_progress() {
        let status = StackStatus::parse("UPDATE_COMPLETE_CLEANUP_IN_PROGRESS");
        assert_eq!(status, StackStatus::UpdateCompleteCleanupInProgress);
        assert!(status.is_in_progress());
        assert!(!StackStatus::parse("ROLLBACK_COMPLETE").is_in_progress());
        assert_eq!(
            StackStatus::parse("IMPORT_IN_PROGRESS"),
            StackStatus::Other("IMPORT_IN_PROGRESS".to_string())
        );
        assert!(StackStatus::parse("IMPORT_IN_PROGRESS").is_in_progress());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_stack_is_created() {
        let cloud = InMemoryCloud::new();
        let account = cloud.add_account("log-archive", "log@example.com", &cloud.root_id());

        let deployment = deployer(&cloud, &account)
            .await
            .deploy_stack("landing-zone-logging", TEMPLATE)
            .await
            .unwrap();

        assert_eq!(deployment.action, DeployAction::Created);
        let stack = deployment.stack.unwrap();
        assert_eq!(stack.status, StackStatus::CreateComplete);
        assert_eq!(cloud.count_calls("update_stack:"), 1);
        assert_eq!(cloud.count_calls("create_stack:"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_template_twice_is_no_op() {
        let cloud = InMemoryCloud::new();
        let account = cloud.add_account("log-archive", "log@example.com", &cloud.root_id());
        let deployer = deployer(&cloud, &account).await;

        deployer
            .deploy_stack("landing-zone-logging", TEMPLATE)
            .await
            .unwrap();
        let waits_before = cloud.count_calls("describe_stack:");

        let second = deployer
            .deploy_stack("landing-zone-logging", TEMPLATE)
            .await
            .unwrap();

        assert_eq!(second.action, DeployAction::NoUpdatesNeeded);
        assert!(second.stack.is_none());
        assert_eq!(cloud.count_calls("describe_stack:"), waits_before);
        assert_eq!(cloud.count_calls("create_stack:"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_changed_template_is_updated() {
        let cloud = InMemoryCloud::new();
        let account = cloud.add_account("log-archive", "log@example.com", &cloud.root_id());
        let deployer = deployer(&cloud, &account).await;

        deployer
            .deploy_stack("landing-zone-logging", TEMPLATE)
            .await
            .unwrap();
        let updated = deployer
            .deploy_stack("landing-zone-logging", "Resources: {Bucket: {}}")
            .await
            .unwrap();

        assert_eq!(updated.action, DeployAction::Updated);
        assert_eq!(
            updated.stack.unwrap().status,
            StackStatus::UpdateComplete
        );
        assert_eq!(
            cloud.stack_body(&account, REGION, "landing-zone-logging"),
            Some("Resources: {Bucket: {}}".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_permission_error_is_not_treated_as_missing() {
        let cloud = InMemoryCloud::new();
        let account = cloud.add_account("log-archive", "log@example.com", &cloud.root_id());
        cloud.script_stack("landing-zone-logging", StackScript::DenyUpdate);

        let err = deployer(&cloud, &account)
            .await
            .deploy_stack("landing-zone-logging", TEMPLATE)
            .await
            .unwrap_err();

        assert_eq!(err.remote_code(), Some("AccessDenied"));
        assert_eq!(cloud.count_calls("create_stack:"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rollback_is_reported_as_failure() {
        let cloud = InMemoryCloud::new();
        let account = cloud.add_account("log-archive", "log@example.com", &cloud.root_id());
        cloud.script_stack(
            "landing-zone-logging",
            StackScript::Rollback("Bucket already exists".to_string()),
        );

        let err = deployer(&cloud, &account)
            .await
            .deploy_stack("landing-zone-logging", TEMPLATE)
            .await
            .unwrap_err();

        match err {
            CloudError::StackFailed { status, reason, .. } => {
                assert_eq!(status, "ROLLBACK_COMPLETE");
                assert_eq!(reason.as_deref(), Some("Bucket already exists"));
            }
            other => panic!("expected stack failure, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiting_is_bounded() {
        let cloud = InMemoryCloud::new();
        let account = cloud.add_account("log-archive", "log@example.com", &cloud.root_id());
        cloud.script_stack("landing-zone-logging", StackScript::Stuck);

        let err = deployer(&cloud, &account)
            .await
            .with_poll_policy(PollPolicy::new(Duration::from_secs(30), 5))
            .deploy_stack("landing-zone-logging", TEMPLATE)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CloudError::DeploymentTimeout { attempts: 5, .. }
        ));
        assert_eq!(cloud.count_calls("describe_stack:"), 5);
    }

    #[tokio::test]
    async fn test_delete_stack_does_not_wait() {
        let cloud = InMemoryCloud::new();
        let account = cloud.add_account("log-archive", "log@example.com", &cloud.root_id());
        cloud.seed_stack(&account, REGION, "landing-zone-logging", TEMPLATE);

        deployer(&cloud, &account)
            .await
            .delete_stack("landing-zone-logging")
            .await
            .unwrap();

        assert_eq!(cloud.stack_body(&account, REGION, "landing-zone-logging"), None);
        assert_eq!(cloud.count_calls("describe_stack:"), 0);
    }
}
