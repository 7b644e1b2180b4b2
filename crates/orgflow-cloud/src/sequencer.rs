//! Ordered-stage orchestration
//!
//! `launch` walks the plan front to back, `cleanup` back to front. Both stop
//! at the first failing stage and return the results gathered so far.

use crate::account::AccountProvisioner;
use crate::client::{OrganizationsClient, StackScope, TemplateSource};
use crate::error::Result;
use crate::model::StackTarget;
use crate::plan::{DeploymentPlan, RunPhase, RunResult, Stage, StageResult};
use crate::poll::PollPolicy;
use crate::progress::{ProgressObserver, TracingObserver};
use crate::stack::StackDeployer;
use std::sync::Arc;

/// Drives a [`DeploymentPlan`] through the provisioner and the deployer
pub struct Sequencer {
    accounts: AccountProvisioner,
    stacks: Arc<dyn StackScope>,
    templates: Arc<dyn TemplateSource>,
    observer: Arc<dyn ProgressObserver>,
    stack_policy: PollPolicy,
}

impl Sequencer {
    pub fn new(
        organizations: Arc<dyn OrganizationsClient>,
        stacks: Arc<dyn StackScope>,
        templates: Arc<dyn TemplateSource>,
    ) -> Self {
        Self {
            accounts: AccountProvisioner::new(organizations),
            stacks,
            templates,
            observer: Arc::new(TracingObserver),
            stack_policy: PollPolicy::stack_completion(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_account_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.accounts = self.accounts.with_poll_policy(policy);
        self
    }

    pub fn with_stack_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.stack_policy = policy;
        self
    }

    /// Provision every stage in declared order
    ///
    /// Only an invalid plan is returned as `Err`; stage failures are
    /// recorded in the [`RunResult`].
    pub async fn launch(&self, plan: &DeploymentPlan) -> Result<RunResult> {
        plan.validate()?;
        tracing::info!("Launching {} stage(s) in {}", plan.stages.len(), plan.region);

        let mut results = Vec::with_capacity(plan.stages.len());
        for stage in &plan.stages {
            self.observer.stage_started(RunPhase::Launch, &stage.name);
            match self.launch_stage(plan, stage).await {
                Ok(()) => {
                    self.observer.stage_succeeded(RunPhase::Launch, &stage.name);
                    results.push(StageResult::success(&stage.name));
                }
                Err(err) => {
                    self.observer
                        .stage_failed(RunPhase::Launch, &stage.name, &err);
                    results.push(StageResult::failed(&stage.name, err));
                    break;
                }
            }
        }

        Ok(RunResult::from_stages(RunPhase::Launch, results))
    }

    async fn launch_stage(&self, plan: &DeploymentPlan, stage: &Stage) -> Result<()> {
        // Resolve every template before touching the organization
        let templates = stage
            .templates
            .iter()
            .map(|template_ref| -> Result<(String, String)> {
                Ok((
                    plan.stack_name(template_ref),
                    self.templates.load(template_ref)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let ou_id = match &stage.ou_parent_id {
            Some(parent_id) => {
                let ou = self
                    .accounts
                    .create_organizational_unit(&stage.name, parent_id)
                    .await?;
                for policy_id in &stage.policy_ids {
                    self.accounts.attach_policy(policy_id, &ou.id).await?;
                }
                Some(ou.id)
            }
            None => None,
        };

        for spec in &stage.accounts {
            let record = self
                .accounts
                .create_account(&spec.name, &spec.email, ou_id.as_deref())
                .await?;
            self.observer.account_ready(&stage.name, &record);

            if templates.is_empty() {
                continue;
            }

            let client = self
                .stacks
                .stacks_for(&record.account_id, &plan.region)
                .await?;
            let deployer = StackDeployer::new(client).with_poll_policy(self.stack_policy);
            for (stack_name, body) in &templates {
                let target = StackTarget {
                    stack_name: stack_name.clone(),
                    account_id: record.account_id.clone(),
                    region: plan.region.clone(),
                    template_body: body.clone(),
                };
                tracing::debug!("Deploying {}", target.key());
                let deployment = deployer
                    .deploy_stack(&target.stack_name, &target.template_body)
                    .await?;
                self.observer
                    .stack_deployed(&target.account_id, &deployment);
            }
        }

        Ok(())
    }

    /// Tear every stage down in reverse order
    ///
    /// Accounts and OUs that no longer exist are skipped, so a partially
    /// torn-down environment can be cleaned up again.
    pub async fn cleanup(&self, plan: &DeploymentPlan) -> Result<RunResult> {
        plan.validate()?;
        tracing::info!("Cleaning up {} stage(s)", plan.stages.len());

        let mut results = Vec::with_capacity(plan.stages.len());
        for stage in plan.teardown_order() {
            self.observer.stage_started(RunPhase::Cleanup, &stage.name);
            match self.cleanup_stage(plan, stage).await {
                Ok(()) => {
                    self.observer
                        .stage_succeeded(RunPhase::Cleanup, &stage.name);
                    results.push(StageResult::success(&stage.name));
                }
                Err(err) => {
                    self.observer
                        .stage_failed(RunPhase::Cleanup, &stage.name, &err);
                    results.push(StageResult::failed(&stage.name, err));
                    break;
                }
            }
        }

        Ok(RunResult::from_stages(RunPhase::Cleanup, results))
    }

    async fn cleanup_stage(&self, plan: &DeploymentPlan, stage: &Stage) -> Result<()> {
        for spec in &stage.accounts {
            let Some(account_id) = self.accounts.lookup_account_id_by_name(&spec.name).await?
            else {
                self.observer
                    .skipped(&stage.name, &format!("account {}", spec.name));
                continue;
            };

            if !stage.templates.is_empty() {
                let client = self.stacks.stacks_for(&account_id, &plan.region).await?;
                let deployer = StackDeployer::new(client);
                for template_ref in &stage.templates {
                    deployer.delete_stack(&plan.stack_name(template_ref)).await?;
                }
            }

            // Stack deletion is not awaited; retained resources can still
            // hold the account open after closure is requested.
            self.accounts.delete_account(&account_id).await?;
            self.observer
                .account_removed(&stage.name, &spec.name, &account_id);
        }

        let Some(parent_id) = &stage.ou_parent_id else {
            return Ok(());
        };
        match self
            .accounts
            .lookup_ou_id_by_name_under(&stage.name, parent_id)
            .await?
        {
            Some(ou_id) => self.accounts.delete_organizational_unit(&ou_id).await,
            None => {
                self.observer
                    .skipped(&stage.name, &format!("organizational unit {}", stage.name));
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CloudError;
    use crate::plan::{RunOutcome, StageOutcome};
    use crate::testing::{
        AccountScript, InMemoryCloud, RecordingObserver, StackScript, StaticTemplates,
    };

    const LOGGING_TEMPLATE: &str = "Resources:\n  LogBucket:\n    Type: AWS::S3::Bucket\n";

    fn templates() -> StaticTemplates {
        StaticTemplates::new()
            .with("logging.yaml", LOGGING_TEMPLATE)
            .with("guardduty.yaml", "Resources: {}")
    }

    fn sequencer(cloud: &InMemoryCloud, observer: &RecordingObserver) -> Sequencer {
        Sequencer::new(
            Arc::new(cloud.clone()),
            Arc::new(cloud.clone()),
            Arc::new(templates()),
        )
        .with_observer(Arc::new(observer.clone()))
    }

    fn stage(cloud: &InMemoryCloud, name: &str) -> Stage {
        Stage::new(name).with_ou_parent(cloud.root_id())
    }

    #[tokio::test(start_paused = true)]
    async fn test_launch_logging_then_empty_security() {
        let cloud = InMemoryCloud::new();
        let observer = RecordingObserver::new();
        let plan = DeploymentPlan::new(vec![
            stage(&cloud, "Logging")
                .with_account("log-archive", "log@example.com")
                .with_template("logging.yaml"),
            stage(&cloud, "Security"),
        ]);

        let result = sequencer(&cloud, &observer).launch(&plan).await.unwrap();

        assert!(result.is_success());
        assert_eq!(result.stage_names(), vec!["Logging", "Security"]);
        assert!(result.stages.iter().all(|s| s.outcome == StageOutcome::Success));

        let logging = cloud.ou_id("Logging").unwrap();
        assert!(cloud.ou_id("Security").is_some());
        let account = cloud.account_id("log-archive").unwrap();
        assert_eq!(cloud.parent_of(&account), Some(logging));
        assert_eq!(
            cloud.stack_body(&account, "us-east-1", "landing-zone-logging"),
            Some(LOGGING_TEMPLATE.to_string())
        );
        assert_eq!(cloud.count_calls("create_account:"), 1);
        assert_eq!(cloud.count_calls("create_stack:"), 1);
        assert_eq!(
            observer.events(),
            vec![
                "launch:start:Logging".to_string(),
                "account:Logging:log-archive".to_string(),
                format!("stack:{account}:landing-zone-logging:created"),
                "launch:ok:Logging".to_string(),
                "launch:start:Security".to_string(),
                "launch:ok:Security".to_string(),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_account_limit_aborts_run() {
        let cloud = InMemoryCloud::new();
        let observer = RecordingObserver::new();
        cloud.script_account(
            "audit",
            AccountScript::FailWith("ACCOUNT_LIMIT_EXCEEDED".to_string()),
        );
        let plan = DeploymentPlan::new(vec![
            stage(&cloud, "Logging").with_account("log-archive", "log@example.com"),
            stage(&cloud, "Security").with_account("audit", "audit@example.com"),
            stage(&cloud, "Infrastructure").with_account("network", "net@example.com"),
        ]);

        let result = sequencer(&cloud, &observer).launch(&plan).await.unwrap();

        assert_eq!(result.outcome, RunOutcome::Failed);
        assert_eq!(result.stage_names(), vec!["Logging", "Security"]);
        assert!(result.stages[0].is_success());
        let failed = result.failed_stage().unwrap();
        assert_eq!(failed.stage_name, "Security");
        let message = failed.error.as_ref().unwrap().to_string();
        assert!(message.contains("Account limit has been exceeded"));

        assert!(cloud.ou_id("Infrastructure").is_none());
        assert_eq!(
            cloud.calls("create_account:"),
            vec!["create_account:log-archive", "create_account:audit"]
        );
        assert!(
            !observer
                .events()
                .iter()
                .any(|e| e.contains("Infrastructure"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_launch_and_cleanup_orders_are_reversed() {
        let cloud = InMemoryCloud::new();
        let observer = RecordingObserver::new();
        let names = ["Security", "Logging", "Workloads"];
        let plan = DeploymentPlan::new(names.iter().map(|n| stage(&cloud, n)).collect());
        let sequencer = sequencer(&cloud, &observer);

        let launched = sequencer.launch(&plan).await.unwrap();
        let cleaned = sequencer.cleanup(&plan).await.unwrap();

        assert_eq!(launched.stage_names(), names.to_vec());
        assert_eq!(
            cloud
                .calls("create_ou:")
                .iter()
                .map(|c| c.split(':').nth(1).unwrap_or_default().to_string())
                .collect::<Vec<_>>(),
            names.to_vec()
        );
        let mut reversed = names.to_vec();
        reversed.reverse();
        assert_eq!(cleaned.stage_names(), reversed);
        assert!(cleaned.is_success());
        assert_eq!(cloud.count_calls("delete_ou:"), 3);
        assert!(cloud.ou_id("Security").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_policies_are_attached_to_stage_ou() {
        let cloud = InMemoryCloud::new();
        let observer = RecordingObserver::new();
        let plan = DeploymentPlan::new(vec![
            stage(&cloud, "Sandbox")
                .with_policy("p-denyregions")
                .with_policy("p-denyleave"),
        ]);

        let result = sequencer(&cloud, &observer).launch(&plan).await.unwrap();

        assert!(result.is_success());
        let ou = cloud.ou_id("Sandbox").unwrap();
        assert_eq!(
            cloud.attachments(),
            vec![
                ("p-denyregions".to_string(), ou.clone()),
                ("p-denyleave".to_string(), ou),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_template_fails_before_any_mutation() {
        let cloud = InMemoryCloud::new();
        let observer = RecordingObserver::new();
        let plan = DeploymentPlan::new(vec![
            stage(&cloud, "Logging")
                .with_account("log-archive", "log@example.com")
                .with_template("missing.yaml"),
        ]);

        let result = sequencer(&cloud, &observer).launch(&plan).await.unwrap();

        assert!(!result.is_success());
        assert!(matches!(
            result.failed_stage().and_then(|s| s.error.as_ref()),
            Some(CloudError::TemplateNotFound(_))
        ));
        assert!(cloud.journal().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stack_rollback_fails_stage() {
        let cloud = InMemoryCloud::new();
        let observer = RecordingObserver::new();
        cloud.script_stack(
            "landing-zone-logging",
            StackScript::Rollback("LogBucket already exists".to_string()),
        );
        let plan = DeploymentPlan::new(vec![
            stage(&cloud, "Logging")
                .with_account("log-archive", "log@example.com")
                .with_template("logging.yaml"),
            stage(&cloud, "Security"),
        ]);

        let result = sequencer(&cloud, &observer).launch(&plan).await.unwrap();

        assert_eq!(result.stage_names(), vec!["Logging"]);
        assert!(matches!(
            result.into_result(),
            Err(CloudError::StackFailed { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_relaunch_does_not_reuse_existing_ou() {
        let cloud = InMemoryCloud::new();
        let observer = RecordingObserver::new();
        let plan = DeploymentPlan::new(vec![stage(&cloud, "Logging")]);
        let sequencer = sequencer(&cloud, &observer);

        assert!(sequencer.launch(&plan).await.unwrap().is_success());
        let rerun = sequencer.launch(&plan).await.unwrap();

        assert!(!rerun.is_success());
        assert_eq!(
            rerun
                .failed_stage()
                .and_then(|s| s.error.as_ref())
                .and_then(|e| e.remote_code()),
            Some("DuplicateOrganizationalUnitException")
        );
        assert_eq!(cloud.count_calls("create_ou:"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_removes_stacks_accounts_then_ou() {
        let cloud = InMemoryCloud::new();
        let observer = RecordingObserver::new();
        let plan = DeploymentPlan::new(vec![
            stage(&cloud, "Logging")
                .with_account("log-archive", "log@example.com")
                .with_template("logging.yaml"),
        ]);
        let sequencer = sequencer(&cloud, &observer);
        sequencer.launch(&plan).await.unwrap();
        let account = cloud.account_id("log-archive").unwrap();

        let result = sequencer.cleanup(&plan).await.unwrap();

        assert!(result.is_success());
        let journal = cloud.journal();
        let position = |prefix: &str| journal.iter().position(|c| c.starts_with(prefix)).unwrap();
        assert!(position("delete_stack:") < position("close:"));
        assert!(position("close:") < position("delete_ou:"));
        assert_eq!(
            cloud.stack_body(&account, "us-east-1", "landing-zone-logging"),
            None
        );
        assert!(cloud.account_status(&account).unwrap().is_closing());
        assert_eq!(cloud.parent_of(&account), Some(cloud.root_id()));
        assert!(cloud.ou_id("Logging").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_deletes_only_the_ou_under_the_stage_parent() {
        let cloud = InMemoryCloud::new();
        let observer = RecordingObserver::new();
        let unrelated = cloud.add_ou("Logging", &cloud.root_id());
        let workloads = cloud.add_ou("Workloads", &cloud.root_id());
        let plan = DeploymentPlan::new(vec![Stage::new("Logging").with_ou_parent(&workloads)]);
        let sequencer = sequencer(&cloud, &observer);
        assert!(sequencer.launch(&plan).await.unwrap().is_success());
        let nested = cloud.ou_id_under("Logging", &workloads).unwrap();
        assert_ne!(nested, unrelated);

        let result = sequencer.cleanup(&plan).await.unwrap();

        assert!(result.is_success());
        assert_eq!(cloud.calls("delete_ou:"), vec![format!("delete_ou:{nested}")]);
        assert_eq!(cloud.parent_of(&unrelated), Some(cloud.root_id()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_skips_stage_ou_missing_under_its_parent() {
        let cloud = InMemoryCloud::new();
        let observer = RecordingObserver::new();
        cloud.add_ou("Logging", &cloud.root_id());
        let workloads = cloud.add_ou("Workloads", &cloud.root_id());
        let plan = DeploymentPlan::new(vec![Stage::new("Logging").with_ou_parent(&workloads)]);

        let result = sequencer(&cloud, &observer).cleanup(&plan).await.unwrap();

        assert!(result.is_success());
        assert_eq!(cloud.count_calls("delete_ou:"), 0);
        assert!(
            observer
                .events()
                .contains(&"skipped:Logging:organizational unit Logging".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_tolerates_missing_account_and_reruns() {
        let cloud = InMemoryCloud::new();
        let observer = RecordingObserver::new();
        let plan = DeploymentPlan::new(vec![
            stage(&cloud, "Logging")
                .with_account("log-archive", "log@example.com")
                .with_template("logging.yaml"),
            stage(&cloud, "Security").with_account("audit", "audit@example.com"),
        ]);
        let sequencer = sequencer(&cloud, &observer);
        sequencer.launch(&plan).await.unwrap();

        // audit was closed by hand before cleanup ran
        let audit = cloud.account_id("audit").unwrap();
        AccountProvisioner::new(Arc::new(cloud.clone()))
            .delete_account(&audit)
            .await
            .unwrap();

        let first = sequencer.cleanup(&plan).await.unwrap();
        assert!(first.is_success());
        assert!(
            observer
                .events()
                .contains(&"skipped:Security:account audit".to_string())
        );

        let second = sequencer.cleanup(&plan).await.unwrap();
        assert!(second.is_success());
        assert_eq!(cloud.count_calls("close:"), 2);
        assert_eq!(cloud.count_calls("delete_ou:"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_failure_is_fail_fast() {
        let cloud = InMemoryCloud::new();
        let observer = RecordingObserver::new();
        let plan = DeploymentPlan::new(vec![
            stage(&cloud, "Logging").with_account("log-archive", "log@example.com"),
            stage(&cloud, "Security").with_account("audit", "audit@example.com"),
        ]);
        let sequencer = sequencer(&cloud, &observer);
        sequencer.launch(&plan).await.unwrap();
        cloud.fail_calls("close:", "ConstraintViolationException");

        let result = sequencer.cleanup(&plan).await.unwrap();

        assert_eq!(result.stage_names(), vec!["Security"]);
        assert_eq!(
            result.failed_stage().and_then(|s| s.error.as_ref()).and_then(|e| e.remote_code()),
            Some("ConstraintViolationException")
        );
        assert!(cloud.ou_id("Logging").is_some());
    }

    #[tokio::test]
    async fn test_invalid_plan_is_an_error() {
        let cloud = InMemoryCloud::new();
        let observer = RecordingObserver::new();
        let err = sequencer(&cloud, &observer)
            .launch(&DeploymentPlan::new(Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::Configuration(_)));
        assert!(observer.events().is_empty());
    }
}
