//! Deployment plan and run results

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_STACK_PREFIX: &str = "landing-zone";

/// An account to create inside a stage's OU
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSpec {
    pub name: String,
    pub email: String,
}

/// One ordered unit of the plan: an OU, its accounts and their templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// Stage name; also the name of the OU it creates
    pub name: String,
    /// Parent of the stage OU; `None` keeps the stage's accounts at the root
    pub ou_parent_id: Option<String>,
    pub accounts: Vec<AccountSpec>,
    /// Template references deployed into every account of the stage
    pub templates: Vec<String>,
    /// Service control policies attached to the OU once it exists
    pub policy_ids: Vec<String>,
}

impl Stage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ou_parent_id: None,
            accounts: Vec::new(),
            templates: Vec::new(),
            policy_ids: Vec::new(),
        }
    }

    pub fn with_ou_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.ou_parent_id = Some(parent_id.into());
        self
    }

    pub fn with_account(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.accounts.push(AccountSpec {
            name: name.into(),
            email: email.into(),
        });
        self
    }

    pub fn with_template(mut self, template_ref: impl Into<String>) -> Self {
        self.templates.push(template_ref.into());
        self
    }

    pub fn with_policy(mut self, policy_id: impl Into<String>) -> Self {
        self.policy_ids.push(policy_id.into());
        self
    }
}

/// Ordered stages plus deployment settings
///
/// Launch walks `stages` front to back; cleanup walks them back to front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    pub stages: Vec<Stage>,
    pub region: String,
    pub stack_prefix: String,
}

impl DeploymentPlan {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self {
            stages,
            region: DEFAULT_REGION.to_string(),
            stack_prefix: DEFAULT_STACK_PREFIX.to_string(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_stack_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.stack_prefix = prefix.into();
        self
    }

    /// Reject plans the sequencer cannot run
    pub fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            return Err(CloudError::Configuration(
                "no organizational units defined".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            if stage.name.trim().is_empty() {
                return Err(CloudError::Configuration(
                    "organizational unit with an empty name".to_string(),
                ));
            }
            if !seen.insert(stage.name.as_str()) {
                return Err(CloudError::Configuration(format!(
                    "organizational unit '{}' is defined twice",
                    stage.name
                )));
            }
            if stage.ou_parent_id.is_none() && !stage.policy_ids.is_empty() {
                return Err(CloudError::Configuration(format!(
                    "'{}' lists policies but declares no parent to create its OU under",
                    stage.name
                )));
            }
            for account in &stage.accounts {
                if account.name.trim().is_empty() || account.email.trim().is_empty() {
                    return Err(CloudError::Configuration(format!(
                        "account in '{}' needs both a name and an email",
                        stage.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Stages in teardown order
    pub fn teardown_order(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter().rev()
    }

    /// Stack name for a template reference under this plan's prefix
    pub fn stack_name(&self, template_ref: &str) -> String {
        stack_name(&self.stack_prefix, template_ref)
    }
}

/// `landing-zone` + `logging.yaml` -> `landing-zone-logging`
pub fn stack_name(prefix: &str, template_ref: &str) -> String {
    let stem = Path::new(template_ref)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(template_ref);
    format!("{prefix}-{stem}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Success,
    Failed,
}

/// Outcome of one stage; never modified once produced
#[derive(Debug)]
pub struct StageResult {
    pub stage_name: String,
    pub outcome: StageOutcome,
    pub error: Option<CloudError>,
}

impl StageResult {
    pub fn success(stage_name: impl Into<String>) -> Self {
        Self {
            stage_name: stage_name.into(),
            outcome: StageOutcome::Success,
            error: None,
        }
    }

    pub fn failed(stage_name: impl Into<String>, error: CloudError) -> Self {
        Self {
            stage_name: stage_name.into(),
            outcome: StageOutcome::Failed,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == StageOutcome::Success
    }
}

/// Direction of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Launch,
    Cleanup,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunPhase::Launch => write!(f, "launch"),
            RunPhase::Cleanup => write!(f, "cleanup"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Success,
    Failed,
}

/// Aggregated result of a launch or cleanup
#[derive(Debug)]
pub struct RunResult {
    pub phase: RunPhase,
    pub stages: Vec<StageResult>,
    pub outcome: RunOutcome,
}

impl RunResult {
    pub(crate) fn from_stages(phase: RunPhase, stages: Vec<StageResult>) -> Self {
        let outcome = if stages.iter().all(StageResult::is_success) {
            RunOutcome::Success
        } else {
            RunOutcome::Failed
        };
        Self {
            phase,
            stages,
            outcome,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == RunOutcome::Success
    }

    /// The stage that aborted the run, if any
    pub fn failed_stage(&self) -> Option<&StageResult> {
        self.stages.iter().find(|s| !s.is_success())
    }

    /// Names of the stages that were attempted, in execution order
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.stage_name.as_str()).collect()
    }

    /// Turn a failed run into its aborting error
    pub fn into_result(mut self) -> Result<Self> {
        let failed = self
            .stages
            .iter_mut()
            .find(|s| !s.is_success())
            .and_then(|s| s.error.take());
        match failed {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }
}

impl std::fmt::Display for RunResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let succeeded = self.stages.iter().filter(|s| s.is_success()).count();
        write!(
            f,
            "{} {}: {} stage(s) succeeded, {} failed",
            self.phase,
            match self.outcome {
                RunOutcome::Success => "succeeded",
                RunOutcome::Failed => "failed",
            },
            succeeded,
            self.stages.len() - succeeded
        )
    }
}
