use orgflow_cloud::testing::{InMemoryCloud, RecordingObserver, StaticTemplates};
use orgflow_cloud::{DeploymentPlan, PollPolicy, Sequencer, Stage};
use std::sync::Arc;
use std::time::Duration;

pub const REGION: &str = "us-east-1";

pub struct TestOrg {
    pub cloud: InMemoryCloud,
    pub observer: RecordingObserver,
}

impl TestOrg {
    pub fn new() -> Self {
        Self {
            cloud: InMemoryCloud::new(),
            observer: RecordingObserver::new(),
        }
    }

    pub fn sequencer(&self) -> Sequencer {
        let templates = StaticTemplates::new()
            .with("logging.yaml", "Resources:\n  LogBucket:\n    Type: AWS::S3::Bucket\n")
            .with("security.yaml", "Resources:\n  Detector:\n    Type: AWS::GuardDuty::Detector\n")
            .with("network.yaml", "Resources:\n  Vpc:\n    Type: AWS::EC2::VPC\n");

        Sequencer::new(
            Arc::new(self.cloud.clone()),
            Arc::new(self.cloud.clone()),
            Arc::new(templates),
        )
        .with_observer(Arc::new(self.observer.clone()))
        .with_account_poll_policy(PollPolicy::new(Duration::from_secs(30), 20))
        .with_stack_poll_policy(PollPolicy::new(Duration::from_secs(30), 10))
    }

    /// The landing zone from the sample `accounts.yaml`
    pub fn landing_zone(&self) -> DeploymentPlan {
        let root = self.cloud.root_id();
        DeploymentPlan::new(vec![
            Stage::new("Logging")
                .with_ou_parent(&root)
                .with_account("log-archive", "log-archive@example.com")
                .with_template("logging.yaml"),
            Stage::new("Security")
                .with_ou_parent(&root)
                .with_account("audit", "audit@example.com")
                .with_account("security-tooling", "tooling@example.com")
                .with_template("security.yaml"),
            Stage::new("Infrastructure")
                .with_ou_parent(&root)
                .with_account("network", "network@example.com")
                .with_template("network.yaml"),
        ])
    }
}
