//! Acting as a member account
//!
//! Stack operations for a member account run with temporary credentials
//! obtained by assuming the account's organization access role from the
//! management account.

use crate::cloudformation::AwsCloudFormation;
use crate::error::{missing_field, remote_error};
use async_trait::async_trait;
use aws_config::{Region, SdkConfig};
use aws_sdk_cloudformation::config::{Builder as CloudFormationConfig, Credentials};
use orgflow_cloud::{Result, StackClient, StackScope};
use std::sync::Arc;

/// Role created in every member account by Organizations
pub const MEMBER_ACCESS_ROLE: &str = "OrganizationAccountAccessRole";

/// STS session name used for deployments
pub const SESSION_NAME: &str = "landing-zone-deployment";

const CREDENTIALS_PROVIDER: &str = "orgflow-assume-role";

pub fn member_role_arn(account_id: &str) -> String {
    format!("arn:aws:iam::{account_id}:role/{MEMBER_ACCESS_ROLE}")
}

/// Hands out CloudFormation clients that act as a member account
pub struct AwsStackScope {
    config: SdkConfig,
    sts: aws_sdk_sts::Client,
}

impl AwsStackScope {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            config: config.clone(),
            sts: aws_sdk_sts::Client::new(config),
        }
    }
}

#[async_trait]
impl StackScope for AwsStackScope {
    async fn stacks_for(&self, account_id: &str, region: &str) -> Result<Arc<dyn StackClient>> {
        let role_arn = member_role_arn(account_id);
        tracing::debug!("Assuming {} for stack operations in {}", role_arn, region);

        let output = self
            .sts
            .assume_role()
            .role_arn(&role_arn)
            .role_session_name(SESSION_NAME)
            .send()
            .await
            .map_err(|e| remote_error("AssumeRole", e))?;

        let credentials = output
            .credentials()
            .ok_or_else(|| missing_field("AssumeRole", "Credentials"))?;

        let config = CloudFormationConfig::from(&self.config)
            .credentials_provider(Credentials::new(
                credentials.access_key_id(),
                credentials.secret_access_key(),
                Some(credentials.session_token().to_string()),
                None,
                CREDENTIALS_PROVIDER,
            ))
            .region(Region::new(region.to_string()))
            .build();

        Ok(Arc::new(AwsCloudFormation::new(
            aws_sdk_cloudformation::Client::from_conf(config),
        )))
    }
}
