//! AWS backend for OrgFlow
//!
//! Implements the `orgflow-cloud` client traits on the AWS SDK:
//!
//! - [`AwsOrganizations`]: AWS Organizations (OUs, accounts, SCPs)
//! - [`AwsStackScope`]: CloudFormation clients acting as a member account,
//!   reached by assuming `OrganizationAccountAccessRole` through STS

mod error;

pub mod cloudformation;
pub mod organizations;
pub mod scope;

pub use cloudformation::AwsCloudFormation;
pub use organizations::AwsOrganizations;
pub use scope::{AwsStackScope, MEMBER_ACCESS_ROLE, SESSION_NAME, member_role_arn};

use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Load shared AWS configuration (credentials chain, profile) for `region`
pub async fn load_config(region: &str) -> SdkConfig {
    tracing::debug!("Loading AWS configuration for {}", region);
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}
