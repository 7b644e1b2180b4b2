//! Control-plane client traits
//!
//! The orchestration engine talks to the cloud only through these traits.
//! `orgflow-cloud-aws` implements them on the AWS SDK; the `testing` module
//! provides an in-memory implementation.

use crate::account::CreateAccountStatus;
use crate::error::Result;
use crate::model::{AccountSummary, OrganizationNode};
use crate::stack::StackDescription;
use async_trait::async_trait;
use std::sync::Arc;

/// Outcome of a move request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// The account already sits under the destination parent
    AlreadyInDestination,
}

/// Outcome of an update-stack request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// An update was accepted and is now in progress
    Submitted { stack_id: String },
    /// The template matches the deployed stack
    NoChanges,
    /// No stack with that name exists in the target account/region
    StackMissing,
}

/// Organization-level operations (OUs, accounts, policies)
#[async_trait]
pub trait OrganizationsClient: Send + Sync {
    async fn create_organizational_unit(
        &self,
        parent_id: &str,
        name: &str,
    ) -> Result<OrganizationNode>;

    async fn delete_organizational_unit(&self, ou_id: &str) -> Result<()>;

    async fn list_roots(&self) -> Result<Vec<OrganizationNode>>;

    async fn list_parents(&self, child_id: &str) -> Result<Vec<OrganizationNode>>;

    async fn list_organizational_units_for_parent(
        &self,
        parent_id: &str,
    ) -> Result<Vec<OrganizationNode>>;

    /// Submit an asynchronous account-creation request
    async fn create_account(&self, name: &str, email: &str) -> Result<CreateAccountStatus>;

    async fn describe_create_account_status(&self, request_id: &str)
    -> Result<CreateAccountStatus>;

    async fn move_account(
        &self,
        account_id: &str,
        source_parent_id: &str,
        destination_parent_id: &str,
    ) -> Result<MoveOutcome>;

    /// Request account closure; completion is not observed
    async fn close_account(&self, account_id: &str) -> Result<()>;

    async fn list_accounts(&self) -> Result<Vec<AccountSummary>>;

    async fn attach_policy(&self, policy_id: &str, target_id: &str) -> Result<()>;
}

/// Stack operations performed as one account in one region
#[async_trait]
pub trait StackClient: Send + Sync {
    async fn create_stack(&self, stack_name: &str, template_body: &str) -> Result<String>;

    async fn update_stack(&self, stack_name: &str, template_body: &str) -> Result<UpdateOutcome>;

    /// Describe a stack; `None` when it does not exist
    async fn describe_stack(&self, stack_name: &str) -> Result<Option<StackDescription>>;

    async fn delete_stack(&self, stack_name: &str) -> Result<()>;
}

/// Hands out stack clients acting as a given member account
#[async_trait]
pub trait StackScope: Send + Sync {
    async fn stacks_for(&self, account_id: &str, region: &str) -> Result<Arc<dyn StackClient>>;
}

/// Resolves a template reference to its raw body
pub trait TemplateSource: Send + Sync {
    fn load(&self, template_ref: &str) -> Result<String>;
}
