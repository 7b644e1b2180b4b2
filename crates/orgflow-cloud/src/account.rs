//! Account provisioning
//!
//! Owns the asynchronous account-creation lifecycle
//! (`Submitted -> Polling* -> Succeeded | Failed | TimedOut`) together with
//! OU/account CRUD and the name lookups teardown relies on.

use crate::client::{MoveOutcome, OrganizationsClient};
use crate::error::{CloudError, Result};
use crate::model::{AccountSummary, OrganizationNode};
use crate::poll::{PollOutcome, PollPolicy, poll_until};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

/// Why the control plane rejected an account-creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    EmailAlreadyExists,
    AccountLimitExceeded,
    InvalidEmail,
    InvalidAddress,
    ConcurrentAccountModification,
    /// Any reason without a mapping; shown verbatim
    Other(String),
}

impl FailureReason {
    /// Map the control plane's failure code
    pub fn from_code(code: &str) -> Self {
        match code {
            "EMAIL_ALREADY_EXISTS" => FailureReason::EmailAlreadyExists,
            "ACCOUNT_LIMIT_EXCEEDED" => FailureReason::AccountLimitExceeded,
            "INVALID_EMAIL" => FailureReason::InvalidEmail,
            "INVALID_ADDRESS" => FailureReason::InvalidAddress,
            "CONCURRENT_ACCOUNT_MODIFICATION" => FailureReason::ConcurrentAccountModification,
            other => FailureReason::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            FailureReason::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            FailureReason::AccountLimitExceeded => "ACCOUNT_LIMIT_EXCEEDED",
            FailureReason::InvalidEmail => "INVALID_EMAIL",
            FailureReason::InvalidAddress => "INVALID_ADDRESS",
            FailureReason::ConcurrentAccountModification => "CONCURRENT_ACCOUNT_MODIFICATION",
            FailureReason::Other(code) => code,
        }
    }

    /// Operator-facing message
    pub fn message(&self) -> &str {
        match self {
            FailureReason::EmailAlreadyExists => {
                "The email address is already in use by another account"
            }
            FailureReason::AccountLimitExceeded => "Account limit has been exceeded",
            FailureReason::InvalidEmail => "The email address is invalid",
            FailureReason::InvalidAddress => "The address is invalid",
            FailureReason::ConcurrentAccountModification => {
                "Another account modification is already in progress"
            }
            FailureReason::Other(code) => code,
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// State of an account-creation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationState {
    InProgress,
    Succeeded,
    Failed,
}

impl CreationState {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "IN_PROGRESS" => Some(CreationState::InProgress),
            "SUCCEEDED" => Some(CreationState::Succeeded),
            "FAILED" => Some(CreationState::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, CreationState::InProgress)
    }
}

impl std::fmt::Display for CreationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreationState::InProgress => write!(f, "in-progress"),
            CreationState::Succeeded => write!(f, "succeeded"),
            CreationState::Failed => write!(f, "failed"),
        }
    }
}

/// Status snapshot of an account-creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAccountStatus {
    pub request_id: String,
    pub account_name: String,
    pub state: CreationState,
    pub account_id: Option<String>,
    pub failure_reason: Option<FailureReason>,
}

/// An in-flight account-creation request
#[derive(Debug, Clone)]
pub struct AccountCreationRequest {
    pub request_id: String,
    pub name: String,
    pub email: String,
    pub submitted_at: DateTime<Utc>,
}

/// Final state of a created account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountState {
    Succeeded,
    Failed,
}

/// Result of a finished account creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub account_id: String,
    pub name: String,
    pub state: AccountState,
    pub failure_reason: Option<FailureReason>,
}

/// Creates, places, closes and looks up member accounts and OUs
pub struct AccountProvisioner {
    client: Arc<dyn OrganizationsClient>,
    policy: PollPolicy,
}

impl AccountProvisioner {
    pub fn new(client: Arc<dyn OrganizationsClient>) -> Self {
        Self {
            client,
            policy: PollPolicy::account_creation(),
        }
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Id of the organization root
    pub async fn root_id(&self) -> Result<String> {
        self.client
            .list_roots()
            .await?
            .into_iter()
            .next()
            .map(|root| root.id)
            .ok_or_else(|| CloudError::remote("ListRoots", None, "organization has no root"))
    }

    /// Create an OU under `parent_id`
    ///
    /// The control plane does not deduplicate; calling this twice for the
    /// same name under the same parent is rejected remotely.
    pub async fn create_organizational_unit(
        &self,
        name: &str,
        parent_id: &str,
    ) -> Result<OrganizationNode> {
        tracing::info!("Creating organizational unit {} under {}", name, parent_id);
        let ou = self.client.create_organizational_unit(parent_id, name).await?;
        tracing::debug!("Created organizational unit {} ({})", ou.name, ou.id);
        Ok(ou)
    }

    /// Create an account and wait until the request settles
    ///
    /// When `ou_id` is given the new account is moved there from the root.
    /// A failed move is reported as [`CloudError::PartialFailure`] because
    /// the account itself exists at that point.
    pub async fn create_account(
        &self,
        name: &str,
        email: &str,
        ou_id: Option<&str>,
    ) -> Result<AccountRecord> {
        tracing::info!("Submitting account creation for {} <{}>", name, email);
        let submitted = self.client.create_account(name, email).await?;
        let request = AccountCreationRequest {
            request_id: submitted.request_id.clone(),
            name: name.to_string(),
            email: email.to_string(),
            submitted_at: Utc::now(),
        };

        let status = if submitted.state.is_terminal() {
            submitted
        } else {
            self.wait_for_creation(&request).await?
        };

        let account_id = match (status.state, status.account_id) {
            (CreationState::Succeeded, Some(account_id)) => account_id,
            (CreationState::Succeeded, None) => {
                return Err(CloudError::remote(
                    "DescribeCreateAccountStatus",
                    None,
                    format!(
                        "request {} succeeded without an account id",
                        request.request_id
                    ),
                ));
            }
            _ => {
                let reason = status
                    .failure_reason
                    .unwrap_or_else(|| FailureReason::Other("UNKNOWN".to_string()));
                tracing::warn!(
                    "Account creation for {} failed: {}",
                    request.name,
                    reason.code()
                );
                return Err(CloudError::AccountCreationFailed {
                    name: request.name,
                    reason,
                });
            }
        };

        tracing::info!(
            "Account {} created as {} after {}s",
            name,
            account_id,
            (Utc::now() - request.submitted_at).num_seconds()
        );

        if let Some(ou_id) = ou_id {
            self.place_new_account(&account_id, ou_id).await?;
        }

        Ok(AccountRecord {
            account_id,
            name: request.name,
            state: AccountState::Succeeded,
            failure_reason: None,
        })
    }

    async fn wait_for_creation(
        &self,
        request: &AccountCreationRequest,
    ) -> Result<CreateAccountStatus> {
        let outcome = poll_until(&self.policy, |attempt| async move {
            let status = self
                .client
                .describe_create_account_status(&request.request_id)
                .await?;
            tracing::debug!(
                "Account request {} is {} (check {}/{})",
                request.request_id,
                status.state,
                attempt + 1,
                self.policy.max_attempts
            );
            Ok(status.state.is_terminal().then_some(status))
        })
        .await?;

        match outcome {
            PollOutcome::Ready(status) => Ok(status),
            PollOutcome::Exhausted { attempts } => Err(CloudError::ProvisioningTimeout {
                request_id: request.request_id.clone(),
                attempts,
            }),
        }
    }

    async fn place_new_account(&self, account_id: &str, ou_id: &str) -> Result<()> {
        let partial = |err: CloudError| CloudError::PartialFailure {
            account_id: account_id.to_string(),
            destination: ou_id.to_string(),
            message: err.to_string(),
        };

        let root_id = self.root_id().await.map_err(partial)?;
        match self
            .client
            .move_account(account_id, &root_id, ou_id)
            .await
            .map_err(partial)?
        {
            MoveOutcome::Moved => tracing::info!("Moved account {} into {}", account_id, ou_id),
            MoveOutcome::AlreadyInDestination => {
                tracing::debug!("Account {} already in {}", account_id, ou_id)
            }
        }
        Ok(())
    }

    /// Move the account back to the root and request closure
    ///
    /// Closure is accepted asynchronously and may take up to 90 days to
    /// finish; this returns once the request is accepted.
    pub async fn delete_account(&self, account_id: &str) -> Result<()> {
        let root_id = self.root_id().await?;
        let parent_id = self
            .client
            .list_parents(account_id)
            .await?
            .into_iter()
            .next()
            .map(|parent| parent.id);

        match parent_id {
            Some(parent_id) if parent_id != root_id => {
                match self
                    .client
                    .move_account(account_id, &parent_id, &root_id)
                    .await?
                {
                    MoveOutcome::Moved => {
                        tracing::info!("Moved account {} back to root", account_id)
                    }
                    MoveOutcome::AlreadyInDestination => {
                        tracing::debug!("Account {} already at root", account_id)
                    }
                }
            }
            _ => tracing::debug!("Account {} already at root", account_id),
        }

        tracing::info!("Requesting closure of account {}", account_id);
        self.client.close_account(account_id).await
    }

    /// Delete an OU; the control plane rejects non-empty OUs
    pub async fn delete_organizational_unit(&self, ou_id: &str) -> Result<()> {
        tracing::info!("Deleting organizational unit {}", ou_id);
        self.client.delete_organizational_unit(ou_id).await
    }

    /// Resolve an account name to its id
    ///
    /// Accounts already suspended or pending closure count as absent.
    pub async fn lookup_account_id_by_name(&self, name: &str) -> Result<Option<String>> {
        let accounts = self.client.list_accounts().await?;
        let mut found = None;
        for account in accounts.into_iter().filter(|a| a.name == name) {
            if account.status.is_closing() {
                tracing::debug!(
                    "Account {} ({}) is {}, ignoring",
                    name,
                    account.id,
                    account.status
                );
                continue;
            }
            found = Some(account.id);
            break;
        }
        if found.is_none() {
            tracing::debug!("No active account named {}", name);
        }
        Ok(found)
    }

    /// Resolve an OU name to its id (breadth-first from every root)
    pub async fn lookup_ou_id_by_name(&self, name: &str) -> Result<Option<String>> {
        let mut queue: VecDeque<String> = self
            .client
            .list_roots()
            .await?
            .into_iter()
            .map(|root| root.id)
            .collect();

        while let Some(parent_id) = queue.pop_front() {
            for ou in self
                .client
                .list_organizational_units_for_parent(&parent_id)
                .await?
            {
                if ou.name == name {
                    return Ok(Some(ou.id));
                }
                queue.push_back(ou.id);
            }
        }

        tracing::debug!("No organizational unit named {}", name);
        Ok(None)
    }

    /// Resolve an OU name among the direct children of `parent_id`
    pub async fn lookup_ou_id_by_name_under(
        &self,
        name: &str,
        parent_id: &str,
    ) -> Result<Option<String>> {
        let found = self
            .client
            .list_organizational_units_for_parent(parent_id)
            .await?
            .into_iter()
            .find(|ou| ou.name == name)
            .map(|ou| ou.id);
        if found.is_none() {
            tracing::debug!("No organizational unit named {} under {}", name, parent_id);
        }
        Ok(found)
    }

    pub async fn list_accounts(&self) -> Result<Vec<AccountSummary>> {
        self.client.list_accounts().await
    }

    /// Attach a service control policy to an OU or account
    pub async fn attach_policy(&self, policy_id: &str, target_id: &str) -> Result<()> {
        tracing::info!("Attaching policy {} to {}", policy_id, target_id);
        self.client.attach_policy(policy_id, target_id).await
    }
}
