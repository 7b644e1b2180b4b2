//! AWS Organizations client

use crate::error::{missing_field, remote_error};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_organizations::Client;
use aws_sdk_organizations::error::ProvideErrorMetadata;
use aws_sdk_organizations::types::{self as org, ParentType};
use orgflow_cloud::{
    AccountStatus, AccountSummary, CreateAccountStatus, CreationState, FailureReason,
    MoveOutcome, NodeKind, OrganizationNode, OrganizationsClient, Result,
};

/// Returned by MoveAccount when the account already sits under the destination
const DUPLICATE_ACCOUNT: &str = "DuplicateAccountException";

pub struct AwsOrganizations {
    client: Client,
}

impl AwsOrganizations {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

fn convert_status(operation: &str, status: &org::CreateAccountStatus) -> Result<CreateAccountStatus> {
    let request_id = status
        .id()
        .ok_or_else(|| missing_field(operation, "CreateAccountStatus.Id"))?;
    let state = status
        .state()
        .and_then(|s| CreationState::parse(s.as_str()))
        .ok_or_else(|| missing_field(operation, "CreateAccountStatus.State"))?;

    Ok(CreateAccountStatus {
        request_id: request_id.to_string(),
        account_name: status.account_name().unwrap_or_default().to_string(),
        state,
        account_id: status.account_id().map(str::to_string),
        failure_reason: status
            .failure_reason()
            .map(|reason| FailureReason::from_code(reason.as_str())),
    })
}

fn convert_ou(ou: &org::OrganizationalUnit, parent_id: &str) -> Result<OrganizationNode> {
    let id = ou
        .id()
        .ok_or_else(|| missing_field("OrganizationalUnit", "Id"))?;
    Ok(OrganizationNode::organizational_unit(
        id,
        ou.name().unwrap_or_default(),
        parent_id,
    ))
}

/// Classify a MoveAccount rejection
fn move_outcome_for_code(code: Option<&str>) -> Option<MoveOutcome> {
    (code == Some(DUPLICATE_ACCOUNT)).then_some(MoveOutcome::AlreadyInDestination)
}

#[async_trait]
impl OrganizationsClient for AwsOrganizations {
    async fn create_organizational_unit(
        &self,
        parent_id: &str,
        name: &str,
    ) -> Result<OrganizationNode> {
        let output = self
            .client
            .create_organizational_unit()
            .parent_id(parent_id)
            .name(name)
            .send()
            .await
            .map_err(|e| remote_error("CreateOrganizationalUnit", e))?;

        let ou = output
            .organizational_unit()
            .ok_or_else(|| missing_field("CreateOrganizationalUnit", "OrganizationalUnit"))?;
        convert_ou(ou, parent_id)
    }

    async fn delete_organizational_unit(&self, ou_id: &str) -> Result<()> {
        self.client
            .delete_organizational_unit()
            .organizational_unit_id(ou_id)
            .send()
            .await
            .map_err(|e| remote_error("DeleteOrganizationalUnit", e))?;
        Ok(())
    }

    async fn list_roots(&self) -> Result<Vec<OrganizationNode>> {
        let mut pages = self.client.list_roots().into_paginator().send();
        let mut roots = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| remote_error("ListRoots", e))?;
            for root in page.roots() {
                if let Some(id) = root.id() {
                    roots.push(OrganizationNode {
                        id: id.to_string(),
                        name: root.name().unwrap_or("Root").to_string(),
                        kind: NodeKind::Root,
                        parent_id: None,
                    });
                }
            }
        }
        Ok(roots)
    }

    async fn list_parents(&self, child_id: &str) -> Result<Vec<OrganizationNode>> {
        let mut pages = self
            .client
            .list_parents()
            .child_id(child_id)
            .into_paginator()
            .send();
        let mut parents = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| remote_error("ListParents", e))?;
            for parent in page.parents() {
                let Some(id) = parent.id() else { continue };
                let kind = match parent.r#type() {
                    Some(ParentType::Root) => NodeKind::Root,
                    _ => NodeKind::OrganizationalUnit,
                };
                parents.push(OrganizationNode {
                    id: id.to_string(),
                    name: id.to_string(),
                    kind,
                    parent_id: None,
                });
            }
        }
        Ok(parents)
    }

    async fn list_organizational_units_for_parent(
        &self,
        parent_id: &str,
    ) -> Result<Vec<OrganizationNode>> {
        let mut pages = self
            .client
            .list_organizational_units_for_parent()
            .parent_id(parent_id)
            .into_paginator()
            .send();
        let mut units = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| remote_error("ListOrganizationalUnitsForParent", e))?;
            for ou in page.organizational_units() {
                units.push(convert_ou(ou, parent_id)?);
            }
        }
        Ok(units)
    }

    async fn create_account(&self, name: &str, email: &str) -> Result<CreateAccountStatus> {
        let output = self
            .client
            .create_account()
            .account_name(name)
            .email(email)
            .send()
            .await
            .map_err(|e| remote_error("CreateAccount", e))?;

        let status = output
            .create_account_status()
            .ok_or_else(|| missing_field("CreateAccount", "CreateAccountStatus"))?;
        convert_status("CreateAccount", status)
    }

    async fn describe_create_account_status(
        &self,
        request_id: &str,
    ) -> Result<CreateAccountStatus> {
        let output = self
            .client
            .describe_create_account_status()
            .create_account_request_id(request_id)
            .send()
            .await
            .map_err(|e| remote_error("DescribeCreateAccountStatus", e))?;

        let status = output
            .create_account_status()
            .ok_or_else(|| missing_field("DescribeCreateAccountStatus", "CreateAccountStatus"))?;
        convert_status("DescribeCreateAccountStatus", status)
    }

    async fn move_account(
        &self,
        account_id: &str,
        source_parent_id: &str,
        destination_parent_id: &str,
    ) -> Result<MoveOutcome> {
        let result = self
            .client
            .move_account()
            .account_id(account_id)
            .source_parent_id(source_parent_id)
            .destination_parent_id(destination_parent_id)
            .send()
            .await;

        match result {
            Ok(_) => Ok(MoveOutcome::Moved),
            Err(err) => match move_outcome_for_code(err.code()) {
                Some(outcome) => Ok(outcome),
                None => Err(remote_error("MoveAccount", err)),
            },
        }
    }

    async fn close_account(&self, account_id: &str) -> Result<()> {
        self.client
            .close_account()
            .account_id(account_id)
            .send()
            .await
            .map_err(|e| remote_error("CloseAccount", e))?;
        Ok(())
    }

    async fn list_accounts(&self) -> Result<Vec<AccountSummary>> {
        let mut pages = self.client.list_accounts().into_paginator().send();
        let mut accounts = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| remote_error("ListAccounts", e))?;
            for account in page.accounts() {
                let Some(id) = account.id() else { continue };
                accounts.push(AccountSummary {
                    id: id.to_string(),
                    name: account.name().unwrap_or_default().to_string(),
                    email: account.email().unwrap_or_default().to_string(),
                    status: account
                        .status()
                        .map(|s| AccountStatus::parse(s.as_str()))
                        .unwrap_or_else(|| AccountStatus::Other("UNKNOWN".to_string())),
                });
            }
        }
        Ok(accounts)
    }

    async fn attach_policy(&self, policy_id: &str, target_id: &str) -> Result<()> {
        self.client
            .attach_policy()
            .policy_id(policy_id)
            .target_id(target_id)
            .send()
            .await
            .map_err(|e| remote_error("AttachPolicy", e))?;
        Ok(())
    }
}
