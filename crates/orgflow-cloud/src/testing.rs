//! In-memory control plane
//!
//! `InMemoryCloud` implements [`OrganizationsClient`] and [`StackScope`] over
//! shared state, so a test can hand clones of it to the engine and then
//! inspect what happened through the call journal. Remote mutations and
//! status checks are journaled as `operation:args` strings.

use crate::account::{AccountRecord, CreateAccountStatus, CreationState, FailureReason};
use crate::client::{
    MoveOutcome, OrganizationsClient, StackClient, StackScope, TemplateSource, UpdateOutcome,
};
use crate::error::{CloudError, Result};
use crate::model::{AccountStatus, AccountSummary, OrganizationNode};
use crate::plan::RunPhase;
use crate::progress::ProgressObserver;
use crate::stack::{StackDeployment, StackDescription, StackStatus};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

const ROOT_ID: &str = "r-root";

/// Scripted behavior of an account-creation request, keyed by account name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountScript {
    /// Report `Succeeded` on the n-th status check (1-based)
    SucceedAfter(u32),
    /// Report `Failed` with this reason code on the first status check
    FailWith(String),
    /// Stay `InProgress` forever
    NeverComplete,
}

/// Scripted behavior of a stack, keyed by stack name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackScript {
    /// Create/update ends in a rollback with this reason
    Rollback(String),
    /// Create/update never leaves `*_IN_PROGRESS`
    Stuck,
    /// Update is rejected with `AccessDenied`
    DenyUpdate,
}

#[derive(Debug)]
struct FakeAccount {
    id: String,
    name: String,
    email: String,
    status: AccountStatus,
    parent_id: String,
}

#[derive(Debug)]
struct FakeRequest {
    name: String,
    email: String,
    script: AccountScript,
    checks: u32,
    account_id: Option<String>,
}

#[derive(Debug)]
struct FakeStack {
    stack_id: String,
    body: String,
    status: StackStatus,
    reason: Option<String>,
}

type StackKey = (String, String, String);

#[derive(Debug, Default)]
struct CloudState {
    next_id: u64,
    ous: Vec<OrganizationNode>,
    accounts: Vec<FakeAccount>,
    requests: HashMap<String, FakeRequest>,
    account_scripts: HashMap<String, AccountScript>,
    stack_scripts: HashMap<String, StackScript>,
    stacks: BTreeMap<StackKey, FakeStack>,
    move_failure: Option<String>,
    failures: Vec<(String, String)>,
    attachments: Vec<(String, String)>,
    journal: Vec<String>,
}

impl CloudState {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Journal the call, then apply any injected failure for it
    fn record(&mut self, operation: &str, entry: String) -> Result<()> {
        let failure = self
            .failures
            .iter()
            .find(|(prefix, _)| entry.starts_with(prefix.as_str()))
            .map(|(_, code)| code.clone());
        self.journal.push(entry);
        match failure {
            Some(code) => Err(CloudError::remote(operation, Some(&code), "injected failure")),
            None => Ok(()),
        }
    }

    fn parent_exists(&self, id: &str) -> bool {
        id == ROOT_ID || self.ous.iter().any(|ou| ou.id == id)
    }

    fn add_ou(&mut self, name: &str, parent_id: &str) -> String {
        let id = format!("ou-root-{:08}", self.next());
        self.ous
            .push(OrganizationNode::organizational_unit(&id, name, parent_id));
        id
    }

    fn add_account(&mut self, name: &str, email: &str, parent_id: &str) -> String {
        let id = format!("{:012}", 111_100_000_000 + self.next());
        self.accounts.push(FakeAccount {
            id: id.clone(),
            name: name.to_string(),
            email: email.to_string(),
            status: AccountStatus::Active,
            parent_id: parent_id.to_string(),
        });
        id
    }

    fn account_mut(&mut self, operation: &str, id: &str) -> Result<&mut FakeAccount> {
        self.accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| {
                CloudError::remote(
                    operation,
                    Some("AccountNotFoundException"),
                    format!("account {id} not found"),
                )
            })
    }

    fn node(&self, id: &str) -> Option<OrganizationNode> {
        if id == ROOT_ID {
            return Some(OrganizationNode::root(ROOT_ID));
        }
        self.ous.iter().find(|ou| ou.id == id).cloned()
    }
}

/// Shared in-memory organization and stack state
#[derive(Debug, Clone, Default)]
pub struct InMemoryCloud {
    state: Arc<Mutex<CloudState>>,
}

impl InMemoryCloud {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CloudState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn root_id(&self) -> String {
        ROOT_ID.to_string()
    }

    /// Seed an OU directly, bypassing the journal
    pub fn add_ou(&self, name: &str, parent_id: &str) -> String {
        self.lock().add_ou(name, parent_id)
    }

    /// Seed an active account directly, bypassing the journal
    pub fn add_account(&self, name: &str, email: &str, parent_id: &str) -> String {
        self.lock().add_account(name, email, parent_id)
    }

    /// Seed a completed stack directly, bypassing the journal
    pub fn seed_stack(&self, account_id: &str, region: &str, stack_name: &str, body: &str) {
        let mut state = self.lock();
        let n = state.next();
        state.stacks.insert(
            stack_key(account_id, region, stack_name),
            FakeStack {
                stack_id: stack_id(account_id, region, stack_name, n),
                body: body.to_string(),
                status: StackStatus::CreateComplete,
                reason: None,
            },
        );
    }

    pub fn script_account(&self, name: &str, script: AccountScript) {
        self.lock()
            .account_scripts
            .insert(name.to_string(), script);
    }

    pub fn script_stack(&self, stack_name: &str, script: StackScript) {
        self.lock()
            .stack_scripts
            .insert(stack_name.to_string(), script);
    }

    /// Reject every move with `code`
    pub fn fail_moves(&self, code: &str) {
        self.lock().move_failure = Some(code.to_string());
    }

    /// Reject every call whose journal entry starts with `prefix`
    pub fn fail_calls(&self, prefix: &str, code: &str) {
        self.lock()
            .failures
            .push((prefix.to_string(), code.to_string()));
    }

    pub fn parent_of(&self, id: &str) -> Option<String> {
        let state = self.lock();
        state
            .accounts
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.parent_id.clone())
            .or_else(|| {
                state
                    .ous
                    .iter()
                    .find(|ou| ou.id == id)
                    .and_then(|ou| ou.parent_id.clone())
            })
    }

    pub fn account_status(&self, id: &str) -> Option<AccountStatus> {
        self.lock()
            .accounts
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.status.clone())
    }

    /// Id of the first account with this name, whatever its status
    pub fn account_id(&self, name: &str) -> Option<String> {
        self.lock()
            .accounts
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.id.clone())
    }

    pub fn ou_id(&self, name: &str) -> Option<String> {
        self.lock()
            .ous
            .iter()
            .find(|ou| ou.name == name)
            .map(|ou| ou.id.clone())
    }

    pub fn ou_id_under(&self, name: &str, parent_id: &str) -> Option<String> {
        self.lock()
            .ous
            .iter()
            .find(|ou| ou.name == name && ou.parent_id.as_deref() == Some(parent_id))
            .map(|ou| ou.id.clone())
    }

    pub fn stack_body(&self, account_id: &str, region: &str, stack_name: &str) -> Option<String> {
        self.lock()
            .stacks
            .get(&stack_key(account_id, region, stack_name))
            .map(|s| s.body.clone())
    }

    /// `(policy_id, target_id)` pairs in attachment order
    pub fn attachments(&self) -> Vec<(String, String)> {
        self.lock().attachments.clone()
    }

    pub fn journal(&self) -> Vec<String> {
        self.lock().journal.clone()
    }

    /// Journal entries starting with `prefix`, in call order
    pub fn calls(&self, prefix: &str) -> Vec<String> {
        self.lock()
            .journal
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls(prefix).len()
    }
}

fn stack_key(account_id: &str, region: &str, stack_name: &str) -> StackKey {
    (
        account_id.to_string(),
        region.to_string(),
        stack_name.to_string(),
    )
}

fn stack_id(account_id: &str, region: &str, stack_name: &str, n: u64) -> String {
    format!("arn:aws:cloudformation:{region}:{account_id}:stack/{stack_name}/{n:08}")
}

#[async_trait]
impl OrganizationsClient for InMemoryCloud {
    async fn create_organizational_unit(
        &self,
        parent_id: &str,
        name: &str,
    ) -> Result<OrganizationNode> {
        let mut state = self.lock();
        state.record(
            "CreateOrganizationalUnit",
            format!("create_ou:{name}:{parent_id}"),
        )?;
        if !state.parent_exists(parent_id) {
            return Err(CloudError::remote(
                "CreateOrganizationalUnit",
                Some("ParentNotFoundException"),
                format!("parent {parent_id} not found"),
            ));
        }
        if state
            .ous
            .iter()
            .any(|ou| ou.name == name && ou.parent_id.as_deref() == Some(parent_id))
        {
            return Err(CloudError::remote(
                "CreateOrganizationalUnit",
                Some("DuplicateOrganizationalUnitException"),
                format!("an OU named {name} already exists"),
            ));
        }
        let id = state.add_ou(name, parent_id);
        Ok(OrganizationNode::organizational_unit(id, name, parent_id))
    }

    async fn delete_organizational_unit(&self, ou_id: &str) -> Result<()> {
        let mut state = self.lock();
        state.record("DeleteOrganizationalUnit", format!("delete_ou:{ou_id}"))?;
        if !state.ous.iter().any(|ou| ou.id == ou_id) {
            return Err(CloudError::remote(
                "DeleteOrganizationalUnit",
                Some("OrganizationalUnitNotFoundException"),
                format!("{ou_id} not found"),
            ));
        }
        let occupied = state.accounts.iter().any(|a| a.parent_id == ou_id)
            || state
                .ous
                .iter()
                .any(|ou| ou.parent_id.as_deref() == Some(ou_id));
        if occupied {
            return Err(CloudError::remote(
                "DeleteOrganizationalUnit",
                Some("OrganizationalUnitNotEmptyException"),
                format!("{ou_id} still has children"),
            ));
        }
        state.ous.retain(|ou| ou.id != ou_id);
        Ok(())
    }

    async fn list_roots(&self) -> Result<Vec<OrganizationNode>> {
        Ok(vec![OrganizationNode::root(ROOT_ID)])
    }

    async fn list_parents(&self, child_id: &str) -> Result<Vec<OrganizationNode>> {
        let state = self.lock();
        let parent_id = state
            .accounts
            .iter()
            .find(|a| a.id == child_id)
            .map(|a| a.parent_id.clone())
            .or_else(|| {
                state
                    .ous
                    .iter()
                    .find(|ou| ou.id == child_id)
                    .and_then(|ou| ou.parent_id.clone())
            })
            .ok_or_else(|| {
                CloudError::remote(
                    "ListParents",
                    Some("ChildNotFoundException"),
                    format!("{child_id} not found"),
                )
            })?;
        Ok(state.node(&parent_id).into_iter().collect())
    }

    async fn list_organizational_units_for_parent(
        &self,
        parent_id: &str,
    ) -> Result<Vec<OrganizationNode>> {
        Ok(self
            .lock()
            .ous
            .iter()
            .filter(|ou| ou.parent_id.as_deref() == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn create_account(&self, name: &str, email: &str) -> Result<CreateAccountStatus> {
        let mut state = self.lock();
        state.record("CreateAccount", format!("create_account:{name}"))?;
        let request_id = format!("car-{:08}", state.next());
        let script = state
            .account_scripts
            .get(name)
            .cloned()
            .unwrap_or(AccountScript::SucceedAfter(1));
        state.requests.insert(
            request_id.clone(),
            FakeRequest {
                name: name.to_string(),
                email: email.to_string(),
                script,
                checks: 0,
                account_id: None,
            },
        );
        Ok(CreateAccountStatus {
            request_id,
            account_name: name.to_string(),
            state: CreationState::InProgress,
            account_id: None,
            failure_reason: None,
        })
    }

    async fn describe_create_account_status(
        &self,
        request_id: &str,
    ) -> Result<CreateAccountStatus> {
        let mut state = self.lock();
        state.record(
            "DescribeCreateAccountStatus",
            format!("describe_account:{request_id}"),
        )?;
        let (name, email, script, checks, account_id) = {
            let request = state.requests.get_mut(request_id).ok_or_else(|| {
                CloudError::remote(
                    "DescribeCreateAccountStatus",
                    Some("CreateAccountStatusNotFoundException"),
                    format!("request {request_id} not found"),
                )
            })?;
            request.checks += 1;
            (
                request.name.clone(),
                request.email.clone(),
                request.script.clone(),
                request.checks,
                request.account_id.clone(),
            )
        };

        let mut status = CreateAccountStatus {
            request_id: request_id.to_string(),
            account_name: name.clone(),
            state: CreationState::InProgress,
            account_id: None,
            failure_reason: None,
        };
        match script {
            AccountScript::SucceedAfter(n) if checks >= n => {
                let account_id = match account_id {
                    Some(id) => id,
                    None => {
                        let id = state.add_account(&name, &email, ROOT_ID);
                        if let Some(request) = state.requests.get_mut(request_id) {
                            request.account_id = Some(id.clone());
                        }
                        id
                    }
                };
                status.state = CreationState::Succeeded;
                status.account_id = Some(account_id);
            }
            AccountScript::FailWith(code) => {
                status.state = CreationState::Failed;
                status.failure_reason = Some(FailureReason::from_code(&code));
            }
            _ => {}
        }
        Ok(status)
    }

    async fn move_account(
        &self,
        account_id: &str,
        source_parent_id: &str,
        destination_parent_id: &str,
    ) -> Result<MoveOutcome> {
        let mut state = self.lock();
        state.record(
            "MoveAccount",
            format!("move:{account_id}:{source_parent_id}->{destination_parent_id}"),
        )?;
        if let Some(code) = state.move_failure.clone() {
            return Err(CloudError::remote(
                "MoveAccount",
                Some(&code),
                format!("cannot move {account_id}"),
            ));
        }
        if !state.parent_exists(destination_parent_id) {
            return Err(CloudError::remote(
                "MoveAccount",
                Some("DestinationParentNotFoundException"),
                format!("{destination_parent_id} not found"),
            ));
        }
        let account = state.account_mut("MoveAccount", account_id)?;
        if account.parent_id == destination_parent_id {
            return Ok(MoveOutcome::AlreadyInDestination);
        }
        if account.parent_id != source_parent_id {
            return Err(CloudError::remote(
                "MoveAccount",
                Some("SourceParentNotFoundException"),
                format!("{account_id} is not in {source_parent_id}"),
            ));
        }
        account.parent_id = destination_parent_id.to_string();
        Ok(MoveOutcome::Moved)
    }

    async fn close_account(&self, account_id: &str) -> Result<()> {
        let mut state = self.lock();
        state.record("CloseAccount", format!("close:{account_id}"))?;
        let account = state.account_mut("CloseAccount", account_id)?;
        if account.status.is_closing() {
            return Err(CloudError::remote(
                "CloseAccount",
                Some("AccountAlreadyClosedException"),
                format!("{account_id} is already closed"),
            ));
        }
        account.status = AccountStatus::PendingClosure;
        Ok(())
    }

    async fn list_accounts(&self) -> Result<Vec<AccountSummary>> {
        Ok(self
            .lock()
            .accounts
            .iter()
            .map(|a| AccountSummary {
                id: a.id.clone(),
                name: a.name.clone(),
                email: a.email.clone(),
                status: a.status.clone(),
            })
            .collect())
    }

    async fn attach_policy(&self, policy_id: &str, target_id: &str) -> Result<()> {
        let mut state = self.lock();
        state.record("AttachPolicy", format!("attach:{policy_id}:{target_id}"))?;
        let known = state.parent_exists(target_id) || state.accounts.iter().any(|a| a.id == target_id);
        if !known {
            return Err(CloudError::remote(
                "AttachPolicy",
                Some("TargetNotFoundException"),
                format!("{target_id} not found"),
            ));
        }
        let pair = (policy_id.to_string(), target_id.to_string());
        if state.attachments.contains(&pair) {
            return Err(CloudError::remote(
                "AttachPolicy",
                Some("DuplicatePolicyAttachmentException"),
                format!("{policy_id} is already attached to {target_id}"),
            ));
        }
        state.attachments.push(pair);
        Ok(())
    }
}

#[async_trait]
impl StackScope for InMemoryCloud {
    async fn stacks_for(&self, account_id: &str, region: &str) -> Result<Arc<dyn StackClient>> {
        let active = self
            .lock()
            .accounts
            .iter()
            .any(|a| a.id == account_id && a.status == AccountStatus::Active);
        if !active {
            return Err(CloudError::remote(
                "AssumeRole",
                Some("AccessDenied"),
                format!("cannot act as account {account_id}"),
            ));
        }
        Ok(Arc::new(InMemoryStackClient {
            cloud: self.clone(),
            account_id: account_id.to_string(),
            region: region.to_string(),
        }))
    }
}

/// Stack client acting as one account/region of an [`InMemoryCloud`]
#[derive(Debug, Clone)]
pub struct InMemoryStackClient {
    cloud: InMemoryCloud,
    account_id: String,
    region: String,
}

impl InMemoryStackClient {
    fn key(&self, stack_name: &str) -> StackKey {
        stack_key(&self.account_id, &self.region, stack_name)
    }
}

#[async_trait]
impl StackClient for InMemoryStackClient {
    async fn create_stack(&self, stack_name: &str, template_body: &str) -> Result<String> {
        let mut state = self.cloud.lock();
        state.record(
            "CreateStack",
            format!("create_stack:{}:{stack_name}", self.account_id),
        )?;
        let key = self.key(stack_name);
        if state.stacks.contains_key(&key) {
            return Err(CloudError::remote(
                "CreateStack",
                Some("AlreadyExistsException"),
                format!("Stack [{stack_name}] already exists"),
            ));
        }
        let (status, reason) = match state.stack_scripts.get(stack_name) {
            Some(StackScript::Rollback(reason)) => {
                (StackStatus::RollbackComplete, Some(reason.clone()))
            }
            Some(StackScript::Stuck) => (StackStatus::CreateInProgress, None),
            _ => (StackStatus::CreateComplete, None),
        };
        let n = state.next();
        let id = stack_id(&self.account_id, &self.region, stack_name, n);
        state.stacks.insert(
            key,
            FakeStack {
                stack_id: id.clone(),
                body: template_body.to_string(),
                status,
                reason,
            },
        );
        Ok(id)
    }

    async fn update_stack(&self, stack_name: &str, template_body: &str) -> Result<UpdateOutcome> {
        let mut state = self.cloud.lock();
        state.record(
            "UpdateStack",
            format!("update_stack:{}:{stack_name}", self.account_id),
        )?;
        let script = state.stack_scripts.get(stack_name).cloned();
        if script == Some(StackScript::DenyUpdate) {
            return Err(CloudError::remote(
                "UpdateStack",
                Some("AccessDenied"),
                format!("not authorized to update {stack_name}"),
            ));
        }
        let Some(stack) = state.stacks.get_mut(&self.key(stack_name)) else {
            return Ok(UpdateOutcome::StackMissing);
        };
        if stack.body == template_body {
            return Ok(UpdateOutcome::NoChanges);
        }
        stack.body = template_body.to_string();
        (stack.status, stack.reason) = match script {
            Some(StackScript::Rollback(reason)) => {
                (StackStatus::UpdateRollbackComplete, Some(reason))
            }
            Some(StackScript::Stuck) => (StackStatus::UpdateInProgress, None),
            _ => (StackStatus::UpdateComplete, None),
        };
        Ok(UpdateOutcome::Submitted {
            stack_id: stack.stack_id.clone(),
        })
    }

    async fn describe_stack(&self, stack_name: &str) -> Result<Option<StackDescription>> {
        let mut state = self.cloud.lock();
        state.record(
            "DescribeStacks",
            format!("describe_stack:{}:{stack_name}", self.account_id),
        )?;
        Ok(state
            .stacks
            .get(&self.key(stack_name))
            .map(|stack| StackDescription {
                stack_id: stack.stack_id.clone(),
                stack_name: stack_name.to_string(),
                status: stack.status.clone(),
                status_reason: stack.reason.clone(),
                outputs: Vec::new(),
            }))
    }

    async fn delete_stack(&self, stack_name: &str) -> Result<()> {
        let mut state = self.cloud.lock();
        state.record(
            "DeleteStack",
            format!("delete_stack:{}:{stack_name}", self.account_id),
        )?;
        let key = self.key(stack_name);
        state.stacks.remove(&key);
        Ok(())
    }
}

/// Template bodies held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticTemplates {
    templates: HashMap<String, String>,
}

impl StaticTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, template_ref: &str, body: &str) -> Self {
        self.templates
            .insert(template_ref.to_string(), body.to_string());
        self
    }
}

impl TemplateSource for StaticTemplates {
    fn load(&self, template_ref: &str) -> Result<String> {
        self.templates
            .get(template_ref)
            .cloned()
            .ok_or_else(|| CloudError::TemplateNotFound(template_ref.to_string()))
    }
}

/// Observer that records every event as a string
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<String>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn push(&self, event: String) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

impl ProgressObserver for RecordingObserver {
    fn stage_started(&self, phase: RunPhase, stage: &str) {
        self.push(format!("{phase}:start:{stage}"));
    }

    fn stage_succeeded(&self, phase: RunPhase, stage: &str) {
        self.push(format!("{phase}:ok:{stage}"));
    }

    fn stage_failed(&self, phase: RunPhase, stage: &str, error: &CloudError) {
        self.push(format!("{phase}:failed:{stage}:{error}"));
    }

    fn account_ready(&self, stage: &str, account: &AccountRecord) {
        self.push(format!("account:{stage}:{}", account.name));
    }

    fn stack_deployed(&self, account_id: &str, deployment: &StackDeployment) {
        self.push(format!(
            "stack:{account_id}:{}:{}",
            deployment.stack_name, deployment.action
        ));
    }

    fn account_removed(&self, stage: &str, name: &str, _account_id: &str) {
        self.push(format!("removed:{stage}:{name}"));
    }

    fn skipped(&self, stage: &str, target: &str) {
        self.push(format!("skipped:{stage}:{target}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_ou_is_rejected() {
        let cloud = InMemoryCloud::new();
        cloud
            .create_organizational_unit(ROOT_ID, "Logging")
            .await
            .unwrap();
        let err = cloud
            .create_organizational_unit(ROOT_ID, "Logging")
            .await
            .unwrap_err();
        assert_eq!(
            err.remote_code(),
            Some("DuplicateOrganizationalUnitException")
        );
    }

    #[tokio::test]
    async fn test_move_to_current_parent_is_already_in_destination() {
        let cloud = InMemoryCloud::new();
        let account = cloud.add_account("sandbox", "sandbox@example.com", ROOT_ID);
        let outcome = cloud
            .move_account(&account, ROOT_ID, ROOT_ID)
            .await
            .unwrap();
        assert_eq!(outcome, MoveOutcome::AlreadyInDestination);
    }

    #[tokio::test]
    async fn test_injected_failure_is_journaled() {
        let cloud = InMemoryCloud::new();
        cloud.fail_calls("attach:", "PolicyNotFoundException");
        let err = cloud.attach_policy("p-1", ROOT_ID).await.unwrap_err();
        assert_eq!(err.remote_code(), Some("PolicyNotFoundException"));
        assert_eq!(cloud.journal(), vec![format!("attach:p-1:{ROOT_ID}")]);
    }

    #[tokio::test]
    async fn test_closed_account_cannot_be_assumed() {
        let cloud = InMemoryCloud::new();
        let account = cloud.add_account("sandbox", "sandbox@example.com", ROOT_ID);
        cloud.close_account(&account).await.unwrap();
        assert!(cloud.stacks_for(&account, "us-east-1").await.is_err());
    }
}
