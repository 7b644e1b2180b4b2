//! Organization hierarchy model

use serde::{Deserialize, Serialize};

/// Kind of node in the organization tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    OrganizationalUnit,
    Account,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Root => write!(f, "root"),
            NodeKind::OrganizationalUnit => write!(f, "organizational-unit"),
            NodeKind::Account => write!(f, "account"),
        }
    }
}

/// A node in the organization tree (root, OU or account)
///
/// Every node other than the root has exactly one parent at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub parent_id: Option<String>,
}

impl OrganizationNode {
    pub fn root(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: "Root".to_string(),
            kind: NodeKind::Root,
            parent_id: None,
        }
    }

    pub fn organizational_unit(
        id: impl Into<String>,
        name: impl Into<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::OrganizationalUnit,
            parent_id: Some(parent_id.into()),
        }
    }

    pub fn is_root(&self) -> bool {
        self.kind == NodeKind::Root
    }
}

/// Lifecycle status of a member account as reported by the listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Suspended,
    PendingClosure,
    Other(String),
}

impl AccountStatus {
    /// Parse the control plane's status string (e.g. "ACTIVE")
    pub fn parse(value: &str) -> Self {
        match value {
            "ACTIVE" => AccountStatus::Active,
            "SUSPENDED" => AccountStatus::Suspended,
            "PENDING_CLOSURE" => AccountStatus::PendingClosure,
            other => AccountStatus::Other(other.to_string()),
        }
    }

    /// Whether closure has already been requested for the account
    pub fn is_closing(&self) -> bool {
        matches!(self, AccountStatus::Suspended | AccountStatus::PendingClosure)
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountStatus::Active => write!(f, "active"),
            AccountStatus::Suspended => write!(f, "suspended"),
            AccountStatus::PendingClosure => write!(f, "pending-closure"),
            AccountStatus::Other(s) => write!(f, "{}", s.to_lowercase()),
        }
    }
}

/// One row of the live account listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub status: AccountStatus,
}

/// Where a stack lives and what it deploys
///
/// Identified by `(account_id, region, stack_name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackTarget {
    pub stack_name: String,
    pub account_id: String,
    pub region: String,
    pub template_body: String,
}

impl StackTarget {
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.account_id, self.region, self.stack_name)
    }
}
