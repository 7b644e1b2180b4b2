//! Cloud orchestration error types

use crate::account::FailureReason;
use thiserror::Error;

/// Errors raised by the provisioning engine and its control-plane clients
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("{operation} failed: {message}{}", .code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default())]
    RemoteOperation {
        operation: String,
        code: Option<String>,
        message: String,
    },

    #[error("Account '{name}' could not be created: {reason}")]
    AccountCreationFailed { name: String, reason: FailureReason },

    #[error(
        "Account creation request {request_id} did not finish after {attempts} status checks; it may still complete, check again later"
    )]
    ProvisioningTimeout { request_id: String, attempts: u32 },

    #[error(
        "Stack '{stack_name}' did not reach a terminal status after {attempts} status checks; it may still complete, check again later"
    )]
    DeploymentTimeout { stack_name: String, attempts: u32 },

    #[error("Stack '{stack_name}' ended in {status}{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    StackFailed {
        stack_name: String,
        status: String,
        reason: Option<String>,
    },

    #[error(
        "Account {account_id} was created but could not be moved into {destination}: {message}. Move it manually to finish placement"
    )]
    PartialFailure {
        account_id: String,
        destination: String,
        message: String,
    },

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CloudError {
    /// Build a remote-operation error
    pub fn remote(
        operation: impl Into<String>,
        code: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        CloudError::RemoteOperation {
            operation: operation.into(),
            code: code.map(str::to_string),
            message: message.into(),
        }
    }

    /// Error code reported by the control plane, if any
    pub fn remote_code(&self) -> Option<&str> {
        match self {
            CloudError::RemoteOperation { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Whether the failure means "still in progress" rather than "rejected"
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            CloudError::ProvisioningTimeout { .. } | CloudError::DeploymentTimeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
