//! OrgFlow Cloud Orchestration
//!
//! This crate holds the orchestration engine for provisioning and tearing
//! down a multi-account cloud organization.
//!
//! # Components
//!
//! - **Account Provisioner**: asynchronous account creation, placement into
//!   organizational units, closure and name lookups
//! - **Stack Deployer**: idempotent create-or-update of per-account stacks
//! - **Sequencer**: runs a [`DeploymentPlan`] stage by stage, forward for
//!   launch and reversed for cleanup
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  OrgFlow CLI                     │
//! │              (orgflow launch/cleanup)            │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                orgflow-cloud                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │               Sequencer                   │   │
//! │  └──────┬───────────────────────┬───────────┘   │
//! │  ┌──────▼───────────┐  ┌────────▼─────────┐     │
//! │  │ AccountProvisioner│  │  StackDeployer   │     │
//! │  └──────┬───────────┘  └────────┬─────────┘     │
//! │  ┌──────▼───────────────────────▼─────────┐     │
//! │  │ trait OrganizationsClient / StackScope │     │
//! │  └──────────────────┬─────────────────────┘     │
//! └─────────────────────┼───────────────────────────┘
//!                       │
//!               ┌───────▼───────┐
//!               │    aws sdk    │
//!               │  (orgflow-    │
//!               │   cloud-aws)  │
//!               └───────────────┘
//! ```

pub mod account;
pub mod client;
pub mod error;
pub mod model;
pub mod plan;
pub mod poll;
pub mod progress;
pub mod sequencer;
pub mod stack;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-exports
pub use account::{
    AccountCreationRequest, AccountProvisioner, AccountRecord, AccountState, CreateAccountStatus,
    CreationState, FailureReason,
};
pub use client::{
    MoveOutcome, OrganizationsClient, StackClient, StackScope, TemplateSource, UpdateOutcome,
};
pub use error::{CloudError, Result};
pub use model::{AccountStatus, AccountSummary, NodeKind, OrganizationNode, StackTarget};
pub use plan::{
    AccountSpec, DEFAULT_REGION, DEFAULT_STACK_PREFIX, DeploymentPlan, RunOutcome, RunPhase,
    RunResult, Stage, StageOutcome, StageResult, stack_name,
};
pub use poll::{PollOutcome, PollPolicy};
pub use progress::{ProgressObserver, TracingObserver};
pub use sequencer::Sequencer;
pub use stack::{
    DeployAction, StackDeployer, StackDeployment, StackDescription, StackOutput, StackStatus,
};
