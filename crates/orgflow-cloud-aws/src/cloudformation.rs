//! CloudFormation client acting as one member account

use crate::error::{missing_field, remote_error};
use async_trait::async_trait;
use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::error::ProvideErrorMetadata;
use aws_sdk_cloudformation::types::{Capability, Stack};
use orgflow_cloud::{
    Result, StackClient, StackDescription, StackOutput, StackStatus, UpdateOutcome,
};

/// CloudFormation reports both "nothing to update" and "no such stack" as
/// this code; only the message tells them apart.
const VALIDATION_ERROR: &str = "ValidationError";
const NO_UPDATES: &str = "No updates are to be performed";
const DOES_NOT_EXIST: &str = "does not exist";

pub struct AwsCloudFormation {
    client: Client,
}

impl AwsCloudFormation {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Classify an UpdateStack rejection that is not a real failure
fn update_outcome_for_error(code: Option<&str>, message: Option<&str>) -> Option<UpdateOutcome> {
    if code != Some(VALIDATION_ERROR) {
        return None;
    }
    let message = message?;
    if message.contains(NO_UPDATES) {
        Some(UpdateOutcome::NoChanges)
    } else if message.contains(DOES_NOT_EXIST) {
        Some(UpdateOutcome::StackMissing)
    } else {
        None
    }
}

fn is_missing_stack(code: Option<&str>, message: Option<&str>) -> bool {
    code == Some(VALIDATION_ERROR) && message.is_some_and(|m| m.contains(DOES_NOT_EXIST))
}

fn convert_stack(stack: &Stack) -> StackDescription {
    StackDescription {
        stack_id: stack.stack_id().unwrap_or_default().to_string(),
        stack_name: stack.stack_name().to_string(),
        status: StackStatus::parse(stack.stack_status().as_str()),
        status_reason: stack.stack_status_reason().map(str::to_string),
        outputs: stack
            .outputs()
            .iter()
            .filter_map(|output| {
                Some(StackOutput {
                    key: output.output_key()?.to_string(),
                    value: output.output_value().unwrap_or_default().to_string(),
                })
            })
            .collect(),
    }
}

#[async_trait]
impl StackClient for AwsCloudFormation {
    async fn create_stack(&self, stack_name: &str, template_body: &str) -> Result<String> {
        let output = self
            .client
            .create_stack()
            .stack_name(stack_name)
            .template_body(template_body)
            .capabilities(Capability::CapabilityNamedIam)
            .send()
            .await
            .map_err(|e| remote_error("CreateStack", e))?;

        output
            .stack_id()
            .map(str::to_string)
            .ok_or_else(|| missing_field("CreateStack", "StackId"))
    }

    async fn update_stack(&self, stack_name: &str, template_body: &str) -> Result<UpdateOutcome> {
        let result = self
            .client
            .update_stack()
            .stack_name(stack_name)
            .template_body(template_body)
            .capabilities(Capability::CapabilityNamedIam)
            .send()
            .await;

        match result {
            Ok(output) => Ok(UpdateOutcome::Submitted {
                stack_id: output.stack_id().unwrap_or(stack_name).to_string(),
            }),
            Err(err) => match update_outcome_for_error(err.code(), err.message()) {
                Some(outcome) => Ok(outcome),
                None => Err(remote_error("UpdateStack", err)),
            },
        }
    }

    async fn describe_stack(&self, stack_name: &str) -> Result<Option<StackDescription>> {
        let result = self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await;

        match result {
            Ok(output) => Ok(output.stacks().first().map(convert_stack)),
            Err(err) if is_missing_stack(err.code(), err.message()) => Ok(None),
            Err(err) => Err(remote_error("DescribeStacks", err)),
        }
    }

    async fn delete_stack(&self, stack_name: &str) -> Result<()> {
        self.client
            .delete_stack()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| remote_error("DeleteStack", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_cloudformation::primitives::DateTime;
    use aws_sdk_cloudformation::types::{Output, StackStatus as SdkStackStatus};

    #[test]
    fn test_no_updates_is_no_changes() {
        assert_eq!(
            update_outcome_for_error(
                Some("ValidationError"),
                Some("No updates are to be performed.")
            ),
            Some(UpdateOutcome::NoChanges)
        );
    }

    #[test]
    fn test_missing_stack_falls_back_to_create() {
        assert_eq!(
            update_outcome_for_error(
                Some("ValidationError"),
                Some("Stack [landing-zone-logging] does not exist")
            ),
            Some(UpdateOutcome::StackMissing)
        );
    }

    #[test]
    fn test_other_errors_are_not_reinterpreted() {
        assert_eq!(
            update_outcome_for_error(Some("AccessDenied"), Some("Stack does not exist")),
            None
        );
        assert_eq!(
            update_outcome_for_error(Some("ValidationError"), Some("Template format error")),
            None
        );
        assert_eq!(update_outcome_for_error(Some("ValidationError"), None), None);
    }

    #[test]
    fn test_describe_missing_stack() {
        assert!(is_missing_stack(
            Some("ValidationError"),
            Some("Stack with id landing-zone-logging does not exist")
        ));
        assert!(!is_missing_stack(Some("Throttling"), Some("Rate exceeded")));
    }

    #[test]
    fn test_convert_stack() {
        let stack = Stack::builder()
            .stack_id("arn:aws:cloudformation:us-east-1:111122223333:stack/landing-zone-logging/1")
            .stack_name("landing-zone-logging")
            .stack_status(SdkStackStatus::UpdateRollbackComplete)
            .stack_status_reason("Bucket already exists")
            .creation_time(DateTime::from_secs(1_700_000_000))
            .outputs(
                Output::builder()
                    .output_key("BucketName")
                    .output_value("logs-111122223333")
                    .build(),
            )
            .build()
            .unwrap();

        let description = convert_stack(&stack);

        assert_eq!(description.status, StackStatus::UpdateRollbackComplete);
        assert_eq!(
            description.status_reason.as_deref(),
            Some("Bucket already exists")
        );
        assert_eq!(description.outputs[0].key, "BucketName");
    }
}
