use aws_sdk_organizations::error::{DisplayErrorContext, ProvideErrorMetadata};
use orgflow_cloud::CloudError;

/// Map an SDK error onto [`CloudError::RemoteOperation`]
pub(crate) fn remote_error<E>(operation: &str, err: E) -> CloudError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
    CloudError::remote(operation, err.code(), message)
}

/// A required field was absent from an SDK response
pub(crate) fn missing_field(operation: &str, field: &str) -> CloudError {
    CloudError::remote(
        operation,
        None,
        format!("response did not include {field}"),
    )
}
