//! Result type alias for distsync operations.

use super::dist_error::DistError;

/// Type alias for Results using DistError.
pub type DistResult<T> = Result<T, DistError>;

/// Extension trait for logging a failure on its way up.
pub trait ResultExt<T> {
    /// Log the error (if any) at `warn` with the operation name and error
    /// code, then hand the result back unchanged.
    ///
    /// ```ignore
    /// repository.delete_instance(id).await.log_failure("delete_instance")?;
    /// ```
    fn log_failure(self, operation: &str) -> DistResult<T>;
}

impl<T> ResultExt<T> for DistResult<T> {
    fn log_failure(self, operation: &str) -> DistResult<T> {
        if let Err(err) = &self {
            tracing::warn!(
                operation,
                code = err.error_code(),
                category = %err.category(),
                error = %err,
                "Operation failed"
            );
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    #[test]
    fn test_log_failure_passes_value_through() {
        let ok: DistResult<u8> = Ok(7);
        assert_eq!(ok.log_failure("noop").unwrap(), 7);

        let err: DistResult<u8> = Err(ValidationError::NoImages.into());
        assert_eq!(
            err.log_failure("preheat").unwrap_err(),
            DistError::Validation(ValidationError::NoImages)
        );
    }
}
