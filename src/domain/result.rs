//! Result type alias for odk-relay

use super::errors::RelayError;

/// Result type alias for odk-relay operations
///
/// # Examples
///
/// ```
/// use odk_relay::domain::result::Result;
/// use odk_relay::domain::errors::RelayError;
///
/// fn failing_function() -> Result<()> {
///     Err(RelayError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
