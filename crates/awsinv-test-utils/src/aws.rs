//! AWS test utilities
//!
//! Provides region detection for integration tests that talk to real AWS.

/// Get the AWS region for tests.
///
/// Checks environment variables in order:
/// 1. AWS_REGION
/// 2. AWS_DEFAULT_REGION
/// 3. Falls back to us-east-1
///
/// # Example
///
/// ```
/// use awsinv_test_utils::aws::get_test_region;
///
/// let region = get_test_region();
/// assert!(!region.is_empty());
/// ```
pub fn get_test_region() -> String {
    std::env::var("AWS_REGION")
        .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
        .unwrap_or_else(|_| "us-east-1".to_string())
}

/// Regions for multi-region integration tests.
///
/// Reads a comma-separated `AWSINV_TEST_REGIONS`, falling back to
/// [`get_test_region`] alone.
pub fn get_test_regions() -> Vec<String> {
    match std::env::var("AWSINV_TEST_REGIONS") {
        Ok(list) => list
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect(),
        Err(_) => vec![get_test_region()],
    }
}
