//! Request and response types for search index operations.

use crate::errors::SearchIndexError;

/// Result of a batch operation for a single document.
///
/// This struct represents the outcome of one item within a bulk request. It
/// indicates whether the write succeeded and includes error details if it failed.
#[derive(Debug, Clone)]
pub struct BatchOperationResult {
    /// The document id.
    pub document_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<SearchIndexError>,
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// This struct provides a complete overview of a bulk operation, including the total
/// number of items processed, how many succeeded and failed, and detailed results for
/// each individual item.
#[derive(Debug, Clone)]
pub struct BatchOperationSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each item.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// Build a summary from per-document results.
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// True only if no document in the batch failed.
    pub fn is_complete_success(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_results_counts_failures() {
        let summary = BatchOperationSummary::from_results(vec![
            BatchOperationResult {
                document_id: "a".to_string(),
                success: true,
                error: None,
            },
            BatchOperationResult {
                document_id: "b".to_string(),
                success: false,
                error: Some(SearchIndexError::index("mapper_parsing_exception")),
            },
        ]);

        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert!(!summary.is_complete_success());
    }

    #[test]
    fn test_empty_summary_is_success() {
        assert!(BatchOperationSummary::from_results(Vec::new()).is_complete_success());
    }
}
