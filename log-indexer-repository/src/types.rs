//! Response types for search index operations.

/// Result of a batch operation for a single item.
///
/// `position` is the item's index within the submitted batch, so callers can
/// match failures back to the documents they sent.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOperationResult {
    /// Position of the document within the batch.
    pub position: usize,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error reason reported by the cluster if the operation failed.
    pub error: Option<String>,
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// A bulk request can succeed as a whole while some of its documents are
/// rejected; this struct carries both views so callers can handle partial
/// failures gracefully.
#[derive(Debug, Clone, PartialEq)]
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
    /// Summary of an empty batch.
    pub fn empty() -> Self {
        Self {
            total: 0,
            succeeded: 0,
            failed: 0,
            results: Vec::new(),
        }
    }

    /// Build a summary from individual results.
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Iterate over the failed results only.
    pub fn failures(&self) -> impl Iterator<Item = &BatchOperationResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(position: usize, success: bool) -> BatchOperationResult {
        BatchOperationResult {
            position,
            success,
            error: (!success).then(|| "mapper_parsing_exception".to_string()),
        }
    }

    #[test]
    fn test_from_results_counts() {
        let summary = BatchOperationSummary::from_results(vec![
            result(0, true),
            result(1, false),
            result(2, true),
        ]);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures().map(|r| r.position).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchOperationSummary::empty();
        assert_eq!(summary, BatchOperationSummary::from_results(Vec::new()));
        assert_eq!(summary.failures().count(), 0);
    }
}
