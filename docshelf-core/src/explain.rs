//! Query-plan and execution-statistics reporting.
//!
//! Explaining a find query executes it and reports which access path the backend
//! chose (a full collection scan or a named index scan) together with execution
//! statistics: documents returned, documents and index keys examined, and the
//! elapsed execution time. Comparing reports before and after index creation, or
//! under different [`Hint`](crate::query::Hint)s, is the intended workflow.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The access path chosen for a find query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessPlan {
    /// A full linear scan of all documents in the collection.
    CollectionScan,
    /// A lookup using the named index.
    IndexScan {
        /// Name of the index used.
        index: String,
    },
}

/// Execution statistics gathered while running a find query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStats {
    /// Number of documents returned to the caller.
    pub returned: u64,
    /// Number of documents fetched and evaluated against the filter.
    pub documents_examined: u64,
    /// Number of index keys examined (0 for a collection scan).
    pub keys_examined: u64,
    /// Elapsed execution time.
    pub execution_time: Duration,
}

/// The result of explaining a find query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainReport {
    /// The winning access plan.
    pub plan: AccessPlan,
    /// Statistics from actually executing the query.
    pub stats: ExecutionStats,
}

impl ExplainReport {
    /// Returns the name of the index used, or `None` for a collection scan.
    pub fn used_index(&self) -> Option<&str> {
        match &self.plan {
            AccessPlan::IndexScan { index } => Some(index),
            AccessPlan::CollectionScan => None,
        }
    }

    /// Returns true when the query was satisfied by a collection scan.
    pub fn is_collection_scan(&self) -> bool {
        matches!(self.plan, AccessPlan::CollectionScan)
    }
}
