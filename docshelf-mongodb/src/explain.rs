//! Parsing of MongoDB `explain` command output.
//!
//! MongoDB reports its plan as a tree of stages under
//! `queryPlanner.winningPlan`, with execution counters under
//! `executionStats`. This module reduces that tree to the backend-neutral
//! [`ExplainReport`]: any `IXSCAN` stage in the winning plan means an index
//! scan, otherwise the query was a collection scan.

use bson::{Bson, Document};
use std::time::Duration;

use docshelf_core::explain::{AccessPlan, ExecutionStats, ExplainReport};

fn counter(doc: &Document, key: &str) -> u64 {
    match doc.get(key) {
        Some(Bson::Int32(value)) => (*value).max(0) as u64,
        Some(Bson::Int64(value)) => (*value).max(0) as u64,
        Some(Bson::Double(value)) => {
            if *value > 0.0 { *value as u64 } else { 0 }
        }
        _ => 0,
    }
}

/// Walks a winning-plan stage tree looking for an index scan.
fn plan_from_stage(stage: &Document) -> AccessPlan {
    if matches!(stage.get_str("stage"), Ok("IXSCAN")) {
        if let Ok(name) = stage.get_str("indexName") {
            return AccessPlan::IndexScan { index: name.to_string() };
        }
    }

    if let Ok(input) = stage.get_document("inputStage") {
        if let found @ AccessPlan::IndexScan { .. } = plan_from_stage(input) {
            return found;
        }
    }

    if let Ok(inputs) = stage.get_array("inputStages") {
        for input in inputs {
            if let Some(input) = input.as_document() {
                if let found @ AccessPlan::IndexScan { .. } = plan_from_stage(input) {
                    return found;
                }
            }
        }
    }

    AccessPlan::CollectionScan
}

/// Builds an [`ExplainReport`] from a raw `explain` command response.
pub(crate) fn report_from_response(response: &Document) -> ExplainReport {
    let plan = response
        .get_document("queryPlanner")
        .ok()
        .and_then(|planner| planner.get_document("winningPlan").ok())
        .map(plan_from_stage)
        .unwrap_or(AccessPlan::CollectionScan);

    let stats = response
        .get_document("executionStats")
        .map(|stats| ExecutionStats {
            returned: counter(stats, "nReturned"),
            documents_examined: counter(stats, "totalDocsExamined"),
            keys_examined: counter(stats, "totalKeysExamined"),
            execution_time: Duration::from_millis(counter(stats, "executionTimeMillis")),
        })
        .unwrap_or_default();

    ExplainReport { plan, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn collection_scan_response() {
        let response = doc! {
            "queryPlanner": { "winningPlan": { "stage": "COLLSCAN", "direction": "forward" } },
            "executionStats": {
                "nReturned": 2,
                "executionTimeMillis": 1,
                "totalKeysExamined": 0,
                "totalDocsExamined": 10,
            },
        };

        let report = report_from_response(&response);
        assert!(report.is_collection_scan());
        assert_eq!(report.stats.returned, 2);
        assert_eq!(report.stats.documents_examined, 10);
        assert_eq!(report.stats.keys_examined, 0);
    }

    #[test]
    fn index_scan_found_through_fetch_stage() {
        let response = doc! {
            "queryPlanner": { "winningPlan": {
                "stage": "FETCH",
                "inputStage": {
                    "stage": "IXSCAN",
                    "indexName": "title_1",
                    "keyPattern": { "title": 1 },
                },
            } },
            "executionStats": {
                "nReturned": 1,
                "executionTimeMillis": 0,
                "totalKeysExamined": 1,
                "totalDocsExamined": 1,
            },
        };

        let report = report_from_response(&response);
        assert_eq!(report.used_index(), Some("title_1"));
        assert_eq!(report.stats.keys_examined, 1);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let report = report_from_response(&doc! {});
        assert!(report.is_collection_scan());
        assert_eq!(report.stats, ExecutionStats::default());
    }
}
