//! Convenient re-exports of commonly used types from docshelf.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use docshelf::prelude::*;
//! ```
//!
//! This provides access to:
//! - Document traits and implementations
//! - Store backends and builders
//! - Query construction, filtering, projection and hints
//! - Aggregation pipelines and accumulators
//! - Index specifications and explain reports
//! - Collection interfaces and error types

pub use docshelf_core::{
    backend::{DynStoreBackend, StoreBackend, StoreBackendBuilder},
    collection::{Collection, DynCollection, DynTypedCollection, TypedCollection},
    document::{Document, DocumentExt},
    error::{DocumentStoreError, DocumentStoreResult},
    explain::{AccessPlan, ExecutionStats, ExplainReport},
    index::{IndexInfo, IndexKey, IndexSpec, Order},
    page::{Page, PaginationParams},
    pipeline::{Accumulator, Pipeline, PipelineBuilder, Stage, ValueExpr},
    query::{
        Expr, FieldOp, Filter, FindQuery, FindQueryBuilder, Hint, Projection, QueryVisitor, Sort,
        SortDirection,
    },
    store::{
        AsDynDocumentStore, AsStaticDocumentStore, DocumentStore, DynDocumentStore,
        DynDocumentStoreRef, IntoDynDocumentStore, IntoStaticDocumentStore,
    },
};
