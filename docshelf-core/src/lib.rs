//! A thin document database abstraction layer with a unified interface for querying,
//! aggregation, index management and query-plan inspection.
//!
//! This crate is the core of the docshelf project and provides:
//!
//! - **Document traits** ([`document`]) - Core traits for defining and serializing documents
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing different storage backends
//! - **Query and filtering API** ([`query`]) - Type-safe find queries with filters, projection,
//!   sorting, pagination and index hints
//! - **Aggregation pipelines** ([`pipeline`]) - Multi-stage grouping, accumulation and projection
//! - **Index management** ([`index`]) - Single-field and compound index specifications
//! - **Plan inspection** ([`explain`]) - Query-plan and execution-statistics reporting
//! - **Collections interface** ([`collection`]) - High-level API for interacting with collections
//! - **Document store** ([`store`]) - Main interface for working with typed or untyped documents
//! - **Error handling** ([`error`]) - Comprehensive error types and result types
//! - **Pagination** ([`page`]) - Page and pagination parameter helpers
//!
//! # Example
//!
//! ```ignore
//! use docshelf::{Document, DocumentStore};
//! use bson::Uuid;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Book {
//!     pub id: Uuid,
//!     pub title: String,
//!     pub author: String,
//!     pub genre: String,
//!     pub published_year: i32,
//!     pub price: f64,
//!     pub in_stock: bool,
//! }
//!
//! impl Document for Book {
//!     fn id(&self) -> &Uuid {
//!         &self.id
//!     }
//!
//!     fn collection_name() -> &'static str {
//!         "books"
//!     }
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docshelf_core;

pub mod backend;
pub mod collection;
pub mod document;
pub mod error;
pub mod explain;
pub mod index;
pub mod page;
pub mod pipeline;
pub mod query;
pub mod store;
