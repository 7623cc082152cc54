//! Main docshelf crate providing a unified interface for document storage.
//!
//! This crate is the primary entry point for users of the docshelf framework.
//! It re-exports the core types and functionality from various sub-crates and provides
//! convenient access to different storage backends.
//!
//! # Features
//!
//! - **Type-safe document storage** - Define your data structures with Serde and store them safely
//! - **Multiple backends** - Support for in-memory and MongoDB storage with extensible trait system
//! - **Flexible querying** - Composable find queries with projection, sorting, pagination and hints
//! - **Aggregation** - Grouping, accumulators and computed projections over collections
//! - **Index management** - Single-field and compound indexes, listable and droppable by name
//! - **Plan inspection** - Explain any find query and compare access paths
//!
//! # Quick Start
//!
//! ```ignore
//! use docshelf::{prelude::*, memory::InMemoryStore};
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
//!     fn id(&self) -> &Uuid { &self.id }
//!     fn collection_name() -> &'static str { "books" }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     // Create an in-memory store backend
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await.unwrap());
//!
//!     // Get a typed collection for Book documents
//!     let books = store.typed_collection::<Book>();
//!
//!     let book = Book {
//!         id: Uuid::new(),
//!         title: "Dune".to_string(),
//!         author: "Frank Herbert".to_string(),
//!         genre: "Science Fiction".to_string(),
//!         published_year: 1965,
//!         price: 12.50,
//!         in_stock: true,
//!     };
//!
//!     // Insert the book document
//!     books.insert(vec![book.clone()]).await.unwrap();
//!
//!     // Find science fiction books, cheapest first
//!     let results = books
//!         .find(
//!             FindQuery::builder()
//!                 .filter(Filter::eq("genre", "Science Fiction"))
//!                 .sort("price", SortDirection::Asc)
//!                 .build(),
//!         )
//!         .await
//!         .unwrap();
//!
//!     println!("Found books: {:?}", results);
//!
//!     // Shutdown the store
//!     store.shutdown().await.unwrap();
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! The `docshelf` crate also supports dynamic dispatch for scenarios where backend types
//! are not known at compile time. You can convert a typed `DocumentStore` into a
//! dynamically dispatched store using the `into_dyn` method. This allows for runtime
//! selection of backends and flexible handling of documents without static type information.
//!
//! ```ignore
//! use docshelf::{prelude::*, memory::InMemoryStore};
//!
//! # async fn example() {
//! let store = DocumentStore::new(InMemoryStore::new());
//!
//! // Convert to a dynamically dispatched store
//! let dyn_store = store.into_dyn();
//!
//! // Collections work the same way
//! let books = dyn_store.collection("books");
//! # }
//! ```
//!
//! # Indexes and Explain
//!
//! Collections expose index management and plan inspection, so the classic
//! "watch the collection scan turn into an index scan" workflow works against
//! any backend:
//!
//! ```ignore
//! use docshelf::prelude::*;
//!
//! # async fn example(books: DynCollection<'_>) -> DocumentStoreResult<()> {
//! let query = FindQuery::builder()
//!     .filter(Filter::eq("title", "Dune"))
//!     .build();
//!
//! let before = books.explain(query.clone()).await?;
//! assert!(before.is_collection_scan());
//!
//! books.create_index(IndexSpec::asc("title")).await?;
//!
//! let after = books.explain(query).await?;
//! assert_eq!(after.used_index(), Some("title_1"));
//! # Ok(()) }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires `mongodb` feature)

pub mod prelude;

pub use docshelf_core::{
    backend, collection, document, error, explain, index, page, pipeline, query, store,
};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docshelf_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docshelf_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
