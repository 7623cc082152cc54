//! In-memory document storage backend for docshelf.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is ideal for development,
//! testing, and small-scale deployments.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Type-erased storage** - Stores documents as BSON for flexibility
//! - **Full query support** - Filtering, projection, sorting and pagination
//! - **Real indexing** - Single-field and compound secondary indexes maintained on
//!   every write, with hint support and honest explain reports
//! - **Aggregation** - Match, group, project, sort and pagination stages
//!
//! # Quick Start
//!
//! ```ignore
//! use docshelf::{Document, DocumentStore, memory::InMemoryStore};
//! use bson::Uuid;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Book {
//!     pub id: Uuid,
//!     pub title: String,
//! }
//!
//! impl Document for Book {
//!     fn id(&self) -> &Uuid { &self.id }
//!     fn collection_name() -> &'static str { "books" }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryStore::builder().build().await?;
//!     let store = DocumentStore::new(backend);
//!     let books = store.typed_collection::<Book>();
//!
//!     let book = Book {
//!         id: Uuid::new(),
//!         title: "Dune".to_string(),
//!     };
//!
//!     books.insert(vec![book.clone()]).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docshelf_memory;

pub mod store;

mod aggregate;
mod evaluator;
mod index;
mod keys;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
