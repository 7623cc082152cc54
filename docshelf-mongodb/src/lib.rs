//! MongoDB backend implementation for docshelf.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait,
//! enabling persistent document storage with full query support using MongoDB's querying capabilities.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docshelf = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Features
//!
//! - **Persistent storage** - Data is persisted to MongoDB Atlas or self-hosted MongoDB
//! - **Full query support** - Leverages MongoDB's query engine for filtering, projection and sorting
//! - **Aggregation** - Pipelines run natively as `$match`/`$group`/`$project` stages
//! - **Indexing** - Single-field and compound indexes, with hint support
//! - **Plan inspection** - Explain reports parsed from the server's `explain` command
//! - **Async/await** - Fully asynchronous API built on MongoDB's async driver
//!
//! # Connection
//!
//! To use this backend, you need a MongoDB connection string. This can be provided
//! through the builder pattern.
//!
//! # Example
//!
//! ```ignore
//! use docshelf::{backend::StoreBackendBuilder, mongodb::MongoDbStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MongoDbStore::builder("mongodb://localhost:27017", "my_database")
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docshelf_mongodb;

pub mod store;

mod explain;
mod pipeline;
mod query;
mod sanitizer;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
