//! Storage backend abstraction for the document store.
//!
//! This module defines the core traits that abstract over different storage implementations,
//! allowing the document store to work with various backends (in-memory, MongoDB, etc.).
//!
//! # Overview
//!
//! The [`StoreBackend`] trait provides a unified async interface for all storage operations:
//! document insertion, retrieval, filtered finds, filter-based single-document updates and
//! deletes, aggregation pipelines, index management, plan inspection and collection
//! administration. Implementations are required to be thread-safe (`Send + Sync`) and
//! support concurrent access.
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`DynStoreBackend`]: A trait for dynamic dispatch over backend implementations
//! - [`StoreBackendBuilder`]: Factory trait for creating backend instances
//!
//! # Examples
//!
//! ```ignore
//! use docshelf::backend::StoreBackend;
//! use docshelf::query::{FindQuery, Filter};
//!
//! let backend = MyBackendImpl::new();
//!
//! let query = FindQuery::builder()
//!     .filter(Filter::eq("genre", "Fiction"))
//!     .build();
//! let fiction = backend.find_documents(query, "books").await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::{Bson, Document, Uuid};
use std::{any::Any, fmt::Debug};

use crate::{
    error::DocumentStoreResult,
    explain::ExplainReport,
    index::{IndexInfo, IndexSpec},
    pipeline::Pipeline,
    query::{Expr, FindQuery},
};

/// Abstract interface for document storage backends.
///
/// Implementers of this trait provide concrete storage strategies for documents,
/// from a simple in-memory store to an external document database. The trait defines
/// the essential operations for document lifecycle, querying, aggregation, index
/// management, plan inspection and collection administration.
///
/// # Thread Safety
///
/// All implementations must be thread-safe and support concurrent access from multiple
/// async tasks. The exact concurrency model is implementation-specific.
///
/// # Error Handling
///
/// Operations return [`DocumentStoreResult<T>`](crate::error::DocumentStoreResult).
/// Implementers should document which error variants may be returned by each operation.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts new documents into a collection.
    ///
    /// The collection is created automatically if it doesn't exist. Inserting an ID
    /// that already exists is an error.
    ///
    /// # Arguments
    ///
    /// * `documents` - A vector of (UUID, BSON document) pairs to insert
    /// * `collection` - The name of the collection to insert into
    async fn insert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()>;

    /// Replaces existing documents in a collection by ID.
    ///
    /// If a document with the specified ID does not exist, the backend returns
    /// [`DocumentNotFound`](crate::error::DocumentStoreError::DocumentNotFound).
    ///
    /// # Arguments
    ///
    /// * `documents` - A vector of (UUID, BSON document) pairs with updated content
    /// * `collection` - The name of the collection containing the documents
    async fn update_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()>;

    /// Sets fields on the first document matching a filter.
    ///
    /// This is the single-document update-by-filter operation: at most one document
    /// is modified, and each field of `set` is written into it. Which document is
    /// "first" is backend-defined when the filter matches more than one.
    ///
    /// # Arguments
    ///
    /// * `filter` - The filter expression selecting the document
    /// * `set` - Field names and values to set on the matched document
    /// * `collection` - The name of the collection
    ///
    /// # Returns
    ///
    /// The number of documents modified (0 or 1).
    async fn update_where(
        &self,
        filter: Expr,
        set: Document,
        collection: &str,
    ) -> DocumentStoreResult<u64>;

    /// Deletes documents from a collection by their IDs.
    ///
    /// # Arguments
    ///
    /// * `ids` - A vector of document UUIDs to delete
    /// * `collection` - The name of the collection to delete from
    async fn delete_documents(&self, ids: Vec<Uuid>, collection: &str) -> DocumentStoreResult<()>;

    /// Deletes the first document matching a filter.
    ///
    /// At most one document is removed.
    ///
    /// # Arguments
    ///
    /// * `filter` - The filter expression selecting the document
    /// * `collection` - The name of the collection
    ///
    /// # Returns
    ///
    /// The number of documents deleted (0 or 1).
    async fn delete_where(&self, filter: Expr, collection: &str) -> DocumentStoreResult<u64>;

    /// Retrieves documents from a collection by their IDs.
    ///
    /// If a document ID doesn't exist, it is omitted from the results.
    ///
    /// # Arguments
    ///
    /// * `ids` - A vector of document UUIDs to retrieve
    /// * `collection` - The name of the collection to query
    async fn get_documents(
        &self,
        ids: Vec<Uuid>,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>>;

    /// Finds documents in a collection using a structured query.
    ///
    /// Applies the query's filter, sort, skip, limit and projection, honoring any
    /// index hint it carries.
    ///
    /// # Arguments
    ///
    /// * `query` - The [`FindQuery`] specifying filters, projection, sorting and pagination
    /// * `collection` - The name of the collection to query
    ///
    /// # Returns
    ///
    /// A vector of matching BSON documents (projected when the query requests it).
    async fn find_documents(
        &self,
        query: FindQuery,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>>;

    /// Runs an aggregation pipeline over a collection.
    ///
    /// # Arguments
    ///
    /// * `pipeline` - The [`Pipeline`] of stages to apply
    /// * `collection` - The name of the collection to aggregate
    ///
    /// # Returns
    ///
    /// The documents produced by the final stage.
    async fn aggregate(
        &self,
        pipeline: Pipeline,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>>;

    /// Creates an index on a collection.
    ///
    /// Creating an index that already exists with an identical specification is a
    /// no-op. A name collision with a different specification is
    /// [`IndexAlreadyExists`](crate::error::DocumentStoreError::IndexAlreadyExists).
    ///
    /// # Arguments
    ///
    /// * `spec` - The index specification (fields, orders, uniqueness)
    /// * `collection` - The name of the collection
    async fn create_index(&self, spec: IndexSpec, collection: &str) -> DocumentStoreResult<()>;

    /// Lists the indexes of a collection.
    ///
    /// # Arguments
    ///
    /// * `collection` - The name of the collection
    async fn list_indexes(&self, collection: &str) -> DocumentStoreResult<Vec<IndexInfo>>;

    /// Drops an index from a collection by name.
    ///
    /// # Arguments
    ///
    /// * `name` - The index name (see [`IndexSpec::name`])
    /// * `collection` - The name of the collection
    ///
    /// # Errors
    ///
    /// Returns [`IndexNotFound`](crate::error::DocumentStoreError::IndexNotFound) if
    /// no index with that name exists.
    async fn drop_index(&self, name: &str, collection: &str) -> DocumentStoreResult<()>;

    /// Explains a find query: executes it and reports the access plan and
    /// execution statistics.
    ///
    /// The query's [`Hint`](crate::query::Hint) is honored, so explain can be used
    /// to compare a forced collection scan against a forced index.
    ///
    /// # Arguments
    ///
    /// * `query` - The [`FindQuery`] to explain
    /// * `collection` - The name of the collection
    async fn explain_find(
        &self,
        query: FindQuery,
        collection: &str,
    ) -> DocumentStoreResult<ExplainReport>;

    /// Creates a new collection with the specified name.
    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()>;

    /// Drops (deletes) a collection and all its documents and indexes.
    ///
    /// # Warning
    ///
    /// This operation is irreversible.
    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()>;

    /// Lists the names of all collections in the store.
    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op, but backends with external
    /// connections should override this.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn insert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        (*self)
            .insert_documents(documents, collection)
            .await
    }

    async fn update_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        (*self)
            .update_documents(documents, collection)
            .await
    }

    async fn update_where(
        &self,
        filter: Expr,
        set: Document,
        collection: &str,
    ) -> DocumentStoreResult<u64> {
        (*self)
            .update_where(filter, set, collection)
            .await
    }

    async fn delete_documents(&self, ids: Vec<Uuid>, collection: &str) -> DocumentStoreResult<()> {
        (*self)
            .delete_documents(ids, collection)
            .await
    }

    async fn delete_where(&self, filter: Expr, collection: &str) -> DocumentStoreResult<u64> {
        (*self)
            .delete_where(filter, collection)
            .await
    }

    async fn get_documents(
        &self,
        ids: Vec<Uuid>,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        (*self)
            .get_documents(ids, collection)
            .await
    }

    async fn find_documents(
        &self,
        query: FindQuery,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        (*self)
            .find_documents(query, collection)
            .await
    }

    async fn aggregate(
        &self,
        pipeline: Pipeline,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        (*self)
            .aggregate(pipeline, collection)
            .await
    }

    async fn create_index(&self, spec: IndexSpec, collection: &str) -> DocumentStoreResult<()> {
        (*self)
            .create_index(spec, collection)
            .await
    }

    async fn list_indexes(&self, collection: &str) -> DocumentStoreResult<Vec<IndexInfo>> {
        (*self).list_indexes(collection).await
    }

    async fn drop_index(&self, name: &str, collection: &str) -> DocumentStoreResult<()> {
        (*self)
            .drop_index(name, collection)
            .await
    }

    async fn explain_find(
        &self,
        query: FindQuery,
        collection: &str,
    ) -> DocumentStoreResult<ExplainReport> {
        (*self)
            .explain_find(query, collection)
            .await
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        (*self).create_collection(name).await
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        (*self).drop_collection(name).await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        (*self).list_collections().await
    }
}

#[async_trait]
pub trait DynStoreBackend: Send + Sync + Debug {
    async fn insert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()>;
    async fn update_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()>;
    async fn update_where(
        &self,
        filter: Expr,
        set: Document,
        collection: &str,
    ) -> DocumentStoreResult<u64>;
    async fn delete_documents(&self, ids: Vec<Uuid>, collection: &str) -> DocumentStoreResult<()>;
    async fn delete_where(&self, filter: Expr, collection: &str) -> DocumentStoreResult<u64>;
    async fn get_documents(
        &self,
        ids: Vec<Uuid>,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>>;
    async fn find_documents(
        &self,
        query: FindQuery,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>>;
    async fn aggregate(
        &self,
        pipeline: Pipeline,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>>;
    async fn create_index(&self, spec: IndexSpec, collection: &str) -> DocumentStoreResult<()>;
    async fn list_indexes(&self, collection: &str) -> DocumentStoreResult<Vec<IndexInfo>>;
    async fn drop_index(&self, name: &str, collection: &str) -> DocumentStoreResult<()>;
    async fn explain_find(
        &self,
        query: FindQuery,
        collection: &str,
    ) -> DocumentStoreResult<ExplainReport>;
    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()>;
    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()>;
    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>>;
    async fn shutdown_boxed(self: Box<Self>) -> DocumentStoreResult<()>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

#[async_trait]
impl<B: StoreBackend + Send + Sync + 'static> DynStoreBackend for B {
    async fn insert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        self.insert_documents(documents, collection)
            .await
    }

    async fn update_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        self.update_documents(documents, collection)
            .await
    }

    async fn update_where(
        &self,
        filter: Expr,
        set: Document,
        collection: &str,
    ) -> DocumentStoreResult<u64> {
        self.update_where(filter, set, collection)
            .await
    }

    async fn delete_documents(&self, ids: Vec<Uuid>, collection: &str) -> DocumentStoreResult<()> {
        self.delete_documents(ids, collection)
            .await
    }

    async fn delete_where(&self, filter: Expr, collection: &str) -> DocumentStoreResult<u64> {
        self.delete_where(filter, collection)
            .await
    }

    async fn get_documents(
        &self,
        ids: Vec<Uuid>,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        self.get_documents(ids, collection)
            .await
    }

    async fn find_documents(
        &self,
        query: FindQuery,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        self.find_documents(query, collection)
            .await
    }

    async fn aggregate(
        &self,
        pipeline: Pipeline,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        self.aggregate(pipeline, collection)
            .await
    }

    async fn create_index(&self, spec: IndexSpec, collection: &str) -> DocumentStoreResult<()> {
        self.create_index(spec, collection)
            .await
    }

    async fn list_indexes(&self, collection: &str) -> DocumentStoreResult<Vec<IndexInfo>> {
        self.list_indexes(collection).await
    }

    async fn drop_index(&self, name: &str, collection: &str) -> DocumentStoreResult<()> {
        self.drop_index(name, collection).await
    }

    async fn explain_find(
        &self,
        query: FindQuery,
        collection: &str,
    ) -> DocumentStoreResult<ExplainReport> {
        self.explain_find(query, collection)
            .await
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.create_collection(name).await
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.drop_collection(name).await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        self.list_collections().await
    }

    async fn shutdown_boxed(self: Box<Self>) -> DocumentStoreResult<()> {
        self.shutdown().await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
