//! Collection types for document store operations.
//!
//! This module provides collection abstractions that enable working with documents
//! in a specific collection. It offers both typed collections (with full type safety)
//! and dynamic collections (for working with dynamically dispatched backends).
//!
//! # Collection Types
//!
//! - [`Collection`] - Untyped collection with explicit BSON documents
//! - [`TypedCollection`] - Type-safe collection for a specific document type
//! - [`DynCollection`] - Dynamic dispatch version of untyped collection
//! - [`DynTypedCollection`] - Dynamic dispatch version of typed collection
//!
//! # Example
//!
//! ```ignore
//! use docshelf::document::Document;
//! use docshelf::query::{FindQuery, Filter};
//!
//! # async fn example(store: &docshelf::store::DocumentStore<impl docshelf::backend::StoreBackend>) -> docshelf::error::DocumentStoreResult<()> {
//! let books = store.typed_collection::<Book>();
//!
//! let fiction = books
//!     .find(
//!         FindQuery::builder()
//!             .filter(Filter::eq("genre", "Fiction"))
//!             .build(),
//!     )
//!     .await?;
//! # Ok(()) }
//! ```

use bson::{Bson, Document as BsonDocument, Uuid};
use std::marker::PhantomData;

use crate::{
    backend::{DynStoreBackend, StoreBackend},
    document::{Document, DocumentExt},
    error::DocumentStoreResult,
    explain::ExplainReport,
    index::{IndexInfo, IndexSpec},
    pipeline::Pipeline,
    query::{Expr, FindQuery},
};

fn limited_to_one(mut query: FindQuery) -> FindQuery {
    query.limit = Some(1);
    query
}

/// An untyped collection with a reference to a storage backend.
///
/// This struct provides access to a collection with explicit BSON document handling.
/// All documents are represented as BSON values, providing maximum flexibility
/// but without compile-time type safety.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the backend reference
/// * `B` - The storage backend type
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend> {
    name: String,
    backend: &'a B,
}

impl<'a, B: StoreBackend> Collection<'a, B> {
    /// Creates a new collection reference (internal use).
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts new documents into the collection.
    ///
    /// # Arguments
    ///
    /// * `documents` - A vector of (ID, BSON document) pairs to insert
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentStoreError`](crate::error::DocumentStoreError) if the operation fails.
    pub async fn insert(&self, documents: Vec<(Uuid, Bson)>) -> DocumentStoreResult<()> {
        Ok(self
            .backend
            .insert_documents(documents, self.name())
            .await?)
    }

    /// Replaces existing documents in the collection by ID.
    ///
    /// # Arguments
    ///
    /// * `documents` - A vector of (ID, BSON document) pairs with updated content
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentStoreError`](crate::error::DocumentStoreError) if the operation fails.
    pub async fn update(&self, documents: Vec<(Uuid, Bson)>) -> DocumentStoreResult<()> {
        Ok(self
            .backend
            .update_documents(documents, self.name())
            .await?)
    }

    /// Sets fields on the first document matching a filter.
    ///
    /// # Arguments
    ///
    /// * `filter` - The filter expression selecting the document
    /// * `set` - Field names and values to set on the matched document
    ///
    /// # Returns
    ///
    /// The number of documents modified (0 or 1).
    pub async fn update_where(
        &self,
        filter: Expr,
        set: BsonDocument,
    ) -> DocumentStoreResult<u64> {
        Ok(self
            .backend
            .update_where(filter, set, self.name())
            .await?)
    }

    /// Deletes documents from the collection by their IDs.
    ///
    /// # Arguments
    ///
    /// * `ids` - A vector of document IDs to delete (must implement `Into<Uuid>`)
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentStoreError`](crate::error::DocumentStoreError) if the operation fails.
    pub async fn delete<U>(&self, ids: Vec<U>) -> DocumentStoreResult<()>
    where
        U: Into<Uuid> + Send + Sync + 'static,
    {
        Ok(self
            .backend
            .delete_documents(
                ids.into_iter()
                    .map(Into::into)
                    .collect(),
                self.name(),
            )
            .await?)
    }

    /// Deletes the first document matching a filter.
    ///
    /// # Arguments
    ///
    /// * `filter` - The filter expression selecting the document
    ///
    /// # Returns
    ///
    /// The number of documents deleted (0 or 1).
    pub async fn delete_where(&self, filter: Expr) -> DocumentStoreResult<u64> {
        Ok(self
            .backend
            .delete_where(filter, self.name())
            .await?)
    }

    /// Retrieves documents from the collection by their IDs.
    ///
    /// # Arguments
    ///
    /// * `ids` - A vector of document IDs to retrieve (must implement `Into<Uuid>`)
    ///
    /// # Returns
    ///
    /// A vector of BSON documents found. If a document ID doesn't exist, it is omitted from results.
    pub async fn get<U>(&self, ids: Vec<U>) -> DocumentStoreResult<Vec<Bson>>
    where
        U: Into<Uuid> + Send + Sync + 'static,
    {
        Ok(self
            .backend
            .get_documents(
                ids.into_iter()
                    .map(Into::into)
                    .collect(),
                self.name(),
            )
            .await?)
    }

    /// Finds documents in the collection using a structured query.
    ///
    /// # Arguments
    ///
    /// * `query` - The [`FindQuery`] specifying filters, projection, sorting and pagination
    ///
    /// # Returns
    ///
    /// A vector of BSON documents matching the query criteria.
    pub async fn find(&self, query: FindQuery) -> DocumentStoreResult<Vec<Bson>> {
        Ok(self
            .backend
            .find_documents(query, self.name())
            .await?)
    }

    /// Finds the first document matching a structured query.
    ///
    /// Equivalent to [`find`](Self::find) with the limit forced to 1.
    pub async fn find_one(&self, query: FindQuery) -> DocumentStoreResult<Option<Bson>> {
        Ok(self
            .backend
            .find_documents(limited_to_one(query), self.name())
            .await?
            .into_iter()
            .next())
    }

    /// Runs an aggregation pipeline over the collection.
    ///
    /// # Arguments
    ///
    /// * `pipeline` - The [`Pipeline`] of stages to apply
    ///
    /// # Returns
    ///
    /// The documents produced by the final stage.
    pub async fn aggregate(&self, pipeline: Pipeline) -> DocumentStoreResult<Vec<Bson>> {
        Ok(self
            .backend
            .aggregate(pipeline, self.name())
            .await?)
    }

    /// Creates an index on the collection.
    ///
    /// # Arguments
    ///
    /// * `spec` - The index specification (fields, orders, uniqueness)
    pub async fn create_index(&self, spec: IndexSpec) -> DocumentStoreResult<()> {
        Ok(self
            .backend
            .create_index(spec, self.name())
            .await?)
    }

    /// Lists the indexes of the collection.
    pub async fn list_indexes(&self) -> DocumentStoreResult<Vec<IndexInfo>> {
        Ok(self
            .backend
            .list_indexes(self.name())
            .await?)
    }

    /// Drops the index matching a specification (by its derived name).
    ///
    /// # Arguments
    ///
    /// * `spec` - The specification of the index to drop
    pub async fn drop_index(&self, spec: &IndexSpec) -> DocumentStoreResult<()> {
        Ok(self
            .backend
            .drop_index(&spec.name(), self.name())
            .await?)
    }

    /// Drops an index by name.
    ///
    /// # Arguments
    ///
    /// * `name` - The index name (see [`IndexSpec::name`])
    pub async fn drop_index_named(&self, name: &str) -> DocumentStoreResult<()> {
        Ok(self
            .backend
            .drop_index(name, self.name())
            .await?)
    }

    /// Explains a find query against the collection: executes it and reports the
    /// access plan and execution statistics.
    ///
    /// # Arguments
    ///
    /// * `query` - The [`FindQuery`] to explain
    pub async fn explain(&self, query: FindQuery) -> DocumentStoreResult<ExplainReport> {
        Ok(self
            .backend
            .explain_find(query, self.name())
            .await?)
    }
}

/// A dynamic (type-erased) collection with a reference to a backend trait object.
///
/// This struct provides access to a collection with explicit BSON document handling,
/// similar to [`Collection`], but uses dynamic dispatch via trait objects for backend
/// operations. This enables using different backend implementations at runtime without
/// generic type parameters.
#[derive(Debug)]
pub struct DynCollection<'a> {
    name: String,
    backend: &'a dyn DynStoreBackend,
}

impl<'a> DynCollection<'a> {
    /// Creates a new dynamic collection reference (internal use).
    pub(crate) fn new(name: String, backend: &'a dyn DynStoreBackend) -> Self {
        Self { name, backend }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts new documents into the collection.
    pub async fn insert(&self, documents: Vec<(Uuid, Bson)>) -> DocumentStoreResult<()> {
        Ok(self
            .backend
            .insert_documents(documents, self.name())
            .await?)
    }

    /// Replaces existing documents in the collection by ID.
    pub async fn update(&self, documents: Vec<(Uuid, Bson)>) -> DocumentStoreResult<()> {
        Ok(self
            .backend
            .update_documents(documents, self.name())
            .await?)
    }

    /// Sets fields on the first document matching a filter.
    pub async fn update_where(
        &self,
        filter: Expr,
        set: BsonDocument,
    ) -> DocumentStoreResult<u64> {
        Ok(self
            .backend
            .update_where(filter, set, self.name())
            .await?)
    }

    /// Deletes documents from the collection by their IDs.
    pub async fn delete<U>(&self, ids: Vec<U>) -> DocumentStoreResult<()>
    where
        U: Into<Uuid> + Send + Sync + 'static,
    {
        Ok(self
            .backend
            .delete_documents(
                ids.into_iter()
                    .map(Into::into)
                    .collect(),
                self.name(),
            )
            .await?)
    }

    /// Deletes the first document matching a filter.
    pub async fn delete_where(&self, filter: Expr) -> DocumentStoreResult<u64> {
        Ok(self
            .backend
            .delete_where(filter, self.name())
            .await?)
    }

    /// Retrieves documents from the collection by their IDs.
    pub async fn get<U>(&self, ids: Vec<U>) -> DocumentStoreResult<Vec<Bson>>
    where
        U: Into<Uuid> + Send + Sync + 'static,
    {
        Ok(self
            .backend
            .get_documents(
                ids.into_iter()
                    .map(Into::into)
                    .collect(),
                self.name(),
            )
            .await?)
    }

    /// Finds documents in the collection using a structured query.
    pub async fn find(&self, query: FindQuery) -> DocumentStoreResult<Vec<Bson>> {
        Ok(self
            .backend
            .find_documents(query, self.name())
            .await?)
    }

    /// Finds the first document matching a structured query.
    pub async fn find_one(&self, query: FindQuery) -> DocumentStoreResult<Option<Bson>> {
        Ok(self
            .backend
            .find_documents(limited_to_one(query), self.name())
            .await?
            .into_iter()
            .next())
    }

    /// Runs an aggregation pipeline over the collection.
    pub async fn aggregate(&self, pipeline: Pipeline) -> DocumentStoreResult<Vec<Bson>> {
        Ok(self
            .backend
            .aggregate(pipeline, self.name())
            .await?)
    }

    /// Creates an index on the collection.
    pub async fn create_index(&self, spec: IndexSpec) -> DocumentStoreResult<()> {
        Ok(self
            .backend
            .create_index(spec, self.name())
            .await?)
    }

    /// Lists the indexes of the collection.
    pub async fn list_indexes(&self) -> DocumentStoreResult<Vec<IndexInfo>> {
        Ok(self
            .backend
            .list_indexes(self.name())
            .await?)
    }

    /// Drops the index matching a specification (by its derived name).
    pub async fn drop_index(&self, spec: &IndexSpec) -> DocumentStoreResult<()> {
        Ok(self
            .backend
            .drop_index(&spec.name(), self.name())
            .await?)
    }

    /// Drops an index by name.
    pub async fn drop_index_named(&self, name: &str) -> DocumentStoreResult<()> {
        Ok(self
            .backend
            .drop_index(name, self.name())
            .await?)
    }

    /// Explains a find query against the collection.
    pub async fn explain(&self, query: FindQuery) -> DocumentStoreResult<ExplainReport> {
        Ok(self
            .backend
            .explain_find(query, self.name())
            .await?)
    }
}

#[derive(Debug)]
pub struct TypedCollection<'a, B: StoreBackend, D: Document> {
    name: String,
    backend: &'a B,
    _marker: PhantomData<D>,
}

impl<'a, B: StoreBackend, D: Document> TypedCollection<'a, B, D> {
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend, _marker: PhantomData }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Converts this typed collection to a different document type.
    pub fn with_type<T: Document>(&self) -> TypedCollection<'a, B, T> {
        TypedCollection {
            name: self.name.clone(),
            backend: self.backend,
            _marker: PhantomData,
        }
    }

    /// Inserts new documents into the collection.
    pub async fn insert(&self, documents: Vec<D>) -> DocumentStoreResult<()> {
        Ok(self
            .backend
            .insert_documents(
                documents
                    .into_iter()
                    .map(|d| {
                        d.to_bson()
                            .map(move |b| (d.id().clone(), b))
                    })
                    .collect::<Result<Vec<(Uuid, Bson)>, _>>()?,
                self.name(),
            )
            .await?)
    }

    /// Replaces existing documents in the collection by ID.
    pub async fn update(&self, documents: Vec<D>) -> DocumentStoreResult<()> {
        Ok(self
            .backend
            .update_documents(
                documents
                    .into_iter()
                    .map(|d| {
                        d.to_bson()
                            .map(move |b| (d.id().clone(), b))
                    })
                    .collect::<Result<Vec<(Uuid, Bson)>, _>>()?,
                self.name(),
            )
            .await?)
    }

    /// Sets fields on the first document matching a filter.
    ///
    /// Returns the number of documents modified (0 or 1).
    pub async fn update_where(
        &self,
        filter: Expr,
        set: BsonDocument,
    ) -> DocumentStoreResult<u64> {
        Ok(self
            .backend
            .update_where(filter, set, self.name())
            .await?)
    }

    /// Deletes documents from the collection by their IDs.
    pub async fn delete<U>(&self, ids: Vec<U>) -> DocumentStoreResult<()>
    where
        U: Into<Uuid> + Send + Sync + 'static,
    {
        Ok(self
            .backend
            .delete_documents(
                ids.into_iter()
                    .map(Into::into)
                    .collect(),
                self.name(),
            )
            .await?)
    }

    /// Deletes the first document matching a filter.
    ///
    /// Returns the number of documents deleted (0 or 1).
    pub async fn delete_where(&self, filter: Expr) -> DocumentStoreResult<u64> {
        Ok(self
            .backend
            .delete_where(filter, self.name())
            .await?)
    }

    /// Retrieves documents from the collection by their IDs.
    pub async fn get<U>(&self, ids: Vec<U>) -> DocumentStoreResult<Vec<D>>
    where
        U: Into<Uuid> + Send + Sync + 'static,
    {
        Ok(self
            .backend
            .get_documents(
                ids.into_iter()
                    .map(Into::into)
                    .collect(),
                self.name(),
            )
            .await?
            .into_iter()
            .map(|doc| D::from_bson(doc))
            .collect::<Result<Vec<D>, _>>()?)
    }

    /// Finds documents in the collection using a structured query.
    ///
    /// The query must not carry a projection; projected documents are partial and
    /// cannot round-trip through `D`. Use [`project`](Self::project) for that.
    pub async fn find(&self, query: FindQuery) -> DocumentStoreResult<Vec<D>> {
        Ok(self
            .backend
            .find_documents(query, self.name())
            .await?
            .into_iter()
            .map(|doc| D::from_bson(doc))
            .collect::<Result<Vec<D>, _>>()?)
    }

    /// Finds the first document matching a structured query.
    pub async fn find_one(&self, query: FindQuery) -> DocumentStoreResult<Option<D>> {
        Ok(self
            .backend
            .find_documents(limited_to_one(query), self.name())
            .await?
            .into_iter()
            .next()
            .map(D::from_bson)
            .transpose()?)
    }

    /// Finds documents and returns them as raw BSON, preserving any projection
    /// the query carries.
    pub async fn project(&self, query: FindQuery) -> DocumentStoreResult<Vec<Bson>> {
        Ok(self
            .backend
            .find_documents(query, self.name())
            .await?)
    }

    /// Runs an aggregation pipeline over the collection.
    ///
    /// Aggregation output is shaped by the pipeline, not by `D`, so results are
    /// returned as raw BSON.
    pub async fn aggregate(&self, pipeline: Pipeline) -> DocumentStoreResult<Vec<Bson>> {
        Ok(self
            .backend
            .aggregate(pipeline, self.name())
            .await?)
    }

    /// Creates an index on the collection.
    pub async fn create_index(&self, spec: IndexSpec) -> DocumentStoreResult<()> {
        Ok(self
            .backend
            .create_index(spec, self.name())
            .await?)
    }

    /// Lists the indexes of the collection.
    pub async fn list_indexes(&self) -> DocumentStoreResult<Vec<IndexInfo>> {
        Ok(self
            .backend
            .list_indexes(self.name())
            .await?)
    }

    /// Drops the index matching a specification (by its derived name).
    pub async fn drop_index(&self, spec: &IndexSpec) -> DocumentStoreResult<()> {
        Ok(self
            .backend
            .drop_index(&spec.name(), self.name())
            .await?)
    }

    /// Drops an index by name.
    pub async fn drop_index_named(&self, name: &str) -> DocumentStoreResult<()> {
        Ok(self
            .backend
            .drop_index(name, self.name())
            .await?)
    }

    /// Explains a find query against the collection.
    pub async fn explain(&self, query: FindQuery) -> DocumentStoreResult<ExplainReport> {
        Ok(self
            .backend
            .explain_find(query, self.name())
            .await?)
    }
}

#[derive(Debug)]
pub struct DynTypedCollection<'a, D: Document> {
    name: String,
    backend: &'a dyn DynStoreBackend,
    _marker: PhantomData<D>,
}

impl<'a, D: Document> DynTypedCollection<'a, D> {
    pub(crate) fn new(name: String, backend: &'a dyn DynStoreBackend) -> Self {
        Self { name, backend, _marker: PhantomData }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Converts this typed collection to a different document type.
    pub fn with_type<T: Document>(&self) -> DynTypedCollection<'a, T> {
        DynTypedCollection {
            name: self.name.clone(),
            backend: self.backend,
            _marker: PhantomData,
        }
    }

    /// Inserts new documents into the collection.
    pub async fn insert(&self, documents: Vec<D>) -> DocumentStoreResult<()> {
        Ok(self
            .backend
            .insert_documents(
                documents
                    .into_iter()
                    .map(|d| {
                        d.to_bson()
                            .map(move |b| (d.id().clone(), b))
                    })
                    .collect::<Result<Vec<(Uuid, Bson)>, _>>()?,
                self.name(),
            )
            .await?)
    }

    /// Replaces existing documents in the collection by ID.
    pub async fn update(&self, documents: Vec<D>) -> DocumentStoreResult<()> {
        Ok(self
            .backend
            .update_documents(
                documents
                    .into_iter()
                    .map(|d| {
                        d.to_bson()
                            .map(move |b| (d.id().clone(), b))
                    })
                    .collect::<Result<Vec<(Uuid, Bson)>, _>>()?,
                self.name(),
            )
            .await?)
    }

    /// Sets fields on the first document matching a filter.
    pub async fn update_where(
        &self,
        filter: Expr,
        set: BsonDocument,
    ) -> DocumentStoreResult<u64> {
        Ok(self
            .backend
            .update_where(filter, set, self.name())
            .await?)
    }

    /// Deletes documents from the collection by their IDs.
    pub async fn delete<U>(&self, ids: Vec<U>) -> DocumentStoreResult<()>
    where
        U: Into<Uuid> + Send + Sync + 'static,
    {
        Ok(self
            .backend
            .delete_documents(
                ids.into_iter()
                    .map(Into::into)
                    .collect(),
                self.name(),
            )
            .await?)
    }

    /// Deletes the first document matching a filter.
    pub async fn delete_where(&self, filter: Expr) -> DocumentStoreResult<u64> {
        Ok(self
            .backend
            .delete_where(filter, self.name())
            .await?)
    }

    /// Retrieves documents from the collection by their IDs.
    pub async fn get<U>(&self, ids: Vec<U>) -> DocumentStoreResult<Vec<D>>
    where
        U: Into<Uuid> + Send + Sync + 'static,
    {
        Ok(self
            .backend
            .get_documents(
                ids.into_iter()
                    .map(Into::into)
                    .collect(),
                self.name(),
            )
            .await?
            .into_iter()
            .map(|doc| D::from_bson(doc))
            .collect::<Result<Vec<D>, _>>()?)
    }

    /// Finds documents in the collection using a structured query.
    pub async fn find(&self, query: FindQuery) -> DocumentStoreResult<Vec<D>> {
        Ok(self
            .backend
            .find_documents(query, self.name())
            .await?
            .into_iter()
            .map(|doc| D::from_bson(doc))
            .collect::<Result<Vec<D>, _>>()?)
    }

    /// Finds the first document matching a structured query.
    pub async fn find_one(&self, query: FindQuery) -> DocumentStoreResult<Option<D>> {
        Ok(self
            .backend
            .find_documents(limited_to_one(query), self.name())
            .await?
            .into_iter()
            .next()
            .map(D::from_bson)
            .transpose()?)
    }

    /// Finds documents and returns them as raw BSON, preserving any projection
    /// the query carries.
    pub async fn project(&self, query: FindQuery) -> DocumentStoreResult<Vec<Bson>> {
        Ok(self
            .backend
            .find_documents(query, self.name())
            .await?)
    }

    /// Runs an aggregation pipeline over the collection.
    pub async fn aggregate(&self, pipeline: Pipeline) -> DocumentStoreResult<Vec<Bson>> {
        Ok(self
            .backend
            .aggregate(pipeline, self.name())
            .await?)
    }

    /// Creates an index on the collection.
    pub async fn create_index(&self, spec: IndexSpec) -> DocumentStoreResult<()> {
        Ok(self
            .backend
            .create_index(spec, self.name())
            .await?)
    }

    /// Lists the indexes of the collection.
    pub async fn list_indexes(&self) -> DocumentStoreResult<Vec<IndexInfo>> {
        Ok(self
            .backend
            .list_indexes(self.name())
            .await?)
    }

    /// Drops the index matching a specification (by its derived name).
    pub async fn drop_index(&self, spec: &IndexSpec) -> DocumentStoreResult<()> {
        Ok(self
            .backend
            .drop_index(&spec.name(), self.name())
            .await?)
    }

    /// Drops an index by name.
    pub async fn drop_index_named(&self, name: &str) -> DocumentStoreResult<()> {
        Ok(self
            .backend
            .drop_index(name, self.name())
            .await?)
    }

    /// Explains a find query against the collection.
    pub async fn explain(&self, query: FindQuery) -> DocumentStoreResult<ExplainReport> {
        Ok(self
            .backend
            .explain_find(query, self.name())
            .await?)
    }
}
