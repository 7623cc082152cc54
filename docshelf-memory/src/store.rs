//! In-memory storage implementation for document stores.
//!
//! This module provides a simple but complete in-memory backend that stores
//! documents as BSON values in HashMaps with async-safe read-write locks.
//! Collections carry materialized secondary indexes that are kept current on
//! every write, so find queries, hints and explain reports behave like their
//! counterparts in a real document database.

use async_trait::async_trait;
use bson::{Bson, Document as BsonDocument, Uuid};
use mea::rwlock::RwLock;
use std::{collections::HashMap, sync::Arc, time::Instant};
use tracing::debug;

use docshelf_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{DocumentStoreError, DocumentStoreResult},
    explain::{AccessPlan, ExecutionStats, ExplainReport},
    index::{IndexInfo, IndexSpec},
    pipeline::Pipeline,
    query::{Expr, FieldOp, FindQuery, Hint, Projection},
};

use crate::{
    aggregate::run_pipeline,
    evaluator::{DocumentEvaluator, sort_documents},
    index::{BuiltIndex, LeadingBound},
    keys::KeyValue,
};

#[derive(Debug, Default)]
struct CollectionData {
    /// document_id -> document
    documents: HashMap<String, Bson>,
    /// Secondary indexes, maintained on every write.
    indexes: Vec<BuiltIndex>,
}

type StoreMap = HashMap<String, CollectionData>;

/// Thread-safe in-memory document storage backend.
///
/// This struct implements the [`StoreBackend`] trait to provide a fully functional
/// document store that operates entirely in memory using async-aware read-write locks.
/// All documents are stored as BSON values indexed by their UUID.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data.
///
/// # Indexing
///
/// Collections support single-field and compound secondary indexes. The planner
/// uses an index when the query filter constrains the index's leading field with
/// an equality or range comparison; [`Hint`]s override the selection in either
/// direction. Explain reports reflect the actual execution.
///
/// # Example
///
/// ```ignore
/// use docshelf_memory::InMemoryStore;
/// use docshelf::backend::StoreBackend;
/// use bson::{Uuid, Bson, doc};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemoryStore::new();
///
///     // Insert documents
///     let id = Uuid::new();
///     let doc = Bson::Document(doc! { "title": "Dune", "published_year": 1965 });
///     store.insert_documents(vec![(id, doc)], "books").await?;
///
///     // Retrieve documents
///     let docs = store.get_documents(vec![id], "books").await?;
///     assert_eq!(docs.len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// The main storage map: collection_name -> collection data
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    ///
    /// The returned store is ready for use and contains no collections or documents.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore` with custom options.
    ///
    /// Currently, the builder simply creates a default store, but it can be extended
    /// in future versions to support configuration options.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}

/// Derives the bound a filter places on a single field.
///
/// Only top-level comparisons and the direct children of a top-level AND are
/// considered; anything behind an OR or NOT cannot safely narrow an index scan
/// and falls back to [`LeadingBound::Full`]. The residual filter is always
/// re-evaluated against candidates, so the bound only has to be sound, not
/// complete.
fn leading_bound(filter: Option<&Expr>, field: &str) -> LeadingBound {
    let Some(expr) = filter else {
        return LeadingBound::Full;
    };

    match expr {
        Expr::Field { field: f, op, value } if f == field => bound_from_op(op, value),
        Expr::And(exprs) => {
            let mut lower = None;
            let mut upper = None;

            for child in exprs {
                let Expr::Field { field: f, op, value } = child else {
                    continue;
                };
                if f != field {
                    continue;
                }

                match bound_from_op(op, value) {
                    // An equality on the field wins outright.
                    LeadingBound::Eq(key) => return LeadingBound::Eq(key),
                    LeadingBound::Range { lower: l, upper: u } => {
                        if lower.is_none() {
                            lower = l;
                        }
                        if upper.is_none() {
                            upper = u;
                        }
                    }
                    LeadingBound::Full => {}
                }
            }

            LeadingBound::Range { lower, upper }
        }
        _ => LeadingBound::Full,
    }
}

fn bound_from_op(op: &FieldOp, value: &Bson) -> LeadingBound {
    let key = KeyValue::from(value);

    match op {
        FieldOp::Eq => LeadingBound::Eq(key),
        FieldOp::Gt => LeadingBound::Range { lower: Some((key, false)), upper: None },
        FieldOp::Gte => LeadingBound::Range { lower: Some((key, true)), upper: None },
        FieldOp::Lt => LeadingBound::Range { lower: None, upper: Some((key, false)) },
        FieldOp::Lte => LeadingBound::Range { lower: None, upper: Some((key, true)) },
        _ => LeadingBound::Full,
    }
}

fn apply_projection(document: Bson, projection: Option<&Projection>) -> Bson {
    let Some(projection) = projection else {
        return document;
    };
    let Some(fields) = document.as_document() else {
        return document;
    };

    let mut out = BsonDocument::new();
    for name in &projection.fields {
        if let Some(value) = fields.get(name) {
            out.insert(name.clone(), value.clone());
        }
    }

    Bson::Document(out)
}

struct ExecOutcome {
    documents: Vec<Bson>,
    plan: AccessPlan,
    documents_examined: u64,
    keys_examined: u64,
}

/// Plans and runs a find query against a collection snapshot.
///
/// Shared by `find_documents` and `explain_find` so reported statistics always
/// describe the execution path queries actually take.
fn execute_find(
    data: &CollectionData,
    query: &FindQuery,
    collection: &str,
) -> DocumentStoreResult<ExecOutcome> {
    let chosen = match &query.hint {
        Some(Hint::Natural) => None,
        Some(Hint::Index(name)) => {
            let index = data
                .indexes
                .iter()
                .find(|index| index.name() == name)
                .ok_or_else(|| {
                    DocumentStoreError::IndexNotFound(name.clone(), collection.to_string())
                })?;

            Some((index, leading_bound(query.filter.as_ref(), index.leading_field())))
        }
        None => data.indexes.iter().find_map(|index| {
            let bound = leading_bound(query.filter.as_ref(), index.leading_field());
            bound
                .is_constrained()
                .then_some((index, bound))
        }),
    };

    let (candidates, plan, keys_examined) = match chosen {
        Some((index, bound)) => {
            let (ids, keys_examined) = index.scan(&bound);
            let docs = ids
                .iter()
                .filter_map(|id| data.documents.get(id).cloned())
                .collect::<Vec<_>>();

            (docs, AccessPlan::IndexScan { index: index.name().to_string() }, keys_examined)
        }
        None => (
            data.documents
                .values()
                .cloned()
                .collect::<Vec<_>>(),
            AccessPlan::CollectionScan,
            0,
        ),
    };

    let documents_examined = candidates.len() as u64;

    let mut matched = candidates
        .into_iter()
        .filter(|doc| DocumentEvaluator::matches(doc, query.filter.as_ref()))
        .collect::<Vec<_>>();

    if let Some(sort) = &query.sort {
        sort_documents(&mut matched, sort);
    }

    let documents = matched
        .into_iter()
        .skip(query.skip.unwrap_or(0))
        .take(query.limit.unwrap_or(usize::MAX))
        .map(|doc| apply_projection(doc, query.projection.as_ref()))
        .collect::<Vec<_>>();

    Ok(ExecOutcome { documents, plan, documents_examined, keys_examined })
}

/// Adds a document to every index, undoing partial work on a unique violation.
fn index_insert(
    indexes: &mut [BuiltIndex],
    id: &str,
    document: &Bson,
    collection: &str,
) -> DocumentStoreResult<()> {
    for i in 0..indexes.len() {
        if let Err(err) = indexes[i].insert(id, document, collection) {
            for done in &mut indexes[..i] {
                done.remove(id, document);
            }
            return Err(err);
        }
    }

    Ok(())
}

fn index_remove(indexes: &mut [BuiltIndex], id: &str, document: &Bson) {
    for index in indexes {
        index.remove(id, document);
    }
}

/// Swaps a document's index entries from its old to its new content.
///
/// On a unique violation the already-updated indexes are restored; re-adding a
/// key that was just removed cannot itself collide.
fn index_replace(
    indexes: &mut [BuiltIndex],
    id: &str,
    old: &Bson,
    new: &Bson,
    collection: &str,
) -> DocumentStoreResult<()> {
    for i in 0..indexes.len() {
        indexes[i].remove(id, old);

        if let Err(err) = indexes[i].insert(id, new, collection) {
            let _ = indexes[i].insert(id, old, collection);
            for done in &mut indexes[..i] {
                done.remove(id, new);
                let _ = done.insert(id, old, collection);
            }
            return Err(err);
        }
    }

    Ok(())
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;
        let data = store
            .entry(collection.to_string())
            .or_default();

        for (id, doc) in documents {
            let key = id.to_string();

            if data.documents.contains_key(&key) {
                return Err(DocumentStoreError::DocumentAlreadyExists(
                    key,
                    collection.to_string(),
                ));
            }

            index_insert(&mut data.indexes, &key, &doc, collection)?;
            data.documents.insert(key, doc);
        }

        Ok(())
    }

    async fn update_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;
        let data = match store.get_mut(collection) {
            Some(col) => col,
            None => return Err(DocumentStoreError::CollectionNotFound(collection.to_string())),
        };

        for (id, doc) in documents {
            let key = id.to_string();

            let old = match data.documents.get(&key) {
                Some(existing) => existing.clone(),
                None => {
                    return Err(DocumentStoreError::DocumentNotFound(
                        key,
                        collection.to_string(),
                    ));
                }
            };

            index_replace(&mut data.indexes, &key, &old, &doc, collection)?;
            data.documents.insert(key, doc);
        }

        Ok(())
    }

    async fn update_where(
        &self,
        filter: Expr,
        set: BsonDocument,
        collection: &str,
    ) -> DocumentStoreResult<u64> {
        let mut store = self.store.write().await;
        let Some(data) = store.get_mut(collection) else {
            return Ok(0);
        };

        let target = data
            .documents
            .iter()
            .find(|(_, doc)| DocumentEvaluator::matches(doc, Some(&filter)))
            .map(|(id, doc)| (id.clone(), doc.clone()));

        let Some((id, old)) = target else {
            return Ok(0);
        };

        let mut fields = old
            .as_document()
            .cloned()
            .ok_or_else(|| {
                DocumentStoreError::InvalidDocument(format!(
                    "stored value {id} is not a document"
                ))
            })?;

        for (name, value) in set {
            fields.insert(name, value);
        }

        let new = Bson::Document(fields);

        index_replace(&mut data.indexes, &id, &old, &new, collection)?;
        data.documents.insert(id, new);

        Ok(1)
    }

    async fn delete_documents(&self, ids: Vec<Uuid>, collection: &str) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;
        let data = match store.get_mut(collection) {
            Some(col) => col,
            None => return Err(DocumentStoreError::CollectionNotFound(collection.to_string())),
        };

        for id in ids {
            let key = id.to_string();

            match data.documents.remove(&key) {
                Some(doc) => index_remove(&mut data.indexes, &key, &doc),
                None => {
                    return Err(DocumentStoreError::DocumentNotFound(
                        key,
                        collection.to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    async fn delete_where(&self, filter: Expr, collection: &str) -> DocumentStoreResult<u64> {
        let mut store = self.store.write().await;
        let Some(data) = store.get_mut(collection) else {
            return Ok(0);
        };

        let target = data
            .documents
            .iter()
            .find(|(_, doc)| DocumentEvaluator::matches(doc, Some(&filter)))
            .map(|(id, _)| id.clone());

        let Some(id) = target else {
            return Ok(0);
        };

        if let Some(doc) = data.documents.remove(&id) {
            index_remove(&mut data.indexes, &id, &doc);
        }

        Ok(1)
    }

    async fn get_documents(
        &self,
        ids: Vec<Uuid>,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        let store = self.store.read().await;
        let data = match store.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        let mut documents = Vec::with_capacity(ids.len());

        for id in ids {
            let key = id.to_string();

            if let Some(doc) = data.documents.get(&key) {
                documents.push(doc.clone());
            }
        }

        Ok(documents)
    }

    async fn find_documents(
        &self,
        query: FindQuery,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        let store = self.store.read().await;
        let data = match store.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        Ok(execute_find(data, &query, collection)?.documents)
    }

    async fn aggregate(
        &self,
        pipeline: Pipeline,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        let store = self.store.read().await;
        let documents = match store.get(collection) {
            Some(data) => data
                .documents
                .values()
                .cloned()
                .collect::<Vec<_>>(),
            None => vec![],
        };

        run_pipeline(documents, &pipeline)
    }

    async fn create_index(&self, spec: IndexSpec, collection: &str) -> DocumentStoreResult<()> {
        if spec.keys.is_empty() {
            return Err(DocumentStoreError::InvalidDocument(
                "index specification has no keys".to_string(),
            ));
        }

        let mut store = self.store.write().await;
        let data = store
            .entry(collection.to_string())
            .or_default();

        let name = spec.name();

        if let Some(existing) = data
            .indexes
            .iter()
            .find(|index| index.name() == name)
        {
            if existing.spec() == &spec {
                return Ok(());
            }

            return Err(DocumentStoreError::IndexAlreadyExists(
                name,
                collection.to_string(),
            ));
        }

        let index = BuiltIndex::from_documents(spec, data.documents.iter(), collection)?;

        debug!(collection, index = %name, "built index");
        data.indexes.push(index);

        Ok(())
    }

    async fn list_indexes(&self, collection: &str) -> DocumentStoreResult<Vec<IndexInfo>> {
        let store = self.store.read().await;

        Ok(store
            .get(collection)
            .map(|data| {
                data.indexes
                    .iter()
                    .map(BuiltIndex::info)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn drop_index(&self, name: &str, collection: &str) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;
        let data = match store.get_mut(collection) {
            Some(col) => col,
            None => return Err(DocumentStoreError::CollectionNotFound(collection.to_string())),
        };

        let position = data
            .indexes
            .iter()
            .position(|index| index.name() == name)
            .ok_or_else(|| {
                DocumentStoreError::IndexNotFound(name.to_string(), collection.to_string())
            })?;

        data.indexes.remove(position);
        debug!(collection, index = name, "dropped index");

        Ok(())
    }

    async fn explain_find(
        &self,
        query: FindQuery,
        collection: &str,
    ) -> DocumentStoreResult<ExplainReport> {
        let store = self.store.read().await;
        let empty = CollectionData::default();
        let data = store.get(collection).unwrap_or(&empty);

        let started = Instant::now();
        let outcome = execute_find(data, &query, collection)?;
        let execution_time = started.elapsed();

        debug!(collection, plan = ?outcome.plan, "explained find");

        Ok(ExplainReport {
            plan: outcome.plan,
            stats: ExecutionStats {
                returned: outcome.documents.len() as u64,
                documents_examined: outcome.documents_examined,
                keys_examined: outcome.keys_examined,
                execution_time,
            },
        })
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.store
            .write()
            .await
            .entry(name.to_string())
            .or_default();

        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;

        if store.remove(name).is_none() {
            return Err(DocumentStoreError::CollectionNotFound(name.to_string()));
        }

        Ok(())
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        Ok(self
            .store
            .read()
            .await
            .keys()
            .cloned()
            .collect())
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// Currently a no-op builder, but can be extended in future versions
/// to support configuration options like capacity hints or concurrency settings.
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds and returns a new [`InMemoryStore`] instance.
    ///
    /// This always succeeds and returns a freshly initialized store.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use docshelf_core::query::{Filter, SortDirection};

    async fn seeded_store() -> InMemoryStore {
        let store = InMemoryStore::new();

        let books = vec![
            doc! { "title": "1984", "author": "George Orwell", "genre": "Dystopian", "published_year": 1949, "price": 9.99, "in_stock": true },
            doc! { "title": "Dune", "author": "Frank Herbert", "genre": "Science Fiction", "published_year": 1965, "price": 12.50, "in_stock": true },
            doc! { "title": "The Hobbit", "author": "J.R.R. Tolkien", "genre": "Fantasy", "published_year": 1937, "price": 14.99, "in_stock": false },
            doc! { "title": "Neuromancer", "author": "William Gibson", "genre": "Cyberpunk", "published_year": 1984, "price": 11.25, "in_stock": true },
        ];

        store
            .insert_documents(
                books
                    .into_iter()
                    .map(|b| (Uuid::new(), Bson::Document(b)))
                    .collect(),
                "books",
            )
            .await
            .unwrap();

        store
    }

    fn titles(results: &[Bson]) -> Vec<&str> {
        results
            .iter()
            .filter_map(|doc| doc.as_document())
            .filter_map(|doc| doc.get_str("title").ok())
            .collect()
    }

    #[tokio::test]
    async fn find_filters_sorts_and_paginates() {
        let store = seeded_store().await;

        let query = FindQuery::builder()
            .filter(Filter::gt("published_year", 1940))
            .sort("published_year", SortDirection::Asc)
            .build();
        let results = store
            .find_documents(query, "books")
            .await
            .unwrap();
        assert_eq!(titles(&results), vec!["1984", "Dune", "Neuromancer"]);

        let query = FindQuery::builder()
            .sort("price", SortDirection::Desc)
            .limit(2)
            .skip(1)
            .build();
        let results = store
            .find_documents(query, "books")
            .await
            .unwrap();
        assert_eq!(titles(&results), vec!["Dune", "Neuromancer"]);
    }

    #[tokio::test]
    async fn projection_keeps_only_listed_fields() {
        let store = seeded_store().await;

        let query = FindQuery::builder()
            .filter(Filter::eq("title", "Dune"))
            .project(Projection::include(["title", "price"]))
            .build();
        let results = store
            .find_documents(query, "books")
            .await
            .unwrap();

        let fields = results[0].as_document().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get_str("title").ok(), Some("Dune"));
        assert!(fields.get("author").is_none());
    }

    #[tokio::test]
    async fn update_where_modifies_exactly_one_document() {
        let store = seeded_store().await;

        let modified = store
            .update_where(
                Filter::eq("title", "The Hobbit"),
                doc! { "price": 15.99 },
                "books",
            )
            .await
            .unwrap();
        assert_eq!(modified, 1);

        let results = store
            .find_documents(
                FindQuery::builder()
                    .filter(Filter::eq("title", "The Hobbit"))
                    .build(),
                "books",
            )
            .await
            .unwrap();
        let price = results[0]
            .as_document()
            .unwrap()
            .get_f64("price")
            .unwrap();
        assert!((price - 15.99).abs() < 1e-9);

        let unmatched = store
            .update_where(
                Filter::eq("title", "No Such Book"),
                doc! { "price": 1.0 },
                "books",
            )
            .await
            .unwrap();
        assert_eq!(unmatched, 0);
    }

    #[tokio::test]
    async fn delete_where_removes_exactly_one_document() {
        let store = seeded_store().await;

        let deleted = store
            .delete_where(Filter::eq("title", "Neuromancer"), "books")
            .await
            .unwrap();
        assert_eq!(deleted, 1);

        let remaining = store
            .find_documents(FindQuery::new(), "books")
            .await
            .unwrap();
        assert_eq!(remaining.len(), 3);

        let missing = store
            .delete_where(Filter::eq("title", "Neuromancer"), "books")
            .await
            .unwrap();
        assert_eq!(missing, 0);
    }

    #[tokio::test]
    async fn explain_switches_from_scan_to_index() {
        let store = seeded_store().await;
        let query = FindQuery::builder()
            .filter(Filter::eq("title", "Dune"))
            .build();

        let before = store
            .explain_find(query.clone(), "books")
            .await
            .unwrap();
        assert!(before.is_collection_scan());
        assert_eq!(before.stats.documents_examined, 4);
        assert_eq!(before.stats.keys_examined, 0);
        assert_eq!(before.stats.returned, 1);

        store
            .create_index(IndexSpec::asc("title"), "books")
            .await
            .unwrap();

        let after = store
            .explain_find(query, "books")
            .await
            .unwrap();
        assert_eq!(after.used_index(), Some("title_1"));
        assert_eq!(after.stats.keys_examined, 1);
        assert_eq!(after.stats.documents_examined, 1);
        assert_eq!(after.stats.returned, 1);
    }

    #[tokio::test]
    async fn hints_override_plan_selection() {
        let store = seeded_store().await;
        store
            .create_index(IndexSpec::asc("title"), "books")
            .await
            .unwrap();

        let natural = store
            .explain_find(
                FindQuery::builder()
                    .filter(Filter::eq("title", "Dune"))
                    .hint(Hint::Natural)
                    .build(),
                "books",
            )
            .await
            .unwrap();
        assert!(natural.is_collection_scan());

        let forced = store
            .explain_find(
                FindQuery::builder()
                    .filter(Filter::eq("title", "Dune"))
                    .hint(Hint::Index("title_1".to_string()))
                    .build(),
                "books",
            )
            .await
            .unwrap();
        assert_eq!(forced.used_index(), Some("title_1"));

        let unknown = store
            .explain_find(
                FindQuery::builder()
                    .hint(Hint::Index("publisher_1".to_string()))
                    .build(),
                "books",
            )
            .await;
        assert!(matches!(unknown, Err(DocumentStoreError::IndexNotFound(_, _))));
    }

    #[tokio::test]
    async fn compound_index_serves_leading_field_queries() {
        let store = seeded_store().await;
        store
            .create_index(
                IndexSpec::compound([
                    docshelf_core::index::IndexKey::asc("author"),
                    docshelf_core::index::IndexKey::asc("published_year"),
                ]),
                "books",
            )
            .await
            .unwrap();

        let report = store
            .explain_find(
                FindQuery::builder()
                    .filter(Filter::eq("author", "George Orwell"))
                    .build(),
                "books",
            )
            .await
            .unwrap();

        assert_eq!(report.used_index(), Some("author_1_published_year_1"));
    }

    #[tokio::test]
    async fn range_filters_use_indexes() {
        let store = seeded_store().await;
        store
            .create_index(IndexSpec::asc("published_year"), "books")
            .await
            .unwrap();

        let report = store
            .explain_find(
                FindQuery::builder()
                    .filter(Filter::gt("published_year", 1950))
                    .build(),
                "books",
            )
            .await
            .unwrap();

        assert_eq!(report.used_index(), Some("published_year_1"));
        assert_eq!(report.stats.returned, 2);
        assert_eq!(report.stats.keys_examined, 2);
    }

    #[tokio::test]
    async fn unique_index_rejects_conflicting_insert() {
        let store = seeded_store().await;
        store
            .create_index(IndexSpec::asc("title").unique(), "books")
            .await
            .unwrap();

        let result = store
            .insert_documents(
                vec![(Uuid::new(), Bson::Document(doc! { "title": "Dune" }))],
                "books",
            )
            .await;
        assert!(matches!(result, Err(DocumentStoreError::DuplicateKey(_, _))));

        // The failed insert must not leave the document behind.
        let count = store
            .find_documents(FindQuery::new(), "books")
            .await
            .unwrap()
            .len();
        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn create_index_is_idempotent_for_identical_specs() {
        let store = seeded_store().await;

        store
            .create_index(IndexSpec::asc("title"), "books")
            .await
            .unwrap();
        store
            .create_index(IndexSpec::asc("title"), "books")
            .await
            .unwrap();

        assert_eq!(store.list_indexes("books").await.unwrap().len(), 1);

        let conflicting = store
            .create_index(IndexSpec::asc("title").unique(), "books")
            .await;
        assert!(matches!(
            conflicting,
            Err(DocumentStoreError::IndexAlreadyExists(_, _))
        ));
    }

    #[tokio::test]
    async fn empty_index_specs_are_rejected() {
        let store = seeded_store().await;

        let result = store
            .create_index(IndexSpec::compound([]), "books")
            .await;
        assert!(matches!(result, Err(DocumentStoreError::InvalidDocument(_))));

        // The rejected spec must not poison later queries.
        assert!(store.list_indexes("books").await.unwrap().is_empty());
        let results = store
            .find_documents(FindQuery::new(), "books")
            .await
            .unwrap();
        assert_eq!(results.len(), 4);
    }

    #[tokio::test]
    async fn drop_index_by_name() {
        let store = seeded_store().await;
        store
            .create_index(IndexSpec::asc("title"), "books")
            .await
            .unwrap();

        store.drop_index("title_1", "books").await.unwrap();
        assert!(store.list_indexes("books").await.unwrap().is_empty());

        let missing = store.drop_index("title_1", "books").await;
        assert!(matches!(missing, Err(DocumentStoreError::IndexNotFound(_, _))));
    }

    #[tokio::test]
    async fn indexes_follow_updates_and_deletes() {
        let store = seeded_store().await;
        store
            .create_index(IndexSpec::asc("title"), "books")
            .await
            .unwrap();

        store
            .update_where(
                Filter::eq("title", "Dune"),
                doc! { "title": "Dune Messiah" },
                "books",
            )
            .await
            .unwrap();

        let report = store
            .explain_find(
                FindQuery::builder()
                    .filter(Filter::eq("title", "Dune Messiah"))
                    .build(),
                "books",
            )
            .await
            .unwrap();
        assert_eq!(report.used_index(), Some("title_1"));
        assert_eq!(report.stats.returned, 1);

        store
            .delete_where(Filter::eq("title", "Dune Messiah"), "books")
            .await
            .unwrap();

        let gone = store
            .explain_find(
                FindQuery::builder()
                    .filter(Filter::eq("title", "Dune Messiah"))
                    .build(),
                "books",
            )
            .await
            .unwrap();
        assert_eq!(gone.stats.returned, 0);
        assert_eq!(gone.stats.keys_examined, 0);
    }
}
