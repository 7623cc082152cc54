use async_trait::async_trait;
use bson::{Bson, Document, Uuid, doc};
use futures::{StreamExt, TryStreamExt, stream::iter};
use mongodb::{
    Client, Collection as MongoCollection, IndexModel,
    options::{ClientOptions, FindOptions, Hint as MongoHint, IndexOptions},
};
use tracing::debug;

use docshelf_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{DocumentStoreError, DocumentStoreResult},
    explain::ExplainReport,
    index::{IndexInfo, IndexKey, IndexSpec, Order},
    pipeline::Pipeline,
    query::{Expr, FindQuery, Hint, Projection, Sort, SortDirection},
};

use crate::{
    explain::report_from_response,
    pipeline::pipeline_stages,
    query::filter_document,
    sanitizer::ValueSanitizer,
};

fn sort_document(sort: &Sort) -> Document {
    doc! {
        sort.field.clone(): match sort.direction {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

fn projection_document(projection: &Projection) -> Document {
    let mut doc = Document::new();
    for field in &projection.fields {
        doc.insert(field.clone(), 1);
    }
    // The store never exposes the driver-level _id.
    doc.insert("_id", 0);
    doc
}

fn hint_option(hint: &Hint) -> MongoHint {
    match hint {
        Hint::Natural => MongoHint::Keys(doc! { "$natural": 1 }),
        Hint::Index(name) => MongoHint::Name(name.clone()),
    }
}

fn index_keys_document(spec: &IndexSpec) -> Document {
    Document::from_iter(
        spec.keys
            .iter()
            .map(|key| (key.field.clone(), Bson::Int32(key.order.as_i32()))),
    )
}

#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(&ValueSanitizer::sanitize_string(collection_name))
    }

    fn prepare_document(&self, id: &Uuid, document: &Bson) -> DocumentStoreResult<Document> {
        Ok(Document::from_iter(
            ValueSanitizer::sanitize_value(document)
                .as_document()
                .cloned()
                .ok_or_else(|| DocumentStoreError::InvalidDocument("Expected document".into()))?
                .into_iter()
                .chain(vec![("_id".to_string(), id.into())].into_iter()),
        ))
    }

    fn restore_document(&self, document: &Document) -> DocumentStoreResult<Bson> {
        Ok(ValueSanitizer::restore_value(&Bson::Document(Document::from_iter(
            document
                .clone()
                .into_iter()
                .filter(|(k, _)| !["_id"].contains(&k.as_str())),
        ))))
    }

    /// Restores an aggregation result without stripping `_id`; group stages
    /// emit their key there.
    fn restore_aggregate(&self, document: &Document) -> Bson {
        ValueSanitizer::restore_value(&Bson::Document(document.clone()))
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        self.get_collection(collection)
            .insert_many(
                documents
                    .iter()
                    .map(|(id, doc)| self.prepare_document(id, doc))
                    .collect::<DocumentStoreResult<Vec<Document>>>()?,
            )
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn update_documents(
        &self,
        documents: Vec<(Uuid, Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        iter(documents)
            .then(async |(id, doc)| {
                self.get_collection(collection)
                    .update_one(
                        doc! { "_id": id },
                        doc! { "$set": self.prepare_document(&id, &doc)? },
                    )
                    .await
                    .map_err(|e| DocumentStoreError::Backend(e.to_string()))
            })
            .try_collect::<Vec<_>>()
            .await?;

        Ok(())
    }

    async fn update_where(
        &self,
        filter: Expr,
        set: Document,
        collection: &str,
    ) -> DocumentStoreResult<u64> {
        let result = self
            .get_collection(collection)
            .update_one(
                filter_document(Some(&filter))?,
                doc! { "$set": ValueSanitizer::sanitize_value(&Bson::Document(set)) },
            )
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        Ok(result.modified_count)
    }

    async fn delete_documents(&self, ids: Vec<Uuid>, collection: &str) -> DocumentStoreResult<()> {
        self.get_collection(collection)
            .delete_many(doc! { "_id": { "$in": ids } })
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn delete_where(&self, filter: Expr, collection: &str) -> DocumentStoreResult<u64> {
        let result = self
            .get_collection(collection)
            .delete_one(filter_document(Some(&filter))?)
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        Ok(result.deleted_count)
    }

    async fn get_documents(
        &self,
        ids: Vec<Uuid>,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        Ok(self
            .get_collection(collection)
            .find(doc! { "_id": { "$in": ids } })
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?
            .into_iter()
            .map(|doc| self.restore_document(&doc))
            .collect::<DocumentStoreResult<Vec<Bson>>>()?)
    }

    async fn find_documents(
        &self,
        query: FindQuery,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        let mut options = FindOptions::default();

        if let Some(limit) = query.limit {
            options.limit = Some(limit as i64);
        }
        if let Some(skip) = query.skip {
            options.skip = Some(skip as u64);
        }
        if let Some(sort) = &query.sort {
            options.sort = Some(sort_document(sort));
        }
        if let Some(projection) = &query.projection {
            options.projection = Some(projection_document(projection));
        }
        if let Some(hint) = &query.hint {
            options.hint = Some(hint_option(hint));
        }

        Ok(self
            .get_collection(collection)
            .find(filter_document(query.filter.as_ref())?)
            .with_options(options)
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?
            .into_iter()
            .map(|doc| self.restore_document(&doc))
            .collect::<DocumentStoreResult<Vec<Bson>>>()?)
    }

    async fn aggregate(
        &self,
        pipeline: Pipeline,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Bson>> {
        Ok(self
            .get_collection(collection)
            .aggregate(pipeline_stages(&pipeline)?)
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?
            .iter()
            .map(|doc| self.restore_aggregate(doc))
            .collect())
    }

    async fn create_index(&self, spec: IndexSpec, collection: &str) -> DocumentStoreResult<()> {
        let name = spec.name();

        self.get_collection(collection)
            .create_index(
                IndexModel::builder()
                    .keys(index_keys_document(&spec))
                    .options(
                        IndexOptions::builder()
                            .unique(spec.unique)
                            .name(name.clone())
                            .build(),
                    )
                    .build(),
            )
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        debug!(collection, index = %name, "created index");

        Ok(())
    }

    async fn list_indexes(&self, collection: &str) -> DocumentStoreResult<Vec<IndexInfo>> {
        let models = self
            .get_collection(collection)
            .list_indexes()
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?
            .try_collect::<Vec<IndexModel>>()
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        Ok(models
            .into_iter()
            .filter_map(|model| {
                let keys = model
                    .keys
                    .iter()
                    .map(|(field, direction)| {
                        let descending = matches!(direction, Bson::Int32(v) if *v < 0)
                            || matches!(direction, Bson::Int64(v) if *v < 0)
                            || matches!(direction, Bson::Double(v) if *v < 0.0);

                        IndexKey {
                            field: field.clone(),
                            order: if descending { Order::Desc } else { Order::Asc },
                        }
                    })
                    .collect::<Vec<_>>();

                let unique = model
                    .options
                    .as_ref()
                    .and_then(|options| options.unique)
                    .unwrap_or(false);
                let name = model
                    .options
                    .as_ref()
                    .and_then(|options| options.name.clone())
                    .unwrap_or_else(|| IndexSpec { keys: keys.clone(), unique }.name());

                // The automatic primary-key index is a driver detail.
                if name == "_id_" {
                    return None;
                }

                Some(IndexInfo { name, keys, unique })
            })
            .collect())
    }

    async fn drop_index(&self, name: &str, collection: &str) -> DocumentStoreResult<()> {
        self.get_collection(collection)
            .drop_index(name)
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        debug!(collection, index = name, "dropped index");

        Ok(())
    }

    async fn explain_find(
        &self,
        query: FindQuery,
        collection: &str,
    ) -> DocumentStoreResult<ExplainReport> {
        let mut command = doc! {
            "find": ValueSanitizer::sanitize_string(collection),
            "filter": filter_document(query.filter.as_ref())?,
        };

        if let Some(sort) = &query.sort {
            command.insert("sort", sort_document(sort));
        }
        if let Some(projection) = &query.projection {
            command.insert("projection", projection_document(projection));
        }
        if let Some(skip) = query.skip {
            command.insert("skip", skip as i64);
        }
        if let Some(limit) = query.limit {
            command.insert("limit", limit as i64);
        }
        if let Some(hint) = &query.hint {
            match hint {
                Hint::Natural => command.insert("hint", doc! { "$natural": 1 }),
                Hint::Index(name) => command.insert("hint", name.clone()),
            };
        }

        let response = self
            .client
            .database(&self.database)
            .run_command(doc! { "explain": command, "verbosity": "executionStats" })
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        let report = report_from_response(&response);
        debug!(collection, plan = ?report.plan, "explained find");

        Ok(report)
    }

    async fn create_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.client
            .database(&self.database)
            .create_collection(&ValueSanitizer::sanitize_string(name))
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.get_collection(name)
            .drop()
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        Ok(self
            .client
            .database(&self.database)
            .list_collection_names()
            .await
            .map_err(|e| DocumentStoreError::Backend(e.to_string()))?
            .into_iter()
            .map(|name| ValueSanitizer::restore_string(&name))
            .collect())
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.shutdown().await
    }
}

pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(MongoDbStore::new(
            Client::with_options(
                ClientOptions::parse(&self.dsn)
                    .await
                    .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            )
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}
