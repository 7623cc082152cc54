//! Materialized secondary indexes for the in-memory backend.
//!
//! A [`BuiltIndex`] keeps an ordered map from key tuples to the IDs of the
//! documents carrying those keys. Entries are maintained on every write, so a
//! lookup through the index reflects the current collection state. Key tuples
//! are always stored in ascending [`KeyValue`] order; a descending key order in
//! the specification only affects traversal, not storage.

use bson::Bson;
use std::collections::BTreeMap;

use docshelf_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    index::{IndexInfo, IndexSpec},
};

use crate::keys::KeyValue;

/// Bound on the leading key of an index scan.
///
/// The in-memory planner constrains only the first key of a (possibly
/// compound) index; the full filter is re-evaluated against every candidate
/// document, so the bound just narrows the examined range.
#[derive(Debug, Clone)]
pub(crate) enum LeadingBound {
    /// Exact match on the leading key.
    Eq(KeyValue),
    /// Half-open or closed range on the leading key.
    Range {
        lower: Option<(KeyValue, bool)>,
        upper: Option<(KeyValue, bool)>,
    },
    /// No usable bound; the whole index is traversed.
    Full,
}

impl LeadingBound {
    /// Whether this bound actually constrains the scan.
    pub(crate) fn is_constrained(&self) -> bool {
        match self {
            LeadingBound::Eq(_) => true,
            LeadingBound::Range { lower, upper } => lower.is_some() || upper.is_some(),
            LeadingBound::Full => false,
        }
    }

    fn admits(&self, lead: &KeyValue) -> bool {
        match self {
            LeadingBound::Eq(key) => lead == key,
            LeadingBound::Range { lower, upper } => {
                let above = match lower {
                    Some((bound, inclusive)) => {
                        if *inclusive { lead >= bound } else { lead > bound }
                    }
                    None => true,
                };
                let below = match upper {
                    Some((bound, inclusive)) => {
                        if *inclusive { lead <= bound } else { lead < bound }
                    }
                    None => true,
                };
                above && below
            }
            LeadingBound::Full => true,
        }
    }

    fn exceeded(&self, lead: &KeyValue) -> bool {
        match self {
            LeadingBound::Eq(key) => lead > key,
            LeadingBound::Range { upper: Some((bound, inclusive)), .. } => {
                if *inclusive { lead > bound } else { lead >= bound }
            }
            _ => false,
        }
    }
}

/// A secondary index over one collection, maintained on every write.
#[derive(Debug)]
pub(crate) struct BuiltIndex {
    spec: IndexSpec,
    name: String,
    entries: BTreeMap<Vec<KeyValue>, Vec<String>>,
}

impl BuiltIndex {
    /// Builds an index over the current documents of a collection.
    pub(crate) fn from_documents<'a>(
        spec: IndexSpec,
        documents: impl IntoIterator<Item = (&'a String, &'a Bson)>,
        collection: &str,
    ) -> DocumentStoreResult<Self> {
        let mut index = Self {
            name: spec.name(),
            spec,
            entries: BTreeMap::new(),
        };

        for (id, doc) in documents {
            index.insert(id, doc, collection)?;
        }

        Ok(index)
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    pub(crate) fn info(&self) -> IndexInfo {
        IndexInfo {
            name: self.name.clone(),
            keys: self.spec.keys.clone(),
            unique: self.spec.unique,
        }
    }

    /// The field constrained by the first index key.
    pub(crate) fn leading_field(&self) -> &str {
        &self.spec.keys[0].field
    }

    fn key_for(&self, document: &Bson) -> Vec<KeyValue> {
        let fields = document.as_document();

        self.spec
            .keys
            .iter()
            .map(|key| {
                fields
                    .and_then(|doc| doc.get(&key.field))
                    .map(KeyValue::from)
                    .unwrap_or(KeyValue::Null)
            })
            .collect()
    }

    /// Adds a document's key to the index.
    ///
    /// For a unique index, an occupied key tuple is a
    /// [`DuplicateKey`](DocumentStoreError::DuplicateKey) violation.
    pub(crate) fn insert(
        &mut self,
        id: &str,
        document: &Bson,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        let key = self.key_for(document);
        let bucket = self.entries.entry(key).or_default();

        if self.spec.unique && !bucket.is_empty() {
            return Err(DocumentStoreError::DuplicateKey(
                self.name.clone(),
                collection.to_string(),
            ));
        }

        bucket.push(id.to_string());

        Ok(())
    }

    /// Removes a document's key from the index.
    pub(crate) fn remove(&mut self, id: &str, document: &Bson) {
        let key = self.key_for(document);

        if let Some(bucket) = self.entries.get_mut(&key) {
            bucket.retain(|entry| entry != id);

            if bucket.is_empty() {
                self.entries.remove(&key);
            }
        }
    }

    /// Scans the index within a leading-key bound.
    ///
    /// Returns the candidate document IDs in key order together with the number
    /// of index keys examined. Entries are visited in ascending key order and
    /// the scan stops as soon as the bound is exceeded.
    pub(crate) fn scan(&self, bound: &LeadingBound) -> (Vec<String>, u64) {
        let mut ids = Vec::new();
        let mut keys_examined = 0;

        for (key, bucket) in &self.entries {
            let lead = &key[0];

            if bound.exceeded(lead) {
                break;
            }
            if !bound.admits(lead) {
                continue;
            }

            keys_examined += 1;
            ids.extend(bucket.iter().cloned());
        }

        (ids, keys_examined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use docshelf_core::index::IndexKey;

    fn book(title: &str, year: i32) -> Bson {
        Bson::Document(doc! { "title": title, "published_year": year })
    }

    fn sample_index() -> BuiltIndex {
        let docs = vec![
            ("a".to_string(), book("1984", 1949)),
            ("b".to_string(), book("Dune", 1965)),
            ("c".to_string(), book("Neuromancer", 1984)),
        ];

        BuiltIndex::from_documents(IndexSpec::asc("published_year"), docs.iter().map(|(id, d)| (id, d)), "books")
            .unwrap()
    }

    #[test]
    fn eq_bound_examines_one_key() {
        let index = sample_index();
        let (ids, examined) = index.scan(&LeadingBound::Eq(KeyValue::number(1965.0)));

        assert_eq!(ids, vec!["b".to_string()]);
        assert_eq!(examined, 1);
    }

    #[test]
    fn range_bound_stops_at_upper() {
        let index = sample_index();
        let (ids, examined) = index.scan(&LeadingBound::Range {
            lower: Some((KeyValue::number(1950.0), true)),
            upper: Some((KeyValue::number(1970.0), true)),
        });

        assert_eq!(ids, vec!["b".to_string()]);
        assert_eq!(examined, 1);
    }

    #[test]
    fn full_bound_examines_every_key() {
        let index = sample_index();
        let (ids, examined) = index.scan(&LeadingBound::Full);

        assert_eq!(ids.len(), 3);
        assert_eq!(examined, 3);
    }

    #[test]
    fn unique_index_rejects_duplicate_keys() {
        let docs = vec![
            ("a".to_string(), book("1984", 1949)),
            ("b".to_string(), book("Animal Farm", 1949)),
        ];

        let result = BuiltIndex::from_documents(
            IndexSpec::compound([IndexKey::asc("published_year")]).unique(),
            docs.iter().map(|(id, d)| (id, d)),
            "books",
        );

        assert!(matches!(result, Err(DocumentStoreError::DuplicateKey(_, _))));
    }

    #[test]
    fn missing_fields_index_as_null() {
        let mut index = sample_index();
        index
            .insert("d", &Bson::Document(doc! { "title": "Untitled" }), "books")
            .unwrap();

        let (ids, _) = index.scan(&LeadingBound::Full);
        // Null sorts before every year.
        assert_eq!(ids[0], "d");
    }
}
