//! Index specifications and metadata for document collections.
//!
//! Indexes are declared as an ordered list of keyed fields, each with a sort
//! order. A single-field index has one key; a compound index has several. The
//! index name is derived from the specification using the conventional
//! `field_direction` scheme, so `{ author: 1, published_year: 1 }` becomes
//! `author_1_published_year_1`.

use serde::{Deserialize, Serialize};

/// Sort order of an index key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    /// Ascending key order.
    Asc,
    /// Descending key order.
    Desc,
}

impl Order {
    /// The numeric form used in wire formats and index names (`1` / `-1`).
    pub fn as_i32(self) -> i32 {
        match self {
            Order::Asc => 1,
            Order::Desc => -1,
        }
    }
}

/// A single keyed field of an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexKey {
    /// The field name.
    pub field: String,
    /// The key order.
    pub order: Order,
}

impl IndexKey {
    /// An ascending key on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: Order::Asc }
    }

    /// A descending key on `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: Order::Desc }
    }
}

/// Specification of a single-field or compound index.
///
/// # Example
///
/// ```ignore
/// use docshelf::index::{IndexSpec, IndexKey};
///
/// let title = IndexSpec::asc("title");
/// assert_eq!(title.name(), "title_1");
///
/// let compound = IndexSpec::compound([
///     IndexKey::asc("author"),
///     IndexKey::asc("published_year"),
/// ]);
/// assert_eq!(compound.name(), "author_1_published_year_1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// The keyed fields, in significance order.
    pub keys: Vec<IndexKey>,
    /// Whether the index enforces key uniqueness.
    pub unique: bool,
}

impl IndexSpec {
    /// Creates a single-field ascending index specification.
    pub fn asc(field: impl Into<String>) -> Self {
        Self { keys: vec![IndexKey::asc(field)], unique: false }
    }

    /// Creates a single-field descending index specification.
    pub fn desc(field: impl Into<String>) -> Self {
        Self { keys: vec![IndexKey::desc(field)], unique: false }
    }

    /// Creates a compound index specification from the given keys.
    pub fn compound(keys: impl IntoIterator<Item = IndexKey>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            unique: false,
        }
    }

    /// Marks the index as unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Derives the conventional index name: `field_direction` pairs joined by `_`.
    pub fn name(&self) -> String {
        self.keys
            .iter()
            .map(|key| format!("{}_{}", key.field, key.order.as_i32()))
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// Metadata describing an existing index, as returned by index listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexInfo {
    /// The index name.
    pub name: String,
    /// The keyed fields, in significance order.
    pub keys: Vec<IndexKey>,
    /// Whether the index enforces key uniqueness.
    pub unique: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_field_name() {
        assert_eq!(IndexSpec::asc("title").name(), "title_1");
        assert_eq!(IndexSpec::desc("price").name(), "price_-1");
    }

    #[test]
    fn compound_name() {
        let spec = IndexSpec::compound([
            IndexKey::asc("author"),
            IndexKey::asc("published_year"),
        ]);
        assert_eq!(spec.name(), "author_1_published_year_1");
    }

    #[test]
    fn unique_does_not_affect_name() {
        assert_eq!(IndexSpec::asc("title").unique().name(), "title_1");
    }
}
