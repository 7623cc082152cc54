//! Totally-ordered scalar keys for in-memory index entries and grouping.
//!
//! BSON values have no total order, so index entries and group keys are built
//! from [`KeyValue`], a normalized scalar representation that is `Eq`, `Ord`
//! and `Hash`. Values order by type first (null, booleans, numbers, datetimes,
//! strings), then within the type. All numeric types collapse to `f64` using
//! total ordering, with `-0.0` normalized to `0.0` so hashing agrees with
//! equality. Non-scalar values (arrays, documents, binary) index as null.

use bson::Bson;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone)]
pub(crate) enum KeyValue {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(i64),
    String(String),
}

impl KeyValue {
    /// Wraps a float, normalizing `-0.0` so equal keys hash equally.
    pub(crate) fn number(value: f64) -> Self {
        if value == 0.0 {
            KeyValue::Number(0.0)
        } else if value.is_nan() {
            KeyValue::Number(f64::NAN)
        } else {
            KeyValue::Number(value)
        }
    }

    fn rank(&self) -> u8 {
        match self {
            KeyValue::Null => 0,
            KeyValue::Bool(_) => 1,
            KeyValue::Number(_) => 2,
            KeyValue::DateTime(_) => 3,
            KeyValue::String(_) => 4,
        }
    }
}

impl From<&Bson> for KeyValue {
    fn from(bson: &Bson) -> Self {
        match bson {
            Bson::Boolean(value) => KeyValue::Bool(*value),
            Bson::Int32(value) => KeyValue::number(*value as f64),
            Bson::Int64(value) => KeyValue::number(*value as f64),
            Bson::Double(value) => KeyValue::number(*value),
            Bson::DateTime(value) => KeyValue::DateTime(value.timestamp_millis()),
            Bson::String(value) => KeyValue::String(value.clone()),
            _ => KeyValue::Null,
        }
    }
}

impl PartialEq for KeyValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyValue {}

impl PartialOrd for KeyValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyValue::Bool(a), KeyValue::Bool(b)) => a.cmp(b),
            (KeyValue::Number(a), KeyValue::Number(b)) => a.total_cmp(b),
            (KeyValue::DateTime(a), KeyValue::DateTime(b)) => a.cmp(b),
            (KeyValue::String(a), KeyValue::String(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for KeyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            KeyValue::Null => {}
            KeyValue::Bool(value) => value.hash(state),
            // Construction normalized -0.0, so bit equality matches total_cmp
            // equality for everything except NaN payloads, which never occur in
            // document data.
            KeyValue::Number(value) => value.to_bits().hash(state),
            KeyValue::DateTime(value) => value.hash(state),
            KeyValue::String(value) => value.hash(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_type_then_value() {
        let mut keys = vec![
            KeyValue::from(&Bson::String("a".to_string())),
            KeyValue::from(&Bson::Int32(5)),
            KeyValue::Null,
            KeyValue::from(&Bson::Boolean(true)),
            KeyValue::from(&Bson::Int32(2)),
        ];
        keys.sort();

        assert_eq!(
            keys,
            vec![
                KeyValue::Null,
                KeyValue::Bool(true),
                KeyValue::number(2.0),
                KeyValue::number(5.0),
                KeyValue::String("a".to_string()),
            ]
        );
    }

    #[test]
    fn integers_and_doubles_compare_equal() {
        assert_eq!(
            KeyValue::from(&Bson::Int32(10)),
            KeyValue::from(&Bson::Double(10.0)),
        );
    }

    #[test]
    fn negative_zero_equals_zero() {
        assert_eq!(
            KeyValue::from(&Bson::Double(-0.0)),
            KeyValue::from(&Bson::Double(0.0)),
        );
    }
}
