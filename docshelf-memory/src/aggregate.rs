//! Aggregation pipeline execution for the in-memory backend.
//!
//! Stages run in order over an owned document set. Numeric semantics follow
//! common document-database conventions: integer-only arithmetic stays
//! integral (widened to `Int64`), any floating-point operand promotes the
//! result to `Double`, division always produces a `Double`, and a zero divisor
//! or non-numeric operand yields null rather than an error.

use bson::{Bson, Document as BsonDocument, doc};
use std::collections::HashMap;

use docshelf_core::{
    error::DocumentStoreResult,
    pipeline::{Accumulator, Pipeline, Stage, ValueExpr},
};

use crate::{
    evaluator::{DocumentEvaluator, sort_documents},
    keys::KeyValue,
};

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(value) => value as f64,
            Num::Float(value) => value,
        }
    }
}

fn numeric(value: &Bson) -> Option<Num> {
    match value {
        Bson::Int32(value) => Some(Num::Int(*value as i64)),
        Bson::Int64(value) => Some(Num::Int(*value)),
        Bson::Double(value) => Some(Num::Float(*value)),
        _ => None,
    }
}

/// Evaluates a value expression against a single document.
pub(crate) fn eval_value(expr: &ValueExpr, document: &BsonDocument) -> Bson {
    match expr {
        ValueExpr::Literal(value) => value.clone(),
        ValueExpr::Field(name) => document
            .get(name)
            .cloned()
            .unwrap_or(Bson::Null),
        ValueExpr::Add(lhs, rhs) => binary(lhs, rhs, document, |a, b| match (a, b) {
            (Num::Int(x), Num::Int(y)) => Bson::Int64(x.wrapping_add(y)),
            (a, b) => Bson::Double(a.as_f64() + b.as_f64()),
        }),
        ValueExpr::Subtract(lhs, rhs) => binary(lhs, rhs, document, |a, b| match (a, b) {
            (Num::Int(x), Num::Int(y)) => Bson::Int64(x.wrapping_sub(y)),
            (a, b) => Bson::Double(a.as_f64() - b.as_f64()),
        }),
        ValueExpr::Multiply(lhs, rhs) => binary(lhs, rhs, document, |a, b| match (a, b) {
            (Num::Int(x), Num::Int(y)) => Bson::Int64(x.wrapping_mul(y)),
            (a, b) => Bson::Double(a.as_f64() * b.as_f64()),
        }),
        ValueExpr::Divide(lhs, rhs) => binary(lhs, rhs, document, |a, b| {
            let divisor = b.as_f64();
            if divisor == 0.0 {
                Bson::Null
            } else {
                Bson::Double(a.as_f64() / divisor)
            }
        }),
        ValueExpr::Mod(lhs, rhs) => binary(lhs, rhs, document, |a, b| match (a, b) {
            (Num::Int(x), Num::Int(y)) => {
                if y == 0 {
                    Bson::Null
                } else {
                    Bson::Int64(x.wrapping_rem(y))
                }
            }
            (a, b) => {
                let divisor = b.as_f64();
                if divisor == 0.0 {
                    Bson::Null
                } else {
                    Bson::Double(a.as_f64() % divisor)
                }
            }
        }),
    }
}

fn binary(
    lhs: &ValueExpr,
    rhs: &ValueExpr,
    document: &BsonDocument,
    apply: impl FnOnce(Num, Num) -> Bson,
) -> Bson {
    match (
        numeric(&eval_value(lhs, document)),
        numeric(&eval_value(rhs, document)),
    ) {
        (Some(a), Some(b)) => apply(a, b),
        _ => Bson::Null,
    }
}

fn accumulate(accumulator: &Accumulator, members: &[BsonDocument]) -> Bson {
    match accumulator {
        Accumulator::Avg(expr) => {
            let values = collect_numeric(expr, members);
            if values.is_empty() {
                Bson::Null
            } else {
                let total: f64 = values.iter().map(|n| n.as_f64()).sum();
                Bson::Double(total / values.len() as f64)
            }
        }
        Accumulator::Sum(expr) => {
            let values = collect_numeric(expr, members);
            let integral = values
                .iter()
                .all(|n| matches!(n, Num::Int(_)));

            if integral {
                Bson::Int64(
                    values
                        .iter()
                        .map(|n| match n {
                            Num::Int(value) => *value,
                            Num::Float(_) => 0,
                        })
                        .sum(),
                )
            } else {
                Bson::Double(values.iter().map(|n| n.as_f64()).sum())
            }
        }
        Accumulator::Min(expr) => extremum(expr, members, |candidate, best| candidate < best),
        Accumulator::Max(expr) => extremum(expr, members, |candidate, best| candidate > best),
        Accumulator::Count => Bson::Int64(members.len() as i64),
    }
}

fn collect_numeric(expr: &ValueExpr, members: &[BsonDocument]) -> Vec<Num> {
    members
        .iter()
        .filter_map(|doc| numeric(&eval_value(expr, doc)))
        .collect()
}

fn extremum(
    expr: &ValueExpr,
    members: &[BsonDocument],
    beats: impl Fn(&KeyValue, &KeyValue) -> bool,
) -> Bson {
    let mut best: Option<(KeyValue, Bson)> = None;

    for doc in members {
        let value = eval_value(expr, doc);
        if matches!(value, Bson::Null) {
            continue;
        }

        let key = KeyValue::from(&value);
        match &best {
            Some((best_key, _)) if !beats(&key, best_key) => {}
            _ => best = Some((key, value)),
        }
    }

    best.map(|(_, value)| value)
        .unwrap_or(Bson::Null)
}

/// Runs a pipeline over an owned snapshot of a collection's documents.
pub(crate) fn run_pipeline(
    documents: Vec<Bson>,
    pipeline: &Pipeline,
) -> DocumentStoreResult<Vec<Bson>> {
    let mut current = documents;

    for stage in &pipeline.stages {
        current = match stage {
            Stage::Match(filter) => current
                .into_iter()
                .filter(|doc| DocumentEvaluator::matches(doc, Some(filter)))
                .collect(),
            Stage::Group { key, fields } => {
                // Groups keep first-appearance order so downstream stages see a
                // deterministic sequence.
                let mut lookup: HashMap<KeyValue, usize> = HashMap::new();
                let mut groups: Vec<(Bson, Vec<BsonDocument>)> = Vec::new();

                for doc in &current {
                    let Some(fields_doc) = doc.as_document() else {
                        continue;
                    };

                    let key_value = eval_value(key, fields_doc);
                    let slot = *lookup
                        .entry(KeyValue::from(&key_value))
                        .or_insert_with(|| {
                            groups.push((key_value.clone(), Vec::new()));
                            groups.len() - 1
                        });

                    groups[slot].1.push(fields_doc.clone());
                }

                groups
                    .into_iter()
                    .map(|(key_value, members)| {
                        let mut out = doc! { "_id": key_value };
                        for (name, accumulator) in fields {
                            out.insert(name.clone(), accumulate(accumulator, &members));
                        }
                        Bson::Document(out)
                    })
                    .collect()
            }
            Stage::Project(fields) => current
                .into_iter()
                .filter_map(|doc| {
                    let fields_doc = doc.as_document()?;

                    let mut out = BsonDocument::new();
                    for (name, expr) in fields {
                        out.insert(name.clone(), eval_value(expr, fields_doc));
                    }
                    Some(Bson::Document(out))
                })
                .collect(),
            Stage::Sort(sort) => {
                let mut sorted = current;
                sort_documents(&mut sorted, sort);
                sorted
            }
            Stage::Limit(limit) => current.into_iter().take(*limit).collect(),
            Stage::Skip(skip) => current.into_iter().skip(*skip).collect(),
        };
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docshelf_core::{
        pipeline::Pipeline,
        query::{Filter, SortDirection},
    };

    fn books() -> Vec<Bson> {
        vec![
            Bson::Document(doc! { "title": "1984", "genre": "Dystopian", "published_year": 1949, "price": 9.99 }),
            Bson::Document(doc! { "title": "Brave New World", "genre": "Dystopian", "published_year": 1932, "price": 10.50 }),
            Bson::Document(doc! { "title": "The Hobbit", "genre": "Fantasy", "published_year": 1937, "price": 14.99 }),
            Bson::Document(doc! { "title": "Neuromancer", "genre": "Cyberpunk", "published_year": 1984, "price": 11.25 }),
        ]
    }

    #[test]
    fn group_averages_per_key() {
        let pipeline = Pipeline::builder()
            .group(ValueExpr::field("genre"), [(
                "average_price",
                Accumulator::Avg(ValueExpr::field("price")),
            )])
            .build();

        let results = run_pipeline(books(), &pipeline).unwrap();
        assert_eq!(results.len(), 3);

        let dystopian = results
            .iter()
            .filter_map(|r| r.as_document())
            .find(|d| d.get_str("_id").ok() == Some("Dystopian"))
            .unwrap();
        let avg = dystopian.get_f64("average_price").unwrap();
        assert!((avg - 10.245).abs() < 1e-9);
    }

    #[test]
    fn sum_of_ones_counts_group_members() {
        let pipeline = Pipeline::builder()
            .group(ValueExpr::field("genre"), [(
                "book_count",
                Accumulator::Sum(ValueExpr::lit(1)),
            )])
            .sort("book_count", SortDirection::Desc)
            .limit(1)
            .build();

        let results = run_pipeline(books(), &pipeline).unwrap();
        assert_eq!(results.len(), 1);

        let top = results[0].as_document().unwrap();
        assert_eq!(top.get_str("_id").ok(), Some("Dystopian"));
        assert_eq!(top.get_i64("book_count").ok(), Some(2));
    }

    #[test]
    fn project_computes_decades() {
        let decade = ValueExpr::subtract(
            ValueExpr::field("published_year"),
            ValueExpr::modulo(ValueExpr::field("published_year"), ValueExpr::lit(10)),
        );

        let pipeline = Pipeline::builder()
            .project([("decade", decade)])
            .group(ValueExpr::field("decade"), [(
                "count",
                Accumulator::Sum(ValueExpr::lit(1)),
            )])
            .sort("_id", SortDirection::Asc)
            .build();

        let results = run_pipeline(books(), &pipeline).unwrap();
        let decades: Vec<(i64, i64)> = results
            .iter()
            .filter_map(|r| r.as_document())
            .map(|d| (d.get_i64("_id").unwrap(), d.get_i64("count").unwrap()))
            .collect();

        assert_eq!(decades, vec![(1930, 2), (1940, 1), (1980, 1)]);
    }

    #[test]
    fn match_stage_filters_before_grouping() {
        let pipeline = Pipeline::builder()
            .match_filter(Filter::gt("published_year", 1940))
            .group(ValueExpr::field("genre"), [("count", Accumulator::Count)])
            .build();

        let results = run_pipeline(books(), &pipeline).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn division_by_zero_is_null() {
        let doc = doc! { "price": 10 };
        let expr = ValueExpr::divide(ValueExpr::field("price"), ValueExpr::lit(0));

        assert_eq!(eval_value(&expr, &doc), Bson::Null);
    }

    #[test]
    fn division_is_always_double() {
        let doc = doc! { "price": 10 };
        let expr = ValueExpr::divide(ValueExpr::field("price"), ValueExpr::lit(4));

        assert_eq!(eval_value(&expr, &doc), Bson::Double(2.5));
    }

    #[test]
    fn avg_of_empty_group_is_null() {
        assert_eq!(
            accumulate(&Accumulator::Avg(ValueExpr::field("price")), &[]),
            Bson::Null,
        );
    }

    #[test]
    fn min_and_max_track_extremes() {
        let members: Vec<BsonDocument> = books()
            .into_iter()
            .filter_map(|b| b.as_document().cloned())
            .collect();

        assert_eq!(
            accumulate(&Accumulator::Min(ValueExpr::field("price")), &members),
            Bson::Double(9.99),
        );
        assert_eq!(
            accumulate(&Accumulator::Max(ValueExpr::field("published_year")), &members),
            Bson::Int32(1984),
        );
    }
}
