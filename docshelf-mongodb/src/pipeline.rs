//! Aggregation pipeline translation to MongoDB stage documents.
//!
//! Each [`Stage`] maps onto its native aggregation counterpart (`$match`,
//! `$group`, `$project`, `$sort`, `$limit`, `$skip`), with value expressions
//! rendered as `$`-prefixed field paths and operator documents.

use bson::{Bson, Document, doc};

use docshelf_core::{
    error::DocumentStoreResult,
    pipeline::{Accumulator, Pipeline, Stage, ValueExpr},
    query::SortDirection,
};

use crate::query::filter_document;

fn value_expr(expr: &ValueExpr) -> Bson {
    match expr {
        ValueExpr::Literal(value) => value.clone(),
        ValueExpr::Field(name) => Bson::String(format!("${name}")),
        ValueExpr::Add(lhs, rhs) => {
            Bson::Document(doc! { "$add": [value_expr(lhs), value_expr(rhs)] })
        }
        ValueExpr::Subtract(lhs, rhs) => {
            Bson::Document(doc! { "$subtract": [value_expr(lhs), value_expr(rhs)] })
        }
        ValueExpr::Multiply(lhs, rhs) => {
            Bson::Document(doc! { "$multiply": [value_expr(lhs), value_expr(rhs)] })
        }
        ValueExpr::Divide(lhs, rhs) => {
            Bson::Document(doc! { "$divide": [value_expr(lhs), value_expr(rhs)] })
        }
        ValueExpr::Mod(lhs, rhs) => {
            Bson::Document(doc! { "$mod": [value_expr(lhs), value_expr(rhs)] })
        }
    }
}

fn accumulator(acc: &Accumulator) -> Document {
    match acc {
        Accumulator::Avg(expr) => doc! { "$avg": value_expr(expr) },
        Accumulator::Sum(expr) => doc! { "$sum": value_expr(expr) },
        Accumulator::Min(expr) => doc! { "$min": value_expr(expr) },
        Accumulator::Max(expr) => doc! { "$max": value_expr(expr) },
        Accumulator::Count => doc! { "$sum": 1 },
    }
}

/// Renders a pipeline as the stage documents MongoDB's `aggregate` expects.
pub(crate) fn pipeline_stages(pipeline: &Pipeline) -> DocumentStoreResult<Vec<Document>> {
    pipeline
        .stages
        .iter()
        .map(|stage| {
            Ok(match stage {
                Stage::Match(filter) => doc! { "$match": filter_document(Some(filter))? },
                Stage::Group { key, fields } => {
                    let mut group = doc! { "_id": value_expr(key) };
                    for (name, acc) in fields {
                        group.insert(name.clone(), accumulator(acc));
                    }
                    doc! { "$group": group }
                }
                Stage::Project(fields) => {
                    // Output carries exactly the listed fields, so the implicit
                    // _id passthrough is suppressed unless requested.
                    let mut project = Document::new();
                    if !fields.iter().any(|(name, _)| name == "_id") {
                        project.insert("_id", 0);
                    }
                    for (name, expr) in fields {
                        project.insert(name.clone(), value_expr(expr));
                    }
                    doc! { "$project": project }
                }
                Stage::Sort(sort) => doc! {
                    "$sort": {
                        sort.field.clone(): match sort.direction {
                            SortDirection::Asc => 1,
                            SortDirection::Desc => -1,
                        }
                    }
                },
                Stage::Limit(limit) => doc! { "$limit": *limit as i64 },
                Stage::Skip(skip) => doc! { "$skip": *skip as i64 },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docshelf_core::query::Filter;

    #[test]
    fn group_stage_renders_accumulators() {
        let pipeline = Pipeline::builder()
            .group(ValueExpr::field("genre"), [(
                "average_price",
                Accumulator::Avg(ValueExpr::field("price")),
            )])
            .build();

        let stages = pipeline_stages(&pipeline).unwrap();
        assert_eq!(
            stages,
            vec![doc! { "$group": {
                "_id": "$genre",
                "average_price": { "$avg": "$price" },
            } }],
        );
    }

    #[test]
    fn project_stage_suppresses_id_and_renders_arithmetic() {
        let decade = ValueExpr::subtract(
            ValueExpr::field("published_year"),
            ValueExpr::modulo(ValueExpr::field("published_year"), ValueExpr::lit(10)),
        );
        let pipeline = Pipeline::builder()
            .project([("decade", decade)])
            .build();

        let stages = pipeline_stages(&pipeline).unwrap();
        assert_eq!(
            stages,
            vec![doc! { "$project": {
                "_id": 0,
                "decade": { "$subtract": [
                    "$published_year",
                    { "$mod": ["$published_year", 10] },
                ] },
            } }],
        );
    }

    #[test]
    fn match_sort_limit_render_natively() {
        let pipeline = Pipeline::builder()
            .match_filter(Filter::eq("genre", "Fantasy"))
            .sort("price", SortDirection::Desc)
            .limit(1)
            .build();

        let stages = pipeline_stages(&pipeline).unwrap();
        assert_eq!(stages[0], doc! { "$match": { "genre": { "$eq": "Fantasy" } } });
        assert_eq!(stages[1], doc! { "$sort": { "price": -1 } });
        assert_eq!(stages[2], doc! { "$limit": 1_i64 });
    }
}
