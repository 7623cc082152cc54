//! Aggregation pipeline construction for document stores.
//!
//! A pipeline is an ordered sequence of stages applied to the documents of a
//! collection: filtering, grouping with accumulators, computed projections,
//! sorting and pagination. Backends translate or evaluate the pipeline; the
//! types here are purely descriptive.
//!
//! # Example
//!
//! Average price per genre:
//!
//! ```ignore
//! use docshelf::pipeline::{Pipeline, ValueExpr, Accumulator};
//!
//! let pipeline = Pipeline::builder()
//!     .group(ValueExpr::field("genre"), [
//!         ("average_price", Accumulator::Avg(ValueExpr::field("price"))),
//!     ])
//!     .build();
//! ```
//!
//! Books per publication decade:
//!
//! ```ignore
//! use docshelf::pipeline::{Pipeline, ValueExpr, Accumulator};
//! use docshelf::query::SortDirection;
//!
//! let decade = ValueExpr::subtract(
//!     ValueExpr::field("published_year"),
//!     ValueExpr::modulo(ValueExpr::field("published_year"), ValueExpr::lit(10)),
//! );
//!
//! let pipeline = Pipeline::builder()
//!     .project([("decade", decade)])
//!     .group(ValueExpr::field("decade"), [
//!         ("count", Accumulator::Sum(ValueExpr::lit(1))),
//!     ])
//!     .sort("_id", SortDirection::Asc)
//!     .build();
//! ```

use bson::Bson;

use crate::query::{Expr, Sort, SortDirection};

/// A value-producing expression evaluated against a single document.
///
/// Used for group keys, projected fields and accumulator inputs. Arithmetic
/// operators apply to numeric operands; a non-numeric operand or a zero divisor
/// yields null.
#[derive(Debug, Clone)]
pub enum ValueExpr {
    /// A literal constant.
    Literal(Bson),
    /// The value of a top-level document field (null when missing).
    Field(String),
    /// Sum of two expressions.
    Add(Box<ValueExpr>, Box<ValueExpr>),
    /// Difference of two expressions.
    Subtract(Box<ValueExpr>, Box<ValueExpr>),
    /// Product of two expressions.
    Multiply(Box<ValueExpr>, Box<ValueExpr>),
    /// Quotient of two expressions.
    Divide(Box<ValueExpr>, Box<ValueExpr>),
    /// Remainder of two expressions.
    Mod(Box<ValueExpr>, Box<ValueExpr>),
}

impl ValueExpr {
    /// References a top-level document field.
    pub fn field(name: impl Into<String>) -> Self {
        ValueExpr::Field(name.into())
    }

    /// A literal constant value.
    pub fn lit(value: impl Into<Bson>) -> Self {
        ValueExpr::Literal(value.into())
    }

    /// `lhs + rhs`.
    pub fn add(lhs: ValueExpr, rhs: ValueExpr) -> Self {
        ValueExpr::Add(Box::new(lhs), Box::new(rhs))
    }

    /// `lhs - rhs`.
    pub fn subtract(lhs: ValueExpr, rhs: ValueExpr) -> Self {
        ValueExpr::Subtract(Box::new(lhs), Box::new(rhs))
    }

    /// `lhs * rhs`.
    pub fn multiply(lhs: ValueExpr, rhs: ValueExpr) -> Self {
        ValueExpr::Multiply(Box::new(lhs), Box::new(rhs))
    }

    /// `lhs / rhs`.
    pub fn divide(lhs: ValueExpr, rhs: ValueExpr) -> Self {
        ValueExpr::Divide(Box::new(lhs), Box::new(rhs))
    }

    /// `lhs % rhs`.
    pub fn modulo(lhs: ValueExpr, rhs: ValueExpr) -> Self {
        ValueExpr::Mod(Box::new(lhs), Box::new(rhs))
    }
}

/// An accumulator applied to each group of documents.
///
/// Non-numeric and missing inputs are skipped by the numeric accumulators,
/// matching typical document-database semantics.
#[derive(Debug, Clone)]
pub enum Accumulator {
    /// Average of the numeric values produced by the expression (null for an empty input).
    Avg(ValueExpr),
    /// Sum of the numeric values produced by the expression (0 for an empty input).
    ///
    /// `Sum(ValueExpr::lit(1))` is the conventional way to count group members.
    Sum(ValueExpr),
    /// Smallest value produced by the expression.
    Min(ValueExpr),
    /// Largest value produced by the expression.
    Max(ValueExpr),
    /// Number of documents in the group.
    Count,
}

/// A single stage of an aggregation pipeline.
#[derive(Debug, Clone)]
pub enum Stage {
    /// Keeps only documents matching the filter expression.
    Match(Expr),
    /// Groups documents by the key expression and computes accumulated fields.
    ///
    /// The group key is emitted as the `_id` field of each output document,
    /// followed by one field per accumulator.
    Group {
        /// Expression producing the group key for each document.
        key: ValueExpr,
        /// Output field names and their accumulators.
        fields: Vec<(String, Accumulator)>,
    },
    /// Replaces each document with the listed computed fields.
    ///
    /// Output documents contain exactly the listed fields, in order.
    Project(Vec<(String, ValueExpr)>),
    /// Sorts documents by a field.
    Sort(Sort),
    /// Keeps only the first `n` documents.
    Limit(usize),
    /// Discards the first `n` documents.
    Skip(usize),
}

/// An ordered sequence of aggregation stages.
///
/// Use [`Pipeline::builder`] for fluent construction.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    /// The stages, applied in order.
    pub stages: Vec<Stage>,
}

impl Pipeline {
    /// Creates an empty pipeline (passes documents through unchanged).
    pub fn new() -> Self {
        Pipeline::default()
    }

    /// Creates a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    stages: Vec<Stage>,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    pub fn new() -> Self {
        PipelineBuilder { stages: Vec::new() }
    }

    /// Appends an arbitrary stage.
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Appends a match stage keeping only documents satisfying `filter`.
    pub fn match_filter(self, filter: Expr) -> Self {
        self.stage(Stage::Match(filter))
    }

    /// Appends a group stage keyed by `key` with the given accumulated fields.
    pub fn group<I, S>(self, key: ValueExpr, fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Accumulator)>,
        S: Into<String>,
    {
        self.stage(Stage::Group {
            key,
            fields: fields
                .into_iter()
                .map(|(name, acc)| (name.into(), acc))
                .collect(),
        })
    }

    /// Appends a projection stage producing exactly the listed computed fields.
    pub fn project<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = (S, ValueExpr)>,
        S: Into<String>,
    {
        self.stage(Stage::Project(
            fields
                .into_iter()
                .map(|(name, expr)| (name.into(), expr))
                .collect(),
        ))
    }

    /// Appends a sort stage.
    pub fn sort(self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.stage(Stage::Sort(Sort { field: field.into(), direction }))
    }

    /// Appends a limit stage.
    pub fn limit(self, limit: usize) -> Self {
        self.stage(Stage::Limit(limit))
    }

    /// Appends a skip stage.
    pub fn skip(self, skip: usize) -> Self {
        self.stage(Stage::Skip(skip))
    }

    /// Builds and returns the final pipeline.
    pub fn build(self) -> Pipeline {
        Pipeline { stages: self.stages }
    }
}
