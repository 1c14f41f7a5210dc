//! Backend-neutral document store interface.
//!
//! Repositories talk to a [`DocumentStore`] so the same code runs against
//! Firestore in production and [`crate::InMemoryStore`] locally and in tests.

use async_trait::async_trait;

use crate::error::FirestoreResult;
use crate::types::{
    CollectionSelector, CompositeFilter, Document, FieldFilter, FieldReference, Fields, Filter,
    Order, StructuredQuery, ToFirestoreValue, Value,
};

/// Comparison applied by a query condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equal,
    LessThan,
}

impl FilterOp {
    fn as_wire(&self) -> &'static str {
        match self {
            FilterOp::Equal => "EQUAL",
            FilterOp::LessThan => "LESS_THAN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    fn as_wire(&self) -> &'static str {
        match self {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        }
    }
}

/// Query over a single collection. Conditions are AND-ed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub conditions: Vec<Condition>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<u32>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: &str, value: impl ToFirestoreValue) -> Self {
        self.conditions.push(Condition {
            field: field.to_string(),
            op: FilterOp::Equal,
            value: value.to_firestore_value(),
        });
        self
    }

    pub fn where_lt(mut self, field: &str, value: impl ToFirestoreValue) -> Self {
        self.conditions.push(Condition {
            field: field.to_string(),
            op: FilterOp::LessThan,
            value: value.to_firestore_value(),
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render as a Firestore `runQuery` body.
    pub fn to_structured(&self, collection: &str) -> StructuredQuery {
        let mut filters: Vec<Filter> = self
            .conditions
            .iter()
            .map(|c| Filter {
                composite_filter: None,
                field_filter: Some(FieldFilter {
                    field: FieldReference {
                        field_path: c.field.clone(),
                    },
                    op: c.op.as_wire().to_string(),
                    value: c.value.clone(),
                }),
            })
            .collect();

        let r#where = match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(Filter {
                composite_filter: Some(CompositeFilter {
                    op: "AND".to_string(),
                    filters,
                }),
                field_filter: None,
            }),
        };

        StructuredQuery {
            from: vec![CollectionSelector {
                collection_id: collection.to_string(),
            }],
            r#where,
            order_by: self.order_by.as_ref().map(|(field, dir)| {
                vec![Order {
                    field: FieldReference {
                        field_path: field.clone(),
                    },
                    direction: dir.as_wire().to_string(),
                }]
            }),
            limit: self.limit.map(|l| l.min(i32::MAX as u32) as i32),
        }
    }
}

/// Document CRUD and query operations.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document; `Ok(None)` if it does not exist.
    async fn get(&self, collection: &str, id: &str) -> FirestoreResult<Option<Document>>;

    /// Create a document; fails with `AlreadyExists` on id collision.
    async fn create(&self, collection: &str, id: &str, fields: Fields) -> FirestoreResult<Document>;

    /// Update an existing document; fails with `NotFound` if it is missing.
    ///
    /// With a mask only the listed fields are written.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        mask: Option<Vec<String>>,
    ) -> FirestoreResult<Document>;

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete(&self, collection: &str, id: &str) -> FirestoreResult<()>;

    async fn query(&self, collection: &str, query: Query) -> FirestoreResult<Vec<Document>>;
}
