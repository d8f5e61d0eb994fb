//! Query filters and find options
//!
//! The subset of document queries the graph layer relies on: field equality,
//! membership in a set, conjunction, disjunction, sorting and limits.

use super::value::{Document, FieldPath, Value};

/// Predicate over a single document
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document
    All,
    /// Field equals value; a missing field equals `Null`
    Eq(FieldPath, Value),
    /// Field equals any of the values; an empty set matches nothing
    In(FieldPath, Vec<Value>),
    /// All sub-filters match
    And(Vec<Filter>),
    /// At least one sub-filter matches
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Filter::Eq(path.into(), value.into())
    }

    pub fn is_in<V: Into<Value>>(path: impl Into<FieldPath>, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In(path.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    /// Conjunction with another filter, flattening nested `And`s
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), f) => {
                left.push(f);
                Filter::And(left)
            }
            (f, Filter::And(mut right)) => {
                right.insert(0, f);
                Filter::And(right)
            }
            (a, b) => Filter::And(vec![a, b]),
        }
    }

    /// Filter matching a document whose top-level fields all equal `document`'s
    pub fn identity(document: &Document) -> Self {
        Filter::And(
            document
                .iter()
                .map(|(key, value)| Filter::Eq(FieldPath::new(key.clone()), value.clone()))
                .collect(),
        )
    }

    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(path, expected) => match document.get_path(path) {
                Some(actual) => actual.loose_eq(expected),
                None => expected.is_null(),
            },
            Filter::In(path, candidates) => {
                let actual = document.get_path(path).unwrap_or(&Value::Null);
                candidates.iter().any(|candidate| actual.loose_eq(candidate))
            }
            Filter::And(filters) => filters.iter().all(|f| f.matches(document)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(document)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub path: FieldPath,
    pub order: SortOrder,
}

/// Sorting and limiting applied after filtering
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Option<SortSpec>,
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, path: impl Into<FieldPath>, order: SortOrder) -> Self {
        self.sort = Some(SortSpec {
            path: path.into(),
            order,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Filter, sort and truncate a sequence of documents.
    ///
    /// Sorting is stable, so documents with equal keys keep their input order.
    /// Missing sort fields order as `Null`.
    pub fn apply<'a, I>(&self, documents: I, filter: &Filter) -> Vec<Document>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut matched: Vec<&Document> = documents
            .into_iter()
            .filter(|doc| filter.matches(doc))
            .collect();

        if let Some(spec) = &self.sort {
            matched.sort_by(|a, b| {
                let a = a.get_path(&spec.path).unwrap_or(&Value::Null);
                let b = b.get_path(&spec.path).unwrap_or(&Value::Null);
                match spec.order {
                    SortOrder::Ascending => a.sort_cmp(b),
                    SortOrder::Descending => b.sort_cmp(a),
                }
            });
        }

        let limit = self.limit.unwrap_or(usize::MAX);
        matched.into_iter().take(limit).cloned().collect()
    }
}
