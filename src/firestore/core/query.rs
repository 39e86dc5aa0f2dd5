use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::firestore::collection::Comparator;
use crate::firestore::error::FirestoreResult;
use crate::firestore::model::{Document, DocumentKey, FieldPath, ResourcePath};
use crate::firestore::value::{values, FirestoreValue};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    LessThan,
    LessThanOrEqual,
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    ArrayContains,
    ArrayContainsAny,
    In,
    NotIn,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::LessThan => "<",
            FilterOperator::LessThanOrEqual => "<=",
            FilterOperator::Equal => "==",
            FilterOperator::NotEqual => "!=",
            FilterOperator::GreaterThan => ">",
            FilterOperator::GreaterThanOrEqual => ">=",
            FilterOperator::ArrayContains => "array-contains",
            FilterOperator::ArrayContainsAny => "array-contains-any",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "not-in",
        }
    }

    pub fn is_inequality(&self) -> bool {
        matches!(
            self,
            FilterOperator::LessThan
                | FilterOperator::LessThanOrEqual
                | FilterOperator::GreaterThan
                | FilterOperator::GreaterThanOrEqual
                | FilterOperator::NotEqual
                | FilterOperator::NotIn
        )
    }
}

/// A `field <op> value` restriction.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldFilter {
    field: FieldPath,
    operator: FilterOperator,
    value: FirestoreValue,
}

impl FieldFilter {
    pub fn new(field: FieldPath, operator: FilterOperator, value: FirestoreValue) -> Self {
        Self {
            field,
            operator,
            value,
        }
    }

    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    pub fn value(&self) -> &FirestoreValue {
        &self.value
    }

    pub fn matches(&self, document: &Document) -> bool {
        let Some(actual) = document.field(&self.field) else {
            return false;
        };
        let expected = &self.value;
        match self.operator {
            FilterOperator::NotEqual => {
                !actual.is_null() && values::compare(&actual, expected) != Ordering::Equal
            }
            FilterOperator::ArrayContains => actual
                .as_array()
                .is_some_and(|array| values::contains(array, expected)),
            FilterOperator::ArrayContainsAny => match (actual.as_array(), expected.as_array()) {
                (Some(array), Some(needles)) => needles
                    .values()
                    .iter()
                    .any(|needle| values::contains(array, needle)),
                _ => false,
            },
            FilterOperator::In => expected
                .as_array()
                .is_some_and(|candidates| values::contains(candidates, &actual)),
            FilterOperator::NotIn => {
                !actual.is_null()
                    && expected
                        .as_array()
                        .is_some_and(|candidates| !values::contains(candidates, &actual))
            }
            comparison => {
                values::type_order(&actual) == values::type_order(expected)
                    && matches_comparison(comparison, values::compare(&actual, expected))
            }
        }
    }
}

fn matches_comparison(operator: FilterOperator, ordering: Ordering) -> bool {
    match operator {
        FilterOperator::LessThan => ordering == Ordering::Less,
        FilterOperator::LessThanOrEqual => ordering != Ordering::Greater,
        FilterOperator::Equal => ordering == Ordering::Equal,
        FilterOperator::GreaterThan => ordering == Ordering::Greater,
        FilterOperator::GreaterThanOrEqual => ordering != Ordering::Less,
        _ => false,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OrderBy {
    field: FieldPath,
    direction: Direction,
}

impl OrderBy {
    pub fn new(field: FieldPath, direction: Direction) -> Self {
        Self { field, direction }
    }

    pub fn ascending(field: FieldPath) -> Self {
        Self::new(field, Direction::Ascending)
    }

    pub fn descending(field: FieldPath) -> Self {
        Self::new(field, Direction::Descending)
    }

    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn compare(&self, left: &Document, right: &Document) -> Ordering {
        let ordering = if self.field.is_key_field() {
            left.key().cmp(right.key())
        } else {
            match (left.field(&self.field), right.field(&self.field)) {
                (Some(l), Some(r)) => values::compare(&l, &r),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        };
        match self.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LimitType {
    #[default]
    First,
    Last,
}

/// A query over the documents of one collection, or over a single document.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    path: ResourcePath,
    filters: Vec<FieldFilter>,
    explicit_order_by: Vec<OrderBy>,
    limit: Option<usize>,
    limit_type: LimitType,
}

impl Query {
    pub fn at_path(path: ResourcePath) -> Self {
        Self {
            path,
            filters: Vec::new(),
            explicit_order_by: Vec::new(),
            limit: None,
            limit_type: LimitType::First,
        }
    }

    pub fn from_path(path: &str) -> FirestoreResult<Self> {
        Ok(Self::at_path(ResourcePath::from_string(path)?))
    }

    pub fn filter(mut self, filter: FieldFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.explicit_order_by.push(order_by);
        self
    }

    pub fn limit_to_first(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self.limit_type = LimitType::First;
        self
    }

    pub fn limit_to_last(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self.limit_type = LimitType::Last;
        self
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    pub fn filters(&self) -> &[FieldFilter] {
        &self.filters
    }

    pub fn explicit_order_by(&self) -> &[OrderBy] {
        &self.explicit_order_by
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn limit_type(&self) -> LimitType {
        self.limit_type
    }

    pub fn has_limit_to_first(&self) -> bool {
        self.limit.is_some() && self.limit_type == LimitType::First
    }

    pub fn has_limit_to_last(&self) -> bool {
        self.limit.is_some() && self.limit_type == LimitType::Last
    }

    pub fn is_document_query(&self) -> bool {
        DocumentKey::is_document_key(&self.path) && self.filters.is_empty()
    }

    pub fn inequality_field(&self) -> Option<&FieldPath> {
        self.filters
            .iter()
            .find(|filter| filter.operator().is_inequality())
            .map(FieldFilter::field)
    }

    /// The effective sort order: explicit order-bys, or the first inequality field when there are
    /// none, always ending with a key ordering. The implicit key ordering follows the direction
    /// of the last explicit order-by.
    pub fn normalized_order_by(&self) -> Vec<OrderBy> {
        if self.explicit_order_by.is_empty() {
            if let Some(field) = self.inequality_field() {
                if field.is_key_field() {
                    return vec![OrderBy::ascending(FieldPath::document_id())];
                }
                return vec![
                    OrderBy::ascending(field.clone()),
                    OrderBy::ascending(FieldPath::document_id()),
                ];
            }
        }

        let mut order_by = self.explicit_order_by.clone();
        if !order_by.iter().any(|order| order.field().is_key_field()) {
            let direction = order_by
                .last()
                .map_or(Direction::Ascending, OrderBy::direction);
            order_by.push(OrderBy::new(FieldPath::document_id(), direction));
        }
        order_by
    }

    /// Whether `document` belongs in this query's result set, ignoring limits.
    pub fn matches(&self, document: &Document) -> bool {
        self.matches_path(document.key())
            && self.matches_order_by(document)
            && self.filters.iter().all(|filter| filter.matches(document))
    }

    fn matches_path(&self, key: &DocumentKey) -> bool {
        let document_path = key.path();
        if DocumentKey::is_document_key(&self.path) {
            &self.path == document_path
        } else {
            self.path.is_immediate_parent_of(document_path)
        }
    }

    fn matches_order_by(&self, document: &Document) -> bool {
        self.explicit_order_by
            .iter()
            .all(|order| order.field().is_key_field() || document.field(order.field()).is_some())
    }

    /// A comparator that sorts documents by [`Query::normalized_order_by`].
    pub fn comparator(&self) -> Comparator<Document> {
        let order_by = self.normalized_order_by();
        Arc::new(move |left: &Document, right: &Document| {
            order_by
                .iter()
                .map(|order| order.compare(left, right))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        })
    }

    /// A stable textual identity used in log output.
    pub fn canonical_id(&self) -> String {
        let mut id = self.path.canonical_string();
        if !self.filters.is_empty() {
            id.push_str("|f:");
            for filter in &self.filters {
                id.push_str(&filter.field().canonical_string());
                id.push_str(filter.operator().as_str());
                id.push_str(&values::canonical_id(filter.value()));
            }
        }
        id.push_str("|ob:");
        for order in self.normalized_order_by() {
            id.push_str(&order.field().canonical_string());
            id.push_str(match order.direction() {
                Direction::Ascending => "asc",
                Direction::Descending => "desc",
            });
        }
        if let Some(limit) = self.limit {
            let kind = match self.limit_type {
                LimitType::First => "F",
                LimitType::Last => "L",
            };
            id.push_str(&format!("|l:{limit}|lt:{kind}"));
        }
        id
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Query({})", self.canonical_id())
    }
}

/// Convenience for building filters from strings in tests and call sites.
pub fn field_filter(
    field: &str,
    operator: FilterOperator,
    value: impl Into<FirestoreValue>,
) -> FirestoreResult<FieldFilter> {
    Ok(FieldFilter::new(
        FieldPath::from_dot_separated(field)?,
        operator,
        value.into(),
    ))
}
