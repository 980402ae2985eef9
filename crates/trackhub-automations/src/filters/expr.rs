//! Filter expression trees and the field-centric builder API.

use std::ops::{BitAnd, BitOr, Not};

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ops::{Op, Scalar};

/// A filter expression binding a field name to an operator object,
/// e.g. `{"display_name": {"$contains": "my-run"}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpr {
    pub field: String,
    pub op: Op,
}

impl Serialize for FilterExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &self.op)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for FilterExpr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut entries = map.into_iter();
        let (field, value) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => {
                return Err(D::Error::custom(
                    "expected an object with exactly one field",
                ));
            }
        };
        // Keys that look like operators belong to `Op`, not a field expression.
        if field.starts_with('$') {
            return Err(D::Error::custom(format!(
                "expected a field name, got operator {field:?}"
            )));
        }
        let op = serde_json::from_value(value).map_err(D::Error::custom)?;
        Ok(Self { field, op })
    }
}

/// A node in a filter expression tree: an operator object, a field
/// expression, or (for forward compatibility when decoding saved
/// automations) a raw object with operators this SDK does not know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Filter {
    Op(Op),
    Expr(FilterExpr),
    Raw(serde_json::Map<String, serde_json::Value>),
}

impl From<FilterExpr> for Filter {
    fn from(expr: FilterExpr) -> Self {
        Self::Expr(expr)
    }
}

impl From<Op> for Filter {
    fn from(op: Op) -> Self {
        Self::Op(op)
    }
}

impl BitAnd for Filter {
    type Output = Filter;

    fn bitand(self, rhs: Filter) -> Filter {
        Filter::Op(Op::And(vec![self, rhs]))
    }
}

impl BitOr for Filter {
    type Output = Filter;

    fn bitor(self, rhs: Filter) -> Filter {
        Filter::Op(Op::Or(vec![self, rhs]))
    }
}

impl Not for Filter {
    type Output = Filter;

    fn not(self) -> Filter {
        Filter::Op(Op::Not(Box::new(self)))
    }
}

/// A field name or path to filter on in the backend.
///
/// Methods build [`Filter`] leaves, chainable with `&`, `|` and `!`:
///
/// ```
/// use trackhub_automations::filters::FilterField;
///
/// let field = FilterField::new("display_name");
/// let filter = field.contains("my-run") & field.exists(true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterField {
    name: String,
}

impl FilterField {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn expr(&self, op: Op) -> Filter {
        Filter::Expr(FilterExpr {
            field: self.name.clone(),
            op,
        })
    }

    pub fn matches_regex(&self, pattern: impl Into<String>) -> Filter {
        self.expr(Op::Regex(pattern.into()))
    }

    pub fn contains(&self, text: impl Into<String>) -> Filter {
        self.expr(Op::Contains(text.into()))
    }

    pub fn exists(&self, exists: bool) -> Filter {
        self.expr(Op::Exists(exists))
    }

    pub fn lt(&self, value: impl Into<Scalar>) -> Filter {
        self.expr(Op::Lt(value.into()))
    }

    pub fn gt(&self, value: impl Into<Scalar>) -> Filter {
        self.expr(Op::Gt(value.into()))
    }

    pub fn lte(&self, value: impl Into<Scalar>) -> Filter {
        self.expr(Op::Lte(value.into()))
    }

    pub fn gte(&self, value: impl Into<Scalar>) -> Filter {
        self.expr(Op::Gte(value.into()))
    }

    pub fn eq(&self, value: impl Into<Scalar>) -> Filter {
        self.expr(Op::Eq(value.into()))
    }

    pub fn ne(&self, value: impl Into<Scalar>) -> Filter {
        self.expr(Op::Ne(value.into()))
    }

    pub fn in_values<I, S>(&self, values: I) -> Filter
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        self.expr(Op::In(values.into_iter().map(Into::into).collect()))
    }

    pub fn not_in_values<I, S>(&self, values: I) -> Filter
    where
        I: IntoIterator<Item = S>,
        S: Into<Scalar>,
    {
        self.expr(Op::NotIn(values.into_iter().map(Into::into).collect()))
    }
}

/// The empty filter in its canonical input shape: `{"$or": [{"$and": []}]}`.
pub(crate) fn empty_or_and() -> Filter {
    Filter::Op(Op::Or(vec![Filter::Op(Op::And(Vec::new()))]))
}

/// Normalize a filter to the `{"$or": [{"$and": [...]}]}` shape the
/// frontend expects. Filters already in that shape pass through unchanged.
pub(crate) fn wrap_or_and(filter: Filter) -> Filter {
    match filter {
        Filter::Op(Op::Or(inner))
            if inner.len() == 1 && matches!(inner[0], Filter::Op(Op::And(_))) =>
        {
            Filter::Op(Op::Or(inner))
        }
        Filter::Op(Op::And(inner)) => Filter::Op(Op::Or(vec![Filter::Op(Op::And(inner))])),
        other => Filter::Op(Op::Or(vec![Filter::Op(Op::And(vec![other]))])),
    }
}

/// Normalize a filter to a top-level `{"$and": [...]}`.
pub(crate) fn wrap_and(filter: Filter) -> Filter {
    match filter {
        Filter::Op(Op::And(inner)) => Filter::Op(Op::And(inner)),
        other => Filter::Op(Op::And(vec![other])),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_field_expr_serializes_as_field_to_op_map() {
        let filter = FilterField::new("display_name").contains("my-run");
        let value = serde_json::to_value(&filter).unwrap();
        assert_eq!(value, json!({"display_name": {"$contains": "my-run"}}));
        assert_eq!(serde_json::from_value::<Filter>(value).unwrap(), filter);
    }

    #[test]
    fn test_combinators_nest() {
        let alias = FilterField::new("alias");
        let filter = alias.matches_regex("prod-.*") | !alias.eq("latest");
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            json!({"$or": [
                {"alias": {"$regex": "prod-.*"}},
                {"$not": {"alias": {"$eq": "latest"}}},
            ]})
        );
    }

    #[test]
    fn test_wrap_or_and_adds_missing_layers() {
        let leaf = FilterField::new("alias").contains("v1");
        let wrapped = wrap_or_and(leaf.clone());
        assert_eq!(
            serde_json::to_value(&wrapped).unwrap(),
            json!({"$or": [{"$and": [{"alias": {"$contains": "v1"}}]}]})
        );

        // Already-wrapped filters pass through unchanged.
        assert_eq!(wrap_or_and(wrapped.clone()), wrapped);

        // A bare $and gains only the $or layer.
        let anded = Filter::Op(Op::And(vec![leaf]));
        assert_eq!(
            serde_json::to_value(wrap_or_and(anded.clone())).unwrap(),
            json!({"$or": [{"$and": [{"alias": {"$contains": "v1"}}]}]})
        );
    }

    #[test]
    fn test_wrap_and() {
        let leaf = FilterField::new("display_name").contains("my-run");
        assert_eq!(
            serde_json::to_value(wrap_and(leaf)).unwrap(),
            json!({"$and": [{"display_name": {"$contains": "my-run"}}]})
        );
        let empty = Filter::Op(Op::And(vec![]));
        assert_eq!(wrap_and(empty.clone()), empty);
    }

    #[test]
    fn test_unknown_operator_survives_as_raw() {
        let value = json!({"$someFutureOp": [1, 2, 3]});
        let filter: Filter = serde_json::from_value(value.clone()).unwrap();
        assert!(matches!(filter, Filter::Raw(_)));
        assert_eq!(serde_json::to_value(&filter).unwrap(), value);
    }

    #[test]
    fn test_round_trip_of_nested_tree() {
        let filter = wrap_or_and(
            FilterField::new("alias").matches_regex("prod-.*")
                & FilterField::new("version").gte(3),
        );
        let text = serde_json::to_string(&filter).unwrap();
        let back: Filter = serde_json::from_str(&text).unwrap();
        assert_eq!(back, filter);
    }
}
