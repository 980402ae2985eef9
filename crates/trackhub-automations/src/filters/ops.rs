//! MongoDB-style operator objects used in filter expression trees.

use serde::{Deserialize, Serialize};

use super::expr::Filter;

/// A scalar operand in a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// An operator object in a filter tree. Each variant serializes as a
/// single-key object, e.g. `{"$contains": "prod"}`.
///
/// `$contains` is not a formal MongoDB operator, but the backend executes
/// it as a substring-match filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Op {
    // Logical combinators
    #[serde(rename = "$and")]
    And(Vec<Filter>),
    #[serde(rename = "$or")]
    Or(Vec<Filter>),
    #[serde(rename = "$nor")]
    Nor(Vec<Filter>),
    #[serde(rename = "$not")]
    Not(Box<Filter>),

    // Comparisons
    #[serde(rename = "$lt")]
    Lt(Scalar),
    #[serde(rename = "$gt")]
    Gt(Scalar),
    #[serde(rename = "$lte")]
    Lte(Scalar),
    #[serde(rename = "$gte")]
    Gte(Scalar),
    #[serde(rename = "$eq")]
    Eq(Scalar),
    #[serde(rename = "$ne")]
    Ne(Scalar),
    #[serde(rename = "$in")]
    In(Vec<Scalar>),
    #[serde(rename = "$nin")]
    NotIn(Vec<Scalar>),

    // Element / evaluation
    #[serde(rename = "$exists")]
    Exists(bool),
    #[serde(rename = "$regex")]
    Regex(String),
    #[serde(rename = "$contains")]
    Contains(String),
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_ops_serialize_as_single_key_objects() {
        let cases = [
            (Op::And(vec![]), json!({"$and": []})),
            (Op::Or(vec![]), json!({"$or": []})),
            (Op::Gt(5.into()), json!({"$gt": 5})),
            (Op::Lte(2.5.into()), json!({"$lte": 2.5})),
            (Op::Eq("x".into()), json!({"$eq": "x"})),
            (Op::Exists(true), json!({"$exists": true})),
            (Op::Regex("prod-.*".into()), json!({"$regex": "prod-.*"})),
            (Op::Contains("my-run".into()), json!({"$contains": "my-run"})),
            (
                Op::In(vec!["a".into(), "b".into()]),
                json!({"$in": ["a", "b"]}),
            ),
            (Op::NotIn(vec![1.into()]), json!({"$nin": [1]})),
        ];
        for (op, expected) in cases {
            let value = serde_json::to_value(&op).unwrap();
            assert_eq!(value, expected);
            assert_eq!(serde_json::from_value::<Op>(value).unwrap(), op);
        }
    }

    #[test]
    fn test_scalar_preserves_json_type() {
        assert_eq!(serde_json::to_value(Scalar::Int(3)).unwrap(), json!(3));
        assert_eq!(
            serde_json::to_value(Scalar::Float(3.5)).unwrap(),
            json!(3.5)
        );
        assert_eq!(
            serde_json::from_value::<Scalar>(json!(true)).unwrap(),
            Scalar::Bool(true)
        );
        assert_eq!(
            serde_json::from_value::<Scalar>(json!("s")).unwrap(),
            Scalar::Str("s".into())
        );
    }
}
