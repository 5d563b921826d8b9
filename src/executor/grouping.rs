//! Re-attaching a batch of child records to their parents

use crate::core::field::CorrelationKey;
use crate::schema::Cardinality;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A resolved record tagged with the key its parent correlates on
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Record {
    pub key: CorrelationKey,
    pub value: Map<String, Value>,
}

/// Child records bucketed by correlation key, in fetch order
#[derive(Debug, Default)]
pub(crate) struct Groups {
    by_key: HashMap<CorrelationKey, Vec<Map<String, Value>>>,
}

impl Groups {
    pub fn new(records: Vec<Record>) -> Self {
        let mut by_key: HashMap<CorrelationKey, Vec<Map<String, Value>>> = HashMap::new();
        for record in records {
            by_key.entry(record.key).or_default().push(record.value);
        }
        Self { by_key }
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    fn matching(&self, key: Option<&CorrelationKey>) -> &[Map<String, Value>] {
        key.and_then(|key| self.by_key.get(key))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Largest number of children any of `parents` would receive
    pub fn widest<'k>(&self, parents: impl IntoIterator<Item = Option<&'k CorrelationKey>>) -> usize {
        parents
            .into_iter()
            .map(|key| self.matching(key).len())
            .max()
            .unwrap_or(0)
    }

    /// Value attached to a parent with `key`
    ///
    /// A `many` parent gets every matching child, possibly none; a `single`
    /// parent gets the first match or null. Callers check [`widest`](Self::widest)
    /// before attaching single relationships.
    pub fn attach(&self, key: Option<&CorrelationKey>, cardinality: Cardinality) -> Value {
        let children = self.matching(key);
        match cardinality {
            Cardinality::Many => Value::Array(
                children
                    .iter()
                    .cloned()
                    .map(Value::Object)
                    .collect(),
            ),
            Cardinality::Single => children
                .first()
                .cloned()
                .map(Value::Object)
                .unwrap_or(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::FieldValue;
    use serde_json::json;

    fn key(id: i64) -> CorrelationKey {
        CorrelationKey::from_row(&[FieldValue::Integer(id)], &[0]).unwrap()
    }

    fn record(id: i64, title: &str) -> Record {
        let mut value = Map::new();
        value.insert("title".to_string(), json!(title));
        Record { key: key(id), value }
    }

    #[test]
    fn test_many_keeps_fetch_order() {
        let groups = Groups::new(vec![
            record(1, "War and Peace"),
            record(2, "Orlando"),
            record(1, "Anna Karenina"),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(
            groups.attach(Some(&key(1)), Cardinality::Many),
            json!([{"title": "War and Peace"}, {"title": "Anna Karenina"}])
        );
    }

    #[test]
    fn test_unmatched_parents_get_empty_or_null() {
        let groups = Groups::new(vec![record(1, "War and Peace")]);

        assert_eq!(groups.attach(Some(&key(3)), Cardinality::Many), json!([]));
        assert_eq!(groups.attach(Some(&key(3)), Cardinality::Single), Value::Null);
        assert_eq!(groups.attach(None, Cardinality::Many), json!([]));
        assert_eq!(groups.attach(None, Cardinality::Single), Value::Null);
    }

    #[test]
    fn test_widest_only_counts_matched_parents() {
        let groups = Groups::new(vec![
            record(1, "War and Peace"),
            record(1, "Anna Karenina"),
            record(2, "Orlando"),
        ]);

        assert_eq!(groups.widest([Some(&key(2)), None]), 1);
        assert_eq!(groups.widest([Some(&key(1)), Some(&key(2))]), 2);
        assert_eq!(groups.widest(Vec::new()), 0);
    }
}
