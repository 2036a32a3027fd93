use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One header's value(s). A header set once is a plain string on the wire,
/// a header set repeatedly is an array in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Single(String),
    Multiple(Vec<String>),
}

impl HeaderValue {
    pub fn values(&self) -> Vec<&str> {
        match self {
            HeaderValue::Single(value) => vec![value.as_str()],
            HeaderValue::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }

    fn push(self, value: String) -> Self {
        match self {
            HeaderValue::Single(first) => HeaderValue::Multiple(vec![first, value]),
            HeaderValue::Multiple(mut values) => {
                values.push(value);
                HeaderValue::Multiple(values)
            }
        }
    }
}

/// Header multimap used by responses and webhooks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HttpHeaders(BTreeMap<String, HeaderValue>);

impl HttpHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, keeping any value already present under the same name.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        let merged = match self.0.remove(name) {
            Some(existing) => existing.push(value),
            None => HeaderValue::Single(value),
        };
        self.0.insert(name.to_string(), merged);
    }

    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &HeaderValue)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_header_is_a_string() {
        let mut headers = HttpHeaders::new();
        headers.append("foo1", "bar1");
        headers.append("foo2", "bar2");
        assert_eq!(
            serde_json::to_value(&headers).unwrap(),
            json!({"foo1": "bar1", "foo2": "bar2"})
        );
    }

    #[test]
    fn test_repeated_header_accumulates_in_order() {
        let mut headers = HttpHeaders::new();
        headers.append("foo", "bar1");
        headers.append("foo", "bar2");
        headers.append("foo", "bar3");
        assert_eq!(
            serde_json::to_value(&headers).unwrap(),
            json!({"foo": ["bar1", "bar2", "bar3"]})
        );
        assert_eq!(
            headers.get("foo").map(HeaderValue::values),
            Some(vec!["bar1", "bar2", "bar3"])
        );
    }

    #[test]
    fn test_deserialize_mixed_shapes() {
        let headers: HttpHeaders =
            serde_json::from_value(json!({"a": "1", "b": ["2", "3"]})).unwrap();
        assert_eq!(headers.get("a"), Some(&HeaderValue::Single("1".to_string())));
        assert_eq!(headers.len(), 2);
    }
}
