use crate::error::Error;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One matched document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    /// Absent when the request disabled `_source`
    #[serde(rename = "_source", default)]
    pub source: Map<String, Value>,
    /// Sort values, present when the request sorted explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<Value>>,
}

impl Hit {
    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Source fields of this hit
    pub fn fields(&self) -> &Map<String, Value> {
        &self.source
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.source
    }

    /// Look up a field; dotted names walk into nested objects
    pub fn get(&self, field: &str) -> Option<&Value> {
        lookup(&self.source, field)
    }

    /// Like [`get`](Self::get) but reports a missing field as [`Error::NotFound`]
    pub fn field(&self, field: &str) -> Result<&Value> {
        self.get(field).ok_or_else(|| {
            Error::NotFound(format!("field '{}' in hit {}/{}", field, self.index, self.id))
        })
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }
}

/// Resolve `path` in a JSON object, trying the literal key before walking dots
pub(crate) fn lookup<'a>(source: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(v) = source.get(path) {
        return Some(v);
    }

    let (head, rest) = path.split_once('.')?;
    match source.get(head)? {
        Value::Object(inner) => lookup(inner, rest),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hit() -> Hit {
        serde_json::from_value(json!({
            "_index": "bank",
            "_id": "7",
            "_score": 1.0,
            "_source": {
                "account_number": 7,
                "balance": 39121.5,
                "firstname": "Levy",
                "owner": {"name": {"first": "Levy"}}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_typed_accessors() {
        let h = hit();
        assert_eq!(h.index(), "bank");
        assert_eq!(h.id(), "7");
        assert_eq!(h.get_i64("account_number"), Some(7));
        assert_eq!(h.get_f64("balance"), Some(39121.5));
        assert_eq!(h.get_str("firstname"), Some("Levy"));
        assert_eq!(h.get_str("balance"), None);
    }

    #[test]
    fn test_dotted_lookup() {
        let h = hit();
        assert_eq!(h.get_str("owner.name.first"), Some("Levy"));
        assert!(h.get("owner.name.last").is_none());
    }

    #[test]
    fn test_missing_field_is_not_found() {
        let err = hit().field("lastname").unwrap_err();
        assert!(matches!(err, Error::NotFound(ref m) if m.contains("lastname")));
    }

    #[test]
    fn test_source_may_be_absent() {
        let h: Hit = serde_json::from_value(json!({
            "_index": "bank", "_id": "1", "_score": null
        }))
        .unwrap();
        assert!(h.fields().is_empty());
        assert!(h.score.is_none());
    }
}
