//! Sort specifiers

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("asc"),
            SortOrder::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

/// One sort criterion, serialized as `{field: {"order": dir}}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub order: SortOrder,
}

impl SortField {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortOrder::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortOrder::Desc)
    }
}

impl<S: Into<String>> From<(S, SortOrder)> for SortField {
    fn from((field, order): (S, SortOrder)) -> Self {
        Self::new(field, order)
    }
}

#[derive(Serialize)]
struct OrderObject {
    order: SortOrder,
}

impl Serialize for SortField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &OrderObject { order: self.order })?;
        map.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SortClause {
    Field(String),
    Object(BTreeMap<String, SortSpec>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SortSpec {
    Simple(SortOrder),
    Object {
        #[serde(default)]
        order: Option<SortOrder>,
    },
}

impl<'de> Deserialize<'de> for SortField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match SortClause::deserialize(deserializer)? {
            SortClause::Field(field) => {
                let order = default_order(&field);
                Ok(SortField { field, order })
            }
            SortClause::Object(map) => {
                let mut entries = map.into_iter();
                match (entries.next(), entries.next()) {
                    (Some((field, spec)), None) => {
                        let order = match spec {
                            SortSpec::Simple(o) => o,
                            SortSpec::Object { order } => {
                                order.unwrap_or_else(|| default_order(&field))
                            }
                        };
                        Ok(SortField { field, order })
                    }
                    _ => Err(serde::de::Error::custom(
                        "sort object must name exactly one field",
                    )),
                }
            }
        }
    }
}

/// `_score` sorts descending by default, everything else ascending
fn default_order(field: &str) -> SortOrder {
    if field == "_score" {
        SortOrder::Desc
    } else {
        SortOrder::Asc
    }
}
