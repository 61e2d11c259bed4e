//! Conversion between caller types and the generic document model.

use crate::error::JsonnetError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub(crate) fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, JsonnetError> {
    serde_json::to_value(value).map_err(|err| JsonnetError::Serde(err.to_string()))
}

pub(crate) fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, JsonnetError> {
    serde_json::from_value(value).map_err(|err| JsonnetError::Serde(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Kind {
        #[serde(rename = "__kind__")]
        kind: String,
    }

    #[test]
    fn typed_values_become_documents() {
        let mut map = BTreeMap::new();
        map.insert("__kind__", "Dollar");
        let value = to_value(&map).unwrap();
        assert_eq!(value, serde_json::json!({ "__kind__": "Dollar" }));
        let kind: Kind = from_value(value).unwrap();
        assert_eq!(kind.kind, "Dollar");
    }

    #[test]
    fn non_string_map_keys_are_rejected() {
        let mut map = BTreeMap::new();
        map.insert(vec![1u8], 1);
        assert!(matches!(to_value(&map), Err(JsonnetError::Serde(_))));
    }
}
