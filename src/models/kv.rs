//! Key-value model
//!
//! Values are stored as opaque byte arrays so any serialisable type fits.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::utils::errors::{ChatWardenError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    /// Binary-serialised value.
    pub value: Vec<u8>,
    pub updated_at: DateTime<Utc>,
}

impl KeyValue {
    pub const TABLE: &'static str = "kv";

    pub fn new<T: Serialize>(key: impl Into<String>, value: &T) -> Result<Self> {
        Ok(Self {
            key: key.into(),
            value: bincode::serialize(value)?,
            updated_at: Utc::now(),
        })
    }

    /// Decode the stored value into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        if self.value.is_empty() {
            return Err(ChatWardenError::InvalidInput(format!(
                "Key '{}' holds an empty value",
                self.key
            )));
        }

        Ok(bincode::deserialize(&self.value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let kv = KeyValue::new("answer", &42u64).unwrap();
        assert_eq!(kv.decode::<u64>().unwrap(), 42);
    }

    #[test]
    fn test_round_trip_struct() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Marker {
            chat_id: i64,
            note: String,
        }

        let marker = Marker {
            chat_id: -1001,
            note: "pinned".to_string(),
        };
        let kv = KeyValue::new("marker", &marker).unwrap();
        assert_eq!(kv.decode::<Marker>().unwrap(), marker);
    }

    #[test]
    fn test_empty_value_is_an_error() {
        let kv = KeyValue {
            key: "empty".to_string(),
            value: vec![],
            updated_at: Utc::now(),
        };
        assert!(kv.decode::<u64>().is_err());
    }
}
