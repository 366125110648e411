//! Serde helpers that carry unsigned 64-bit values as JSON strings.
//!
//! File sizes, budgets and revenues can exceed 2^53, which JavaScript
//! clients cannot represent as numbers. Use with `#[serde(with = "...")]`.

/// `u64` as a decimal string. Deserialization accepts a string or a number.
pub mod u64_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match super::StringOrNumber::deserialize(deserializer)? {
            super::StringOrNumber::String(s) => s.parse().map_err(de::Error::custom),
            super::StringOrNumber::Number(n) => Ok(n),
        }
    }
}

/// `Option<u64>` as a decimal string or `null`.
pub mod opt_u64_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error> {
        match Option::<super::StringOrNumber>::deserialize(deserializer)? {
            Some(super::StringOrNumber::String(s)) => {
                s.parse().map(Some).map_err(de::Error::custom)
            }
            Some(super::StringOrNumber::Number(n)) => Ok(Some(n)),
            None => Ok(None),
        }
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(u64),
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Amounts {
        #[serde(with = "super::u64_string")]
        size: u64,
        #[serde(with = "super::opt_u64_string", default)]
        budget: Option<u64>,
    }

    #[test]
    fn test_large_values_serialize_as_strings() {
        let value = Amounts {
            size: u64::MAX,
            budget: Some(356_000_000),
        };
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(
            json,
            r#"{"size":"18446744073709551615","budget":"356000000"}"#
        );
        let back: Amounts = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_accepts_numbers_and_null() {
        let parsed: Amounts = serde_json::from_str(r#"{"size":42,"budget":null}"#).unwrap();
        assert_eq!(
            parsed,
            Amounts {
                size: 42,
                budget: None
            }
        );
    }
}
