//! Presence-tracking field wrapper for partial updates
//!
//! A partial update has to tell apart a key that was left out of the request
//! from a key sent as `null`. `Option<T>` collapses the two, so patch structs
//! use [`Field<T>`] with `#[serde(default)]`: an absent key deserializes to
//! `Field::Missing`, `null` to `Field::Null`, anything else to `Field::Value`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A field in a partial update request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    /// Key not present; the stored value is left untouched
    Missing,
    /// Key present with an explicit `null`
    Null,
    /// Key present with a value
    Value(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Missing
    }
}

impl<T> Field<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Field::Missing)
    }

    pub fn is_present(&self) -> bool {
        !self.is_missing()
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            Field::Value(value) => Some(value),
            _ => None,
        }
    }

    /// `None` when missing, `Some(None)` when null, `Some(Some(v))` when set
    pub fn into_option(self) -> Option<Option<T>> {
        match self {
            Field::Missing => None,
            Field::Null => Some(None),
            Field::Value(value) => Some(Some(value)),
        }
    }

    pub fn as_ref(&self) -> Field<&T> {
        match self {
            Field::Missing => Field::Missing,
            Field::Null => Field::Null,
            Field::Value(value) => Field::Value(value),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Field<U> {
        match self {
            Field::Missing => Field::Missing,
            Field::Null => Field::Null,
            Field::Value(value) => Field::Value(f(value)),
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Field::Null, Field::Value)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Only reached when the key is present; absence goes through `Default`.
        Option::<T>::deserialize(deserializer).map(Field::from)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Value(value) => serializer.serialize_some(value),
            Field::Missing | Field::Null => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default)]
        note: Field<String>,
    }

    #[test]
    fn test_absent_null_and_value_are_distinct() {
        let absent: Probe = serde_json::from_str("{}").unwrap();
        let null: Probe = serde_json::from_str(r#"{"note": null}"#).unwrap();
        let value: Probe = serde_json::from_str(r#"{"note": "hi"}"#).unwrap();

        assert_eq!(absent.note, Field::Missing);
        assert_eq!(null.note, Field::Null);
        assert_eq!(value.note, Field::Value("hi".to_string()));
    }

    #[test]
    fn test_into_option_layers() {
        assert_eq!(Field::<i32>::Missing.into_option(), None);
        assert_eq!(Field::<i32>::Null.into_option(), Some(None));
        assert_eq!(Field::Value(3).into_option(), Some(Some(3)));
    }
}
