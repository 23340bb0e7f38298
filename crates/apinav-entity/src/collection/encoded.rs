//! Structured request fields that may be stored inline or as JSON text.
//!
//! Older collections keep `headers`, `query` and `auth` as strings holding
//! JSON (`"{\"Accept\":\"*/*\"}"`); newer ones keep the object itself. Both
//! load, and each value is written back in the form it was read.

use std::ops::Deref;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// How an [`Encoded`] value appeared in storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum EncodedForm {
    /// A plain JSON value.
    #[default]
    Inline,
    /// A JSON string whose contents are the encoded value.
    Stringified,
    /// A value that does not decode as the expected type; kept verbatim
    /// until the field is replaced.
    Opaque(Value),
}

/// A typed field that remembers its stored form.
///
/// Reads go through [`Deref`]. Mutable access via [`Encoded::make_mut`]
/// drops an [`EncodedForm::Opaque`] original so the edited value is the
/// one written back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Encoded<T> {
    value: T,
    form: EncodedForm,
}

impl<T> Encoded<T> {
    /// Wrap a value stored inline.
    pub fn new(value: T) -> Self {
        Self {
            value,
            form: EncodedForm::Inline,
        }
    }

    /// Wrap a value stored as JSON text.
    pub fn stringified(value: T) -> Self {
        Self {
            value,
            form: EncodedForm::Stringified,
        }
    }

    /// The stored form.
    pub fn form(&self) -> &EncodedForm {
        &self.form
    }

    /// Mutable access to the value.
    pub fn make_mut(&mut self) -> &mut T {
        if matches!(self.form, EncodedForm::Opaque(_)) {
            self.form = EncodedForm::Inline;
        }
        &mut self.value
    }

    /// Unwrap the value.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: DeserializeOwned + Default> Encoded<T> {
    /// Decode a raw stored value.
    pub fn from_value(raw: Value) -> Self {
        let decoded = match &raw {
            Value::String(text) => serde_json::from_str(text).ok().map(Self::stringified),
            other => serde_json::from_value(other.clone()).ok().map(Self::new),
        };
        decoded.unwrap_or_else(|| Self {
            value: T::default(),
            form: EncodedForm::Opaque(raw),
        })
    }
}

impl<T> Deref for Encoded<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> From<T> for Encoded<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Serialize> Serialize for Encoded<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.form {
            EncodedForm::Inline => self.value.serialize(serializer),
            EncodedForm::Stringified => {
                let text = serde_json::to_string(&self.value).map_err(serde::ser::Error::custom)?;
                serializer.serialize_str(&text)
            }
            EncodedForm::Opaque(raw) => raw.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned + Default> Deserialize<'de> for Encoded<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}
