// SPDX-License-Identifier: MIT OR Apache-2.0
//! Explicit JSON serialization settings.
//!
//! A [`JsonOptions`] value is built once by the application and handed by
//! reference to the components that serialize on its behalf (function result
//! marshaling, thread and provider state). Nothing in agentkit keeps a global
//! serializer configuration.

use agentkit_error::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// JSON serialization settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonOptions {
    /// Indent string output.
    pub pretty: bool,
    /// Remove `null` object members before emitting.
    pub drop_nulls: bool,
}

impl JsonOptions {
    /// Compact output, nulls kept.
    pub const fn new() -> Self {
        Self {
            pretty: false,
            drop_nulls: false,
        }
    }

    /// Toggle indented output.
    #[must_use]
    pub const fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Toggle null stripping.
    #[must_use]
    pub const fn drop_nulls(mut self, drop_nulls: bool) -> Self {
        self.drop_nulls = drop_nulls;
        self
    }

    /// Apply the settings to an existing value.
    pub fn normalize(&self, value: Value) -> Value {
        if self.drop_nulls {
            strip_nulls(value)
        } else {
            value
        }
    }

    /// Serialize `value` to a [`Value`].
    pub fn to_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<Value> {
        Ok(self.normalize(serde_json::to_value(value)?))
    }

    /// Serialize `value` to a string.
    pub fn to_string<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let value = self.to_value(value)?;
        let out = if self.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(out)
    }

    /// Deserialize from a string.
    pub fn from_str<T: DeserializeOwned>(&self, s: &str) -> Result<T> {
        Ok(serde_json::from_str(s)?)
    }

    /// Deserialize from a [`Value`].
    pub fn from_value<T: DeserializeOwned>(&self, value: Value) -> Result<T> {
        Ok(serde_json::from_value(value)?)
    }
}

fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}
