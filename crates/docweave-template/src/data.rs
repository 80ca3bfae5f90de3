//! Data supplied to a render
//!
//! [`TemplateData`] keeps three independent namespaces: scalar variables,
//! named lists and boolean conditions. Values are JSON values so callers can
//! feed anything `serde` can serialize.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, TemplateError};

/// Variables, lists and conditions for one render
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateData {
    variables: BTreeMap<String, Value>,
    lists: BTreeMap<String, Vec<Value>>,
    conditions: BTreeMap<String, bool>,
}

impl TemplateData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `{ "variables": .., "lists": .., "conditions": .. }` document
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Turn every top-level field of `value` into a variable
    ///
    /// Field names are lowercased. `value` must serialize to a JSON object.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self> {
        match serde_json::to_value(value)? {
            Value::Object(fields) => {
                let mut data = Self::new();
                for (name, value) in fields {
                    data.variables.insert(name.to_lowercase(), value);
                }
                Ok(data)
            }
            other => Err(TemplateError::validation(
                "data_type",
                json_type_name(&other),
                "expected a struct or map",
            )),
        }
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn set_list<I, V>(&mut self, name: impl Into<String>, items: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.lists
            .insert(name.into(), items.into_iter().map(Into::into).collect());
    }

    pub fn set_condition(&mut self, name: impl Into<String>, value: bool) {
        self.conditions.insert(name.into(), value);
    }

    /// Set many variables at once
    pub fn set_variables<I, K, V>(&mut self, variables: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (name, value) in variables {
            self.set_variable(name, value);
        }
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn list(&self, name: &str) -> Option<&[Value]> {
        self.lists.get(name).map(Vec::as_slice)
    }

    pub fn condition(&self, name: &str) -> Option<bool> {
        self.conditions.get(name).copied()
    }

    pub fn variables(&self) -> &BTreeMap<String, Value> {
        &self.variables
    }

    pub fn lists(&self) -> &BTreeMap<String, Vec<Value>> {
        &self.lists
    }

    pub fn conditions(&self) -> &BTreeMap<String, bool> {
        &self.conditions
    }

    /// Copy everything from `other`; its entries win on conflict
    pub fn merge(&mut self, other: &TemplateData) {
        self.variables
            .extend(other.variables.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.lists
            .extend(other.lists.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.conditions
            .extend(other.conditions.iter().map(|(k, v)| (k.clone(), *v)));
    }

    pub fn clear(&mut self) {
        self.variables.clear();
        self.lists.clear();
        self.conditions.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.lists.is_empty() && self.conditions.is_empty()
    }
}

/// Text a value renders as
///
/// Strings are verbatim, numbers use their shortest form, null is empty and
/// arrays or objects become compact JSON.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                n.as_f64().map(|f| f.to_string()).unwrap_or_default()
            }
        }
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Truthiness of a loop item field
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
