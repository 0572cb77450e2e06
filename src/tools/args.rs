//! Argument validation and placement.
//!
//! Turns an invocation's argument map into path, query and body values for
//! one tool. Pure and synchronous: the same arguments always produce the same
//! outcome, errors included, in the same order.

use serde_json::{Map, Value};

use super::catalog::{ParamDef, ParamLocation, ToolDefinition, HOTEL_ID_PARAM};
use crate::types::{Error, Result};

/// Validated arguments, split by where they go in the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedArgs {
    /// Placeholder name to raw (unencoded) segment value.
    pub path: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Map<String, Value>>,
    /// Hotel the call targets, for the `x-hotelid` header.
    pub hotel_id: Option<String>,
}

impl PreparedArgs {
    pub fn path_value(&self, placeholder: &str) -> Option<&str> {
        self.path
            .iter()
            .find(|(name, _)| name == placeholder)
            .map(|(_, value)| value.as_str())
    }
}

impl ToolDefinition {
    /// Validate `args` and place them into request slots.
    ///
    /// Problems are collected and reported together as one `InvalidArgument`:
    /// per-parameter problems in declaration order, then unknown parameters
    /// sorted by name, then cross-field constraints.
    pub fn prepare(
        &self,
        args: &Map<String, Value>,
        default_hotel_id: Option<&str>,
    ) -> Result<PreparedArgs> {
        let mut problems = Vec::new();
        let mut resolved: Vec<(&ParamDef, Value)> = Vec::new();

        for param in &self.params {
            let supplied = args.get(&param.name).filter(|v| !v.is_null());
            let value = match supplied {
                Some(value) => {
                    if let Err(e) = param.param_type.validate(&param.name, value) {
                        problems.push(format!("parameter '{}': {}", param.name, e));
                        continue;
                    }
                    if param.is_required() && value.as_str() == Some("") {
                        problems.push(format!("parameter '{}': must not be empty", param.name));
                        continue;
                    }
                    value.clone()
                }
                None => {
                    let fallback = if param.name == HOTEL_ID_PARAM {
                        default_hotel_id.map(|h| Value::String(h.to_string()))
                    } else {
                        None
                    };
                    match fallback.or_else(|| param.default.clone()) {
                        Some(value) => value,
                        None if param.is_required() => {
                            problems.push(format!("missing required parameter: {}", param.name));
                            continue;
                        }
                        None => continue,
                    }
                }
            };
            resolved.push((param, value));
        }

        let mut extras: Vec<(&String, &Value)> = args
            .iter()
            .filter(|(key, _)| self.param(key).is_none())
            .collect();
        extras.sort_by(|a, b| a.0.cmp(b.0));
        let forwards_extras = self.passthrough && self.method.has_body();
        if forwards_extras {
            // Extras land at the top level of the body and must not replace
            // an object built from declared parameters.
            for (key, _) in &extras {
                if self.claims_body_key(key) {
                    problems.push(format!(
                        "parameter '{}' conflicts with a declared body field",
                        key
                    ));
                }
            }
        } else {
            for (key, _) in &extras {
                problems.push(format!("unknown parameter: {}", key));
            }
        }

        for constraint in &self.constraints {
            if let Err(e) = constraint.check(args) {
                problems.push(e);
            }
        }

        if !problems.is_empty() {
            return Err(Error::invalid_argument(format!(
                "{}: {}",
                self.name,
                problems.join("; ")
            )));
        }

        let mut prepared = PreparedArgs::default();
        let mut body = Map::new();
        for (param, value) in resolved {
            if param.name == HOTEL_ID_PARAM {
                prepared.hotel_id = value.as_str().map(str::to_string);
            }
            match param.location {
                ParamLocation::Path => {
                    prepared
                        .path
                        .push((param.wire_name().to_string(), scalar_text(&value)));
                }
                ParamLocation::Query => push_query(&mut prepared.query, param.wire_name(), &value),
                ParamLocation::Body => insert_dotted(&mut body, param.wire_name(), value),
            }
        }
        if forwards_extras {
            for (key, value) in extras {
                body.insert(key.clone(), value.clone());
            }
        }
        if self.method.has_body() {
            prepared.body = Some(body);
        }
        Ok(prepared)
    }

    /// Whether a declared body parameter writes to top-level body key `key`.
    fn claims_body_key(&self, key: &str) -> bool {
        self.params
            .iter()
            .filter(|p| p.location == ParamLocation::Body)
            .any(|p| p.wire_name().split('.').next() == Some(key))
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Lists become repeated pairs; empty strings are dropped.
fn push_query(query: &mut Vec<(String, String)>, name: &str, value: &Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                push_query(query, name, item);
            }
        }
        Value::Null => {}
        Value::String(s) if s.is_empty() => {}
        other => query.push((name.to_string(), scalar_text(other))),
    }
}

/// Insert at a dotted path, creating intermediate objects.
fn insert_dotted(body: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = body;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(next) = entry else {
            return;
        };
        current = next;
    }
}
