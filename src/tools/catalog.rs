//! Tool definitions: typed parameters, endpoint templates and response shapes.
//!
//! A tool is declared as a `ToolSpec` (plain data, built with a small builder
//! in the endpoint catalogue) and compiled once by the registry into an
//! immutable `ToolDefinition`. Compilation is where response schemas are
//! checked and path placeholders are matched against path parameters.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::types::{Error, Result};
use crate::validation::{self, MAX_IDENTIFIER_LEN};

/// Argument that falls back to the configured default hotel.
pub const HOTEL_ID_PARAM: &str = "hotelId";

// =============================================================================
// Parameter types
// =============================================================================

/// Parameter type for tool arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Int,
    IntRange { min: i64, max: i64 },
    Number,
    Bool,
    StringList,
    Enum(Vec<String>),
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    /// 24-hour clock time, `HH:MM`.
    Time,
    /// Non-empty code without whitespace or `/` (hotel codes, confirmation numbers).
    Identifier,
    Object,
    /// Non-empty array of objects.
    ObjectList,
    Optional(Box<ParamType>),
}

impl ParamType {
    pub fn optional(inner: ParamType) -> Self {
        ParamType::Optional(Box::new(inner))
    }

    /// Validate a JSON value for the parameter named `field`.
    pub fn validate(&self, field: &str, value: &Value) -> std::result::Result<(), String> {
        match self {
            ParamType::String => expect(value.is_string(), "string", value),
            ParamType::Int => expect(value.is_i64() || value.is_u64(), "integer", value),
            ParamType::IntRange { min, max } => {
                let n = value
                    .as_i64()
                    .ok_or_else(|| mismatch("integer", value))?;
                if n < *min || n > *max {
                    return Err(format!("must be between {} and {}, got {}", min, max, n));
                }
                Ok(())
            }
            ParamType::Number => expect(value.is_number(), "number", value),
            ParamType::Bool => expect(value.is_boolean(), "boolean", value),
            ParamType::StringList => {
                let items = value.as_array().ok_or_else(|| mismatch("array", value))?;
                for (i, item) in items.iter().enumerate() {
                    if !item.is_string() {
                        return Err(format!(
                            "expected string at index {}, got {}",
                            i,
                            value_type_name(item)
                        ));
                    }
                }
                Ok(())
            }
            ParamType::Enum(variants) => {
                let s = value
                    .as_str()
                    .ok_or_else(|| mismatch("string", value))?;
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(format!(
                        "invalid value '{}', expected one of: {}",
                        s,
                        variants.join(", ")
                    ))
                }
            }
            ParamType::Date => {
                let s = value
                    .as_str()
                    .ok_or_else(|| mismatch("date string", value))?;
                validation::validate_iso_date(s, field)
                    .map(|_| ())
                    .map_err(reason)
            }
            ParamType::Time => {
                let s = value
                    .as_str()
                    .ok_or_else(|| mismatch("time string", value))?;
                validation::validate_clock_time(s, field)
                    .map(|_| ())
                    .map_err(reason)
            }
            ParamType::Identifier => {
                let s = value
                    .as_str()
                    .ok_or_else(|| mismatch("string", value))?;
                validation::validate_identifier(s, field).map_err(reason)
            }
            ParamType::Object => expect(value.is_object(), "object", value),
            ParamType::ObjectList => {
                let items = value.as_array().ok_or_else(|| mismatch("array", value))?;
                if items.is_empty() {
                    return Err("must contain at least one item".to_string());
                }
                for (i, item) in items.iter().enumerate() {
                    if !item.is_object() {
                        return Err(format!(
                            "expected object at index {}, got {}",
                            i,
                            value_type_name(item)
                        ));
                    }
                }
                Ok(())
            }
            ParamType::Optional(inner) => {
                if value.is_null() {
                    Ok(())
                } else {
                    inner.validate(field, value)
                }
            }
        }
    }

    /// JSON Schema fragment advertised through `tools/list`.
    pub fn json_schema(&self) -> Value {
        match self {
            ParamType::String => json!({"type": "string"}),
            ParamType::Int => json!({"type": "integer"}),
            ParamType::IntRange { min, max } => {
                json!({"type": "integer", "minimum": min, "maximum": max})
            }
            ParamType::Number => json!({"type": "number"}),
            ParamType::Bool => json!({"type": "boolean"}),
            ParamType::StringList => json!({"type": "array", "items": {"type": "string"}}),
            ParamType::Enum(variants) => json!({"type": "string", "enum": variants}),
            ParamType::Date => json!({"type": "string", "format": "date"}),
            ParamType::Time => json!({"type": "string", "pattern": "^[0-2][0-9]:[0-5][0-9]$"}),
            ParamType::Identifier => json!({
                "type": "string",
                "minLength": 1,
                "maxLength": MAX_IDENTIFIER_LEN,
                "pattern": "^[^\\s/]+$"
            }),
            ParamType::Object => json!({"type": "object"}),
            ParamType::ObjectList => {
                json!({"type": "array", "minItems": 1, "items": {"type": "object"}})
            }
            ParamType::Optional(inner) => inner.json_schema(),
        }
    }

    /// Short type name for logs and error text.
    pub fn display_name(&self) -> String {
        match self {
            ParamType::String => "string".to_string(),
            ParamType::Int => "integer".to_string(),
            ParamType::IntRange { min, max } => format!("integer[{}..={}]", min, max),
            ParamType::Number => "number".to_string(),
            ParamType::Bool => "boolean".to_string(),
            ParamType::StringList => "string[]".to_string(),
            ParamType::Enum(variants) => format!("enum({})", variants.join("|")),
            ParamType::Date => "date".to_string(),
            ParamType::Time => "time".to_string(),
            ParamType::Identifier => "identifier".to_string(),
            ParamType::Object => "object".to_string(),
            ParamType::ObjectList => "object[]".to_string(),
            ParamType::Optional(inner) => format!("{}?", inner.display_name()),
        }
    }
}

fn expect(ok: bool, expected: &str, value: &Value) -> std::result::Result<(), String> {
    if ok {
        Ok(())
    } else {
        Err(mismatch(expected, value))
    }
}

fn mismatch(expected: &str, value: &Value) -> String {
    format!("expected {}, got {}", expected, value_type_name(value))
}

fn reason(err: Error) -> String {
    match err {
        Error::InvalidArgument(msg) => msg,
        other => other.to_string(),
    }
}

fn value_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Parameter definition
// =============================================================================

/// Where an argument goes in the outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamLocation {
    Path,
    Query,
    Body,
}

/// A single tool parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDef {
    /// Argument name as the MCP client sends it.
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    pub location: ParamLocation,
    /// Upstream field name when it differs; dotted for nested body fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wire_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamDef {
    fn new(
        name: &str,
        param_type: ParamType,
        description: &str,
        location: ParamLocation,
    ) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            description: description.to_string(),
            location,
            wire_name: None,
            default: None,
        }
    }

    pub fn path(name: &str, param_type: ParamType, description: &str) -> Self {
        Self::new(name, param_type, description, ParamLocation::Path)
    }

    pub fn query(name: &str, param_type: ParamType, description: &str) -> Self {
        Self::new(name, param_type, description, ParamLocation::Query)
    }

    pub fn body(name: &str, param_type: ParamType, description: &str) -> Self {
        Self::new(name, param_type, description, ParamLocation::Body)
    }

    pub fn wire(mut self, wire_name: &str) -> Self {
        self.wire_name = Some(wire_name.to_string());
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn wire_name(&self) -> &str {
        self.wire_name.as_deref().unwrap_or(&self.name)
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none() && !matches!(self.param_type, ParamType::Optional(_))
    }

    fn json_schema(&self) -> Value {
        let mut schema = self.param_type.json_schema();
        if let Some(obj) = schema.as_object_mut() {
            obj.insert("description".to_string(), json!(self.description));
            if let Some(default) = &self.default {
                obj.insert("default".to_string(), default.clone());
            }
        }
        schema
    }
}

// =============================================================================
// HTTP method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }

    /// Whether body parameters are sent as a JSON body.
    pub fn has_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Response shape
// =============================================================================

/// Compiled JSON Schema that a 2xx body must satisfy.
#[derive(Clone)]
pub struct ResponseShape {
    schema: Value,
    validator: Arc<jsonschema::Validator>,
}

impl ResponseShape {
    pub fn compile(schema: Value) -> Result<Self> {
        let validator = jsonschema::validator_for(&schema)
            .map_err(|e| Error::config(format!("invalid response schema: {}", e)))?;
        Ok(Self {
            schema,
            validator: Arc::new(validator),
        })
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// First violation, if any.
    pub fn check(&self, body: &Value) -> std::result::Result<(), String> {
        match self.validator.iter_errors(body).next() {
            None => Ok(()),
            Some(err) => Err(err.to_string()),
        }
    }
}

impl fmt::Debug for ResponseShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseShape")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Object whose listed keys, when present, are arrays.
pub fn object_with_arrays(keys: &[&str]) -> Value {
    let properties: Map<String, Value> = keys
        .iter()
        .map(|k| (k.to_string(), json!({"type": "array"})))
        .collect();
    json!({"type": "object", "properties": properties})
}

/// Any JSON object.
pub fn any_object() -> Value {
    json!({"type": "object"})
}

// =============================================================================
// Cross-field constraints
// =============================================================================

/// Checks that span more than one argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgConstraint {
    /// When both are present, `earlier` must be strictly before `later`.
    DateOrder { earlier: String, later: String },
    /// When both are present, the two arguments must differ.
    Distinct { first: String, second: String },
}

impl ArgConstraint {
    pub fn check(&self, args: &Map<String, Value>) -> std::result::Result<(), String> {
        match self {
            ArgConstraint::DateOrder { earlier, later } => {
                let (Some(a), Some(b)) = (
                    args.get(earlier).and_then(Value::as_str),
                    args.get(later).and_then(Value::as_str),
                ) else {
                    return Ok(());
                };
                match (
                    validation::validate_iso_date(a, earlier),
                    validation::validate_iso_date(b, later),
                ) {
                    (Ok(a), Ok(b)) if a >= b => {
                        Err(format!("{} must be after {}", later, earlier))
                    }
                    _ => Ok(()),
                }
            }
            ArgConstraint::Distinct { first, second } => {
                match (args.get(first), args.get(second)) {
                    (Some(a), Some(b)) if !a.is_null() && a == b => {
                        Err(format!("{} and {} must differ", first, second))
                    }
                    _ => Ok(()),
                }
            }
        }
    }
}

// =============================================================================
// Tool spec and definition
// =============================================================================

/// Declarative row of the endpoint catalogue.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub method: HttpMethod,
    pub path_template: String,
    pub params: Vec<ParamDef>,
    pub response_schema: Value,
    pub passthrough: bool,
    pub constraints: Vec<ArgConstraint>,
}

impl ToolSpec {
    pub fn new(name: &str, method: HttpMethod, path_template: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            method,
            path_template: path_template.to_string(),
            params: Vec::new(),
            response_schema: any_object(),
            passthrough: false,
            constraints: Vec::new(),
        }
    }

    pub fn param(mut self, param: ParamDef) -> Self {
        self.params.push(param);
        self
    }

    pub fn response(mut self, schema: Value) -> Self {
        self.response_schema = schema;
        self
    }

    /// Forward unknown arguments into the request body instead of rejecting them.
    pub fn passthrough(mut self) -> Self {
        self.passthrough = true;
        self
    }

    pub fn date_order(mut self, earlier: &str, later: &str) -> Self {
        self.constraints.push(ArgConstraint::DateOrder {
            earlier: earlier.to_string(),
            later: later.to_string(),
        });
        self
    }

    pub fn distinct(mut self, first: &str, second: &str) -> Self {
        self.constraints.push(ArgConstraint::Distinct {
            first: first.to_string(),
            second: second.to_string(),
        });
        self
    }
}

/// Immutable, compiled tool.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub method: HttpMethod,
    pub path_template: String,
    pub params: Vec<ParamDef>,
    pub response: ResponseShape,
    pub passthrough: bool,
    pub constraints: Vec<ArgConstraint>,
}

impl ToolDefinition {
    /// Compile a spec, rejecting inconsistent templates or schemas.
    pub fn compile(spec: ToolSpec) -> Result<Self> {
        let ToolSpec {
            name,
            description,
            method,
            path_template,
            params,
            response_schema,
            passthrough,
            constraints,
        } = spec;

        if name.trim().is_empty() {
            return Err(Error::config("tool name cannot be empty"));
        }
        if !path_template.starts_with('/') {
            return Err(Error::config(format!(
                "tool '{}': path template must start with '/'",
                name
            )));
        }

        let placeholders = placeholders(&path_template)
            .map_err(|e| Error::config(format!("tool '{}': {}", name, e)))?;
        for placeholder in &placeholders {
            let bound = params.iter().any(|p| {
                p.location == ParamLocation::Path && p.wire_name() == placeholder.as_str()
            });
            if !bound {
                return Err(Error::config(format!(
                    "tool '{}': placeholder {{{}}} has no path parameter",
                    name, placeholder
                )));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for param in &params {
            if !seen.insert(param.name.as_str()) {
                return Err(Error::config(format!(
                    "tool '{}': duplicate parameter '{}'",
                    name, param.name
                )));
            }
            if param.location == ParamLocation::Path {
                if !placeholders.iter().any(|p| p == param.wire_name()) {
                    return Err(Error::config(format!(
                        "tool '{}': path parameter '{}' is not in the template",
                        name, param.name
                    )));
                }
                if matches!(param.param_type, ParamType::Optional(_)) {
                    return Err(Error::config(format!(
                        "tool '{}': path parameter '{}' cannot be optional",
                        name, param.name
                    )));
                }
            }
            if param.location == ParamLocation::Body && !method.has_body() {
                return Err(Error::config(format!(
                    "tool '{}': {} requests carry no body parameter '{}'",
                    name, method, param.name
                )));
            }
        }

        let response = ResponseShape::compile(response_schema)
            .map_err(|e| Error::config(format!("tool '{}': {}", name, e)))?;

        Ok(Self {
            name,
            description,
            method,
            path_template,
            params,
            response,
            passthrough,
            constraints,
        })
    }

    pub fn param(&self, name: &str) -> Option<&ParamDef> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn required_params(&self) -> impl Iterator<Item = &ParamDef> {
        self.params.iter().filter(|p| p.is_required())
    }

    pub fn optional_params(&self) -> impl Iterator<Item = &ParamDef> {
        self.params.iter().filter(|p| !p.is_required())
    }

    /// MCP `inputSchema` for this tool.
    ///
    /// A `hotelId` parameter is not listed as required when a default hotel is
    /// configured, since the bridge fills it in.
    pub fn input_schema(&self, default_hotel: bool) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in &self.params {
            properties.insert(param.name.clone(), param.json_schema());
            let defaulted = default_hotel && param.name == HOTEL_ID_PARAM;
            if param.is_required() && !defaulted {
                required.push(Value::String(param.name.clone()));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": self.passthrough,
        })
    }
}

/// Placeholder names in a path template, in order.
pub fn placeholders(template: &str) -> std::result::Result<Vec<String>, String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        if rest[..open].contains('}') {
            return Err(format!("unbalanced '}}' in '{}'", template));
        }
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| format!("unclosed '{{' in '{}'", template))?;
        let name = &after[..close];
        if name.is_empty() || name.contains('{') || name.contains('/') {
            return Err(format!("invalid placeholder in '{}'", template));
        }
        names.push(name.to_string());
        rest = &after[close + 1..];
    }
    if rest.contains('}') {
        return Err(format!("unbalanced '}}' in '{}'", template));
    }
    Ok(names)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn get_reservation_spec() -> ToolSpec {
        ToolSpec::new(
            "get_reservation",
            HttpMethod::Get,
            "/rsv/v1/hotels/{hotelId}/reservations/{reservationId}",
            "Get a reservation",
        )
        .param(ParamDef::path(HOTEL_ID_PARAM, ParamType::Identifier, "Hotel code"))
        .param(ParamDef::path("reservationId", ParamType::Identifier, "Reservation id"))
        .param(
            ParamDef::query("fetchInstructions", ParamType::optional(ParamType::StringList), "Extra sections"),
        )
    }

    #[test]
    fn test_compile_valid_spec() {
        let tool = ToolDefinition::compile(get_reservation_spec()).unwrap();
        assert_eq!(tool.required_params().count(), 2);
        assert_eq!(tool.optional_params().count(), 1);
    }

    #[test]
    fn test_unbound_placeholder_rejected() {
        let spec = ToolSpec::new("t", HttpMethod::Get, "/hotels/{hotelId}", "t");
        let err = ToolDefinition::compile(spec).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("{hotelId}"));
    }

    #[test]
    fn test_path_param_missing_from_template_rejected() {
        let spec = ToolSpec::new("t", HttpMethod::Get, "/hotels", "t")
            .param(ParamDef::path("hotelId", ParamType::Identifier, "h"));
        assert!(ToolDefinition::compile(spec).is_err());
    }

    #[test]
    fn test_body_param_on_get_rejected() {
        let spec = ToolSpec::new("t", HttpMethod::Get, "/hotels", "t")
            .param(ParamDef::body("notes", ParamType::String, "n"));
        assert!(ToolDefinition::compile(spec).is_err());
    }

    #[test]
    fn test_invalid_response_schema_rejected() {
        let spec = ToolSpec::new("t", HttpMethod::Get, "/hotels", "t")
            .response(json!({"type": "not-a-type"}));
        let err = ToolDefinition::compile(spec).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            placeholders("/a/{x}/b/{y}").unwrap(),
            vec!["x".to_string(), "y".to_string()]
        );
        assert!(placeholders("/a/{x").is_err());
        assert!(placeholders("/a/x}").is_err());
        assert!(placeholders("/a/{}").is_err());
    }

    #[test]
    fn test_param_type_validation() {
        let range = ParamType::IntRange { min: 1, max: 100 };
        assert!(range.validate("limit", &json!(10)).is_ok());
        assert!(range.validate("limit", &json!(0)).is_err());
        assert!(range.validate("limit", &json!("10")).is_err());

        assert!(ParamType::Date.validate("arrivalDate", &json!("2025-06-01")).is_ok());
        let err = ParamType::Date.validate("arrivalDate", &json!("June 1")).unwrap_err();
        assert!(err.contains("arrivalDate"));

        let status = ParamType::Enum(vec!["CLEAN".into(), "DIRTY".into()]);
        assert!(status.validate("status", &json!("CLEAN")).is_ok());
        assert!(status.validate("status", &json!("SPARKLING")).is_err());

        assert!(ParamType::optional(ParamType::Int).validate("n", &Value::Null).is_ok());
        assert!(ParamType::StringList.validate("l", &json!(["a", 1])).is_err());

        assert!(ParamType::Time.validate("startTime", &json!("09:15")).is_ok());
        assert!(ParamType::Time.validate("startTime", &json!("9am")).is_err());

        assert!(ParamType::ObjectList.validate("charges", &json!([{"id": "C1"}])).is_ok());
        assert!(ParamType::ObjectList.validate("charges", &json!([])).is_err());
        assert!(ParamType::ObjectList.validate("charges", &json!([{"id": "C1"}, 2])).is_err());
    }

    #[test]
    fn test_distinct_constraint() {
        let constraint = ArgConstraint::Distinct {
            first: "fromReservationId".into(),
            second: "toReservationId".into(),
        };
        let same = json!({"fromReservationId": "R1", "toReservationId": "R1"});
        let err = constraint.check(same.as_object().unwrap()).unwrap_err();
        assert_eq!(err, "fromReservationId and toReservationId must differ");

        let different = json!({"fromReservationId": "R1", "toReservationId": "R2"});
        assert!(constraint.check(different.as_object().unwrap()).is_ok());
        assert!(constraint.check(&Map::new()).is_ok());
    }

    #[test]
    fn test_input_schema_marks_required() {
        let tool = ToolDefinition::compile(get_reservation_spec()).unwrap();
        let schema = tool.input_schema(false);
        assert_eq!(schema["required"], json!(["hotelId", "reservationId"]));
        assert_eq!(schema["additionalProperties"], json!(false));
        assert_eq!(schema["properties"]["fetchInstructions"]["type"], json!("array"));

        let with_default = tool.input_schema(true);
        assert_eq!(with_default["required"], json!(["reservationId"]));
    }

    #[test]
    fn test_response_shape_check() {
        let shape = ResponseShape::compile(object_with_arrays(&["reservations"])).unwrap();
        assert!(shape.check(&json!({"reservations": []})).is_ok());
        assert!(shape.check(&json!({})).is_ok());
        assert!(shape.check(&json!({"reservations": "nope"})).is_err());
        assert!(shape.check(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_date_order_constraint() {
        let constraint = ArgConstraint::DateOrder {
            earlier: "arrivalDate".into(),
            later: "departureDate".into(),
        };
        let mut args = Map::new();
        args.insert("arrivalDate".into(), json!("2025-06-02"));
        args.insert("departureDate".into(), json!("2025-06-01"));
        assert!(constraint.check(&args).is_err());

        args.insert("departureDate".into(), json!("2025-06-05"));
        assert!(constraint.check(&args).is_ok());

        args.remove("departureDate");
        assert!(constraint.check(&args).is_ok());
    }
}
