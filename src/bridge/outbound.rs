//! Outbound request construction and upstream response helpers.

use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE, RETRY_AFTER};
use reqwest::Url;
use serde_json::{Map, Value};
use std::time::Duration;

use crate::auth::AccessToken;
use crate::tools::{PreparedArgs, ToolDefinition};
use crate::types::{Error, RequestId, Result};

pub const HOTEL_ID_HEADER: &str = "x-hotelid";
pub const APP_KEY_HEADER: &str = "x-app-key";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Upstream error text is cut to this many characters.
pub const MAX_ERROR_MESSAGE_CHARS: usize = 500;

/// Error body fields, most specific first.
const MESSAGE_FIELDS: &[&str] = &["detail", "error_description", "title", "message", "error"];

/// Resolve `tool`'s path template against `base` and append query pairs.
///
/// Placeholder values are percent-encoded as single path segments, so a
/// value cannot inject extra path components.
pub fn render_url(base: &Url, tool: &ToolDefinition, args: &PreparedArgs) -> Result<Url> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| Error::config(format!("base URL cannot carry a path: {}", base)))?;
        segments.pop_if_empty();
        for raw in tool.path_template.split('/').filter(|s| !s.is_empty()) {
            segments.push(&substitute(raw, args)?);
        }
    }
    url.set_query(None);
    if !args.query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(args.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
    Ok(url)
}

fn substitute(segment: &str, args: &PreparedArgs) -> Result<String> {
    let mut out = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| Error::config(format!("unclosed placeholder in '{}'", segment)))?;
        let name = &after[..close];
        let value = args.path_value(name).ok_or_else(|| {
            Error::invalid_argument(format!("no value for path parameter {}", name))
        })?;
        out.push_str(value);
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Drop nulls and empty strings, recursively.
pub fn sanitize_body(body: Map<String, Value>) -> Map<String, Value> {
    body.into_iter()
        .filter_map(|(key, value)| sanitize_value(value).map(|v| (key, v)))
        .collect()
}

fn sanitize_value(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::Object(map) => Some(Value::Object(sanitize_body(map))),
        Value::Array(items) => Some(Value::Array(
            items.into_iter().filter_map(sanitize_value).collect(),
        )),
        other => Some(other),
    }
}

/// Assemble one attempt. Rebuilt per attempt so a refreshed token is picked up.
#[allow(clippy::too_many_arguments)]
pub fn build_request(
    http: &reqwest::Client,
    tool: &ToolDefinition,
    url: &Url,
    body: Option<&Map<String, Value>>,
    token: &AccessToken,
    request_id: &RequestId,
    hotel_id: Option<&str>,
    app_key: Option<&str>,
    timeout: Duration,
) -> reqwest::RequestBuilder {
    let mut request = http
        .request(tool.method.to_reqwest(), url.clone())
        .bearer_auth(token.value())
        .header(ACCEPT, "application/json")
        .header(REQUEST_ID_HEADER, request_id.as_str())
        .timeout(timeout);
    if let Some(hotel) = hotel_id {
        request = request.header(HOTEL_ID_HEADER, hotel);
    }
    if let Some(key) = app_key {
        request = request.header(APP_KEY_HEADER, key);
    }
    if let Some(body) = body {
        request = request.header(CONTENT_TYPE, "application/json").json(body);
    }
    request
}

/// `Retry-After` in delta-seconds form.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Human-readable message from an upstream error body, truncated.
pub fn upstream_message(body: &[u8]) -> Option<String> {
    let message = match serde_json::from_slice::<Value>(body) {
        Ok(json) => message_from_json(&json),
        Err(_) => {
            let text = String::from_utf8_lossy(body).trim().to_string();
            (!text.is_empty()).then_some(text)
        }
    }?;
    Some(truncate(&message, MAX_ERROR_MESSAGE_CHARS))
}

fn message_from_json(json: &Value) -> Option<String> {
    let obj = json.as_object()?;
    for field in MESSAGE_FIELDS {
        match obj.get(*field) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
            Some(nested) if nested.is_object() => {
                if let Some(inner) = message_from_json(nested) {
                    return Some(inner);
                }
            }
            _ => {}
        }
    }
    None
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
