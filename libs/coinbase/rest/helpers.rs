//! Shared HTTP helper functions for the REST client
//!
//! Response shapes differ per surface; these helpers assert the expected
//! shape and surface anything else as a malformed response.

use reqwest::RequestBuilder;
use serde_json::Value;
use std::collections::HashMap;

use super::RestError;

/// Add headers from a HashMap to a request builder
pub fn with_headers(req: RequestBuilder, headers: HashMap<String, String>) -> RequestBuilder {
    headers.into_iter().fold(req, |r, (k, v)| r.header(k, v))
}

/// Pull a named field out of an envelope object
pub fn expect_field(mut value: Value, key: &str) -> Result<Value, RestError> {
    match value.get_mut(key).map(Value::take) {
        Some(field) => Ok(field),
        None => Err(RestError::MalformedResponse(format!(
            "response is missing field {:?}",
            key
        ))),
    }
}

/// Pull a named array out of an envelope object
pub fn expect_list(value: Value, key: &str) -> Result<Vec<Value>, RestError> {
    match expect_field(value, key)? {
        Value::Array(items) => Ok(items),
        _ => Err(RestError::MalformedResponse(format!(
            "field {:?} is not an array",
            key
        ))),
    }
}

/// Require a bare top-level array response
pub fn expect_array(value: Value) -> Result<Vec<Value>, RestError> {
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(RestError::MalformedResponse(
            "expected a top-level array".to_string(),
        )),
    }
}

/// Deserialize one payload, mapping serde failures to MalformedResponse
pub fn parse_item<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, RestError> {
    serde_json::from_value(value).map_err(|e| RestError::MalformedResponse(e.to_string()))
}

/// Deserialize every element of a list through its raw surface type
pub fn map_list<R, T>(items: Vec<Value>) -> Result<Vec<T>, RestError>
where
    R: serde::de::DeserializeOwned,
    T: From<R>,
{
    let mut mapped = Vec::with_capacity(items.len());
    for item in items {
        let raw: R = parse_item(item)?;
        mapped.push(T::from(raw));
    }
    Ok(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expect_list_rejects_non_array_field() {
        let err = expect_list(json!({ "products": "oops" }), "products").unwrap_err();
        assert!(matches!(err, RestError::MalformedResponse(_)));

        let err = expect_list(json!({}), "products").unwrap_err();
        assert!(matches!(err, RestError::MalformedResponse(_)));
    }

    #[test]
    fn expect_array_rejects_envelopes() {
        assert_eq!(expect_array(json!([1, 2])).unwrap().len(), 2);
        assert!(expect_array(json!({ "data": [] })).is_err());
    }
}
