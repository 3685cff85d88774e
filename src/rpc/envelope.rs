//! Extraction of the JSON-RPC request from an HTTP request.
//!
//! Decode failures never surface here: they turn into `Value::Null` and the
//! engine produces the JSON-RPC parse error.

use axum::{extract::Query, http::Uri};
use serde_json::{Map, Value};
use tracing::debug;

pub fn from_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or_else(|err| {
        debug!(error = %err, "request body is not valid JSON");
        Value::Null
    })
}

pub fn from_query(uri: &Uri) -> Value {
    let Ok(Query(pairs)) = Query::<Vec<(String, String)>>::try_from_uri(uri) else {
        debug!(uri = %uri, "query string could not be decoded");
        return Value::Null;
    };

    let mut request = Map::new();
    for (key, value) in pairs {
        let value = match key.as_str() {
            "params" => match serde_json::from_str(&value) {
                Ok(params) => params,
                Err(err) => {
                    debug!(error = %err, "params query parameter is not valid JSON");
                    return Value::Null;
                }
            },
            "id" => id_value(value),
            _ => Value::String(value),
        };
        request.insert(key, value);
    }

    Value::Object(request)
}

fn id_value(raw: String) -> Value {
    raw.parse::<i64>()
        .map(Value::from)
        .unwrap_or(Value::String(raw))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn uri(value: &str) -> Uri {
        value.parse().expect("valid uri")
    }

    #[test]
    fn body_is_decoded() {
        let request = from_body(br#"{"jsonrpc":"2.0","method":"add","params":[1,2],"id":1}"#);
        assert_eq!(
            request,
            json!({"jsonrpc": "2.0", "method": "add", "params": [1, 2], "id": 1})
        );
    }

    #[test]
    fn batch_body_is_passed_through() {
        let request = from_body(br#"[{"jsonrpc":"2.0","method":"a"},{"jsonrpc":"2.0","method":"b"}]"#);
        assert!(request.is_array());
    }

    #[test]
    fn malformed_body_becomes_null() {
        assert_eq!(from_body(b"{\"jsonrpc\":"), Value::Null);
        assert_eq!(from_body(b""), Value::Null);
    }

    #[test]
    fn query_params_are_json_decoded() {
        let request = from_query(&uri("/rpc?method=add&params=%5B1%2C2%5D&id=1"));
        assert_eq!(request, json!({"method": "add", "params": [1, 2], "id": 1}));
    }

    #[test]
    fn non_numeric_id_stays_a_string() {
        let request = from_query(&uri("/rpc?jsonrpc=2.0&method=ping&id=abc"));
        assert_eq!(request, json!({"jsonrpc": "2.0", "method": "ping", "id": "abc"}));
    }

    #[test]
    fn last_query_value_wins() {
        let request = from_query(&uri("/rpc?method=first&method=second"));
        assert_eq!(request, json!({"method": "second"}));
    }

    #[test]
    fn missing_query_is_empty_object() {
        assert_eq!(from_query(&uri("/rpc")), json!({}));
    }

    #[test]
    fn malformed_params_become_null() {
        let request = from_query(&uri("/rpc?method=add&params=%5B1%2C"));
        assert_eq!(request, Value::Null);
    }
}
