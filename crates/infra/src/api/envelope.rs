//! Response envelope handling
//!
//! The backend wraps most payloads as `{ "success": true, "data": ... }`.
//! Anything else is returned as-is.

use serde_json::Value;

/// Unwrap `{success, data}` to `data`; any other value passes through
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("success") && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unwraps_success_envelope() {
        let value = json!({ "success": true, "data": { "id": 7, "name": "Grade 10" } });
        assert_eq!(unwrap_envelope(value), json!({ "id": 7, "name": "Grade 10" }));
    }

    #[test]
    fn unwraps_regardless_of_success_flag_or_extra_keys() {
        let value = json!({ "success": false, "data": [1, 2], "message": "partial" });
        assert_eq!(unwrap_envelope(value), json!([1, 2]));
    }

    #[test]
    fn null_data_stays_null() {
        assert_eq!(unwrap_envelope(json!({ "success": true, "data": null })), Value::Null);
    }

    #[test]
    fn bare_payloads_pass_through() {
        let only_data = json!({ "data": [1] });
        assert_eq!(unwrap_envelope(only_data.clone()), only_data);

        let only_success = json!({ "success": true });
        assert_eq!(unwrap_envelope(only_success.clone()), only_success);

        assert_eq!(unwrap_envelope(json!([1, 2, 3])), json!([1, 2, 3]));
        assert_eq!(unwrap_envelope(json!("ok")), json!("ok"));
    }

    #[test]
    fn unwraps_one_level_only() {
        let nested = json!({ "success": true, "data": { "success": true, "data": 1 } });
        assert_eq!(unwrap_envelope(nested), json!({ "success": true, "data": 1 }));
    }
}
