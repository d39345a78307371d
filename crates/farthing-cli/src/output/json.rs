use std::io;

use farthing_client::{ClientError, SuccessEnvelope};
use serde::Serialize;
use serde_json::{Value, json};

const JSON_VERSION: &str = "v1";

pub fn render_success_json(success: &SuccessEnvelope) -> io::Result<String> {
    let value = match success.command.as_str() {
        // List commands return the raw row array for easy piping.
        "import list" | "account list" | "account mappings" | "currency list"
        | "rule payee list" | "rule transfer list" => rows_array(&success.data),
        _ => json!({
            "ok": true,
            "version": JSON_VERSION,
            "data": success.data.clone()
        }),
    };

    serialize_json_pretty(&value)
}

pub fn render_error_json(error: &ClientError) -> io::Result<String> {
    let mut body = json!({
        "code": error.code,
        "message": error.message,
        "recovery_steps": error.recovery_steps,
    });
    if let (Some(object), Some(data)) = (body.as_object_mut(), error.data.as_ref()) {
        object.insert("data".to_string(), data.clone());
    }
    serialize_json_pretty(&json!({ "error": body }))
}

fn rows_array(data: &Value) -> Value {
    Value::Array(
        data.get("rows")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    )
}

fn serialize_json_pretty<T>(value: &T) -> io::Result<String>
where
    T: Serialize,
{
    serde_json::to_string_pretty(value).map_err(io::Error::other)
}
