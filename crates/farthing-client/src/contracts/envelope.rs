use serde::Serialize;
use serde_json::Value;

use crate::API_VERSION;
use crate::error::{ClientError, ClientResult};

/// Versioned payload every command returns on success. `command` is the
/// stable surface name ("import", "account list", ...) the CLI keys its text
/// renderers on; `data` is the command's typed result serialized to JSON.
#[derive(Debug, Clone, Serialize)]
pub struct SuccessEnvelope {
    pub ok: bool,
    pub command: String,
    pub version: String,
    pub data: Value,
}

impl SuccessEnvelope {
    pub fn new<T>(command: &str, data: T) -> ClientResult<Self>
    where
        T: Serialize,
    {
        let data = serde_json::to_value(data)
            .map_err(|error| ClientError::internal_serialization(&error.to_string()))?;
        Ok(Self {
            ok: true,
            command: command.to_string(),
            version: API_VERSION.to_string(),
            data,
        })
    }
}

/// Failure mirror of the success payload. `data` carries the error's
/// structured context when it has any, such as the matched rules behind an
/// ambiguous payee rule.
#[derive(Debug, Clone, Serialize)]
pub struct FailureEnvelope {
    pub ok: bool,
    pub error: ErrorContract,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorContract {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
}

impl FailureEnvelope {
    pub fn for_error(error: &ClientError) -> Self {
        Self {
            ok: false,
            error: ErrorContract {
                code: error.code.clone(),
                message: error.message.clone(),
                recovery_steps: error.recovery_steps.clone(),
            },
            data: error.data.clone(),
        }
    }
}
