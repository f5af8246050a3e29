//! Response wrapper: `{ "status", "data" or "error" }`.

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

/// Error object carried by a failed envelope.
///
/// Read from any JSON: `message` survives whatever shape `code` and `details` take. A code that
/// is neither a number nor a numeric string reads as 0; non-string details keep their JSON text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value")]
pub struct ApiErrorBody {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<serde_json::Value> for ApiErrorBody {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        // A bare string is the message itself.
        if let Value::String(message) = value {
            return Self {
                message,
                ..Self::default()
            };
        }
        let code = match value.get("code") {
            Some(Value::Number(n)) => n.as_i64().unwrap_or_default(),
            Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
            _ => 0,
        };
        Self {
            code,
            message: text(value.get("message")).unwrap_or_default(),
            details: text(value.get("details")),
        }
    }
}

fn text(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Wire envelope wrapping every HTTP response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: EnvelopeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
}

impl<T> Envelope<T> {
    /// Data on success; the service's error otherwise.
    pub fn into_result(self) -> Result<T, ClientError> {
        match self.status {
            EnvelopeStatus::Success => self.data.ok_or_else(|| {
                ClientError::Decode(serde::de::Error::custom(
                    "envelope reported success without data",
                ))
            }),
            EnvelopeStatus::Error => {
                let body = self.error.unwrap_or_default();
                Err(ClientError::Service {
                    code: body.code,
                    message: body.message,
                    details: body.details,
                })
            }
        }
    }
}
