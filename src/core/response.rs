//! Invocation responses
//!
//! Both entry points answer with a status code and a JSON body, the shape a
//! scheduled function or event handler returns to its caller.

use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: Value,
}

impl InvocationResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status_code: 200,
            body,
        }
    }

    /// Caller-side problem such as missing recipients or API key
    pub fn configuration_error(message: impl Into<String>) -> Self {
        Self {
            status_code: 400,
            body: json!({ "error": "configuration_error", "message": message.into() }),
        }
    }

    /// The run could not complete, with details in `body`
    pub fn failure(body: Value) -> Self {
        Self {
            status_code: 500,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Process exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self.status_code {
            200..=299 => 0,
            400..=499 => 2,
            _ => 1,
        }
    }
}
