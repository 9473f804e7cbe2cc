//! Command dispatch
//!
//! Maps a command name plus a JSON payload onto a typed [`Command`], runs it
//! against a [`Companion`], and renders either the result or a structured
//! error payload. Nothing in this layer panics on bad input.
//!
//! | name          | payload                          | result                  |
//! |---------------|----------------------------------|-------------------------|
//! | `setup`       | ignored                          | `"Success"`             |
//! | `test_normal` | `{data: [..] \| "[..]"}`         | `{is_normal, p_value, statistic}` |
//! | `read_h5`     | `{h5_bytes: "<base64>"}`         | `{id2emb: {id: [..]}}`  |
//! | `write_h5`    | `{embeddings: {..} \| "{..}"}`   | `{h5_bytes: "<base64>"}`|
//!
//! The `h5` names are kept for caller compatibility only. `h5_bytes` carries
//! an [`embedding`](crate::embedding) container, not an HDF5 file: blobs
//! written by HDF5 tools are rejected with a format error.

mod request;

use serde_json::{json, Value};

use crate::stats::NormalityResult;
use crate::{Companion, Error, Result};

pub use request::{
    JsonOrText, ReadH5Request, ReadH5Response, TestNormalRequest, WriteH5Request,
    WriteH5Response,
};

/// Reply to the `setup` command
pub const SETUP_REPLY: &str = "Success";

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Health check
    Setup,
    /// Shapiro-Wilk normality test
    TestNormal(TestNormalRequest),
    /// Decode a base64 container
    ReadH5(ReadH5Request),
    /// Encode embeddings into a base64 container
    WriteH5(WriteH5Request),
}

impl Command {
    /// Every recognised command name
    pub const NAMES: [&'static str; 4] = ["setup", "test_normal", "read_h5", "write_h5"];

    /// Parse a command from its name and JSON payload.
    ///
    /// A `null` payload is treated as an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for unknown names or payloads that do
    /// not match the command's shape.
    pub fn parse(name: &str, payload: Value) -> Result<Self> {
        match name {
            "setup" => Ok(Self::Setup),
            "test_normal" => Ok(Self::TestNormal(request::from_payload(payload)?)),
            "read_h5" => Ok(Self::ReadH5(request::from_payload(payload)?)),
            "write_h5" => Ok(Self::WriteH5(request::from_payload(payload)?)),
            other => Err(Error::Validation(format!("Unknown command: {other}"))),
        }
    }

    /// Wire name of this command
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::TestNormal(_) => "test_normal",
            Self::ReadH5(_) => "read_h5",
            Self::WriteH5(_) => "write_h5",
        }
    }
}

/// Result of a successfully executed command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    /// `setup` acknowledgement
    Setup,
    /// `test_normal` result
    TestNormal(NormalityResult),
    /// `read_h5` result
    ReadH5(ReadH5Response),
    /// `write_h5` result
    WriteH5(WriteH5Response),
}

impl CommandOutput {
    /// Render as the JSON value returned to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if serialization fails.
    pub fn to_json(&self) -> Result<Value> {
        Ok(match self {
            Self::Setup => Value::String(SETUP_REPLY.to_string()),
            Self::TestNormal(result) => serde_json::to_value(result)?,
            Self::ReadH5(response) => serde_json::to_value(response)?,
            Self::WriteH5(response) => serde_json::to_value(response)?,
        })
    }
}

/// Structured error payload: `{"error": <message>, "kind": <category>}`
#[must_use]
pub fn error_payload(error: &Error) -> Value {
    json!({
        "error": error.message(),
        "kind": error.kind().as_str(),
    })
}

/// Interpret raw payload text: JSON if it parses, otherwise the text itself.
///
/// A missing or blank payload becomes `null`.
#[must_use]
pub fn parse_payload(raw: Option<&str>) -> Value {
    match raw.map(str::trim) {
        None | Some("") => Value::Null,
        Some(text) => {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
        }
    }
}

impl Companion {
    /// Execute a parsed command.
    ///
    /// # Errors
    ///
    /// Propagates validation, format and computation errors from the
    /// underlying operation.
    pub fn execute(&self, command: Command) -> Result<CommandOutput> {
        match command {
            Command::Setup => Ok(CommandOutput::Setup),
            Command::TestNormal(request) => {
                let sample = request.into_sample()?;
                let result = self.test_normal(&sample)?;
                tracing::info!(
                    n = sample.len(),
                    statistic = result.statistic(),
                    p_value = result.p_value(),
                    is_normal = result.is_normal(),
                    "normality test completed"
                );
                Ok(CommandOutput::TestNormal(result))
            }
            Command::ReadH5(request) => {
                let text = request.into_base64()?;
                let set = self.codec().decode_base64(&text)?;
                tracing::info!(entries = set.len(), "container read");
                Ok(CommandOutput::ReadH5(ReadH5Response {
                    id2emb: set.into_id_map(),
                }))
            }
            Command::WriteH5(request) => {
                let compress = request.compress();
                let set = request.into_set()?;
                let container = self.codec().encode_with(&set, compress)?;
                tracing::info!(
                    entries = set.len(),
                    bytes = container.len(),
                    compress,
                    "container written"
                );
                Ok(CommandOutput::WriteH5(WriteH5Response {
                    h5_bytes: container.to_base64(),
                }))
            }
        }
    }

    /// Parse and execute a command, returning the JSON result or an error
    /// payload. Never panics.
    #[must_use]
    pub fn handle(&self, name: &str, payload: Value) -> Value {
        tracing::debug!(command = name, "command received");
        let outcome = Command::parse(name, payload)
            .and_then(|command| self.execute(command))
            .and_then(|output| output.to_json());
        match outcome {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(
                    command = name,
                    kind = error.kind().as_str(),
                    error = %error,
                    "command failed"
                );
                error_payload(&error)
            }
        }
    }

    /// [`handle`](Self::handle) for raw payload text.
    #[must_use]
    pub fn handle_text(&self, name: &str, payload: Option<&str>) -> Value {
        self.handle(name, parse_payload(payload))
    }
}
