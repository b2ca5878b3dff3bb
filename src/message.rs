//! The channel vocabulary: messages the bundler emits and requests it
//! accepts.
//!
//! Messages travel as JSON objects tagged by a `type` field. Inbound
//! objects that do not parse into an [`EngineMessage`] are ignored by
//! every consumer, so newer bundlers can add kinds without breaking us.

use serde::Deserialize;
use serde_json::Value;

use crate::state::{ManagerState, ModuleError, Status};

// ── Inbound ──────────────────────────────────────────────────────────────

/// Which resolver callback a file request wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMethod {
    /// `isFile(path)`.
    IsFile,
    /// `readFile(path)`.
    ReadFile,
}

/// The bundler asking the host to resolve a file outside the file set.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRequest {
    /// Correlation id echoed in the response.
    pub id: Value,
    /// Requested callback.
    pub method: FileMethod,
    /// Path argument.
    pub path: String,
}

/// A message the bundler emitted.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    /// `state`: a fresh manager snapshot.
    State(ManagerState),
    /// `start`: a new build began.
    Start,
    /// `status`: lifecycle status change.
    Status(Status),
    /// `action` / `show-error`: one compile or runtime error.
    ShowError(ModuleError),
    /// `transpiler-context`: reply to a transpiler registry request.
    TranspilerContext(Value),
    /// `fs/request`: the bundler wants the host file resolver.
    FileRequest(FileRequest),
}

impl EngineMessage {
    /// Wire kind, for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::State(_) => "state",
            Self::Start => "start",
            Self::Status(_) => "status",
            Self::ShowError(_) => "action:show-error",
            Self::TranspilerContext(_) => "transpiler-context",
            Self::FileRequest(_) => "fs/request",
        }
    }
}

/// Parse a raw channel message. Unknown kinds and malformed payloads yield
/// `None`.
#[must_use]
pub fn parse_message(msg: &Value) -> Option<EngineMessage> {
    let kind = msg.get("type")?.as_str()?;
    match kind {
        "state" => {
            let state = msg.get("state").cloned().unwrap_or(Value::Null);
            Some(EngineMessage::State(ManagerState(state)))
        }
        "start" => Some(EngineMessage::Start),
        "status" => {
            let status = msg.get("status")?.as_str()?;
            Status::from_wire(status).map(EngineMessage::Status)
        }
        "action" => match msg.get("action")?.as_str()? {
            "show-error" => ModuleError::deserialize(msg)
                .ok()
                .map(EngineMessage::ShowError),
            _ => None,
        },
        "transpiler-context" => {
            let data = msg.get("data").cloned().unwrap_or(Value::Null);
            Some(EngineMessage::TranspilerContext(data))
        }
        "fs/request" => parse_file_request(msg).map(EngineMessage::FileRequest),
        _ => None,
    }
}

fn parse_file_request(msg: &Value) -> Option<FileRequest> {
    let id = msg.get("id")?.clone();
    let method = match msg.get("method")?.as_str()? {
        "isFile" => FileMethod::IsFile,
        "readFile" => FileMethod::ReadFile,
        _ => return None,
    };
    let path = msg.get("params")?.get(0)?.as_str()?.to_owned();
    Some(FileRequest { id, method, path })
}

// ── Outbound ─────────────────────────────────────────────────────────────

/// A request dispatched to the bundler.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineRequest {
    /// Ask for the transpiler registry.
    GetTranspilerContext,
    /// Reload the preview without recompiling.
    Refresh,
    /// Answer to a [`FileRequest`].
    FileResponse {
        /// Correlation id from the request.
        id: Value,
        /// Resolver result (`bool` for `isFile`, string or null for
        /// `readFile`).
        result: Value,
    },
}

impl EngineRequest {
    /// JSON form posted into the frame.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::GetTranspilerContext => {
                serde_json::json!({ "type": "get-transpiler-context" })
            }
            Self::Refresh => serde_json::json!({ "type": "refresh" }),
            Self::FileResponse { id, result } => serde_json::json!({
                "type": "fs/response",
                "id": id,
                "result": result,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_each_known_kind() {
        assert_eq!(
            parse_message(&json!({ "type": "start" })),
            Some(EngineMessage::Start)
        );
        assert_eq!(
            parse_message(&json!({ "type": "status", "status": "transpiling" })),
            Some(EngineMessage::Status(Status::Transpiling))
        );
        assert_eq!(
            parse_message(&json!({ "type": "state", "state": { "entry": "/index.js" } })),
            Some(EngineMessage::State(ManagerState(json!({ "entry": "/index.js" }))))
        );
        assert_eq!(
            parse_message(&json!({ "type": "transpiler-context", "data": { "babel": {} } })),
            Some(EngineMessage::TranspilerContext(json!({ "babel": {} })))
        );
    }

    #[test]
    fn show_error_carries_position() {
        let msg = json!({
            "type": "action",
            "action": "show-error",
            "title": "SyntaxError",
            "path": "/index.js",
            "message": "Unexpected token",
            "line": 3,
            "column": 14,
        });
        let Some(EngineMessage::ShowError(err)) = parse_message(&msg) else {
            unreachable!("show-error should parse");
        };
        assert_eq!(err.path, "/index.js");
        assert_eq!((err.line, err.column), (3, 14));
    }

    #[test]
    fn unknown_kinds_are_ignored() {
        assert_eq!(parse_message(&json!({ "type": "urlchange", "url": "/" })), None);
        assert_eq!(parse_message(&json!({ "type": "action", "action": "notification" })), None);
        assert_eq!(parse_message(&json!({ "type": "status", "status": "warp" })), None);
        assert_eq!(parse_message(&json!("start")), None);
    }

    #[test]
    fn file_request_reads_first_param() {
        let msg = json!({
            "type": "fs/request",
            "id": 7,
            "method": "readFile",
            "params": ["/node_modules/x/index.js"],
        });
        assert_eq!(
            parse_message(&msg),
            Some(EngineMessage::FileRequest(FileRequest {
                id: json!(7),
                method: FileMethod::ReadFile,
                path: "/node_modules/x/index.js".into(),
            }))
        );
    }

    #[test]
    fn requests_serialize_with_type_tag() {
        assert_eq!(
            EngineRequest::GetTranspilerContext.to_json(),
            json!({ "type": "get-transpiler-context" })
        );
        let resp = EngineRequest::FileResponse {
            id: json!("a"),
            result: json!(true),
        };
        assert_eq!(resp.to_json()["type"], "fs/response");
    }
}
