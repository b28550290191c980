//! IPC protocol between the coordinator and worker subprocesses.
//!
//! Messages are JSON-serialized and newline-delimited. The conversation per
//! worker is: child sends `Ready` once its engine is initialized, then the
//! parent sends one `Render` at a time and waits for `Done` or `Error`.
//! `Error` is terminal for the worker.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Request from parent to worker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkRequest {
    /// Render one preset across the configured pitch range.
    Render {
        /// Path to the preset file to load and render.
        preset_path: PathBuf,
    },

    /// Graceful shutdown request.
    Exit,
}

/// Response from worker to parent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkResponse {
    /// Worker engine is initialized and waiting for work.
    Ready,

    /// One job finished.
    Done {
        /// Number of output files the job produced.
        files_written: usize,
    },

    /// The worker hit a fatal fault and will exit without taking more work.
    Error {
        /// What went wrong.
        message: String,
        /// What the worker was doing at the time.
        context: String,
    },
}

impl WorkResponse {
    /// Create an error response.
    pub fn error(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            context: context.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T>(value: &T) -> T
    where
        T: Serialize + for<'de> Deserialize<'de>,
    {
        let json = serde_json::to_string(value).unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_render_request_roundtrip() {
        let req = WorkRequest::Render {
            preset_path: PathBuf::from("/presets/pad.preset"),
        };
        assert_eq!(roundtrip(&req), req);

        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("render"));
        assert!(json.contains("pad.preset"));
    }

    #[test]
    fn test_exit_request_roundtrip() {
        assert_eq!(roundtrip(&WorkRequest::Exit), WorkRequest::Exit);
    }

    #[test]
    fn test_done_response_roundtrip() {
        let resp = WorkResponse::Done { files_written: 13 };
        assert_eq!(roundtrip(&resp), resp);
    }

    #[test]
    fn test_error_response_carries_message_and_context() {
        let resp = WorkResponse::error("preset exploded", "processing /p/x.preset");
        match roundtrip(&resp) {
            WorkResponse::Error { message, context } => {
                assert_eq!(message, "preset exploded");
                assert_eq!(context, "processing /p/x.preset");
            }
            other => panic!("expected Error variant, got {:?}", other),
        }
    }

    #[test]
    fn test_ready_wire_format() {
        let json = serde_json::to_string(&WorkResponse::Ready).unwrap();
        assert_eq!(json, r#"{"type":"ready"}"#);
    }
}
