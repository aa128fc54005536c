//! Response bodies for the caller-facing surface.

use crate::orchestrator::SavedCapture;
use bioscan_core::{RecordId, Template};
use serde::Serialize;

/// Result of a capture request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureResponse {
    pub success: bool,
    pub message: String,
    pub biometric_id: Option<RecordId>,
    pub template: Option<Template>,
}

impl CaptureResponse {
    pub fn saved(saved: SavedCapture) -> Self {
        Self {
            success: true,
            message: "Fingerprint captured and stored successfully".to_string(),
            biometric_id: Some(saved.id),
            template: Some(saved.template),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            biometric_id: None,
            template: None,
        }
    }
}

/// Plain acknowledgement, or the failure of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>, error: impl ToString) -> Self {
        Self {
            message: message.into(),
            error: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_capture_response() {
        let response = CaptureResponse::saved(SavedCapture {
            id: RecordId::new(1),
            template: Template::new("abc123").unwrap(),
            quality: Some(80),
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["biometric_id"], 1);
        assert_eq!(json["template"], "abc123");
    }

    #[test]
    fn test_failed_capture_response() {
        let json =
            serde_json::to_value(CaptureResponse::failed("Failed to capture image: timeout"))
                .unwrap();
        assert_eq!(json["success"], false);
        assert!(json["biometric_id"].is_null());
        assert!(json["template"].is_null());
    }

    #[test]
    fn test_message_response_omits_empty_error() {
        let json = serde_json::to_value(MessageResponse::new("done")).unwrap();
        assert!(json.get("error").is_none());

        let json = serde_json::to_value(MessageResponse::error("failed", "disk full")).unwrap();
        assert_eq!(json["error"], "disk full");
    }
}
