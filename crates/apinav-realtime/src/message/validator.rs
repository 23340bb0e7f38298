//! Message validation rules.

use apinav_core::error::AppError;
use apinav_core::result::AppResult;

use super::types::InboundMessage;

/// Validates a raw inbound frame before parsing.
pub fn validate_inbound(raw: &str, max_bytes: usize) -> AppResult<()> {
    if raw.len() > max_bytes {
        return Err(AppError::malformed_intent(format!(
            "Message exceeds maximum size of {max_bytes} bytes"
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::malformed_intent("Empty message"));
    }

    Ok(())
}

/// Validate and parse a raw inbound frame.
pub fn parse_inbound(raw: &str, max_bytes: usize) -> AppResult<InboundMessage> {
    validate_inbound(raw, max_bytes)?;
    serde_json::from_str(raw)
        .map_err(|e| AppError::malformed_intent(format!("Failed to parse message: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use apinav_core::error::ErrorKind;

    #[test]
    fn test_oversized_and_empty_frames() {
        assert_eq!(
            validate_inbound(&"x".repeat(11), 10).unwrap_err().kind,
            ErrorKind::MalformedIntent
        );
        assert!(validate_inbound("   ", 10).is_err());
        assert!(validate_inbound("{}", 10).is_ok());
    }

    #[test]
    fn test_unknown_command_is_malformed() {
        let err = parse_inbound(r#"{"command":"selfDestruct"}"#, 1024).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedIntent);
    }

    #[test]
    fn test_parse_ready() {
        assert_eq!(
            parse_inbound(r#"{"command":"surfaceReady"}"#, 1024).unwrap(),
            InboundMessage::SurfaceReady {}
        );
    }
}
