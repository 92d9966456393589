use bytes::Bytes;
use grelay_protocol::openai::{ErrorBody, ErrorEnvelope};
use grelay_transform::TransformError;
use http::StatusCode;

pub type RelayResult<T> = Result<T, RelayError>;

/// Every failure that can leave the relay core.
///
/// Callers turn it into the canonical envelope with [`RelayError::to_envelope`]
/// before anything crosses back to the downstream client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RelayError {
    /// Unknown channel, malformed key, missing model mapping. Never retryable.
    #[error("{message}")]
    Config { code: &'static str, message: String },
    #[error("{message}")]
    InvalidRequest { code: &'static str, message: String },
    #[error("{message}")]
    Transport { code: &'static str, message: String },
    #[error("{message}")]
    Decode { code: &'static str, message: String },
    #[error("{message}")]
    Credential { code: &'static str, message: String },
    /// Non-2xx reply from the upstream, passed through as-is.
    #[error("upstream returned {status}")]
    Upstream { status: StatusCode, body: Bytes },
}

impl RelayError {
    pub fn config(code: &'static str, message: impl Into<String>) -> Self {
        RelayError::Config {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_request(code: &'static str, message: impl Into<String>) -> Self {
        RelayError::InvalidRequest {
            code,
            message: message.into(),
        }
    }

    pub fn transport(code: &'static str, message: impl Into<String>) -> Self {
        RelayError::Transport {
            code,
            message: message.into(),
        }
    }

    pub fn decode(code: &'static str, message: impl Into<String>) -> Self {
        RelayError::Decode {
            code,
            message: message.into(),
        }
    }

    pub fn credential(code: &'static str, message: impl Into<String>) -> Self {
        RelayError::Credential {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            RelayError::Config { code, .. }
            | RelayError::InvalidRequest { code, .. }
            | RelayError::Transport { code, .. }
            | RelayError::Decode { code, .. }
            | RelayError::Credential { code, .. } => code,
            RelayError::Upstream { .. } => "upstream_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Config { .. } | RelayError::InvalidRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            RelayError::Transport { .. }
            | RelayError::Decode { .. }
            | RelayError::Credential { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::Upstream { status, .. } => *status,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            RelayError::Config { .. } => "config_error",
            RelayError::InvalidRequest { .. } => "invalid_request_error",
            RelayError::Transport { .. } | RelayError::Credential { .. } => "transport_error",
            RelayError::Decode { .. } => "decode_error",
            RelayError::Upstream { .. } => "upstream_error",
        }
    }

    /// Canonical `{"error": {...}}` body plus the status to send with it.
    ///
    /// Upstream errors that already carry an OpenAI-style envelope are kept
    /// verbatim; anything else is wrapped with the raw body as the message.
    pub fn to_envelope(&self) -> (StatusCode, ErrorEnvelope) {
        if let RelayError::Upstream { status, body } = self {
            if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) {
                return (*status, envelope);
            }
            let message = String::from_utf8_lossy(body).trim().to_string();
            let message = if message.is_empty() {
                format!("upstream returned {status}")
            } else {
                message
            };
            return (
                *status,
                ErrorEnvelope {
                    error: ErrorBody {
                        message,
                        r#type: self.error_type().to_string(),
                        param: None,
                        code: Some(self.code().to_string()),
                    },
                },
            );
        }

        (
            self.status(),
            ErrorEnvelope {
                error: ErrorBody {
                    message: self.to_string(),
                    r#type: self.error_type().to_string(),
                    param: None,
                    code: Some(self.code().to_string()),
                },
            },
        )
    }
}

impl From<TransformError> for RelayError {
    fn from(value: TransformError) -> Self {
        match value {
            TransformError::ImageNotResolved(_) => {
                RelayError::transport("image_fetch_failed", value.to_string())
            }
            TransformError::InvalidImageData(_) => {
                RelayError::invalid_request("invalid_image_data", value.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_client_errors() {
        let err = RelayError::config("channel_not_found", "channel not exists: 77");
        let (status, envelope) = err.to_envelope();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(envelope.error.code.as_deref(), Some("channel_not_found"));
        assert_eq!(envelope.error.message, "channel not exists: 77");
    }

    #[test]
    fn credential_errors_are_internal() {
        let err = RelayError::credential("credential_exchange_failed", "401 from idp");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn upstream_envelope_is_kept() {
        let body = Bytes::from_static(
            br#"{"error":{"message":"quota","type":"insufficient_quota","code":"quota"}}"#,
        );
        let err = RelayError::Upstream {
            status: StatusCode::TOO_MANY_REQUESTS,
            body,
        };
        let (status, envelope) = err.to_envelope();
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(envelope.error.r#type, "insufficient_quota");
    }

    #[test]
    fn upstream_plain_body_is_wrapped() {
        let err = RelayError::Upstream {
            status: StatusCode::BAD_GATEWAY,
            body: Bytes::from_static(b"bad gateway"),
        };
        let (_, envelope) = err.to_envelope();
        assert_eq!(envelope.error.message, "bad gateway");
        assert_eq!(envelope.error.code.as_deref(), Some("upstream_error"));
    }
}
