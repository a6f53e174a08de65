//! Error types for verification and usage calls.

/// Failure of a remote call or of its input.
///
/// None of these cross the `validate` / `record_usage_async` boundary: the client turns them into
/// an invalid outcome (or `false`) and logs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// Request did not complete within the configured timeout
    Timeout,
    /// Connection or I/O failure before a response arrived
    Transport(String),
    /// Server answered with a non-success status
    Status { status: u16, body: String },
    /// Body was not valid JSON or lacked a required field
    MalformedResponse(String),
    /// Email was empty or not shaped like an address
    InvalidInput(String),
}

impl VerificationError {
    /// Returns true for failures of the transport itself (timeout, connection, status).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Timeout | Self::Transport(_) | Self::Status { .. })
    }
}

impl std::fmt::Display for VerificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "request timed out"),
            Self::Transport(msg) => write!(f, "failed to reach verification server: {msg}"),
            Self::Status { status, body } if body.is_empty() => write!(f, "HTTP {status}"),
            Self::Status { status, body } => write!(f, "HTTP {status}: {body}"),
            Self::MalformedResponse(msg) => write!(f, "malformed response from verification server: {msg}"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl std::error::Error for VerificationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_grouping() {
        assert!(VerificationError::Timeout.is_transport());
        assert!(VerificationError::Transport("refused".to_string()).is_transport());
        assert!(
            VerificationError::Status {
                status: 500,
                body: String::new()
            }
            .is_transport()
        );
        assert!(!VerificationError::MalformedResponse("eof".to_string()).is_transport());
        assert!(!VerificationError::InvalidInput("empty".to_string()).is_transport());
    }

    #[test]
    fn test_status_display_includes_body_when_present() {
        let bare = VerificationError::Status {
            status: 502,
            body: String::new(),
        };
        assert_eq!(bare.to_string(), "HTTP 502");

        let with_body = VerificationError::Status {
            status: 500,
            body: "internal".to_string(),
        };
        assert_eq!(with_body.to_string(), "HTTP 500: internal");
    }
}
