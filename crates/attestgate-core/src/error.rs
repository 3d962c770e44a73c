// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Unified error types for attestgate.

use thiserror::Error;

/// Failure reported by the underlying platform attestation capability.
///
/// The platform API surfaces two kinds of failure: a recognised API error
/// carrying a numeric status code, and everything else as a bare message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// A structured platform API error with a status code.
    #[error("platform status {code}: {message}")]
    Status { code: i32, message: String },

    /// Any other platform-level failure.
    #[error("{0}")]
    Other(String),
}

/// Top-level rejection type for all bridge operations.
///
/// Each variant maps to one caller-visible rejection shape; the shapes are
/// deliberately not unified across operations (attestation failures are
/// decomposed, reCAPTCHA failures are forwarded raw).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttestgateError {
    // -- Availability --
    /// Google Play services is missing or outdated on this device.
    #[error("{0}")]
    Unavailable(String),

    // -- Attestation --
    /// Structured platform API failure: stringified status code plus message,
    /// kept as an exact pair, never concatenated.
    #[error("{message}")]
    Api { code: String, message: String },

    /// Unstructured attestation failure, message only.
    #[error("{0}")]
    Attestation(String),

    // -- Human verification --
    /// reCAPTCHA failure, forwarding the raw platform error untouched.
    #[error(transparent)]
    Recaptcha(PlatformError),

    // -- Bridge internals --
    /// Fault inside the bridge itself (bad dispatch arguments, a settlement
    /// handle dropped before settling).
    #[error("bridge error: {0}")]
    Bridge(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AttestgateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_keeps_code_and_message_separate() {
        let err = AttestgateError::Api {
            code: "7".into(),
            message: "NETWORK_ERROR".into(),
        };
        match err {
            AttestgateError::Api { code, message } => {
                assert_eq!(code, "7");
                assert_eq!(message, "NETWORK_ERROR");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn recaptcha_display_is_the_raw_platform_error() {
        let raw = PlatformError::Other("session expired".into());
        let err = AttestgateError::Recaptcha(raw.clone());
        assert_eq!(err.to_string(), raw.to_string());
    }

    #[test]
    fn structured_platform_error_display_includes_code() {
        let err = PlatformError::Status {
            code: 7,
            message: "NETWORK_ERROR".into(),
        };
        assert_eq!(err.to_string(), "platform status 7: NETWORK_ERROR");
    }
}
