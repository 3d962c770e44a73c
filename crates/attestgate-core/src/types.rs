// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Call-scoped payload types. Nothing here outlives a single bridge call.

use serde::{Deserialize, Serialize};

/// Success payload of a platform attestation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationResponse {
    /// The signed attestation statement as a compact JWS string. Validation
    /// of the signature happens server-side, never in the bridge.
    pub jws_result: String,
}

/// Success payload of a platform reCAPTCHA verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecaptchaTokenResponse {
    /// Token proving a human-verification challenge was completed.
    pub token_result: String,
}

/// Value a resolved bridge call delivers to the host runtime.
///
/// The three operations resolve with either a boolean (availability) or a
/// string (JWS result, reCAPTCHA token), so the bridge only needs these two
/// shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BridgeValue {
    Bool(bool),
    String(String),
}

impl From<bool> for BridgeValue {
    fn from(v: bool) -> Self {
        BridgeValue::Bool(v)
    }
}

impl From<String> for BridgeValue {
    fn from(v: String) -> Self {
        BridgeValue::String(v)
    }
}
