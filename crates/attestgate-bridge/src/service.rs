// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Platform-agnostic seam to the device attestation capability.
//
// The capability is owned by the platform vendor. The bridge forwards
// arguments and outcomes verbatim and performs no validation of anything the
// service returns; signature checks on attestation results belong
// server-side.

use async_trait::async_trait;

use attestgate_core::{AttestationResponse, PlatformError, RecaptchaTokenResponse};

/// The device integrity / attestation capability behind the bridge.
///
/// Each method issues exactly one underlying platform request and completes
/// when its callback fires. Concurrent calls are allowed; the platform
/// service is assumed to handle concurrent requests safely.
#[async_trait]
pub trait IntegrityService: Send + Sync {
    /// Whether Google Play services is present and up to date on this
    /// device. `Err` carries the platform's human-readable diagnostic.
    async fn check_availability(&self) -> Result<(), PlatformError>;

    /// Request a signed attestation binding `nonce` to this device.
    ///
    /// `api_key` is an opaque credential forwarded verbatim.
    async fn attest(
        &self,
        nonce: &[u8],
        api_key: &str,
    ) -> Result<AttestationResponse, PlatformError>;

    /// Run the platform's human-verification challenge and return the proof
    /// token.
    async fn verify_with_recaptcha(
        &self,
        api_key: &str,
    ) -> Result<RecaptchaTokenResponse, PlatformError>;
}
