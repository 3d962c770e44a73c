// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Stub integrity service for platforms without Google Play services.
//
// Every call reports unavailability — the real implementation lives in the
// `android` module.

use async_trait::async_trait;

use attestgate_core::{AttestationResponse, PlatformError, RecaptchaTokenResponse};

use crate::service::IntegrityService;

/// No-op integrity service returned on non-Android platforms.
pub struct StubIntegrityService;

#[async_trait]
impl IntegrityService for StubIntegrityService {
    async fn check_availability(&self) -> Result<(), PlatformError> {
        tracing::warn!("IntegrityService::check_availability called on stub service");
        Err(PlatformError::Other(
            "Google Play services is not available on this platform".into(),
        ))
    }

    async fn attest(
        &self,
        _nonce: &[u8],
        _api_key: &str,
    ) -> Result<AttestationResponse, PlatformError> {
        tracing::warn!("IntegrityService::attest called on stub service");
        Err(PlatformError::Other(
            "attestation requires Google Play services, which this platform lacks".into(),
        ))
    }

    async fn verify_with_recaptcha(
        &self,
        _api_key: &str,
    ) -> Result<RecaptchaTokenResponse, PlatformError> {
        tracing::warn!("IntegrityService::verify_with_recaptcha called on stub service");
        Err(PlatformError::Other(
            "reCAPTCHA requires Google Play services, which this platform lacks".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use attestgate_core::AttestgateError;

    use super::*;
    use crate::host::HostContext;
    use crate::module::SafetyNetModule;

    #[tokio::test]
    async fn stub_reports_play_services_unavailable() {
        let module = SafetyNetModule::new(
            HostContext::new("com.example.app"),
            Arc::new(StubIntegrityService),
        );
        assert_eq!(
            module.is_play_services_available().await,
            Err(AttestgateError::Unavailable(
                "Google Play services is not available on this platform".into()
            ))
        );
    }
}
