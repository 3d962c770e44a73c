// SPDX-License-Identifier: PMPL-1.0-or-later
//
// The SafetyNet bridge module: three application-facing operations marshalled
// onto the platform integrity capability.
//
// Each operation is an independent one-shot request/response. Nothing is
// retained between calls; retry policy belongs to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use attestgate_core::error::Result;
use attestgate_core::{AttestgateError, BridgeValue, PlatformError};

use crate::host::{HostContext, NativeModule};
use crate::service::IntegrityService;
use crate::settle::Promise;

/// Name this module registers under with the host runtime.
pub const MODULE_NAME: &str = "SafetyNet";

/// Bridge module for the platform attestation service.
///
/// Holds the injected host context (captured once at construction) and a
/// handle to the integrity capability. The module itself is stateless across
/// calls.
pub struct SafetyNetModule {
    ctx: HostContext,
    service: Arc<dyn IntegrityService>,
}

impl SafetyNetModule {
    pub fn new(ctx: HostContext, service: Arc<dyn IntegrityService>) -> Self {
        Self { ctx, service }
    }

    /// Checks if Google Play services is available and up to date.
    ///
    /// Resolves `true` when available; otherwise rejects with the platform's
    /// human-readable diagnostic. The check itself cannot fail in any other
    /// way.
    #[instrument(skip(self), fields(package = %self.ctx.package_name))]
    pub async fn is_play_services_available(&self) -> Result<bool> {
        match self.service.check_availability().await {
            Ok(()) => {
                debug!("Google Play services available");
                Ok(true)
            }
            Err(e) => Err(AttestgateError::Unavailable(diagnostic(&e))),
        }
    }

    /// Send a request to the SafetyNet attestation API.
    ///
    /// Decodes the base64 `nonce`, forwards the bytes and the verbatim
    /// `api_key`, and resolves with the signed JWS result. Structured
    /// platform failures reject with a (stringified code, message) pair;
    /// anything else rejects with the message alone. No retry.
    #[instrument(skip(self, nonce, api_key), fields(package = %self.ctx.package_name))]
    pub async fn send_attestation_request(&self, nonce: &str, api_key: &str) -> Result<String> {
        let nonce = decode_nonce(nonce);
        match self.service.attest(&nonce, api_key).await {
            Ok(response) => Ok(response.jws_result),
            Err(PlatformError::Status { code, message }) => Err(AttestgateError::Api {
                code: code.to_string(),
                message,
            }),
            Err(PlatformError::Other(message)) => Err(AttestgateError::Attestation(message)),
        }
    }

    /// Send a request to the SafetyNet reCAPTCHA API.
    ///
    /// Resolves with the challenge token. Failures are forwarded raw, not
    /// decomposed into (code, message) like attestation failures — callers
    /// depend on receiving the underlying error as-is.
    #[instrument(skip(self, api_key), fields(package = %self.ctx.package_name))]
    pub async fn verify_with_recaptcha(&self, api_key: &str) -> Result<String> {
        match self.service.verify_with_recaptcha(api_key).await {
            Ok(response) => Ok(response.token_result),
            Err(e) => Err(AttestgateError::Recaptcha(e)),
        }
    }
}

#[async_trait]
impl NativeModule for SafetyNetModule {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    async fn dispatch(&self, method: &str, args: Vec<Value>, promise: Promise<BridgeValue>) {
        match method {
            "isPlayServicesAvailable" => {
                settle(promise, self.is_play_services_available().await.map(Into::into));
            }
            "sendAttestationRequest" => match (string_arg(&args, 0), string_arg(&args, 1)) {
                (Ok(nonce), Ok(api_key)) => {
                    let result = self.send_attestation_request(&nonce, &api_key).await;
                    settle(promise, result.map(Into::into));
                }
                (Err(e), _) | (_, Err(e)) => promise.reject(e),
            },
            "verifyWithRecaptcha" => match string_arg(&args, 0) {
                Ok(api_key) => {
                    let result = self.verify_with_recaptcha(&api_key).await;
                    settle(promise, result.map(Into::into));
                }
                Err(e) => promise.reject(e),
            },
            unknown => promise.reject(AttestgateError::Bridge(format!(
                "unknown method '{unknown}' on module '{MODULE_NAME}'"
            ))),
        }
    }
}

/// Single human-readable diagnostic for an availability failure.
fn diagnostic(err: &PlatformError) -> String {
    match err {
        PlatformError::Status { message, .. } => message.clone(),
        PlatformError::Other(message) => message.clone(),
    }
}

/// Settle a promise from an operation result.
fn settle(promise: Promise<BridgeValue>, result: Result<BridgeValue>) {
    match result {
        Ok(value) => promise.resolve(value),
        Err(error) => promise.reject(error),
    }
}

/// Extract a required string argument from a dispatch call.
fn string_arg(args: &[Value], index: usize) -> Result<String> {
    args.get(index)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| AttestgateError::Bridge(format!("argument {index} must be a string")))
}

/// Decode a base64 nonce into raw bytes without failing the call.
///
/// Malformed input is logged and mapped to an empty byte vector, and the
/// attestation request proceeds with it — the platform then rejects the
/// request instead of the bridge. Failing fast here would change the
/// caller-visible contract, so the proceed-anyway behavior is kept even
/// though it defers the input error to a platform round-trip.
pub(crate) fn decode_nonce(nonce: &str) -> Vec<u8> {
    match base64::engine::general_purpose::STANDARD.decode(nonce) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "nonce is not valid base64 — proceeding with an empty nonce");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use attestgate_core::{AttestationResponse, RecaptchaTokenResponse};

    use super::*;
    use crate::settle::pending;

    /// Scripted platform service: returns canned outcomes and records the
    /// arguments each call forwarded.
    struct ScriptedService {
        availability: std::result::Result<(), PlatformError>,
        attest: std::result::Result<AttestationResponse, PlatformError>,
        recaptcha: std::result::Result<RecaptchaTokenResponse, PlatformError>,
        seen_attest: Mutex<Option<(Vec<u8>, String)>>,
        seen_recaptcha: Mutex<Option<String>>,
    }

    impl Default for ScriptedService {
        fn default() -> Self {
            Self {
                availability: Ok(()),
                attest: Ok(AttestationResponse {
                    jws_result: "abc.def.ghi".into(),
                }),
                recaptcha: Ok(RecaptchaTokenResponse {
                    token_result: "tok-xyz".into(),
                }),
                seen_attest: Mutex::new(None),
                seen_recaptcha: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl IntegrityService for ScriptedService {
        async fn check_availability(&self) -> std::result::Result<(), PlatformError> {
            self.availability.clone()
        }

        async fn attest(
            &self,
            nonce: &[u8],
            api_key: &str,
        ) -> std::result::Result<AttestationResponse, PlatformError> {
            *self.seen_attest.lock().unwrap() = Some((nonce.to_vec(), api_key.to_owned()));
            self.attest.clone()
        }

        async fn verify_with_recaptcha(
            &self,
            api_key: &str,
        ) -> std::result::Result<RecaptchaTokenResponse, PlatformError> {
            *self.seen_recaptcha.lock().unwrap() = Some(api_key.to_owned());
            self.recaptcha.clone()
        }
    }

    fn module_with(service: ScriptedService) -> (SafetyNetModule, Arc<ScriptedService>) {
        let service = Arc::new(service);
        let module = SafetyNetModule::new(
            HostContext::new("com.example.app"),
            Arc::clone(&service) as Arc<dyn IntegrityService>,
        );
        (module, service)
    }

    #[tokio::test]
    async fn availability_resolves_true() {
        let (module, _) = module_with(ScriptedService::default());
        assert_eq!(module.is_play_services_available().await, Ok(true));
    }

    #[tokio::test]
    async fn availability_failure_rejects_with_the_diagnostic() {
        let (module, _) = module_with(ScriptedService {
            availability: Err(PlatformError::Other(
                "Google Play services is out of date".into(),
            )),
            ..Default::default()
        });
        assert_eq!(
            module.is_play_services_available().await,
            Err(AttestgateError::Unavailable(
                "Google Play services is out of date".into()
            ))
        );
    }

    #[tokio::test]
    async fn attestation_forwards_decoded_nonce_and_api_key() {
        let (module, service) = module_with(ScriptedService::default());

        let result = module.send_attestation_request("bm9uY2U=", "key123").await;
        assert_eq!(result, Ok("abc.def.ghi".into()));

        let seen = service.seen_attest.lock().unwrap().clone().unwrap();
        assert_eq!(seen.0, b"nonce");
        assert_eq!(seen.1, "key123");
    }

    #[tokio::test]
    async fn structured_attestation_failure_keeps_the_code_message_pair() {
        let (module, _) = module_with(ScriptedService {
            attest: Err(PlatformError::Status {
                code: 7,
                message: "NETWORK_ERROR".into(),
            }),
            ..Default::default()
        });

        assert_eq!(
            module.send_attestation_request("bm9uY2U=", "key123").await,
            Err(AttestgateError::Api {
                code: "7".into(),
                message: "NETWORK_ERROR".into(),
            })
        );
    }

    #[tokio::test]
    async fn unstructured_attestation_failure_is_message_only() {
        let (module, _) = module_with(ScriptedService {
            attest: Err(PlatformError::Other("something broke".into())),
            ..Default::default()
        });

        assert_eq!(
            module.send_attestation_request("bm9uY2U=", "key123").await,
            Err(AttestgateError::Attestation("something broke".into()))
        );
    }

    #[tokio::test]
    async fn malformed_nonce_is_absorbed_and_the_call_proceeds() {
        let (module, service) = module_with(ScriptedService::default());

        let result = module
            .send_attestation_request("not-valid-base64!!!", "key123")
            .await;
        assert_eq!(result, Ok("abc.def.ghi".into()));

        let seen = service.seen_attest.lock().unwrap().clone().unwrap();
        assert!(seen.0.is_empty());
        assert_eq!(seen.1, "key123");
    }

    #[tokio::test]
    async fn recaptcha_resolves_with_the_token() {
        let (module, service) = module_with(ScriptedService::default());

        assert_eq!(
            module.verify_with_recaptcha("key123").await,
            Ok("tok-xyz".into())
        );
        assert_eq!(
            service.seen_recaptcha.lock().unwrap().clone(),
            Some("key123".into())
        );
    }

    #[tokio::test]
    async fn recaptcha_failure_forwards_the_raw_error() {
        let raw = PlatformError::Status {
            code: 12,
            message: "RECAPTCHA_INVALID_SITEKEY".into(),
        };
        let (module, _) = module_with(ScriptedService {
            recaptcha: Err(raw.clone()),
            ..Default::default()
        });

        // The raw platform error, not a restructured pair.
        assert_eq!(
            module.verify_with_recaptcha("key123").await,
            Err(AttestgateError::Recaptcha(raw))
        );
    }

    #[tokio::test]
    async fn dispatch_settles_each_known_method_exactly_once() {
        let (module, _) = module_with(ScriptedService::default());

        let (promise, call) = pending();
        module
            .dispatch("isPlayServicesAvailable", vec![], promise)
            .await;
        assert_eq!(call.await, Ok(BridgeValue::Bool(true)));

        let (promise, call) = pending();
        module
            .dispatch(
                "sendAttestationRequest",
                vec![json!("bm9uY2U="), json!("key123")],
                promise,
            )
            .await;
        assert_eq!(call.await, Ok(BridgeValue::String("abc.def.ghi".into())));

        let (promise, call) = pending();
        module
            .dispatch("verifyWithRecaptcha", vec![json!("key123")], promise)
            .await;
        assert_eq!(call.await, Ok(BridgeValue::String("tok-xyz".into())));
    }

    #[tokio::test]
    async fn dispatch_rejects_unknown_methods_and_bad_arguments() {
        let (module, _) = module_with(ScriptedService::default());

        let (promise, call) = pending();
        module.dispatch("selfDestruct", vec![], promise).await;
        assert!(matches!(call.await, Err(AttestgateError::Bridge(_))));

        // Non-string nonce argument.
        let (promise, call) = pending();
        module
            .dispatch(
                "sendAttestationRequest",
                vec![json!(42), json!("key123")],
                promise,
            )
            .await;
        assert!(matches!(call.await, Err(AttestgateError::Bridge(_))));

        // Missing api key.
        let (promise, call) = pending();
        module.dispatch("verifyWithRecaptcha", vec![], promise).await;
        assert!(matches!(call.await, Err(AttestgateError::Bridge(_))));
    }

    #[test]
    fn decode_nonce_handles_valid_and_malformed_input() {
        assert_eq!(decode_nonce("bm9uY2U="), b"nonce");
        assert_eq!(decode_nonce(""), Vec::<u8>::new());
        assert_eq!(decode_nonce("not-valid-base64!!!"), Vec::<u8>::new());
    }
}
