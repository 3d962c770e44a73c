// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Android integrity service via JNI.
//
// Requires the Android NDK and targets `aarch64-linux-android` or
// `armv7-linux-androideabi`. Each trait method invokes the corresponding
// Google Play services API through JNI calls into the ART runtime.
//
// ## Architecture notes
//
// The availability probe completes synchronously. Attestation and reCAPTCHA
// return a `Task` on the Java side; we resolve it with the blocking
// `Tasks.await` helper inside `spawn_blocking` so no async worker thread is
// tied up. A failed task raises an `ExecutionException` whose cause is the
// real API error; `ApiException` causes are decomposed into a structured
// status, everything else is forwarded as a bare message.

#![cfg(target_os = "android")]

use jni::JNIEnv;
use jni::objects::{JObject, JString, JValue};

use async_trait::async_trait;

use attestgate_core::{AttestationResponse, PlatformError, RecaptchaTokenResponse};

use crate::service::IntegrityService;

// ---------------------------------------------------------------------------
// JNI bootstrap helpers
// ---------------------------------------------------------------------------

const GOOGLE_API_AVAILABILITY: &str = "com/google/android/gms/common/GoogleApiAvailability";
const SAFETY_NET: &str = "com/google/android/gms/safetynet/SafetyNet";
const TASKS: &str = "com/google/android/gms/tasks/Tasks";
const API_EXCEPTION: &str = "com/google/android/gms/common/api/ApiException";

/// `ConnectionResult.SUCCESS`.
const CONNECTION_SUCCESS: i32 = 0;

/// Obtain a [`JNIEnv`] handle from the global Android context.
///
/// Calls `ndk_context::android_context()` to retrieve the `JavaVM*` pointer
/// set by the NDK glue code, then attaches the current thread if it is not
/// already attached.
fn jni_env() -> Result<JNIEnv<'static>, PlatformError> {
    let ctx = ndk_context::android_context();
    // SAFETY: `ctx.vm()` returns the `JavaVM*` set by the NDK glue code.
    // The pointer is guaranteed valid for the lifetime of the process.
    let vm = unsafe { jni::JavaVM::from_raw(ctx.vm().cast()) }
        .map_err(|e| PlatformError::Other(format!("failed to obtain JavaVM: {e}")))?;
    vm.attach_current_thread()
        .map_err(|e| PlatformError::Other(format!("failed to attach JNI thread: {e}")))
}

/// Obtain the hosting application `Context` as a [`JObject`].
fn app_context() -> Result<JObject<'static>, PlatformError> {
    let ctx = ndk_context::android_context();
    let ptr = ctx.context();
    if ptr.is_null() {
        return Err(PlatformError::Other(
            "Android context is null — native activity not initialised".into(),
        ));
    }
    // SAFETY: the NDK guarantees this pointer is a valid global jobject for
    // the hosting Activity.
    Ok(unsafe { JObject::from_raw(ptr.cast()) })
}

/// Convenience: map any `jni::errors::Error` into `PlatformError::Other`.
fn jni_err(context: &str, e: jni::errors::Error) -> PlatformError {
    PlatformError::Other(format!("{context}: {e}"))
}

/// Convert a Java string object into a Rust `String`; null maps to empty.
fn string_of(env: &mut JNIEnv<'_>, obj: JObject<'_>, context: &str) -> Result<String, PlatformError> {
    if obj.is_null() {
        return Ok(String::new());
    }
    Ok(env
        .get_string(&JString::from(obj))
        .map_err(|e| jni_err(context, e))?
        .into())
}

/// Decompose the pending Java exception left by a failed `Tasks.await`.
///
/// The failure arrives as an `ExecutionException` wrapping the API error;
/// an `ApiException` cause becomes `Status { code, message }`, anything else
/// becomes `Other(message)`.
fn task_failure(env: &mut JNIEnv<'_>) -> PlatformError {
    let Ok(thrown) = env.exception_occurred() else {
        return PlatformError::Other("platform task failed with no pending exception".into());
    };
    let _ = env.exception_clear();

    let thrown = JObject::from(thrown);
    let cause = env
        .call_method(&thrown, "getCause", "()Ljava/lang/Throwable;", &[])
        .and_then(|v| v.l())
        .unwrap_or(JObject::null());
    let target = if cause.is_null() { thrown } else { cause };

    let is_api_exception = env.is_instance_of(&target, API_EXCEPTION).unwrap_or(false);
    if is_api_exception {
        let code = env
            .call_method(&target, "getStatusCode", "()I", &[])
            .and_then(|v| v.i())
            .unwrap_or(-1);
        let message = env
            .call_method(&target, "getStatusMessage", "()Ljava/lang/String;", &[])
            .and_then(|v| v.l())
            .ok()
            .and_then(|obj| string_of(env, obj, "getStatusMessage").ok())
            .unwrap_or_default();
        PlatformError::Status { code, message }
    } else {
        let message = env
            .call_method(&target, "getMessage", "()Ljava/lang/String;", &[])
            .and_then(|v| v.l())
            .ok()
            .and_then(|obj| string_of(env, obj, "getMessage").ok())
            .unwrap_or_else(|| "unknown platform failure".into());
        PlatformError::Other(message)
    }
}

/// `SafetyNet.getClient(context)`.
fn safetynet_client<'a>(
    env: &mut JNIEnv<'a>,
    context: &JObject<'_>,
) -> Result<JObject<'a>, PlatformError> {
    env.call_static_method(
        SAFETY_NET,
        "getClient",
        "(Landroid/content/Context;)Lcom/google/android/gms/safetynet/SafetyNetClient;",
        &[JValue::Object(context)],
    )
    .map_err(|e| jni_err("SafetyNet.getClient", e))?
    .l()
    .map_err(|e| jni_err("getClient->l", e))
}

/// Block on a Play services `Task` and return its result object.
fn await_task<'a>(env: &mut JNIEnv<'a>, task: &JObject<'_>) -> Result<JObject<'a>, PlatformError> {
    match env.call_static_method(
        TASKS,
        "await",
        "(Lcom/google/android/gms/tasks/Task;)Ljava/lang/Object;",
        &[JValue::Object(task)],
    ) {
        Ok(value) => value.l().map_err(|e| jni_err("Tasks.await->l", e)),
        Err(jni::errors::Error::JavaException) => Err(task_failure(env)),
        Err(e) => Err(jni_err("Tasks.await", e)),
    }
}

// ---------------------------------------------------------------------------
// Service implementation
// ---------------------------------------------------------------------------

/// Android implementation of the integrity service.
///
/// The struct is zero-sized; all state lives on the Java side. JNI is only
/// touched lazily, when a trait method is invoked.
pub struct AndroidIntegrityService;

impl AndroidIntegrityService {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AndroidIntegrityService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntegrityService for AndroidIntegrityService {
    /// `GoogleApiAvailability.getInstance().isGooglePlayServicesAvailable(ctx)`.
    ///
    /// Synchronous on the Java side; no task to await.
    async fn check_availability(&self) -> Result<(), PlatformError> {
        tokio::task::spawn_blocking(|| {
            let mut env = jni_env()?;
            let context = app_context()?;

            let availability: JObject = env
                .call_static_method(
                    GOOGLE_API_AVAILABILITY,
                    "getInstance",
                    "()Lcom/google/android/gms/common/GoogleApiAvailability;",
                    &[],
                )
                .map_err(|e| jni_err("GoogleApiAvailability.getInstance", e))?
                .l()
                .map_err(|e| jni_err("getInstance->l", e))?;

            let code = env
                .call_method(
                    &availability,
                    "isGooglePlayServicesAvailable",
                    "(Landroid/content/Context;)I",
                    &[JValue::Object(&context)],
                )
                .map_err(|e| jni_err("isGooglePlayServicesAvailable", e))?
                .i()
                .map_err(|e| jni_err("isGooglePlayServicesAvailable->i", e))?;

            if code == CONNECTION_SUCCESS {
                tracing::debug!("Android: Google Play services available");
                return Ok(());
            }

            let message_obj = env
                .call_method(
                    &availability,
                    "getErrorString",
                    "(I)Ljava/lang/String;",
                    &[JValue::Int(code)],
                )
                .map_err(|e| jni_err("getErrorString", e))?
                .l()
                .map_err(|e| jni_err("getErrorString->l", e))?;
            let message = string_of(&mut env, message_obj, "getErrorString")?;

            tracing::warn!(code, message = %message, "Android: Play services unavailable");
            Err(PlatformError::Other(message))
        })
        .await
        .map_err(|e| PlatformError::Other(format!("availability worker failed: {e}")))?
    }

    /// `SafetyNet.getClient(ctx).attest(nonce, apiKey)` resolved with
    /// `Tasks.await`.
    async fn attest(
        &self,
        nonce: &[u8],
        api_key: &str,
    ) -> Result<AttestationResponse, PlatformError> {
        let nonce = nonce.to_vec();
        let api_key = api_key.to_owned();

        tokio::task::spawn_blocking(move || {
            let mut env = jni_env()?;
            let context = app_context()?;
            let client = safetynet_client(&mut env, &context)?;

            let j_nonce = env
                .byte_array_from_slice(&nonce)
                .map_err(|e| jni_err("byte_array_from_slice(nonce)", e))?;
            let j_api_key: JString = env
                .new_string(&api_key)
                .map_err(|e| jni_err("new_string(api_key)", e))?;

            tracing::info!(nonce_len = nonce.len(), "Android: sending attestation request");

            let task: JObject = env
                .call_method(
                    &client,
                    "attest",
                    "([BLjava/lang/String;)Lcom/google/android/gms/tasks/Task;",
                    &[JValue::Object(&j_nonce), JValue::Object(&j_api_key)],
                )
                .map_err(|e| jni_err("SafetyNetClient.attest", e))?
                .l()
                .map_err(|e| jni_err("attest->l", e))?;

            let response = await_task(&mut env, &task)?;

            let jws_obj = env
                .call_method(&response, "getJwsResult", "()Ljava/lang/String;", &[])
                .map_err(|e| jni_err("getJwsResult", e))?
                .l()
                .map_err(|e| jni_err("getJwsResult->l", e))?;
            let jws_result = string_of(&mut env, jws_obj, "getJwsResult")?;

            tracing::info!("Android: attestation response received");
            Ok(AttestationResponse { jws_result })
        })
        .await
        .map_err(|e| PlatformError::Other(format!("attestation worker failed: {e}")))?
    }

    /// `SafetyNet.getClient(ctx).verifyWithRecaptcha(apiKey)` resolved with
    /// `Tasks.await`.
    async fn verify_with_recaptcha(
        &self,
        api_key: &str,
    ) -> Result<RecaptchaTokenResponse, PlatformError> {
        let api_key = api_key.to_owned();

        tokio::task::spawn_blocking(move || {
            let mut env = jni_env()?;
            let context = app_context()?;
            let client = safetynet_client(&mut env, &context)?;

            let j_api_key: JString = env
                .new_string(&api_key)
                .map_err(|e| jni_err("new_string(api_key)", e))?;

            tracing::info!("Android: starting reCAPTCHA verification");

            let task: JObject = env
                .call_method(
                    &client,
                    "verifyWithRecaptcha",
                    "(Ljava/lang/String;)Lcom/google/android/gms/tasks/Task;",
                    &[JValue::Object(&j_api_key)],
                )
                .map_err(|e| jni_err("SafetyNetClient.verifyWithRecaptcha", e))?
                .l()
                .map_err(|e| jni_err("verifyWithRecaptcha->l", e))?;

            let response = await_task(&mut env, &task)?;

            let token_obj = env
                .call_method(&response, "getTokenResult", "()Ljava/lang/String;", &[])
                .map_err(|e| jni_err("getTokenResult", e))?
                .l()
                .map_err(|e| jni_err("getTokenResult->l", e))?;
            let token_result = string_of(&mut env, token_obj, "getTokenResult")?;

            tracing::info!("Android: reCAPTCHA token received");
            Ok(RecaptchaTokenResponse { token_result })
        })
        .await
        .map_err(|e| PlatformError::Other(format!("reCAPTCHA worker failed: {e}")))?
    }
}
