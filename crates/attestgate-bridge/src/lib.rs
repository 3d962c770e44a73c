// SPDX-License-Identifier: PMPL-1.0-or-later
//
// attestgate — SafetyNet bridge module for a cross-platform host runtime.
//
// The bridge translates three application-facing operations (Play services
// availability, attestation nonce signing, reCAPTCHA verification) into calls
// against the platform integrity capability and normalizes every outcome
// into a single resolve-or-reject settlement. The capability itself lives
// behind the `IntegrityService` trait: Android gets the real Play services
// client, every other platform a stub that reports unavailability.

use std::sync::Arc;

pub mod host;
pub mod module;
pub mod registrar;
pub mod service;
pub mod settle;
pub mod stub;

#[cfg(target_os = "android")]
pub mod android;

pub use host::{HostContext, ModuleRegistry, NativeModule, rejection_payload};
pub use module::SafetyNetModule;
pub use registrar::{BridgePackage, ViewManager};
pub use service::IntegrityService;
pub use settle::{PendingCall, Promise, pending};

/// Retrieves the integrity service implementation for the target operating
/// system.
pub fn platform_service() -> Arc<dyn IntegrityService> {
    #[cfg(target_os = "android")]
    {
        // Android: real Play services client via JNI into ART.
        Arc::new(android::AndroidIntegrityService::new())
    }
    #[cfg(not(target_os = "android"))]
    {
        // Everything else: Play services does not exist here, so every call
        // reports the platform diagnostic.
        Arc::new(stub::StubIntegrityService)
    }
}
