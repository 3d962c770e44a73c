// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Host-runtime surface: the ambient application context, the callable-module
// contract, and the registry the host dispatches named calls through.
//
// This is the smallest model of the hosting runtime the bridge needs: modules
// are looked up by name, methods by string, arguments arrive as JSON values,
// and every call settles through a `Promise` exactly once.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use attestgate_core::{AttestgateError, BridgeValue};

use crate::settle::{PendingCall, Promise, pending};

/// Ambient application context supplied by the host runtime.
///
/// Captured once at module construction and read-only afterwards; the host
/// owns its lifecycle.
#[derive(Debug, Clone)]
pub struct HostContext {
    /// Application package identifier, used for diagnostics only.
    pub package_name: String,
}

impl HostContext {
    pub fn new(package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
        }
    }
}

/// A native module callable from application code.
#[async_trait]
pub trait NativeModule: Send + Sync {
    /// Name the module is registered under.
    fn name(&self) -> &str;

    /// Dispatch a named method with positional arguments.
    ///
    /// Implementations must settle `promise` exactly once on every path,
    /// including unknown methods and malformed arguments.
    async fn dispatch(&self, method: &str, args: Vec<Value>, promise: Promise<BridgeValue>);
}

/// Name-keyed table of the native modules the host runtime can call.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<dyn NativeModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module under its own name. A later registration under the
    /// same name replaces the earlier one.
    pub fn register(&mut self, module: Arc<dyn NativeModule>) {
        debug!(module = module.name(), "registering native module");
        self.modules.insert(module.name().to_owned(), module);
    }

    /// Names of all registered modules.
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.keys().map(String::as_str).collect()
    }

    /// Issue a call against a registered module and return the pending
    /// settlement.
    ///
    /// The dispatch runs as its own task; the returned future completes when
    /// the module settles. An unknown module rejects immediately.
    pub fn call(&self, module: &str, method: &str, args: Vec<Value>) -> PendingCall<BridgeValue> {
        let (promise, call) = pending();
        match self.modules.get(module) {
            Some(m) => {
                let m = Arc::clone(m);
                let method = method.to_owned();
                tokio::spawn(async move {
                    m.dispatch(&method, args, promise).await;
                });
            }
            None => {
                promise.reject(AttestgateError::Bridge(format!(
                    "no module registered under '{module}'"
                )));
            }
        }
        call
    }
}

/// The JSON shape a rejection crosses the host boundary with.
///
/// Structured attestation failures keep their (code, message) pairing;
/// everything else carries a message only, with reCAPTCHA failures rendering
/// the raw platform error.
pub fn rejection_payload(err: &AttestgateError) -> Value {
    match err {
        AttestgateError::Api { code, message } => json!({ "code": code, "message": message }),
        other => json!({ "message": other.to_string() }),
    }
}
