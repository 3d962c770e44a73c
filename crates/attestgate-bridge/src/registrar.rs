// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Declarative registration of the bridge with the host runtime.
//
// The package contributes exactly one native module and no view components.
// It carries no logic and is consulted once, at application startup.

use std::sync::Arc;

use crate::host::{HostContext, ModuleRegistry, NativeModule};
use crate::module::SafetyNetModule;
use crate::service::IntegrityService;

/// Placeholder for host-runtime UI component factories.
///
/// This package never contributes any; the type exists so the registration
/// record can declare the empty set explicitly.
#[derive(Debug, Clone, Copy)]
pub struct ViewManager;

/// Registration record advertising the SafetyNet bridge to the host runtime.
pub struct BridgePackage {
    ctx: HostContext,
    service: Arc<dyn IntegrityService>,
}

impl BridgePackage {
    pub fn new(ctx: HostContext, service: Arc<dyn IntegrityService>) -> Self {
        Self { ctx, service }
    }

    /// The native modules this package contributes: the SafetyNet module and
    /// nothing else.
    pub fn native_modules(&self) -> Vec<Arc<dyn NativeModule>> {
        vec![Arc::new(SafetyNetModule::new(
            self.ctx.clone(),
            Arc::clone(&self.service),
        ))]
    }

    /// The UI components this package contributes: none.
    pub fn view_managers(&self) -> Vec<ViewManager> {
        Vec::new()
    }

    /// Install every contributed module into `registry`.
    pub fn register_into(&self, registry: &mut ModuleRegistry) {
        for module in self.native_modules() {
            registry.register(module);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::module::MODULE_NAME;
    use crate::stub::StubIntegrityService;

    fn package() -> BridgePackage {
        BridgePackage::new(
            HostContext::new("com.example.app"),
            Arc::new(StubIntegrityService),
        )
    }

    #[test]
    fn contributes_one_module_and_no_view_managers() {
        let package = package();
        let modules = package.native_modules();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].name(), MODULE_NAME);
        assert!(package.view_managers().is_empty());
    }

    #[tokio::test]
    async fn registered_module_is_callable_through_the_registry() {
        let mut registry = ModuleRegistry::new();
        package().register_into(&mut registry);
        assert_eq!(registry.module_names(), vec![MODULE_NAME]);

        // The stub rejects attestation, but the call must still settle.
        let result = registry
            .call(
                MODULE_NAME,
                "sendAttestationRequest",
                vec![json!("bm9uY2U="), json!("key123")],
            )
            .await;
        assert!(result.is_err());
    }
}
