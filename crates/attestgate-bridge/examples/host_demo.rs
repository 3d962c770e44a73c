// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Wiring demo: register the bridge package into a module registry and drive
// the three operations the way a host runtime would. On desktop this runs
// against the stub service, so attestation calls settle as rejections.

use std::sync::Arc;

use serde_json::json;

use attestgate_bridge::module::MODULE_NAME;
use attestgate_bridge::{
    BridgePackage, HostContext, ModuleRegistry, platform_service, rejection_payload,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("attestgate host demo starting");

    let package = BridgePackage::new(
        HostContext::new("com.example.hostdemo"),
        platform_service(),
    );
    let mut registry = ModuleRegistry::new();
    package.register_into(&mut registry);

    let calls = [
        ("isPlayServicesAvailable", vec![]),
        (
            "sendAttestationRequest",
            vec![json!("bm9uY2U="), json!("demo-api-key")],
        ),
        ("verifyWithRecaptcha", vec![json!("demo-api-key")]),
    ];

    for (method, args) in calls {
        match registry.call(MODULE_NAME, method, args).await {
            Ok(value) => println!("{method}: resolved {value:?}"),
            Err(err) => println!("{method}: rejected {}", rejection_payload(&err)),
        }
    }
}
