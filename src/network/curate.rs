use tracing::debug;

use crate::error::{Error, Result};
use crate::network::types::{InterfaceConfig, InterfaceSpec, NamespaceRequest};

/// Resolve each requested attachment into a concrete interface config.
///
/// Output order matches input order. An interface asking for namespace
/// auto-resolution takes `global_namespace`; if none is available that is a
/// configuration error, not something to retry.
pub fn curate_interfaces(
    specs: &[InterfaceSpec],
    global_namespace: Option<&str>,
) -> Result<Vec<InterfaceConfig>> {
    specs
        .iter()
        .map(|spec| {
            let namespace = match &spec.namespace {
                NamespaceRequest::Auto => match global_namespace {
                    Some(ns) => Some(ns.to_string()),
                    None => return Err(Error::NamespaceResolution(spec.name.clone())),
                },
                NamespaceRequest::Named(ns) => Some(ns.clone()),
                NamespaceRequest::Unset => None,
            };

            debug!(interface = %spec.name, namespace = ?namespace, "curated interface");

            Ok(InterfaceConfig {
                name: spec.name.clone(),
                namespace,
                bridge: spec.bridge.clone(),
            })
        })
        .collect()
}
