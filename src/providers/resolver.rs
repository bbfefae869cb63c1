//! Execution Order Resolver
//!
//! Decides which provider is attempted first and what the cascade falls back to.

use super::{ProviderDescriptor, ProviderKind};

/// Resolve the order in which providers are attempted
///
/// A non-empty explicit order wins outright, even if it names disabled or
/// unregistered providers; the engine skips what it cannot resolve.
/// Otherwise enabled descriptors are sorted by priority, highest first,
/// keeping their relative order on ties. An empty result means no AI.
pub fn resolve_execution_order(
    providers: &[ProviderDescriptor],
    explicit_order: Option<&[ProviderKind]>,
) -> Vec<ProviderKind> {
    if let Some(order) = explicit_order.filter(|o| !o.is_empty()) {
        tracing::debug!(order = ?order, "Using explicit execution order");
        return order.to_vec();
    }

    let mut enabled: Vec<&ProviderDescriptor> = providers.iter().filter(|p| p.enabled).collect();
    // sort_by is stable
    enabled.sort_by(|a, b| b.priority.cmp(&a.priority));

    let order: Vec<ProviderKind> = enabled.into_iter().map(|p| p.kind).collect();
    tracing::debug!(order = ?order, "Resolved execution order from priorities");
    order
}
