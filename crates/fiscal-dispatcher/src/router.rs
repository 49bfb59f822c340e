//! # Router
//!
//! Pure regime classification plus adapter construction. The decision
//! depends only on the operator override, the buyer kind, and the grand
//! total, so rerouting the same invoice always lands on the same regime.

use std::sync::Arc;

use fiscal_gateway::ports::outbound::{Clock, Transport};
use fiscal_gateway::{RegimeAdapter, RetailAdapter, WholesaleAdapter};
use fiscal_types::{
    BuyerKind, FiscalError, InvoiceView, Mode, Regime, RegimeSelector, TenantConfig,
};
use rust_decimal::Decimal;

/// Routing outcome: which regime applies and whether the sandbox stands in
/// for the real endpoint. The regime tag is preserved even when sandboxed
/// so observability keeps the true classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub regime: Regime,
    pub sandbox: bool,
}

/// Classifies an invoice into a regime.
///
/// Decision order: operator override, then buyer kind, then the monetary
/// threshold upgrade (natural persons only).
pub fn decide_regime(
    invoice: &InvoiceView,
    selector: RegimeSelector,
    wholesale_threshold: Decimal,
) -> Regime {
    match selector {
        RegimeSelector::ForceF1 => Regime::RetailF1,
        RegimeSelector::ForceF2 => Regime::WholesaleF2,
        RegimeSelector::Auto | RegimeSelector::SandboxOnly => match invoice.buyer_kind {
            BuyerKind::LegalEntity => Regime::WholesaleF2,
            BuyerKind::NaturalPerson => {
                if invoice.grand_total() > wholesale_threshold {
                    Regime::WholesaleF2
                } else {
                    Regime::RetailF1
                }
            }
        },
    }
}

/// Routes an invoice under a tenant configuration.
///
/// The sandbox substitutes for the real endpoint when the tenant runs in
/// sandbox mode, is pinned to sandbox-only, or lacks credentials for the
/// routed regime. An unsigned or unauthenticated submission therefore never
/// reaches a production endpoint.
pub fn route(
    invoice: &InvoiceView,
    config: &TenantConfig,
    wholesale_threshold: Decimal,
) -> Route {
    let regime = decide_regime(invoice, config.selector, wholesale_threshold);
    route_for_regime(regime, config)
}

/// Route for an already-decided regime, as used by workers replaying a
/// stored payload: the regime is fixed by the payload snapshot, only the
/// sandbox substitution is re-evaluated against the fresh configuration.
pub fn route_for_regime(regime: Regime, config: &TenantConfig) -> Route {
    let sandbox = config.mode == Mode::Sandbox
        || config.selector == RegimeSelector::SandboxOnly
        || !config.is_configured_for(regime);
    Route { regime, sandbox }
}

/// Builds the adapter variant for a route.
///
/// A sandboxed route forces the adapter into sandbox mode even when the
/// tenant record says production, so missing credentials degrade to stubbed
/// submissions rather than unsigned wire traffic.
pub fn build_adapter(
    route: Route,
    config: &TenantConfig,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
) -> Result<RegimeAdapter, FiscalError> {
    let mut effective = config.clone();
    if route.sandbox {
        effective.mode = Mode::Sandbox;
    }
    match route.regime {
        Regime::RetailF1 => {
            RetailAdapter::new(effective, transport, clock).map(RegimeAdapter::Retail)
        }
        Regime::WholesaleF2 => {
            WholesaleAdapter::new(effective, transport, clock).map(RegimeAdapter::Wholesale)
        }
    }
}
