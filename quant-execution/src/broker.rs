use async_trait::async_trait;
use quant_instrument::OrderSide;
use rust_decimal::Decimal;
use smol_str::SmolStr;
use std::collections::HashMap;

/// External trading venue, consumed by the [`Scheduler`](crate::Scheduler)
/// and owned outside this workspace (`spec.md` §6 / §1 — broker adapters
/// are a collaborator, not core scope). Every method that can fail at the
/// venue surfaces that failure as a plain `bool`/empty-map return, never an
/// `Err`: `submit_order` returning `false` is the sole `BrokerFailure`
/// signal the core ever observes.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Submits a single child-order-sized request. `true` means the broker
    /// accepted and filled it; `false` means rejected.
    async fn submit_order(&self, ticker: &str, qty: Decimal, side: OrderSide) -> bool;

    /// Current book positions, keyed by ticker. Share count, signed by
    /// side (long positive, short negative).
    async fn get_positions(&self) -> HashMap<SmolStr, Decimal>;

    /// Latest known price per requested ticker. Tickers the broker has no
    /// quote for are simply absent from the result.
    async fn get_prices(&self, tickers: &[SmolStr]) -> HashMap<SmolStr, Decimal>;
}
