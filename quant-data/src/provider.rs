use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quant_instrument::{CorporateActionKind, Timeframe};
use rust_decimal::Decimal;
use smol_str::SmolStr;
use std::sync::Arc;

/// One OHLCV row as returned by a [`DataProvider`], keyed by ticker rather
/// than `internal_id` — the provider is an external collaborator and has no
/// business knowing the platform's internal id allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct BarRow {
    pub ticker: SmolStr,
    pub timestamp: DateTime<Utc>,
    pub timeframe: Timeframe,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorporateActionRow {
    pub ticker: SmolStr,
    pub ex_date: DateTime<Utc>,
    pub kind: CorporateActionKind,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    pub ticker: SmolStr,
    pub timestamp: DateTime<Utc>,
    pub event_type: SmolStr,
    pub value: serde_json::Value,
}

/// External source of historical data, consumed by [`crate::DataPlatform::sync_data`]
/// during batch ingestion. Implementations (REST pull from a vendor, a CSV
/// loader, ...) live outside this workspace.
#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn fetch_bars(
        &self,
        tickers: &[SmolStr],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        timeframe: Timeframe,
    ) -> Vec<BarRow>;

    async fn fetch_corporate_actions(
        &self,
        tickers: &[SmolStr],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<CorporateActionRow>;

    async fn fetch_events(
        &self,
        tickers: &[SmolStr],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<EventRow>;
}

/// External live source, consumed by the platform in streaming/live mode.
/// The handler receives a ticker hint per bar; the platform resolves the
/// `internal_id` before persistence (§4.A `add_bars`).
#[async_trait]
pub trait StreamingProvider: Send + Sync {
    async fn subscribe(&self, tickers: &[SmolStr], handler: Arc<dyn Fn(BarRow) + Send + Sync>);
}
