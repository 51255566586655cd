use crate::provider::DataProvider;
use crate::{adjust, resample};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use quant_instrument::{Bar, CorporateAction, Event, InternalId, Security, Timeframe};
use rust_decimal::Decimal;
use serde_json::Value;
use smol_str::SmolStr;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// A bar as received at the write boundary, before its `internal_id` has
/// necessarily been resolved. Mirrors `add_bars`'s "sentinel id and a
/// ticker hint" case in §4.A: a live feed only knows the ticker, so the
/// platform resolves it before persistence.
#[derive(Debug, Clone)]
pub struct BarInput {
    pub internal_id: Option<InternalId>,
    pub ticker: Option<SmolStr>,
    pub timestamp: DateTime<Utc>,
    pub timeframe: Timeframe,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub timestamp_knowledge: Option<DateTime<Utc>>,
}

/// An event as received at the write boundary; resolved the same way as
/// [`BarInput`].
#[derive(Debug, Clone)]
pub struct EventInput {
    pub internal_id: Option<InternalId>,
    pub ticker: Option<SmolStr>,
    pub timestamp: DateTime<Utc>,
    pub event_type: SmolStr,
    pub value: Value,
    pub timestamp_knowledge: Option<DateTime<Utc>>,
}

/// The core bar query (§4.A `get_bars`). `as_of` defaults to "now" and
/// `adjust` defaults to `false` when not specified.
#[derive(Debug, Clone)]
pub struct BarQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub timeframe: Timeframe,
    pub as_of: Option<DateTime<Utc>>,
    pub adjust: bool,
}

/// Bitemporal, append-only storage of securities, bars, events and
/// corporate actions, with point-in-time correct reads.
///
/// Each logical table is guarded by its own [`RwLock`] so a writer to
/// `bars` never blocks a concurrent reader of `events`, matching the
/// "safe for concurrent readers while a writer holds a table-level write
/// lock" contract.
#[derive(Debug)]
pub struct DataPlatform {
    securities: RwLock<Vec<Security>>,
    corporate_actions: RwLock<Vec<CorporateAction>>,
    bars: RwLock<Vec<Bar>>,
    events: RwLock<Vec<Event>>,
    next_internal_id: AtomicU64,
    /// Optional write-time aggregation targets (§4.A "Aggregation on
    /// write"). Empty by default: nothing is materialized beyond what is
    /// written, and downstream reads fall back to on-read resampling.
    aggregation_targets: Vec<Timeframe>,
}

impl Default for DataPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl DataPlatform {
    /// `internal_id` allocation starts at `1000` (§4.A).
    const FIRST_INTERNAL_ID: u64 = 1000;

    pub fn new() -> Self {
        Self {
            securities: RwLock::new(Vec::new()),
            corporate_actions: RwLock::new(Vec::new()),
            bars: RwLock::new(Vec::new()),
            events: RwLock::new(Vec::new()),
            next_internal_id: AtomicU64::new(Self::FIRST_INTERNAL_ID),
            aggregation_targets: Vec::new(),
        }
    }

    /// Configures the set of timeframes materialized eagerly on every
    /// `add_bars` call, in addition to on-read resampling.
    pub fn with_aggregation_targets(mut self, targets: Vec<Timeframe>) -> Self {
        self.aggregation_targets = targets;
        self
    }

    fn mint_internal_id(&self) -> InternalId {
        InternalId(self.next_internal_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers `ticker`'s coverage over `[start, end]`. Returns the
    /// existing id if a record already covers the requested interval;
    /// otherwise mints and inserts a fresh one (§4.A).
    pub fn register_security(
        &self,
        ticker: impl Into<SmolStr>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        extra: Value,
    ) -> InternalId {
        let ticker = ticker.into();
        {
            let securities = self.securities.read();
            if let Some(existing) = securities
                .iter()
                .find(|s| s.ticker == ticker && s.start <= start && s.end >= end)
            {
                return existing.internal_id;
            }
        }

        let internal_id = self.mint_internal_id();
        let security = Security::new(internal_id, ticker.clone(), start, end, extra);
        debug!(%ticker, %internal_id, "registered new security");
        self.securities.write().push(security);
        internal_id
    }

    /// Returns the id whose coverage contains `date`; auto-registers with
    /// `start = end = date` if none does (§9 Open Question (a)).
    pub fn get_internal_id(&self, ticker: impl Into<SmolStr>, date: DateTime<Utc>) -> InternalId {
        let ticker = ticker.into();
        {
            let securities = self.securities.read();
            if let Some(existing) = securities
                .iter()
                .find(|s| s.ticker == ticker && s.covers(date))
            {
                return existing.internal_id;
            }
        }
        warn!(%ticker, %date, "no covering security, auto-registering");
        self.register_security(ticker, date, DateTime::<Utc>::MAX_UTC, Value::Null)
    }

    /// All ids whose coverage includes `date`.
    pub fn get_universe(&self, date: DateTime<Utc>) -> HashSet<InternalId> {
        self.securities
            .read()
            .iter()
            .filter(|s| s.covers(date))
            .map(|s| s.internal_id)
            .collect()
    }

    /// A read-only ticker lookup, the reverse of the security master —
    /// used by the execution scheduler's `rebalance` to translate
    /// ticker-keyed broker positions into `internal_id`-keyed goal diffs.
    pub fn reverse_ism(&self) -> HashMap<InternalId, SmolStr> {
        self.securities
            .read()
            .iter()
            .map(|s| (s.internal_id, s.ticker.clone()))
            .collect()
    }

    fn resolve_bar_id(&self, input: &BarInput) -> Option<InternalId> {
        match (input.internal_id, &input.ticker) {
            (Some(id), _) => Some(id),
            (None, Some(ticker)) => Some(self.get_internal_id(ticker.clone(), input.timestamp)),
            (None, None) => None,
        }
    }

    /// Validates and inserts each bar, dropping (and logging) any that
    /// fail OHLC sanity. Bars without an explicit `timestamp_knowledge`
    /// are stamped with the current time. Idempotent: re-inserting the
    /// same logical row is a no-op at read time via PIT dedup.
    pub fn add_bars(&self, inputs: Vec<BarInput>) {
        let now = Utc::now();
        let mut accepted = Vec::with_capacity(inputs.len());

        for input in inputs {
            let Some(internal_id) = self.resolve_bar_id(&input) else {
                warn!("dropping bar with neither internal_id nor ticker hint");
                continue;
            };

            let bar = Bar {
                internal_id,
                timestamp: input.timestamp,
                timeframe: input.timeframe,
                open: input.open,
                high: input.high,
                low: input.low,
                close: input.close,
                volume: input.volume,
                timestamp_knowledge: input.timestamp_knowledge.unwrap_or(now),
            };

            if !bar.is_valid() {
                warn!(%internal_id, timeframe = ?bar.timeframe, "dropped bar failing OHLC validation");
                continue;
            }

            accepted.push(bar);
        }

        if accepted.is_empty() {
            return;
        }

        self.bars.write().extend(accepted.iter().copied());

        for &target in &self.aggregation_targets {
            self.materialize_aggregate(&accepted, target);
        }
    }

    /// Eagerly aggregates `new_bars` up into `target`, re-querying the
    /// persisted minimum-timeframe window each time rather than relying
    /// on any in-memory running state — required for crash-recovery
    /// correctness (§4.A "Aggregation on write").
    fn materialize_aggregate(&self, new_bars: &[Bar], target: Timeframe) {
        if target == Timeframe::minimum() {
            return;
        }

        let ids: HashSet<InternalId> = new_bars.iter().map(|b| b.internal_id).collect();
        for id in ids {
            let source = self.read_source_window(id);
            let aggregated = resample::aggregate(&source, target);
            if !aggregated.is_empty() {
                self.bars.write().extend(aggregated);
            }
        }
    }

    /// Re-reads the persisted minimum-timeframe bars for `id` rather than
    /// tracking any running aggregate, so a crash between writes never
    /// leaves a partially materialized higher-timeframe bar.
    fn read_source_window(&self, id: InternalId) -> Vec<Bar> {
        let minimum = Timeframe::minimum();
        let rows: Vec<Bar> = self
            .bars
            .read()
            .iter()
            .filter(|b| b.internal_id == id && b.timeframe == minimum)
            .copied()
            .collect();
        pit_dedup(rows)
    }

    pub fn add_events(&self, inputs: Vec<EventInput>) {
        let now = Utc::now();
        let mut accepted = Vec::with_capacity(inputs.len());

        for input in inputs {
            let internal_id = match (input.internal_id, &input.ticker) {
                (Some(id), _) => id,
                (None, Some(ticker)) => self.get_internal_id(ticker.clone(), input.timestamp),
                (None, None) => {
                    warn!("dropping event with neither internal_id nor ticker hint");
                    continue;
                }
            };

            accepted.push(Event {
                internal_id,
                timestamp: input.timestamp,
                event_type: input.event_type,
                value: input.value,
                timestamp_knowledge: input.timestamp_knowledge.unwrap_or(now),
            });
        }

        self.events.write().extend(accepted);
    }

    pub fn add_ca(&self, actions: Vec<CorporateAction>) {
        self.corporate_actions.write().extend(actions);
    }

    /// The core query. Filters, resamples if necessary, dedups to the
    /// bitemporal projection, optionally adjusts for corporate actions,
    /// and returns the result sorted by `(internal_id, timestamp)`.
    pub fn get_bars(&self, ids: &[InternalId], query: BarQuery) -> Vec<Bar> {
        let as_of = query.as_of.unwrap_or_else(Utc::now);
        let id_set: HashSet<InternalId> = ids.iter().copied().collect();

        let mut rows: Vec<Bar> = self
            .bars
            .read()
            .iter()
            .filter(|b| {
                id_set.contains(&b.internal_id)
                    && b.timeframe == query.timeframe
                    && b.timestamp >= query.start
                    && b.timestamp <= query.end
                    && b.timestamp_knowledge <= as_of
            })
            .copied()
            .collect();

        if rows.is_empty() && query.timeframe.is_intraday() && query.timeframe != Timeframe::minimum() {
            let minimum = self.bars.read();
            let source: Vec<Bar> = minimum
                .iter()
                .filter(|b| {
                    id_set.contains(&b.internal_id)
                        && b.timeframe == Timeframe::minimum()
                        && b.timestamp >= query.start
                        && b.timestamp <= query.end
                        && b.timestamp_knowledge <= as_of
                })
                .copied()
                .collect();
            drop(minimum);
            let deduped = pit_dedup(source);
            rows = resample::aggregate(&deduped, query.timeframe);
        }

        let mut rows = pit_dedup(rows);

        if query.adjust {
            let actions = self.corporate_actions.read();
            for &id in ids {
                let id_actions: Vec<CorporateAction> = actions
                    .iter()
                    .filter(|ca| ca.internal_id == id)
                    .cloned()
                    .collect();
                let mut id_bars: Vec<Bar> = rows.iter().copied().filter(|b| b.internal_id == id).collect();
                adjust::adjust(&mut id_bars, &id_actions, query.end);
                for adjusted in id_bars {
                    if let Some(slot) = rows.iter_mut().find(|b| {
                        b.internal_id == adjusted.internal_id && b.timestamp == adjusted.timestamp
                    }) {
                        *slot = adjusted;
                    }
                }
            }
        }

        rows.sort_by_key(|b| (b.internal_id, b.timestamp));
        rows
    }

    /// Same bitemporal projection as `get_bars`, for events.
    pub fn get_events(
        &self,
        ids: &[InternalId],
        types: Option<&[SmolStr]>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        as_of: Option<DateTime<Utc>>,
    ) -> Vec<Event> {
        let as_of = as_of.unwrap_or_else(Utc::now);
        let id_set: HashSet<InternalId> = ids.iter().copied().collect();

        let rows: Vec<Event> = self
            .events
            .read()
            .iter()
            .filter(|e| {
                id_set.contains(&e.internal_id)
                    && e.timestamp_knowledge <= as_of
                    && start.is_none_or(|s| e.timestamp >= s)
                    && end.is_none_or(|en| e.timestamp <= en)
                    && types.is_none_or(|ts| ts.iter().any(|t| t == &e.event_type))
            })
            .cloned()
            .collect();

        let mut deduped = pit_dedup_events(rows);
        deduped.sort_by_key(|e| (e.internal_id, e.timestamp));
        deduped
    }

    /// Pulls historical bars, corporate actions and events for `tickers`
    /// from an external `provider` and writes them in, resolving ids by
    /// ticker as it goes (§4.A, §6 Data provider).
    pub async fn sync_data(
        &self,
        provider: &dyn DataProvider,
        tickers: &[SmolStr],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        timeframe: Timeframe,
    ) {
        let bar_rows = provider.fetch_bars(tickers, start, end, timeframe).await;
        let bar_inputs = bar_rows
            .into_iter()
            .map(|row| BarInput {
                internal_id: None,
                ticker: Some(row.ticker),
                timestamp: row.timestamp,
                timeframe: row.timeframe,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
                timestamp_knowledge: None,
            })
            .collect();
        self.add_bars(bar_inputs);

        let ca_rows = provider.fetch_corporate_actions(tickers, start, end).await;
        let mut ca_inputs = Vec::with_capacity(ca_rows.len());
        for row in ca_rows {
            let internal_id = self.get_internal_id(row.ticker, row.ex_date);
            ca_inputs.push(CorporateAction::new(internal_id, row.ex_date, row.kind, row.value));
        }
        self.add_ca(ca_inputs);

        let event_rows = provider.fetch_events(tickers, start, end).await;
        let event_inputs = event_rows
            .into_iter()
            .map(|row| EventInput {
                internal_id: None,
                ticker: Some(row.ticker),
                timestamp: row.timestamp,
                event_type: row.event_type,
                value: row.value,
                timestamp_knowledge: None,
            })
            .collect();
        self.add_events(event_inputs);
    }
}

/// Keeps, within each `(internal_id, timestamp, timeframe)` group, only the
/// row with the greatest `timestamp_knowledge` — the bitemporal projection
/// shared by `get_bars` and the on-read aggregation path.
fn pit_dedup(bars: Vec<Bar>) -> Vec<Bar> {
    let mut latest: HashMap<(InternalId, DateTime<Utc>, Timeframe), Bar> = HashMap::new();
    for bar in bars {
        let key = (bar.internal_id, bar.timestamp, bar.timeframe);
        match latest.get(&key) {
            Some(existing) if existing.timestamp_knowledge >= bar.timestamp_knowledge => {}
            _ => {
                latest.insert(key, bar);
            }
        }
    }
    latest.into_values().collect()
}

fn pit_dedup_events(events: Vec<Event>) -> Vec<Event> {
    let mut latest: HashMap<(InternalId, DateTime<Utc>, SmolStr), Event> = HashMap::new();
    for event in events {
        let key = (event.internal_id, event.timestamp, event.event_type.clone());
        match latest.get(&key) {
            Some(existing) if existing.timestamp_knowledge >= event.timestamp_knowledge => {}
            _ => {
                latest.insert(key, event);
            }
        }
    }
    latest.into_values().collect()
}
