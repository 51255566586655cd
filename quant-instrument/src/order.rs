use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Monotonically increasing order id allocator, shared by every [`Order`]
/// constructed in the process. Mirrors the original's `threading.Lock`
/// around a plain counter; an `AtomicU64` gives the same guarantee without
/// a lock.
static NEXT_ORDER_ID: AtomicU64 = AtomicU64::new(1);

fn next_order_id() -> u64 {
    NEXT_ORDER_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// `+1` for `Buy`, `-1` for `Sell` — the sign convention the optimizer
    /// and TCA slippage calculation both use.
    pub fn sign(&self) -> Decimal {
        match self {
            OrderSide::Buy => Decimal::ONE,
            OrderSide::Sell => -Decimal::ONE,
        }
    }
}

/// Order lifecycle. A parent order transitions
/// `Pending -> Submitted -> {Partial -> Filled} | Cancelled | Rejected`;
/// `Partial` is only ever observed between child fills, never a resting
/// terminal state from the scheduler's perspective.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum OrderState {
    Pending,
    Submitted,
    Partial,
    Filled,
    Cancelled,
    Rejected,
}

impl OrderState {
    /// Whether this state can still receive fills or be cancelled. `false`
    /// for every terminal state (`Filled`, `Cancelled`, `Rejected`).
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            OrderState::Pending | OrderState::Submitted | OrderState::Partial
        )
    }
}

/// A parent order: the unit the caller (optimizer or a manual rebalance)
/// requests, sliced by the scheduler into [`ChildOrder`]s.
///
/// Keyed by `ticker` rather than `internal_id` since the broker boundary
/// (`submit_order`/`get_positions`) speaks ticker strings, not security
/// master identifiers — the scheduler never needs to resolve an id.
///
/// `state` and `filled_quantity` are lock-protected rather than plain
/// fields: the scheduler's background worker and a caller cancelling the
/// order from another thread both mutate them, and §5's concurrency
/// contract requires the check-and-submit sequence to hold a lock across
/// both the read of `is_active` and the subsequent write. Sharing an
/// `Arc<Order>` between the worker and the order book gives every holder
/// the same lock rather than a stale clone.
#[derive(Debug)]
pub struct Order {
    pub order_id: u64,
    pub ticker: SmolStr,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub created_at: DateTime<Utc>,
    mutable: Mutex<OrderMutable>,
}

#[derive(Debug, Clone, Copy)]
struct OrderMutable {
    filled_quantity: Decimal,
    state: OrderState,
}

impl Order {
    /// Allocates a fresh `order_id` from the process-wide counter.
    pub fn new(ticker: impl Into<SmolStr>, side: OrderSide, quantity: Decimal) -> Self {
        Self {
            order_id: next_order_id(),
            ticker: ticker.into(),
            side,
            quantity,
            created_at: Utc::now(),
            mutable: Mutex::new(OrderMutable {
                filled_quantity: Decimal::ZERO,
                state: OrderState::Pending,
            }),
        }
    }

    pub fn state(&self) -> OrderState {
        self.mutable.lock().state
    }

    pub fn filled_quantity(&self) -> Decimal {
        self.mutable.lock().filled_quantity
    }

    pub fn remaining_quantity(&self) -> Decimal {
        let m = self.mutable.lock();
        self.quantity - m.filled_quantity
    }

    pub fn is_active(&self) -> bool {
        self.mutable.lock().state.is_active()
    }

    /// Transitions `Pending`/`Submitted`/`Partial` to `Cancelled`. Returns
    /// `true` if this call performed the transition, `false` if the order
    /// was already terminal.
    pub fn cancel(&self) -> bool {
        let mut m = self.mutable.lock();
        if !m.state.is_active() {
            return false;
        }
        m.state = OrderState::Cancelled;
        true
    }

    /// Records a fill of `qty`, holding the lock across the
    /// read-modify-write so a concurrent cancellation cannot race it.
    /// A no-op if the order is already terminal (a cancelled order does
    /// not resurrect on a late fill report). Returns the resulting state.
    pub fn record_fill(&self, qty: Decimal) -> OrderState {
        let mut m = self.mutable.lock();
        if !m.state.is_active() {
            return m.state;
        }
        m.filled_quantity += qty;
        m.state = if m.filled_quantity >= self.quantity {
            OrderState::Filled
        } else {
            OrderState::Partial
        };
        m.state
    }

    /// Marks the order terminally rejected, e.g. after a broker refusal.
    /// A no-op if already terminal.
    pub fn reject(&self) {
        let mut m = self.mutable.lock();
        if m.state.is_active() {
            m.state = OrderState::Rejected;
        }
    }

    pub fn submit(&self) {
        let mut m = self.mutable.lock();
        if m.state == OrderState::Pending {
            m.state = OrderState::Submitted;
        }
    }
}

/// A slice of a parent [`Order`] scheduled for submission at
/// `scheduled_time`. Holds a non-owning [`Weak`] reference back to its
/// parent so a cancelled/dropped parent never keeps its children (or the
/// reverse) alive past their useful lifetime.
#[derive(Debug, Clone)]
pub struct ChildOrder {
    pub child_id: u64,
    pub parent: Weak<Order>,
    pub ticker: SmolStr,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub scheduled_time: DateTime<Utc>,
    pub state: OrderState,
}

impl ChildOrder {
    pub fn new(
        parent: &Arc<Order>,
        ticker: impl Into<SmolStr>,
        side: OrderSide,
        quantity: Decimal,
        scheduled_time: DateTime<Utc>,
    ) -> Self {
        Self {
            child_id: next_order_id(),
            parent: Arc::downgrade(parent),
            ticker: ticker.into(),
            side,
            quantity,
            scheduled_time,
            state: OrderState::Pending,
        }
    }
}
