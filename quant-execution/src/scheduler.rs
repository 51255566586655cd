use crate::Broker;
use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use quant_instrument::{ChildOrder, Order, OrderSide};
use rust_decimal::Decimal;
use smol_str::SmolStr;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How often the background worker wakes to check for due children
/// (`spec.md` §4.D step 1: "sleep a bounded interval (≈100 ms)").
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// `rebalance` has no `slices` parameter of its own; it forwards to
/// `vwap_execute` with this count, matching
/// `examples/original_source/src/core/execution_handler.py`'s
/// `vwap_execute(..., slices: int = 5, ...)` default.
const REBALANCE_SLICES: u32 = 5;

/// A goal-position diff smaller than this (in shares) is not worth
/// trading (`spec.md` §4.D `rebalance` step 3, ε fixed at 0.1 share).
const REBALANCE_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Parent/child order book plus the background worker's due-child queue,
/// shared between the `Scheduler` handle the driver holds and the spawned
/// worker task. One [`Mutex`] per table, matching `quant-data`'s
/// per-table-lock shape: cancellation only ever touches `orders`, the
/// worker only ever touches `queue` plus whatever single `Order` it is
/// currently firing.
#[derive(Debug, Default)]
struct Book {
    orders: Mutex<HashMap<u64, Arc<Order>>>,
    queue: Mutex<Vec<ChildOrder>>,
}

/// The Execution Scheduler (`spec.md` §4.D): slices parent orders into
/// time-spaced child orders, fires them from a single background worker,
/// and supports cancellation and goal-position rebalancing.
///
/// Cloning a `Scheduler` is cheap and shares the same order book and
/// queue — the clone handed to `spawn`'s worker task and the handle kept
/// by the driver are two views of one scheduler, exactly as `spec.md` §5
/// describes the driver and the worker as two concurrency points over
/// shared state.
pub struct Scheduler<B> {
    broker: Arc<B>,
    book: Arc<Book>,
}

impl<B> Clone for Scheduler<B> {
    fn clone(&self) -> Self {
        Self { broker: Arc::clone(&self.broker), book: Arc::clone(&self.book) }
    }
}

impl<B> std::fmt::Debug for Scheduler<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler").field("book", &self.book).finish_non_exhaustive()
    }
}

impl<B> Scheduler<B>
where
    B: Broker + Send + Sync + 'static,
{
    /// Takes the broker by `Arc` rather than by value so a caller that
    /// needs to assert against the broker's observed state (a test's mock,
    /// a live driver's metrics hook) keeps its own handle.
    pub fn new(broker: Arc<B>) -> Self {
        Self {
            broker,
            book: Arc::new(Book::default()),
        }
    }

    /// The broker this scheduler submits against — exposed so a driver can
    /// fetch `get_prices`/`get_positions` directly (e.g. to convert target
    /// weights into goal share counts before calling `rebalance`) without
    /// holding a second handle to the same broker.
    pub fn broker(&self) -> &Arc<B> {
        &self.broker
    }

    /// Spawns the single background worker that owns the due-child queue.
    /// Returns its `JoinHandle`; dropping the handle does not stop the
    /// worker — abort it explicitly to shut down (`spec.md` §4.D notes
    /// worker-restart/lifecycle is out of core scope; callers needing a
    /// health probe can poll the handle).
    pub fn spawn(&self) -> tokio::task::JoinHandle<()> {
        let book = Arc::clone(&self.book);
        let broker = Arc::clone(&self.broker);
        tokio::spawn(async move { worker_loop(book, broker).await })
    }

    /// Creates a `Submitted` parent order and enqueues `slices` children
    /// of equal quantity (the remainder, if `total_qty` doesn't divide
    /// evenly, lands on the last slice) spaced by `interval`
    /// (`spec.md` §4.D `vwap_execute`). Returns immediately; the worker
    /// fires the children as they come due.
    pub fn vwap_execute(
        &self,
        ticker: impl Into<SmolStr>,
        total_qty: Decimal,
        side: OrderSide,
        slices: u32,
        interval: Duration,
    ) -> Arc<Order> {
        let ticker = ticker.into();
        let slices = slices.max(1);
        let order = Arc::new(Order::new(ticker.clone(), side, total_qty));
        order.submit();

        let qty_per_slice = total_qty / Decimal::from(slices);
        let interval = ChronoDuration::from_std(interval).unwrap_or(ChronoDuration::zero());
        let now = Utc::now();

        let mut children = Vec::with_capacity(slices as usize);
        let mut allocated = Decimal::ZERO;
        for i in 0..slices {
            let qty = if i + 1 == slices {
                total_qty - allocated
            } else {
                qty_per_slice
            };
            allocated += qty;
            let scheduled_time = now + interval * i as i32;
            children.push(ChildOrder::new(&order, ticker.clone(), side, qty, scheduled_time));
        }

        debug!(order_id = order.order_id, %ticker, slices, %total_qty, "enqueued vwap parent");
        self.book.orders.lock().insert(order.order_id, Arc::clone(&order));
        {
            let mut queue = self.book.queue.lock();
            queue.extend(children);
            queue.sort_by_key(|c| c.scheduled_time);
        }

        order
    }

    /// If `order_id` is still active, transitions it to `Cancelled` and
    /// returns `true`. Remaining queued children referencing this parent
    /// are left in the queue — the worker's `is_active` check skips them
    /// on its next pass rather than requiring an immediate sweep
    /// (`spec.md` §4.D `cancel_order`).
    pub fn cancel_order(&self, order_id: u64) -> bool {
        let orders = self.book.orders.lock();
        match orders.get(&order_id) {
            Some(order) => order.cancel(),
            None => false,
        }
    }

    /// Drives the book towards `goal_positions` (ticker -> target share
    /// count): cancels active orders on the affected tickers, reads
    /// current broker positions, and submits a `vwap_execute` for every
    /// ticker whose diff exceeds [`REBALANCE_EPSILON`]
    /// (`spec.md` §4.D `rebalance`).
    pub async fn rebalance(&self, goal_positions: &HashMap<SmolStr, Decimal>, interval: Duration) {
        {
            let orders = self.book.orders.lock();
            for order in orders.values() {
                if goal_positions.contains_key(&order.ticker) && order.is_active() {
                    order.cancel();
                }
            }
        }

        let current = self.broker.get_positions().await;

        let mut tickers: HashSet<SmolStr> = goal_positions.keys().cloned().collect();
        tickers.extend(current.keys().cloned());

        for ticker in tickers {
            let goal = goal_positions.get(&ticker).copied().unwrap_or(Decimal::ZERO);
            let held = current.get(&ticker).copied().unwrap_or(Decimal::ZERO);
            let diff = goal - held;
            if diff.abs() > REBALANCE_EPSILON {
                let side = if diff > Decimal::ZERO { OrderSide::Buy } else { OrderSide::Sell };
                self.vwap_execute(ticker, diff.abs(), side, REBALANCE_SLICES, interval);
            }
        }
    }
}

/// The single background worker loop (`spec.md` §4.D step 1-3 / §5):
/// wakes on [`POLL_INTERVAL`], partitions the queue into due and later
/// children, and fires every due child whose parent is still active.
async fn worker_loop<B>(book: Arc<Book>, broker: Arc<B>)
where
    B: Broker + Send + Sync + 'static,
{
    loop {
        tokio::time::sleep(POLL_INTERVAL).await;
        let now = Utc::now();

        let due = {
            let mut queue = book.queue.lock();
            let (due, later): (Vec<ChildOrder>, Vec<ChildOrder>) =
                queue.drain(..).partition(|c| c.scheduled_time <= now);
            *queue = later;
            due
        };

        for child in due {
            fire_child(&broker, child).await;
        }
    }
}

/// Submits one due child if its parent is still active, then propagates
/// the broker's response onto the parent's state
/// (`spec.md` §4.D step 3 / §7 `BrokerFailure`).
async fn fire_child<B>(broker: &Arc<B>, child: ChildOrder)
where
    B: Broker + Send + Sync + 'static,
{
    let Some(parent) = child.parent.upgrade() else {
        return;
    };
    if !parent.is_active() {
        return;
    }

    let filled = broker.submit_order(&child.ticker, child.quantity, child.side).await;
    if filled {
        let state = parent.record_fill(child.quantity);
        debug!(order_id = parent.order_id, child_id = child.child_id, ?state, "child filled");
    } else {
        warn!(order_id = parent.order_id, child_id = child.child_id, "child order rejected by broker");
        parent.reject();
    }
}
