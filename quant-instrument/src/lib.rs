#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms
)]

//! Security, timeframe, bar, event, corporate-action and order identity
//! types shared by every crate in the workspace: `quant-data`, `quant-alpha`,
//! `quant-risk` and `quant-execution` all build on the types defined here
//! rather than redefining their own.

pub mod bar;
pub mod corporate_action;
pub mod event;
pub mod id;
pub mod order;
pub mod security;
pub mod timeframe;

pub use bar::Bar;
pub use corporate_action::{CorporateAction, CorporateActionKind};
pub use event::Event;
pub use id::InternalId;
pub use order::{ChildOrder, Order, OrderSide, OrderState};
pub use security::Security;
pub use timeframe::Timeframe;
