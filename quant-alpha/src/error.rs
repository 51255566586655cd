use thiserror::Error;

/// The one true error this workspace surfaces to a caller as `Err` rather
/// than recovering locally: calling [`crate::AlphaContext::get_events`]
/// outside a scoped model run is a programmer error, not expected absence
/// of data (§7).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
pub enum AlphaError {
    #[error("get_events called outside a scoped alpha context")]
    ContextMissing,
}
