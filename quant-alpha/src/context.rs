use crate::error::AlphaError;
use chrono::{DateTime, Utc};
use quant_data::DataPlatform;
use quant_instrument::{Event, InternalId};
use smol_str::SmolStr;
use std::future::Future;
use std::sync::Arc;

struct ContextState {
    platform: Arc<DataPlatform>,
    as_of: DateTime<Utc>,
}

tokio::task_local! {
    static CONTEXT: ContextState;
}

/// The scoped execution context an [`crate::AlphaModel`] runs inside:
/// `(data_platform, as_of)`, task-local so concurrent model runs with
/// different `as_of` values never observe each other's context (§4.B, §9).
pub struct AlphaContext;

impl AlphaContext {
    /// Enters the context for the duration of `body`, guaranteed to exit
    /// on every path — success, early return, or panic — since
    /// `task_local!`'s `scope` is a stack-structured future wrapper, not a
    /// manually paired enter/exit call.
    pub async fn scope<F, Fut, T>(platform: Arc<DataPlatform>, as_of: DateTime<Utc>, body: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        CONTEXT.scope(ContextState { platform, as_of }, body()).await
    }

    /// Forwards to the bound platform's `get_events` with `as_of` fixed to
    /// this context's value. `Err(AlphaError::ContextMissing)` if called
    /// outside a `scope` — the one error kind this crate surfaces loudly.
    pub fn get_events(
        ids: &[InternalId],
        types: Option<&[SmolStr]>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Event>, AlphaError> {
        CONTEXT
            .try_with(|ctx| ctx.platform.get_events(ids, types, start, end, Some(ctx.as_of)))
            .map_err(|_| AlphaError::ContextMissing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quant_instrument::InternalId;

    #[tokio::test]
    async fn test_get_events_outside_scope_is_context_missing() {
        let result = AlphaContext::get_events(&[InternalId(1000)], None, None, None);
        assert_eq!(result.unwrap_err(), AlphaError::ContextMissing);
    }

    #[tokio::test]
    async fn test_get_events_inside_scope_succeeds() {
        let platform = Arc::new(DataPlatform::new());
        let as_of = Utc::now();

        let result = AlphaContext::scope(platform, as_of, || async {
            AlphaContext::get_events(&[InternalId(1000)], None, None, None)
        })
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_context_does_not_leak_after_scope_exits() {
        let platform = Arc::new(DataPlatform::new());
        AlphaContext::scope(platform, Utc::now(), || async {}).await;

        let result = AlphaContext::get_events(&[InternalId(1000)], None, None, None);
        assert_eq!(result.unwrap_err(), AlphaError::ContextMissing);
    }
}
