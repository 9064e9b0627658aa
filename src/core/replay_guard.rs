use crate::domain::ports::PointStore;
use crate::utils::error::Result;
use crate::utils::retry::{with_backoff, RetryPolicy};

/// Guards the one-time-use flag on disposal orders.
pub struct ReplayGuard<'a, S: PointStore + ?Sized> {
    store: &'a S,
    retry: RetryPolicy,
}

impl<'a, S: PointStore + ?Sized> ReplayGuard<'a, S> {
    pub fn new(store: &'a S, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// An order that cannot be found counts as used.
    pub async fn is_used(&self, order_number: &str) -> Result<bool> {
        let order = with_backoff(&self.retry, "fetch_order", || {
            self.store.fetch_order(order_number)
        })
        .await?;

        match order {
            Some(order) => Ok(order.used),
            None => {
                tracing::warn!("⚠️ Order {} does not exist; treating it as used", order_number);
                Ok(true)
            }
        }
    }

    /// Flips `used` from false to true in one conditional update.
    ///
    /// Returns `false` when another scan got there first (or the order
    /// vanished); the caller must not credit in that case.
    pub async fn mark_used(&self, order_number: &str) -> Result<bool> {
        let claimed = with_backoff(&self.retry, "claim_order", || {
            self.store.claim_order(order_number)
        })
        .await?;

        if claimed {
            tracing::info!("🔒 Order {} marked as used", order_number);
        } else {
            tracing::debug!("Order {} was already used", order_number);
        }
        Ok(claimed)
    }
}
