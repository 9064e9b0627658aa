use crate::core::reward;
use crate::domain::model::{CreditReceipt, Receptacle, UserAccount};
use crate::domain::ports::PointStore;
use crate::utils::error::{PointsError, Result};
use crate::utils::retry::{with_backoff, RetryPolicy};

/// A credit whose records have been read and whose multiplier is known,
/// but which has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCredit {
    pub user: UserAccount,
    pub receptacle: Receptacle,
    pub multiplier: u32,
}

impl PendingCredit {
    pub fn new_points(&self) -> u64 {
        self.user.points.saturating_add(u64::from(self.multiplier))
    }

    pub fn new_fill_amount(&self) -> u64 {
        self.receptacle.fill_amount.saturating_add(1)
    }
}

/// Applies point credits and fill increments.
///
/// The backend offers no cross-table transaction, so writes are ordered to
/// fail safe: both records are confirmed first, then points, then fill. A
/// failure between the two writes under-reports the fill amount; it never
/// over-credits points.
pub struct LedgerUpdater<'a, S: PointStore + ?Sized> {
    store: &'a S,
    retry: RetryPolicy,
}

impl<'a, S: PointStore + ?Sized> LedgerUpdater<'a, S> {
    pub fn new(store: &'a S, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Reads both records and computes the multiplier. Writes nothing.
    pub async fn prepare(&self, user_id: &str, receptacle_name: &str) -> Result<PendingCredit> {
        let user = with_backoff(&self.retry, "fetch_user", || self.store.fetch_user(user_id))
            .await?
            .ok_or_else(|| PointsError::UserNotFound {
                user_id: user_id.to_string(),
            })?;

        let receptacle = with_backoff(&self.retry, "fetch_receptacle", || {
            self.store.fetch_receptacle(receptacle_name)
        })
        .await?
        .ok_or_else(|| PointsError::ReceptacleNotFound {
            name: receptacle_name.to_string(),
        })?;

        let multiplier = reward::multiplier(
            &receptacle.name,
            receptacle.fill_amount,
            receptacle.capacity,
        )?;

        Ok(PendingCredit {
            user,
            receptacle,
            multiplier,
        })
    }

    /// Writes a prepared credit: points first, then fill amount.
    pub async fn commit(&self, pending: &PendingCredit, order_number: &str) -> Result<CreditReceipt> {
        let user_id = pending.user.id.as_str();
        let name = pending.receptacle.name.as_str();
        let new_points = pending.new_points();
        let new_fill = pending.new_fill_amount();

        let updated = with_backoff(&self.retry, "set_points", || {
            self.store.set_points(user_id, new_points)
        })
        .await?;
        if !updated {
            return Err(PointsError::UserNotFound {
                user_id: user_id.to_string(),
            });
        }
        tracing::info!(
            "💰 User {} points {} → {} (x{})",
            user_id,
            pending.user.points,
            new_points,
            pending.multiplier
        );

        let updated = with_backoff(&self.retry, "set_fill_amount", || {
            self.store.set_fill_amount(name, new_fill)
        })
        .await?;
        if !updated {
            return Err(PointsError::ReceptacleNotFound {
                name: name.to_string(),
            });
        }
        tracing::info!(
            "🗑️ Receptacle '{}' amount {} → {}",
            name,
            pending.receptacle.fill_amount,
            new_fill
        );

        Ok(CreditReceipt {
            user_id: user_id.to_string(),
            order_number: order_number.to_string(),
            receptacle: name.to_string(),
            multiplier: pending.multiplier,
            points_before: pending.user.points,
            points_after: new_points,
            fill_before: pending.receptacle.fill_amount,
            fill_after: new_fill,
            credited_at: chrono::Utc::now(),
        })
    }

    /// Credits `user_id` for a disposal into `receptacle_name`.
    ///
    /// Aborts with no write if either record is missing. Does not touch the
    /// order's used flag; see [`crate::core::pipeline::ScanPipeline`] for the
    /// full sequence.
    pub async fn apply_credit(
        &self,
        user_id: &str,
        order_number: &str,
        receptacle_name: &str,
    ) -> Result<CreditReceipt> {
        let pending = self.prepare(user_id, receptacle_name).await?;
        self.commit(&pending, order_number).await
    }
}
