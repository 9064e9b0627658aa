use crate::core::category;
use crate::core::ledger::LedgerUpdater;
use crate::core::parser::parse_scan;
use crate::core::replay_guard::ReplayGuard;
use crate::domain::model::{ActiveReceptacle, CreditReceipt, DeclaredCategory};
use crate::domain::ports::{Feedback, PointStore};
use crate::utils::error::{ErrorCategory, Result};
use crate::utils::retry::RetryPolicy;

/// Terminal state of one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Credited(CreditReceipt),
    Rejected(Rejection),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// `userId` or `orderNumber` missing. No cue.
    Malformed { missing: &'static str },
    /// Failure cue.
    CategoryMismatch {
        declared: DeclaredCategory,
        assigned: String,
    },
    /// Order already used, unknown, or claimed concurrently. No cue.
    AlreadyUsed { order_number: String },
    /// User or receptacle record missing or invalid; the order stays unmarked.
    DataIntegrity { reason: String },
    /// Backend still failing after retries.
    Backend { reason: String },
}

impl ScanOutcome {
    pub fn is_credited(&self) -> bool {
        matches!(self, ScanOutcome::Credited(_))
    }
}

/// Runs decoded payloads through parse, category check, replay guard,
/// credit and feedback, for the one receptacle this process is bound to.
pub struct ScanPipeline<S: PointStore, F: Feedback> {
    store: S,
    feedback: F,
    active: ActiveReceptacle,
    retry: RetryPolicy,
}

impl<S: PointStore, F: Feedback> ScanPipeline<S, F> {
    pub fn new(store: S, feedback: F, active: ActiveReceptacle, retry: RetryPolicy) -> Self {
        Self {
            store,
            feedback,
            active,
            retry,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    pub fn active(&self) -> &ActiveReceptacle {
        &self.active
    }

    /// Processes one payload to a terminal state. Errors are contained here.
    pub async fn process(&self, raw: &str) -> ScanOutcome {
        let event = parse_scan(raw);

        let (user_id, order_number) = match (event.user_id.as_deref(), event.order_number.as_deref())
        {
            (Some(user_id), Some(order_number)) => (user_id, order_number),
            (None, _) => return malformed(raw, "userId"),
            (_, None) => return malformed(raw, "orderNumber"),
        };

        if !category::matches(&event.declared_category, &self.active.assigned_category) {
            tracing::warn!(
                "❌ Category mismatch for order {}: scanned {:?}, receptacle accepts '{}'",
                order_number,
                event.declared_category,
                self.active.assigned_category
            );
            self.feedback.notify_failure().await;
            return ScanOutcome::Rejected(Rejection::CategoryMismatch {
                declared: event.declared_category,
                assigned: self.active.assigned_category.clone(),
            });
        }

        let outcome = match self.redeem(user_id, order_number).await {
            Ok(outcome) => outcome,
            Err(e) if e.category() == ErrorCategory::DataIntegrity => {
                tracing::warn!("⚠️ Data integrity problem for order {}: {}", order_number, e);
                ScanOutcome::Rejected(Rejection::DataIntegrity {
                    reason: e.to_string(),
                })
            }
            Err(e) => {
                tracing::error!("❌ Backend failure for order {}: {}", order_number, e);
                ScanOutcome::Rejected(Rejection::Backend {
                    reason: e.to_string(),
                })
            }
        };

        if let ScanOutcome::Credited(receipt) = &outcome {
            tracing::info!(
                "✅ Order {} credited: user {} +{} points ({} → {})",
                receipt.order_number,
                receipt.user_id,
                receipt.multiplier,
                receipt.points_before,
                receipt.points_after
            );
            self.feedback.notify_success().await;
        }
        outcome
    }

    /// Replay check, record check, conditional claim, then credit.
    ///
    /// The order is claimed only after both records are known to exist, so a
    /// missing record leaves it redeemable. The claim precedes the writes so
    /// two racing scans of one code cannot both credit.
    async fn redeem(&self, user_id: &str, order_number: &str) -> Result<ScanOutcome> {
        let guard = ReplayGuard::new(&self.store, self.retry);
        let ledger = LedgerUpdater::new(&self.store, self.retry);

        if guard.is_used(order_number).await? {
            tracing::debug!("Ignoring used order {}", order_number);
            return Ok(already_used(order_number));
        }

        let pending = ledger.prepare(user_id, &self.active.name).await?;

        if !guard.mark_used(order_number).await? {
            tracing::debug!("Order {} was claimed by another scan", order_number);
            return Ok(already_used(order_number));
        }

        match ledger.commit(&pending, order_number).await {
            Ok(receipt) => Ok(ScanOutcome::Credited(receipt)),
            Err(e) => {
                tracing::error!(
                    "❌ Order {} is marked used but its credit did not complete",
                    order_number
                );
                Err(e)
            }
        }
    }
}

fn malformed(raw: &str, missing: &'static str) -> ScanOutcome {
    tracing::warn!("⚠️ Scanned code has no {}: {:?}", missing, raw);
    ScanOutcome::Rejected(Rejection::Malformed { missing })
}

fn already_used(order_number: &str) -> ScanOutcome {
    ScanOutcome::Rejected(Rejection::AlreadyUsed {
        order_number: order_number.to_string(),
    })
}
