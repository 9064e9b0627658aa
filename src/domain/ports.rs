use crate::domain::model::{DisposalOrder, Frame, Receptacle, UserAccount};
use crate::utils::error::Result;
use async_trait::async_trait;

/// The backend holding receptacles, user accounts and disposal orders.
///
/// Every method is a single call with no retry; callers wrap them in
/// [`crate::utils::retry::with_backoff`].
#[async_trait]
pub trait PointStore: Send + Sync {
    async fn list_receptacles(&self) -> Result<Vec<String>>;

    async fn fetch_receptacle(&self, name: &str) -> Result<Option<Receptacle>>;

    async fn fetch_user(&self, user_id: &str) -> Result<Option<UserAccount>>;

    async fn fetch_order(&self, order_number: &str) -> Result<Option<DisposalOrder>>;

    /// Sets `used = true` only where it is currently `false`.
    ///
    /// Returns `true` iff this call performed the transition. A missing order
    /// and an already-used order both return `false`.
    async fn claim_order(&self, order_number: &str) -> Result<bool>;

    /// Returns `false` when no row matched.
    async fn set_points(&self, user_id: &str, points: u64) -> Result<bool>;

    /// Returns `false` when no row matched.
    async fn set_fill_amount(&self, name: &str, amount: u64) -> Result<bool>;
}

/// Audio (or other) cues for the person at the receptacle. Never fails.
#[async_trait]
pub trait Feedback: Send + Sync {
    async fn notify_success(&self);
    async fn notify_failure(&self);
}

#[async_trait]
pub trait FrameSource: Send {
    /// Blocks until the next frame. `None` means the source is exhausted.
    async fn next_frame(&mut self) -> Result<Option<Frame>>;
}

pub trait PayloadDecoder: Send + Sync {
    fn decode(&self, frame: &Frame) -> Vec<String>;
}

#[async_trait]
impl<T: Feedback + ?Sized> Feedback for Box<T> {
    async fn notify_success(&self) {
        (**self).notify_success().await
    }

    async fn notify_failure(&self) {
        (**self).notify_failure().await
    }
}
