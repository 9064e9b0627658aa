use crate::domain::model::{DisposalOrder, Receptacle, UserAccount};
use crate::domain::ports::PointStore;
use crate::utils::error::{PointsError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Tables {
    receptacles: BTreeMap<String, Receptacle>,
    users: BTreeMap<String, UserAccount>,
    orders: BTreeMap<String, DisposalOrder>,
    failures_pending: u32,
    operation_failures: BTreeMap<String, u32>,
    contested_orders: BTreeSet<String>,
}

/// In-process [`PointStore`] with the same semantics as the PostgREST backend.
///
/// Every store call takes the table lock once, so `claim_order` is atomic.
/// `fail_next_calls` makes the next calls fail with a transient 503,
/// `fail_operation` does the same for one named [`PointStore`] method, and
/// `contest_next_claim` lets another scanner win the next claim of an order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_receptacle(mut self, name: &str, fill_amount: u64, capacity: i64) -> Self {
        self.tables.get_mut().receptacles.insert(
            name.to_string(),
            Receptacle {
                name: name.to_string(),
                fill_amount,
                capacity,
            },
        );
        self
    }

    pub fn with_user(mut self, id: &str, points: u64) -> Self {
        self.tables.get_mut().users.insert(
            id.to_string(),
            UserAccount {
                id: id.to_string(),
                points,
            },
        );
        self
    }

    pub fn with_order(mut self, order_number: &str, used: bool) -> Self {
        self.tables.get_mut().orders.insert(
            order_number.to_string(),
            DisposalOrder {
                order_number: order_number.to_string(),
                used,
            },
        );
        self
    }

    pub async fn fail_next_calls(&self, count: u32) {
        self.tables.lock().await.failures_pending = count;
    }

    pub async fn fail_operation(&self, operation: &str, count: u32) {
        self.tables
            .lock()
            .await
            .operation_failures
            .insert(operation.to_string(), count);
    }

    /// The next `claim_order` for this order finds it already claimed.
    pub async fn contest_next_claim(&self, order_number: &str) {
        self.tables
            .lock()
            .await
            .contested_orders
            .insert(order_number.to_string());
    }

    pub async fn receptacle(&self, name: &str) -> Option<Receptacle> {
        self.tables.lock().await.receptacles.get(name).cloned()
    }

    pub async fn user(&self, id: &str) -> Option<UserAccount> {
        self.tables.lock().await.users.get(id).cloned()
    }

    pub async fn order(&self, order_number: &str) -> Option<DisposalOrder> {
        self.tables.lock().await.orders.get(order_number).cloned()
    }
}

impl Tables {
    fn check_failure(&mut self, operation: &str) -> Result<()> {
        let targeted = match self.operation_failures.get_mut(operation) {
            Some(pending) if *pending > 0 => {
                *pending -= 1;
                true
            }
            _ => false,
        };
        if targeted || self.failures_pending > 0 {
            if !targeted {
                self.failures_pending -= 1;
            }
            return Err(PointsError::BackendError {
                operation: operation.to_string(),
                status: 503,
                body: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PointStore for MemoryStore {
    async fn list_receptacles(&self) -> Result<Vec<String>> {
        let mut tables = self.tables.lock().await;
        tables.check_failure("list_receptacles")?;
        Ok(tables.receptacles.keys().cloned().collect())
    }

    async fn fetch_receptacle(&self, name: &str) -> Result<Option<Receptacle>> {
        let mut tables = self.tables.lock().await;
        tables.check_failure("fetch_receptacle")?;
        Ok(tables.receptacles.get(name).cloned())
    }

    async fn fetch_user(&self, user_id: &str) -> Result<Option<UserAccount>> {
        let mut tables = self.tables.lock().await;
        tables.check_failure("fetch_user")?;
        Ok(tables.users.get(user_id).cloned())
    }

    async fn fetch_order(&self, order_number: &str) -> Result<Option<DisposalOrder>> {
        let mut tables = self.tables.lock().await;
        tables.check_failure("fetch_order")?;
        Ok(tables.orders.get(order_number).cloned())
    }

    async fn claim_order(&self, order_number: &str) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        tables.check_failure("claim_order")?;
        if tables.contested_orders.remove(order_number) {
            if let Some(order) = tables.orders.get_mut(order_number) {
                order.used = true;
            }
        }
        match tables.orders.get_mut(order_number) {
            Some(order) if !order.used => {
                order.used = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_points(&self, user_id: &str, points: u64) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        tables.check_failure("set_points")?;
        Ok(tables
            .users
            .get_mut(user_id)
            .map(|user| user.points = points)
            .is_some())
    }

    async fn set_fill_amount(&self, name: &str, amount: u64) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        tables.check_failure("set_fill_amount")?;
        Ok(tables
            .receptacles
            .get_mut(name)
            .map(|receptacle| receptacle.fill_amount = amount)
            .is_some())
    }
}
