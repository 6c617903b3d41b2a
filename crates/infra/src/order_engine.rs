//! Order transaction engine.
//!
//! Turns a requested order into a persisted bill:
//!
//! ```text
//! OrderRequest
//!   ↓
//! 1. Reject empty orders / zero quantities (no mutation yet)
//!   ↓
//! 2. Resolve the owning user
//!   ↓
//! 3. Per line, in request order: load item, check stock, capture price,
//!    price the line, write the decremented stock immediately
//!   ↓
//! 4. Freeze the draft and hand it to `BillStore::create_bill`
//! ```
//!
//! Stock writes are per line and are not undone when a later line (or the
//! final bill write) fails. Callers see the failure; earlier decrements stay.
//!
//! Concurrent orders against one item are governed by [`StockWritePolicy`].

use core::fmt;
use core::str::FromStr;
use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use billing_auth::{AccessDenied, Caller, ensure_admin, ensure_can_order_for, ensure_owner_or_admin};
use billing_bills::{Bill, BillDraft};
use billing_catalog::Item;
use billing_core::{AggregateRoot, BillId, DomainError, ExpectedVersion, ItemId, UserId};

use crate::store::{BillStore, CatalogStore, StoreError, UserDirectory};

/// One requested line: which item and how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    pub item_id: ItemId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub user_id: UserId,
    pub items: Vec<OrderLineRequest>,
}

impl OrderRequest {
    pub fn new(user_id: UserId, items: Vec<OrderLineRequest>) -> Self {
        Self { user_id, items }
    }

    /// Shape checks that need no store access.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        if let Some(line) = self.items.iter().find(|l| l.quantity == 0) {
            return Err(OrderError::InvalidQuantity {
                item_id: line.item_id,
            });
        }
        Ok(())
    }
}

/// How stock writes behave when two orders race on the same item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StockWritePolicy {
    /// Write the computed stock unconditionally. Two orders may both pass the
    /// sufficiency check and the later write wins.
    #[default]
    LastWriteWins,
    /// Write only if the item is still at the version read during the check;
    /// otherwise the order fails with `ConcurrentModification`.
    Optimistic,
}

impl StockWritePolicy {
    fn expected_version(self, item: &Item) -> ExpectedVersion {
        match self {
            StockWritePolicy::LastWriteWins => ExpectedVersion::Any,
            StockWritePolicy::Optimistic => ExpectedVersion::Exact(item.version()),
        }
    }
}

impl fmt::Display for StockWritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockWritePolicy::LastWriteWins => f.write_str("last-write-wins"),
            StockWritePolicy::Optimistic => f.write_str("optimistic"),
        }
    }
}

impl FromStr for StockWritePolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last-write-wins" | "lww" => Ok(StockWritePolicy::LastWriteWins),
            "optimistic" => Ok(StockWritePolicy::Optimistic),
            other => Err(DomainError::validation(format!(
                "unknown stock write policy: {other}"
            ))),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("Order must contain at least one item")]
    EmptyOrder,

    #[error("Quantity must be positive for item: {item_id}")]
    InvalidQuantity { item_id: ItemId },

    #[error("Item with ID {0} not found")]
    ItemNotFound(ItemId),

    #[error("Insufficient stock for item: {name}")]
    InsufficientStock {
        item_id: ItemId,
        name: String,
        available: u32,
        requested: u32,
    },

    #[error("User with ID {0} not found")]
    UserNotFound(UserId),

    #[error("Bill with ID {0} not found")]
    BillNotFound(BillId),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Another order changed the item between the stock check and the write.
    #[error("Item with ID {0} was modified concurrently, please retry")]
    ConcurrentModification(ItemId),

    /// The order could not be priced (e.g. amount overflow).
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Store failure: {0}")]
    StoreFailure(String),
}

impl OrderError {
    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            OrderError::EmptyOrder => "EmptyOrder",
            OrderError::InvalidQuantity { .. } => "InvalidQuantity",
            OrderError::ItemNotFound(_) => "ItemNotFound",
            OrderError::InsufficientStock { .. } => "InsufficientStock",
            OrderError::UserNotFound(_) => "UserNotFound",
            OrderError::BillNotFound(_) => "BillNotFound",
            OrderError::AccessDenied(_) => "AccessDenied",
            OrderError::ConcurrentModification(_) => "ConcurrentModification",
            OrderError::InvalidOrder(_) => "InvalidOrder",
            OrderError::StoreFailure(_) => "StoreFailure",
        }
    }
}

impl From<AccessDenied> for OrderError {
    fn from(value: AccessDenied) -> Self {
        OrderError::AccessDenied(value.0)
    }
}

impl From<DomainError> for OrderError {
    fn from(value: DomainError) -> Self {
        OrderError::InvalidOrder(value.to_string())
    }
}

impl From<StoreError> for OrderError {
    fn from(value: StoreError) -> Self {
        OrderError::StoreFailure(value.to_string())
    }
}

/// Order placement and bill access over injected stores.
#[derive(Clone)]
pub struct OrderEngine {
    catalog: Arc<dyn CatalogStore>,
    bills: Arc<dyn BillStore>,
    users: Arc<dyn UserDirectory>,
    policy: StockWritePolicy,
}

impl fmt::Debug for OrderEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderEngine")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl OrderEngine {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        bills: Arc<dyn BillStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            catalog,
            bills,
            users,
            policy: StockWritePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: StockWritePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> StockWritePolicy {
        self.policy
    }

    /// Create a bill on behalf of `caller`. Non-admins may only order for themselves.
    pub async fn create_bill(&self, caller: &Caller, request: OrderRequest) -> Result<Bill, OrderError> {
        ensure_can_order_for(caller, request.user_id).inspect_err(|err| {
            tracing::warn!(caller = %caller.user_id, user_id = %request.user_id, "order rejected: {err}");
        })?;
        self.place_order(request).await
    }

    /// Run the order transaction with no caller checks.
    pub async fn place_order(&self, request: OrderRequest) -> Result<Bill, OrderError> {
        let user_id = request.user_id;
        let result = self.run_order(request).await;
        match &result {
            Ok(bill) => tracing::info!(
                bill_id = %bill.id_typed(),
                user_id = %user_id,
                lines = bill.items().len(),
                total = %bill.total_amount(),
                "bill created"
            ),
            Err(err) => tracing::warn!(user_id = %user_id, kind = err.kind(), "order failed: {err}"),
        }
        result
    }

    async fn run_order(&self, request: OrderRequest) -> Result<Bill, OrderError> {
        request.validate()?;

        let user = self
            .users
            .find_user(request.user_id)
            .await?
            .ok_or(OrderError::UserNotFound(request.user_id))?;

        // Postgres keeps microseconds; truncate so stored and returned dates agree.
        let mut draft = BillDraft::new(user.id, Utc::now().trunc_subsecs(6));

        for line in &request.items {
            let item = match self.catalog.get_item(line.item_id).await {
                Ok(item) => item,
                Err(StoreError::NotFound) => return Err(OrderError::ItemNotFound(line.item_id)),
                Err(err) => return Err(err.into()),
            };

            let remaining = item.stock_after(line.quantity).map_err(|_| OrderError::InsufficientStock {
                item_id: item.id,
                name: item.name.clone(),
                available: item.stock,
                requested: line.quantity,
            })?;

            draft.push_line(item.id, line.quantity, item.price)?;
            self.write_stock(&item, remaining).await?;
        }

        let bill = draft.finish()?;
        Ok(self.bills.create_bill(bill).await?)
    }

    async fn write_stock(&self, item: &Item, remaining: u32) -> Result<(), OrderError> {
        let expected = self.policy.expected_version(item);
        match self.catalog.update_stock(item.id, remaining, expected).await {
            Ok(updated) => {
                tracing::debug!(
                    item_id = %item.id,
                    from = item.stock,
                    to = updated.stock,
                    version = updated.version,
                    "stock written"
                );
                Ok(())
            }
            Err(StoreError::NotFound) => Err(OrderError::ItemNotFound(item.id)),
            Err(StoreError::ConcurrentModification(_)) => {
                Err(OrderError::ConcurrentModification(item.id))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Any bill, no ownership check.
    pub async fn get_bill_by_id(&self, id: BillId) -> Result<Bill, OrderError> {
        match self.bills.get_bill(id).await {
            Ok(bill) => Ok(bill),
            Err(StoreError::NotFound) => Err(OrderError::BillNotFound(id)),
            Err(err) => Err(err.into()),
        }
    }

    /// The bill, only if it belongs to `user_id`.
    pub async fn get_bill_by_id_and_user_id(&self, id: BillId, user_id: UserId) -> Result<Bill, OrderError> {
        let bill = self.get_bill_by_id(id).await?;
        if !bill.is_owned_by(user_id) {
            return Err(OrderError::AccessDenied(
                "You can only view your own bills".to_string(),
            ));
        }
        Ok(bill)
    }

    /// Fetch a bill the caller may see (owner or admin).
    pub async fn bill_for(&self, caller: &Caller, id: BillId) -> Result<Bill, OrderError> {
        if caller.is_admin() {
            return self.get_bill_by_id(id).await;
        }
        self.get_bill_by_id_and_user_id(id, caller.user_id).await
    }

    /// All bills for admins, otherwise the caller's own bills.
    pub async fn bills_for(&self, caller: &Caller) -> Result<Vec<Bill>, OrderError> {
        if caller.is_admin() {
            Ok(self.bills.list_all().await?)
        } else {
            Ok(self.bills.list_by_user(caller.user_id).await?)
        }
    }

    /// Another user's bills; admin only.
    pub async fn bills_of_user(&self, caller: &Caller, user_id: UserId) -> Result<Vec<Bill>, OrderError> {
        ensure_admin(caller)?;
        Ok(self.bills.list_by_user(user_id).await?)
    }

    /// Delete a bill and its line items; admin or owner.
    pub async fn delete_bill(&self, caller: &Caller, id: BillId) -> Result<(), OrderError> {
        let bill = self.get_bill_by_id(id).await?;
        ensure_owner_or_admin(caller, bill.user_id())?;

        match self.bills.delete_bill(id).await {
            Ok(()) => {
                tracing::info!(bill_id = %id, caller = %caller.user_id, "bill deleted");
                Ok(())
            }
            Err(StoreError::NotFound) => Err(OrderError::BillNotFound(id)),
            Err(err) => Err(err.into()),
        }
    }
}
