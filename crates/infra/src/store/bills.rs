use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use billing_bills::{Bill, LineItem, NewBill};
use billing_core::{BillId, LineItemId, Money, UserId};

use super::StoreError;

/// Bills and their line items.
#[async_trait]
pub trait BillStore: Send + Sync {
    /// Persist header and every line in one atomic write.
    async fn create_bill(&self, bill: NewBill) -> Result<Bill, StoreError>;

    async fn get_bill(&self, id: BillId) -> Result<Bill, StoreError>;

    /// Bills owned by one user, ascending id.
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Bill>, StoreError>;

    /// Every bill, ascending id.
    async fn list_all(&self) -> Result<Vec<Bill>, StoreError>;

    /// Delete a bill together with all of its line items.
    async fn delete_bill(&self, id: BillId) -> Result<(), StoreError>;

    /// Line items stored for a bill id, read straight from the line table.
    async fn line_items_of(&self, id: BillId) -> Result<Vec<LineItem>, StoreError>;
}

#[derive(Debug, Clone)]
struct BillHeader {
    user_id: UserId,
    bill_date: DateTime<Utc>,
    total_amount: Money,
}

/// Two tables, as in the relational layout: headers and lines keyed by their
/// own ids, lines pointing at their bill.
#[derive(Debug, Default)]
struct BillTables {
    headers: BTreeMap<BillId, BillHeader>,
    lines: BTreeMap<LineItemId, LineItem>,
    last_bill_id: i64,
    last_line_id: i64,
}

impl BillTables {
    fn assemble(&self, id: BillId) -> Result<Bill, StoreError> {
        let header = self.headers.get(&id).ok_or(StoreError::NotFound)?;
        let lines = self.lines_of(id);
        Ok(Bill::from_parts(
            id,
            header.user_id,
            header.bill_date,
            header.total_amount,
            lines,
        )?)
    }

    fn lines_of(&self, id: BillId) -> Vec<LineItem> {
        self.lines
            .values()
            .filter(|l| l.bill_id == id)
            .cloned()
            .collect()
    }
}

/// In-memory bill store for tests/dev.
///
/// Every mutation happens under a single write lock, so a bill and its lines
/// become visible (or disappear) together.
#[derive(Debug, Default)]
pub struct InMemoryBillStore {
    inner: RwLock<BillTables>,
}

impl InMemoryBillStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BillStore for InMemoryBillStore {
    async fn create_bill(&self, bill: NewBill) -> Result<Bill, StoreError> {
        let mut tables = self.inner.write().map_err(|_| StoreError::poisoned())?;

        let bill_id = BillId::new(tables.last_bill_id + 1);
        let first_line = tables.last_line_id + 1;
        let line_count = bill.lines().len() as i64;
        let line_ids = (first_line..first_line + line_count).map(LineItemId::new);

        // Build the full aggregate before touching the tables.
        let persisted = bill.into_bill(bill_id, line_ids)?;

        tables.last_bill_id = bill_id.get();
        tables.last_line_id += line_count;
        tables.headers.insert(
            bill_id,
            BillHeader {
                user_id: persisted.user_id(),
                bill_date: persisted.bill_date(),
                total_amount: persisted.total_amount(),
            },
        );
        for line in persisted.items() {
            tables.lines.insert(line.id, line.clone());
        }
        Ok(persisted)
    }

    async fn get_bill(&self, id: BillId) -> Result<Bill, StoreError> {
        let tables = self.inner.read().map_err(|_| StoreError::poisoned())?;
        tables.assemble(id)
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Bill>, StoreError> {
        let tables = self.inner.read().map_err(|_| StoreError::poisoned())?;
        tables
            .headers
            .iter()
            .filter(|(_, h)| h.user_id == user_id)
            .map(|(id, _)| tables.assemble(*id))
            .collect()
    }

    async fn list_all(&self) -> Result<Vec<Bill>, StoreError> {
        let tables = self.inner.read().map_err(|_| StoreError::poisoned())?;
        tables.headers.keys().map(|id| tables.assemble(*id)).collect()
    }

    async fn delete_bill(&self, id: BillId) -> Result<(), StoreError> {
        let mut tables = self.inner.write().map_err(|_| StoreError::poisoned())?;
        if tables.headers.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }
        tables.lines.retain(|_, line| line.bill_id != id);
        Ok(())
    }

    async fn line_items_of(&self, id: BillId) -> Result<Vec<LineItem>, StoreError> {
        let tables = self.inner.read().map_err(|_| StoreError::poisoned())?;
        Ok(tables.lines_of(id))
    }
}
