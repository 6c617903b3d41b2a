use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use billing_core::{BillId, DomainError, ItemId, LineItemId, Money, UserId};

/// One priced line of a persisted bill.
///
/// `unit_price` is the catalog price captured at the time of sale; later
/// price changes on the item do not affect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub bill_id: BillId,
    pub item_id: ItemId,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// Persisted bill: header plus its ordered line items.
///
/// Immutable once created; `total_amount` always equals the sum of the line
/// subtotals (checked on construction).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bill {
    id: BillId,
    user_id: UserId,
    bill_date: DateTime<Utc>,
    total_amount: Money,
    items: Vec<LineItem>,
}

impl Bill {
    /// Reassemble a bill from stored rows, re-checking the total invariant.
    pub fn from_parts(
        id: BillId,
        user_id: UserId,
        bill_date: DateTime<Utc>,
        total_amount: Money,
        items: Vec<LineItem>,
    ) -> Result<Self, DomainError> {
        let bill = Self {
            id,
            user_id,
            bill_date,
            total_amount,
            items,
        };
        if !bill.total_matches_lines() {
            return Err(DomainError::invariant(format!(
                "bill {id} total {total_amount} does not match its line subtotals"
            )));
        }
        if let Some(line) = bill.items.iter().find(|l| l.bill_id != id) {
            return Err(DomainError::invariant(format!(
                "line item {} belongs to bill {}, not {id}",
                line.id, line.bill_id
            )));
        }
        Ok(bill)
    }

    pub fn id_typed(&self) -> BillId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn bill_date(&self) -> DateTime<Utc> {
        self.bill_date
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    pub fn total_matches_lines(&self) -> bool {
        let lines_ok = self
            .items
            .iter()
            .all(|l| l.unit_price.times(l.quantity).ok() == Some(l.subtotal));
        let sum = Money::sum(self.items.iter().map(|l| l.subtotal));
        lines_ok && sum.ok() == Some(self.total_amount)
    }
}

/// A priced line that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    pub item_id: ItemId,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// Accumulates priced lines for one bill, keeping the running total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillDraft {
    user_id: UserId,
    bill_date: DateTime<Utc>,
    lines: Vec<NewLineItem>,
    total: Money,
}

impl BillDraft {
    pub fn new(user_id: UserId, bill_date: DateTime<Utc>) -> Self {
        Self {
            user_id,
            bill_date,
            lines: Vec::new(),
            total: Money::ZERO,
        }
    }

    /// Price a line (`subtotal = unit_price * quantity`) and add it to the total.
    pub fn push_line(
        &mut self,
        item_id: ItemId,
        quantity: u32,
        unit_price: Money,
    ) -> Result<&NewLineItem, DomainError> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        let subtotal = unit_price.times(quantity)?;
        let total = self.total.checked_add(subtotal)?;

        self.total = total;
        self.lines.push(NewLineItem {
            item_id,
            quantity,
            unit_price,
            subtotal,
        });
        Ok(&self.lines[self.lines.len() - 1])
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn lines(&self) -> &[NewLineItem] {
        &self.lines
    }

    /// Freeze the draft into a bill ready for the store.
    pub fn finish(self) -> Result<NewBill, DomainError> {
        if self.lines.is_empty() {
            return Err(DomainError::validation("a bill needs at least one line"));
        }
        Ok(NewBill {
            user_id: self.user_id,
            bill_date: self.bill_date,
            total_amount: self.total,
            lines: self.lines,
        })
    }
}

/// A complete, not-yet-persisted bill. Only obtainable through [`BillDraft`],
/// so its total always equals the sum of its line subtotals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBill {
    user_id: UserId,
    bill_date: DateTime<Utc>,
    total_amount: Money,
    lines: Vec<NewLineItem>,
}

impl NewBill {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn bill_date(&self) -> DateTime<Utc> {
        self.bill_date
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn lines(&self) -> &[NewLineItem] {
        &self.lines
    }

    /// Attach store-assigned ids, one line id per line in order.
    pub fn into_bill(
        self,
        id: BillId,
        line_ids: impl IntoIterator<Item = LineItemId>,
    ) -> Result<Bill, DomainError> {
        let mut line_ids = line_ids.into_iter();
        let mut items = Vec::with_capacity(self.lines.len());
        for line in self.lines {
            let line_id = line_ids
                .next()
                .ok_or_else(|| DomainError::invariant("missing line item id"))?;
            items.push(LineItem {
                id: line_id,
                bill_id: id,
                item_id: line.item_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal,
            });
        }
        if line_ids.next().is_some() {
            return Err(DomainError::invariant("more line item ids than lines"));
        }
        Bill::from_parts(id, self.user_id, self.bill_date, self.total_amount, items)
    }
}
