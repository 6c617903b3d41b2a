//! Printable bill documents.
//!
//! Renderers only read a finished bill; they never touch the stores.

use core::fmt::Write as _;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use billing_bills::Bill;
use billing_core::{BillId, ItemId, Money};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("bill {0} has no items")]
    NoItems(BillId),

    #[error("failed to format document: {0}")]
    Format(String),
}

impl From<core::fmt::Error> for RenderError {
    fn from(value: core::fmt::Error) -> Self {
        RenderError::Format(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLine {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// A bill joined with the display names a document needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub bill_id: BillId,
    pub customer: String,
    pub bill_date: DateTime<Utc>,
    pub lines: Vec<ReceiptLine>,
    pub total: Money,
}

impl Receipt {
    /// Items missing from `item_names` (e.g. removed from the catalog) print
    /// as `Item #<id>`.
    pub fn from_bill(bill: &Bill, customer: impl Into<String>, item_names: &HashMap<ItemId, String>) -> Self {
        let lines = bill
            .items()
            .iter()
            .map(|line| ReceiptLine {
                item_id: line.item_id,
                name: item_names
                    .get(&line.item_id)
                    .cloned()
                    .unwrap_or_else(|| format!("Item #{}", line.item_id)),
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal,
            })
            .collect();

        Self {
            bill_id: bill.id_typed(),
            customer: customer.into(),
            bill_date: bill.bill_date(),
            lines,
            total: bill.total_amount(),
        }
    }
}

/// A rendered document plus its transport metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content_type: &'static str,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub trait DocumentRenderer: Send + Sync {
    fn render(&self, receipt: &Receipt) -> Result<Document, RenderError>;
}

/// Fixed-width plain-text receipt.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextReceipt;

const NAME_WIDTH: usize = 28;
const RULE: &str = "------------------------------------------------------------";

impl DocumentRenderer for PlainTextReceipt {
    fn render(&self, receipt: &Receipt) -> Result<Document, RenderError> {
        if receipt.lines.is_empty() {
            return Err(RenderError::NoItems(receipt.bill_id));
        }

        let mut out = String::new();
        writeln!(out, "INVOICE #{}", receipt.bill_id)?;
        writeln!(out, "Customer: {}", receipt.customer)?;
        writeln!(out, "Date:     {}", receipt.bill_date.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(out, "{RULE}")?;
        writeln!(
            out,
            "{:<NAME_WIDTH$} {:>5} {:>12} {:>12}",
            "Item", "Qty", "Unit price", "Subtotal"
        )?;
        writeln!(out, "{RULE}")?;
        for line in &receipt.lines {
            let name: String = line.name.chars().take(NAME_WIDTH).collect();
            writeln!(
                out,
                "{:<NAME_WIDTH$} {:>5} {:>12} {:>12}",
                name,
                line.quantity,
                line.unit_price.to_string(),
                line.subtotal.to_string()
            )?;
        }
        writeln!(out, "{RULE}")?;
        writeln!(out, "{:>60}", format!("TOTAL {}", receipt.total))?;

        Ok(Document {
            content_type: "text/plain; charset=utf-8",
            file_name: format!("invoice_{}.txt", receipt.bill_id),
            bytes: out.into_bytes(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billing_bills::BillDraft;
    use billing_core::{LineItemId, UserId};

    fn bill() -> Bill {
        let mut draft = BillDraft::new(UserId::new(1), Utc::now());
        draft
            .push_line(ItemId::new(1), 2, "10.00".parse().unwrap())
            .unwrap();
        draft
            .push_line(ItemId::new(2), 2, "3.50".parse().unwrap())
            .unwrap();
        draft
            .finish()
            .unwrap()
            .into_bill(BillId::new(7), [LineItemId::new(1), LineItemId::new(2)])
            .unwrap()
    }

    #[test]
    fn receipt_lists_every_line_and_the_total() {
        let names = HashMap::from([(ItemId::new(1), "Notebook".to_string())]);
        let receipt = Receipt::from_bill(&bill(), "alice", &names);
        assert_eq!(receipt.lines[1].name, "Item #2");

        let doc = PlainTextReceipt.render(&receipt).unwrap();
        let text = String::from_utf8(doc.bytes).unwrap();

        assert_eq!(doc.file_name, "invoice_7.txt");
        assert!(text.starts_with("INVOICE #7\nCustomer: alice\n"));
        assert!(text.contains("Notebook"));
        assert!(text.contains("20.00"));
        assert!(text.contains("7.00"));
        assert!(text.trim_end().ends_with("TOTAL 27.00"));
    }

    #[test]
    fn empty_receipts_are_refused() {
        let mut receipt = Receipt::from_bill(&bill(), "alice", &HashMap::new());
        receipt.lines.clear();
        assert_eq!(
            PlainTextReceipt.render(&receipt),
            Err(RenderError::NoItems(BillId::new(7)))
        );
    }
}
