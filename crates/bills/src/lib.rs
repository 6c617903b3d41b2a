//! Bills domain module.
//!
//! A bill is the aggregate root; its line items are owned by it and reference
//! catalog items by id only. This crate holds the total/subtotal rules; storage
//! lives in `billing-infra`.

pub mod bill;

pub use bill::{Bill, BillDraft, LineItem, NewBill, NewLineItem};
