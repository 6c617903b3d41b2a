use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use billing_bills::{Bill, LineItem};
use billing_catalog::{DEFAULT_PAGE_SIZE, Item, Page, PageRequest, SearchQuery};
use billing_core::{BillId, ItemId, LineItemId, Money, UserId};
use billing_infra::{OrderError, OrderLineRequest, OrderRequest};

// -------------------------
// Request DTOs
// -------------------------

/// `POST /bills` body. Quantities arrive as signed JSON integers and are
/// checked here so a negative value reports `InvalidQuantity`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillRequest {
    pub user_id: UserId,
    #[serde(default)]
    pub items: Vec<CreateBillLine>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillLine {
    pub item_id: ItemId,
    pub quantity: i64,
}

impl CreateBillRequest {
    pub fn into_order(self) -> Result<OrderRequest, OrderError> {
        let items = self
            .items
            .into_iter()
            .map(|line| {
                let quantity = u32::try_from(line.quantity)
                    .ok()
                    .filter(|q| *q > 0)
                    .ok_or(OrderError::InvalidQuantity {
                        item_id: line.item_id,
                    })?;
                Ok(OrderLineRequest {
                    item_id: line.item_id,
                    quantity,
                })
            })
            .collect::<Result<Vec<_>, OrderError>>()?;
        Ok(OrderRequest::new(self.user_id, items))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemsQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub q: Option<String>,
    pub category: Option<String>,
}

impl ItemsQuery {
    pub fn search(&self) -> SearchQuery {
        SearchQuery::new(self.category.clone(), self.q.clone())
    }

    pub fn page_request(&self, default_size: u32) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(0), self.size.unwrap_or(default_size))
    }

    pub fn default_page_request(&self) -> PageRequest {
        self.page_request(DEFAULT_PAGE_SIZE)
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemResponse {
    pub id: LineItemId,
    pub item_id: ItemId,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

impl From<&LineItem> for LineItemResponse {
    fn from(line: &LineItem) -> Self {
        Self {
            id: line.id,
            item_id: line.item_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
            subtotal: line.subtotal,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillResponse {
    pub id: BillId,
    pub user_id: UserId,
    pub bill_date: DateTime<Utc>,
    pub total_amount: Money,
    pub items: Vec<LineItemResponse>,
}

impl From<&Bill> for BillResponse {
    fn from(bill: &Bill) -> Self {
        Self {
            id: bill.id_typed(),
            user_id: bill.user_id(),
            bill_date: bill.bill_date(),
            total_amount: bill.total_amount(),
            items: bill.items().iter().map(LineItemResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock: u32,
    pub category: Option<String>,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            name: item.name,
            description: item.description,
            price: item.price,
            stock: item.stock,
            category: item.category,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

impl From<Page<Item>> for PageResponse<ItemResponse> {
    fn from(page: Page<Item>) -> Self {
        let page = page.map(ItemResponse::from);
        Self {
            items: page.items,
            page: page.page,
            size: page.size,
            total_items: page.total_items,
            total_pages: page.total_pages,
        }
    }
}
