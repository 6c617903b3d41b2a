use serde::{Deserialize, Serialize};

use billing_core::{AggregateRoot, DomainError, ItemId, Money};

/// Catalog item as held by the catalog store.
///
/// `stock` is unsigned, so a negative stock count cannot be represented.
/// `version` is bumped by the store on every stock write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock: u32,
    pub category: Option<String>,
    pub version: u64,
}

impl Item {
    /// Stock left after selling `quantity` units.
    ///
    /// Fails when the item does not hold enough stock; the item itself is
    /// never changed here.
    pub fn stock_after(&self, quantity: u32) -> Result<u32, DomainError> {
        self.stock.checked_sub(quantity).ok_or_else(|| {
            DomainError::invariant(format!("Insufficient stock for item: {}", self.name))
        })
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.category
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(category))
    }

    /// Case-insensitive substring match against name or description.
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }
}

impl AggregateRoot for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Input for adding an item to the catalog (seeding / maintenance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock: u32,
    pub category: Option<String>,
}

impl NewItem {
    pub fn new(name: impl Into<String>, price: Money, stock: u32) -> Self {
        Self {
            name: name.into(),
            description: None,
            price,
            stock,
            category: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(())
    }

    /// Materialize the stored row once the store has assigned an id.
    pub fn into_item(self, id: ItemId) -> Item {
        Item {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            category: self.category,
            version: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pen() -> Item {
        NewItem::new("Blue Pen", "1.25".parse().unwrap(), 5)
            .with_description("Ballpoint, medium tip")
            .with_category("Stationery")
            .into_item(ItemId::new(1))
    }

    #[test]
    fn stock_after_subtracts_requested_quantity() {
        assert_eq!(pen().stock_after(2).unwrap(), 3);
        assert_eq!(pen().stock_after(5).unwrap(), 0);
    }

    #[test]
    fn stock_after_rejects_overselling() {
        let err = pen().stock_after(6).unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) => {
                assert_eq!(msg, "Insufficient stock for item: Blue Pen")
            }
            other => panic!("expected InvariantViolation, got {other:?}"),
        }
    }

    #[test]
    fn text_and_category_matching_ignore_case() {
        let item = pen();
        assert!(item.matches_text("blue"));
        assert!(item.matches_text("BALLPOINT"));
        assert!(!item.matches_text("pencil"));
        assert!(item.in_category("stationery"));
        assert!(!item.in_category("Fiction"));
    }

    #[test]
    fn new_item_requires_a_name() {
        let item = NewItem::new("  ", Money::ZERO, 0);
        assert!(matches!(item.validate(), Err(DomainError::Validation(_))));
    }
}
