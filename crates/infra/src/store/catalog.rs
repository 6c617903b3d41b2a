use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use billing_catalog::{Item, NewItem, Page, PageRequest, SearchQuery};
use billing_core::{ExpectedVersion, ItemId};

use super::StoreError;

/// Catalog items and their stock counts.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fetch one item; `StoreError::NotFound` if it does not exist.
    async fn get_item(&self, id: ItemId) -> Result<Item, StoreError>;

    /// Overwrite the stock count of one item and bump its version.
    ///
    /// With `ExpectedVersion::Exact(v)` the write only lands if the row is
    /// still at version `v`, otherwise `StoreError::ConcurrentModification`.
    async fn update_stock(
        &self,
        id: ItemId,
        new_stock: u32,
        expected: ExpectedVersion,
    ) -> Result<Item, StoreError>;

    /// Filtered, paged listing ordered by ascending id.
    async fn search(&self, query: &SearchQuery, page: PageRequest) -> Result<Page<Item>, StoreError>;

    /// In-stock items, newest (highest id) first.
    async fn featured(&self, page: PageRequest) -> Result<Page<Item>, StoreError>;

    async fn insert_item(&self, item: NewItem) -> Result<Item, StoreError>;

    /// Replace an item's details (catalog maintenance), bumping its version.
    async fn replace_item(&self, id: ItemId, item: NewItem) -> Result<Item, StoreError>;
}

#[derive(Debug, Default)]
struct CatalogTable {
    items: BTreeMap<ItemId, Item>,
    last_id: i64,
}

/// In-memory catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    inner: RwLock<CatalogTable>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn get_item(&self, id: ItemId) -> Result<Item, StoreError> {
        let table = self.inner.read().map_err(|_| StoreError::poisoned())?;
        table.items.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn update_stock(
        &self,
        id: ItemId,
        new_stock: u32,
        expected: ExpectedVersion,
    ) -> Result<Item, StoreError> {
        let mut table = self.inner.write().map_err(|_| StoreError::poisoned())?;
        let item = table.items.get_mut(&id).ok_or(StoreError::NotFound)?;
        expected.check(item.version)?;

        item.stock = new_stock;
        item.version += 1;
        Ok(item.clone())
    }

    async fn search(&self, query: &SearchQuery, page: PageRequest) -> Result<Page<Item>, StoreError> {
        let table = self.inner.read().map_err(|_| StoreError::poisoned())?;
        let matching: Vec<Item> = table
            .items
            .values()
            .filter(|item| query.matches(item))
            .cloned()
            .collect();
        Ok(Page::from_ordered(matching, page))
    }

    async fn featured(&self, page: PageRequest) -> Result<Page<Item>, StoreError> {
        let table = self.inner.read().map_err(|_| StoreError::poisoned())?;
        let in_stock: Vec<Item> = table
            .items
            .values()
            .rev()
            .filter(|item| item.is_in_stock())
            .cloned()
            .collect();
        Ok(Page::from_ordered(in_stock, page))
    }

    async fn insert_item(&self, item: NewItem) -> Result<Item, StoreError> {
        item.validate()?;
        let mut table = self.inner.write().map_err(|_| StoreError::poisoned())?;
        table.last_id += 1;
        let id = ItemId::new(table.last_id);
        let item = item.into_item(id);
        table.items.insert(id, item.clone());
        Ok(item)
    }

    async fn replace_item(&self, id: ItemId, item: NewItem) -> Result<Item, StoreError> {
        item.validate()?;
        let mut table = self.inner.write().map_err(|_| StoreError::poisoned())?;
        let existing = table.items.get_mut(&id).ok_or(StoreError::NotFound)?;
        let version = existing.version + 1;
        *existing = item.into_item(id);
        existing.version = version;
        Ok(existing.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billing_core::Money;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    async fn seeded() -> InMemoryCatalogStore {
        let store = InMemoryCatalogStore::new();
        for (name, category, stock) in [
            ("Dune", "Fiction", 3),
            ("Atlas of Maps", "Reference", 0),
            ("Emma", "fiction", 1),
            ("Dune Messiah", "Fiction", 2),
        ] {
            store
                .insert_item(NewItem::new(name, money("9.99"), stock).with_category(category))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn ids_are_assigned_sequentially() {
        let store = seeded().await;
        let item = store.get_item(ItemId::new(3)).await.unwrap();
        assert_eq!(item.name, "Emma");
        assert_eq!(store.get_item(ItemId::new(9)).await, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn update_stock_bumps_version() {
        let store = seeded().await;
        let updated = store
            .update_stock(ItemId::new(1), 1, ExpectedVersion::Any)
            .await
            .unwrap();
        assert_eq!(updated.stock, 1);
        assert_eq!(updated.version, 1);
    }

    #[tokio::test]
    async fn stale_expected_version_is_a_concurrent_modification() {
        let store = seeded().await;
        store
            .update_stock(ItemId::new(1), 2, ExpectedVersion::Exact(0))
            .await
            .unwrap();
        let err = store
            .update_stock(ItemId::new(1), 1, ExpectedVersion::Exact(0))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConcurrentModification(_)));
        assert_eq!(store.get_item(ItemId::new(1)).await.unwrap().stock, 2);
    }

    #[tokio::test]
    async fn update_stock_on_missing_item_is_not_found() {
        let store = seeded().await;
        let err = store
            .update_stock(ItemId::new(42), 1, ExpectedVersion::Any)
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound);
    }

    #[tokio::test]
    async fn search_filters_and_orders_by_id() {
        let store = seeded().await;
        let query = SearchQuery::new(Some("FICTION".into()), None);
        let page = store.search(&query, PageRequest::default()).await.unwrap();
        let ids: Vec<i64> = page.items.iter().map(|i| i.id.get()).collect();
        assert_eq!(ids, vec![1, 3, 4]);
        assert_eq!(page.total_items, 3);

        let query = SearchQuery::new(None, Some("dune".into()));
        let page = store.search(&query, PageRequest::new(1, 1)).await.unwrap();
        assert_eq!(page.items[0].name, "Dune Messiah");
        assert_eq!(page.total_pages, 2);
    }

    #[tokio::test]
    async fn search_without_matches_is_an_empty_page() {
        let store = seeded().await;
        let query = SearchQuery::new(None, Some("nothing like this".into()));
        let page = store.search(&query, PageRequest::default()).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 0);
    }

    #[tokio::test]
    async fn featured_lists_in_stock_items_newest_first() {
        let store = seeded().await;
        let page = store.featured(PageRequest::featured()).await.unwrap();
        let ids: Vec<i64> = page.items.iter().map(|i| i.id.get()).collect();
        assert_eq!(ids, vec![4, 3, 1]);
    }

    #[tokio::test]
    async fn replace_item_keeps_id_and_bumps_version() {
        let store = seeded().await;
        let replaced = store
            .replace_item(ItemId::new(1), NewItem::new("Dune (2nd ed.)", money("12.00"), 3))
            .await
            .unwrap();
        assert_eq!(replaced.id, ItemId::new(1));
        assert_eq!(replaced.version, 1);
        assert_eq!(replaced.price, money("12.00"));
    }
}
