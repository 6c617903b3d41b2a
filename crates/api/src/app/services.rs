//! Store and engine wiring.

use std::collections::HashMap;
use std::sync::Arc;

use billing_auth::{Caller, Role};
use billing_catalog::NewItem;
use billing_core::{BillId, Money, UserId};
use billing_infra::{
    BillStore, CatalogStore, InMemoryBillStore, InMemoryCatalogStore, InMemoryUserDirectory,
    OrderEngine, OrderError, StockWritePolicy, StoreError, UserDirectory, UserRecord,
};

use crate::config::AppConfig;
use crate::render::{DocumentRenderer, PlainTextReceipt, Receipt};

/// Everything a handler needs, shared behind an `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<dyn CatalogStore>,
    pub bills: Arc<dyn BillStore>,
    pub users: Arc<dyn UserDirectory>,
    pub engine: OrderEngine,
    pub renderer: Arc<dyn DocumentRenderer>,
}

impl AppServices {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        bills: Arc<dyn BillStore>,
        users: Arc<dyn UserDirectory>,
        policy: StockWritePolicy,
    ) -> Self {
        let engine = OrderEngine::new(catalog.clone(), bills.clone(), users.clone()).with_policy(policy);
        Self {
            catalog,
            bills,
            users,
            engine,
            renderer: Arc::new(PlainTextReceipt),
        }
    }

    /// Fetch a bill the caller may see and join in display names.
    pub async fn receipt_for(&self, caller: &Caller, id: BillId) -> Result<Receipt, OrderError> {
        let bill = self.engine.bill_for(caller, id).await?;

        let customer = self
            .users
            .find_user(bill.user_id())
            .await?
            .map(|u| u.username)
            .unwrap_or_else(|| format!("user {}", bill.user_id()));

        let mut names = HashMap::new();
        for line in bill.items() {
            if names.contains_key(&line.item_id) {
                continue;
            }
            match self.catalog.get_item(line.item_id).await {
                Ok(item) => {
                    names.insert(line.item_id, item.name);
                }
                Err(StoreError::NotFound) => {}
                Err(err) => return Err(err.into()),
            }
        }

        Ok(Receipt::from_bill(&bill, customer, &names))
    }
}

pub async fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    if let Some(url) = config.database_url.as_deref() {
        #[cfg(feature = "postgres")]
        {
            return build_postgres_services(url, config.stock_write_policy).await;
        }
        #[cfg(not(feature = "postgres"))]
        {
            let _ = url;
            tracing::warn!("DATABASE_URL set but postgres feature not enabled, falling back to in-memory");
        }
    }

    build_in_memory_services(config.stock_write_policy, config.seed_demo_data).await
}

/// In-memory wiring (dev/test), optionally seeded with demo data.
pub async fn build_in_memory_services(policy: StockWritePolicy, seed: bool) -> Result<AppServices, StoreError> {
    let catalog = Arc::new(InMemoryCatalogStore::new());
    let users = Arc::new(InMemoryUserDirectory::new());

    if seed {
        seed_demo_data(catalog.as_ref(), users.as_ref()).await?;
    }

    Ok(AppServices::new(
        catalog,
        Arc::new(InMemoryBillStore::new()),
        users,
        policy,
    ))
}

#[cfg(feature = "postgres")]
async fn build_postgres_services(url: &str, policy: StockWritePolicy) -> Result<AppServices, StoreError> {
    use billing_infra::store::postgres::{PgBillStore, PgCatalogStore, PgUserDirectory, migrate};

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await?;
    migrate(&pool).await?;
    tracing::info!("using postgres stores");

    Ok(AppServices::new(
        Arc::new(PgCatalogStore::new(pool.clone())),
        Arc::new(PgBillStore::new(pool.clone())),
        Arc::new(PgUserDirectory::new(pool)),
        policy,
    ))
}

/// Demo users and catalog items.
///
/// Users: 1 `alice`, 2 `bob` (`ROLE_USER`), 100 `admin` (`ROLE_ADMIN`).
pub async fn seed_demo_data(catalog: &dyn CatalogStore, users: &InMemoryUserDirectory) -> Result<(), StoreError> {
    for (id, username, role) in [
        (1, "alice", Role::USER),
        (2, "bob", Role::USER),
        (100, "admin", Role::ADMIN),
    ] {
        users.register(UserRecord {
            id: UserId::new(id),
            username: username.to_string(),
            roles: vec![role],
        })?;
    }

    let items = [
        ("Notebook", "A5 ruled notebook, 120 pages", 1000, 5, "Stationery"),
        ("Gel Pen", "Blue ink, 0.5mm", 350, 2, "Stationery"),
        ("The Rust Programming Language", "Paperback edition", 4500, 3, "Books"),
        ("Desk Lamp", "LED, adjustable arm", 2599, 0, "Home"),
        ("Sketchbook", "A4 cartridge paper", 1250, 8, "Art"),
    ];
    for (name, description, cents, stock, category) in items {
        catalog
            .insert_item(
                NewItem::new(name, Money::from_cents(cents)?, stock)
                    .with_description(description)
                    .with_category(category),
            )
            .await?;
    }

    tracing::info!(users = 3, items = items.len(), "seeded demo data");
    Ok(())
}
