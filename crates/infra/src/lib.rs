//! Infrastructure layer: stores and the order transaction engine.

pub mod order_engine;
pub mod store;


pub use order_engine::{OrderEngine, OrderError, OrderLineRequest, OrderRequest, StockWritePolicy};
pub use store::{
    BillStore, CatalogStore, InMemoryBillStore, InMemoryCatalogStore, InMemoryUserDirectory,
    StoreError, UserDirectory, UserRecord,
};
