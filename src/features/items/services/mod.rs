mod item_repository;
mod item_store;
mod pg_item_store;

pub use item_repository::ItemRepository;
pub use item_store::{ItemStore, MemoryItemStore};
pub use pg_item_store::PgItemStore;
