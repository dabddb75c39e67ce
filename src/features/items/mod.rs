//! Bucket list items.
//!
//! [`ItemRepository`] is the only way to create, change or remove an item.
//! It persists through an [`services::ItemStore`] (Postgres or in-memory)
//! and owns the attachments its items reference.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/items` | List items (`?located=true` for map pins) |
//! | POST | `/api/items` | Create an item |
//! | POST | `/api/items/upload` | Create an item with photos (multipart) |
//! | GET | `/api/items/{id}` | Get an item |
//! | PATCH | `/api/items/{id}` | Partial update |
//! | DELETE | `/api/items/{id}` | Delete an item and its photos |
//! | PUT | `/api/items/{id}/completed` | Mark completed / not completed |
//! | POST | `/api/items/{id}/attachments` | Attach photos (multipart) |
//! | DELETE | `/api/items/{id}/attachments/{reference}` | Detach a photo |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::ItemRepository;
