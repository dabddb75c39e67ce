//! Map-based location tagging.
//!
//! A session tracks one pin from placement to confirmation. Its name is
//! looked up in the background; a newer pin or a clear always supersedes
//! an older lookup. Confirming creates a located item.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::LocationSessionService;
