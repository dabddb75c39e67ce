pub mod attachments;
pub mod geocoding;
pub mod items;
pub mod location_sessions;
