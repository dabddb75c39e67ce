/// Maximum size of a single attachment payload (15MB)
pub const MAX_ATTACHMENT_SIZE: usize = 15 * 1024 * 1024;

/// Maximum number of photos accepted in one upload
pub const MAX_ATTACHMENTS_PER_UPLOAD: usize = 5;

/// Allowed MIME types for photo attachments
pub const ALLOWED_ATTACHMENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/heic",
];

/// Capacity of the item change broadcast channel
pub const ITEM_EVENT_CHANNEL_CAPACITY: usize = 64;
