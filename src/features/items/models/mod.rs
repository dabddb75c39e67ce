mod bucket_list_item;
mod item_event;

pub use bucket_list_item::{BucketListItem, CreateBucketListItem, ItemPatch};
pub use item_event::ItemEvent;
