mod candidate;
mod rect;
mod shared;
mod store;
mod tracked_item;

pub use candidate::Candidate;
pub use rect::{Rect, iou_batch};
pub use shared::SharedStore;
pub use store::{StoreConfig, StoreEvent, TrackingStore, now_millis};
pub use tracked_item::TrackedItem;
